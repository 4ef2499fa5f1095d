use chrono::Utc;
use lookbook_assoc::{SetColumn, Tally};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::blob::post_image_key;
use crate::db::{
    DbCategory, DbClothingArticle, DbComment, DbPost, LoadedSet, SetColumnRef, StoreTx, TableRow,
};
use crate::engine::{EngineContext, decode_image, fetch_image_base64, row_ids};
use crate::error::LookbookError;

fn default_gender_restriction() -> String {
    "All".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub owner_id: i64,
    /// Category name; must already exist.
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// One clothing article is created per non-blank entry.
    #[serde(default)]
    pub clothing_items: Vec<String>,
    #[serde(default = "default_gender_restriction")]
    pub gender_restriction: String,
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub post_id: i64,
    pub image_url: Option<String>,
    pub clothing_article_ids: Vec<i64>,
}

/// Creates a post and links it from its owner's `user_posts` and its
/// category's `post_ids`, together with one clothing article per item.
///
/// The image is stored before the transaction commits and removed again if
/// it does not.
pub async fn create_post(ctx: &EngineContext, new_post: NewPost) -> Result<CreatedPost, LookbookError> {
    let image = new_post
        .image_base64
        .as_deref()
        .map(decode_image)
        .transpose()?;
    let clothing_items: Vec<&str> = new_post
        .clothing_items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();

    let mut tx = ctx.store.begin().await?;
    let mut user_posts = tx
        .load_set(SetColumnRef::UserPosts, new_post.owner_id)
        .await?;

    let sql = format!(
        "SELECT {} FROM categories WHERE category_name = ?",
        DbCategory::COLUMNS
    );
    let category = sqlx::query_as::<_, DbCategory>(&sql)
        .bind(&new_post.category)
        .fetch_optional(tx.conn())
        .await?
        .ok_or_else(|| LookbookError::not_found("category", &new_post.category))?;
    let mut category_posts = LoadedSet::from_raw(
        SetColumnRef::CategoryPostIds,
        category.id,
        category.post_ids.as_deref(),
    );

    let post_id = sqlx::query(
        "INSERT INTO posts (owner_id, category, description, clothing_items, gender_restriction, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(new_post.owner_id)
    .bind(&new_post.category)
    .bind(&new_post.description)
    .bind(clothing_items.join(", "))
    .bind(&new_post.gender_restriction)
    .bind(Utc::now())
    .execute(tx.conn())
    .await?
    .last_insert_rowid();

    let image_key = post_image_key(post_id);
    let image_url = match image {
        Some(bytes) => Some(ctx.blobs.put(&image_key, bytes).await?),
        None => None,
    };

    let linked = link_post(
        &mut tx,
        post_id,
        image_url.as_deref(),
        &mut user_posts,
        &mut category_posts,
        &clothing_items,
    )
    .await;
    let committed = match linked {
        Ok(ids) => tx.commit().await.map(|()| ids),
        Err(e) => Err(e),
    };
    let clothing_article_ids = match committed {
        Ok(ids) => ids,
        Err(e) => {
            if image_url.is_some() {
                discard_image(ctx, post_id, &image_key).await;
            }
            return Err(e);
        }
    };

    info!(
        post_id,
        owner_id = new_post.owner_id,
        category = %new_post.category,
        articles = clothing_article_ids.len(),
        "post created"
    );
    Ok(CreatedPost {
        post_id,
        image_url,
        clothing_article_ids,
    })
}

/// Writes everything that refers to the freshly inserted post: its image
/// locator, both id lists and the clothing articles.
async fn link_post(
    tx: &mut StoreTx,
    post_id: i64,
    image_url: Option<&str>,
    user_posts: &mut LoadedSet,
    category_posts: &mut LoadedSet,
    clothing_items: &[&str],
) -> Result<Vec<i64>, LookbookError> {
    if let Some(locator) = image_url {
        sqlx::query("UPDATE posts SET image_url = ? WHERE id = ?")
            .bind(locator)
            .bind(post_id)
            .execute(tx.conn())
            .await?;
    }

    user_posts
        .set
        .push(post_id)
        .map_err(LookbookError::malformed(SetColumnRef::UserPosts.qualified()))?;
    category_posts
        .set
        .push(post_id)
        .map_err(LookbookError::malformed(SetColumnRef::CategoryPostIds.qualified()))?;
    tx.store_set(user_posts).await?;
    tx.store_set(category_posts).await?;

    let mut clothing_article_ids = Vec::with_capacity(clothing_items.len());
    for item in clothing_items {
        let article_id = sqlx::query("INSERT INTO clothing_articles (post_id, type) VALUES (?, ?)")
            .bind(post_id)
            .bind(*item)
            .execute(tx.conn())
            .await?
            .last_insert_rowid();
        clothing_article_ids.push(article_id);
    }
    Ok(clothing_article_ids)
}

/// Removes the image of a post whose creation did not commit. The rowid may
/// be handed out again, so the object must not outlive the attempt.
async fn discard_image(ctx: &EngineContext, post_id: i64, key: &str) {
    match ctx.blobs.delete(key).await {
        Ok(()) => debug!(post_id, key, "discarded image of uncommitted post"),
        Err(e) => warn!(post_id, key, error = %e, "failed to discard image of uncommitted post"),
    }
}

/// Card shown in post listings and feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCard {
    pub post_id: i64,
    pub owner_id: i64,
    pub category: String,
    pub description: String,
    pub image_base64: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetails {
    pub post_id: i64,
    pub owner_id: i64,
    pub category: String,
    pub description: String,
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    pub article_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub user_upvoted: bool,
    pub user_downvoted: bool,
    pub user_favorited: bool,
    #[serde(flatten)]
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub comment_id: i64,
    pub owner_id: i64,
    pub text: String,
}

/// A post as seen by one user: their votes and favorites per article, and
/// the listed comments in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPostView {
    pub post_id: i64,
    pub post_favorited: bool,
    pub articles: Vec<ArticleView>,
    pub comments: Vec<CommentView>,
}

/// Which of a user's post lists to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostList {
    #[serde(alias = "user_posts")]
    Authored,
    #[serde(alias = "favorite_posts")]
    Favorited,
}

impl PostList {
    fn column(self) -> SetColumnRef {
        match self {
            PostList::Authored => SetColumnRef::UserPosts,
            PostList::Favorited => SetColumnRef::UserFavoritePosts,
        }
    }
}

async fn fetch_live_post(ctx: &EngineContext, post_id: i64) -> Result<DbPost, LookbookError> {
    let mut tx = ctx.store.begin().await?;
    let post = tx.require_row::<DbPost>(post_id).await?;
    tx.commit().await?;
    if post.is_deleted() {
        return Err(LookbookError::not_found("post", post_id));
    }
    Ok(post)
}

pub async fn post_details(ctx: &EngineContext, post_id: i64) -> Result<PostDetails, LookbookError> {
    let post = fetch_live_post(ctx, post_id).await?;
    let image_base64 = fetch_image_base64(ctx.blobs.as_ref(), post.image_url.as_deref()).await;
    Ok(PostDetails {
        post_id: post.id,
        owner_id: post.owner_id,
        category: post.category,
        description: post.description,
        image_base64,
    })
}

pub async fn user_post_view(
    ctx: &EngineContext,
    post_id: i64,
    user_id: i64,
) -> Result<UserPostView, LookbookError> {
    let mut tx = ctx.store.begin().await?;
    let post = tx.require_row::<DbPost>(post_id).await?;
    if post.is_deleted() {
        return Err(LookbookError::not_found("post", post_id));
    }

    let post_favorited = tx
        .fetch_column(SetColumnRef::UserFavoritePosts, user_id)
        .await
        .map(|raw| SetColumn::decode(raw.as_deref()).contains(post_id))
        .or_else(|e| match e {
            LookbookError::NotFound { .. } => Ok(false),
            other => Err(other),
        })?;

    let articles = sqlx::query_as::<_, DbClothingArticle>(&format!(
        "SELECT {} FROM clothing_articles WHERE post_id = ? ORDER BY id",
        DbClothingArticle::COLUMNS
    ))
    .bind(post_id)
    .fetch_all(tx.conn())
    .await?;

    let comment_ids = row_ids(
        &SetColumn::decode(post.comments.as_deref()),
        SetColumnRef::PostComments,
    )?;
    let mut comments = Vec::with_capacity(comment_ids.len());
    for comment_id in comment_ids {
        match tx.fetch_row::<DbComment>(comment_id).await? {
            Some(comment) => comments.push(CommentView {
                comment_id: comment.id,
                owner_id: comment.owner_id,
                text: comment.text,
            }),
            None => warn!(post_id, comment_id, "listed comment has no row"),
        }
    }
    tx.commit().await?;

    let articles = articles
        .into_iter()
        .map(|article| {
            let votes = article.vote_sets();
            ArticleView {
                article_id: article.id,
                user_upvoted: votes.has_approved(user_id),
                user_downvoted: votes.has_disapproved(user_id),
                user_favorited: SetColumn::decode(article.favorites.as_deref()).contains(user_id),
                tally: votes.tally(),
                kind: article.kind,
            }
        })
        .collect();

    Ok(UserPostView {
        post_id,
        post_favorited,
        articles,
        comments,
    })
}

/// Cards for the posts in one of the user's lists, in list order.
pub async fn list_user_posts(
    ctx: &EngineContext,
    user_id: i64,
    list: PostList,
) -> Result<Vec<PostCard>, LookbookError> {
    let column = list.column();
    let mut tx = ctx.store.begin().await?;
    let loaded = tx.load_set(column, user_id).await?;
    tx.commit().await?;

    let post_ids = row_ids(&loaded.set, column)?;
    posts_by_ids(ctx, &post_ids).await
}

/// Cards for `post_ids` in the given order. Missing and deleted posts are
/// skipped, as are posts whose image cannot be read.
pub async fn posts_by_ids(ctx: &EngineContext, post_ids: &[i64]) -> Result<Vec<PostCard>, LookbookError> {
    let mut tx = ctx.store.begin().await?;
    let mut posts = Vec::with_capacity(post_ids.len());
    for &post_id in post_ids {
        match tx.fetch_row::<DbPost>(post_id).await? {
            Some(post) if !post.is_deleted() => posts.push(post),
            Some(_) => debug!(post_id, "skipping deleted post"),
            None => warn!(post_id, "skipping missing post"),
        }
    }
    tx.commit().await?;

    let mut cards = Vec::with_capacity(posts.len());
    for post in posts {
        if let Some(card) = post_card(ctx, post).await {
            cards.push(card);
        }
    }
    Ok(cards)
}

pub(crate) async fn post_card(ctx: &EngineContext, post: DbPost) -> Option<PostCard> {
    let Some(image_base64) = fetch_image_base64(ctx.blobs.as_ref(), post.image_url.as_deref()).await
    else {
        debug!(post_id = post.id, "skipping post without image");
        return None;
    };
    Some(PostCard {
        post_id: post.id,
        owner_id: post.owner_id,
        category: post.category,
        description: post.description,
        image_base64,
    })
}
