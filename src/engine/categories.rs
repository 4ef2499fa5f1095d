use lookbook_assoc::{SetColumn, ToggleAction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::{DbCategory, DbPost, DbUser, SetColumnRef, SqliteStore};
use crate::engine::posts::{PostCard, post_card};
use crate::engine::{EngineContext, row_ids};
use crate::error::LookbookError;

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default = "default_public")]
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategorySummary {
    pub id: i64,
    #[sqlx(rename = "category_name")]
    pub name: String,
}

pub async fn create_category(store: &SqliteStore, new_category: NewCategory) -> Result<i64, LookbookError> {
    let name = new_category.name.trim();
    if name.is_empty() {
        return Err(LookbookError::InvalidRequest(
            "category name must not be empty".to_string(),
        ));
    }

    let mut tx = store.begin().await?;
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE category_name = ?)")
            .bind(name)
            .fetch_one(tx.conn())
            .await?;
    if taken {
        return Err(LookbookError::InvalidRequest(format!(
            "category {name} already exists"
        )));
    }

    let id = sqlx::query("INSERT INTO categories (category_name, public, post_ids) VALUES (?, ?, '')")
        .bind(name)
        .bind(new_category.public)
        .execute(tx.conn())
        .await?
        .last_insert_rowid();
    tx.commit().await?;

    info!(category_id = id, name, public = new_category.public, "category created");
    Ok(id)
}

/// Flips `category_id` in the user's `user_categories` list.
pub async fn toggle_subscription(
    store: &SqliteStore,
    user_id: i64,
    category_id: i64,
) -> Result<ToggleAction, LookbookError> {
    let mut tx = store.begin().await?;
    let mut subscriptions = tx.load_set(SetColumnRef::UserCategories, user_id).await?;
    let action = subscriptions
        .set
        .toggle(category_id)
        .map_err(LookbookError::malformed(SetColumnRef::UserCategories.qualified()))?;

    if action == ToggleAction::Added {
        tx.require_row::<DbCategory>(category_id).await?;
    }

    tx.store_set(&subscriptions).await?;
    tx.commit().await?;

    info!(user_id, category_id, action = %action, "subscription toggled");
    Ok(action)
}

pub async fn public_categories(store: &SqliteStore) -> Result<Vec<CategorySummary>, LookbookError> {
    let mut tx = store.begin().await?;
    let categories = sqlx::query_as::<_, CategorySummary>(
        "SELECT id, category_name FROM categories WHERE public = 1 ORDER BY id",
    )
    .fetch_all(tx.conn())
    .await?;
    tx.commit().await?;
    Ok(categories)
}

/// The user's subscriptions in subscription order. Ids whose category no
/// longer exists are left out.
pub async fn subscribed_categories(
    store: &SqliteStore,
    user_id: i64,
) -> Result<Vec<CategorySummary>, LookbookError> {
    let mut tx = store.begin().await?;
    let subscriptions = tx.load_set(SetColumnRef::UserCategories, user_id).await?;
    let category_ids = row_ids(&subscriptions.set, SetColumnRef::UserCategories)?;

    let mut categories = Vec::with_capacity(category_ids.len());
    for category_id in category_ids {
        match tx.fetch_row::<DbCategory>(category_id).await? {
            Some(category) => categories.push(CategorySummary {
                id: category.id,
                name: category.category_name,
            }),
            None => debug!(user_id, category_id, "subscribed category no longer exists"),
        }
    }
    tx.commit().await?;
    Ok(categories)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRequest {
    pub category_id: i64,
    pub user_id: i64,
    /// Posts restricted to this gender or to "All" are shown.
    pub gender: String,
    /// Resume after this post; absent starts from the first post.
    #[serde(default)]
    pub last_post_id: Option<i64>,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFeed {
    pub is_subscribed: bool,
    pub posts: Vec<PostCard>,
}

/// One page of a category's posts, in `post_ids` order.
///
/// Deleted posts, posts for another gender and posts without a readable image
/// do not count towards the page.
pub async fn category_feed(ctx: &EngineContext, request: FeedRequest) -> Result<CategoryFeed, LookbookError> {
    if request.page_size == 0 {
        return Err(LookbookError::InvalidRequest(
            "page_size must be at least 1".to_string(),
        ));
    }

    let mut tx = ctx.store.begin().await?;
    let category = tx.require_row::<DbCategory>(request.category_id).await?;
    let is_subscribed = tx
        .fetch_row::<DbUser>(request.user_id)
        .await?
        .is_some_and(|user| {
            SetColumn::decode(user.user_categories.as_deref()).contains(request.category_id)
        });

    let post_ids = row_ids(
        &SetColumn::decode(category.post_ids.as_deref()),
        SetColumnRef::CategoryPostIds,
    )?;
    let start = match request.last_post_id {
        Some(last) => post_ids
            .iter()
            .position(|&id| id == last)
            .map(|idx| idx + 1)
            .ok_or_else(|| {
                LookbookError::InvalidRequest(format!(
                    "post {last} is not in category {}",
                    request.category_id
                ))
            })?,
        None => 0,
    };

    tx.commit().await?;

    // Rows are read in batches no larger than the unfilled part of the page,
    // so ids past a full page are never fetched.
    let mut remaining = post_ids[start..].iter().copied();
    let mut posts = Vec::with_capacity(request.page_size);
    while posts.len() < request.page_size {
        let batch: Vec<i64> = remaining
            .by_ref()
            .take(request.page_size - posts.len())
            .collect();
        if batch.is_empty() {
            break;
        }

        let mut tx = ctx.store.begin().await?;
        let mut candidates = Vec::with_capacity(batch.len());
        for post_id in batch {
            let Some(post) = tx.fetch_row::<DbPost>(post_id).await? else {
                continue;
            };
            if post.is_deleted() {
                continue;
            }
            if post.gender_restriction == request.gender || post.gender_restriction == "All" {
                candidates.push(post);
            }
        }
        tx.commit().await?;

        for post in candidates {
            if let Some(card) = post_card(ctx, post).await {
                posts.push(card);
            }
        }
    }

    debug!(
        category_id = request.category_id,
        user_id = request.user_id,
        returned = posts.len(),
        "category feed page"
    );
    Ok(CategoryFeed {
        is_subscribed,
        posts,
    })
}
