use lookbook_assoc::ToggleAction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::{DbClothingArticle, DbPost, LoadedSet, SetColumnRef, SqliteStore};
use crate::error::LookbookError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteTarget {
    Post,
    Clothing,
}

impl FavoriteTarget {
    fn user_column(self) -> SetColumnRef {
        match self {
            FavoriteTarget::Post => SetColumnRef::UserFavoritePosts,
            FavoriteTarget::Clothing => SetColumnRef::UserFavoriteClothing,
        }
    }
}

/// Flips `item_id` in the user's favorites list.
///
/// A clothing favorite is also mirrored into the article's own `favorites`
/// list within the same transaction, so "did this user favorite it" reads
/// the same from either side. Adding a post requires the post to be live;
/// removing never does, so dangling ids can always be cleared.
pub async fn toggle_favorite(
    store: &SqliteStore,
    user_id: i64,
    target: FavoriteTarget,
    item_id: i64,
) -> Result<ToggleAction, LookbookError> {
    let column = target.user_column();
    let mut tx = store.begin().await?;

    let mut favorites = match tx.load_set(column, user_id).await {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(user_id, column = %column, error = %e, "favorite toggle on unreadable user");
            return Err(e);
        }
    };

    let action = favorites
        .set
        .toggle(item_id)
        .map_err(LookbookError::malformed(column.qualified()))?;

    match target {
        FavoriteTarget::Post => {
            if action == ToggleAction::Added {
                let live = tx
                    .fetch_row::<DbPost>(item_id)
                    .await?
                    .is_some_and(|post| !post.is_deleted());
                if !live {
                    return Err(LookbookError::not_found("post", item_id));
                }
            }
        }
        FavoriteTarget::Clothing => match action {
            ToggleAction::Added => {
                let mut article_favorites =
                    tx.load_set(SetColumnRef::ArticleFavorites, item_id).await?;
                article_favorites
                    .set
                    .insert(user_id)
                    .map_err(LookbookError::malformed(
                        SetColumnRef::ArticleFavorites.qualified(),
                    ))?;
                tx.store_set(&article_favorites).await?;
            }
            ToggleAction::Removed => match tx.fetch_row::<DbClothingArticle>(item_id).await? {
                Some(article) => {
                    let mut article_favorites = LoadedSet::from_raw(
                        SetColumnRef::ArticleFavorites,
                        item_id,
                        article.favorites.as_deref(),
                    );
                    article_favorites.set.strip(user_id);
                    tx.store_set(&article_favorites).await?;
                }
                None => debug!(user_id, item_id, "clearing favorite of a missing article"),
            },
        },
    }

    tx.store_set(&favorites).await?;
    tx.commit().await?;

    info!(user_id, item_id, target = ?target, action = %action, "favorite toggled");
    Ok(action)
}
