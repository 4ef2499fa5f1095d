//! Association engine operations bound to the store.
//!
//! Each operation is one read-modify-write: it opens a [`StoreTx`], reads the
//! owning rows, applies the `lookbook_assoc` rules in memory and writes back
//! only the id lists that changed, all before a single commit. Handles are
//! passed in explicitly; nothing here holds global state.
//!
//! [`StoreTx`]: crate::db::StoreTx

pub mod cascade;
pub mod categories;
pub mod comments;
pub mod favorites;
pub mod posts;
pub mod users;
pub mod votes;

pub use cascade::{CascadeReport, delete_post};
pub use categories::{
    CategoryFeed, CategorySummary, FeedRequest, NewCategory, category_feed, create_category,
    public_categories, subscribed_categories, toggle_subscription,
};
pub use comments::{CreatedComment, delete_comment, submit_comment};
pub use favorites::{FavoriteTarget, toggle_favorite};
pub use posts::{
    ArticleView, CommentView, CreatedPost, NewPost, PostCard, PostDetails, PostList,
    UserPostView, create_post, list_user_posts, post_details, posts_by_ids, user_post_view,
};
pub use users::{Availability, NewUser, UserProfile, check_availability, create_user, user_profile};
pub use votes::{article_tally, vote};

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use lookbook_assoc::SetColumn;
use tracing::warn;

use crate::blob::BlobStore;
use crate::config::EngineConfig;
use crate::db::{SetColumnRef, SqliteStore};
use crate::error::LookbookError;

/// Everything an operation may touch, injected per call.
#[derive(Clone)]
pub struct EngineContext {
    pub store: SqliteStore,
    pub blobs: Arc<dyn BlobStore>,
    pub config: EngineConfig,
}

impl EngineContext {
    pub fn new(store: SqliteStore, blobs: Arc<dyn BlobStore>, config: EngineConfig) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }
}

/// Row ids held in an id-list column; a token that is not an integer makes
/// the column malformed.
pub(crate) fn row_ids(set: &SetColumn, column: SetColumnRef) -> Result<Vec<i64>, LookbookError> {
    set.parse_each::<i64>()
        .map_err(LookbookError::malformed(column.qualified()))
}

/// Fetches an image and base64-encodes it. Read views degrade to "no image"
/// when the object is missing or the blob store fails.
pub(crate) async fn fetch_image_base64(
    blobs: &dyn BlobStore,
    locator: Option<&str>,
) -> Option<String> {
    let locator = locator?;
    match blobs.fetch(locator).await {
        Ok(Some(bytes)) => Some(BASE64.encode(bytes)),
        Ok(None) => None,
        Err(e) => {
            warn!(locator, error = %e, "failed to fetch image");
            None
        }
    }
}

pub(crate) fn decode_image(image_base64: &str) -> Result<Vec<u8>, LookbookError> {
    BASE64
        .decode(image_base64.trim())
        .map_err(|e| LookbookError::InvalidRequest(format!("image is not valid base64: {e}")))
}
