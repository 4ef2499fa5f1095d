//! Image object storage collaborator.
//!
//! Posts keep a locator (a URL) in `posts.image_url`; the bytes live behind a
//! [`BlobStore`]. The engine puts an image when a post is created, deletes
//! it again if that creation does not commit, and fetches it for read views.

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use url::Url;

use crate::error::LookbookError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the locator to persist.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, LookbookError>;

    /// Loads the object a locator points at. A missing object is `Ok(None)`.
    async fn fetch(&self, locator: &str) -> Result<Option<Vec<u8>>, LookbookError>;

    /// Removes the object stored under `key`. Removing a missing object is not
    /// an error.
    async fn delete(&self, key: &str) -> Result<(), LookbookError>;
}

/// Object key of a post's image.
pub fn post_image_key(post_id: i64) -> String {
    format!("post_{post_id}/uploaded_image.jpg")
}

/// Object key a locator refers to: the path after scheme and host
/// (`https://bucket.host/post_7/uploaded_image.jpg` -> `post_7/uploaded_image.jpg`).
/// Keys that are empty or try to leave the store root yield `None`.
pub fn locator_key(locator: &str) -> Option<String> {
    let path = match Url::parse(locator) {
        Ok(url) => url.path().to_owned(),
        Err(_) => locator.to_owned(),
    };
    let key = path.trim_start_matches('/');
    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(key.to_owned())
}

/// Locator for `key` under `base`.
pub(crate) fn locator_for(base: &Url, key: &str) -> Result<String, LookbookError> {
    base.join(key)
        .map(String::from)
        .map_err(|e| LookbookError::Blob(format!("invalid blob key {key:?}: {e}")))
}
