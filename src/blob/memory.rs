use ahash::AHashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use super::{BlobStore, locator_for, locator_key};
use crate::error::LookbookError;

const MEMORY_BASE_URL: &str = "memory://blobs/";

/// In-process object store for tests and embedding.
#[derive(Debug)]
pub struct MemoryBlobStore {
    objects: RwLock<AHashMap<String, Vec<u8>>>,
    base: Url,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(AHashMap::new()),
            base: Url::parse(MEMORY_BASE_URL).expect("static url is valid"),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, LookbookError> {
        let stored_key = locator_key(key)
            .ok_or_else(|| LookbookError::Blob(format!("invalid blob key {key:?}")))?;
        self.objects.write().await.insert(stored_key, bytes);
        locator_for(&self.base, key)
    }

    async fn fetch(&self, locator: &str) -> Result<Option<Vec<u8>>, LookbookError> {
        let Some(key) = locator_key(locator) else {
            return Ok(None);
        };
        Ok(self.objects.read().await.get(&key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), LookbookError> {
        if let Some(key) = locator_key(key) {
            self.objects.write().await.remove(&key);
        }
        Ok(())
    }
}
