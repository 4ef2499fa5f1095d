use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

use super::{BlobStore, locator_for, locator_key};
use crate::config::BlobConfig;
use crate::error::LookbookError;

/// Stores objects as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: Url,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Url) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn from_config(cfg: &BlobConfig) -> Self {
        Self::new(cfg.root.clone(), cfg.public_base_url.clone())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LookbookError> {
        let key = locator_key(key)
            .ok_or_else(|| LookbookError::Blob(format!("invalid blob key {key:?}")))?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, LookbookError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        fs::write(&path, bytes).await?;
        debug!(key, size, path = %path.display(), "blob stored");
        locator_for(&self.public_base_url, key)
    }

    async fn fetch(&self, locator: &str) -> Result<Option<Vec<u8>>, LookbookError> {
        let Some(key) = locator_key(locator) else {
            warn!(locator, "blob locator has no usable key");
            return Ok(None);
        };
        match fs::read(self.root.join(&key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(key, "blob not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), LookbookError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, path = %path.display(), "blob removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
