use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Image storage configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlobConfig {
    /// Directory holding image objects, one file per key.
    /// TOML: `blob.root`. Default: `./blobs`.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Base of the locators stored in `posts.image_url`; a key is appended to it.
    /// TOML: `blob.public_base_url`. Default: `https://media.lookbook.local/`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: Url,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./blobs")
}

fn default_public_base_url() -> Url {
    Url::parse("https://media.lookbook.local/").expect("static url is valid")
}
