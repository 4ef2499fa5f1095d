#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use lookbook::EngineContext;
use lookbook::blob::MemoryBlobStore;
use lookbook::config::EngineConfig;
use lookbook::db::{SetColumnRef, SqliteStore};
use lookbook::engine::{self, CreatedPost, NewCategory, NewPost, NewUser};

/// base64 of "hello".
pub const IMAGE_B64: &str = "aGVsbG8=";

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

/// A fresh SQLite file plus an in-memory blob store.
pub struct TestDb {
    pub ctx: EngineContext,
    pub blobs: Arc<MemoryBlobStore>,
    path: PathBuf,
}

impl TestDb {
    pub async fn new(label: &str) -> Self {
        Self::with_config(label, EngineConfig::default()).await
    }

    pub async fn with_config(label: &str, config: EngineConfig) -> Self {
        let mut hasher = DefaultHasher::new();
        SystemTime::now().hash(&mut hasher);
        std::process::id().hash(&mut hasher);
        NEXT_DB.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
        let path = std::env::temp_dir().join(format!(
            "lookbook_{label}_{:016x}.sqlite",
            hasher.finish()
        ));
        let database_url = format!("sqlite:{}", path.display());

        let store = SqliteStore::connect(&database_url).await.unwrap();
        let blobs = Arc::new(MemoryBlobStore::new());
        let ctx = EngineContext::new(store, blobs.clone(), config);
        Self { ctx, blobs, path }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.ctx.store
    }

    pub async fn user(&self, username: &str) -> i64 {
        engine::create_user(
            self.store(),
            NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                gender: "F".to_string(),
                age: 30,
                height: "170cm".to_string(),
            },
        )
        .await
        .unwrap()
    }

    pub async fn category(&self, name: &str) -> i64 {
        engine::create_category(
            self.store(),
            NewCategory {
                name: name.to_string(),
                public: true,
            },
        )
        .await
        .unwrap()
    }

    pub async fn post(&self, owner_id: i64, category: &str, items: &[&str]) -> CreatedPost {
        self.post_with(owner_id, category, items, "All", true).await
    }

    pub async fn post_with(
        &self,
        owner_id: i64,
        category: &str,
        items: &[&str],
        gender_restriction: &str,
        with_image: bool,
    ) -> CreatedPost {
        engine::create_post(
            &self.ctx,
            NewPost {
                owner_id,
                category: category.to_string(),
                description: format!("look by {owner_id}"),
                clothing_items: items.iter().map(|s| (*s).to_string()).collect(),
                gender_restriction: gender_restriction.to_string(),
                image_base64: with_image.then(|| IMAGE_B64.to_string()),
            },
        )
        .await
        .unwrap()
    }

    /// The column exactly as stored.
    pub async fn raw(&self, col: SetColumnRef, id: i64) -> Option<String> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            col.column(),
            col.table().name()
        );
        sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(id)
            .fetch_one(self.store().pool())
            .await
            .unwrap()
    }

    pub async fn set_raw(&self, col: SetColumnRef, id: i64, value: Option<&str>) {
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE id = ?",
            col.table().name(),
            col.column()
        );
        sqlx::query(&sql)
            .bind(value)
            .bind(id)
            .execute(self.store().pool())
            .await
            .unwrap();
    }

    /// Runs a statement directly on the pool, outside any engine transaction.
    pub async fn exec(&self, sql: &str) {
        sqlx::query(sql)
            .execute(self.store().pool())
            .await
            .unwrap();
    }

    pub async fn cleanup(self) {
        self.ctx.store.close().await;
        let _ = tokio::fs::remove_file(&self.path).await;
        for suffix in ["-wal", "-shm"] {
            let mut side = self.path.clone().into_os_string();
            side.push(suffix);
            let _ = tokio::fs::remove_file(PathBuf::from(side)).await;
        }
    }
}
