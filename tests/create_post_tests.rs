mod common;

use common::{IMAGE_B64, TestDb};
use lookbook::LookbookError;
use lookbook::db::SetColumnRef;
use lookbook::engine::{self, NewPost};

fn new_post(owner_id: i64) -> NewPost {
    NewPost {
        owner_id,
        category: "Street".to_string(),
        description: "denim on denim".to_string(),
        clothing_items: vec!["Jacket".to_string(), " ".to_string(), "Jeans".to_string()],
        gender_restriction: "All".to_string(),
        image_base64: Some(IMAGE_B64.to_string()),
    }
}

#[tokio::test]
async fn created_post_is_linked_and_its_image_readable() {
    let db = TestDb::new("create_post").await;
    let owner = db.user("owner").await;
    let category = db.category("Street").await;

    let created = engine::create_post(&db.ctx, new_post(owner)).await.unwrap();
    assert_eq!(created.clothing_article_ids.len(), 2);
    assert_eq!(db.blobs.len().await, 1);

    let id = created.post_id.to_string();
    assert_eq!(
        db.raw(SetColumnRef::UserPosts, owner).await.as_deref(),
        Some(id.as_str())
    );
    assert_eq!(
        db.raw(SetColumnRef::CategoryPostIds, category).await.as_deref(),
        Some(id.as_str())
    );
    let details = engine::post_details(&db.ctx, created.post_id).await.unwrap();
    assert_eq!(details.image_base64.as_deref(), Some(IMAGE_B64));

    db.cleanup().await;
}

#[tokio::test]
async fn failed_creation_leaves_no_image_behind() {
    let db = TestDb::new("create_post_rollback").await;
    let owner = db.user("owner").await;
    let category = db.category("Street").await;
    db.exec(
        "CREATE TRIGGER block_articles BEFORE INSERT ON clothing_articles \
         BEGIN SELECT RAISE(ABORT, 'articles blocked'); END",
    )
    .await;

    let err = engine::create_post(&db.ctx, new_post(owner)).await.unwrap_err();
    assert!(matches!(err, LookbookError::DatabaseError(_)), "{err:?}");
    assert!(db.blobs.is_empty().await);
    let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(db.store().pool())
        .await
        .unwrap();
    assert_eq!(posts, 0);
    assert_eq!(db.raw(SetColumnRef::UserPosts, owner).await.as_deref(), Some(""));
    assert_eq!(
        db.raw(SetColumnRef::CategoryPostIds, category).await.as_deref(),
        Some("")
    );

    // The rowid is handed out again and gets its own image.
    db.exec("DROP TRIGGER block_articles").await;
    let created = engine::create_post(&db.ctx, new_post(owner)).await.unwrap();
    assert_eq!(db.blobs.len().await, 1);
    let details = engine::post_details(&db.ctx, created.post_id).await.unwrap();
    assert_eq!(details.image_base64.as_deref(), Some(IMAGE_B64));

    db.cleanup().await;
}
