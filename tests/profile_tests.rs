mod common;

use common::TestDb;
use lookbook::LookbookError;
use lookbook::db::SetColumnRef;
use lookbook::engine::{self, FavoriteTarget};

#[tokio::test]
async fn profile_merges_post_and_clothing_favorites() {
    let db = TestDb::new("profile").await;
    let owner = db.user("owner").await;
    let fan = db.user("fan").await;
    let street = db.category("Street").await;
    let shirt_post = db.post(owner, "Street", &["Shirt"]).await;
    let outfit = db.post(owner, "Street", &["Pants", "Hat"]).await;

    engine::toggle_favorite(db.store(), fan, FavoriteTarget::Post, shirt_post.post_id)
        .await
        .unwrap();
    for article in [
        shirt_post.clothing_article_ids[0],
        outfit.clothing_article_ids[0],
        outfit.clothing_article_ids[1],
    ] {
        engine::toggle_favorite(db.store(), fan, FavoriteTarget::Clothing, article)
            .await
            .unwrap();
    }
    engine::toggle_subscription(db.store(), fan, street)
        .await
        .unwrap();

    let profile = engine::user_profile(db.store(), "fan").await.unwrap();
    assert_eq!(profile.user_id, fan);
    assert_eq!(
        profile.categories.get(&street.to_string()).map(String::as_str),
        Some("Street")
    );
    assert_eq!(profile.favorites.len(), 2);
    assert_eq!(
        profile.favorites[&shirt_post.post_id.to_string()],
        "Post,Shirt"
    );
    assert_eq!(profile.favorites[&outfit.post_id.to_string()], "Pants,Hat");

    db.cleanup().await;
}

#[tokio::test]
async fn repeated_clothing_ids_do_not_repeat_labels() {
    let db = TestDb::new("profile_dupes").await;
    let owner = db.user("owner").await;
    let fan = db.user("fan").await;
    db.category("Street").await;
    let post = db.post(owner, "Street", &["Scarf"]).await;
    let scarf = post.clothing_article_ids[0];
    db.set_raw(
        SetColumnRef::UserFavoriteClothing,
        fan,
        Some(&format!("{scarf},{scarf}")),
    )
    .await;

    let profile = engine::user_profile(db.store(), "fan").await.unwrap();
    assert_eq!(profile.favorites[&post.post_id.to_string()], "Scarf");

    db.cleanup().await;
}

#[tokio::test]
async fn clothing_of_deleted_posts_is_left_out() {
    let db = TestDb::new("profile_deleted").await;
    let owner = db.user("owner").await;
    let fan = db.user("fan").await;
    db.category("Street").await;
    let post = db.post(owner, "Street", &["Belt"]).await;
    engine::toggle_favorite(
        db.store(),
        fan,
        FavoriteTarget::Clothing,
        post.clothing_article_ids[0],
    )
    .await
    .unwrap();
    engine::delete_post(db.store(), post.post_id).await.unwrap();

    let profile = engine::user_profile(db.store(), "fan").await.unwrap();
    assert!(profile.favorites.is_empty());

    db.cleanup().await;
}

#[tokio::test]
async fn malformed_id_column_is_reported() {
    let db = TestDb::new("profile_malformed").await;
    let fan = db.user("fan").await;
    db.set_raw(SetColumnRef::UserCategories, fan, Some("1,abc"))
        .await;

    let err = engine::user_profile(db.store(), "fan").await.unwrap_err();
    assert!(matches!(
        err,
        LookbookError::MalformedColumn {
            column: "users.user_categories",
            ..
        }
    ));

    let err = engine::user_profile(db.store(), "nobody").await.unwrap_err();
    assert!(matches!(err, LookbookError::NotFound { entity: "user", .. }));

    db.cleanup().await;
}

#[tokio::test]
async fn duplicate_username_or_email_is_rejected() {
    let db = TestDb::new("users").await;
    db.user("taken").await;

    let availability = engine::check_availability(db.store(), Some("taken"), Some("new@example.com"))
        .await
        .unwrap();
    assert_eq!(availability.username_available, Some(false));
    assert_eq!(availability.email_available, Some(true));

    let err = engine::create_user(
        db.store(),
        engine::NewUser {
            username: "other".to_string(),
            email: "taken@example.com".to_string(),
            gender: "M".to_string(),
            age: 40,
            height: "180cm".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "INVALID_REQUEST");

    db.cleanup().await;
}
