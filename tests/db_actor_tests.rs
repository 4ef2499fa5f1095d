mod common;

use common::TestDb;
use lookbook::{Operation, Outcome};
use lookbook_assoc::{Tally, ToggleAction};
use serde_json::json;

fn op(value: serde_json::Value) -> Operation {
    serde_json::from_value(value).unwrap()
}

fn created_id(outcome: Outcome) -> i64 {
    match outcome {
        Outcome::Created { id } => id,
        other => panic!("expected Created, got {other:?}"),
    }
}

#[tokio::test]
async fn actor_executes_operations_end_to_end() {
    let db = TestDb::new("actor").await;
    let handle = lookbook::db::spawn(db.ctx.clone()).await.unwrap();

    let user = created_id(
        handle
            .execute(op(json!({
                "type": "create_user",
                "data": { "username": "ada", "email": "ada@example.com", "gender": "F", "age": 36, "height": "165cm" }
            })))
            .await
            .unwrap(),
    );
    created_id(
        handle
            .execute(op(json!({ "type": "create_category", "data": { "name": "Street" } })))
            .await
            .unwrap(),
    );

    let created = match handle
        .execute(op(json!({
            "type": "create_post",
            "data": { "owner_id": user, "category": "Street", "clothing_items": ["Coat"], "image_base64": common::IMAGE_B64 }
        })))
        .await
        .unwrap()
    {
        Outcome::PostCreated(created) => created,
        other => panic!("expected PostCreated, got {other:?}"),
    };
    let article = created.clothing_article_ids[0];

    let outcome = handle
        .execute(op(json!({
            "type": "toggle_favorite",
            "data": { "user_id": user, "target": "post", "item_id": created.post_id }
        })))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Toggled {
            action: ToggleAction::Added
        }
    );

    let outcome = handle
        .execute(op(json!({
            "type": "vote",
            "data": { "article_id": article, "voter_id": user, "direction": "dislike", "op": "add" }
        })))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Tally(Tally {
            percentage_approve: 0,
            total_votes: 1
        })
    );

    let outcome = handle
        .execute(op(json!({ "type": "delete_post", "data": { "post_id": created.post_id } })))
        .await
        .unwrap();
    let Outcome::PostDeleted(report) = outcome else {
        panic!("expected PostDeleted");
    };
    assert_eq!(report.users_updated, 1);
    assert_eq!(report.categories_updated, 1);

    let err = handle
        .execute(op(json!({ "type": "post_details", "data": { "post_id": created.post_id } })))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    handle.stop();
    db.cleanup().await;
}
