use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::{DbPost, DbUser, LoadedSet, SetColumnRef, SqliteStore};
use crate::error::LookbookError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedComment {
    pub comment_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Inserts a comment row and appends its id to the post's `comments` list.
pub async fn submit_comment(
    store: &SqliteStore,
    post_id: i64,
    owner_id: i64,
    text: &str,
) -> Result<CreatedComment, LookbookError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LookbookError::InvalidRequest(
            "comment text must not be empty".to_string(),
        ));
    }

    let mut tx = store.begin().await?;
    let post = tx.require_row::<DbPost>(post_id).await?;
    if post.is_deleted() {
        return Err(LookbookError::not_found("post", post_id));
    }
    tx.require_row::<DbUser>(owner_id).await?;

    let mut comments =
        LoadedSet::from_raw(SetColumnRef::PostComments, post_id, post.comments.as_deref());

    let created_at = Utc::now();
    let comment_id = sqlx::query(
        "INSERT INTO comments (post_id, owner_id, text, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(post_id)
    .bind(owner_id)
    .bind(text)
    .bind(created_at)
    .execute(tx.conn())
    .await?
    .last_insert_rowid();

    comments
        .set
        .push(comment_id)
        .map_err(LookbookError::malformed(SetColumnRef::PostComments.qualified()))?;
    tx.store_set(&comments).await?;
    tx.commit().await?;

    info!(post_id, owner_id, comment_id, "comment submitted");
    Ok(CreatedComment {
        comment_id,
        created_at,
    })
}

/// Removes `comment_id` from the post's `comments` list. The comment row
/// itself stays; it is simply no longer listed.
pub async fn delete_comment(
    store: &SqliteStore,
    post_id: i64,
    comment_id: i64,
) -> Result<(), LookbookError> {
    let mut tx = store.begin().await?;
    let mut comments = tx.load_set(SetColumnRef::PostComments, post_id).await?;

    if !comments.set.remove(comment_id) {
        warn!(post_id, comment_id, "comment not listed on post");
        return Err(LookbookError::not_found("comment", comment_id));
    }

    tx.store_set(&comments).await?;
    tx.commit().await?;

    info!(post_id, comment_id, "comment removed");
    Ok(())
}
