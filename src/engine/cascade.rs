//! Post deletion with reference cleanup.
//!
//! Nothing indexes which rows mention a post, so every user and category row
//! is scanned. A row is written only when the post id was actually present in
//! one of its lists; everything else stays byte-identical.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::db::{
    CategoryPostRefs, DbPost, LoadedSet, SetColumnRef, SqliteStore, StoreTx, UserPostRefs,
};
use crate::error::LookbookError;

/// Rows rewritten by a cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub users_updated: usize,
    pub categories_updated: usize,
}

impl CascadeReport {
    fn rows_written(self) -> usize {
        self.users_updated + self.categories_updated
    }
}

/// Strips `post_id` from every `user_posts`, `favorite_posts` and `post_ids`
/// list, then marks the post deleted.
///
/// All of it happens in one transaction. A failure that rolls back cleanly is
/// returned as-is; if the rollback or the commit itself fails after rows were
/// rewritten, the outcome is reported as `PartialCascadeFailure` with the
/// counts reached.
pub async fn delete_post(store: &SqliteStore, post_id: i64) -> Result<CascadeReport, LookbookError> {
    let mut tx = store.begin().await?;

    let post = tx.require_row::<DbPost>(post_id).await?;
    if post.is_deleted() {
        debug!(post_id, "post already deleted");
        return Err(LookbookError::not_found("post", post_id));
    }

    let mut report = CascadeReport::default();
    if let Err(e) = strip_references(&mut tx, post_id, &mut report).await {
        return Err(abort(tx, post_id, report, e).await);
    }
    if let Err(e) = mark_deleted(&mut tx, post_id).await {
        return Err(abort(tx, post_id, report, e).await);
    }

    if let Err(e) = tx.commit().await {
        error!(post_id, error = %e, "cascade commit failed");
        return Err(partial(post_id, report, e));
    }

    info!(
        post_id,
        users_updated = report.users_updated,
        categories_updated = report.categories_updated,
        "post deleted"
    );
    Ok(report)
}

async fn strip_references(
    tx: &mut StoreTx,
    post_id: i64,
    report: &mut CascadeReport,
) -> Result<(), LookbookError> {
    let users = tx.scan_rows::<UserPostRefs>().await?;
    for row in users {
        let mut counted = false;
        for (column, raw) in [
            (SetColumnRef::UserPosts, row.user_posts.as_deref()),
            (SetColumnRef::UserFavoritePosts, row.favorite_posts.as_deref()),
        ] {
            let mut loaded = LoadedSet::from_raw(column, row.id, raw);
            if loaded.set.strip(post_id) > 0 {
                tx.store_set(&loaded).await?;
                // Counted on the first write so a later failure on the same
                // row still reports it.
                if !counted {
                    report.users_updated += 1;
                    counted = true;
                }
            }
        }
    }

    let categories = tx.scan_rows::<CategoryPostRefs>().await?;
    for row in categories {
        let mut loaded =
            LoadedSet::from_raw(SetColumnRef::CategoryPostIds, row.id, row.post_ids.as_deref());
        if loaded.set.strip(post_id) > 0 {
            tx.store_set(&loaded).await?;
            report.categories_updated += 1;
        }
    }
    Ok(())
}

async fn mark_deleted(tx: &mut StoreTx, post_id: i64) -> Result<(), LookbookError> {
    let res = sqlx::query("UPDATE posts SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(post_id)
        .execute(tx.conn())
        .await?;
    if res.rows_affected() == 0 {
        return Err(LookbookError::ConcurrentModification {
            target: format!("posts.deleted_at#{post_id}"),
        });
    }
    Ok(())
}

async fn abort(
    tx: StoreTx,
    post_id: i64,
    report: CascadeReport,
    cause: LookbookError,
) -> LookbookError {
    match tx.rollback().await {
        Ok(()) => {
            warn!(post_id, error = %cause, "cascade rolled back");
            cause
        }
        Err(rollback_err) if report.rows_written() == 0 => {
            warn!(post_id, error = %cause, rollback_error = %rollback_err, "rollback failed before any write");
            cause
        }
        Err(rollback_err) => {
            error!(post_id, error = %cause, rollback_error = %rollback_err, "cascade rollback failed");
            partial(post_id, report, cause)
        }
    }
}

fn partial(post_id: i64, report: CascadeReport, cause: LookbookError) -> LookbookError {
    LookbookError::PartialCascadeFailure {
        post_id,
        users_updated: report.users_updated,
        categories_updated: report.categories_updated,
        source: Box::new(cause),
    }
}
