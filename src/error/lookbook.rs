use lookbook_assoc::SetColumnError;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error as ThisError;

use super::IsRetryable;

/// SQLite result codes (extended codes arrive as the full integer string).
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";
const SQLITE_BUSY_SNAPSHOT: &str = "517";

#[derive(Debug, ThisError)]
pub enum LookbookError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Malformed set column {column}: {source}")]
    MalformedColumn {
        column: &'static str,
        #[source]
        source: SetColumnError,
    },

    #[error("Concurrent modification of {target}")]
    ConcurrentModification { target: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error(
        "Cascade delete of post {post_id} stopped after {users_updated} user row(s) and \
         {categories_updated} category row(s): {source}"
    )]
    PartialCascadeFailure {
        post_id: i64,
        users_updated: usize,
        categories_updated: usize,
        #[source]
        source: Box<LookbookError>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Blob storage error: {0}")]
    Blob(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[source] sqlx::Error),
}

impl LookbookError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LookbookError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn malformed(column: &'static str) -> impl FnOnce(SetColumnError) -> Self {
        move |source| LookbookError::MalformedColumn { column, source }
    }

    /// Stable machine-readable code, used in serialized error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            LookbookError::NotFound { .. } => "NOT_FOUND",
            LookbookError::MalformedColumn { .. } => "MALFORMED_COLUMN",
            LookbookError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            LookbookError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            LookbookError::PartialCascadeFailure { .. } => "PARTIAL_CASCADE_FAILURE",
            LookbookError::InvalidRequest(_) | LookbookError::JsonError(_) => "INVALID_REQUEST",
            LookbookError::Blob(_)
            | LookbookError::IoError(_)
            | LookbookError::RactorError(_)
            | LookbookError::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_body(&self) -> ApiErrorBody {
        let details = match self {
            LookbookError::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
            LookbookError::MalformedColumn { column, .. } => Some(json!({ "column": column })),
            LookbookError::PartialCascadeFailure {
                post_id,
                users_updated,
                categories_updated,
                ..
            } => Some(json!({
                "post_id": post_id,
                "users_updated": users_updated,
                "categories_updated": categories_updated,
            })),
            _ => None,
        };

        let message = match self {
            LookbookError::Blob(_)
            | LookbookError::IoError(_)
            | LookbookError::RactorError(_)
            | LookbookError::DatabaseError(_) => "An internal error occurred.".to_string(),
            other => other.to_string(),
        };

        ApiErrorBody {
            inner: ApiErrorObject {
                code: self.code().to_string(),
                message,
                details,
            },
        }
    }
}

impl From<sqlx::Error> for LookbookError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                LookbookError::StoreUnavailable(err)
            }
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some(SQLITE_BUSY_SNAPSHOT) => LookbookError::ConcurrentModification {
                    target: "database snapshot".to_string(),
                },
                Some(SQLITE_BUSY | SQLITE_LOCKED) => LookbookError::StoreUnavailable(err),
                _ => LookbookError::DatabaseError(err),
            },
            _ => LookbookError::DatabaseError(err),
        }
    }
}

impl IsRetryable for LookbookError {
    fn is_retryable(&self) -> bool {
        matches!(self, LookbookError::ConcurrentModification { .. })
    }
}

/// Standardized error payload.
#[derive(Debug, Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
