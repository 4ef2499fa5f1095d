mod lookbook;

pub use lookbook::{ApiErrorBody, ApiErrorObject, LookbookError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
