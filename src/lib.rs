pub mod blob;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod ops;
pub mod utils;

pub use engine::EngineContext;
pub use error::LookbookError;
pub use ops::{Operation, Outcome};
