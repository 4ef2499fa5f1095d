//! Relational store binding.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `models.rs`: Rust structs mirroring DB rows
//! - `columns.rs`: the tables and id-list columns SQL may name
//! - `store.rs`: transactions and guarded id-list reads/writes
//! - `actor.rs`: the actor that serializes operation execution

pub mod actor;
pub mod columns;
pub mod models;
pub mod schema;
pub mod store;

pub use actor::{DbActorHandle, spawn};
pub use columns::{SetColumnRef, Table};
pub use models::{
    CategoryPostRefs, DbCategory, DbClothingArticle, DbComment, DbPost, DbUser, TableRow,
    UserPostRefs,
};
pub use schema::SQLITE_INIT;
pub use store::{LoadedSet, SqliteStore, StoreTx};
