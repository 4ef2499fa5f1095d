//! Delimiter-encoded association protocol.
//!
//! Every relationship in the lookbook schema is stored as a comma-joined list
//! of identifiers inside a column of the owning row. This crate holds the
//! storage-free rules for reading, toggling, voting on, merging and stripping
//! those lists; the `lookbook` crate binds them to SQLite rows.

pub mod merge;
pub mod set_column;
pub mod toggle;
pub mod vote;

pub use merge::{Associations, group_labels, label_all, merge_associations};
pub use set_column::{DELIMITER, SetColumn, SetColumnError, decode, encode, normalize_identifier};
pub use toggle::{ToggleAction, toggle};
pub use vote::{Tally, VoteChange, VoteDirection, VoteOp, VotePolicy, VoteSets, tally};
