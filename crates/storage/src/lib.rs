//! In-memory document storage for ScribeDB.
//!
//! Implements the `Store` collaborator trait from `scribe-core`:
//! - [`MemStore`]: DashMap of collections keyed by namespace
//! - [`Collection`]: documents keyed by `_id` plus an index registry
//! - `filter`: equality matching, `$set`/`$inc`/`$unset` update
//!   expressions, and insert normalization
//!
//! The store knows nothing about batches, locks, or shard versions; the
//! executor crate layers those on top.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod filter;
pub mod store;

pub use collection::{Collection, IndexSpec};
pub use filter::{apply_update, build_upsert_document, fix_document_for_insert, matches};
pub use store::MemStore;
