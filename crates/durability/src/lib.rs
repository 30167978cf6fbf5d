//! Durability collaborators for ScribeDB.
//!
//! Implements the `OpLog` and `DurabilityWaiter` traits from `scribe-core`:
//! - [`MemOpLog`]: monotonic operation timestamps with a bounded tail
//! - [`CommitWaiter`]: condvar wait against replication/journal watermarks
//!
//! Replication itself is out of scope; whatever drives it advances the
//! waiter's watermarks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod oplog;
pub mod waiter;

pub use oplog::{MemOpLog, OpRecord, DEFAULT_TAIL_CAPACITY};
pub use waiter::CommitWaiter;
