//! Sled-backed indexed store for the DAO explorer.
//!
//! Implements every source trait the governance engine reads from, plus the
//! write helpers used by the snapshot importer.

pub mod keys;
pub mod snapshot;
pub mod store;

pub use snapshot::{ExcludedCount, ImportSummary, Snapshot, SnapshotVote};
pub use store::{SledStore, StoreConfig, BUCKET_HEADROOM, MAX_BUCKETS};
