//! Commit-log storage contract for the sediment event store
//!
//! A stream is an append-only sequence of commits, each carrying one or more
//! events. Back-ends implement [`CommitStore`]; stream sessions consume it
//! through `Arc<dyn CommitStore>` and never depend on a concrete engine.
//!
//! ## Contract
//!
//! Back-ends must provide:
//! - Range reads ordered by commit sequence
//! - Atomic appends with per-stream optimistic concurrency checks
//! - Duplicate detection keyed by writer-chosen commit IDs
//! - Dispatch bookkeeping and snapshot storage
//!
//! The in-memory implementation in `sediment-store-memory` is the semantics
//! oracle: any other back-end must pass the same conformance scenarios.
//!
//! ## Cancellation
//!
//! Every operation is async; dropping the returned future abandons the call
//! cooperatively. Implementations must keep `commit` all-or-nothing so an
//! abandoned append either persisted the whole commit or nothing at all.

mod error;

pub use error::{EventStoreError, Result};

use async_trait::async_trait;
use sediment_common::{Commit, CommitAttempt, Snapshot};

/// Upper bound meaning "no upper bound" for revision ranges
pub const MAX_REVISION: u64 = u64::MAX;

/// Durable, per-stream-serializable commit log
#[async_trait]
pub trait CommitStore: Send + Sync {
    /// Read the commits of a stream whose revision range intersects
    /// `[min_revision, max_revision]`, ordered by commit sequence ascending.
    ///
    /// Returns an empty vector when the stream does not exist or no commit
    /// intersects the range. Fails with [`EventStoreError::Storage`] on
    /// unrecoverable I/O.
    async fn get_from(
        &self,
        bucket_id: &str,
        stream_id: &str,
        min_revision: u64,
        max_revision: u64,
    ) -> Result<Vec<Commit>>;

    /// Append an attempt atomically and return the persisted commit with any
    /// store-assigned fields filled in.
    ///
    /// Required failure signaling:
    /// - [`EventStoreError::DuplicateCommit`] when a prior commit with the
    ///   same ID exists in the stream
    /// - [`EventStoreError::Concurrency`] when the attempt's sequence is not
    ///   exactly one greater than the durable head
    /// - [`EventStoreError::Storage`] for transport or medium failures
    ///
    /// Appends are serializable per stream; how (lock, conditional write,
    /// transaction) is the implementation's choice.
    async fn commit(&self, attempt: CommitAttempt) -> Result<Commit>;

    /// Flag a commit as handled by downstream dispatch machinery.
    async fn mark_dispatched(&self, commit: &Commit) -> Result<()>;

    /// Read all commits not yet marked as dispatched, in checkpoint order.
    async fn get_undispatched(&self) -> Result<Vec<Commit>>;

    /// Read the newest snapshot of a stream at or below `max_revision`.
    async fn get_snapshot(
        &self,
        bucket_id: &str,
        stream_id: &str,
        max_revision: u64,
    ) -> Result<Option<Snapshot>>;

    /// Store a snapshot. Returns `false` when the stream has no commits yet.
    async fn add_snapshot(&self, snapshot: Snapshot) -> Result<bool>;

    /// Remove a stream's commits and snapshots.
    async fn delete_stream(&self, bucket_id: &str, stream_id: &str) -> Result<()>;

    /// Remove everything the store holds.
    async fn purge(&self) -> Result<()>;
}
