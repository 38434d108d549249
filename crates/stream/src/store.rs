//! Entry point producing stream sessions
//!
//! Holds the commit log back-end and the clock; every session it produces
//! shares both.

use crate::OptimisticEventStream;
use sediment_common::{Clock, Snapshot, SystemClock};
use sediment_store::{CommitStore, MAX_REVISION, Result};
use std::sync::Arc;

/// Factory for stream sessions over one commit log back-end
#[derive(Clone)]
pub struct EventStore {
    /// Commit log back-end shared by all sessions
    store: Arc<dyn CommitStore>,

    /// Time source for commit stamps
    clock: Arc<dyn Clock>,
}

impl EventStore {
    /// Create a factory over the given back-end, stamping commits with the
    /// system clock
    pub fn new(store: Arc<dyn CommitStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a factory with an explicit clock (deterministic tests)
    pub fn with_clock(store: Arc<dyn CommitStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Start a fresh session with nothing loaded
    ///
    /// The first commit will carry sequence 1; the stream itself comes into
    /// existence when that commit is persisted.
    pub fn create_stream(&self, bucket_id: &str, stream_id: &str) -> OptimisticEventStream {
        OptimisticEventStream::new(
            bucket_id.to_string(),
            stream_id.to_string(),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
        )
    }

    /// Open a session over `[min_revision, max_revision]`
    ///
    /// Fails with [`EventStoreError::StreamNotFound`] when `min_revision` is
    /// positive and nothing in the range could be loaded.
    ///
    /// [`EventStoreError::StreamNotFound`]: sediment_store::EventStoreError::StreamNotFound
    pub async fn open_stream(
        &self,
        bucket_id: &str,
        stream_id: &str,
        min_revision: u64,
        max_revision: u64,
    ) -> Result<OptimisticEventStream> {
        OptimisticEventStream::open(
            bucket_id.to_string(),
            stream_id.to_string(),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            min_revision,
            max_revision,
        )
        .await
    }

    /// Open a session over the whole stream
    pub async fn open_stream_full(
        &self,
        bucket_id: &str,
        stream_id: &str,
    ) -> Result<OptimisticEventStream> {
        self.open_stream(bucket_id, stream_id, 0, MAX_REVISION).await
    }

    /// Open a session on top of a snapshot, loading commits above the
    /// snapshot's revision up to `max_revision`
    pub async fn open_from_snapshot(
        &self,
        snapshot: Snapshot,
        max_revision: u64,
    ) -> Result<OptimisticEventStream> {
        OptimisticEventStream::open_from_snapshot(
            snapshot,
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            max_revision,
        )
        .await
    }

    /// The underlying commit log, for snapshot and admin operations
    pub fn store(&self) -> &Arc<dyn CommitStore> {
        &self.store
    }
}
