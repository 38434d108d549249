//! Stream session - load, buffer, commit, reconcile
//!
//! A session materializes one stream (or a revision slice of it) in memory,
//! buffers new events, and persists them as a single commit guarded by the
//! store's optimistic concurrency check. After a conflict it folds the
//! commits that beat it to the head into its committed view and re-raises,
//! so the caller can rebuild its decision on fresh state and retry.

use sediment_common::{Clock, Commit, CommitAttempt, CommitId, EventMessage, Snapshot};
use sediment_store::{CommitStore, EventStoreError, MAX_REVISION, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A single-owner session over one event stream
///
/// Obtained from [`EventStore`](crate::EventStore). The committed view holds
/// the events whose revision falls inside the range the session was opened
/// with; the uncommitted buffer holds events added since the last commit.
pub struct OptimisticEventStream {
    /// Bucket the stream lives in
    bucket_id: String,

    /// Stream this session is bound to
    stream_id: String,

    /// Commit log back-end
    store: Arc<dyn CommitStore>,

    /// Time source for commit stamps
    clock: Arc<dyn Clock>,

    /// Revision of the newest committed event kept in the view
    stream_revision: u64,

    /// Sequence of the newest commit observed
    commit_sequence: u64,

    /// Committed events inside the loaded revision range, in store order
    committed_events: Vec<EventMessage>,

    /// Headers accumulated from folded commits, later commits win
    committed_headers: HashMap<String, String>,

    /// Events added but not yet persisted
    uncommitted_events: Vec<EventMessage>,

    /// Headers to merge on the next commit
    uncommitted_headers: HashMap<String, String>,

    /// Every commit ID this session has folded in
    seen_commit_ids: HashSet<CommitId>,

    /// Terminal flag, set by dispose
    disposed: bool,
}

impl OptimisticEventStream {
    /// Create a fresh session with nothing loaded
    pub(crate) fn new(
        bucket_id: String,
        stream_id: String,
        store: Arc<dyn CommitStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bucket_id,
            stream_id,
            store,
            clock,
            stream_revision: 0,
            commit_sequence: 0,
            committed_events: Vec::new(),
            committed_headers: HashMap::new(),
            uncommitted_events: Vec::new(),
            uncommitted_headers: HashMap::new(),
            seen_commit_ids: HashSet::new(),
            disposed: false,
        }
    }

    /// Open a session over `[min_revision, max_revision]`, eagerly loading
    /// and folding the stream's commits in that range.
    ///
    /// Fails with [`EventStoreError::StreamNotFound`] when `min_revision` is
    /// positive and the range produced no committed events; opening at
    /// `min_revision = 0` yields an empty session for a genuinely empty
    /// stream.
    pub(crate) async fn open(
        bucket_id: String,
        stream_id: String,
        store: Arc<dyn CommitStore>,
        clock: Arc<dyn Clock>,
        min_revision: u64,
        max_revision: u64,
    ) -> Result<Self> {
        let mut session = Self::new(bucket_id, stream_id, store, clock);

        let commits = session
            .store
            .get_from(
                &session.bucket_id,
                &session.stream_id,
                min_revision,
                max_revision,
            )
            .await?;
        session.populate(min_revision, max_revision, commits);

        if min_revision > 0 && session.committed_events.is_empty() {
            return Err(EventStoreError::StreamNotFound {
                bucket_id: session.bucket_id,
                stream_id: session.stream_id,
            });
        }

        Ok(session)
    }

    /// Open a session on top of a snapshot, loading only the commits above
    /// the snapshot's revision.
    pub(crate) async fn open_from_snapshot(
        snapshot: Snapshot,
        store: Arc<dyn CommitStore>,
        clock: Arc<dyn Clock>,
        max_revision: u64,
    ) -> Result<Self> {
        let mut session = Self::new(snapshot.bucket_id, snapshot.stream_id, store, clock);
        session.stream_revision = snapshot.stream_revision;

        let min_revision = snapshot.stream_revision + 1;
        let commits = session
            .store
            .get_from(
                &session.bucket_id,
                &session.stream_id,
                min_revision,
                max_revision,
            )
            .await?;
        session.populate(min_revision, max_revision, commits);

        Ok(session)
    }

    // === ACCESSORS ===

    /// Bucket the stream lives in
    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    /// Stream this session is bound to
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Revision of the newest committed event kept in the view
    pub fn stream_revision(&self) -> u64 {
        self.stream_revision
    }

    /// Sequence of the newest commit observed
    pub fn commit_sequence(&self) -> u64 {
        self.commit_sequence
    }

    /// Committed events inside the loaded range, read-only
    pub fn committed_events(&self) -> &[EventMessage] {
        &self.committed_events
    }

    /// Headers accumulated from folded commits, read-only
    pub fn committed_headers(&self) -> &HashMap<String, String> {
        &self.committed_headers
    }

    /// Events added but not yet persisted, read-only
    pub fn uncommitted_events(&self) -> &[EventMessage] {
        &self.uncommitted_events
    }

    /// Headers staged for the next commit, read-only
    pub fn uncommitted_headers(&self) -> &HashMap<String, String> {
        &self.uncommitted_headers
    }

    /// Headers staged for the next commit; the only mutable exposed
    /// collection
    pub fn uncommitted_headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.uncommitted_headers
    }

    /// Whether the session has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // === OPERATIONS ===

    /// Append an event to the uncommitted buffer
    ///
    /// Accepts anything convertible into an [`EventMessage`], such as a bare
    /// body. No revision is assigned until the buffer is committed. Fails
    /// with [`EventStoreError::NullArgument`] on an empty body and
    /// [`EventStoreError::Disposed`] after dispose.
    pub fn add(&mut self, event: impl Into<EventMessage>) -> Result<()> {
        if self.disposed {
            return Err(EventStoreError::Disposed);
        }

        let event = event.into();
        if event.body.is_empty() {
            return Err(EventStoreError::NullArgument("event body".to_string()));
        }

        self.uncommitted_events.push(event);
        Ok(())
    }

    /// Persist the uncommitted buffer as one commit
    ///
    /// With an empty buffer this is a no-op that never touches the store.
    /// On success the persisted commit is folded into the committed view and
    /// the buffer is cleared. On [`EventStoreError::Concurrency`] the
    /// session folds in the commits that arrived since its last observed
    /// head and re-raises with the buffer intact, so the caller can rebuild
    /// its decision and retry. Every other failure leaves the session
    /// unchanged.
    pub async fn commit_changes(&mut self, commit_id: CommitId) -> Result<()> {
        if self.disposed {
            return Err(EventStoreError::Disposed);
        }
        if self.seen_commit_ids.contains(&commit_id) {
            tracing::debug!(
                "[{}/{}] suppressing duplicate commit {}",
                self.bucket_id,
                self.stream_id,
                commit_id
            );
            return Err(EventStoreError::DuplicateCommit {
                commit_id,
                stream_id: self.stream_id.clone(),
            });
        }
        if self.uncommitted_events.is_empty() {
            return Ok(());
        }

        let attempt = self.build_attempt(commit_id);
        tracing::debug!(
            "[{}/{}] committing {} events as sequence {} (revision {})",
            self.bucket_id,
            self.stream_id,
            attempt.events.len(),
            attempt.commit_sequence,
            attempt.stream_revision
        );

        let outcome = self.store.commit(attempt).await;
        match outcome {
            Ok(commit) => {
                let min_revision = self.stream_revision + 1;
                let max_revision = commit.stream_revision;
                self.populate(min_revision, max_revision, vec![commit]);
                self.clear_changes();
                Ok(())
            }
            Err(conflict @ EventStoreError::Concurrency { .. }) => {
                tracing::warn!(
                    "[{}/{}] concurrent append detected at revision {}, reconciling",
                    self.bucket_id,
                    self.stream_id,
                    self.stream_revision
                );
                let min_revision = self.stream_revision + 1;
                let commits = self
                    .store
                    .get_from(&self.bucket_id, &self.stream_id, min_revision, MAX_REVISION)
                    .await?;
                self.populate(min_revision, MAX_REVISION, commits);
                Err(conflict)
            }
            Err(err) => Err(err),
        }
    }

    /// Drop the uncommitted events and headers
    pub fn clear_changes(&mut self) {
        self.uncommitted_events.clear();
        self.uncommitted_headers.clear();
    }

    /// Mark the session terminal; every later effectful operation fails
    /// with [`EventStoreError::Disposed`]
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    // === INTERNALS ===

    /// Assemble the commit attempt for the current buffer
    fn build_attempt(&self, commit_id: CommitId) -> CommitAttempt {
        CommitAttempt {
            bucket_id: self.bucket_id.clone(),
            stream_id: self.stream_id.clone(),
            commit_id,
            commit_sequence: self.commit_sequence + 1,
            stream_revision: self.stream_revision + self.uncommitted_events.len() as u64,
            commit_stamp: self.clock.now(),
            headers: self.uncommitted_headers.clone(),
            events: self.uncommitted_events.clone(),
        }
    }

    /// Fold commits into the committed view, keeping only the events whose
    /// revision lies inside `[min_revision, max_revision]`
    ///
    /// The ID and sequence of every commit are recorded before its range is
    /// inspected, so a commit whose events all lie above `max_revision`
    /// still advances `commit_sequence` and arms duplicate suppression; it
    /// also ends the fold, since later commits lie higher still.
    fn populate(&mut self, min_revision: u64, max_revision: u64, commits: Vec<Commit>) {
        for commit in commits {
            self.seen_commit_ids.insert(commit.commit_id);
            self.commit_sequence = commit.commit_sequence;

            let first = commit.first_revision();
            if first > max_revision {
                return;
            }

            self.committed_headers.extend(commit.headers);

            let mut revision = first;
            for event in commit.events {
                if revision > max_revision {
                    break;
                }
                if revision >= min_revision {
                    self.committed_events.push(event);
                    self.stream_revision = revision;
                }
                revision += 1;
            }
        }
    }
}
