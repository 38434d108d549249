//! Optimistic stream sessions over a pluggable commit log
//!
//! This crate provides the stream session, the in-memory object that
//! mediates between an application aggregate and a [`CommitStore`]
//! back-end. The session handles:
//! - Eager range loading and replay into a committed view
//! - Buffering of uncommitted events and headers
//! - Atomic commit attempts with optimistic concurrency control
//! - Reconciliation with durable state after a conflict
//! - Duplicate-commit suppression keyed by writer-chosen commit IDs
//!
//! Store back-ends provide:
//! - Per-stream append linearization
//! - Duplicate and conflict detection against the durable head
//! - Range reads ordered by commit sequence
//!
//! Sessions are single-owner: every effectful operation takes `&mut self`,
//! so concurrent use of one session is rejected at compile time. Concurrent
//! sessions over the same stream coordinate only through the store.
//!
//! [`CommitStore`]: sediment_store::CommitStore

mod session;
mod store;

pub use session::OptimisticEventStream;
pub use store::EventStore;

// Re-export from the contract crate
pub use sediment_store::{CommitStore, EventStoreError, MAX_REVISION, Result};
