//! Request correlation table.
//!
//! Every outgoing API request is registered here under a fresh correlation
//! id before it is written to the socket. The receive loop resolves entries
//! as correlated responses arrive; callers abandon entries on timeout or
//! cancellation. The table is the only state shared between the receive
//! loop and caller tasks, so all transitions go through the concurrent map.
//!
//! Resolution removes the entry before completing the waiter, which makes
//! at-most-one resolution structural: a second response for the same id
//! finds no entry and is reported as stale.

use std::time::Instant;

use dashmap::DashMap;
use scatter_protocol::messages::ApiResult;
use tokio::sync::oneshot;
use uuid::Uuid;

/// A request awaiting its correlated response.
struct PendingRequest {
    /// Completes the waiting caller. Dropped unsent when the connection is
    /// torn down, which the caller observes as a closed slot.
    slot: oneshot::Sender<ApiResult>,
    /// Operation selector, kept for diagnostics.
    kind: String,
    /// When the request was registered.
    created_at: Instant,
}

/// In-flight table matching responses back to waiting callers.
#[derive(Default)]
pub struct Correlator {
    pending: DashMap<String, PendingRequest>,
}

impl Correlator {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request and return its correlation id together with
    /// the slot the caller suspends on. Ids are UUIDs, issued exactly once.
    pub fn register(&self, kind: &str) -> (String, oneshot::Receiver<ApiResult>) {
        let id = Uuid::new_v4().to_string();
        let (slot, receiver) = oneshot::channel();
        self.pending.insert(
            id.clone(),
            PendingRequest {
                slot,
                kind: kind.to_string(),
                created_at: Instant::now(),
            },
        );
        (id, receiver)
    }

    /// Resolve the entry for `id` with the given result.
    ///
    /// Returns `false` when no entry exists, either because the id is
    /// unknown or because the entry was already resolved or abandoned; the
    /// caller logs and drops such responses.
    pub fn resolve(&self, id: &str, result: ApiResult) -> bool {
        match self.pending.remove(id) {
            Some((_, entry)) => {
                tracing::trace!(
                    id,
                    kind = %entry.kind,
                    elapsed_ms = entry.created_at.elapsed().as_millis() as u64,
                    "resolving request"
                );
                // The waiter may have raced an abandon; its absence is fine.
                let _ = entry.slot.send(result);
                true
            }
            None => false,
        }
    }

    /// Remove an entry whose caller gave up on it (timeout or cancel).
    ///
    /// Returns the operation selector of the removed entry, if one existed.
    pub fn abandon(&self, id: &str) -> Option<String> {
        self.pending.remove(id).map(|(_, entry)| entry.kind)
    }

    /// Drop every pending entry, waking each waiter with a closed slot.
    ///
    /// Used on teardown; the request path maps the closed slot to a
    /// disconnection failure. Returns how many entries were dropped.
    pub fn fail_all(&self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Number of requests currently in flight.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no requests are in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
