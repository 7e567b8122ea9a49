// ── Listener registry ──
//
// In-memory map from event name to subscriber callbacks. Fan-out is
// isolated per callback: one panicking subscriber cannot break delivery
// to the rest, and cannot poison the realtime channel.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// A subscriber callback. Receives the raw event payload.
pub type Listener = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Proof of registration, used to remove the listener later.
///
/// Closures cannot be compared by reference in Rust, so removal is by
/// token rather than by callback identity. Every panel must pair each
/// `add` with a `remove` on teardown to avoid leaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerToken {
    event: String,
    id: u64,
}

impl ListenerToken {
    /// The event name this token was registered under.
    pub fn event(&self) -> &str {
        &self.event
    }
}

struct Registration {
    id: u64,
    callback: Listener,
}

/// Map from event name to an ordered list of callbacks.
///
/// Registration order is preserved per event; `notify` invokes the
/// callbacks registered at call time, in that order. Shared freely
/// between panels -- all methods take `&self`.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<String, Vec<Registration>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`, appended after any existing
    /// listeners for that event.
    pub fn add(
        &self,
        event: &str,
        callback: impl Fn(&serde_json::Value) + Send + Sync + 'static,
    ) -> ListenerToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(Registration {
                id,
                callback: Arc::new(callback),
            });

        ListenerToken {
            event: event.to_string(),
            id,
        }
    }

    /// Remove the listener identified by `token`. Returns `true` if it
    /// was still registered.
    pub fn remove(&self, token: &ListenerToken) -> bool {
        let Some(mut entry) = self.listeners.get_mut(&token.event) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|r| r.id != token.id);
        before != entry.len()
    }

    /// Invoke every callback currently registered for `event`, in
    /// registration order.
    ///
    /// Each callback runs under `catch_unwind`: a panic is logged with
    /// the event name and swallowed so the remaining callbacks still
    /// run and the caller never observes it. An event with no
    /// registrations is a no-op, not an error.
    pub fn notify(&self, event: &str, payload: &serde_json::Value) {
        // Snapshot under the shard lock, invoke outside it, so a
        // callback may add/remove listeners without deadlocking.
        let snapshot: Vec<Listener> = match self.listeners.get(event) {
            Some(entry) => entry.iter().map(|r| Arc::clone(&r.callback)).collect(),
            None => return,
        };

        for callback in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| callback(payload)));
            if result.is_err() {
                tracing::warn!(event, "listener panicked during notify; continuing");
            }
        }
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, |e| e.len())
    }

    /// Remove every listener for every event. Called on disconnect and
    /// sign-out.
    pub fn clear(&self) {
        self.listeners.clear();
    }
}
