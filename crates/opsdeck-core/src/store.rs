// ── Sequenced snapshot cells ──
//
// Holds the latest value per data domain, stamped with the hub-wide
// sequence number assigned when the value was produced. Poll responses
// and push events race: a slow poll must not overwrite data from a
// fresher push. `offer` rejects any write whose stamp is not newer than
// what the cell already holds.

use tokio::sync::watch;
use tracing::debug;

/// A value stamped with the sequence number of the update that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<T> {
    pub seq: u64,
    pub value: T,
}

/// Watch-backed cell holding the freshest [`Stamped`] value seen.
///
/// Writers call [`offer`](Self::offer); readers either take a snapshot
/// with [`latest`](Self::latest) or subscribe for change notification.
pub struct LatestCell<T> {
    tx: watch::Sender<Option<Stamped<T>>>,
}

impl<T: Clone + Send + Sync + 'static> LatestCell<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Install `value` if `seq` is newer than the held stamp.
    ///
    /// Returns `true` when the value was accepted. Stale writes are
    /// discarded and logged at debug level.
    pub fn offer(&self, seq: u64, value: T) -> bool {
        let mut accepted = false;
        self.tx.send_if_modified(|current| {
            let fresher = current.as_ref().is_none_or(|held| seq > held.seq);
            if fresher {
                *current = Some(Stamped { seq, value: value.clone() });
                accepted = true;
            }
            fresher
        });

        if !accepted {
            debug!(seq, "discarded stale snapshot write");
        }
        accepted
    }

    /// Snapshot of the freshest value, if any update has landed yet.
    pub fn latest(&self) -> Option<Stamped<T>> {
        self.tx.borrow().clone()
    }

    /// Subscribe for change notification. The receiver observes only
    /// accepted (fresh) writes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Stamped<T>>> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for LatestCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_write_is_accepted() {
        let cell = LatestCell::new();
        assert!(cell.offer(1, "a"));
        assert_eq!(cell.latest().unwrap().value, "a");
    }

    #[test]
    fn stale_write_is_discarded() {
        let cell = LatestCell::new();
        assert!(cell.offer(5, "push"));
        // A poll that started before the push completes afterwards with
        // an older stamp. It must lose.
        assert!(!cell.offer(3, "slow poll"));
        assert_eq!(cell.latest().unwrap().value, "push");
        assert_eq!(cell.latest().unwrap().seq, 5);
    }

    #[test]
    fn equal_stamp_is_discarded() {
        let cell = LatestCell::new();
        assert!(cell.offer(2, "first"));
        assert!(!cell.offer(2, "second"));
        assert_eq!(cell.latest().unwrap().value, "first");
    }

    #[tokio::test]
    async fn subscribers_only_see_accepted_writes() {
        let cell = LatestCell::new();
        let mut rx = cell.subscribe();

        cell.offer(4, 40);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().clone().unwrap().seq, 4);

        cell.offer(2, 20); // stale, no notification
        assert!(!rx.has_changed().unwrap());

        cell.offer(6, 60);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().clone().unwrap().value, 60);
    }
}
