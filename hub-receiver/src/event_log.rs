//! Bounded, most-recent-first log of received webhook events.
//!
//! The log is shared between request handlers. Appends take the write half
//! of a `tokio::sync::RwLock`, snapshots the read half, so any number of
//! readers proceed in parallel while a writer excludes everyone else. The
//! lock is fair: queued writers are not starved by a stream of readers.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

/// A decoded webhook payload. Stored and returned verbatim.
pub type Event = Map<String, Value>;

/// Shared handle to the event log.
///
/// Cloning is cheap and every clone refers to the same underlying log.
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<EventLogInner>,
}

struct EventLogInner {
    capacity: usize,
    events: RwLock<VecDeque<Event>>,
}

impl EventLog {
    /// Create an empty log retaining at most `capacity` events.
    ///
    /// A capacity of zero is raised to one so the latest event is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(EventLogInner {
                capacity,
                events: RwLock::new(VecDeque::with_capacity(capacity)),
            }),
        }
    }

    /// Insert `event` at index 0, evicting the oldest entry when full.
    ///
    /// Returns the number of events retained after the insert.
    pub async fn append(&self, event: Event) -> usize {
        let mut events = self.inner.events.write().await;

        if events.len() == self.inner.capacity {
            events.pop_back();
            debug!(capacity = self.inner.capacity, "event_log_evicted_oldest");
        }
        events.push_front(event);
        events.len()
    }

    /// Copy of the log as of one consistent moment, newest first.
    pub async fn snapshot(&self) -> Vec<Event> {
        let events = self.inner.events.read().await;
        events.iter().cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(n: u64) -> Event {
        match json!({ "seq": n }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn seqs(events: &[Event]) -> Vec<u64> {
        events.iter().map(|e| e["seq"].as_u64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_snapshot_is_reverse_insertion_order() {
        let log = EventLog::new(10);
        for n in 1..=4 {
            log.append(event(n)).await;
        }

        assert_eq!(seqs(&log.snapshot().await), vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_evicts_oldest_at_capacity() {
        let log = EventLog::new(3);
        let mut retained = Vec::new();
        for n in 1..=5 {
            retained.push(log.append(event(n)).await);
        }

        assert_eq!(retained, vec![1, 2, 3, 3, 3]);
        assert_eq!(seqs(&log.snapshot().await), vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_latest() {
        let log = EventLog::new(0);
        assert_eq!(log.capacity(), 1);

        log.append(event(1)).await;
        log.append(event(2)).await;

        assert_eq!(seqs(&log.snapshot().await), vec![2]);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_copy() {
        let log = EventLog::new(10);
        log.append(event(1)).await;

        let before = log.snapshot().await;
        log.append(event(2)).await;

        assert_eq!(seqs(&before), vec![1]);
        assert_eq!(seqs(&log.snapshot().await), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_empty_log() {
        let log = EventLog::new(10);

        assert!(log.snapshot().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_all_present() {
        let log = EventLog::new(1000);

        let handles: Vec<_> = (0..200)
            .map(|n| {
                let log = log.clone();
                tokio::spawn(async move {
                    log.append(event(n)).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen = seqs(&log.snapshot().await);
        assert_eq!(seen.len(), 200);
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_state() {
        let log = EventLog::new(1000);

        let writer = {
            let log = log.clone();
            tokio::spawn(async move {
                for n in 0..300 {
                    log.append(event(n)).await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let log = log.clone();
                tokio::spawn(async move {
                    for _ in 0..100 {
                        let snapshot = seqs(&log.snapshot().await);
                        // A single writer appends 0, 1, 2, ... so every consistent
                        // state is a strictly descending run ending at 0.
                        let expected: Vec<u64> = (0..snapshot.len() as u64).rev().collect();
                        assert_eq!(snapshot, expected);
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
