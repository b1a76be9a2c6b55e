//! Shared FIFO of pending candidates.
//!
//! The queue is filled once while a session loads and is only drained after
//! that, so `dequeue` never blocks: an empty queue tells a worker to stop.

use crate::types::DomainCandidate;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe FIFO of domain candidates. No priority and no deduplication.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<DomainCandidate>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, candidate: DomainCandidate) {
        self.lock().push_back(candidate);
    }

    /// Pop the oldest candidate, or `None` once the queue is drained.
    pub fn dequeue(&self) -> Option<DomainCandidate> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove everything still queued, returning how many items were dropped.
    pub fn clear(&self) -> usize {
        let mut items = self.lock();
        let dropped = items.len();
        items.clear();
        dropped
    }

    // A worker that panicked mid-push cannot leave the deque half-written,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<DomainCandidate>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FromIterator<DomainCandidate> for WorkQueue {
    fn from_iter<I: IntoIterator<Item = DomainCandidate>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.enqueue(DomainCandidate::new("example", ".com"));
        queue.enqueue(DomainCandidate::new("example", ".net"));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.dequeue().unwrap().as_str(), "example.com");
        assert_eq!(queue.dequeue().unwrap().as_str(), "example.net");
        assert!(queue.dequeue().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let queue: WorkQueue = [".com", ".com", ".io"]
            .iter()
            .map(|tld| DomainCandidate::new("example", tld))
            .collect();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.clear(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_drain_sees_each_item_once() {
        let queue: Arc<WorkQueue> = Arc::new(
            (0..500)
                .map(|i| DomainCandidate::new(&format!("name{}", i), ".com"))
                .collect(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(candidate) = queue.dequeue() {
                        seen.push(candidate);
                    }
                    seen
                })
            })
            .collect();

        let mut counts: HashMap<DomainCandidate, usize> = HashMap::new();
        for handle in handles {
            for candidate in handle.join().unwrap() {
                *counts.entry(candidate).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), 500);
        assert!(counts.values().all(|&n| n == 1));
    }
}
