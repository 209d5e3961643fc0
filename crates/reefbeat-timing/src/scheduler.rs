//! Deadline scheduler with cancellation.
//!
//! Min-heap keyed by absolute song seconds with lazy deletion: the live map
//! is the source of truth and cancelled heap entries are discarded when they
//! reach the top. Cancelling is idempotent, and a cancelled deadline never fires.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Handle to a scheduled deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeadlineId(u64);

#[derive(Clone, Debug)]
struct Key {
    at_secs: f64,
    id: u64,
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.at_secs.to_bits() == other.at_secs.to_bits() && self.id == other.id
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed: BinaryHeap is a max-heap. Equal deadlines fire in scheduling order.
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at_secs.total_cmp(&other.at_secs) {
            Ordering::Equal => self.id.cmp(&other.id),
            o => o,
        }
        .reverse()
    }
}

pub struct DeadlineScheduler<M> {
    heap: BinaryHeap<Key>,
    live: HashMap<u64, (f64, M)>,
    next_id: u64,
}

impl<M> Default for DeadlineScheduler<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> DeadlineScheduler<M> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, at_secs: f64, payload: M) -> DeadlineId {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, (at_secs, payload));
        self.heap.push(Key { at_secs, id });
        DeadlineId(id)
    }

    /// Cancel a pending deadline. Returns false if it already fired or was
    /// already cancelled.
    pub fn cancel(&mut self, id: DeadlineId) -> bool {
        self.live.remove(&id.0).is_some()
    }

    pub fn is_pending(&self, id: DeadlineId) -> bool {
        self.live.contains_key(&id.0)
    }

    /// Earliest pending deadline.
    pub fn peek_deadline(&mut self) -> Option<f64> {
        self.clean_top();
        self.heap.peek().map(|k| k.at_secs)
    }

    /// Pop the earliest deadline if it is due at `now_secs`.
    pub fn pop_due(&mut self, now_secs: f64) -> Option<(DeadlineId, f64, M)> {
        self.clean_top();
        let top = self.heap.peek()?;
        if top.at_secs > now_secs {
            return None;
        }
        let key = self.heap.pop()?;
        let (at_secs, payload) = self.live.remove(&key.id)?;
        Some((DeadlineId(key.id), at_secs, payload))
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    fn clean_top(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.live.contains_key(&top.id) {
                break;
            }
            self.heap.pop();
        }
    }
}
