//! Ordered beat listeners.
//!
//! Listeners are plain keys (an actor id, the combo tracker, ...), called in
//! subscription order. A pass is a cursor over a subscription-sequence range,
//! so the registry can be mutated between listener calls without disturbing
//! the iteration: removed keys are skipped, keys added mid-pass wait for the
//! next pass.

use reefbeat_core::error::ConfigError;

/// What a listener wants after being called in closure-form dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    Keep,
    Unsubscribe,
}

/// Cursor over one dispatch pass.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPass {
    beat: i64,
    after_seq: Option<u64>,
    limit_seq: u64,
}

impl DispatchPass {
    pub fn beat(&self) -> i64 {
        self.beat
    }
}

#[derive(Debug, Clone)]
pub struct ListenerRegistry<K> {
    /// Sorted by subscription sequence.
    entries: Vec<(u64, K)>,
    next_seq: u64,
}

impl<K> Default for ListenerRegistry<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<K: Copy + Eq> ListenerRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener at the end of the order. Returns false (and keeps the
    /// original position) if it is already subscribed.
    pub fn subscribe(&mut self, key: K) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.entries.push((self.next_seq, key));
        self.next_seq += 1;
        true
    }

    /// Remove a listener. Unknown keys are ignored.
    pub fn unsubscribe(&mut self, key: &K) -> bool {
        match self.entries.iter().position(|(_, k)| k == key) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|(_, k)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(_, k)| *k)
    }

    pub fn require_listeners(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            Err(ConfigError::NoListeners)
        } else {
            Ok(())
        }
    }

    /// Start a pass over everything subscribed right now.
    pub fn begin_dispatch(&self, beat: i64) -> DispatchPass {
        DispatchPass {
            beat,
            after_seq: None,
            limit_seq: self.next_seq,
        }
    }

    /// Next listener of the pass that is still subscribed.
    pub fn next_listener(&self, pass: &mut DispatchPass) -> Option<K> {
        let start = match pass.after_seq {
            Some(after) => self.entries.partition_point(|(seq, _)| *seq <= after),
            None => 0,
        };
        let (seq, key) = *self.entries.get(start)?;
        if seq >= pass.limit_seq {
            return None;
        }
        pass.after_seq = Some(seq);
        Some(key)
    }

    /// Call every listener once, in order.
    pub fn dispatch<F>(&mut self, beat: i64, mut listener: F)
    where
        F: FnMut(K, i64) -> ListenerAction,
    {
        let mut pass = self.begin_dispatch(beat);
        while let Some(key) = self.next_listener(&mut pass) {
            if listener(key, beat) == ListenerAction::Unsubscribe {
                self.unsubscribe(&key);
            }
        }
    }
}
