//! Deferred actions on the character clock.
//!
//! A plain queue of `(deadline, payload)` pairs. Nothing runs on its own:
//! the owner advances its clock each frame and drains whatever is due.
//! There is no cancellation; payloads carry whatever the owner needs to
//! decide at fire time whether they still apply.

use std::time::Duration;

#[derive(Debug)]
struct Entry<T> {
    deadline: Duration,
    seq: u64,
    payload: T,
}

/// Single-threaded timer queue keyed by clock deadlines.
#[derive(Debug)]
pub struct Timers<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to become due at `deadline`.
    pub fn schedule_at(&mut self, deadline: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            deadline,
            seq,
            payload,
        });
    }

    /// Removes and returns every payload due at `now`, earliest first.
    /// Equal deadlines come out in scheduling order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.deadline <= now);
        self.entries = pending;
        due.sort_by_key(|e| (e.deadline, e.seq));
        due.into_iter().map(|e| e.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
