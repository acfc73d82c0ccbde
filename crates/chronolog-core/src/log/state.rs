//! Ordering state: pending-by-start-time index plus the waiter queue.
//!
//! The index and the waiter queue must stay consistent with each other, so
//! they live in one struct behind one mutex. This module only tracks ids and
//! blocked polls; task records themselves live in the registry.

use std::collections::{BTreeMap, VecDeque};

use tokio::sync::oneshot;

use super::TaskId;

/// One blocked poll. The ticket deregisters it on timeout.
#[derive(Debug)]
pub(crate) struct Waiter {
    pub ticket: u64,
    pub slot: oneshot::Sender<String>,
}

/// Pending index + waiter queue. Always locked as a pair.
#[derive(Debug, Default)]
pub(crate) struct OrderState {
    /// Live task ids bucketed by start time. Order within a bucket is
    /// insertion order.
    pending: BTreeMap<i64, VecDeque<TaskId>>,
    /// Blocked polls in arrival order.
    waiters: VecDeque<Waiter>,
    next_ticket: u64,
}

impl OrderState {
    pub fn insert_pending(&mut self, start_time: i64, id: TaskId) {
        self.pending.entry(start_time).or_default().push_back(id);
    }

    /// The single earliest bucket. Later buckets are never inspected: an
    /// unresolved task at the head blocks every later completion.
    pub fn earliest_bucket(&self) -> Option<(i64, &VecDeque<TaskId>)> {
        self.pending.iter().next().map(|(key, bucket)| (*key, bucket))
    }

    /// Remove one id from its bucket, dropping the bucket when empty.
    pub fn remove_pending(&mut self, start_time: i64, id: &TaskId) {
        if let Some(bucket) = self.pending.get_mut(&start_time) {
            bucket.retain(|t| t != id);
            if bucket.is_empty() {
                self.pending.remove(&start_time);
            }
        }
    }

    /// Put an id back at the front of its bucket. Undo of `remove_pending`
    /// for a drained completion that found no listening waiter.
    pub fn restore_pending(&mut self, start_time: i64, id: TaskId) {
        self.pending.entry(start_time).or_default().push_front(id);
    }

    pub fn has_waiters(&self) -> bool {
        !self.waiters.is_empty()
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Register a new waiter at the back of the queue.
    pub fn register_waiter(&mut self) -> (u64, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.waiters.push_back(Waiter { ticket, slot: tx });
        (ticket, rx)
    }

    /// Pop the longest-waiting poll.
    pub fn pop_waiter(&mut self) -> Option<Waiter> {
        self.waiters.pop_front()
    }

    /// Drop a waiter that gave up. Returns false when the ticket is gone,
    /// meaning a drain already fulfilled it.
    pub fn deregister_waiter(&mut self, ticket: u64) -> bool {
        match self.waiters.iter().position(|w| w.ticket == ticket) {
            Some(idx) => {
                self.waiters.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every waiter. Their receivers observe a closed slot.
    pub fn clear_waiters(&mut self) {
        self.waiters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        TaskId::new(s)
    }

    #[test]
    fn earliest_bucket_follows_start_time_order() {
        let mut state = OrderState::default();
        state.insert_pending(5, id("b"));
        state.insert_pending(1, id("a"));
        state.insert_pending(5, id("c"));

        let (key, bucket) = state.earliest_bucket().unwrap();
        assert_eq!(key, 1);
        assert_eq!(bucket.len(), 1);

        state.remove_pending(1, &id("a"));
        let (key, bucket) = state.earliest_bucket().unwrap();
        assert_eq!(key, 5);
        assert_eq!(bucket.iter().cloned().collect::<Vec<_>>(), vec![id("b"), id("c")]);
    }

    #[test]
    fn removing_last_id_drops_the_bucket() {
        let mut state = OrderState::default();
        state.insert_pending(3, id("only"));
        state.remove_pending(3, &id("only"));
        assert!(state.earliest_bucket().is_none());
    }

    #[test]
    fn restore_puts_id_back_at_the_front() {
        let mut state = OrderState::default();
        state.insert_pending(2, id("a"));
        state.insert_pending(2, id("b"));
        state.remove_pending(2, &id("a"));
        state.restore_pending(2, id("a"));

        let (_, bucket) = state.earliest_bucket().unwrap();
        assert_eq!(bucket.front(), Some(&id("a")));
    }

    #[test]
    fn deregister_reports_whether_the_waiter_was_still_queued() {
        let mut state = OrderState::default();
        let (ticket, _rx) = state.register_waiter();
        assert!(state.deregister_waiter(ticket));
        assert!(!state.deregister_waiter(ticket));
    }

    #[test]
    fn waiters_pop_in_arrival_order() {
        let mut state = OrderState::default();
        let (first, _rx1) = state.register_waiter();
        let (second, _rx2) = state.register_waiter();
        assert_eq!(state.pop_waiter().unwrap().ticket, first);
        assert_eq!(state.pop_waiter().unwrap().ticket, second);
        assert!(!state.has_waiters());
    }
}
