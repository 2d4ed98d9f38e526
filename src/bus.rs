//! Latency-delayed FIFO channel carrying orders between the local and
//! exchange processors.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::types::Order;

/// A timestamped FIFO queue. Orders are appended with a release timestamp
/// and dequeued only once the receiving side's clock has reached it;
/// within the queue, ties are broken by insertion order since entries are
/// always appended with non-decreasing release timestamps.
#[derive(Clone, Debug)]
pub struct OrderBus<Q>
where
    Q: Clone,
{
    queue: Rc<RefCell<VecDeque<(Order<Q>, i64)>>>,
}

impl<Q> OrderBus<Q>
where
    Q: Clone,
{
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Release timestamp of the head entry, or `i64::MAX` if empty.
    pub fn frontier(&self) -> i64 {
        self.queue.borrow().front().map(|(_, ts)| *ts).unwrap_or(i64::MAX)
    }

    /// Appends `order` with `release_ts`, clamped up to the latest release
    /// timestamp already in the bus so the queue never goes non-monotonic.
    pub fn append(&self, order: Order<Q>, release_ts: i64) {
        let mut queue = self.queue.borrow_mut();
        let release_ts = queue.back().map(|(_, ts)| (*ts).max(release_ts)).unwrap_or(release_ts);
        queue.push_back((order, release_ts));
    }

    /// Removes and returns the head entry if its release timestamp is
    /// `<= current_ts`.
    pub fn pop_ready(&self, current_ts: i64) -> Option<(Order<Q>, i64)> {
        let mut queue = self.queue.borrow_mut();
        if queue.front().map(|(_, ts)| *ts <= current_ts).unwrap_or(false) {
            queue.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}

impl<Q> Default for OrderBus<Q>
where
    Q: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
