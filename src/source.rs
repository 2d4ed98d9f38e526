//! In-memory event stream consumed by the simulation kernel.
//!
//! Ingesting exchange-native data formats is explicitly out of scope: this
//! is a thin adapter over a pre-sorted `Vec<Event>` an external collaborator
//! has already parsed and normalized. Each logical market event is seen
//! twice by the kernel — once routed to the exchange processor at its
//! exchange timestamp, once to the local processor at its local timestamp —
//! so this keeps one independent cursor per timestamp ordering rather than
//! materializing two physical copies of every record.

use crate::types::Event;

/// A pre-sorted, in-memory event stream with independent exchange-time and
/// local-time cursors.
pub struct EventSource {
    events: Vec<Event>,
    exch_order: Vec<usize>,
    local_order: Vec<usize>,
    exch_cursor: usize,
    local_cursor: usize,
}

impl EventSource {
    /// Builds the stream from `events`, assumed sorted by
    /// `min(exch_ts, local_ts)`; behavior on an unsorted stream is
    /// undefined, per the event stream's documented assumption.
    pub fn new(events: Vec<Event>) -> Self {
        let mut exch_order: Vec<usize> = (0..events.len()).collect();
        exch_order.sort_by_key(|&i| (events[i].exch_ts, i));
        let mut local_order: Vec<usize> = (0..events.len()).collect();
        local_order.sort_by_key(|&i| (events[i].local_ts, i));
        Self {
            events,
            exch_order,
            local_order,
            exch_cursor: 0,
            local_cursor: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Exchange timestamp of the next unconsumed event in exchange-time
    /// order, or `i64::MAX` if exhausted.
    pub fn peek_exch_ts(&self) -> i64 {
        self.exch_order
            .get(self.exch_cursor)
            .map(|&i| self.events[i].exch_ts)
            .unwrap_or(i64::MAX)
    }

    /// Local timestamp of the next unconsumed event in local-time order, or
    /// `i64::MAX` if exhausted.
    pub fn peek_local_ts(&self) -> i64 {
        self.local_order
            .get(self.local_cursor)
            .map(|&i| self.events[i].local_ts)
            .unwrap_or(i64::MAX)
    }

    pub fn next_exch(&mut self) -> Option<&Event> {
        let i = *self.exch_order.get(self.exch_cursor)?;
        self.exch_cursor += 1;
        Some(&self.events[i])
    }

    pub fn next_local(&mut self) -> Option<&Event> {
        let i = *self.local_order.get(self.local_cursor)?;
        self.local_cursor += 1;
        Some(&self.events[i])
    }
}
