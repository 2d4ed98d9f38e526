//! Picks the next action the kernel advances to, among the market-data and
//! order-bus streams.

/// The four sources of events a single-asset kernel interleaves. Declared
/// in the tie-break order the kernel must prefer on equal timestamps: the
/// exchange reacts to market data before it services client orders that
/// might depend on it, and the local processor updates its own view before
/// observing an acknowledgement built on a now-stale view.
#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum EventType {
    /// Next market-data record, by exchange timestamp.
    ExchData,
    /// Head of the local-to-exchange order bus.
    ExchOrder,
    /// Next market-data record, by local timestamp.
    LocalData,
    /// Head of the exchange-to-local order bus.
    LocalOrder,
}

const SLOTS: [EventType; 4] = [
    EventType::ExchData,
    EventType::ExchOrder,
    EventType::LocalData,
    EventType::LocalOrder,
];

#[derive(Clone, Copy, Debug)]
pub struct NextEvent {
    pub timestamp: i64,
    pub ty: EventType,
}

/// Tracks the next pending timestamp for each of the four event sources and
/// picks the earliest, breaking ties by [`SLOTS`] order.
pub struct EventSet {
    timestamp: [i64; 4],
}

impl EventSet {
    pub fn new() -> Self {
        Self { timestamp: [i64::MAX; 4] }
    }

    pub fn next(&self) -> Option<NextEvent> {
        let mut slot = 0;
        let mut ts = self.timestamp[0];
        for (i, &t) in self.timestamp.iter().enumerate().skip(1) {
            if t < ts {
                ts = t;
                slot = i;
            }
        }
        if ts == i64::MAX {
            None
        } else {
            Some(NextEvent { timestamp: ts, ty: SLOTS[slot] })
        }
    }

    pub fn update_exch_data(&mut self, timestamp: i64) {
        self.timestamp[0] = timestamp;
    }

    pub fn update_exch_order(&mut self, timestamp: i64) {
        self.timestamp[1] = timestamp;
    }

    pub fn update_local_data(&mut self, timestamp: i64) {
        self.timestamp[2] = timestamp;
    }

    pub fn update_local_order(&mut self, timestamp: i64) {
        self.timestamp[3] = timestamp;
    }

    pub fn invalidate_exch_data(&mut self) {
        self.timestamp[0] = i64::MAX;
    }

    pub fn invalidate_local_data(&mut self) {
        self.timestamp[2] = i64::MAX;
    }
}

impl Default for EventSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_resolve_exch_data_before_exch_order_before_local_data_before_local_order() {
        let mut evs = EventSet::new();
        evs.update_exch_data(10);
        evs.update_exch_order(10);
        evs.update_local_data(10);
        evs.update_local_order(10);
        assert_eq!(evs.next().unwrap().ty, EventType::ExchData);

        evs.invalidate_exch_data();
        assert_eq!(evs.next().unwrap().ty, EventType::ExchOrder);
    }

    #[test]
    fn empty_set_has_no_next_event() {
        let evs = EventSet::new();
        assert!(evs.next().is_none());
    }
}
