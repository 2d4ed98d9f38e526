//! Core data model: events, price ticks, and orders.

use std::fmt::{Debug, Formatter};

/// Bit flag marking a buy-side event or order.
pub const BUY: i64 = 1 << 29;
/// Bit flag marking a sell-side event or order.
pub const SELL: i64 = 1 << 28;

/// Event kind, carried as the low bits of [`Event::ev`] alongside the
/// [`BUY`]/[`SELL`] side flag.
pub const DEPTH_EVENT: i64 = 1;
pub const TRADE_EVENT: i64 = 2;
pub const DEPTH_CLEAR_EVENT: i64 = 3;
pub const DEPTH_SNAPSHOT_EVENT: i64 = 4;

const EVENT_KIND_MASK: i64 = 0xff;

/// A single market-data record: a depth level update, a trade print, a
/// depth-clear instruction, or part of a snapshot replay.
///
/// `ev` packs the event kind (low byte) and the [`BUY`]/[`SELL`] side flag,
/// mirroring the wire convention columnar event feeds use so that a whole
/// replay file can be treated as an array of this exact layout.
#[derive(Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct Event {
    pub ev: i64,
    pub exch_ts: i64,
    pub local_ts: i64,
    pub px: f64,
    pub qty: f64,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self.ev & EVENT_KIND_MASK {
            DEPTH_EVENT => EventKind::Depth,
            TRADE_EVENT => EventKind::Trade,
            DEPTH_CLEAR_EVENT => EventKind::DepthClear,
            DEPTH_SNAPSHOT_EVENT => EventKind::DepthSnapshot,
            other => panic!("unrecognized event kind bits: {other}"),
        }
    }

    pub fn side(&self) -> Side {
        if self.ev & BUY == BUY {
            Side::Buy
        } else if self.ev & SELL == SELL {
            Side::Sell
        } else {
            panic!("event carries neither BUY nor SELL flag")
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum EventKind {
    Depth,
    Trade,
    DepthClear,
    DepthSnapshot,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(i8)]
pub enum Side {
    Buy = 1,
    Sell = -1,
}

impl Side {
    pub fn as_f64(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Status {
    None,
    New,
    Expired,
    Filled,
    Canceled,
    PartiallyFilled,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum TimeInForce {
    /// Good-till-canceled: rests at its limit price until filled or canceled.
    GTC,
    /// Good-till-crossing (post-only): rejected if it would cross the book on arrival.
    GTX,
    /// Fill-or-kill: must fill its entire quantity immediately or is expired untouched.
    FOK,
    /// Immediate-or-cancel: fills what it can immediately, the remainder expires.
    IOC,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum OrdType {
    Limit,
    Market,
}

/// A strategy order, generic over the queue-position representation `Q` the
/// configured [`crate::models::queue::QueueModel`] maintains for it.
#[derive(Clone)]
pub struct Order<Q>
where
    Q: Clone,
{
    pub order_id: i64,
    pub side: Side,
    pub qty: f64,
    pub leaves_qty: f64,
    pub price_tick: i64,
    pub tick_size: f64,
    pub order_type: OrdType,
    pub time_in_force: TimeInForce,
    pub status: Status,
    /// Timestamp (exchange clock) at which the order was created or last
    /// transitioned, set by the exchange processor.
    pub exch_timestamp: i64,
    /// Timestamp (local clock) at which the local processor last mirrored
    /// this order's state.
    pub local_timestamp: i64,
    pub exec_price_tick: i64,
    pub exec_qty: f64,
    pub maker: bool,
    /// Queue-model-specific state: estimated volume ahead of this order.
    pub q: Q,
    /// Cleared whenever the local processor mirrors a new status for this
    /// order; the strategy can use it to detect unseen fills/expirations
    /// without diffing snapshots itself.
    pub observed: bool,
}

impl<Q> Order<Q>
where
    Q: Clone + Default,
{
    pub fn new(
        order_id: i64,
        side: Side,
        price_tick: i64,
        tick_size: f64,
        qty: f64,
        order_type: OrdType,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            order_id,
            side,
            qty,
            leaves_qty: qty,
            price_tick,
            tick_size,
            order_type,
            time_in_force,
            status: Status::None,
            exch_timestamp: 0,
            local_timestamp: 0,
            exec_price_tick: 0,
            exec_qty: 0.0,
            maker: false,
            q: Q::default(),
            observed: true,
        }
    }
}

impl<Q> Order<Q>
where
    Q: Clone,
{
    pub fn price(&self) -> f64 {
        self.price_tick as f64 * self.tick_size
    }

    pub fn exec_price(&self) -> f64 {
        self.exec_price_tick as f64 * self.tick_size
    }

    pub fn active(&self) -> bool {
        matches!(self.status, Status::New | Status::PartiallyFilled)
    }

    pub fn cancellable(&self) -> bool {
        self.active()
    }

    /// Replaces this order's fields with `other`'s, preserving the
    /// monotonicity invariant that exchange/local timestamps never move
    /// backward.
    pub fn update(&mut self, other: &Order<Q>) {
        assert!(other.exch_timestamp >= self.exch_timestamp);
        self.qty = other.qty;
        self.leaves_qty = other.leaves_qty;
        self.price_tick = other.price_tick;
        self.tick_size = other.tick_size;
        self.side = other.side;
        self.time_in_force = other.time_in_force;
        self.exch_timestamp = other.exch_timestamp;
        self.status = other.status;
        if other.local_timestamp > 0 {
            self.local_timestamp = other.local_timestamp;
        }
        self.exec_price_tick = other.exec_price_tick;
        self.exec_qty = other.exec_qty;
        self.maker = other.maker;
        self.order_type = other.order_type;
        self.q = other.q.clone();
        self.observed = false;
    }
}

impl<Q> Debug for Order<Q>
where
    Q: Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Order")
            .field("order_id", &self.order_id)
            .field("side", &self.side)
            .field("qty", &self.qty)
            .field("leaves_qty", &self.leaves_qty)
            .field("price_tick", &self.price_tick)
            .field("time_in_force", &self.time_in_force)
            .field("status", &self.status)
            .field("exch_timestamp", &self.exch_timestamp)
            .field("local_timestamp", &self.local_timestamp)
            .field("maker", &self.maker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_round_trips_through_ticks() {
        let order: Order<f64> =
            Order::new(1, Side::Buy, 1000, 0.1, 1.0, OrdType::Limit, TimeInForce::GTC);
        assert!((order.price() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn event_kind_and_side_decode_from_flags() {
        let e = Event {
            ev: DEPTH_EVENT | BUY,
            exch_ts: 1,
            local_ts: 2,
            px: 100.0,
            qty: 1.0,
        };
        assert_eq!(e.kind(), EventKind::Depth);
        assert_eq!(e.side(), Side::Buy);
    }
}
