//! L2 order book reconstruction.

mod btreemarketdepth;

pub use btreemarketdepth::BTreeMarketDepth;

use crate::types::Side;

/// Sentinel best-bid tick when the bid side is empty.
pub const INVALID_MIN: i64 = i64::MIN;
/// Sentinel best-ask tick when the ask side is empty.
pub const INVALID_MAX: i64 = i64::MAX;

/// Result of a single-level depth update: the touched tick, the best tick
/// before and after the update, the quantity before and after, and the
/// timestamp of the update. Callers (the queue model, recorders) use the
/// before/after pair to detect level removal or a change in the best price.
#[derive(Clone, Copy, Debug)]
pub struct DepthUpdate {
    pub price_tick: i64,
    pub prev_best_tick: i64,
    pub best_tick: i64,
    pub prev_qty: f64,
    pub qty: f64,
    pub timestamp: i64,
}

/// L2 order book: two price-keyed ladders of resting quantity, with cached
/// best bid/ask.
pub trait MarketDepth {
    /// Sets the quantity resting at `price_tick` on `side`. A `qty` of zero
    /// removes the level. If this insertion crosses the opposite side
    /// (`best_bid_tick >= best_ask_tick`), the crossed opposite-side levels
    /// are removed.
    fn update(&mut self, side: Side, price_tick: i64, qty: f64, timestamp: i64) -> DepthUpdate;

    /// Removes resting levels on `side` up to (and including) `upto_tick`
    /// for bids counted downward from the best, or up to `upto_tick` for
    /// asks counted upward from the best — i.e. it trims the side of the
    /// book that would otherwise be stale past a feed-provided clear bound.
    fn clear(&mut self, side: Side, upto_tick: i64);

    /// Removes every level on both sides.
    fn clear_all(&mut self);

    fn best_bid_tick(&self) -> i64;
    fn best_ask_tick(&self) -> i64;
    fn best_bid(&self) -> f64;
    fn best_ask(&self) -> f64;

    fn tick_size(&self) -> f64;
    fn lot_size(&self) -> f64;

    fn bid_qty_at_tick(&self, price_tick: i64) -> f64;
    fn ask_qty_at_tick(&self, price_tick: i64) -> f64;

    /// Cumulative resting quantity on `side` from the best price through
    /// (and including) `limit_tick`, used by time-in-force checks that must
    /// see the whole ladder rather than just the top.
    fn cumulative_qty_through(&self, side: Side, limit_tick: i64) -> f64;
}

/// Atomically replaces a side's ladder from a snapshot payload. Separate
/// from [`MarketDepth::update`] because a snapshot establishes ground
/// truth and must reject internal corruption rather than silently trim it.
pub trait ApplySnapshot {
    type Error;

    fn apply_snapshot(
        &mut self,
        bids: &[(i64, f64)],
        asks: &[(i64, f64)],
        timestamp: i64,
    ) -> Result<(), Self::Error>;
}
