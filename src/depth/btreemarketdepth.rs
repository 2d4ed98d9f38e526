use std::collections::BTreeMap;

use tracing::trace;

use super::{ApplySnapshot, DepthUpdate, MarketDepth, INVALID_MAX, INVALID_MIN};
use crate::{error::SimError, types::Side};

/// `BTreeMap`-backed L2 market depth.
///
/// An ordered map is used rather than a hash map so that best-of-side
/// lookups and the range scans a crossed update or a clear need are
/// `O(log n)` instead of `O(n)`: with a hash map, finding the new best after
/// removing the old one requires scanning every remaining key.
pub struct BTreeMarketDepth {
    tick_size: f64,
    lot_size: f64,
    bid_depth: BTreeMap<i64, f64>,
    ask_depth: BTreeMap<i64, f64>,
}

impl BTreeMarketDepth {
    pub fn new(tick_size: f64, lot_size: f64) -> Self {
        Self {
            tick_size,
            lot_size,
            bid_depth: BTreeMap::new(),
            ask_depth: BTreeMap::new(),
        }
    }

    fn best_bid_tick_raw(&self) -> i64 {
        self.bid_depth.keys().next_back().copied().unwrap_or(INVALID_MIN)
    }

    fn best_ask_tick_raw(&self) -> i64 {
        self.ask_depth.keys().next().copied().unwrap_or(INVALID_MAX)
    }

    /// Removes bid levels at or above `ask_tick`, which would otherwise
    /// cross a newly-set ask level.
    fn trim_crossed_bids(&mut self, ask_tick: i64) {
        let crossed: Vec<i64> = self.bid_depth.range(ask_tick..).map(|(&k, _)| k).collect();
        for k in crossed {
            self.bid_depth.remove(&k);
            trace!(tick = k, "removed crossed bid level");
        }
    }

    /// Removes ask levels at or below `bid_tick`, which would otherwise be
    /// crossed by a newly-set bid level.
    fn trim_crossed_asks(&mut self, bid_tick: i64) {
        let crossed: Vec<i64> = self.ask_depth.range(..=bid_tick).map(|(&k, _)| k).collect();
        for k in crossed {
            self.ask_depth.remove(&k);
            trace!(tick = k, "removed crossed ask level");
        }
    }

    /// Price levels a taker on `side` would walk through to reach
    /// `limit_tick`, ordered best-to-worst: ascending asks for a buyer,
    /// descending bids for a seller. Used by the ladder-walk matching logic.
    pub fn levels_to_take(&self, side: Side, limit_tick: i64) -> Vec<(i64, f64)> {
        match side {
            Side::Buy => self.ask_depth.range(..=limit_tick).map(|(&k, &v)| (k, v)).collect(),
            Side::Sell => {
                let mut levels: Vec<(i64, f64)> =
                    self.bid_depth.range(limit_tick..).map(|(&k, &v)| (k, v)).collect();
                levels.reverse();
                levels
            }
        }
    }
}

impl MarketDepth for BTreeMarketDepth {
    fn update(&mut self, side: Side, price_tick: i64, qty: f64, timestamp: i64) -> DepthUpdate {
        match side {
            Side::Buy => {
                let prev_best = self.best_bid_tick_raw();
                let prev_qty = if qty > 0.0 {
                    self.bid_depth.insert(price_tick, qty)
                } else {
                    self.bid_depth.remove(&price_tick)
                }
                .unwrap_or(0.0);

                if qty > 0.0 && price_tick >= self.best_ask_tick_raw() {
                    self.trim_crossed_asks(price_tick);
                }
                let best = self.best_bid_tick_raw();
                DepthUpdate {
                    price_tick,
                    prev_best_tick: prev_best,
                    best_tick: best,
                    prev_qty,
                    qty,
                    timestamp,
                }
            }
            Side::Sell => {
                let prev_best = self.best_ask_tick_raw();
                let prev_qty = if qty > 0.0 {
                    self.ask_depth.insert(price_tick, qty)
                } else {
                    self.ask_depth.remove(&price_tick)
                }
                .unwrap_or(0.0);

                if qty > 0.0 && price_tick <= self.best_bid_tick_raw() {
                    self.trim_crossed_bids(price_tick);
                }
                let best = self.best_ask_tick_raw();
                DepthUpdate {
                    price_tick,
                    prev_best_tick: prev_best,
                    best_tick: best,
                    prev_qty,
                    qty,
                    timestamp,
                }
            }
        }
    }

    fn clear(&mut self, side: Side, upto_tick: i64) {
        match side {
            Side::Buy => {
                let doomed: Vec<i64> = self.bid_depth.range(..=upto_tick).map(|(&k, _)| k).collect();
                for k in doomed {
                    self.bid_depth.remove(&k);
                }
            }
            Side::Sell => {
                let doomed: Vec<i64> = self.ask_depth.range(upto_tick..).map(|(&k, _)| k).collect();
                for k in doomed {
                    self.ask_depth.remove(&k);
                }
            }
        }
    }

    fn clear_all(&mut self) {
        self.bid_depth.clear();
        self.ask_depth.clear();
    }

    fn best_bid_tick(&self) -> i64 {
        self.best_bid_tick_raw()
    }

    fn best_ask_tick(&self) -> i64 {
        self.best_ask_tick_raw()
    }

    fn best_bid(&self) -> f64 {
        let tick = self.best_bid_tick_raw();
        if tick == INVALID_MIN {
            0.0
        } else {
            tick as f64 * self.tick_size
        }
    }

    fn best_ask(&self) -> f64 {
        let tick = self.best_ask_tick_raw();
        if tick == INVALID_MAX {
            0.0
        } else {
            tick as f64 * self.tick_size
        }
    }

    fn tick_size(&self) -> f64 {
        self.tick_size
    }

    fn lot_size(&self) -> f64 {
        self.lot_size
    }

    fn bid_qty_at_tick(&self, price_tick: i64) -> f64 {
        self.bid_depth.get(&price_tick).copied().unwrap_or(0.0)
    }

    fn ask_qty_at_tick(&self, price_tick: i64) -> f64 {
        self.ask_depth.get(&price_tick).copied().unwrap_or(0.0)
    }

    fn cumulative_qty_through(&self, side: Side, limit_tick: i64) -> f64 {
        match side {
            Side::Buy => self
                .bid_depth
                .range(limit_tick..)
                .map(|(_, &qty)| qty)
                .sum(),
            Side::Sell => self
                .ask_depth
                .range(..=limit_tick)
                .map(|(_, &qty)| qty)
                .sum(),
        }
    }
}

impl ApplySnapshot for BTreeMarketDepth {
    type Error = SimError;

    fn apply_snapshot(
        &mut self,
        bids: &[(i64, f64)],
        asks: &[(i64, f64)],
        _timestamp: i64,
    ) -> Result<(), SimError> {
        let best_bid = bids.iter().map(|(tick, _)| *tick).max().unwrap_or(INVALID_MIN);
        let best_ask = asks.iter().map(|(tick, _)| *tick).min().unwrap_or(INVALID_MAX);
        if best_bid != INVALID_MIN && best_ask != INVALID_MAX && best_bid >= best_ask {
            return Err(SimError::CorruptSnapshot {
                bid_tick: best_bid,
                ask_tick: best_ask,
            });
        }

        self.bid_depth.clear();
        self.ask_depth.clear();
        for &(tick, qty) in bids {
            if qty > 0.0 {
                self.bid_depth.insert(tick, qty);
            }
        }
        for &(tick, qty) in asks {
            if qty > 0.0 {
                self.ask_depth.insert(tick, qty);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth() -> BTreeMarketDepth {
        BTreeMarketDepth::new(0.1, 1.0)
    }

    #[test]
    fn crossing_bid_update_trims_crossed_asks() {
        let mut d = depth();
        d.update(Side::Sell, 1001, 5.0, 0);
        d.update(Side::Sell, 1002, 5.0, 0);
        assert_eq!(d.best_ask_tick(), 1001);

        d.update(Side::Buy, 1001, 3.0, 1);
        assert_eq!(d.best_ask_tick(), 1002);
        assert_eq!(d.ask_qty_at_tick(1001), 0.0);
        assert_eq!(d.best_bid_tick(), 1001);
    }

    #[test]
    fn best_bid_less_than_best_ask_invariant_holds_after_removal() {
        let mut d = depth();
        d.update(Side::Buy, 1000, 5.0, 0);
        d.update(Side::Buy, 999, 5.0, 0);
        d.update(Side::Sell, 1001, 5.0, 0);
        assert_eq!(d.best_bid_tick(), 1000);

        d.update(Side::Buy, 1000, 0.0, 1);
        assert_eq!(d.best_bid_tick(), 999);
        assert!(d.best_bid_tick() < d.best_ask_tick());
    }

    #[test]
    fn snapshot_equal_to_current_book_leaves_it_unchanged() {
        let mut d = depth();
        d.update(Side::Buy, 1000, 5.0, 0);
        d.update(Side::Sell, 1002, 3.0, 0);

        d.apply_snapshot(&[(1000, 5.0)], &[(1002, 3.0)], 1).unwrap();
        assert_eq!(d.best_bid_tick(), 1000);
        assert_eq!(d.best_ask_tick(), 1002);
        assert_eq!(d.bid_qty_at_tick(1000), 5.0);
        assert_eq!(d.ask_qty_at_tick(1002), 3.0);
    }

    #[test]
    fn internally_crossed_snapshot_is_rejected() {
        let mut d = depth();
        let err = d.apply_snapshot(&[(1002, 5.0)], &[(1000, 3.0)], 1).unwrap_err();
        assert!(matches!(err, SimError::CorruptSnapshot { .. }));
    }

    #[test]
    fn cumulative_qty_through_sums_the_ladder() {
        let mut d = depth();
        d.update(Side::Sell, 1000, 2.0, 0);
        d.update(Side::Sell, 1001, 3.0, 0);
        d.update(Side::Sell, 1002, 4.0, 0);
        assert_eq!(d.cumulative_qty_through(Side::Sell, 1001), 5.0);
        assert_eq!(d.cumulative_qty_through(Side::Sell, 1002), 9.0);
    }
}
