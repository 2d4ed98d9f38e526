//! Queue-position estimation for resting orders.

use crate::{
    depth::{DepthUpdate, MarketDepth},
    types::{Order, Side},
};

/// Estimates where a resting order sits within its price level's queue, so
/// the exchange processor can decide when it becomes fillable.
pub trait QueueModel<Q>
where
    Q: Clone + Default,
{
    /// Seeds `order.q` when the order first rests in the book.
    fn new_order(&self, order: &mut Order<Q>, depth: &dyn MarketDepth);

    /// Advances the queue position after a trade print of `qty` at the
    /// order's price. Returns the portion of `qty` that overshoots past the
    /// front of the queue: zero while volume ahead of the order remains, and
    /// positive once the print has fully drained it. A print that lands
    /// exactly on zero returns zero; only a *further* print reaching past it
    /// actually touches the order, since that overshoot is the volume that
    /// reaches the order itself rather than what was merely ahead of it.
    fn trade(&self, order: &mut Order<Q>, qty: f64, depth: &dyn MarketDepth) -> f64;

    /// Reacts to a depth update at the order's price level.
    fn depth(&self, order: &mut Order<Q>, update: DepthUpdate, depth: &dyn MarketDepth);

    /// True once the order's estimated queue position has been fully
    /// consumed and it is eligible to fill against further incoming supply.
    fn is_filled(&self, order: &Order<Q>, depth: &dyn MarketDepth) -> bool;

    /// Re-seeds the order's queue position from a fresh snapshot quantity
    /// at its price, per the open-question resolution that the snapshot
    /// quantity is used as-is (not reduced by the order's own resting
    /// quantity).
    fn re_seed(&self, order: &mut Order<Q>, snapshot_qty: f64);
}

fn qty_at(depth: &dyn MarketDepth, side: Side, price_tick: i64) -> f64 {
    match side {
        Side::Buy => depth.bid_qty_at_tick(price_tick),
        Side::Sell => depth.ask_qty_at_tick(price_tick),
    }
}

/// Conservative fill model: the estimated queue position decreases only by
/// observed trade volume at the order's price. Depth decreases (likely
/// cancellations) never advance the order's position, only clamp it down
/// if it would otherwise exceed the now-smaller level (an order cannot have
/// more volume ahead of it than the level holds in total).
pub struct RiskAverseQueueModel;

impl QueueModel<f64> for RiskAverseQueueModel {
    fn new_order(&self, order: &mut Order<f64>, depth: &dyn MarketDepth) {
        order.q = qty_at(depth, order.side, order.price_tick);
    }

    fn trade(&self, order: &mut Order<f64>, qty: f64, _depth: &dyn MarketDepth) -> f64 {
        let overshoot = (qty - order.q).max(0.0);
        order.q = (order.q - qty).max(0.0);
        overshoot
    }

    fn depth(&self, order: &mut Order<f64>, update: DepthUpdate, _depth: &dyn MarketDepth) {
        order.q = order.q.min(update.qty);
    }

    fn is_filled(&self, order: &Order<f64>, _depth: &dyn MarketDepth) -> bool {
        order.q <= 0.0
    }

    fn re_seed(&self, order: &mut Order<f64>, snapshot_qty: f64) {
        order.q = snapshot_qty;
    }
}

/// Queue-position state tracked per order by [`ProbabilityQueueModel`]:
/// the estimated volume ahead of the order (`front`), and the trade volume
/// already subtracted this tick (used to avoid double-counting a trade's
/// effect once the matching depth update for it arrives).
#[derive(Clone, Copy, Debug, Default)]
pub struct QueuePos {
    pub front: f64,
    cum_trade_qty: f64,
}

/// A monotone weighting function used to split an unexplained depth
/// decrease between the volume ahead of an order (`front`) and behind it
/// (`back`).
pub trait Probability {
    /// Returns the share of an unexplained decrease attributed to the
    /// front of the queue, in `[0, 1]`.
    fn prob(&self, front: f64, back: f64) -> f64;
}

pub struct LogProbability;

impl Probability for LogProbability {
    fn prob(&self, front: f64, back: f64) -> f64 {
        let f = |x: f64| (1.0 + x).ln();
        f(front) / (f(front) + f(back))
    }
}

pub struct SquareProbability;

impl Probability for SquareProbability {
    fn prob(&self, front: f64, back: f64) -> f64 {
        front.powi(2) / (front.powi(2) + back.powi(2))
    }
}

pub struct PowerProbability {
    n: f64,
}

impl PowerProbability {
    pub fn new(n: f64) -> Self {
        Self { n }
    }
}

impl Probability for PowerProbability {
    fn prob(&self, front: f64, back: f64) -> f64 {
        front.powf(self.n) / (front.powf(self.n) + back.powf(self.n))
    }
}

/// Probability-weighted queue position model: on arrival, the order's
/// position is seeded to the resting volume at its price. Trades subtract
/// their quantity directly. Unexplained depth decreases (not caused by a
/// trade already accounted for) are split between the front and back of
/// the queue using `P`, since cancellations can occur on either side of a
/// resting order.
pub struct ProbabilityQueueModel<P> {
    prob: P,
}

impl<P> ProbabilityQueueModel<P>
where
    P: Probability,
{
    pub fn new(prob: P) -> Self {
        Self { prob }
    }
}

impl<P> QueueModel<QueuePos> for ProbabilityQueueModel<P>
where
    P: Probability,
{
    fn new_order(&self, order: &mut Order<QueuePos>, depth: &dyn MarketDepth) {
        order.q.front = qty_at(depth, order.side, order.price_tick);
        order.q.cum_trade_qty = 0.0;
    }

    fn trade(&self, order: &mut Order<QueuePos>, qty: f64, _depth: &dyn MarketDepth) -> f64 {
        let overshoot = (qty - order.q.front).max(0.0);
        order.q.front = (order.q.front - qty).max(0.0);
        order.q.cum_trade_qty += qty;
        overshoot
    }

    fn depth(&self, order: &mut Order<QueuePos>, update: DepthUpdate, _depth: &dyn MarketDepth) {
        let mut chg = update.prev_qty - update.qty;
        // Trades already subtracted from `front` directly; don't double-count
        // the portion of this depth change that they explain.
        chg -= order.q.cum_trade_qty;
        order.q.cum_trade_qty = 0.0;

        if chg <= 0.0 {
            // Depth increased (or the trade already explains all of it):
            // the front of the queue is unaffected, only clamp to the new total.
            order.q.front = order.q.front.min(update.qty);
            return;
        }

        let front = order.q.front;
        let back = (update.prev_qty - front).max(0.0);
        let p = self.prob.prob(front, back).clamp(0.0, 1.0);

        let new_front = (front - p * chg).max(0.0).min(update.qty);
        order.q.front = new_front;
    }

    fn is_filled(&self, order: &Order<QueuePos>, _depth: &dyn MarketDepth) -> bool {
        order.q.front <= 0.0
    }

    fn re_seed(&self, order: &mut Order<QueuePos>, snapshot_qty: f64) {
        order.q.front = snapshot_qty;
        order.q.cum_trade_qty = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::BTreeMarketDepth;
    use crate::types::{OrdType, TimeInForce};

    fn order_at(side: Side, price_tick: i64) -> Order<QueuePos> {
        Order::new(1, side, price_tick, 0.1, 1.0, OrdType::Limit, TimeInForce::GTC)
    }

    #[test]
    fn probability_queue_advances_fully_on_matching_trade_volume() {
        let model = ProbabilityQueueModel::new(SquareProbability);
        let mut depth = BTreeMarketDepth::new(0.1, 1.0);
        depth.update(Side::Buy, 1000, 10.0, 0);

        let mut order = order_at(Side::Buy, 1000);
        model.new_order(&mut order, &depth);
        assert_eq!(order.q.front, 10.0);

        model.trade(&mut order, 10.0, &depth);
        assert!(model.is_filled(&order, &depth));
    }

    #[test]
    fn risk_averse_queue_ignores_pure_depth_decrease() {
        let model = RiskAverseQueueModel;
        let mut depth = BTreeMarketDepth::new(0.1, 1.0);
        depth.update(Side::Buy, 1000, 10.0, 0);

        let mut order = Order::<f64>::new(1, Side::Buy, 1000, 0.1, 1.0, OrdType::Limit, TimeInForce::GTC);
        model.new_order(&mut order, &depth);
        assert_eq!(order.q, 10.0);

        let update = depth.update(Side::Buy, 1000, 4.0, 1);
        model.depth(&mut order, update, &depth);
        assert_eq!(order.q, 4.0);
    }
}
