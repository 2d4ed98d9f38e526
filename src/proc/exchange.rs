//! The exchange's ground-truth view: matches resting orders against the
//! replayed market, at the exchange's own timestamp.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, HashSet},
    rc::Rc,
};

use tracing::{debug, trace};

use crate::{
    assettype::AssetType,
    bus::OrderBus,
    depth::{ApplySnapshot, BTreeMarketDepth, MarketDepth},
    error::SimError,
    models::{fee::FeeModel, latency::LatencyModel, queue::QueueModel},
    state::State,
    types::{Event, EventKind, Order, OrdType, Side, Status, TimeInForce},
};

/// Selects how a marketable `GTC` order executes once it crosses the book.
/// `FOK`/`IOC` are always checked across the whole ladder regardless of this
/// choice; this only changes plain `GTC` liquidity-taking behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillPolicy {
    /// Executes the full order quantity at the best price in one shot,
    /// ignoring the quantity actually resting there.
    NoPartialFill,
    /// Walks the ladder, filling what is actually available at each level;
    /// any quantity left once the ladder is exhausted is still force-filled
    /// at the order's limit price (the replay cannot model the order itself
    /// moving the book past what it observed).
    PartialFill,
}

/// Buffered bid/ask rows from a `DEPTH_SNAPSHOT_EVENT` run, applied
/// atomically once a non-snapshot event ends the run.
type PendingSnapshot = (Vec<(i64, f64)>, Vec<(i64, f64)>);

/// Matches resting client orders against the replayed market and applies
/// fills to its own [`State`]. This is the ground-truth side of the
/// simulation: the [`crate::proc::local::LocalProcessor`] only learns about
/// these fills once they cross the latency-delayed [`OrderBus`].
pub struct ExchangeProcessor<AT, LM, QM, FM, Q>
where
    AT: AssetType,
    LM: LatencyModel,
    QM: QueueModel<Q>,
    FM: FeeModel,
    Q: Clone + Default,
{
    policy: FillPolicy,
    depth: BTreeMarketDepth,
    orders: HashMap<i64, Order<Q>>,
    buy_orders: BTreeMap<i64, HashSet<i64>>,
    sell_orders: BTreeMap<i64, HashSet<i64>>,
    state: State<AT, FM>,
    queue_model: QM,
    order_latency: Rc<RefCell<LM>>,
    orders_from: OrderBus<Q>,
    orders_to: OrderBus<Q>,
    pending_snapshot: Option<PendingSnapshot>,
}

impl<AT, LM, QM, FM, Q> ExchangeProcessor<AT, LM, QM, FM, Q>
where
    AT: AssetType,
    LM: LatencyModel,
    QM: QueueModel<Q>,
    FM: FeeModel,
    Q: Clone + Default,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        policy: FillPolicy,
        depth: BTreeMarketDepth,
        state: State<AT, FM>,
        queue_model: QM,
        order_latency: Rc<RefCell<LM>>,
        orders_from: OrderBus<Q>,
        orders_to: OrderBus<Q>,
    ) -> Self {
        Self {
            policy,
            depth,
            orders: HashMap::new(),
            buy_orders: BTreeMap::new(),
            sell_orders: BTreeMap::new(),
            state,
            queue_model,
            order_latency,
            orders_from,
            orders_to,
            pending_snapshot: None,
        }
    }

    pub fn depth(&self) -> &BTreeMarketDepth {
        &self.depth
    }

    pub fn position(&self) -> f64 {
        self.state.position
    }

    pub fn balance(&self) -> f64 {
        self.state.balance
    }

    pub fn equity(&self, mid_price: f64) -> f64 {
        self.state.equity(mid_price)
    }

    /// Delivers any order requests that have become ready on the
    /// local-to-exchange bus as of `current_ts`.
    pub fn process_ready_requests(&mut self, current_ts: i64) -> Result<(), SimError> {
        while let Some((order, ts)) = self.orders_from.pop_ready(current_ts) {
            match order.status {
                Status::New => self.ack_new(order, ts)?,
                Status::Canceled => self.ack_cancel(order.order_id, ts)?,
                _ => return Err(SimError::InvalidInput("unexpected order request status")),
            }
        }
        Ok(())
    }

    pub fn on_event(&mut self, event: &Event) -> Result<(), SimError> {
        self.order_latency.borrow_mut().observe_feed(event.exch_ts, event.local_ts);
        if event.kind() == EventKind::DepthSnapshot {
            self.buffer_snapshot(event);
            return Ok(());
        }
        self.flush_pending_snapshot()?;
        match event.kind() {
            EventKind::Depth => self.on_depth(event),
            EventKind::DepthClear => {
                self.depth.clear(event.side(), (event.px / self.depth.tick_size()).round() as i64);
                Ok(())
            }
            EventKind::Trade => self.on_trade(event),
            EventKind::DepthSnapshot => unreachable!(),
        }
    }

    /// Applies any snapshot rows buffered since the last non-snapshot event.
    /// Must be called once more at end of stream to flush a trailing
    /// snapshot.
    pub fn flush_pending_snapshot(&mut self) -> Result<(), SimError> {
        let Some((bids, asks)) = self.pending_snapshot.take() else {
            return Ok(());
        };
        self.depth.apply_snapshot(&bids, &asks, 0)?;

        let bid_levels: HashMap<i64, f64> = bids.into_iter().collect();
        let ask_levels: HashMap<i64, f64> = asks.into_iter().collect();
        for order in self.orders.values_mut() {
            let snapshot_qty = match order.side {
                Side::Buy => bid_levels.get(&order.price_tick).copied().unwrap_or(0.0),
                Side::Sell => ask_levels.get(&order.price_tick).copied().unwrap_or(0.0),
            };
            trace!(order_id = order.order_id, price_tick = order.price_tick, snapshot_qty, "re-seeding queue position from snapshot");
            self.queue_model.re_seed(order, snapshot_qty);
        }
        Ok(())
    }

    fn buffer_snapshot(&mut self, event: &Event) {
        let (bids, asks) = self.pending_snapshot.get_or_insert_with(|| (Vec::new(), Vec::new()));
        let tick = (event.px / self.depth.tick_size()).round() as i64;
        match event.side() {
            Side::Buy => bids.push((tick, event.qty)),
            Side::Sell => asks.push((tick, event.qty)),
        }
    }

    fn on_depth(&mut self, event: &Event) -> Result<(), SimError> {
        let tick = (event.px / self.depth.tick_size()).round() as i64;
        let side = event.side();
        let prev_best = match side {
            Side::Buy => self.depth.best_bid_tick(),
            Side::Sell => self.depth.best_ask_tick(),
        };
        let update = self.depth.update(side, tick, event.qty, event.exch_ts);

        let resting_here: Vec<i64> = match side {
            Side::Buy => self.buy_orders.get(&tick).map(|s| s.iter().copied().collect()).unwrap_or_default(),
            Side::Sell => self.sell_orders.get(&tick).map(|s| s.iter().copied().collect()).unwrap_or_default(),
        };
        for id in resting_here {
            if let Some(order) = self.orders.get_mut(&id) {
                self.queue_model.depth(order, update, &self.depth);
            }
        }

        match side {
            Side::Buy if update.best_tick > prev_best => {
                self.fill_crossed_sells(update.best_tick, event.exch_ts)?;
            }
            Side::Sell if update.best_tick < prev_best => {
                self.fill_crossed_buys(update.best_tick, event.exch_ts)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Fills resting sell orders whose price is now at or below the best bid.
    fn fill_crossed_sells(&mut self, best_bid_tick: i64, timestamp: i64) -> Result<(), SimError> {
        let ids: Vec<i64> =
            self.sell_orders.range(..=best_bid_tick).flat_map(|(_, s)| s.iter().copied()).collect();
        for id in ids {
            self.fill_full_at_limit(id, timestamp)?;
        }
        Ok(())
    }

    /// Fills resting buy orders whose price is now at or above the best ask.
    fn fill_crossed_buys(&mut self, best_ask_tick: i64, timestamp: i64) -> Result<(), SimError> {
        let ids: Vec<i64> =
            self.buy_orders.range(best_ask_tick..).flat_map(|(_, s)| s.iter().copied()).collect();
        for id in ids {
            self.fill_full_at_limit(id, timestamp)?;
        }
        Ok(())
    }

    fn fill_full_at_limit(&mut self, order_id: i64, timestamp: i64) -> Result<(), SimError> {
        let Some(order) = self.orders.get(&order_id) else { return Ok(()) };
        let mut order = order.clone();
        let exec_qty = order.leaves_qty;
        let price_tick = order.price_tick;
        self.fill(&mut order, timestamp, true, price_tick, exec_qty)?;
        self.remove_resting(order_id);
        Ok(())
    }

    fn on_trade(&mut self, event: &Event) -> Result<(), SimError> {
        let tick = (event.px / self.depth.tick_size()).round() as i64;
        match event.side() {
            Side::Buy => {
                let ids: Vec<i64> =
                    self.sell_orders.range(..=tick).flat_map(|(_, s)| s.iter().copied()).collect();
                for id in ids {
                    self.check_trade_fill(id, tick, event.qty, event.exch_ts, Side::Sell)?;
                }
            }
            Side::Sell => {
                let ids: Vec<i64> =
                    self.buy_orders.range(tick..).flat_map(|(_, s)| s.iter().copied()).collect();
                for id in ids {
                    self.check_trade_fill(id, tick, event.qty, event.exch_ts, Side::Buy)?;
                }
            }
        }
        Ok(())
    }

    fn check_trade_fill(
        &mut self,
        order_id: i64,
        trade_tick: i64,
        qty: f64,
        timestamp: i64,
        resting_side: Side,
    ) -> Result<(), SimError> {
        let Some(order) = self.orders.get(&order_id) else { return Ok(()) };
        let through = match resting_side {
            Side::Sell => order.price_tick < trade_tick,
            Side::Buy => order.price_tick > trade_tick,
        };
        if through {
            self.fill_full_at_limit(order_id, timestamp)?;
            return Ok(());
        }

        // Price matches the trade exactly. The print drains the queue ahead
        // of the order first; only the portion that overshoots past zero
        // actually reaches the order and fills it.
        let order = self.orders.get_mut(&order_id).unwrap();
        let overshoot = self.queue_model.trade(order, qty, &self.depth);
        if overshoot > 0.0 {
            self.fill_full_at_limit(order_id, timestamp)?;
        }
        Ok(())
    }

    fn effective_limit_tick(order: &Order<Q>) -> i64 {
        if order.order_type == OrdType::Market {
            match order.side {
                Side::Buy => i64::MAX,
                Side::Sell => i64::MIN,
            }
        } else {
            order.price_tick
        }
    }

    fn ack_new(&mut self, mut order: Order<Q>, timestamp: i64) -> Result<(), SimError> {
        if self.orders.contains_key(&order.order_id) {
            debug!(order_id = order.order_id, "rejecting duplicate order id");
            return Err(SimError::DuplicateOrderId);
        }

        let limit_tick = Self::effective_limit_tick(&order);
        let crosses = match order.side {
            Side::Buy => order.order_type == OrdType::Market || limit_tick >= self.depth.best_ask_tick(),
            Side::Sell => order.order_type == OrdType::Market || limit_tick <= self.depth.best_bid_tick(),
        };

        if !crosses {
            if matches!(order.time_in_force, TimeInForce::FOK | TimeInForce::IOC) {
                debug!(order_id = order.order_id, time_in_force = ?order.time_in_force, "expiring non-crossing order");
                order.status = Status::Expired;
                self.respond(order, timestamp);
                return Ok(());
            }
            self.rest(order, timestamp);
            return Ok(());
        }

        if order.time_in_force == TimeInForce::GTX {
            debug!(order_id = order.order_id, "rejecting GTX order that would cross the book");
            order.status = Status::Expired;
            self.respond(order, timestamp);
            return Ok(());
        }

        let opposite = order.side.opposite();
        let available = self.depth.cumulative_qty_through(opposite, limit_tick);
        let lot = self.depth.lot_size();

        match order.time_in_force {
            TimeInForce::FOK => {
                if ((order.qty - available) / lot).round() > 0.0 {
                    debug!(
                        order_id = order.order_id,
                        available,
                        requested = order.qty,
                        "expiring FOK order: ladder cannot cover the full quantity"
                    );
                    order.status = Status::Expired;
                    self.respond(order, timestamp);
                } else {
                    let qty = order.qty;
                    self.take(order, timestamp, qty);
                }
            }
            TimeInForce::IOC => {
                let fillable = available.min(order.qty);
                self.take(order, timestamp, fillable);
            }
            TimeInForce::GTC | TimeInForce::GTX => match self.policy {
                FillPolicy::NoPartialFill => {
                    let exec_price_tick = match order.side {
                        Side::Buy => self.depth.best_ask_tick(),
                        Side::Sell => self.depth.best_bid_tick(),
                    };
                    let exec_qty = order.qty;
                    self.fill(&mut order, timestamp, false, exec_price_tick, exec_qty)?;
                }
                FillPolicy::PartialFill => {
                    let qty = order.qty;
                    self.take(order, timestamp, qty);
                }
            },
        }
        Ok(())
    }

    /// Walks the opposite side's ladder, filling up to `max_qty` starting
    /// from the best price. Leftover quantity for a marketable `GTC` order
    /// under [`FillPolicy::PartialFill`] is force-filled at the limit price;
    /// any other leftover (an `IOC` that couldn't fully fill, or a safety
    /// net for `FOK`) expires instead of resting.
    fn take(&mut self, mut order: Order<Q>, timestamp: i64, max_qty: f64) {
        let limit_tick = Self::effective_limit_tick(&order);
        let levels = self.depth.levels_to_take(order.side, limit_tick);
        let mut remaining = max_qty;

        for (level_tick, level_qty) in levels {
            if remaining <= 0.0 {
                break;
            }
            let take_qty = remaining.min(level_qty);
            if take_qty <= 0.0 {
                continue;
            }
            self.depth.update(order.side.opposite(), level_tick, level_qty - take_qty, timestamp);
            remaining -= take_qty;
            // fill() can fail only on an already-finalized order, which
            // cannot happen for an order that has never been accepted yet.
            let _ = self.fill(&mut order, timestamp, false, level_tick, take_qty);
        }

        let lot = self.depth.lot_size();
        if (order.leaves_qty / lot).round() > 0.0 {
            if self.policy == FillPolicy::PartialFill && order.time_in_force == TimeInForce::GTC {
                let remaining_qty = order.leaves_qty;
                let price_tick = order.price_tick;
                let _ = self.fill(&mut order, timestamp, false, price_tick, remaining_qty);
            } else {
                debug!(order_id = order.order_id, leaves_qty = order.leaves_qty, "expiring unfilled remainder");
                order.status = Status::Expired;
                self.respond(order, timestamp);
            }
        }
    }

    fn ack_cancel(&mut self, order_id: i64, timestamp: i64) -> Result<(), SimError> {
        let mut order = self.orders.remove(&order_id).ok_or(SimError::OrderNotFound)?;
        self.remove_from_ladder(&order);
        order.status = Status::Canceled;
        self.respond(order, timestamp);
        Ok(())
    }

    fn fill(
        &mut self,
        order: &mut Order<Q>,
        timestamp: i64,
        maker: bool,
        exec_price_tick: i64,
        exec_qty: f64,
    ) -> Result<(), SimError> {
        if matches!(order.status, Status::Expired | Status::Canceled | Status::Filled) {
            return Err(SimError::InvalidInput("order is already finalized"));
        }

        order.maker = maker;
        order.exec_price_tick = if maker { order.price_tick } else { exec_price_tick };
        order.exec_qty = exec_qty;
        order.leaves_qty -= exec_qty;
        order.status = if (order.leaves_qty / self.depth.lot_size()).round() > 0.0 {
            Status::PartiallyFilled
        } else {
            Status::Filled
        };
        order.exch_timestamp = timestamp;

        self.state.apply_fill(order)?;
        debug!(
            order_id = order.order_id,
            exec_price_tick = order.exec_price_tick,
            exec_qty,
            maker,
            status = ?order.status,
            "filled order"
        );
        if order.status == Status::Filled {
            self.orders.remove(&order.order_id);
            self.remove_from_ladder(order);
        } else {
            self.orders.insert(order.order_id, order.clone());
        }

        let local_recv_ts = order.exch_timestamp + self.order_latency.borrow_mut().response(timestamp, order);
        self.orders_to.append(order.clone(), local_recv_ts);
        Ok(())
    }

    fn rest(&mut self, mut order: Order<Q>, timestamp: i64) {
        self.queue_model.new_order(&mut order, &self.depth);
        order.status = Status::New;
        match order.side {
            Side::Buy => self.buy_orders.entry(order.price_tick).or_default().insert(order.order_id),
            Side::Sell => self.sell_orders.entry(order.price_tick).or_default().insert(order.order_id),
        };
        order.exch_timestamp = timestamp;
        let local_recv_ts = timestamp + self.order_latency.borrow_mut().response(timestamp, &order);
        self.orders_to.append(order.clone(), local_recv_ts);
        self.orders.insert(order.order_id, order);
    }

    fn respond(&mut self, mut order: Order<Q>, timestamp: i64) {
        order.exch_timestamp = timestamp;
        let local_recv_ts = timestamp + self.order_latency.borrow_mut().response(timestamp, &order);
        self.orders_to.append(order, local_recv_ts);
    }

    fn remove_resting(&mut self, order_id: i64) {
        if let Some(order) = self.orders.remove(&order_id) {
            self.remove_from_ladder(&order);
        }
    }

    fn remove_from_ladder(&mut self, order: &Order<Q>) {
        let ladder = match order.side {
            Side::Buy => &mut self.buy_orders,
            Side::Sell => &mut self.sell_orders,
        };
        if let Some(set) = ladder.get_mut(&order.price_tick) {
            set.remove(&order.order_id);
            if set.is_empty() {
                ladder.remove(&order.price_tick);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assettype::LinearAsset,
        models::{fee::CommonFees, latency::ConstantLatency, queue::RiskAverseQueueModel},
        types::{OrdType, BUY, DEPTH_SNAPSHOT_EVENT},
    };

    fn proc(
        policy: FillPolicy,
    ) -> ExchangeProcessor<LinearAsset, ConstantLatency, RiskAverseQueueModel, CommonFees, f64> {
        ExchangeProcessor::new(
            policy,
            BTreeMarketDepth::new(0.1, 1.0),
            State::new(LinearAsset::new(1.0), CommonFees::new(0.0, 0.0005)),
            RiskAverseQueueModel,
            Rc::new(RefCell::new(ConstantLatency::new(10, 10))),
            OrderBus::new(),
            OrderBus::new(),
        )
    }

    fn limit_order(id: i64, side: Side, price_tick: i64, qty: f64, tif: TimeInForce) -> Order<f64> {
        Order::new(id, side, price_tick, 0.1, qty, OrdType::Limit, tif)
    }

    #[test]
    fn gtx_order_rejected_on_cross() {
        let mut p = proc(FillPolicy::NoPartialFill);
        p.depth.update(Side::Sell, 1000, 5.0, 0);
        p.ack_new(limit_order(1, Side::Buy, 1000, 1.0, TimeInForce::GTX), 1).unwrap();
        let (order, _) = p.orders_to.pop_ready(i64::MAX).unwrap();
        assert_eq!(order.status, Status::Expired);
    }

    #[test]
    fn no_partial_fill_fills_entire_qty_at_best_regardless_of_depth() {
        let mut p = proc(FillPolicy::NoPartialFill);
        p.depth.update(Side::Sell, 1000, 1.0, 0);
        p.ack_new(limit_order(1, Side::Buy, 1000, 5.0, TimeInForce::GTC), 1).unwrap();
        let (order, _) = p.orders_to.pop_ready(i64::MAX).unwrap();
        assert_eq!(order.status, Status::Filled);
        assert_eq!(order.exec_qty, 5.0);
    }

    #[test]
    fn partial_fill_walks_ladder_then_force_fills_remainder() {
        let mut p = proc(FillPolicy::PartialFill);
        p.depth.update(Side::Sell, 1000, 2.0, 0);
        p.depth.update(Side::Sell, 1001, 1.0, 0);
        p.ack_new(limit_order(1, Side::Buy, 1001, 5.0, TimeInForce::GTC), 1).unwrap();

        let mut total_filled = 0.0;
        let mut last_status = Status::None;
        while let Some((order, _)) = p.orders_to.pop_ready(i64::MAX) {
            total_filled += order.exec_qty;
            last_status = order.status;
        }
        assert_eq!(total_filled, 5.0);
        assert_eq!(last_status, Status::Filled);
    }

    #[test]
    fn fok_rejects_when_ladder_cannot_cover_full_quantity() {
        let mut p = proc(FillPolicy::PartialFill);
        p.depth.update(Side::Sell, 1000, 2.0, 0);
        p.ack_new(limit_order(1, Side::Buy, 1000, 5.0, TimeInForce::FOK), 1).unwrap();
        let (order, _) = p.orders_to.pop_ready(i64::MAX).unwrap();
        assert_eq!(order.status, Status::Expired);
        assert_eq!(order.exec_qty, 0.0);
    }

    #[test]
    fn ioc_fills_available_then_expires_remainder() {
        let mut p = proc(FillPolicy::PartialFill);
        p.depth.update(Side::Sell, 1000, 2.0, 0);
        p.ack_new(limit_order(1, Side::Buy, 1000, 5.0, TimeInForce::IOC), 1).unwrap();

        let mut saw_partial_fill = false;
        let mut saw_expired = false;
        while let Some((order, _)) = p.orders_to.pop_ready(i64::MAX) {
            if order.exec_qty == 2.0 {
                saw_partial_fill = true;
            }
            if order.status == Status::Expired {
                saw_expired = true;
            }
        }
        assert!(saw_partial_fill);
        assert!(saw_expired);
    }

    #[test]
    fn depth_snapshot_re_seeds_resting_orders_queue_position() {
        let mut p = proc(FillPolicy::NoPartialFill);
        p.depth.update(Side::Buy, 1000, 10.0, 0);
        p.ack_new(limit_order(1, Side::Buy, 1000, 1.0, TimeInForce::GTC), 1).unwrap();
        let _ = p.orders_to.pop_ready(i64::MAX);
        assert_eq!(p.orders.get(&1).unwrap().q, 10.0);

        let snapshot = Event { ev: DEPTH_SNAPSHOT_EVENT | BUY, exch_ts: 2, local_ts: 2, px: 100.0, qty: 7.0 };
        p.on_event(&snapshot).unwrap();
        // Buffered, not yet applied: a snapshot run only flushes once a
        // non-snapshot event ends it, or at end of stream.
        assert_eq!(p.orders.get(&1).unwrap().q, 10.0);

        p.flush_pending_snapshot().unwrap();
        assert_eq!(p.orders.get(&1).unwrap().q, 7.0);
    }

    #[test]
    fn queue_position_advances_on_trade_then_next_trade_of_any_size_fills() {
        use crate::{
            models::queue::{ProbabilityQueueModel, QueuePos, SquareProbability},
            types::{TimeInForce, SELL, TRADE_EVENT},
        };

        let mut p: ExchangeProcessor<LinearAsset, ConstantLatency, ProbabilityQueueModel<SquareProbability>, CommonFees, QueuePos> =
            ExchangeProcessor::new(
                FillPolicy::NoPartialFill,
                BTreeMarketDepth::new(0.1, 1.0),
                State::new(LinearAsset::new(1.0), CommonFees::new(0.0, 0.0)),
                ProbabilityQueueModel::new(SquareProbability),
                Rc::new(RefCell::new(ConstantLatency::new(0, 0))),
                OrderBus::new(),
                OrderBus::new(),
            );
        p.depth.update(Side::Buy, 1000, 10.0, 0);
        p.ack_new(Order::new(1, Side::Buy, 1000, 0.1, 1.0, OrdType::Limit, TimeInForce::GTC), 0).unwrap();
        assert_eq!(p.orders.get(&1).unwrap().q.front, 10.0);

        let trade = Event { ev: TRADE_EVENT | SELL, exch_ts: 50, local_ts: 50, px: 100.0, qty: 10.0 };
        p.on_event(&trade).unwrap();
        // The print exactly exhausts the queue ahead of the order without
        // reaching it yet.
        assert_eq!(p.orders.get(&1).unwrap().q.front, 0.0);
        assert_eq!(p.position(), 0.0);

        let next_trade = Event { ev: TRADE_EVENT | SELL, exch_ts: 100, local_ts: 100, px: 100.0, qty: 0.01 };
        p.on_event(&next_trade).unwrap();
        // Any further trade at the price now fills the order in full.
        assert!(!p.orders.contains_key(&1));
        assert_eq!(p.position(), 1.0);
    }

    #[test]
    fn canceling_resting_order_responds_canceled() {
        let mut p = proc(FillPolicy::NoPartialFill);
        p.ack_new(limit_order(1, Side::Buy, 900, 1.0, TimeInForce::GTC), 1).unwrap();
        let _ = p.orders_to.pop_ready(i64::MAX);
        p.ack_cancel(1, 2).unwrap();
        let (order, _) = p.orders_to.pop_ready(i64::MAX).unwrap();
        assert_eq!(order.status, Status::Canceled);
    }
}
