//! Wires the event source, both processors, and the order buses into the
//! single strategy-facing simulation loop.

use std::{cell::RefCell, rc::Rc};

use crate::{
    assettype::AssetType,
    bus::OrderBus,
    depth::{BTreeMarketDepth, MarketDepth},
    error::SimError,
    evs::{EventSet, EventType},
    models::{fee::FeeModel, latency::LatencyModel, queue::QueueModel},
    proc::{exchange::FillPolicy, ExchangeProcessor, LocalProcessor},
    source::EventSource,
    state::State,
    types::{Order, OrdType, Side, TimeInForce},
};

/// Static configuration for one [`SimulationKernel`] instance.
#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    pub tick_size: f64,
    pub lot_size: f64,
    pub fill_policy: FillPolicy,
}

impl SimConfig {
    pub fn new(tick_size: f64, lot_size: f64, fill_policy: FillPolicy) -> Result<Self, SimError> {
        if tick_size <= 0.0 {
            return Err(SimError::IncompleteConfig("tick_size must be positive"));
        }
        if lot_size <= 0.0 {
            return Err(SimError::IncompleteConfig("lot_size must be positive"));
        }
        Ok(Self { tick_size, lot_size, fill_policy })
    }
}

/// The deterministic, single-asset backtesting kernel: an [`ExchangeProcessor`]
/// matching against ground truth and a [`LocalProcessor`] mirroring what the
/// strategy actually observes, coupled by two latency-delayed [`OrderBus`]es.
pub struct SimulationKernel<AT, LM, QM, FM, Q>
where
    AT: AssetType + Clone,
    LM: LatencyModel,
    QM: QueueModel<Q>,
    FM: FeeModel + Clone,
    Q: Clone + Default,
{
    tick_size: f64,
    source: EventSource,
    evs: EventSet,
    requests: OrderBus<Q>,
    acks: OrderBus<Q>,
    exch: ExchangeProcessor<AT, LM, QM, FM, Q>,
    local: LocalProcessor<AT, LM, FM, Q>,
    current_ts: i64,
}

impl<AT, LM, QM, FM, Q> SimulationKernel<AT, LM, QM, FM, Q>
where
    AT: AssetType + Clone,
    LM: LatencyModel,
    QM: QueueModel<Q>,
    FM: FeeModel + Clone,
    Q: Clone + Default,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SimConfig,
        events: Vec<crate::types::Event>,
        asset_type: AT,
        queue_model: QM,
        fee_model: FM,
        order_latency: LM,
    ) -> Result<Self, SimError> {
        let order_latency = Rc::new(RefCell::new(order_latency));
        let requests: OrderBus<Q> = OrderBus::new();
        let acks: OrderBus<Q> = OrderBus::new();

        let exch_depth = BTreeMarketDepth::new(config.tick_size, config.lot_size);
        let local_depth = BTreeMarketDepth::new(config.tick_size, config.lot_size);

        let exch_state = State::new(asset_type.clone(), fee_model.clone());
        let local_state = State::new(asset_type, fee_model);

        let exch = ExchangeProcessor::new(
            config.fill_policy,
            exch_depth,
            exch_state,
            queue_model,
            order_latency.clone(),
            requests.clone(),
            acks.clone(),
        );
        let local = LocalProcessor::new(local_depth, local_state, order_latency, requests.clone(), acks.clone());

        let source = EventSource::new(events);
        let mut evs = EventSet::new();
        evs.update_exch_data(source.peek_exch_ts());
        evs.update_local_data(source.peek_local_ts());
        evs.update_exch_order(requests.frontier());
        evs.update_local_order(acks.frontier());

        let current_ts = source.peek_exch_ts().min(source.peek_local_ts());
        let current_ts = if current_ts == i64::MAX { 0 } else { current_ts };

        Ok(Self {
            tick_size: config.tick_size,
            source,
            evs,
            requests,
            acks,
            exch,
            local,
            current_ts,
        })
    }

    pub fn current_timestamp(&self) -> i64 {
        self.current_ts
    }

    fn mid_price(&self) -> f64 {
        let depth = self.local.depth();
        let bid = depth.best_bid();
        let ask = depth.best_ask();
        if bid == 0.0 || ask == 0.0 {
            bid.max(ask)
        } else {
            (bid + ask) / 2.0
        }
    }

    pub fn position(&self) -> f64 {
        self.local.position()
    }

    pub fn balance(&self) -> f64 {
        self.local.balance()
    }

    pub fn equity(&self) -> f64 {
        self.local.equity(self.mid_price())
    }

    pub fn depth(&self) -> &BTreeMarketDepth {
        self.local.depth()
    }

    pub fn order(&self, order_id: i64) -> Option<&Order<Q>> {
        self.local.order(order_id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order<Q>> {
        self.local.orders()
    }

    pub fn submit_buy_order(
        &mut self,
        order_id: i64,
        price_tick: i64,
        qty: f64,
        order_type: OrdType,
        time_in_force: TimeInForce,
    ) -> Result<(), SimError> {
        let order = Order::new(order_id, Side::Buy, price_tick, self.tick_size, qty, order_type, time_in_force);
        self.local.submit_order(order, self.current_ts)
    }

    pub fn submit_sell_order(
        &mut self,
        order_id: i64,
        price_tick: i64,
        qty: f64,
        order_type: OrdType,
        time_in_force: TimeInForce,
    ) -> Result<(), SimError> {
        let order = Order::new(order_id, Side::Sell, price_tick, self.tick_size, qty, order_type, time_in_force);
        self.local.submit_order(order, self.current_ts)
    }

    pub fn cancel(&mut self, order_id: i64) -> Result<(), SimError> {
        self.local.cancel_order(order_id, self.current_ts)
    }

    /// Advances the simulation by `duration_ns`, processing every event and
    /// order-bus delivery that becomes ready along the way. Returns `Ok(true)`
    /// if the event stream still has more to deliver, `Ok(false)` once it and
    /// both order buses have been fully drained.
    pub fn elapse(&mut self, duration_ns: i64) -> Result<bool, SimError> {
        let target = self.current_ts.saturating_add(duration_ns);
        loop {
            self.evs.update_exch_data(self.source.peek_exch_ts());
            self.evs.update_local_data(self.source.peek_local_ts());
            self.evs.update_exch_order(self.requests.frontier());
            self.evs.update_local_order(self.acks.frontier());

            let next = match self.evs.next() {
                Some(next) if next.timestamp <= target => next,
                Some(_) => {
                    self.current_ts = target;
                    return Ok(true);
                }
                None => {
                    self.exch.flush_pending_snapshot()?;
                    self.current_ts = target;
                    return Ok(false);
                }
            };

            self.current_ts = next.timestamp;
            match next.ty {
                EventType::ExchData => {
                    let event = *self.source.next_exch().expect("exch event set by peek_exch_ts");
                    self.exch.on_event(&event)?;
                }
                EventType::LocalData => {
                    let event = *self.source.next_local().expect("local event set by peek_local_ts");
                    self.local.on_event(&event);
                }
                EventType::ExchOrder => {
                    self.exch.process_ready_requests(next.timestamp)?;
                }
                EventType::LocalOrder => {
                    self.local.process_ready_acks(next.timestamp)?;
                }
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
        types::{Event, Status, BUY, DEPTH_EVENT, SELL},
    };

    type Kernel = SimulationKernel<LinearAsset, ConstantLatency, RiskAverseQueueModel, CommonFees, f64>;

    fn depth_event(exch_ts: i64, local_ts: i64, ev: i64, px: f64, qty: f64) -> Event {
        Event { ev, exch_ts, local_ts, px, qty }
    }

    fn kernel(events: Vec<Event>) -> Kernel {
        let config = SimConfig::new(0.1, 1.0, FillPolicy::NoPartialFill).unwrap();
        SimulationKernel::new(
            config,
            events,
            LinearAsset::new(1.0),
            RiskAverseQueueModel,
            CommonFees::new(0.0, 0.0),
            ConstantLatency::new(10, 10),
        )
        .unwrap()
    }

    #[test]
    fn single_maker_order_fills_once_market_trades_through_it() {
        let config = SimConfig::new(0.1, 1.0, FillPolicy::NoPartialFill).unwrap();
        let mut k = SimulationKernel::new(
            config,
            vec![
                depth_event(0, 0, DEPTH_EVENT | BUY, 100.0, 5.0),
                depth_event(0, 0, DEPTH_EVENT | SELL, 100.1, 5.0),
                depth_event(50, 50, crate::types::TRADE_EVENT | SELL, 100.0, 6.0),
            ],
            LinearAsset::new(1.0),
            RiskAverseQueueModel,
            CommonFees::new(0.0, 0.0),
            ConstantLatency::new(0, 0),
        )
        .unwrap();
        k.elapse(1).unwrap();
        k.submit_buy_order(1, 1000, 1.0, OrdType::Limit, TimeInForce::GTC).unwrap();
        k.elapse(100).unwrap();

        // A fully filled order is removed from the local view once its ack arrives.
        assert!(k.order(1).is_none());
        assert_eq!(k.position(), 1.0);
        assert_eq!(k.balance(), -100.0);
    }

    #[test]
    fn post_only_order_crossing_book_is_rejected() {
        use crate::types::SELL;
        let events = vec![
            depth_event(0, 0, DEPTH_EVENT | BUY, 99.0, 10.0),
            depth_event(0, 0, DEPTH_EVENT | SELL, 100.0, 10.0),
        ];
        let mut k = kernel(events);
        k.elapse(1).unwrap();
        k.submit_buy_order(1, 1005, 1.0, OrdType::Limit, TimeInForce::GTX).unwrap();
        k.elapse(100).unwrap();
        assert!(k.order(1).is_none());
    }

    #[test]
    fn elapse_returns_false_once_stream_and_buses_are_drained() {
        let mut k = kernel(vec![depth_event(0, 0, DEPTH_EVENT | BUY, 100.0, 1.0)]);
        assert!(!k.elapse(1_000).unwrap());
        assert!(!k.elapse(1_000).unwrap());
    }

    #[test]
    fn cancel_returns_err_for_unknown_order() {
        let mut k = kernel(vec![]);
        assert_eq!(k.cancel(42), Err(SimError::OrderNotFound));
    }

    #[test]
    fn empty_stream_first_elapse_returns_false_with_no_state_change() {
        let mut k = kernel(vec![]);
        assert!(!k.elapse(1_000).unwrap());
        assert_eq!(k.position(), 0.0);
        assert_eq!(k.balance(), 0.0);
    }

    #[test]
    fn zero_latency_order_is_visible_and_acked_at_the_same_timestamp() {
        let config = SimConfig::new(0.1, 1.0, FillPolicy::NoPartialFill).unwrap();
        let mut k = SimulationKernel::new(
            config,
            vec![depth_event(0, 0, DEPTH_EVENT | BUY, 99.0, 10.0)],
            LinearAsset::new(1.0),
            RiskAverseQueueModel,
            CommonFees::new(0.0, 0.0),
            ConstantLatency::new(0, 0),
        )
        .unwrap();
        k.elapse(1).unwrap();
        k.submit_buy_order(1, 980, 1.0, OrdType::Limit, TimeInForce::GTC).unwrap();
        k.elapse(0).unwrap();

        let order = k.order(1).expect("order acked at the same timestamp");
        assert_eq!(order.status, Status::New);
        assert_eq!(order.exch_timestamp, k.current_timestamp());
    }

    #[test]
    fn ioc_with_no_opposing_liquidity_expires_without_position_effect() {
        let mut k = kernel(vec![depth_event(0, 0, DEPTH_EVENT | BUY, 99.0, 10.0)]);
        k.elapse(1).unwrap();
        // Selling above the best bid does not cross, so there is nothing for
        // the IOC order to take.
        k.submit_sell_order(1, 1100, 1.0, OrdType::Limit, TimeInForce::IOC).unwrap();
        k.elapse(100).unwrap();

        assert!(k.order(1).is_none());
        assert_eq!(k.position(), 0.0);
    }

    #[test]
    fn submit_then_immediate_cancel_nets_to_no_position_change_or_fee() {
        let mut k = kernel(vec![]);
        k.submit_buy_order(1, 1000, 1.0, OrdType::Limit, TimeInForce::GTC).unwrap();
        k.elapse(0).unwrap();
        k.cancel(1).unwrap();
        k.elapse(100).unwrap();

        assert!(k.order(1).is_none());
        assert_eq!(k.position(), 0.0);
        assert_eq!(k.balance(), 0.0);
    }

    #[test]
    fn latency_delayed_ack_is_not_observed_before_the_round_trip_elapses() {
        let config = SimConfig::new(0.1, 1.0, FillPolicy::NoPartialFill).unwrap();
        let mut k = SimulationKernel::new(
            config,
            vec![],
            LinearAsset::new(1.0),
            RiskAverseQueueModel,
            CommonFees::new(0.0, 0.0),
            ConstantLatency::new(1_000_000, 1_000_000),
        )
        .unwrap();
        k.submit_buy_order(1, 1000, 1.0, OrdType::Limit, TimeInForce::GTC).unwrap();

        k.elapse(500_000).unwrap();
        let pending = k.order(1).expect("order still resting locally");
        assert_eq!(pending.status, Status::New);
        assert_eq!(pending.exch_timestamp, 0, "exchange has not yet seen the request");

        k.elapse(1_500_000).unwrap();
        let acked = k.order(1).expect("order still resting after the round trip");
        assert_eq!(acked.status, Status::New);
        assert!(acked.exch_timestamp > 0, "exchange ack must have been mirrored locally by now");
    }
}
