//! The strategy-facing view: a read-mostly mirror of the exchange, seen at
//! local (receipt) timestamps and latency-delayed acknowledgements.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use tracing::debug;

use crate::{
    assettype::AssetType,
    bus::OrderBus,
    depth::{BTreeMarketDepth, MarketDepth},
    error::SimError,
    models::{fee::FeeModel, latency::LatencyModel},
    state::State,
    types::{Event, EventKind, Order, Status},
};

/// Mirrors the exchange's order book and this strategy's own orders as they
/// would actually be observed locally: market data arrives at its local
/// timestamp, and order acknowledgements arrive only after the response
/// leg of the configured [`LatencyModel`] has elapsed. `equity`/`position`
/// read from here, not from the exchange's ground truth, since that is what
/// a strategy running against this kernel could actually know.
pub struct LocalProcessor<AT, LM, FM, Q>
where
    AT: AssetType,
    LM: LatencyModel,
    FM: FeeModel,
    Q: Clone + Default,
{
    depth: BTreeMarketDepth,
    orders: HashMap<i64, Order<Q>>,
    state: State<AT, FM>,
    order_latency: Rc<RefCell<LM>>,
    /// Requests submitted here are delivered to the exchange after the
    /// entry leg of latency.
    orders_to: OrderBus<Q>,
    /// Acknowledgements/fills arrive here from the exchange.
    orders_from: OrderBus<Q>,
}

impl<AT, LM, FM, Q> LocalProcessor<AT, LM, FM, Q>
where
    AT: AssetType,
    LM: LatencyModel,
    FM: FeeModel,
    Q: Clone + Default,
{
    pub fn new(
        depth: BTreeMarketDepth,
        state: State<AT, FM>,
        order_latency: Rc<RefCell<LM>>,
        orders_to: OrderBus<Q>,
        orders_from: OrderBus<Q>,
    ) -> Self {
        Self {
            depth,
            orders: HashMap::new(),
            state,
            order_latency,
            orders_to,
            orders_from,
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

    pub fn order(&self, order_id: i64) -> Option<&Order<Q>> {
        self.orders.get(&order_id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order<Q>> {
        self.orders.values()
    }

    /// Mirrors a market-data event into the local-time depth view. This
    /// mirror is informational only; it never feeds back into matching.
    pub fn on_event(&mut self, event: &Event) {
        let tick = (event.px / self.depth.tick_size()).round() as i64;
        match event.kind() {
            EventKind::Depth | EventKind::DepthSnapshot => {
                self.depth.update(event.side(), tick, event.qty, event.local_ts);
            }
            EventKind::DepthClear => {
                self.depth.clear(event.side(), tick);
            }
            EventKind::Trade => {}
        }
    }

    pub fn submit_order(&mut self, mut order: Order<Q>, timestamp: i64) -> Result<(), SimError> {
        if self.orders.contains_key(&order.order_id) {
            debug!(order_id = order.order_id, "rejecting duplicate order id");
            return Err(SimError::DuplicateOrderId);
        }
        order.status = Status::New;
        order.local_timestamp = timestamp;
        self.orders.insert(order.order_id, order.clone());

        let release_ts = timestamp + self.order_latency.borrow_mut().entry(timestamp, &order);
        self.orders_to.append(order, release_ts);
        Ok(())
    }

    pub fn cancel_order(&mut self, order_id: i64, timestamp: i64) -> Result<(), SimError> {
        let order = self.orders.get(&order_id).cloned().ok_or(SimError::OrderNotFound)?;
        if !order.cancellable() {
            debug!(order_id, status = ?order.status, "rejecting cancel of a non-cancellable order");
            return Err(SimError::InvalidInput("order is not in a cancellable state"));
        }
        let mut request = order;
        request.status = Status::Canceled;
        request.local_timestamp = timestamp;

        let release_ts = timestamp + self.order_latency.borrow_mut().entry(timestamp, &request);
        self.orders_to.append(request, release_ts);
        Ok(())
    }

    /// Applies any exchange acknowledgements that have become ready as of
    /// `current_ts`.
    pub fn process_ready_acks(&mut self, current_ts: i64) -> Result<(), SimError> {
        while let Some((order, ts)) = self.orders_from.pop_ready(current_ts) {
            self.apply_ack(order, ts)?;
        }
        Ok(())
    }

    fn apply_ack(&mut self, mut order: Order<Q>, local_ts: i64) -> Result<(), SimError> {
        order.local_timestamp = local_ts;
        if matches!(order.status, Status::Filled | Status::PartiallyFilled) && order.exec_qty > 0.0 {
            self.state.apply_fill(&order)?;
            debug!(
                order_id = order.order_id,
                exec_qty = order.exec_qty,
                status = ?order.status,
                "applied fill ack locally"
            );
        }
        match order.status {
            Status::Filled | Status::Expired | Status::Canceled => {
                self.orders.remove(&order.order_id);
            }
            _ => {
                self.orders.insert(order.order_id, order);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assettype::LinearAsset,
        models::{fee::CommonFees, latency::ConstantLatency},
        types::{OrdType, Side, TimeInForce},
    };

    fn local() -> LocalProcessor<LinearAsset, ConstantLatency, CommonFees, f64> {
        LocalProcessor::new(
            BTreeMarketDepth::new(0.1, 1.0),
            State::new(LinearAsset::new(1.0), CommonFees::new(0.0, 0.0)),
            Rc::new(RefCell::new(ConstantLatency::new(5, 5))),
            OrderBus::new(),
            OrderBus::new(),
        )
    }

    fn order(id: i64) -> Order<f64> {
        Order::new(id, Side::Buy, 1000, 0.1, 1.0, OrdType::Limit, TimeInForce::GTC)
    }

    #[test]
    fn submit_order_delays_request_by_entry_latency() {
        let mut loc = local();
        loc.submit_order(order(1), 100).unwrap();
        assert_eq!(loc.orders_to.frontier(), 105);
    }

    #[test]
    fn fill_ack_updates_balance_and_removes_completed_order() {
        let mut loc = local();
        loc.submit_order(order(1), 0).unwrap();

        let mut filled = order(1);
        filled.status = Status::Filled;
        filled.exec_price_tick = 1000;
        filled.exec_qty = 1.0;
        filled.leaves_qty = 0.0;
        loc.apply_ack(filled, 10).unwrap();

        assert!(loc.order(1).is_none());
        assert_eq!(loc.position(), 1.0);
    }

    #[test]
    fn cancel_of_unknown_order_is_rejected() {
        let mut loc = local();
        assert!(loc.cancel_order(99, 0).is_err());
    }
}
