//! Position, balance, and fee accounting for one instrument.

use crate::{
    assettype::AssetType,
    error::SimError,
    models::fee::FeeModel,
    types::Order,
};

/// Running P&L and fee accounting, parameterized over the contract flavor
/// (`AT`) and the fee schedule (`FM`).
#[derive(Debug)]
pub struct State<AT, FM>
where
    AT: AssetType,
    FM: FeeModel,
{
    pub position: f64,
    pub balance: f64,
    pub fee: f64,
    pub trade_num: u64,
    pub trade_qty: f64,
    pub trade_amount: f64,
    asset_type: AT,
    fee_model: FM,
}

impl<AT, FM> State<AT, FM>
where
    AT: AssetType,
    FM: FeeModel,
{
    pub fn new(asset_type: AT, fee_model: FM) -> Self {
        Self {
            position: 0.0,
            balance: 0.0,
            fee: 0.0,
            trade_num: 0,
            trade_qty: 0.0,
            trade_amount: 0.0,
            asset_type,
            fee_model,
        }
    }

    /// Applies a fill's effect on position, balance, and accumulated fee.
    /// `balance` moves by the signed cash amount of the trade; the fee is
    /// tracked separately and only netted in at [`Self::equity`] time.
    pub fn apply_fill<Q: Clone>(&mut self, order: &Order<Q>) -> Result<(), SimError> {
        let amount = self.asset_type.amount(order.exec_price(), order.exec_qty)?;
        let fee = self.fee_model.fee(amount, order.maker);

        self.position += order.exec_qty * order.side.as_f64();
        self.balance -= amount * order.side.as_f64();
        self.fee += fee;
        self.trade_num += 1;
        self.trade_qty += order.exec_qty;
        self.trade_amount += amount;
        Ok(())
    }

    pub fn equity(&self, mid_price: f64) -> f64 {
        self.asset_type.equity(mid_price, self.balance, self.position, self.fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assettype::LinearAsset,
        models::fee::CommonFees,
        types::{OrdType, Side, TimeInForce},
    };

    #[test]
    fn apply_fill_updates_position_and_balance_signed_by_side() {
        let mut state = State::new(LinearAsset::new(1.0), CommonFees::new(0.0, 0.0));
        let mut order: Order<f64> =
            Order::new(1, Side::Buy, 1000, 0.1, 1.0, OrdType::Limit, TimeInForce::GTC);
        order.exec_price_tick = 1000;
        order.exec_qty = 1.0;
        order.maker = true;

        state.apply_fill(&order).unwrap();
        assert_eq!(state.position, 1.0);
        assert!((state.balance - (-100.0)).abs() < 1e-9);
    }

    #[test]
    fn fee_accrues_separately_from_balance() {
        let mut state = State::new(LinearAsset::new(1.0), CommonFees::new(0.0, 0.001));
        let mut order: Order<f64> =
            Order::new(1, Side::Buy, 1000, 0.1, 1.0, OrdType::Limit, TimeInForce::GTC);
        order.exec_price_tick = 1000;
        order.exec_qty = 1.0;
        order.maker = false;

        state.apply_fill(&order).unwrap();
        assert!((state.balance - (-100.0)).abs() < 1e-9);
        assert!(state.fee > 0.0);
    }
}
