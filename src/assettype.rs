//! Tick/price conversion and P&L arithmetic for the two contract flavors a
//! book can be quoted in.

use crate::error::SimError;

/// Converts an executed price/quantity into a cash amount and computes
/// mark-to-market equity. Both variants are pure; `amount`/`equity` never
/// mutate and never depend on anything but their arguments.
pub trait AssetType {
    /// Cash equivalent of executing `qty` at `exec_price`. Fails with
    /// [`SimError::InvalidPrice`] when `exec_price` is not positive, which
    /// an inverse contract divides by.
    fn amount(&self, exec_price: f64, qty: f64) -> Result<f64, SimError>;

    /// Mark-to-market equity given the current `position`, cash `balance`,
    /// accrued `fee`, and `mid_price`.
    fn equity(&self, mid_price: f64, balance: f64, position: f64, fee: f64) -> f64;
}

/// Linear contracts: P&L accrues directly in the quote currency.
#[derive(Clone, Copy, Debug)]
pub struct LinearAsset {
    contract_size: f64,
}

impl LinearAsset {
    pub fn new(contract_size: f64) -> Self {
        Self { contract_size }
    }
}

impl AssetType for LinearAsset {
    fn amount(&self, exec_price: f64, qty: f64) -> Result<f64, SimError> {
        Ok(self.contract_size * exec_price * qty)
    }

    fn equity(&self, mid_price: f64, balance: f64, position: f64, fee: f64) -> f64 {
        balance + self.contract_size * position * mid_price - fee
    }
}

/// Inverse contracts: P&L accrues in the base currency, amount is quoted in
/// units of `1 / price`.
#[derive(Clone, Copy, Debug)]
pub struct InverseAsset {
    contract_size: f64,
}

impl InverseAsset {
    /// Fails with [`SimError::InvalidInput`] if `contract_size` is not
    /// positive — every amount computed from it divides by price, so a
    /// non-positive size would silently corrupt every fill afterward.
    pub fn new(contract_size: f64) -> Result<Self, SimError> {
        if contract_size <= 0.0 {
            return Err(SimError::InvalidInput("inverse contract_size must be positive"));
        }
        Ok(Self { contract_size })
    }
}

impl AssetType for InverseAsset {
    fn amount(&self, exec_price: f64, qty: f64) -> Result<f64, SimError> {
        if exec_price <= 0.0 {
            return Err(SimError::InvalidPrice(exec_price));
        }
        Ok(self.contract_size * qty / exec_price)
    }

    fn equity(&self, mid_price: f64, balance: f64, position: f64, fee: f64) -> f64 {
        -balance - self.contract_size * position / mid_price - fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_pnl_matches_quantity_times_price_delta() {
        let asset = LinearAsset::new(1.0);
        let buy = asset.amount(100.0, 1.0).unwrap();
        let sell = asset.amount(101.0, 1.0).unwrap();
        assert!((sell - buy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn inverse_pnl_matches_spec_scenario_five() {
        let asset = InverseAsset::new(1.0).unwrap();
        let buy = asset.amount(50_000.0, 100.0).unwrap();
        let sell = asset.amount(55_000.0, 100.0).unwrap();
        let delta = buy - sell;
        assert!((delta - 0.0001818).abs() < 1e-6);
    }

    #[test]
    fn inverse_asset_rejects_nonpositive_contract_size() {
        assert!(InverseAsset::new(0.0).is_err());
        assert!(InverseAsset::new(-1.0).is_err());
    }

    #[test]
    fn inverse_asset_amount_rejects_nonpositive_price() {
        let asset = InverseAsset::new(1.0).unwrap();
        assert!(matches!(asset.amount(0.0, 1.0), Err(SimError::InvalidPrice(_))));
        assert!(matches!(asset.amount(-1.0, 1.0), Err(SimError::InvalidPrice(_))));
    }
}
