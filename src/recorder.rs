//! Captures a time series of account state for later performance analysis.
//!
//! The teacher crate records into a zipped `.npy` archive for vectorized,
//! cross-language analysis tooling; that ingestion format is out of scope
//! here, so this keeps the same periodic snapshot but writes plain CSV.

use std::{fs::File, io::Write, path::Path};

/// One recorded snapshot of account state at a point in simulated time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    pub timestamp: i64,
    pub mid_price: f64,
    pub position: f64,
    pub balance: f64,
    pub fee: f64,
    pub equity: f64,
    pub trade_num: u64,
    pub trade_qty: f64,
    pub trade_amount: f64,
}

/// Accumulates [`Record`]s as the strategy loop calls [`Recorder::record`].
#[derive(Default)]
pub struct Recorder {
    records: Vec<Record>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Writes the recorded series to a CSV file at `path`.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(
            file,
            "timestamp,mid_price,position,balance,fee,equity,trade_num,trade_qty,trade_amount"
        )?;
        for r in &self.records {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{}",
                r.timestamp,
                r.mid_price,
                r.position,
                r.balance,
                r.fee,
                r.equity,
                r.trade_num,
                r.trade_qty,
                r.trade_amount
            )?;
        }
        Ok(())
    }
}
