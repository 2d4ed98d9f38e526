//! # hftsim
//!
//! A deterministic, latency-aware market-replay backtesting kernel for
//! high-frequency trading strategies.
//!
//! The kernel reconstructs an L2 order book from a replayed event stream and
//! runs two coupled views of the world: an [`proc::exchange`] processor that
//! sees events at their exchange timestamp and matches resting orders, and a
//! [`proc::local`] processor that sees the same events at their local
//! receipt timestamp and is the only thing a strategy talks to. The two are
//! coupled through a latency-delayed [`bus::OrderBus`].
//!
//! ## Key properties
//! - Single-threaded, deterministic: the same event stream and configuration
//!   always produce the same order history and P&L.
//! - Queue-position-aware fill simulation, with pluggable [`models::queue`]
//!   models.
//! - Feed and order latency simulation via pluggable [`models::latency`]
//!   models.
//! - Linear and inverse contract accounting via [`assettype`].

pub mod assettype;
pub mod bus;
pub mod depth;
pub mod error;
pub mod evs;
pub mod kernel;
pub mod models;
pub mod proc;
pub mod recorder;
pub mod source;
pub mod state;
pub mod types;

pub use error::SimError;
pub use kernel::{SimConfig, SimulationKernel};
pub use types::{Event, EventKind, Order, OrdType, Side, Status, TimeInForce};
