use thiserror::Error;

/// Errors surfaced by the simulation kernel and its components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("invalid price {0} for amount computation: must be positive")]
    InvalidPrice(f64),

    #[error("order not found")]
    OrderNotFound,

    #[error("an order with this id already exists")]
    DuplicateOrderId,

    #[error("snapshot is internally crossed: best bid tick {bid_tick} >= best ask tick {ask_tick}")]
    CorruptSnapshot { bid_tick: i64, ask_tick: i64 },

    #[error("event stream exhausted")]
    EndOfData,

    #[error("kernel configuration is incomplete: {0}")]
    IncompleteConfig(&'static str),
}
