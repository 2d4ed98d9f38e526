//! A minimal single-level market-making demo over a synthetic event stream,
//! in the shape of the teacher crate's `gridtrading_backtest_args` example:
//! parse run parameters with `clap`, initialize `tracing_subscriber`, drive
//! a `SimulationKernel`, and write the recorded account series to CSV.
//!
//! Real feed ingestion is out of scope for this crate (see `SPEC_FULL.md`
//! §6), so the event stream here is generated rather than read from a file:
//! a flat two-sided book with a periodic trade print walking through the
//! quoted levels.

use clap::Parser;
use hftsim::{
    assettype::LinearAsset,
    kernel::{SimConfig, SimulationKernel},
    models::{fee::CommonFees, latency::ConstantLatency, queue::RiskAverseQueueModel},
    proc::exchange::FillPolicy,
    recorder::{Record, Recorder},
    types::{Event, OrdType, TimeInForce, BUY, DEPTH_EVENT, SELL, TRADE_EVENT},
};

#[derive(Parser, Debug)]
#[command(about = None, long_about = None)]
struct Args {
    #[arg(long, default_value_t = 0.1)]
    tick_size: f64,
    #[arg(long, default_value_t = 1.0)]
    lot_size: f64,
    #[arg(long, default_value_t = 100.0)]
    mid_price: f64,
    #[arg(long, default_value_t = 10.0)]
    depth_qty: f64,
    #[arg(long, default_value_t = 1.0)]
    order_qty: f64,
    #[arg(long, default_value_t = 1_000)]
    num_trades: u64,
    #[arg(long, default_value_t = -0.00005)]
    maker_fee: f64,
    #[arg(long, default_value_t = 0.0007)]
    taker_fee: f64,
    #[arg(long, default_value_t = String::from("replay.csv"))]
    output_path: String,
}

/// Builds a flat book at `mid_price` plus `num_trades` alternating-side
/// prints, spaced 100ms apart, each large enough to walk through the
/// standing level at its price.
fn synthetic_stream(args: &Args) -> Vec<Event> {
    let half_spread = args.tick_size;
    let bid = args.mid_price - half_spread;
    let ask = args.mid_price + half_spread;

    let mut events = vec![
        Event { ev: DEPTH_EVENT | BUY, exch_ts: 0, local_ts: 0, px: bid, qty: args.depth_qty },
        Event { ev: DEPTH_EVENT | SELL, exch_ts: 0, local_ts: 0, px: ask, qty: args.depth_qty },
    ];

    for i in 0..args.num_trades {
        let ts = (i as i64 + 1) * 100_000_000;
        let (side, px) = if i % 2 == 0 { (SELL, bid) } else { (BUY, ask) };
        events.push(Event { ev: TRADE_EVENT | side, exch_ts: ts, local_ts: ts, px, qty: args.depth_qty });
        events.push(Event {
            ev: DEPTH_EVENT | if i % 2 == 0 { BUY } else { SELL },
            exch_ts: ts,
            local_ts: ts,
            px: if i % 2 == 0 { bid } else { ask },
            qty: args.depth_qty,
        });
    }
    events
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let events = synthetic_stream(&args);

    let config =
        SimConfig::new(args.tick_size, args.lot_size, FillPolicy::PartialFill).expect("valid config");
    let mut kernel = SimulationKernel::new(
        config,
        events,
        LinearAsset::new(1.0),
        RiskAverseQueueModel,
        CommonFees::new(args.maker_fee, args.taker_fee),
        ConstantLatency::new(10_000_000, 10_000_000),
    )
    .expect("valid kernel setup");

    let mut recorder = Recorder::new();
    let mut next_order_id = 1;
    let mut step = 0u64;

    while kernel.elapse(100_000_000).expect("replay does not error") {
        step += 1;

        let bid_tick = ((args.mid_price - args.tick_size) / args.tick_size).round() as i64;
        let ask_tick = ((args.mid_price + args.tick_size) / args.tick_size).round() as i64;

        if kernel.orders().count() == 0 {
            kernel
                .submit_buy_order(next_order_id, bid_tick, args.order_qty, OrdType::Limit, TimeInForce::GTC)
                .expect("submit buy");
            next_order_id += 1;
            kernel
                .submit_sell_order(next_order_id, ask_tick, args.order_qty, OrdType::Limit, TimeInForce::GTC)
                .expect("submit sell");
            next_order_id += 1;
        }

        if step.is_multiple_of(10) {
            recorder.record(Record {
                timestamp: kernel.current_timestamp(),
                mid_price: args.mid_price,
                position: kernel.position(),
                balance: kernel.balance(),
                fee: 0.0,
                equity: kernel.equity(),
                trade_num: 0,
                trade_qty: 0.0,
                trade_amount: 0.0,
            });
        }
    }

    recorder.to_csv(&args.output_path).expect("write recorded series");
    tracing::info!(path = %args.output_path, records = recorder.records().len(), "replay complete");
}
