//! Entry (local -> exchange) and response (exchange -> local) latency
//! models.

use crate::types::Order;

/// Governs how long an order request takes to reach the exchange
/// (`entry`) and how long its acknowledgement takes to come back
/// (`response`). Both return nanoseconds and are clamped to be
/// non-negative by every implementation below.
pub trait LatencyModel {
    fn entry<Q: Clone>(&mut self, current_ts: i64, order: &Order<Q>) -> i64;
    fn response<Q: Clone>(&mut self, current_ts: i64, order: &Order<Q>) -> i64;

    /// Called by the exchange processor whenever it processes a depth or
    /// trade event, giving latency models derived from feed timing
    /// (e.g. [`FeedLatency`]) a chance to update. A no-op for models that
    /// don't depend on feed timing.
    fn observe_feed(&mut self, _exch_ts: i64, _local_ts: i64) {}
}

/// Fixed entry/response latency, independent of timestamp or order.
#[derive(Clone, Copy, Debug)]
pub struct ConstantLatency {
    entry_latency: i64,
    response_latency: i64,
}

impl ConstantLatency {
    pub fn new(entry_latency: i64, response_latency: i64) -> Self {
        Self {
            entry_latency: entry_latency.max(0),
            response_latency: response_latency.max(0),
        }
    }
}

impl LatencyModel for ConstantLatency {
    fn entry<Q: Clone>(&mut self, _current_ts: i64, _order: &Order<Q>) -> i64 {
        self.entry_latency
    }

    fn response<Q: Clone>(&mut self, _current_ts: i64, _order: &Order<Q>) -> i64 {
        self.response_latency
    }
}

/// Derives entry/response latency from the most recently observed feed
/// latency (`local_ts - exch_ts` of the latest depth/trade event seen by
/// the exchange processor), scaled by a configurable multiplier per
/// direction.
#[derive(Clone, Copy, Debug)]
pub struct FeedLatency {
    last_feed_latency: i64,
    entry_multiplier: f64,
    response_multiplier: f64,
}

impl FeedLatency {
    pub fn new(entry_multiplier: f64, response_multiplier: f64) -> Self {
        Self {
            last_feed_latency: 0,
            entry_multiplier,
            response_multiplier,
        }
    }
}

impl LatencyModel for FeedLatency {
    fn entry<Q: Clone>(&mut self, _current_ts: i64, _order: &Order<Q>) -> i64 {
        ((self.last_feed_latency as f64) * self.entry_multiplier).max(0.0) as i64
    }

    /// Records the feed latency the next order will be quoted against.
    fn observe_feed(&mut self, exch_ts: i64, local_ts: i64) {
        self.last_feed_latency = (local_ts - exch_ts).max(0);
    }

    fn response<Q: Clone>(&mut self, _current_ts: i64, _order: &Order<Q>) -> i64 {
        ((self.last_feed_latency as f64) * self.response_multiplier).max(0.0) as i64
    }
}

/// One recorded (request, exchange, response) timestamp triple used to
/// interpolate latency for [`InterpolatedOrderLatency`].
#[derive(Clone, Copy, Debug)]
pub struct OrderLatencySample {
    pub req_timestamp: i64,
    pub exch_timestamp: i64,
    pub resp_timestamp: i64,
}

/// Interpolates entry/response latency between recorded samples, clamping
/// to the nearest sample outside the recorded range.
#[derive(Clone, Debug)]
pub struct InterpolatedOrderLatency {
    entry_rn: usize,
    resp_rn: usize,
    samples: Vec<OrderLatencySample>,
}

impl InterpolatedOrderLatency {
    pub fn new(samples: Vec<OrderLatencySample>) -> Self {
        assert!(!samples.is_empty(), "InterpolatedOrderLatency needs at least one sample");
        Self {
            entry_rn: 0,
            resp_rn: 0,
            samples,
        }
    }

    fn interpolate(x: i64, x1: i64, y1: i64, x2: i64, y2: i64) -> i64 {
        if x2 == x1 {
            return y1;
        }
        (((y2 - y1) as f64) / ((x2 - x1) as f64) * ((x - x1) as f64) + y1 as f64) as i64
    }
}

impl LatencyModel for InterpolatedOrderLatency {
    fn entry<Q: Clone>(&mut self, current_ts: i64, _order: &Order<Q>) -> i64 {
        let first = self.samples[0];
        if current_ts < first.req_timestamp {
            return (first.exch_timestamp - first.req_timestamp).max(0);
        }
        let last = *self.samples.last().unwrap();
        if current_ts >= last.req_timestamp {
            return (last.exch_timestamp - last.req_timestamp).max(0);
        }

        for rn in self.entry_rn..(self.samples.len() - 1) {
            let cur = self.samples[rn];
            let next = self.samples[rn + 1];
            if cur.req_timestamp <= current_ts && current_ts < next.req_timestamp {
                self.entry_rn = rn;
                let lat1 = cur.exch_timestamp - cur.req_timestamp;
                let lat2 = next.exch_timestamp - next.req_timestamp;
                let lat = Self::interpolate(
                    current_ts,
                    cur.req_timestamp,
                    lat1,
                    next.req_timestamp,
                    lat2,
                );
                return lat.max(0);
            }
        }
        0
    }

    fn response<Q: Clone>(&mut self, current_ts: i64, _order: &Order<Q>) -> i64 {
        let first = self.samples[0];
        if current_ts < first.exch_timestamp {
            return (first.resp_timestamp - first.exch_timestamp).max(0);
        }
        let last = *self.samples.last().unwrap();
        if current_ts >= last.exch_timestamp {
            return (last.resp_timestamp - last.exch_timestamp).max(0);
        }

        for rn in self.resp_rn..(self.samples.len() - 1) {
            let cur = self.samples[rn];
            let next = self.samples[rn + 1];
            if cur.exch_timestamp <= current_ts && current_ts < next.exch_timestamp {
                self.resp_rn = rn;
                let lat1 = cur.resp_timestamp - cur.exch_timestamp;
                let lat2 = next.resp_timestamp - next.exch_timestamp;
                let lat = Self::interpolate(
                    current_ts,
                    cur.exch_timestamp,
                    lat1,
                    next.exch_timestamp,
                    lat2,
                );
                return lat.max(0);
            }
        }
        0
    }
}
