//! Routing metrics.
//!
//! # Metrics
//! - `routing_dispatch_total` (counter): dispatch outcomes by `outcome`
//!   (matched, default, not_found, interrupted)
//! - `routing_attempts_total` (counter): selection attempts made
//! - `routing_retry_total` (counter): waits between attempts
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Labels carry only bounded values, never paths

pub fn record_dispatch(outcome: &'static str) {
    metrics::counter!("routing_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_attempts(attempts: u32) {
    metrics::counter!("routing_attempts_total").increment(u64::from(attempts));
}

pub fn record_retry() {
    metrics::counter!("routing_retry_total").increment(1);
}
