//! Latency percentile aggregation.
//!
//! Consumes a line-oriented stream, collects every `Duration: <ns>` sample, echoes every other line
//! unchanged and finally reports seven order statistics of the collected samples.

mod aggregator;
mod error;

pub use aggregator::{aggregate, read_samples};
pub use error::AggregateError;
pub use latbench_core::{QuantileReport, Sample};
