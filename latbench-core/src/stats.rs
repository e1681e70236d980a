use crate::Sample;
use humantime::format_duration;
use std::fmt;

/// The order statistics reported for every sample set, highest first.
pub const PERCENTILES: [u32; 7] = [100, 99, 90, 50, 10, 1, 0];

/// Order statistics of one fully collected sample set.
///
/// An empty sample set yields a report of zeros.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct QuantileReport {
    pub count: usize,
    pub p100: Sample,
    pub p99: Sample,
    pub p90: Sample,
    pub p50: Sample,
    pub p10: Sample,
    pub p01: Sample,
    pub p00: Sample,
}

impl QuantileReport {
    /// Sorts `samples` ascending in place and reads the percentiles off the sorted set.
    pub fn from_samples(samples: &mut [Sample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        samples.sort_unstable();
        let at = |p| percentile(samples, p).unwrap_or_default();

        Self {
            count: samples.len(),
            p100: at(100),
            p99: at(99),
            p90: at(90),
            p50: at(50),
            p10: at(10),
            p01: at(1),
            p00: at(0),
        }
    }

    /// Labelled values in report order.
    pub fn entries(&self) -> [(&'static str, Sample); 7] {
        [
            ("P100", self.p100),
            ("P99 ", self.p99),
            ("P90 ", self.p90),
            ("P50 ", self.p50),
            ("P10 ", self.p10),
            ("P01 ", self.p01),
            ("P00 ", self.p00),
        ]
    }
}

/// Truncated nearest-rank order statistic: `sorted[⌊(n-1)·p/100⌋]`.
///
/// `sorted` must be in ascending order. Percentiles above 100 are clamped; an empty slice has no
/// percentiles.
pub fn percentile(sorted: &[Sample], percentile: u32) -> Option<Sample> {
    let last = sorted.len().checked_sub(1)?;
    sorted.get(rank(last, percentile.min(100))).copied()
}

/// `⌊last·p/100⌋` without forming `last·p`, which overflows a 32-bit `usize` on large sets.
fn rank(last: usize, percentile: u32) -> usize {
    let p = percentile as usize;
    (last / 100) * p + (last % 100) * p / 100
}

// NOTE: The layout, including the trailing space on every line, is scraped by external tooling.
impl fmt::Display for QuantileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "N: {} ", self.count)?;
        for (label, sample) in self.entries() {
            writeln!(f, "{label}: {} ", format_duration(sample.as_duration()))?;
        }
        Ok(())
    }
}
