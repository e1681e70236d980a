use crate::SAMPLE_PREFIX;
use std::fmt;
use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

/// A single latency measurement, in nanoseconds.
///
/// The `Display` impl renders the wire format shared by the load generator and the aggregator:
/// `Duration: <nanoseconds>`, without the trailing newline.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sample(u64);

impl Sample {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Saturates at `u64::MAX` nanoseconds (roughly 584 years).
    pub fn from_duration(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_nanos(self.0)
    }

    /// Parses the payload that follows [`SAMPLE_PREFIX`] as a base-10 integer.
    pub fn from_payload(payload: &str) -> Result<Self, ParseSampleError> {
        payload
            .parse::<u64>()
            .map(Self)
            .map_err(|source| ParseSampleError {
                payload: payload.to_string(),
                source,
            })
    }

    /// Returns `None` when the line is not a sample line at all.
    pub fn parse_line(line: &str) -> Option<Result<Self, ParseSampleError>> {
        line.strip_prefix(SAMPLE_PREFIX).map(Self::from_payload)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SAMPLE_PREFIX}{}", self.0)
    }
}

impl From<Duration> for Sample {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

#[derive(Debug, Error)]
#[error("Invalid sample payload {payload:?}: {source}")]
pub struct ParseSampleError {
    pub payload: String,
    #[source]
    pub source: ParseIntError,
}
