use crate::{
    DEFAULT_IDLE_CONNECTIONS, DEFAULT_REQUESTS, DEFAULT_TARGET, DEFAULT_TIMEOUT, DEFAULT_WORKERS,
};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// The unit of work every worker repeats for its share of the run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    /// HTTP GET against the target, bounded by the timeout.
    NetworkRequest,
    /// Reads the clock twice and does nothing in between.
    Timer,
    /// Sleeps for the timeout while holding a request-shaped allocation.
    TimerAlloc,
    /// Waits on a single-slot signal fired by a helper task after the timeout.
    SignalWait,
    /// `SignalWait` plus a request-shaped allocation.
    SignalWaitAlloc,
    /// Allocates a request-shaped object and releases its deadline straight away.
    AllocOnly,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 6] = [
        WorkloadKind::NetworkRequest,
        WorkloadKind::Timer,
        WorkloadKind::TimerAlloc,
        WorkloadKind::SignalWait,
        WorkloadKind::SignalWaitAlloc,
        WorkloadKind::AllocOnly,
    ];

    /// The command line flag selecting this workload, also used as the metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            WorkloadKind::NetworkRequest => "req",
            WorkloadKind::Timer => "sleep",
            WorkloadKind::TimerAlloc => "sleepAlloc",
            WorkloadKind::SignalWait => "chan",
            WorkloadKind::SignalWaitAlloc => "chanAlloc",
            WorkloadKind::AllocOnly => "alloc",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether the latency of a failed operation still goes out as a sample.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FailedSamples {
    /// Failed operations are counted but produce no sample.
    #[default]
    Exclude,
    Include,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid target URL: {0}")]
    InvalidTarget(#[from] url::ParseError),

    #[error("Unsupported target scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),
}

/// Parameters of a single run. Fixed before dispatch and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub workers: NonZeroUsize,
    pub requests: usize,
    pub idle_connections: usize,
    pub timeout: Duration,
    /// `None` runs every worker through its share without doing any work.
    pub workload: Option<WorkloadKind>,
    pub target: Url,
    pub failed_samples: FailedSamples,
    pub trace: bool,
    pub no_gc: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS, DEFAULT_REQUESTS)
    }
}

impl RunConfig {
    pub fn new(workers: NonZeroUsize, requests: usize) -> Self {
        Self {
            workers,
            requests,
            idle_connections: DEFAULT_IDLE_CONNECTIONS,
            timeout: DEFAULT_TIMEOUT,
            workload: None,
            target: default_target(),
            failed_samples: FailedSamples::default(),
            trace: false,
            no_gc: false,
        }
    }

    pub fn workload(mut self, workload: WorkloadKind) -> Self {
        self.workload = Some(workload);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn idle_connections(mut self, idle_connections: usize) -> Self {
        self.idle_connections = idle_connections;
        self
    }

    pub fn failed_samples(mut self, failed_samples: FailedSamples) -> Self {
        self.failed_samples = failed_samples;
        self
    }

    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn no_gc(mut self, no_gc: bool) -> Self {
        self.no_gc = no_gc;
        self
    }

    pub fn target(mut self, target: &str) -> Result<Self, ConfigError> {
        let target = Url::parse(target)?;
        match target.scheme() {
            "http" | "https" => {
                self.target = target;
                Ok(self)
            }
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn default_target() -> Url {
    // NOTE: DEFAULT_TARGET is a constant, checked by `default_target_parses` below.
    Url::parse(DEFAULT_TARGET).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_parses() {
        assert_eq!(default_target().as_str(), "http://localhost:9001/");
    }

    #[test]
    fn builder_sets_fields() {
        let config = RunConfig::new(NonZeroUsize::new(3).unwrap(), 10)
            .workload(WorkloadKind::SignalWait)
            .timeout(Duration::from_millis(5))
            .idle_connections(4)
            .failed_samples(FailedSamples::Include)
            .target("http://127.0.0.1:3002/delay")
            .unwrap();

        assert_eq!(config.workers.get(), 3);
        assert_eq!(config.requests, 10);
        assert_eq!(config.workload, Some(WorkloadKind::SignalWait));
        assert_eq!(config.timeout, Duration::from_millis(5));
        assert_eq!(config.idle_connections, 4);
        assert_eq!(config.failed_samples, FailedSamples::Include);
        assert_eq!(config.target.port(), Some(3002));
    }

    #[test]
    fn defaults_select_no_workload() {
        let config = RunConfig::default();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.requests, DEFAULT_REQUESTS);
        assert_eq!(config.workload, None);
        assert_eq!(config.failed_samples, FailedSamples::Exclude);
    }

    #[test]
    fn rejects_bad_targets() {
        assert!(matches!(
            RunConfig::default().target("not a url"),
            Err(ConfigError::InvalidTarget(_))
        ));
        assert!(matches!(
            RunConfig::default().target("ftp://localhost:9001"),
            Err(ConfigError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[test]
    fn workload_names_are_unique() {
        let mut names: Vec<_> = WorkloadKind::ALL.iter().map(|w| w.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), WorkloadKind::ALL.len());
    }
}
