use std::num::NonZeroUsize;
use std::time::Duration;

/// Prefix identifying a latency sample line. Everything after it is the sample in nanoseconds.
pub const SAMPLE_PREFIX: &str = "Duration: ";

pub const DEFAULT_TARGET: &str = "http://localhost:9001";

pub const DEFAULT_WORKERS: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(10) };

pub const DEFAULT_REQUESTS: usize = 1000;

/// The default cap on pooled idle connections to the target.
pub const DEFAULT_IDLE_CONNECTIONS: usize = 10_000;

/// The default per-operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// The execution trace is written here, relative to the working directory.
pub const TRACE_PATH: &str = "trace";

pub const DELAY_SERVER_PORT: u16 = 9001;
