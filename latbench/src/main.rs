use anyhow::Result;
use clap::{Args, Parser};
use latbench::prelude::*;
use latbench_core::{
    DEFAULT_IDLE_CONNECTIONS, DEFAULT_REQUESTS, DEFAULT_TARGET, DEFAULT_WORKERS, TRACE_PATH,
};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const DEFAULT_LOG_FILTER: &str = "latbench=info";

/// Issue a fixed number of operations across concurrent workers and print one
/// `Duration: <ns>` line per operation.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// The number of concurrent workers
    #[arg(short('p'), long("workers"), default_value_t = DEFAULT_WORKERS)]
    workers: NonZeroUsize,

    /// The total number of operations to perform
    #[arg(short('r'), long("requests"), default_value_t = DEFAULT_REQUESTS)]
    requests: usize,

    /// The number of idle connections to keep pooled
    #[arg(short('i'), long("idle"), default_value_t = DEFAULT_IDLE_CONNECTIONS)]
    idle: usize,

    /// The timeout for each operation, e.g. `3s`, `250ms`
    #[arg(
        short('t'),
        long("timeout"),
        default_value = "3s",
        value_parser = humantime::parse_duration
    )]
    timeout: Duration,

    #[command(flatten)]
    workload: WorkloadArgs,

    /// Write an execution trace to `./trace`
    #[arg(long)]
    trace: bool,

    /// Accepted for compatibility. There is no garbage collector to disable.
    #[arg(long)]
    nogc: bool,

    /// The URL requested by `--req`
    #[arg(long, default_value = DEFAULT_TARGET)]
    target: String,

    /// Emit samples for failed requests too
    #[arg(long)]
    include_failed: bool,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

/// At most one workload may be selected.
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct WorkloadArgs {
    /// HTTP GET requests against the target
    #[arg(long)]
    req: bool,

    /// Timer reads with no work in between
    #[arg(long)]
    sleep: bool,

    /// Sleep the timeout while holding a request allocation
    #[arg(long("sleepAlloc"))]
    sleep_alloc: bool,

    /// Wait on a signal fired by a helper task after the timeout
    #[arg(long)]
    chan: bool,

    /// `--chan` plus a request allocation
    #[arg(long("chanAlloc"))]
    chan_alloc: bool,

    /// Allocate a request and release its deadline
    #[arg(long)]
    alloc: bool,
}

impl WorkloadArgs {
    fn kind(&self) -> Option<WorkloadKind> {
        [
            (self.req, WorkloadKind::NetworkRequest),
            (self.sleep, WorkloadKind::Timer),
            (self.sleep_alloc, WorkloadKind::TimerAlloc),
            (self.chan, WorkloadKind::SignalWait),
            (self.chan_alloc, WorkloadKind::SignalWaitAlloc),
            (self.alloc, WorkloadKind::AllocOnly),
        ]
        .into_iter()
        .find_map(|(set, kind)| set.then_some(kind))
    }
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let failed_samples = if self.include_failed {
            FailedSamples::Include
        } else {
            FailedSamples::Exclude
        };

        let mut config = RunConfig::new(self.workers, self.requests)
            .idle_connections(self.idle)
            .timeout(self.timeout)
            .failed_samples(failed_samples)
            .trace(self.trace)
            .no_gc(self.nogc)
            .target(&self.target)?;
        config.workload = self.workload.kind();

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.run_config()?;

    let trace = if config.trace {
        Some(ExecutionTrace::start(TRACE_PATH)?)
    } else {
        None
    };
    init_tracing(trace.as_ref());

    if config.no_gc {
        warn!("--nogc has no effect: there is no garbage collector to disable.");
    }
    install_metrics(cli.metrics_addr)?;

    let mut dispatcher = Dispatcher::new(config, StdoutEmitter);
    if let Some(trace) = trace {
        dispatcher = dispatcher.with_trace(trace);
    }

    let summary = dispatcher.run().await?;
    if summary.failed > 0 {
        warn!("{} of {} operations failed.", summary.failed, summary.operations);
    }

    Ok(())
}

/// Logs go to stderr; stdout carries nothing but samples.
fn init_tracing(trace: Option<&ExecutionTrace>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(trace.map(|trace| trace.layer::<Registry>()))
        .with(stderr)
        .init();
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: Option<SocketAddr>) -> Result<()> {
    if let Some(addr) = addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Serving metrics on {addr}");
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: Option<SocketAddr>) -> Result<()> {
    if addr.is_some() {
        warn!("Built without the `metrics` feature; ignoring --metrics-addr.");
    }
    Ok(())
}
