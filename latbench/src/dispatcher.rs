//! Fanning a run out over its workers.
use crate::error::DispatchError;
use crate::partition::partition;
use crate::trace::ExecutionTrace;
use crate::workload::{self, Tally, WorkerContext};
use humantime::format_duration;
use latbench_core::{Emit, RunConfig, CONNECT_TIMEOUT, POOL_IDLE_TIMEOUT, TCP_KEEPALIVE};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle, JoinSet};
#[allow(unused_imports)]
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

/// Totals for a finished run.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Operations performed across all workers.
    pub operations: u64,
    /// Samples handed to the emitter.
    pub emitted: u64,
    /// Operations that timed out or errored.
    pub failed: u64,
    /// Failed operations whose sample was withheld.
    pub suppressed: u64,
}

impl RunSummary {
    fn absorb(&mut self, tally: Tally) {
        self.operations += tally.operations;
        self.emitted += tally.emitted;
        self.failed += tally.failed;
        self.suppressed += tally.suppressed;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operations={}, Emitted={}, Failed={}, Suppressed={}",
            self.operations, self.emitted, self.failed, self.suppressed
        )
    }
}

/// Runs one configured workload across all workers.
///
/// # Example
/// ```no_run
/// use latbench::prelude::*;
/// use std::num::NonZeroUsize;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = RunConfig::new(NonZeroUsize::new(10).unwrap(), 1_000)
///         .workload(WorkloadKind::SignalWait)
///         .timeout(Duration::from_millis(1));
///
///     let summary = Dispatcher::new(config, StdoutEmitter).run().await.unwrap();
///     assert_eq!(summary.emitted, 1_000);
/// }
/// ```
pub struct Dispatcher<E> {
    config: Arc<RunConfig>,
    emitter: Arc<E>,
    trace: Option<ExecutionTrace>,
}

impl<E: Emit> Dispatcher<E> {
    pub fn new(config: RunConfig, emitter: E) -> Self {
        Self {
            config: Arc::new(config),
            emitter: Arc::new(emitter),
            trace: None,
        }
    }

    /// Stop `trace` once every worker has finished.
    pub fn with_trace(mut self, trace: ExecutionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Spawn one task per worker and wait for all of them.
    ///
    /// Workers are joined as they finish. The first worker error aborts the remaining workers and
    /// is returned; a worker panic is resumed here.
    #[instrument(
        name = "dispatch",
        skip_all,
        fields(workers = self.config.workers.get(), requests = self.config.requests)
    )]
    pub async fn run(self) -> Result<RunSummary, DispatchError> {
        if self.config.trace && self.trace.is_none() {
            warn!("Tracing is enabled but no execution trace is attached.");
        }

        let res = self.dispatch().await;

        if let Some(trace) = &self.trace {
            let stopped = trace.stop();
            if res.is_ok() {
                stopped?;
                debug!("Execution trace written to {:?}", trace.path());
            }
        }

        res
    }

    async fn dispatch(&self) -> Result<RunSummary, DispatchError> {
        let config = &self.config;
        info!("Running with config {:?}", config);

        if config.workload.is_none() {
            warn!("No workload selected; workers will not do any work.");
        }

        #[cfg(feature = "metrics")]
        workload::describe_metrics();

        let start = Instant::now();
        let client = build_client(config)?;
        let shares = partition(config.requests, config.workers);
        trace!("Worker shares: {shares:?}");

        let mut workers = JoinSet::new();
        for (id, share) in shares.into_iter().enumerate() {
            let ctx = WorkerContext::new(config.clone(), client.clone(), self.emitter.clone());
            workers.spawn(
                workload::run_share(config.workload, share, ctx)
                    .instrument(info_span!("worker", id, share)),
            );
        }

        let mut summary = RunSummary::default();
        while let Some(res) = workers.join_next().await {
            match resume_panic(res).and_then(|res| res) {
                Ok(tally) => summary.absorb(tally),
                Err(err) => {
                    error!("Worker failed, cancelling the rest: {err}");
                    workers.abort_all();
                    return Err(err);
                }
            }
        }

        info!("Run complete in {}. {summary}", format_duration(start.elapsed()));
        Ok(summary)
    }
}

/// Wait on a spawned task, resuming its panic on the caller.
pub(crate) async fn join_task<T>(handle: JoinHandle<T>) -> Result<T, DispatchError> {
    resume_panic(handle.await)
}

fn resume_panic<T>(res: Result<T, JoinError>) -> Result<T, DispatchError> {
    match res {
        Ok(value) => Ok(value),
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => Err(DispatchError::Cancelled),
    }
}

/// One client for the whole run; its idle pool is shared by every worker.
fn build_client(config: &RunConfig) -> Result<Client, DispatchError> {
    Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(config.idle_connections)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .build()
        .map_err(DispatchError::Client)
}
