//! The timed units of work a worker repeats for its share.
mod alloc;
mod request;
mod signal;
mod timer;

pub(crate) use request::PendingRequest;

use crate::error::DispatchError;
use latbench_core::{Emit, FailedSamples, RunConfig, Sample, WorkloadKind};
use std::sync::Arc;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, trace_span, warn, Span};

/// How a single operation ended, and how long it took to get there.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Outcome {
    pub elapsed: Duration,
    pub ok: bool,
}

impl Outcome {
    pub fn completed(elapsed: Duration) -> Self {
        Self { elapsed, ok: true }
    }

    pub fn failed(elapsed: Duration) -> Self {
        Self { elapsed, ok: false }
    }
}

/// Per-worker counts, folded into the run summary after the barrier.
#[derive(Debug, Default, Copy, Clone)]
pub(crate) struct Tally {
    pub operations: u64,
    pub emitted: u64,
    pub failed: u64,
    pub suppressed: u64,
}

pub(crate) struct WorkerContext<E> {
    config: Arc<RunConfig>,
    client: reqwest::Client,
    emitter: Arc<E>,
    tally: Tally,
}

impl<E: Emit> WorkerContext<E> {
    pub fn new(config: Arc<RunConfig>, client: reqwest::Client, emitter: Arc<E>) -> Self {
        Self {
            config,
            client,
            emitter,
            tally: Tally::default(),
        }
    }

    /// Account for one finished operation and emit its sample.
    fn record(&mut self, kind: WorkloadKind, outcome: Outcome) -> Result<(), DispatchError> {
        self.tally.operations += 1;
        trace!(
            workload = kind.name(),
            elapsed_ns = Sample::from_duration(outcome.elapsed).as_nanos(),
            ok = outcome.ok,
            "Operation finished"
        );

        #[cfg(feature = "metrics")]
        record_metrics(kind, outcome);

        if !outcome.ok {
            self.tally.failed += 1;
            if self.config.failed_samples == FailedSamples::Exclude {
                self.tally.suppressed += 1;
                return Ok(());
            }
        }

        self.emitter
            .emit(Sample::from_duration(outcome.elapsed))
            .map_err(DispatchError::Emit)?;
        self.tally.emitted += 1;
        Ok(())
    }
}

/// Span covering one timed operation.
fn operation_span(kind: WorkloadKind) -> Span {
    trace_span!("operation", workload = kind.name())
}

/// Run `share` operations of `workload` back to back.
pub(crate) async fn run_share<E: Emit>(
    workload: Option<WorkloadKind>,
    share: usize,
    mut ctx: WorkerContext<E>,
) -> Result<Tally, DispatchError> {
    match workload {
        Some(WorkloadKind::NetworkRequest) => request::run(share, &mut ctx).await?,
        Some(WorkloadKind::Timer) => timer::run(share, &mut ctx)?,
        Some(WorkloadKind::TimerAlloc) => timer::run_alloc(share, &mut ctx).await?,
        Some(WorkloadKind::SignalWait) => signal::run(share, &mut ctx, false).await?,
        Some(WorkloadKind::SignalWaitAlloc) => signal::run(share, &mut ctx, true).await?,
        Some(WorkloadKind::AllocOnly) => alloc::run(share, &mut ctx)?,
        None => trace!("No workload selected, skipping {share} operations."),
    }

    debug!("Worker finished: {:?}", ctx.tally);
    Ok(ctx.tally)
}

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    metrics::describe_histogram!(
        "latbench_latency",
        metrics::Unit::Nanoseconds,
        "Per-operation latency."
    );
    metrics::describe_counter!("latbench_success", "Operations that completed.");
    metrics::describe_counter!("latbench_error", "Operations that timed out or failed.");
}

#[cfg(feature = "metrics")]
fn record_metrics(kind: WorkloadKind, outcome: Outcome) {
    let workload = kind.name();
    metrics::histogram!("latbench_latency", "workload" => workload)
        .record(outcome.elapsed.as_nanos() as f64);

    if outcome.ok {
        metrics::counter!("latbench_success", "workload" => workload).increment(1);
    } else {
        metrics::counter!("latbench_error", "workload" => workload).increment(1);
    }
}
