use super::{operation_span, Outcome, PendingRequest, WorkerContext};
use crate::error::DispatchError;
use latbench_core::{Emit, WorkloadKind};
use std::hint::black_box;
use std::time::Instant;
use tokio::time::sleep;
use tracing::Instrument;

/// Baseline: two clock reads with nothing in between.
pub(super) fn run<E: Emit>(share: usize, ctx: &mut WorkerContext<E>) -> Result<(), DispatchError> {
    for _ in 0..share {
        let _op = operation_span(WorkloadKind::Timer).entered();
        let start = Instant::now();
        let elapsed = start.elapsed();
        ctx.record(WorkloadKind::Timer, Outcome::completed(elapsed))?;
    }
    Ok(())
}

pub(super) async fn run_alloc<E: Emit>(
    share: usize,
    ctx: &mut WorkerContext<E>,
) -> Result<(), DispatchError> {
    let timeout = ctx.config.timeout;
    let mut touched = 0usize;

    for _ in 0..share {
        let span = operation_span(WorkloadKind::TimerAlloc);
        let mut pending = PendingRequest::new(&ctx.config.target, timeout);

        let elapsed = async {
            let start = Instant::now();
            sleep(timeout).await;
            pending.release();
            touched = touched.wrapping_add(pending.touch());
            start.elapsed()
        }
        .instrument(span.clone())
        .await;

        span.in_scope(|| ctx.record(WorkloadKind::TimerAlloc, Outcome::completed(elapsed)))?;
    }

    black_box(touched);
    Ok(())
}
