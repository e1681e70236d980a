use super::{operation_span, Outcome, PendingRequest, WorkerContext};
use crate::error::DispatchError;
use latbench_core::{Emit, WorkloadKind};
use std::hint::black_box;
use std::time::Instant;

/// Allocate the request-shaped object, release its deadline and free it, without blocking.
pub(super) fn run<E: Emit>(share: usize, ctx: &mut WorkerContext<E>) -> Result<(), DispatchError> {
    let mut touched = 0usize;

    for _ in 0..share {
        let _op = operation_span(WorkloadKind::AllocOnly).entered();
        let start = Instant::now();
        let mut pending = PendingRequest::new(&ctx.config.target, ctx.config.timeout);
        pending.release();
        touched = touched.wrapping_add(pending.touch());
        drop(pending);
        let elapsed = start.elapsed();

        ctx.record(WorkloadKind::AllocOnly, Outcome::completed(elapsed))?;
    }

    black_box(touched);
    Ok(())
}
