use super::{operation_span, Outcome, PendingRequest, WorkerContext};
use crate::dispatcher::join_task;
use crate::error::DispatchError;
use latbench_core::{Emit, WorkloadKind};
use std::hint::black_box;
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::Instrument;

/// Wait on a one-shot signal that a helper task fires after the timeout.
///
/// The helper is joined before the operation is recorded, so none outlive their operation.
pub(super) async fn run<E: Emit>(
    share: usize,
    ctx: &mut WorkerContext<E>,
    allocate: bool,
) -> Result<(), DispatchError> {
    let kind = if allocate {
        WorkloadKind::SignalWaitAlloc
    } else {
        WorkloadKind::SignalWait
    };
    let timeout = ctx.config.timeout;
    let mut touched = 0usize;

    for _ in 0..share {
        let span = operation_span(kind);
        let (tx, rx) = oneshot::channel::<()>();
        let mut pending = allocate.then(|| PendingRequest::new(&ctx.config.target, timeout));

        let elapsed = async {
            let start = Instant::now();
            let helper = tokio::spawn(async move {
                sleep(timeout).await;
                // NOTE: The receiver is only gone if the worker itself was aborted.
                let _ = tx.send(());
            });
            let signalled = rx.await;
            if let Some(pending) = pending.as_mut() {
                pending.release();
                touched = touched.wrapping_add(pending.touch());
            }
            let elapsed = start.elapsed();

            join_task(helper).await?;
            signalled.map_err(|_| DispatchError::SignalLost)?;
            Ok::<_, DispatchError>(elapsed)
        }
        .instrument(span.clone())
        .await?;

        span.in_scope(|| ctx.record(kind, Outcome::completed(elapsed)))?;
    }

    black_box(touched);
    Ok(())
}
