use super::{operation_span, Outcome, WorkerContext};
use crate::error::DispatchError;
use latbench_core::{Emit, WorkloadKind};
use reqwest::{Client, Method, Request, Url};
use std::hint::black_box;
use std::pin::Pin;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::{sleep, Sleep};
use tracing::{debug, Instrument};

/// A GET against the target, together with the deadline that bounds it.
///
/// The allocation workloads use it as their request-shaped object.
pub(crate) struct PendingRequest {
    request: Box<Request>,
    deadline: Option<Pin<Box<Sleep>>>,
}

#[derive(Debug, Error)]
pub(crate) enum RequestFailure {
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl PendingRequest {
    pub fn new(target: &Url, timeout: Duration) -> Self {
        Self {
            request: Box::new(Request::new(Method::GET, target.clone())),
            deadline: Some(Box::pin(sleep(timeout))),
        }
    }

    /// Drop the deadline timer.
    pub fn release(&mut self) {
        self.deadline = None;
    }

    /// Read through the allocation so the optimizer has to keep it.
    pub fn touch(&self) -> usize {
        black_box(self.request.url().as_str().len())
    }

    /// Send the request and drain the response body, giving up when the deadline fires.
    ///
    /// The deadline is released on every path. Any response counts as success regardless of its
    /// status code.
    pub async fn execute(self, client: &Client) -> Result<(), RequestFailure> {
        let Self { request, deadline } = self;
        let exchange = async move {
            let response = client.execute(*request).await?;
            response.bytes().await?;
            Ok::<(), reqwest::Error>(())
        };

        match deadline {
            Some(deadline) => tokio::select! {
                res = exchange => res.map_err(RequestFailure::from),
                _ = deadline => Err(RequestFailure::DeadlineExceeded),
            },
            None => exchange.await.map_err(RequestFailure::from),
        }
    }
}

pub(super) async fn run<E: Emit>(
    share: usize,
    ctx: &mut WorkerContext<E>,
) -> Result<(), DispatchError> {
    for _ in 0..share {
        let span = operation_span(WorkloadKind::NetworkRequest);
        let pending = PendingRequest::new(&ctx.config.target, ctx.config.timeout);

        let start = Instant::now();
        let res = pending.execute(&ctx.client).instrument(span.clone()).await;
        let elapsed = start.elapsed();

        span.in_scope(|| {
            let outcome = match res {
                Ok(()) => Outcome::completed(elapsed),
                Err(err) => {
                    debug!("Request failed after {elapsed:?}: {err}");
                    Outcome::failed(elapsed)
                }
            };
            ctx.record(WorkloadKind::NetworkRequest, outcome)
        })?;
    }
    Ok(())
}
