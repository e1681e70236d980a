use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to write sample: {0}")]
    Emit(#[source] io::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Timer helper finished without signalling.")]
    SignalLost,

    #[error("Task was cancelled before completing.")]
    Cancelled,

    #[error("Failed to open execution trace {path:?}: {source}")]
    TraceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to flush execution trace: {0}")]
    TraceFlush(#[source] io::Error),
}
