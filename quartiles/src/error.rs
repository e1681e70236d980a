use latbench_core::ParseSampleError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Failed to read input")]
    Read(#[source] io::Error),

    #[error("Failed to write output")]
    Write(#[source] io::Error),

    #[error("Invalid sample on line {line}")]
    Parse {
        line: usize,
        #[source]
        source: ParseSampleError,
    },
}
