#![doc = include_str!("../README.md")]

pub mod dispatcher;
pub mod partition;
pub mod trace;

mod error;
mod workload;

pub use dispatcher::{Dispatcher, RunSummary};
pub use error::DispatchError;
pub use latbench_core as core;
pub use partition::partition;
pub use trace::ExecutionTrace;

pub mod prelude {
    pub use crate::dispatcher::{Dispatcher, RunSummary};
    pub use crate::trace::ExecutionTrace;
    pub use latbench_core::{
        Emit, FailedSamples, MemoryEmitter, RunConfig, Sample, StdoutEmitter, WorkloadKind,
        WriterEmitter,
    };
}
