mod config;
mod constants;
mod emitter;
mod sample;
mod stats;

pub use config::*;
pub use constants::*;
pub use emitter::*;
pub use sample::*;
pub use stats::*;
