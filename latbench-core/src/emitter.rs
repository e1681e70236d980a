use crate::Sample;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Sink for latency samples.
///
/// Implementations must write each sample as one whole line so that samples from concurrent
/// workers never interleave mid-line.
pub trait Emit: Send + Sync + 'static {
    fn emit(&self, sample: Sample) -> io::Result<()>;
}

impl<E: Emit> Emit for Arc<E> {
    fn emit(&self, sample: Sample) -> io::Result<()> {
        (**self).emit(sample)
    }
}

/// Writes samples to the process' standard output.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdoutEmitter;

impl Emit for StdoutEmitter {
    fn emit(&self, sample: Sample) -> io::Result<()> {
        // NOTE: Format first so the line reaches stdout in a single write while holding the lock.
        let line = format!("{sample}\n");
        io::stdout().lock().write_all(line.as_bytes())
    }
}

/// Writes samples in the wire format to an arbitrary writer.
#[derive(Debug)]
pub struct WriterEmitter<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> WriterEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(poisoned)
    }
}

impl<W: Write + Send + 'static> Emit for WriterEmitter<W> {
    fn emit(&self, sample: Sample) -> io::Result<()> {
        let line = format!("{sample}\n");
        let mut writer = self.writer.lock().map_err(poisoned)?;
        writer.write_all(line.as_bytes())
    }
}

/// Keeps samples in memory instead of writing them anywhere.
#[derive(Debug, Default, Clone)]
pub struct MemoryEmitter {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of every sample recorded so far, in arrival order.
    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .map(|samples| samples.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Emit for MemoryEmitter {
    fn emit(&self, sample: Sample) -> io::Result<()> {
        self.samples.lock().map_err(poisoned)?.push(sample);
        Ok(())
    }
}

fn poisoned<T>(_err: PoisonError<T>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "Sample sink mutex is poisoned.")
}
