//! Execution trace of a run, written to a file.
use crate::error::DispatchError;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Subscriber;
use tracing_subscriber::fmt::{format::FmtSpan, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Records every span and event, at every level, into a file until stopped.
///
/// The file is truncated when the trace starts. [`ExecutionTrace::stop`] flushes and closes it;
/// anything logged afterwards is discarded.
#[derive(Clone, Debug)]
pub struct ExecutionTrace {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    file: Mutex<Option<BufWriter<File>>>,
}

impl ExecutionTrace {
    pub fn start(path: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| DispatchError::TraceOpen {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                file: Mutex::new(Some(BufWriter::new(file))),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .file
            .lock()
            .map(|file| file.is_some())
            .unwrap_or(false)
    }

    /// A `tracing-subscriber` layer feeding this trace, including span open and close events.
    pub fn layer<S>(&self) -> impl Layer<S> + Send + Sync + 'static
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        tracing_subscriber::fmt::layer()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
    }

    /// Flush and close the file. Calling it again does nothing.
    pub fn stop(&self) -> Result<(), DispatchError> {
        let file = self
            .inner
            .file
            .lock()
            .map_err(|_| DispatchError::TraceFlush(poisoned()))?
            .take();

        if let Some(mut file) = file {
            file.flush().map_err(DispatchError::TraceFlush)?;
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for ExecutionTrace {
    type Writer = TraceWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        TraceWriter {
            file: &self.inner.file,
        }
    }
}

/// Writes into the trace file while it is open and into the void afterwards.
pub struct TraceWriter<'a> {
    file: &'a Mutex<Option<BufWriter<File>>>,
}

impl Write for TraceWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.lock().map_err(|_| poisoned())?.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.lock().map_err(|_| poisoned())?.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "Execution trace mutex is poisoned.")
}
