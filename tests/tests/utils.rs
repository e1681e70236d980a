use latbench::core::MemoryEmitter;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(EnvFilter::new("latbench=debug,quartiles=debug,delay_server=debug"))
            .try_init();
    });
}

/// Start a delay-server on an ephemeral port. Its own samples land in the returned emitter.
#[allow(unused)]
pub async fn spawn_delay_server(delay: Duration) -> (SocketAddr, MemoryEmitter) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let emitter = MemoryEmitter::new();

    let app = delay_server::router(delay, emitter.clone());
    tokio::spawn(async move {
        if let Err(err) = delay_server::serve(listener, app).await {
            error!("Delay server stopped: {err}");
        }
    });

    (addr, emitter)
}

/// An in-memory stdout stand-in that stays readable after the dispatcher has consumed its writer.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

#[allow(unused)]
impl SharedBuf {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
