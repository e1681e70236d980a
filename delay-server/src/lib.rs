//! The benchmark target: answers every path with `Hello, "<path>"` after an optional delay and
//! prints a `Duration: <ns>` sample per request to its own stdout.
use axum::{extract::State, http::Uri, Router};
use latbench_core::{Emit, Sample, StdoutEmitter};
#[allow(unused)]
use metrics::counter;
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error")]
    Serve(#[from] std::io::Error),
}

struct ServerState {
    delay: Duration,
    emitter: Arc<dyn Emit>,
}

/// Every path is routed to the same handler.
pub fn router<E: Emit>(delay: Duration, emitter: E) -> Router {
    let state = ServerState {
        delay,
        emitter: Arc::new(emitter),
    };

    Router::new()
        .fallback(hello)
        .with_state(Arc::new(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serve on `0.0.0.0:<port>` with samples going to stdout.
pub async fn run(port: u16, delay: Duration) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!("Listening on {addr} with a delay of {}", humantime::format_duration(delay));
    serve(listener, router(delay, StdoutEmitter)).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), ServerError> {
    debug!("Axum server starting up...");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn hello(State(state): State<Arc<ServerState>>, uri: Uri) -> String {
    let start = Instant::now();
    counter!("delay_server_requests").increment(1);

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let path = percent_decode_str(uri.path()).decode_utf8_lossy();
    let body = format!("Hello, {:?}", escape_html(&path));

    let sample = Sample::from_duration(start.elapsed());
    if let Err(err) = state.emitter.emit(sample) {
        error!("Failed to write sample: {err}");
    }

    body
}

/// Escapes the five characters significant in HTML.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use latbench_core::MemoryEmitter;
    use ntest::timeout;

    async fn spawn(delay: Duration, emitter: MemoryEmitter) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, router(delay, emitter)));
        addr
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap()
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    #[test]
    fn escapes_html() {
        assert_eq!(escape_html("/plain"), "/plain");
        assert_eq!(
            escape_html(r#"<a href='x'>&"#),
            "&lt;a href=&#39;x&#39;&gt;&amp;"
        );
        assert_eq!(escape_html(r#""q""#), "&#34;q&#34;");
    }

    #[tokio::test]
    #[timeout(5000)]
    async fn answers_every_path() {
        let emitter = MemoryEmitter::new();
        let addr = spawn(Duration::ZERO, emitter.clone()).await;

        assert_eq!(get(addr, "/").await, r#"Hello, "/""#);
        assert_eq!(get(addr, "/foo/bar").await, r#"Hello, "/foo/bar""#);
        assert_eq!(emitter.len(), 2);
    }

    #[tokio::test]
    #[timeout(5000)]
    async fn decodes_then_escapes_the_path() {
        let addr = spawn(Duration::ZERO, MemoryEmitter::new()).await;

        assert_eq!(get(addr, "/a%20b%3Cx%3E").await, r#"Hello, "/a b&lt;x&gt;""#);
        assert_eq!(
            get(addr, "/%22q%22&%27").await,
            r#"Hello, "/&#34;q&#34;&amp;&#39;""#
        );
    }

    #[tokio::test]
    #[timeout(5000)]
    async fn delays_response() {
        let emitter = MemoryEmitter::new();
        let addr = spawn(Duration::from_millis(50), emitter.clone()).await;

        let start = Instant::now();
        let body = get(addr, "/slow").await;

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(body, r#"Hello, "/slow""#);

        let samples = emitter.samples();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].as_duration() >= Duration::from_millis(50));
    }

    #[test]
    fn counts_served_requests() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let addr = spawn(Duration::ZERO, MemoryEmitter::new()).await;
                get(addr, "/one").await;
                get(addr, "/two").await;
            });
        });

        let requests = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find(|(key, _, _, _)| key.key().name() == "delay_server_requests")
            .map(|(_, _, _, value)| value);

        assert!(matches!(requests, Some(DebugValue::Counter(2))), "{requests:?}");
    }
}
