use anyhow::Result;
use clap::Parser;
use latbench_core::DELAY_SERVER_PORT;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "delay_server=info";

/// Answer every HTTP path with `Hello, "<path>"`, printing one `Duration: <ns>` line per request.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// The amount of time to pause before sending the response, e.g. `10ms`
    #[arg(
        short('d'),
        long("delay"),
        default_value = "0s",
        value_parser = humantime::parse_duration
    )]
    delay: Duration,

    #[arg(long, default_value_t = DELAY_SERVER_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    delay_server::run(cli.port, cli.delay).await?;

    Ok(())
}
