//! HttpCap diagnostic server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──TCP/TLS──▶ net::listener (accept loop)
//!                              │ one task per connection
//!                              ▼
//!                         net::connection (worker)
//!                              │ one call per request
//!                              ▼
//!                         http::service ──▶ http::handler ──▶ trace sink
//!                              │
//!                              ▼
//!     Client ◀────────── http::pipeline (Date, Server, Content, Connection)
//! ```

use clap::Parser;

use httpcap::lifecycle::configure_from_env;
use httpcap::lifecycle::signals::shutdown_signal;
use httpcap::observability::logging;

/// Diagnostic HTTP/1.1 server that traces every request it receives.
#[derive(Parser)]
#[command(name = "httpcap", version, long_about = None)]
struct Cli {
    /// Port to listen on. Falls back to the default when missing or not a valid port.
    port: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = configure_from_env(cli.port.as_deref())?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        port = config.listener.port,
        transport = ?config.listener.transport(),
        trace_output = ?config.trace.output,
        "Configuration loaded"
    );

    let mut running = httpcap::startup(&config).await?;

    let stopped_by_signal = tokio::select! {
        _ = shutdown_signal() => true,
        result = running.wait() => {
            result?;
            false
        }
    };

    if stopped_by_signal {
        running.stop().await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
