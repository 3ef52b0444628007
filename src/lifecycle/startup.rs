//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the effective configuration from file and command line
//! - Compose handler, trace sink and response pipeline once
//! - Bind the acceptor and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener starts last, after everything it serves is built

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{apply_port_arg, load_config, load_from_env, CapConfig, ConfigError};
use crate::http::pipeline::PipelineError;
use crate::http::trace::{sink_for, TraceSink};
use crate::http::{CaptureHandler, ConnectionService, ResponsePipeline};
use crate::net::listener::{Acceptor, ListenerError, RunningAcceptor};

/// The server could not start serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid response pipeline: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Resolve the effective configuration.
///
/// Without a path the defaults are used. The port argument overrides the
/// configured port when it is a valid port number.
pub fn configure(path: Option<&Path>, port_arg: Option<&str>) -> Result<CapConfig, StartupError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => CapConfig::default(),
    };
    apply_port_arg(&mut config, port_arg);
    Ok(config)
}

/// [`configure`] with the file named by the `HTTPCAP_CONFIG` variable.
pub fn configure_from_env(port_arg: Option<&str>) -> Result<CapConfig, StartupError> {
    let mut config = load_from_env()?;
    apply_port_arg(&mut config, port_arg);
    Ok(config)
}

/// Build the shared connection service for a configuration.
pub fn build_service(config: &CapConfig, sink: Arc<dyn TraceSink>) -> Result<Arc<ConnectionService>, StartupError> {
    let pipeline = ResponsePipeline::standard(&config.server.identity)?;
    tracing::debug!(decorators = ?pipeline.names(), "Response pipeline composed");
    Ok(ConnectionService::shared(CaptureHandler::new(sink), pipeline))
}

/// Start serving with the sink selected by configuration.
pub async fn startup(config: &CapConfig) -> Result<RunningAcceptor, StartupError> {
    startup_with_sink(config, sink_for(config.trace.output)).await
}

/// Start serving, sending request traces to `sink`.
pub async fn startup_with_sink(config: &CapConfig, sink: Arc<dyn TraceSink>) -> Result<RunningAcceptor, StartupError> {
    let service = build_service(config, sink)?;
    let running = Acceptor::start(&config.listener, service).await?;

    tracing::info!(
        address = %running.local_addr(),
        transport = ?running.transport(),
        "HttpCap started"
    );

    Ok(running)
}
