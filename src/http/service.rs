//! Per-request connection service.
//!
//! Binds the capture handler and the response pipeline together. The
//! connection driver calls [`ConnectionService::handle_one`] once for every
//! request it parses off a connection.

use std::sync::Arc;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{Request, Response};
use axum::BoxError;
use thiserror::Error;

use crate::http::handler::{CaptureHandler, RequestBody};
use crate::http::pipeline::{keeps_alive, PipelineError, ResponsePipeline};

/// Failure while serving one request.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("failed to decorate response: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Handler plus pipeline, shared by every worker.
pub struct ConnectionService {
    handler: CaptureHandler,
    pipeline: ResponsePipeline,
}

impl ConnectionService {
    pub fn new(handler: CaptureHandler, pipeline: ResponsePipeline) -> Self {
        Self { handler, pipeline }
    }

    pub fn shared(handler: CaptureHandler, pipeline: ResponsePipeline) -> Arc<Self> {
        Arc::new(Self::new(handler, pipeline))
    }

    /// Serve one request: run the handler, decorate its response and hand
    /// it back for writing.
    pub async fn handle_one<B>(&self, request: Request<B>) -> Result<Response<Body>, ServiceError>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (head, body) = request.into_parts();
        let body = RequestBody::from_parts(&head, body);

        let mut response = self.handler.handle(&head, body).await?;
        self.pipeline.apply(&mut response, &head)?;

        tracing::debug!(
            method = %head.method,
            uri = %head.uri,
            status = response.status().as_u16(),
            keep_alive = keeps_alive(&response),
            "Request served"
        );

        Ok(response.map(|body| body.map(Body::from).unwrap_or_else(Body::empty)))
    }
}
