//! Catch-all request handler that traces request structure.
//!
//! # Responsibilities
//! - Trace the request line and every header with its decomposed elements
//! - Drain and trace any request body
//! - Answer every request with 200 OK and no body
//!
//! # Design Decisions
//! - Method and target are never inspected; one handler serves every path
//! - The body is never echoed back

use std::sync::Arc;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::request::Parts;
use axum::http::{header, Response, StatusCode};
use axum::BoxError;

use crate::http::elements::{parse_elements, render_elements};
use crate::http::pipeline::Outgoing;
use crate::http::service::ServiceError;
use crate::http::trace::TraceSink;

/// Body capability of a parsed request.
pub enum RequestBody {
    /// No framing headers; there is nothing to read.
    Bodiless,
    /// `Content-Length` or `Transfer-Encoding` announced a body.
    Enclosing(Body),
}

impl RequestBody {
    /// Classify a request body by the framing headers of its head.
    pub fn from_parts<B>(head: &Parts, body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let framed = head.headers.contains_key(header::CONTENT_LENGTH)
            || head.headers.contains_key(header::TRANSFER_ENCODING);
        if framed {
            RequestBody::Enclosing(Body::new(body))
        } else {
            RequestBody::Bodiless
        }
    }
}

/// Traces each request to a sink and answers OK.
#[derive(Clone)]
pub struct CaptureHandler {
    sink: Arc<dyn TraceSink>,
}

impl CaptureHandler {
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink }
    }

    /// Trace one request and build its response.
    ///
    /// If the body cannot be read the lines traced so far are still recorded.
    pub async fn handle(&self, head: &Parts, body: RequestBody) -> Result<Outgoing, ServiceError> {
        let mut lines = trace_head(head);

        if let RequestBody::Enclosing(body) = body {
            match axum::body::to_bytes(body, usize::MAX).await {
                Ok(bytes) => lines.push(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    self.sink.record(&lines);
                    return Err(ServiceError::Body(e));
                }
            }
        }

        self.sink.record(&lines);

        let mut response = Response::new(None);
        *response.status_mut() = StatusCode::OK;
        Ok(response)
    }
}

/// Request line followed by one line per header.
fn trace_head(head: &Parts) -> Vec<String> {
    let mut lines = Vec::with_capacity(head.headers.len() + 2);
    lines.push(format!("{} {} {:?}", head.method, head.uri, head.version));

    for (name, value) in head.headers.iter() {
        let raw = String::from_utf8_lossy(value.as_bytes());
        lines.push(format!(
            "  {}=[{}]",
            name,
            render_elements(&parse_elements(&raw))
        ));
    }

    lines
}
