//! Response decorators applied to every outgoing response.
//!
//! # Responsibilities
//! - Stamp `Date` and `Server`
//! - Frame the body with `Content-Length`
//! - Decide whether the connection persists after this response
//!
//! # Design Decisions
//! - Composed once at startup, shared read-only by every worker
//! - Applied in registration order, after the handler set the status
//! - Decorators never touch the status code

use std::time::SystemTime;

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Response, StatusCode, Version};
use thiserror::Error;

/// A response as built by the handler, before serialization.
pub type Outgoing = Response<Option<Bytes>>;

/// Error raised when a response cannot be decorated.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0} header already present")]
    FramingPresent(&'static str),

    #[error("invalid value for {header}: {value:?}")]
    InvalidValue { header: &'static str, value: String },
}

/// A transformation applied to every outgoing response.
pub trait ResponseDecorator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn decorate(&self, response: &mut Outgoing, request: &Parts) -> Result<(), PipelineError>;
}

/// Ordered, immutable list of decorators.
pub struct ResponsePipeline {
    decorators: Vec<Box<dyn ResponseDecorator>>,
}

impl ResponsePipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder {
            decorators: Vec::new(),
        }
    }

    /// Date, Server, Content and Connection-control, in that order.
    pub fn standard(identity: &str) -> Result<Self, PipelineError> {
        Ok(Self::builder()
            .add(ResponseDate)
            .add(ResponseServer::new(identity)?)
            .add(ResponseContent)
            .add(ResponseConnControl)
            .build())
    }

    /// Run every decorator in registration order.
    pub fn apply(&self, response: &mut Outgoing, request: &Parts) -> Result<(), PipelineError> {
        for decorator in &self.decorators {
            decorator.decorate(response, request)?;
        }
        Ok(())
    }

    /// Registered decorator names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }
}

pub struct PipelineBuilder {
    decorators: Vec<Box<dyn ResponseDecorator>>,
}

impl PipelineBuilder {
    pub fn add<D: ResponseDecorator + 'static>(mut self, decorator: D) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn build(self) -> ResponsePipeline {
        ResponsePipeline {
            decorators: self.decorators,
        }
    }
}

/// Sets `Date` on final responses that lack one.
pub struct ResponseDate;

impl ResponseDecorator for ResponseDate {
    fn name(&self) -> &'static str {
        "date"
    }

    fn decorate(&self, response: &mut Outgoing, _request: &Parts) -> Result<(), PipelineError> {
        if response.status().as_u16() >= 200 && !response.headers().contains_key(header::DATE) {
            let now = httpdate::fmt_http_date(SystemTime::now());
            let value = HeaderValue::from_str(&now).map_err(|_| PipelineError::InvalidValue {
                header: "Date",
                value: now.clone(),
            })?;
            response.headers_mut().insert(header::DATE, value);
        }
        Ok(())
    }
}

/// Sets `Server` to a fixed identity unless the handler chose one.
pub struct ResponseServer {
    identity: HeaderValue,
}

impl ResponseServer {
    pub fn new(identity: &str) -> Result<Self, PipelineError> {
        let identity = HeaderValue::from_str(identity).map_err(|_| PipelineError::InvalidValue {
            header: "Server",
            value: identity.to_string(),
        })?;
        Ok(Self { identity })
    }
}

impl ResponseDecorator for ResponseServer {
    fn name(&self) -> &'static str {
        "server"
    }

    fn decorate(&self, response: &mut Outgoing, _request: &Parts) -> Result<(), PipelineError> {
        if !response.headers().contains_key(header::SERVER) {
            response
                .headers_mut()
                .insert(header::SERVER, self.identity.clone());
        }
        Ok(())
    }
}

/// Frames the body with `Content-Length`.
pub struct ResponseContent;

impl ResponseDecorator for ResponseContent {
    fn name(&self) -> &'static str {
        "content"
    }

    fn decorate(&self, response: &mut Outgoing, _request: &Parts) -> Result<(), PipelineError> {
        if response.headers().contains_key(header::TRANSFER_ENCODING) {
            return Err(PipelineError::FramingPresent("Transfer-Encoding"));
        }
        if response.headers().contains_key(header::CONTENT_LENGTH) {
            return Err(PipelineError::FramingPresent("Content-Length"));
        }

        let length = match response.body() {
            Some(body) => body.len(),
            None => {
                let status = response.status();
                if status == StatusCode::NO_CONTENT
                    || status == StatusCode::RESET_CONTENT
                    || status == StatusCode::NOT_MODIFIED
                {
                    return Ok(());
                }
                0
            }
        };

        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        Ok(())
    }
}

/// Writes `Connection: keep-alive` or `Connection: close`.
pub struct ResponseConnControl;

/// Statuses after which the connection is always closed.
const CLOSING_STATUSES: [StatusCode; 7] = [
    StatusCode::BAD_REQUEST,
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::LENGTH_REQUIRED,
    StatusCode::PAYLOAD_TOO_LARGE,
    StatusCode::URI_TOO_LONG,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::NOT_IMPLEMENTED,
];

impl ResponseConnControl {
    fn keep_alive(response: &Outgoing, request: &Parts) -> bool {
        if CLOSING_STATUSES.contains(&response.status()) {
            return false;
        }
        if has_close(response.headers().get_all(header::CONNECTION).iter()) {
            return false;
        }

        let directives = request.headers.get_all(header::CONNECTION);
        if has_close(directives.iter()) {
            return false;
        }
        if has_token(directives.iter(), "keep-alive") {
            return true;
        }
        request.version >= Version::HTTP_11
    }
}

impl ResponseDecorator for ResponseConnControl {
    fn name(&self) -> &'static str {
        "connection"
    }

    fn decorate(&self, response: &mut Outgoing, request: &Parts) -> Result<(), PipelineError> {
        let value = if Self::keep_alive(response, request) {
            "keep-alive"
        } else {
            "close"
        };
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static(value));
        Ok(())
    }
}

/// Whether a decorated response leaves the connection open.
pub fn keeps_alive(response: &Outgoing) -> bool {
    !has_close(response.headers().get_all(header::CONNECTION).iter())
}

fn has_close<'a>(values: impl Iterator<Item = &'a HeaderValue>) -> bool {
    has_token(values, "close")
}

fn has_token<'a>(mut values: impl Iterator<Item = &'a HeaderValue>, token: &str) -> bool {
    values.any(|value| {
        value
            .to_str()
            .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    })
}
