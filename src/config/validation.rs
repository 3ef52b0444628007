//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the listener address and TLS paths
//! - Make sure the server identity is a legal header value
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CapConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::CapConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host `{0}` is not an IP address")]
    InvalidHost(String),

    #[error("server.identity must not be empty")]
    EmptyIdentity,

    #[error("server.identity `{0}` is not a valid header value")]
    InvalidIdentity(String),

    #[error("listener.tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &CapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidHost(config.listener.host.clone()));
    }

    let identity = &config.server.identity;
    if identity.trim().is_empty() {
        errors.push(ValidationError::EmptyIdentity);
    } else if HeaderValue::from_str(identity).is_err() {
        errors.push(ValidationError::InvalidIdentity(identity.clone()));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
