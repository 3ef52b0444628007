//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events on stderr)
//!
//! Request traces are separate and go through http::trace sinks.
//! ```

pub mod logging;
