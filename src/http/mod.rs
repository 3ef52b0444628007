//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! hyper connection driver (parsed request)
//!     → service.rs (one request per call)
//!     → handler.rs (trace request line, headers, body)
//!         → elements.rs (decompose header values)
//!         → trace.rs (stdout / log / memory sink)
//!     → pipeline.rs (Date → Server → Content → Connection)
//!     → back to the driver for writing
//! ```

pub mod elements;
pub mod handler;
pub mod pipeline;
pub mod service;
pub mod trace;

pub use handler::{CaptureHandler, RequestBody};
pub use pipeline::{Outgoing, ResponseDecorator, ResponsePipeline};
pub use service::{ConnectionService, ServiceError};
pub use trace::{LogSink, MemorySink, StdoutSink, TraceSink};
