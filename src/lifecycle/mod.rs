//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config file + port argument → Compose service → Bind acceptor → Accept loop task
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Release listening socket → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then service, then listener
//! - In-flight workers are not drained or cancelled on shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{configure, configure_from_env, startup, startup_with_sink, StartupError};
