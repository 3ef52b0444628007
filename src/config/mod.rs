//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional, named by HTTPCAP_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command-line port override
//!     → CapConfig (validated, immutable)
//!     → handed to startup, never mutated afterwards
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the acceptor starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_port_arg, load_config, load_from_env, ConfigError};
pub use schema::{CapConfig, ListenerConfig, TlsConfig, TraceOutput, TransportKind};
