//! # ShardGate REST Gateway
//!
//! The outer HTTP layer of the ShardGate observer proxy: an axum router
//! whose endpoint groups translate HTTP parameters into processor calls
//! and wrap every answer in the uniform API envelope.
//!
//! ## Module Structure
//!
//! ```text
//! shardgate-api/
//! ├── config.rs        # TOML configuration + validation
//! ├── errors.rs        # ProcessError → HTTP status mapping
//! ├── groups/          # network, transaction, vm-values endpoint groups
//! ├── router.rs        # route table
//! ├── service.rs       # processor wiring and the serve loop
//! └── main.rs          # binary entry point
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod groups;
pub mod router;
pub mod service;

pub use config::{ConfigError, ProxyConfig};
pub use errors::{error_response, ApiError};
pub use router::build_router;
pub use service::{serve, AppState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
