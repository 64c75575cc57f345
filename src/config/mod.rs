//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → env.rs (host-supplied overrides, defaults on garbage)
//!     → validation.rs (semantic checks)
//!     → DispatcherConfig (validated, immutable)
//!
//! On file change (long-running mode):
//!     watcher.rs detects change
//!     → loader.rs resolves new config
//!     → sent over a channel, swapped in atomically
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{DispatchConfig, DispatcherConfig, HealthConfig, ObservabilityConfig};
