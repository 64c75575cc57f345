//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Init observability → Build registry/prober/engine
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl+C → broadcast stop → janitor and monitor loops exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::Components;
