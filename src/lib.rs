//! FraudWatch live feed
//!
//! Real-time channel for the investigation dashboard.
//!
//! ## Architecture
//!
//! - **livewire**: connection manager library (re-exported from workspace)
//! - **bin_common**: configuration, logging and shutdown for binaries
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use fraudwatch_live::bin_common::{load_config_from_env, ConfigType, LiveFeedConfig};
//! use fraudwatch_live::livewire::ConnectionManager;
//! ```

// Re-export workspace libraries for convenience
pub use livewire;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod config;
    pub mod logging;
    pub mod runner;
    pub mod shutdown;

    pub use cli::{load_config_from_env, ConfigType};
    pub use config::{ConfigError, LiveFeedConfig, TOKEN_ENV_VAR};
    pub use logging::init_tracing;
    pub use runner::{BinaryRunner, RunConfig};
    pub use shutdown::ShutdownManager;
}
