//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────────┐
//! │  1. CLI overrides (ConfigResolver)          │  Per invocation
//! ├─────────────────────────────────────────────┤
//! │  2. Environment Variables (SHELLBUS_*)      │  Runtime override
//! ├─────────────────────────────────────────────┤
//! │  3. Project Config (.shellbus/config.toml)  │  Project-specific
//! ├─────────────────────────────────────────────┤
//! │  4. Global Config (~/.shellbus/config.toml) │  User defaults
//! ├─────────────────────────────────────────────┤
//! │  5. Default Values (compile-time)           │  Fallback
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `SHELLBUS_DEBUG` | `debug` | bool |
//! | `SHELLBUS_CATCH_PANICS` | `bus.catch_panics` | bool |
//! | `SHELLBUS_REQUEST_TIMEOUT_MS` | `bus.request_timeout_ms` | u64 |
//! | `SHELLBUS_LOG_LEVEL` | `logging.level` | String |
//! | `SHELLBUS_LOG_FILE` | `logging.file_path` | PathBuf |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.shellbus/config.toml
//! debug = false
//!
//! [bus]
//! request_timeout_ms = 5000
//! catch_panics = true
//! surface_reply_errors = true
//! enforce_prefix = false
//!
//! [surfaces]
//! initial = 2
//!
//! [logging]
//! level = "warn"
//! file_path = "/tmp/shellbus.log"
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{BusConfig, LoggingConfig, ShellbusConfig, SurfacesConfig};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".shellbus")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".shellbus";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
