//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
///
/// # Example
///
/// ```
/// use shellbus_runtime::config::ShellbusConfig;
///
/// let config = ShellbusConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.bus.request_timeout_ms, 5_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellbusConfig {
    /// Enable debug mode (debug-level logging).
    pub debug: bool,

    /// Dispatcher and bridge behaviour.
    pub bus: BusConfig,

    /// Simulated surface settings for the demo host.
    pub surfaces: SurfacesConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

impl ShellbusConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default. This enables layered configuration.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }

        self.bus.merge(&other.bus);
        self.surfaces.merge(&other.surfaces);
        self.logging.merge(&other.logging);
    }
}

/// Bus behaviour shared by the host dispatcher and the client bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BusConfig {
    /// How long a blocking dispatch waits for the host, in milliseconds.
    pub request_timeout_ms: u64,

    /// Convert listener panics into error envelopes instead of unwinding
    /// through the dispatch loop.
    pub catch_panics: bool,

    /// When an async subscription fails, dispatch the error envelope on the
    /// reply channel so the originator hears about it.
    pub surface_reply_errors: bool,

    /// Reject registrations on channels without the `ipc-` prefix.
    pub enforce_prefix: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
            catch_panics: true,
            surface_reply_errors: true,
            enforce_prefix: false,
        }
    }
}

impl BusConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.request_timeout_ms != default.request_timeout_ms {
            self.request_timeout_ms = other.request_timeout_ms;
        }
        if other.catch_panics != default.catch_panics {
            self.catch_panics = other.catch_panics;
        }
        if other.surface_reply_errors != default.surface_reply_errors {
            self.surface_reply_errors = other.surface_reply_errors;
        }
        if other.enforce_prefix != default.enforce_prefix {
            self.enforce_prefix = other.enforce_prefix;
        }
    }
}

/// Surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfacesConfig {
    /// Number of surfaces opened at startup.
    pub initial: usize,
}

impl Default for SurfacesConfig {
    fn default() -> Self {
        Self { initial: 2 }
    }
}

impl SurfacesConfig {
    fn merge(&mut self, other: &Self) {
        if other.initial != Self::default().initial {
            self.initial = other.initial;
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when neither flags nor `RUST_LOG`
    /// choose one.
    pub level: String,

    /// Optional log file (written without ANSI colors).
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            file_path: None,
        }
    }
}

impl LoggingConfig {
    fn merge(&mut self, other: &Self) {
        if other.level != Self::default().level {
            self.level = other.level.clone();
        }
        if other.file_path.is_some() {
            self.file_path = other.file_path.clone();
        }
    }
}
