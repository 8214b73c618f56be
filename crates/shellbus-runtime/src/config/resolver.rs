//! Configuration resolver trait for layered overrides.
//!
//! ```text
//! ConfigLoader.load()  →  ShellbusConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()
//!                              │
//!                              ▼
//!                     ShellbusConfig (final)
//! ```

use super::ShellbusConfig;

/// Trait for applying configuration overrides.
///
/// Separates config loading (file/env) from runtime overrides such as
/// CLI flags.
pub trait ConfigResolver {
    /// Applies overrides to the given configuration.
    ///
    /// Only values the caller actually set should be applied, preserving
    /// existing values for unspecified options.
    fn apply(&self, config: &mut ShellbusConfig);
}

/// No-op resolver that makes no changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut ShellbusConfig) {}
}
