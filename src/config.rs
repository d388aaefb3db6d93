//! Runtime configuration for jitted functions.

use std::env;

/// Default capacity of a [`ResolveCache`](crate::argnums::ResolveCache).
pub const DEFAULT_RESOLVE_CACHE_CAPACITY: usize = 4096;

/// Configuration flags consulted by [`JitFunction`](crate::trace::JitFunction).
///
/// # Examples
///
/// ```
/// use jax_argspec::Config;
///
/// let config = Config::default().with_debug_nans(true);
/// assert!(config.debug_nans);
/// assert!(!config.debug_infs);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Check jitted outputs for NaN values.
    pub debug_nans: bool,
    /// Check jitted outputs for infinite values.
    pub debug_infs: bool,
    /// Reject aliased mutable array references among arguments.
    pub mutable_array_checks: bool,
    /// Maximum number of memoized argnum resolutions.
    pub resolve_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_nans: false,
            debug_infs: false,
            mutable_array_checks: false,
            resolve_cache_capacity: DEFAULT_RESOLVE_CACHE_CAPACITY,
        }
    }
}

impl Config {
    /// Build a config from `JAX_DEBUG_NANS`, `JAX_DEBUG_INFS`,
    /// `JAX_MUTABLE_ARRAY_CHECKS` and `JAX_RESOLVE_CACHE_SIZE`.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key).and_then(|v| parse_flag(&v)).unwrap_or(default)
        };
        Self {
            debug_nans: flag("JAX_DEBUG_NANS", defaults.debug_nans),
            debug_infs: flag("JAX_DEBUG_INFS", defaults.debug_infs),
            mutable_array_checks: flag(
                "JAX_MUTABLE_ARRAY_CHECKS",
                defaults.mutable_array_checks,
            ),
            resolve_cache_capacity: lookup("JAX_RESOLVE_CACHE_SIZE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.resolve_cache_capacity),
        }
    }

    /// Set `debug_nans`.
    pub fn with_debug_nans(mut self, enabled: bool) -> Self {
        self.debug_nans = enabled;
        self
    }

    /// Set `debug_infs`.
    pub fn with_debug_infs(mut self, enabled: bool) -> Self {
        self.debug_infs = enabled;
        self
    }

    /// Set `mutable_array_checks`.
    pub fn with_mutable_array_checks(mut self, enabled: bool) -> Self {
        self.mutable_array_checks = enabled;
        self
    }

    /// Set the resolution cache capacity.
    pub fn with_resolve_cache_capacity(mut self, capacity: usize) -> Self {
        self.resolve_cache_capacity = capacity;
        self
    }

    /// Returns true if any invalid-value check is enabled.
    pub fn checks_invalid_values(&self) -> bool {
        self.debug_nans || self.debug_infs
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
