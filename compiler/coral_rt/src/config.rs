//! Process-wide runtime configuration.
//!
//! Compiled programs have no command line of their own for the runtime, so
//! the few tunables are read from the environment once, on first use.
//!
//! - `CORAL_MAX_DEPTH`: maximum tuple nesting walked by repr (default 100000)

use std::sync::OnceLock;

/// Environment variable overriding [`RuntimeConfig::max_depth`].
pub const MAX_DEPTH_VAR: &str = "CORAL_MAX_DEPTH";

const DEFAULT_MAX_DEPTH: usize = 100_000;

static GLOBAL: OnceLock<RuntimeConfig> = OnceLock::new();

/// Runtime tunables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Deepest tuple nesting that repr will walk before failing with
    /// `DepthExceeded`.
    pub max_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RuntimeConfig {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are ignored with a warning and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = RuntimeConfig::default();
        if let Some(raw) = lookup(MAX_DEPTH_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => {
                    tracing::debug!(depth, "max depth overridden from environment");
                    config.max_depth = depth;
                }
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid {MAX_DEPTH_VAR}");
                }
            }
        }
        config
    }

    /// The process-wide configuration, loaded from the environment once.
    pub fn global() -> &'static RuntimeConfig {
        GLOBAL.get_or_init(RuntimeConfig::from_env)
    }
}
