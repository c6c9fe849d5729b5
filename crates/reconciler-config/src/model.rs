use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use reconciler_utils::types::ConfigSource;

/// Suffix appended to `<kind>.<group>/` when deriving finalizer tokens
pub const DEFAULT_FINALIZER_SUFFIX: &str = "finalizer";

/// Delay before re-checking an object that is not ready yet
pub const DEFAULT_REQUEUE_AFTER_SECS: u64 = 30;

/// Deadline for one reconciliation pass
pub const DEFAULT_PHASE_TIMEOUT_SECS: u64 = 60;

/// The `[reconciler]` table of the configuration file.
///
/// Every field is optional so that file values can be layered over defaults
/// with per-key source attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconcilerTable {
    pub finalizer_suffix: Option<String>,
    pub requeue_after_secs: Option<u64>,
    pub phase_timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
}

impl ReconcilerTable {
    fn defaults() -> Self {
        Self {
            finalizer_suffix: Some(DEFAULT_FINALIZER_SUFFIX.to_string()),
            requeue_after_secs: Some(DEFAULT_REQUEUE_AFTER_SECS),
            phase_timeout_secs: Some(DEFAULT_PHASE_TIMEOUT_SECS),
            verbose: Some(false),
        }
    }
}

/// Configuration for reconciler operations.
///
/// # Discovery
///
/// Use [`Config::discover()`] to load, in order of increasing precedence:
/// built-in defaults, the configuration file (explicit path, the file named by
/// `RECONCILER_CONFIG`, or `reconciler.toml` in the working directory), and
/// `RECONCILER_*` environment overrides.
///
/// # Configuration File Format
///
/// ```toml
/// [reconciler]
/// finalizer_suffix = "finalizer"
/// requeue_after_secs = 30
/// phase_timeout_secs = 60
/// verbose = false
/// ```
///
/// # Example
///
/// ```rust
/// use reconciler_config::Config;
/// use std::time::Duration;
///
/// let config = Config::default();
/// assert_eq!(config.finalizer_suffix(), "finalizer");
/// assert_eq!(config.requeue_after(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub reconciler: ReconcilerTable,
    /// Path of the configuration file that was loaded, if any.
    pub config_path: Option<PathBuf>,
    /// Source attribution for each setting (for status display).
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Default for Config {
    fn default() -> Self {
        let source_attribution = Self::KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        Self {
            reconciler: ReconcilerTable::defaults(),
            config_path: None,
            source_attribution,
        }
    }
}

impl Config {
    /// Keys of the `[reconciler]` table, in display order.
    pub const KEYS: [&'static str; 4] = [
        "finalizer_suffix",
        "requeue_after_secs",
        "phase_timeout_secs",
        "verbose",
    ];

    #[must_use]
    pub fn finalizer_suffix(&self) -> &str {
        self.reconciler
            .finalizer_suffix
            .as_deref()
            .unwrap_or(DEFAULT_FINALIZER_SUFFIX)
    }

    #[must_use]
    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(
            self.reconciler
                .requeue_after_secs
                .unwrap_or(DEFAULT_REQUEUE_AFTER_SECS),
        )
    }

    #[must_use]
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(
            self.reconciler
                .phase_timeout_secs
                .unwrap_or(DEFAULT_PHASE_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.reconciler.verbose.unwrap_or(false)
    }

    /// The plain values the engine is constructed with.
    #[must_use]
    pub fn settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            finalizer_suffix: self.finalizer_suffix().to_string(),
            requeue_after: self.requeue_after(),
            phase_timeout: self.phase_timeout(),
        }
    }
}

/// Engine settings passed explicitly into the reconciler.
///
/// There is no process-wide configuration: two reconcilers in the same process
/// may run with different settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Suffix of derived finalizer tokens.
    pub finalizer_suffix: String,
    /// Delay requested while the remote object is not ready.
    pub requeue_after: Duration,
    /// Deadline for a whole pass when the caller's context has none. Not
    /// applied per phase.
    pub phase_timeout: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Config::default().settings()
    }
}
