use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use reconciler_utils::error::ConfigError;
use reconciler_utils::types::ConfigSource;

use super::Config;

/// Environment variable naming the configuration file to load
pub const CONFIG_ENV_VAR: &str = "RECONCILER_CONFIG";

/// File looked up in the start directory when no path is given
pub const CONFIG_FILE_NAME: &str = "reconciler.toml";

const ENV_FINALIZER_SUFFIX: &str = "RECONCILER_FINALIZER_SUFFIX";
const ENV_REQUEUE_AFTER_SECS: &str = "RECONCILER_REQUEUE_AFTER_SECS";
const ENV_PHASE_TIMEOUT_SECS: &str = "RECONCILER_PHASE_TIMEOUT_SECS";
const ENV_VERBOSE: &str = "RECONCILER_VERBOSE";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    reconciler: Option<super::ReconcilerTable>,
}

impl Config {
    /// Discover and load configuration: env overrides > file > defaults
    ///
    /// Uses the current working directory for file discovery and the process
    /// environment for `RECONCILER_*` lookups.
    pub fn discover(explicit_path: Option<&Path>) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, explicit_path, |name| env::var(name).ok())
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global
    /// state: `lookup_env` stands in for the process environment.
    pub fn discover_from<F>(
        start_dir: &Path,
        explicit_path: Option<&Path>,
        lookup_env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        let config_path = match explicit_path {
            Some(path) => Some(Self::require_file(path.to_path_buf())?),
            None => match lookup_env(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
                Some(path) => Some(Self::require_file(PathBuf::from(path))?),
                None => {
                    let candidate = start_dir.join(CONFIG_FILE_NAME);
                    candidate.is_file().then_some(candidate)
                }
            },
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            if let Some(table) = file_config.reconciler {
                config.apply_file_table(table);
            }
            config.config_path = Some(path.clone());
        }

        config.apply_env_overrides(&lookup_env)?;
        config.validate()?;

        Ok(config)
    }

    fn require_file(path: PathBuf) -> Result<PathBuf> {
        if path.is_file() {
            Ok(path)
        } else {
            Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into())
        }
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    fn apply_file_table(&mut self, table: super::ReconcilerTable) {
        let source = ConfigSource::Config;

        if table.finalizer_suffix.is_some() {
            self.reconciler.finalizer_suffix = table.finalizer_suffix;
            self.attribute("finalizer_suffix", source.clone());
        }
        if table.requeue_after_secs.is_some() {
            self.reconciler.requeue_after_secs = table.requeue_after_secs;
            self.attribute("requeue_after_secs", source.clone());
        }
        if table.phase_timeout_secs.is_some() {
            self.reconciler.phase_timeout_secs = table.phase_timeout_secs;
            self.attribute("phase_timeout_secs", source.clone());
        }
        if table.verbose.is_some() {
            self.reconciler.verbose = table.verbose;
            self.attribute("verbose", source);
        }
    }

    fn apply_env_overrides<F>(&mut self, lookup_env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(suffix) = lookup_env(ENV_FINALIZER_SUFFIX) {
            self.reconciler.finalizer_suffix = Some(suffix);
            self.attribute("finalizer_suffix", ConfigSource::Env);
        }
        if let Some(raw) = lookup_env(ENV_REQUEUE_AFTER_SECS) {
            self.reconciler.requeue_after_secs = Some(parse_env(ENV_REQUEUE_AFTER_SECS, &raw)?);
            self.attribute("requeue_after_secs", ConfigSource::Env);
        }
        if let Some(raw) = lookup_env(ENV_PHASE_TIMEOUT_SECS) {
            self.reconciler.phase_timeout_secs = Some(parse_env(ENV_PHASE_TIMEOUT_SECS, &raw)?);
            self.attribute("phase_timeout_secs", ConfigSource::Env);
        }
        if let Some(raw) = lookup_env(ENV_VERBOSE) {
            self.reconciler.verbose = Some(parse_env(ENV_VERBOSE, &raw)?);
            self.attribute("verbose", ConfigSource::Env);
        }
        Ok(())
    }

    pub(crate) fn attribute(&mut self, key: &str, source: ConfigSource) {
        self.source_attribution.insert(key.to_string(), source);
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: name.to_string(),
        value: format!("cannot parse '{raw}'"),
    })
}
