use std::time::Duration;

use reconciler_utils::error::ConfigError;
use reconciler_utils::types::ConfigSource;

use super::Config;

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the reconciler where configuration must not
    /// depend on the environment or files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reconciler_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .finalizer_suffix("cleanup")
    ///     .requeue_after(Duration::from_secs(10))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.finalizer_suffix(), "cleanup");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration of the reconciler.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic`. Durations are truncated to whole seconds.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    finalizer_suffix: Option<String>,
    requeue_after: Option<Duration>,
    phase_timeout: Option<Duration>,
    verbose: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder` with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the suffix of derived finalizer tokens.
    ///
    /// Default: `"finalizer"`.
    #[must_use]
    pub fn finalizer_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.finalizer_suffix = Some(suffix.into());
        self
    }

    /// Set the delay requested while the remote object is not ready.
    ///
    /// Default: 30 seconds. Must be between 1 second and 24 hours.
    #[must_use]
    pub fn requeue_after(mut self, delay: Duration) -> Self {
        self.requeue_after = Some(delay);
        self
    }

    /// Set the deadline for a reconciliation pass.
    ///
    /// Default: 60 seconds. Must be between 1 second and 1 hour.
    #[must_use]
    pub fn phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Build the `Config`, validating every value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(suffix) = self.finalizer_suffix {
            config.reconciler.finalizer_suffix = Some(suffix);
            config.attribute("finalizer_suffix", ConfigSource::Programmatic);
        }
        if let Some(delay) = self.requeue_after {
            config.reconciler.requeue_after_secs = Some(delay.as_secs());
            config.attribute("requeue_after_secs", ConfigSource::Programmatic);
        }
        if let Some(timeout) = self.phase_timeout {
            config.reconciler.phase_timeout_secs = Some(timeout.as_secs());
            config.attribute("phase_timeout_secs", ConfigSource::Programmatic);
        }
        if let Some(verbose) = self.verbose {
            config.reconciler.verbose = Some(verbose);
            config.attribute("verbose", ConfigSource::Programmatic);
        }

        config.validate()?;
        Ok(config)
    }
}
