use reconciler_utils::error::ConfigError;

use super::Config;

const MAX_REQUEUE_AFTER_SECS: u64 = 86_400;
const MAX_PHASE_TIMEOUT_SECS: u64 = 3_600;

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(suffix) = &self.reconciler.finalizer_suffix {
            if suffix.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "finalizer_suffix".to_string(),
                    value: "must not be empty".to_string(),
                });
            }
            // The suffix is the path segment after '/' in the finalizer token
            if suffix.contains('/') || suffix.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    key: "finalizer_suffix".to_string(),
                    value: format!("'{suffix}' must not contain '/' or whitespace"),
                });
            }
        }

        if let Some(requeue) = self.reconciler.requeue_after_secs {
            if requeue == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "requeue_after_secs".to_string(),
                    value: "must be greater than 0".to_string(),
                });
            }
            if requeue > MAX_REQUEUE_AFTER_SECS {
                return Err(ConfigError::InvalidValue {
                    key: "requeue_after_secs".to_string(),
                    value: "exceeds maximum limit of 86400 seconds (24 hours)".to_string(),
                });
            }
        }

        if let Some(timeout) = self.reconciler.phase_timeout_secs {
            if timeout == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "phase_timeout_secs".to_string(),
                    value: "must be at least 1 second".to_string(),
                });
            }
            if timeout > MAX_PHASE_TIMEOUT_SECS {
                return Err(ConfigError::InvalidValue {
                    key: "phase_timeout_secs".to_string(),
                    value: "exceeds maximum limit of 3600 seconds (1 hour)".to_string(),
                });
            }
        }

        Ok(())
    }
}
