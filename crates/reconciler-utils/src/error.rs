use std::fmt;
use thiserror::Error;

use crate::types::ObjectKey;

/// Stage description attached to every error leaving the phase pipeline.
pub const PHASE_RECONCILIATION_STAGE: &str = "phase reconciliation error";

/// Error returned to the host from a reconciliation pass.
///
/// `ReconcileError` is the error envelope: it carries the identity of the
/// request that failed, a human-readable stage description and the original
/// cause. The cause stays reachable through [`std::error::Error::source`], and
/// the fields are public so callers can assert on them without parsing text.
///
/// # Text Form
///
/// ```text
/// request=<namespace>/<name>, message=<stage> - <cause>
/// ```
///
/// # Example
///
/// ```rust
/// use reconciler_utils::error::{PhaseError, wrap};
/// use reconciler_utils::types::ObjectKey;
///
/// let key = ObjectKey::new("default", "pool-a");
/// let ok: Result<u32, PhaseError> = Ok(7);
/// assert_eq!(wrap(&key, "resolving desired state", ok).unwrap(), 7);
///
/// let failed: Result<(), PhaseError> = Err(PhaseError::Contract("no kind".into()));
/// let err = wrap(&key, "resolving desired state", failed).unwrap_err();
/// assert_eq!(err.key, key);
/// assert!(err.to_string().starts_with("request=default/pool-a, message=resolving desired state"));
/// ```
///
/// Every reconciliation error is retryable: reconciliation is idempotent and the
/// host's backoff policy decides when the next attempt happens.
#[derive(Error, Debug)]
#[error("request={key}, message={stage} - {source}")]
pub struct ReconcileError {
    pub key: ObjectKey,
    pub stage: String,
    #[source]
    pub source: PhaseError,
}

impl ReconcileError {
    #[must_use]
    pub fn new(key: ObjectKey, stage: impl Into<String>, source: PhaseError) -> Self {
        Self {
            key,
            stage: stage.into(),
            source,
        }
    }

    /// Whether the host should schedule another attempt.
    ///
    /// Always `true`: there is no fatal path, every failure is retried through
    /// re-invocation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        true
    }
}

/// Wrap a phase outcome with request identity and stage context.
///
/// `Ok` values pass through untouched, so every phase result can be wrapped
/// unconditionally. `Err` values become a [`ReconcileError`] that embeds the
/// original cause.
pub fn wrap<T, E>(
    key: &ObjectKey,
    stage: impl Into<String>,
    result: Result<T, E>,
) -> Result<T, ReconcileError>
where
    E: Into<PhaseError>,
{
    result.map_err(|err| ReconcileError::new(key.clone(), stage, err.into()))
}

/// Failure of a single phase.
#[derive(Error, Debug)]
pub enum PhaseError {
    #[error("remote system error: {0}")]
    Remote(#[from] RemoteError),

    #[error("control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    #[error("phase {phase} cancelled")]
    Cancelled { phase: String },

    /// The pass deadline expired; `phase` is the phase that was in flight.
    #[error("reconcile pass deadline of {timeout_ms}ms expired during phase {phase}")]
    DeadlineExceeded { phase: String, timeout_ms: u64 },

    #[error("contract violation: {0}")]
    Contract(String),
}

impl PhaseError {
    /// Convenience constructor for contract violations.
    #[must_use]
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }
}

/// Errors reported by the remote system of record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote object {id} not found")]
    NotFound { id: String },

    #[error("conflicting change to remote object {id}: {reason}")]
    Conflict { id: String, reason: String },

    #[error("rate limited by remote system")]
    RateLimited,

    #[error("remote system unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Errors reported by the control-plane API that stores the managed objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlPlaneError {
    #[error("object {key} not found")]
    NotFound { key: ObjectKey },

    #[error("write conflict on {key}: {reason}")]
    Conflict { key: ObjectKey, reason: String },

    #[error("control plane unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    RemoteSystem,
    ControlPlane,
    Contract,
    Cancellation,
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteSystem => write!(f, "Remote System"),
            Self::ControlPlane => write!(f, "Control Plane"),
            Self::Contract => write!(f, "Contract"),
            Self::Cancellation => write!(f, "Cancellation"),
            Self::Configuration => write!(f, "Configuration"),
        }
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

impl UserFriendlyError for PhaseError {
    fn user_message(&self) -> String {
        match self {
            Self::Remote(err) => format!("The remote system rejected the request: {err}"),
            Self::ControlPlane(err) => format!("The control plane rejected the request: {err}"),
            Self::Cancelled { phase } => format!("Phase '{phase}' was cancelled"),
            Self::DeadlineExceeded { phase, timeout_ms } => {
                format!("The reconcile pass ran past its {timeout_ms}ms deadline in phase '{phase}'")
            }
            Self::Contract(message) => format!("Reconciliation contract violated: {message}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Remote(RemoteError::RateLimited) => {
                Some("The remote system is throttling requests.".to_string())
            }
            Self::Remote(_) => Some(
                "Remote failures are transient; the object is reconciled again on retry."
                    .to_string(),
            ),
            Self::ControlPlane(ControlPlaneError::Conflict { .. }) => Some(
                "Another writer updated the object between read and write.".to_string(),
            ),
            Self::ControlPlane(_) => None,
            Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => Some(
                "The request context was cancelled or its deadline expired mid-phase.".to_string(),
            ),
            Self::Contract(_) => Some(
                "The object or a collaborator returned data the engine cannot act on.".to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Remote(_) => vec![
                "Check connectivity and credentials for the remote system".to_string(),
                "Inspect the object's Ready condition for the latest failure".to_string(),
            ],
            Self::ControlPlane(_) => vec![
                "Verify the reconciler can read and update the managed objects".to_string(),
            ],
            Self::Cancelled { .. } => vec![],
            Self::DeadlineExceeded { .. } => vec![
                "Increase phase_timeout_secs, which bounds a whole reconcile pass".to_string(),
            ],
            Self::Contract(_) => vec![
                "Ensure the object's kind and group are populated".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Remote(_) => ErrorCategory::RemoteSystem,
            Self::ControlPlane(_) => ErrorCategory::ControlPlane,
            Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => ErrorCategory::Cancellation,
            Self::Contract(_) => ErrorCategory::Contract,
        }
    }
}

impl UserFriendlyError for ReconcileError {
    fn user_message(&self) -> String {
        format!("Reconciling {} failed: {}", self.key, self.source.user_message())
    }

    fn context(&self) -> Option<String> {
        self.source.context()
    }

    fn suggestions(&self) -> Vec<String> {
        self.source.suggestions()
    }

    fn category(&self) -> ErrorCategory {
        self.source.category()
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with a [reconciler] table.".to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { .. } => Some(
                "An explicitly requested configuration file must exist.".to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![format!(
                "Adjust '{key}' in the [reconciler] table or its RECONCILER_* override"
            )],
            Self::NotFound { .. } => vec![
                "Check the path passed explicitly or through RECONCILER_CONFIG".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}
