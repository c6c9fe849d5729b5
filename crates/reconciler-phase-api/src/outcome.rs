use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What the host should do after a reconciliation pass.
///
/// ```rust
/// use reconciler_phase_api::ReconcileResult;
/// use std::time::Duration;
///
/// assert!(ReconcileResult::requeue_now().is_requeue());
/// assert_eq!(
///     ReconcileResult::requeue_after_secs(30),
///     ReconcileResult::requeue_after(Duration::from_secs(30)),
/// );
/// assert!(!ReconcileResult::no_requeue().is_requeue());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReconcileResult {
    /// Re-invoke immediately.
    RequeueNow,
    /// Re-invoke no sooner than the given delay.
    RequeueAfter(Duration),
    /// Do not re-invoke until the next external trigger.
    #[default]
    NoRequeue,
}

impl ReconcileResult {
    #[must_use]
    pub const fn requeue_now() -> Self {
        Self::RequeueNow
    }

    #[must_use]
    pub const fn requeue_after(delay: Duration) -> Self {
        Self::RequeueAfter(delay)
    }

    #[must_use]
    pub const fn requeue_after_secs(seconds: u64) -> Self {
        Self::RequeueAfter(Duration::from_secs(seconds))
    }

    #[must_use]
    pub const fn no_requeue() -> Self {
        Self::NoRequeue
    }

    /// Whether the result asks for another pass, immediate or delayed.
    #[must_use]
    pub const fn is_requeue(&self) -> bool {
        !matches!(self, Self::NoRequeue)
    }

    /// The requested delay, if any.
    #[must_use]
    pub const fn requeue_delay(&self) -> Option<Duration> {
        match self {
            Self::RequeueAfter(delay) => Some(*delay),
            Self::RequeueNow | Self::NoRequeue => None,
        }
    }

    /// Encode for the host.
    ///
    /// Sub-second delays round up so the host never re-invokes sooner than
    /// requested.
    #[must_use]
    pub fn encode(&self) -> ResultEncoding {
        match self {
            Self::RequeueNow => ResultEncoding {
                requeue: true,
                requeue_after_seconds: 0,
            },
            Self::RequeueAfter(delay) => {
                let whole = delay.as_secs();
                let seconds = if delay.subsec_nanos() > 0 {
                    whole.saturating_add(1)
                } else {
                    whole
                };
                ResultEncoding {
                    requeue: true,
                    requeue_after_seconds: seconds,
                }
            }
            Self::NoRequeue => ResultEncoding::default(),
        }
    }
}

impl fmt::Display for ReconcileResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequeueNow => write!(f, "requeue"),
            Self::RequeueAfter(delay) => write!(f, "requeue after {}ms", delay.as_millis()),
            Self::NoRequeue => write!(f, "no requeue"),
        }
    }
}

/// Wire form of a [`ReconcileResult`] consumed by hosts.
///
/// `requeue = false` is terminal until the next external trigger. A requeue
/// with zero seconds is immediate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEncoding {
    pub requeue: bool,
    pub requeue_after_seconds: u64,
}

impl From<ResultEncoding> for ReconcileResult {
    fn from(encoding: ResultEncoding) -> Self {
        match (encoding.requeue, encoding.requeue_after_seconds) {
            (false, _) => Self::NoRequeue,
            (true, 0) => Self::RequeueNow,
            (true, seconds) => Self::requeue_after_secs(seconds),
        }
    }
}
