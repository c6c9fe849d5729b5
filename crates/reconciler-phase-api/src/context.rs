use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use reconciler_utils::error::PhaseError;

/// Cancellation and deadline scope of one reconciliation pass.
///
/// Every collaborator call a phase makes goes through [`RequestContext::guard`],
/// so a cancelled token or an expired deadline aborts the in-flight call and
/// surfaces as a phase error.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<(Instant, Duration)>,
}

impl RequestContext {
    /// A context with a fresh token and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context tied to a host-owned cancellation token.
    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Bound the pass to `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some((Instant::now() + timeout, timeout));
        self
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|(at, _)| at)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run a collaborator call within this context.
    ///
    /// The call is dropped as soon as the token is cancelled or the deadline
    /// passes. `phase` names the phase in the resulting error.
    pub async fn guard<T, E, F>(&self, phase: &str, call: F) -> Result<T, PhaseError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<PhaseError>,
    {
        if self.cancel.is_cancelled() {
            return Err(PhaseError::Cancelled {
                phase: phase.to_string(),
            });
        }
        // timeout_at polls the call once before checking the timer.
        if let Some((_, timeout)) = self.deadline.filter(|(at, _)| Instant::now() >= *at) {
            return Err(deadline_exceeded(phase, timeout));
        }

        let bounded = async {
            match self.deadline {
                Some((at, timeout)) => tokio::time::timeout_at(at, call)
                    .await
                    .map_err(|_| deadline_exceeded(phase, timeout)),
                None => Ok(call.await),
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(PhaseError::Cancelled {
                phase: phase.to_string(),
            }),
            outcome = bounded => outcome?.map_err(Into::into),
        }
    }
}

fn deadline_exceeded(phase: &str, timeout: Duration) -> PhaseError {
    PhaseError::DeadlineExceeded {
        phase: phase.to_string(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}
