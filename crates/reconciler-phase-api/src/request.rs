use reconciler_utils::error::PhaseError;
use reconciler_utils::logging;
use reconciler_utils::types::{ObjectKey, Trigger};

use crate::{RequestContext, Workload};

/// State of one reconciliation pass.
///
/// A `Request` is created at the start of an invocation, threaded through
/// every phase as `&mut`, and dropped at the end. It is deliberately not
/// `Clone`: there is exactly one per invocation.
#[derive(Debug)]
pub struct Request<W: Workload> {
    /// Cancellation and deadline scope for every collaborator call.
    pub context: RequestContext,
    /// Identity of the object that triggered the pass.
    pub key: ObjectKey,
    /// Classified once the desired state has been resolved.
    pub trigger: Trigger,
    /// Default-initialized until the first phase fetches the object.
    pub desired_state: W,
    /// The remote object's spec; `None` until resolved or when it does not exist.
    pub current_state: Option<W::Spec>,
    /// Identifier binding this pass to one remote object.
    pub remote_id: Option<String>,
    /// Whether the remote object reported ready during this pass.
    pub ready: bool,
    /// Span scoping every event of this pass.
    pub span: tracing::Span,
    complete: bool,
}

impl<W: Workload> Request<W> {
    #[must_use]
    pub fn new(context: RequestContext, key: ObjectKey) -> Self {
        let span = logging::reconcile_span(&key);
        Self {
            context,
            key,
            trigger: Trigger::Unknown,
            desired_state: W::default(),
            current_state: None,
            remote_id: None,
            ready: false,
            span,
            complete: false,
        }
    }

    /// Mark the pass as finished; the pipeline runs no further phases and
    /// reports no requeue.
    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The remote identifier, which later phases require.
    ///
    /// # Errors
    ///
    /// Returns a contract error if no earlier phase bound the request to a
    /// remote object.
    pub fn remote_id(&self) -> Result<&str, PhaseError> {
        self.remote_id.as_deref().ok_or_else(|| {
            PhaseError::contract(format!(
                "remote identifier for {} was not resolved before use",
                self.key
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use reconciler_utils::types::Condition;

    #[derive(Debug, Clone, Default)]
    struct Probe {
        finalizers: Vec<String>,
        conditions: Vec<Condition>,
        replicas: u32,
    }

    impl Workload for Probe {
        type Spec = u32;

        fn kind(&self) -> &str {
            "Probe"
        }

        fn group(&self) -> &str {
            "test.example.io"
        }

        fn key(&self) -> ObjectKey {
            ObjectKey::new("default", "probe")
        }

        fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
            None
        }

        fn deletion_timestamp(&self) -> Option<DateTime<Utc>> {
            None
        }

        fn finalizers(&self) -> &[String] {
            &self.finalizers
        }

        fn finalizers_mut(&mut self) -> &mut Vec<String> {
            &mut self.finalizers
        }

        fn conditions(&self) -> &[Condition] {
            &self.conditions
        }

        fn conditions_mut(&mut self) -> &mut Vec<Condition> {
            &mut self.conditions
        }

        fn spec(&self) -> &u32 {
            &self.replicas
        }
    }

    fn request() -> Request<Probe> {
        Request::new(RequestContext::new(), ObjectKey::new("default", "probe"))
    }

    #[test]
    fn test_new_request_starts_empty() {
        let request = request();
        assert_eq!(request.trigger, Trigger::Unknown);
        assert!(request.current_state.is_none());
        assert!(request.remote_id.is_none());
        assert!(!request.ready);
        assert!(!request.is_complete());
        assert_eq!(request.desired_state.replicas, 0);
    }

    #[test]
    fn test_mark_complete() {
        let mut request = request();
        request.mark_complete();
        assert!(request.is_complete());
    }

    #[test]
    fn test_remote_id_required_before_use() {
        let mut request = request();
        let err = request.remote_id().unwrap_err();
        assert!(matches!(err, PhaseError::Contract(_)));
        assert!(err.to_string().contains("default/probe"));

        request.remote_id = Some("probe-1".to_string());
        assert_eq!(request.remote_id().unwrap(), "probe-1");
    }
}
