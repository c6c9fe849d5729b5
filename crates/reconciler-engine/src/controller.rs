//! Reconciler entry point wiring collaborators into the default pipeline

use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

use reconciler_config::{Config, ReconcilerSettings};
use reconciler_phase_api::{
    ControlPlane, ReconcileResult, RemoteSystem, Request, RequestContext, Workload,
};
use reconciler_utils::error::ReconcileError;
use reconciler_utils::types::ObjectKey;

use crate::phases::{Collaborators, default_phases};
use crate::pipeline::{Halt, Pipeline};

/// Drives one kind of workload toward its desired state.
///
/// A `Reconciler` is cheap to share: hosts typically wrap it in an `Arc` and
/// call [`Reconciler::reconcile`] once per watch event. It keeps no state
/// between calls.
///
/// # Example
///
/// ```rust,ignore
/// let reconciler = Reconciler::new(control_plane, remote, config.settings());
/// let result = reconciler.reconcile(RequestContext::new(), key).await?;
/// ```
pub struct Reconciler<W: Workload, C, R> {
    collaborators: Arc<Collaborators<C, R>>,
    pipeline: Pipeline<W>,
}

impl<W, C, R> Reconciler<W, C, R>
where
    W: Workload,
    C: ControlPlane<W> + 'static,
    R: RemoteSystem<W> + 'static,
{
    #[must_use]
    pub fn new(control_plane: Arc<C>, remote: Arc<R>, settings: ReconcilerSettings) -> Self {
        let collaborators = Arc::new(Collaborators {
            control_plane,
            remote,
            settings,
        });
        let pipeline = Pipeline::new(default_phases(&collaborators));
        Self {
            collaborators,
            pipeline,
        }
    }

    /// Build from a loaded configuration.
    #[must_use]
    pub fn from_config(control_plane: Arc<C>, remote: Arc<R>, config: &Config) -> Self {
        Self::new(control_plane, remote, config.settings())
    }

    #[must_use]
    pub fn settings(&self) -> &ReconcilerSettings {
        &self.collaborators.settings
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<W> {
        &self.pipeline
    }

    /// Run one reconciliation pass for `key`.
    ///
    /// A context without a deadline gets one `phase_timeout` from now, shared
    /// by every phase of the pass.
    ///
    /// # Errors
    ///
    /// Returns the first phase failure wrapped with the request key. Every
    /// error is retryable; the host decides when to try again.
    pub async fn reconcile(
        &self,
        context: RequestContext,
        key: ObjectKey,
    ) -> Result<ReconcileResult, ReconcileError> {
        let context = if context.deadline().is_some() {
            context
        } else {
            context.with_timeout(self.collaborators.settings.phase_timeout)
        };

        let mut request = Request::<W>::new(context, key);
        let span = request.span.clone();

        async {
            debug!("Reconciling");
            match self.pipeline.run_request(&mut request).await {
                Ok((result, Halt::Requeue)) => {
                    info!(trigger = %request.trigger, outcome = %result, "Reconcile requeued");
                    Ok(result)
                }
                Ok((result, Halt::Completed)) => {
                    info!(
                        trigger = %request.trigger,
                        ready = request.ready,
                        "Reconcile completed"
                    );
                    Ok(result)
                }
                Err(err) => {
                    warn!(trigger = %request.trigger, error = %err, "Reconcile failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalizer::finalizer_name;
    use crate::phases::READY_CONDITION;
    use crate::testing::{CallLog, InMemoryControlPlane, InMemoryRemote, PoolSpec, TestWorkload};
    use reconciler_phase_api::PhaseError;
    use reconciler_utils::error::RemoteError;
    use reconciler_utils::types::ConditionStatus;
    use std::time::Duration;

    const FINALIZER: &str = "machinepool.infra.example.io/finalizer";

    struct Harness {
        control_plane: Arc<InMemoryControlPlane>,
        remote: Arc<InMemoryRemote>,
        log: CallLog,
        reconciler: Reconciler<TestWorkload, InMemoryControlPlane, InMemoryRemote>,
    }

    fn harness() -> Harness {
        let log = CallLog::new();
        let control_plane = Arc::new(InMemoryControlPlane::with_log(log.clone()));
        let remote = Arc::new(InMemoryRemote::with_log(log.clone()));
        let reconciler = Reconciler::new(
            Arc::clone(&control_plane),
            Arc::clone(&remote),
            ReconcilerSettings::default(),
        );
        Harness {
            control_plane,
            remote,
            log,
            reconciler,
        }
    }

    fn key() -> ObjectKey {
        ObjectKey::new("default", "pool-a")
    }

    #[test]
    fn test_finalizer_token_matches_default_suffix() {
        let object = TestWorkload::new("default", "pool-a");
        assert_eq!(finalizer_name(&object, "finalizer"), FINALIZER);
    }

    #[tokio::test]
    async fn test_create_adds_finalizer_before_remote_create() {
        let h = harness();
        h.control_plane
            .insert(TestWorkload::new("default", "pool-a").persisted());

        let result = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::no_requeue());
        let stored = h.control_plane.stored(&key()).unwrap();
        assert_eq!(stored.finalizers, vec![FINALIZER.to_string()]);
        assert_eq!(h.remote.create_calls(), 1);
        assert!(h.remote.stored("default-pool-a").is_some());

        let finalizer_at = h
            .log
            .position(&format!("control-plane.update {FINALIZER}"))
            .unwrap();
        let create_at = h.log.position("remote.create default-pool-a").unwrap();
        assert!(finalizer_at < create_at);
    }

    #[tokio::test]
    async fn test_ready_condition_persisted() {
        let h = harness();
        h.control_plane
            .insert(TestWorkload::new("default", "pool-a").persisted());

        h.reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        let stored = h.control_plane.stored(&key()).unwrap();
        let ready = stored
            .conditions
            .iter()
            .find(|c| c.condition_type == READY_CONDITION)
            .unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(h.control_plane.update_status_calls(), 1);
    }

    #[tokio::test]
    async fn test_not_ready_requeues_after_configured_delay() {
        let h = harness();
        h.control_plane
            .insert(TestWorkload::new("default", "pool-a").persisted());
        h.remote.set_ready(false);

        let result = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        assert_eq!(
            result,
            ReconcileResult::requeue_after(h.reconciler.settings().requeue_after)
        );
        let stored = h.control_plane.stored(&key()).unwrap();
        assert_eq!(stored.conditions[0].status, ConditionStatus::False);
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let h = harness();
        h.control_plane
            .insert(TestWorkload::new("default", "pool-a").persisted());

        h.reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();
        let result = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::no_requeue());
        assert_eq!(h.remote.create_calls(), 1);
        assert_eq!(h.remote.update_calls(), 0);
        assert_eq!(h.control_plane.update_calls(), 1);
        assert_eq!(h.control_plane.update_status_calls(), 1);
    }

    #[tokio::test]
    async fn test_spec_drift_updates_remote() {
        let h = harness();
        let desired = PoolSpec {
            replicas: 5,
            instance_type: "highmem-8".to_string(),
        };
        h.control_plane.insert(
            TestWorkload::new("default", "pool-a")
                .persisted()
                .with_finalizer(FINALIZER)
                .with_spec(desired.clone()),
        );
        h.remote.insert(
            "default-pool-a",
            PoolSpec {
                replicas: 1,
                instance_type: "standard-4".to_string(),
            },
        );

        h.reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        assert_eq!(h.remote.create_calls(), 0);
        assert_eq!(h.remote.update_calls(), 1);
        assert_eq!(h.remote.stored("default-pool-a"), Some(desired));
    }

    #[tokio::test]
    async fn test_missing_object_completes_without_remote_calls() {
        let h = harness();

        let result = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::no_requeue());
        assert_eq!(h.remote.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_cleans_remote_then_releases_object() {
        let h = harness();
        h.control_plane.insert(
            TestWorkload::new("default", "pool-a")
                .persisted()
                .deleting()
                .with_finalizer(FINALIZER),
        );
        h.remote.insert("default-pool-a", PoolSpec::default());

        let result = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::no_requeue());
        assert_eq!(h.remote.delete_calls(), 1);
        assert!(h.remote.stored("default-pool-a").is_none());
        assert!(h.control_plane.stored(&key()).is_none());
        assert_eq!(h.remote.create_calls(), 0);
        assert_eq!(h.remote.is_ready_calls(), 0);

        let delete_at = h.log.position("remote.delete default-pool-a").unwrap();
        let release_at = h.log.position("control-plane.update ").unwrap();
        assert!(delete_at < release_at);
    }

    #[tokio::test]
    async fn test_delete_without_our_finalizer_makes_no_remote_calls() {
        let h = harness();
        h.control_plane.insert(
            TestWorkload::new("default", "pool-a")
                .persisted()
                .deleting()
                .with_finalizer("someone.else/finalizer"),
        );

        let result = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::no_requeue());
        assert_eq!(h.remote.total_calls(), 0);
        assert_eq!(h.control_plane.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_remote_cleanup_keeps_finalizer() {
        let h = harness();
        h.control_plane.insert(
            TestWorkload::new("default", "pool-a")
                .persisted()
                .deleting()
                .with_finalizer(FINALIZER),
        );
        h.remote.insert("default-pool-a", PoolSpec::default());
        h.remote
            .fail("delete", RemoteError::Unavailable("maintenance".to_string()));

        let err = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap_err();

        assert!(matches!(err.source, PhaseError::Remote(_)));
        let stored = h.control_plane.stored(&key()).unwrap();
        assert_eq!(stored.finalizers, vec![FINALIZER.to_string()]);
    }

    #[tokio::test]
    async fn test_remote_failure_is_wrapped_with_key() {
        let h = harness();
        h.control_plane
            .insert(TestWorkload::new("default", "pool-a").persisted());
        h.remote.fail("create", RemoteError::RateLimited);

        let err = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap_err();

        assert_eq!(err.key, key());
        assert!(err.is_retryable());
        assert!(
            err.to_string()
                .starts_with("request=default/pool-a, message=phase reconciliation error - ")
        );
        // The finalizer went in before the failing create.
        let stored = h.control_plane.stored(&key()).unwrap();
        assert_eq!(stored.finalizers, vec![FINALIZER.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_timeout_bounds_slow_remote() {
        let h = harness();
        h.control_plane
            .insert(TestWorkload::new("default", "pool-a").persisted());
        h.remote.set_latency(Duration::from_secs(600));

        let err = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap_err();

        assert!(matches!(
            err.source,
            PhaseError::DeadlineExceeded { ref phase, timeout_ms: 60_000 } if phase == "resolve-current-state"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_timeout_is_shared_across_the_pass() {
        let h = harness();
        h.control_plane
            .insert(TestWorkload::new("default", "pool-a").persisted());
        // Each call fits in 60s on its own; get plus create does not.
        h.remote.set_latency(Duration::from_secs(40));

        let err = h
            .reconciler
            .reconcile(RequestContext::new(), key())
            .await
            .unwrap_err();

        assert!(matches!(
            err.source,
            PhaseError::DeadlineExceeded { ref phase, timeout_ms: 60_000 } if phase == "create-or-update"
        ));
        assert!(err.to_string().contains("reconcile pass deadline of 60000ms"));
        assert_eq!(h.remote.get_calls(), 1);
        assert!(h.remote.stored("default-pool-a").is_none());
    }
}
