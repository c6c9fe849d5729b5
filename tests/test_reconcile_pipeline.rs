//! Pipeline sequencing and result semantics through the public API
//!
//! Covers:
//! - Short-circuit on the first failing phase, with the failure wrapped
//! - Short-circuit on the first requeue-signaling phase
//! - Four no-requeue phases yield no requeue
//! - Full convergence cycle over in-memory collaborators

use anyhow::Result;
use async_trait::async_trait;
use std::error::Error as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reconciler::pipeline::Pipeline;
use reconciler::{
    ObjectKey, Phase, PhaseError, ReconcileResult, Reconciler, ReconcilerSettings, RemoteError,
    Request, RequestContext, ResultEncoding,
};
use reconciler_engine::testing::{InMemoryControlPlane, InMemoryRemote, TestWorkload};

type RunLog = Arc<Mutex<Vec<usize>>>;
type Outcome = fn(usize) -> Result<ReconcileResult, PhaseError>;

/// Phase that records its index and then does what it was told.
struct Step {
    index: usize,
    outcome: Outcome,
    log: RunLog,
}

#[async_trait]
impl Phase<TestWorkload> for Step {
    fn id(&self) -> &'static str {
        "step"
    }

    async fn run(
        &self,
        _request: &mut Request<TestWorkload>,
    ) -> Result<ReconcileResult, PhaseError> {
        self.log.lock().unwrap().push(self.index);
        (self.outcome)(self.index)
    }
}

fn proceed(_: usize) -> Result<ReconcileResult, PhaseError> {
    Ok(ReconcileResult::no_requeue())
}

fn fail(index: usize) -> Result<ReconcileResult, PhaseError> {
    Err(RemoteError::Other(format!("phase {index} broke")).into())
}

fn requeue_30s(_: usize) -> Result<ReconcileResult, PhaseError> {
    Ok(ReconcileResult::requeue_after(Duration::from_secs(30)))
}

fn chain(outcomes: [Outcome; 4]) -> (Pipeline<TestWorkload>, RunLog) {
    let log = RunLog::default();
    let phases = outcomes
        .into_iter()
        .enumerate()
        .map(|(i, outcome)| {
            Box::new(Step {
                index: i + 1,
                outcome,
                log: Arc::clone(&log),
            }) as Box<dyn Phase<TestWorkload>>
        })
        .collect();
    (Pipeline::new(phases), log)
}

fn key() -> ObjectKey {
    ObjectKey::new("team-a", "pool-1")
}

#[tokio::test]
async fn test_failing_phase_stops_the_chain() -> Result<()> {
    let (pipeline, log) = chain([proceed, fail, proceed, proceed]);

    let err = pipeline
        .run(RequestContext::new(), key())
        .await
        .unwrap_err();

    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    assert_eq!(err.key, key());
    let text = err.to_string();
    assert!(text.contains("request=team-a/pool-1"), "{text}");
    assert!(text.contains("phase reconciliation error"), "{text}");
    assert!(text.ends_with("phase 2 broke"), "{text}");
    assert_eq!(
        err.source().map(ToString::to_string),
        Some("remote system error: phase 2 broke".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_requeue_is_returned_directly() -> Result<()> {
    let (pipeline, log) = chain([proceed, requeue_30s, proceed, proceed]);

    let result = pipeline.run(RequestContext::new(), key()).await?;

    assert_eq!(result, ReconcileResult::requeue_after(Duration::from_secs(30)));
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn test_all_no_requeue_phases_complete() -> Result<()> {
    let (pipeline, log) = chain([proceed; 4]);

    let result = pipeline.run(RequestContext::new(), key()).await?;

    assert_eq!(result, ReconcileResult::no_requeue());
    assert_eq!(*log.lock().unwrap(), vec![1, 2, 3, 4]);
    Ok(())
}

#[tokio::test]
async fn test_convergence_cycle_end_to_end() -> Result<()> {
    let control_plane = Arc::new(InMemoryControlPlane::new());
    let remote = Arc::new(InMemoryRemote::new());
    control_plane.insert(TestWorkload::new("team-a", "pool-1").persisted());
    remote.set_ready(false);

    let settings = ReconcilerSettings {
        requeue_after: Duration::from_secs(15),
        ..ReconcilerSettings::default()
    };
    let reconciler: Reconciler<TestWorkload, _, _> =
        Reconciler::new(Arc::clone(&control_plane), Arc::clone(&remote), settings);

    let first = reconciler.reconcile(RequestContext::new(), key()).await?;
    assert_eq!(first, ReconcileResult::requeue_after_secs(15));
    assert_eq!(
        first.encode(),
        ResultEncoding {
            requeue: true,
            requeue_after_seconds: 15
        }
    );

    remote.set_ready(true);
    let second = reconciler.reconcile(RequestContext::new(), key()).await?;
    assert_eq!(second, ReconcileResult::no_requeue());
    assert!(!second.encode().requeue);

    assert_eq!(remote.create_calls(), 1);
    assert_eq!(remote.update_calls(), 0);
    assert_eq!(control_plane.update_calls(), 1);
    assert_eq!(control_plane.update_status_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_control_plane_failure_surfaces_as_phase_error() -> Result<()> {
    let control_plane = Arc::new(InMemoryControlPlane::new());
    let remote = Arc::new(InMemoryRemote::new());
    control_plane.insert(TestWorkload::new("team-a", "pool-1").persisted());
    control_plane.fail(
        "update",
        reconciler::ControlPlaneError::Conflict {
            key: key(),
            reason: "resource version changed".to_string(),
        },
    );
    let reconciler: Reconciler<TestWorkload, _, _> = Reconciler::new(
        Arc::clone(&control_plane),
        Arc::clone(&remote),
        ReconcilerSettings::default(),
    );

    let err = reconciler
        .reconcile(RequestContext::new(), key())
        .await
        .unwrap_err();

    assert!(matches!(err.source, PhaseError::ControlPlane(_)));
    // No remote side effect without a persisted finalizer.
    assert_eq!(remote.create_calls(), 0);
    Ok(())
}
