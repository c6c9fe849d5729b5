//! Public API boundary validation tests
//!
//! Uses ONLY the crate-root re-exports, the way an embedding host would. The
//! in-memory collaborators come from the engine's `test-utils` feature.

use std::sync::Arc;
use std::time::Duration;

use reconciler::{
    // Configuration
    Config,
    ConfigBuilder,
    ConfigSource,
    // Collaborator seams
    ControlPlane,
    ControlPlaneError,
    // Errors
    ErrorCategory,
    ObjectKey,
    Phase,
    PhaseError,
    ReconcileError,
    ReconcileResult,
    // Entry point
    Reconciler,
    ReconcilerSettings,
    RemoteError,
    RemoteSystem,
    Request,
    RequestContext,
    ResultEncoding,
    Trigger,
    UserFriendlyError,
    Workload,
    classify,
    finalizer_name,
    init_tracing,
    wrap,
};
use reconciler_engine::testing::{InMemoryControlPlane, InMemoryRemote, TestWorkload};

fn assert_control_plane<C: ControlPlane<TestWorkload>>(_: &C) {}

fn assert_remote<R: RemoteSystem<TestWorkload>>(_: &R) {}

fn assert_workload<W: Workload>() {}

fn assert_phase_object_safe(_: Option<Box<dyn Phase<TestWorkload>>>) {}

#[test]
fn test_public_api_types_accessible() {
    assert_workload::<TestWorkload>();
    assert_control_plane(&InMemoryControlPlane::new());
    assert_remote(&InMemoryRemote::new());
    assert_phase_object_safe(None);

    let _: fn(bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> = init_tracing;
    let _: ConfigBuilder = Config::builder();
    let _ = ConfigSource::Default;
    let _ = ErrorCategory::Contract;
    let _ = ControlPlaneError::Unavailable("down".to_string());
    let _ = PhaseError::contract("unresolved");
    let _: Option<&Request<TestWorkload>> = None;
}

#[test]
fn test_trigger_display_strings_are_stable() {
    let names: Vec<_> = [
        Trigger::Unknown,
        Trigger::Create,
        Trigger::Update,
        Trigger::Delete,
        Trigger::Requeue,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_eq!(names, ["Unknown", "Create", "Update", "Delete", "Requeue"]);
    assert_eq!(Trigger::default(), Trigger::Unknown);
}

#[test]
fn test_result_policy_constructors() {
    assert_eq!(
        ReconcileResult::requeue_after_secs(30),
        ReconcileResult::requeue_after(Duration::from_secs(30))
    );
    assert_ne!(ReconcileResult::requeue_now(), ReconcileResult::no_requeue());
    assert_eq!(
        ReconcileResult::requeue_now().encode(),
        ResultEncoding {
            requeue: true,
            requeue_after_seconds: 0
        }
    );
}

#[test]
fn test_helpers_usable_from_root() {
    let object = TestWorkload::new("default", "pool-a").persisted();
    assert_eq!(classify(&object), Trigger::Update);
    assert_eq!(
        finalizer_name(&object, "finalizer"),
        "machinepool.infra.example.io/finalizer"
    );

    let key = ObjectKey::new("default", "pool-a");
    let err: ReconcileError =
        wrap(&key, "stage", Err::<(), _>(RemoteError::RateLimited)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::RemoteSystem);
}

#[tokio::test]
async fn test_reconciler_is_shareable_across_tasks() {
    let control_plane = Arc::new(InMemoryControlPlane::new());
    let remote = Arc::new(InMemoryRemote::new());
    for name in ["pool-a", "pool-b", "pool-c"] {
        control_plane.insert(TestWorkload::new("default", name).persisted());
    }
    let reconciler: Arc<Reconciler<TestWorkload, _, _>> = Arc::new(Reconciler::new(
        Arc::clone(&control_plane),
        Arc::clone(&remote),
        ReconcilerSettings::default(),
    ));

    let handles: Vec<_> = ["pool-a", "pool-b", "pool-c"]
        .into_iter()
        .map(|name| {
            let reconciler = Arc::clone(&reconciler);
            tokio::spawn(async move {
                reconciler
                    .reconcile(RequestContext::new(), ObjectKey::new("default", name))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result, ReconcileResult::no_requeue());
    }
    assert_eq!(remote.create_calls(), 3);
}
