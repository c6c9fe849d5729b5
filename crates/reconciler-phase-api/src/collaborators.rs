use async_trait::async_trait;

use reconciler_utils::error::{ControlPlaneError, RemoteError};
use reconciler_utils::types::ObjectKey;

use crate::Workload;

/// The control-plane API that stores the managed objects.
///
/// Implementations talk to whatever persists the declarative objects and
/// drives the watch that invokes the reconciler.
#[async_trait]
pub trait ControlPlane<W: Workload>: Send + Sync {
    /// Fetch the object, or `None` once it has been physically removed.
    async fn get(&self, key: &ObjectKey) -> Result<Option<W>, ControlPlaneError>;

    /// Persist metadata changes (the finalizer list) and return the stored object.
    async fn update(&self, object: &W) -> Result<W, ControlPlaneError>;

    /// Persist status changes (conditions) and return the stored object.
    async fn update_status(&self, object: &W) -> Result<W, ControlPlaneError>;
}

/// The external system of record that materializes desired state.
///
/// All operations are keyed by an identifier derived from the desired state.
/// `delete` of an object that no longer exists should report
/// [`RemoteError::NotFound`]; the engine treats that as already cleaned up.
#[async_trait]
pub trait RemoteSystem<W: Workload>: Send + Sync {
    /// Derive the remote identifier for a desired object.
    fn remote_id(&self, desired: &W) -> String;

    /// Read the remote object's spec, `None` if it does not exist.
    async fn get(&self, id: &str) -> Result<Option<W::Spec>, RemoteError>;

    async fn create(&self, id: &str, spec: &W::Spec) -> Result<(), RemoteError>;

    async fn update(&self, id: &str, spec: &W::Spec) -> Result<(), RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;

    /// Health query used by the wait-until-ready phase.
    async fn is_ready(&self, id: &str) -> Result<bool, RemoteError>;
}
