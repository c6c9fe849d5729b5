use async_trait::async_trait;

use reconciler_utils::error::PhaseError;

use crate::{ReconcileResult, Request, Workload};

/// One step of a reconciliation pass.
///
/// A phase reads and writes only the [`Request`] it is given. It either fails,
/// asks for a requeue, or returns [`ReconcileResult::NoRequeue`] to let the
/// pipeline continue. A phase that decides nothing more needs to happen this
/// pass calls [`Request::mark_complete`] and returns no-requeue.
#[async_trait]
pub trait Phase<W: Workload>: Send + Sync {
    /// Stable name used in logs and error context.
    fn id(&self) -> &'static str;

    async fn run(&self, request: &mut Request<W>) -> Result<ReconcileResult, PhaseError>;
}
