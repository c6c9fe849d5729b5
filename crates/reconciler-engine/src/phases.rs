//! Built-in phases of a convergence cycle
//!
//! The default pipeline runs, in order: resolve desired state, resolve current
//! state, finalize, create-or-update and wait-until-ready. Each phase borrows
//! the shared [`Collaborators`] and touches only the [`Request`] it is given.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use reconciler_config::ReconcilerSettings;
use reconciler_phase_api::{
    ControlPlane, Phase, PhaseError, ReconcileResult, RemoteSystem, Request, Trigger, Workload,
};
use reconciler_utils::error::RemoteError;
use reconciler_utils::logging;
use reconciler_utils::types::{Condition, ConditionStatus, set_condition};

use crate::finalizer::{add_finalizer, finalizer_name, has_finalizer, remove_finalizer};
use crate::trigger::classify;

/// Condition type maintained by the wait-until-ready phase.
pub const READY_CONDITION: &str = "Ready";

/// Identifiers of the built-in phases, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseId {
    ResolveDesiredState,
    ResolveCurrentState,
    Finalize,
    CreateOrUpdate,
    WaitUntilReady,
}

impl PhaseId {
    pub const ALL: [Self; 5] = [
        Self::ResolveDesiredState,
        Self::ResolveCurrentState,
        Self::Finalize,
        Self::CreateOrUpdate,
        Self::WaitUntilReady,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveDesiredState => "resolve-desired-state",
            Self::ResolveCurrentState => "resolve-current-state",
            Self::Finalize => "finalize",
            Self::CreateOrUpdate => "create-or-update",
            Self::WaitUntilReady => "wait-until-ready",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared handles every built-in phase works through.
#[derive(Debug)]
pub struct Collaborators<C, R> {
    pub control_plane: Arc<C>,
    pub remote: Arc<R>,
    pub settings: ReconcilerSettings,
}

impl<C, R> Collaborators<C, R> {
    fn finalizer_for<W: Workload>(&self, object: &W) -> String {
        finalizer_name(object, &self.settings.finalizer_suffix)
    }
}

/// Build the default phase list over shared collaborators.
#[must_use]
pub fn default_phases<W, C, R>(collaborators: &Arc<Collaborators<C, R>>) -> Vec<Box<dyn Phase<W>>>
where
    W: Workload,
    C: ControlPlane<W> + 'static,
    R: RemoteSystem<W> + 'static,
{
    vec![
        Box::new(ResolveDesiredState(Arc::clone(collaborators))),
        Box::new(ResolveCurrentState(Arc::clone(collaborators))),
        Box::new(Finalize(Arc::clone(collaborators))),
        Box::new(CreateOrUpdate(Arc::clone(collaborators))),
        Box::new(WaitUntilReady(Arc::clone(collaborators))),
    ]
}

/// Fetch the object, classify the trigger and bind the remote identifier.
///
/// Completes the request without further work when the object is gone, or
/// when it is being deleted and our finalizer has already been removed.
pub struct ResolveDesiredState<C, R>(pub Arc<Collaborators<C, R>>);

#[async_trait]
impl<W, C, R> Phase<W> for ResolveDesiredState<C, R>
where
    W: Workload,
    C: ControlPlane<W>,
    R: RemoteSystem<W>,
{
    fn id(&self) -> &'static str {
        PhaseId::ResolveDesiredState.as_str()
    }

    async fn run(&self, request: &mut Request<W>) -> Result<ReconcileResult, PhaseError> {
        let phase = PhaseId::ResolveDesiredState.as_str();
        let fetched = request
            .context
            .guard(phase, self.0.control_plane.get(&request.key))
            .await?;

        let Some(object) = fetched else {
            debug!(key = %request.key, "Object no longer exists");
            request.mark_complete();
            return Ok(ReconcileResult::no_requeue());
        };

        let trigger = classify(&object);
        logging::record_trigger(&request.span, object.kind(), trigger);
        request.trigger = trigger;

        if trigger == Trigger::Delete && !has_finalizer(&object, &self.0.finalizer_for(&object)) {
            debug!(key = %request.key, "Finalizer already removed; nothing to clean up");
            request.desired_state = object;
            request.mark_complete();
            return Ok(ReconcileResult::no_requeue());
        }

        request.remote_id = Some(self.0.remote.remote_id(&object));
        request.desired_state = object;
        Ok(ReconcileResult::no_requeue())
    }
}

/// Read the remote object bound to the request.
pub struct ResolveCurrentState<C, R>(pub Arc<Collaborators<C, R>>);

#[async_trait]
impl<W, C, R> Phase<W> for ResolveCurrentState<C, R>
where
    W: Workload,
    C: ControlPlane<W>,
    R: RemoteSystem<W>,
{
    fn id(&self) -> &'static str {
        PhaseId::ResolveCurrentState.as_str()
    }

    async fn run(&self, request: &mut Request<W>) -> Result<ReconcileResult, PhaseError> {
        let phase = PhaseId::ResolveCurrentState.as_str();
        let id = request.remote_id()?.to_string();
        request.current_state = request
            .context
            .guard(phase, self.0.remote.get(&id))
            .await?;
        Ok(ReconcileResult::no_requeue())
    }
}

/// Clean up the remote object of a deleting workload, then release it.
///
/// The finalizer is removed and persisted only once remote cleanup has
/// succeeded. A no-op for any trigger other than `Delete`.
pub struct Finalize<C, R>(pub Arc<Collaborators<C, R>>);

#[async_trait]
impl<W, C, R> Phase<W> for Finalize<C, R>
where
    W: Workload,
    C: ControlPlane<W>,
    R: RemoteSystem<W>,
{
    fn id(&self) -> &'static str {
        PhaseId::Finalize.as_str()
    }

    async fn run(&self, request: &mut Request<W>) -> Result<ReconcileResult, PhaseError> {
        if request.trigger != Trigger::Delete {
            return Ok(ReconcileResult::no_requeue());
        }
        let phase = PhaseId::Finalize.as_str();
        let id = request.remote_id()?.to_string();

        if request.current_state.is_some() {
            match request
                .context
                .guard(phase, self.0.remote.delete(&id))
                .await
            {
                Ok(()) => info!(key = %request.key, remote_id = %id, "Deleted remote object"),
                Err(PhaseError::Remote(RemoteError::NotFound { .. })) => {
                    debug!(key = %request.key, remote_id = %id, "Remote object already gone");
                }
                Err(err) => return Err(err),
            }
            request.current_state = None;
        }

        let finalizer = self.0.finalizer_for(&request.desired_state);
        if remove_finalizer(&mut request.desired_state, &finalizer) {
            request.desired_state = request
                .context
                .guard(phase, self.0.control_plane.update(&request.desired_state))
                .await?;
            info!(key = %request.key, finalizer = %finalizer, "Removed finalizer");
        }

        request.mark_complete();
        Ok(ReconcileResult::no_requeue())
    }
}

/// Make the remote object match the desired spec.
///
/// The finalizer is added and persisted before any remote side effect, so a
/// remote object never exists without something guarding its cleanup.
pub struct CreateOrUpdate<C, R>(pub Arc<Collaborators<C, R>>);

#[async_trait]
impl<W, C, R> Phase<W> for CreateOrUpdate<C, R>
where
    W: Workload,
    C: ControlPlane<W>,
    R: RemoteSystem<W>,
{
    fn id(&self) -> &'static str {
        PhaseId::CreateOrUpdate.as_str()
    }

    async fn run(&self, request: &mut Request<W>) -> Result<ReconcileResult, PhaseError> {
        let phase = PhaseId::CreateOrUpdate.as_str();
        let id = request.remote_id()?.to_string();

        let finalizer = self.0.finalizer_for(&request.desired_state);
        if add_finalizer(&mut request.desired_state, &finalizer) {
            request.desired_state = request
                .context
                .guard(phase, self.0.control_plane.update(&request.desired_state))
                .await?;
            debug!(key = %request.key, finalizer = %finalizer, "Added finalizer");
        }

        let desired = request.desired_state.spec().clone();
        match request.current_state.as_ref() {
            None => {
                request
                    .context
                    .guard(phase, self.0.remote.create(&id, &desired))
                    .await?;
                info!(key = %request.key, remote_id = %id, "Created remote object");
            }
            Some(current) if *current != desired => {
                request
                    .context
                    .guard(phase, self.0.remote.update(&id, &desired))
                    .await?;
                info!(key = %request.key, remote_id = %id, "Updated remote object");
            }
            Some(_) => {
                debug!(key = %request.key, remote_id = %id, "Remote object up to date");
                return Ok(ReconcileResult::no_requeue());
            }
        }

        request.current_state = Some(desired);
        Ok(ReconcileResult::no_requeue())
    }
}

/// Record remote readiness on the workload and requeue until ready.
pub struct WaitUntilReady<C, R>(pub Arc<Collaborators<C, R>>);

#[async_trait]
impl<W, C, R> Phase<W> for WaitUntilReady<C, R>
where
    W: Workload,
    C: ControlPlane<W>,
    R: RemoteSystem<W>,
{
    fn id(&self) -> &'static str {
        PhaseId::WaitUntilReady.as_str()
    }

    async fn run(&self, request: &mut Request<W>) -> Result<ReconcileResult, PhaseError> {
        let phase = PhaseId::WaitUntilReady.as_str();
        let id = request.remote_id()?.to_string();

        let ready = request
            .context
            .guard(phase, self.0.remote.is_ready(&id))
            .await?;
        request.ready = ready;

        let condition = if ready {
            Condition::new(READY_CONDITION, ConditionStatus::True, "Ready", "remote object is ready")
        } else {
            Condition::new(
                READY_CONDITION,
                ConditionStatus::False,
                "Provisioning",
                "waiting for remote object to become ready",
            )
        };
        // An absent condition reads as Unknown.
        let previous = request
            .desired_state
            .conditions()
            .iter()
            .find(|c| c.condition_type == READY_CONDITION)
            .map_or(ConditionStatus::Unknown, |c| c.status);
        let status = condition.status;
        if set_condition(request.desired_state.conditions_mut(), condition) {
            if previous != status {
                info!(key = %request.key, from = %previous, to = %status, "Ready condition changed");
            }
            request.desired_state = request
                .context
                .guard(phase, self.0.control_plane.update_status(&request.desired_state))
                .await?;
        }

        if ready {
            return Ok(ReconcileResult::no_requeue());
        }
        let delay = self.0.settings.requeue_after;
        debug!(key = %request.key, remote_id = %id, "Remote object not ready yet");
        Ok(ReconcileResult::requeue_after(delay))
    }
}
