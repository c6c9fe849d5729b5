//! Phase contract for reconciling managed workloads
//!
//! This crate defines the types shared between the phase pipeline and the
//! phases it runs, without tying either to a concrete resource kind or
//! collaborator implementation.
//!
//! # Purpose
//!
//! - [`Workload`]: the capability a resource kind must expose (identity,
//!   lifecycle timestamps, finalizers, conditions, comparable spec).
//! - [`ControlPlane`] and [`RemoteSystem`]: the external collaborators, specified
//!   only at their trait boundary.
//! - [`Request`] and [`RequestContext`]: the per-invocation state a pass threads
//!   through its phases.
//! - [`ReconcileResult`]: what the host is told about re-invocation timing.
//! - [`Phase`]: one step of a pass.

mod collaborators;
mod context;
mod outcome;
mod phase;
mod request;
mod workload;

pub use collaborators::{ControlPlane, RemoteSystem};
pub use context::RequestContext;
pub use outcome::{ReconcileResult, ResultEncoding};
pub use phase::Phase;
pub use request::Request;
pub use workload::Workload;

pub use reconciler_utils::error::PhaseError;
pub use reconciler_utils::types::{ObjectKey, Trigger};
