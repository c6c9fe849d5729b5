//! Reconciliation engine: trigger classification, finalizer lifecycle and the
//! phase pipeline that drives a workload toward its desired state.

pub use reconciler_config as config;
pub use reconciler_phase_api as phase_api;

pub use reconciler_utils::error;
pub use reconciler_utils::logging;
pub use reconciler_utils::types;

pub mod controller;
pub mod finalizer;
pub mod phases;
pub mod pipeline;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod trigger;

pub use controller::Reconciler;
pub use finalizer::{add_finalizer, finalizer_name, has_finalizer, remove_finalizer};
pub use phases::{Collaborators, PhaseId, READY_CONDITION, default_phases};
pub use pipeline::{Halt, Pipeline};
pub use trigger::classify;
