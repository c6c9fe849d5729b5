//! Trigger classification from lifecycle timestamps

use reconciler_phase_api::{Trigger, Workload};

/// Classify why the object is being reconciled.
///
/// Recomputed from the snapshot on every pass; nothing about the previous
/// trigger is remembered. The creation check comes first, so an object that
/// was never persisted is a `Create` even if it carries a deletion timestamp.
/// Never returns [`Trigger::Unknown`] or [`Trigger::Requeue`].
#[must_use]
pub fn classify<W: Workload>(object: &W) -> Trigger {
    if object.creation_timestamp().is_none() {
        Trigger::Create
    } else if object.deletion_timestamp().is_some() {
        Trigger::Delete
    } else {
        Trigger::Update
    }
}
