use chrono::{DateTime, Utc};
use std::fmt::Debug;

use reconciler_utils::types::{Condition, ObjectKey};

/// Capability a managed resource kind exposes to the engine.
///
/// The engine is generic over this trait and never over a concrete kind. A
/// default-constructed value is the "zero" desired state a [`Request`] starts
/// with before the first phase resolves it.
///
/// Kind and group are instance data (as with a type-meta header), so an object
/// whose header was never populated yields empty strings; finalizer derivation
/// still succeeds with a degenerate token in that case.
///
/// [`Request`]: crate::Request
pub trait Workload: Default + Clone + Debug + Send + Sync + 'static {
    /// The comparable part of the desired state that is materialized remotely.
    type Spec: Clone + PartialEq + Debug + Send + Sync + 'static;

    fn kind(&self) -> &str;

    fn group(&self) -> &str;

    fn key(&self) -> ObjectKey;

    /// `None` until the control plane has persisted the object.
    fn creation_timestamp(&self) -> Option<DateTime<Utc>>;

    /// Set once deletion has been requested; the object stays until its
    /// finalizers are removed.
    fn deletion_timestamp(&self) -> Option<DateTime<Utc>>;

    fn finalizers(&self) -> &[String];

    fn finalizers_mut(&mut self) -> &mut Vec<String>;

    fn conditions(&self) -> &[Condition];

    fn conditions_mut(&mut self) -> &mut Vec<Condition>;

    fn spec(&self) -> &Self::Spec;
}
