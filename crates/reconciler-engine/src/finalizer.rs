//! Finalizer naming and list maintenance
//!
//! A finalizer token blocks physical removal of an object until the
//! reconciler has cleaned up the remote state it owns.

use reconciler_phase_api::Workload;

/// Derive the finalizer token for an object: `lower("<kind>.<group>/<suffix>")`.
///
/// Deterministic in kind and group. Empty kind or group still produce a
/// well-formed (if degenerate) token.
#[must_use]
pub fn finalizer_name<W: Workload>(object: &W, suffix: &str) -> String {
    format!("{}.{}/{}", object.kind(), object.group(), suffix).to_lowercase()
}

#[must_use]
pub fn has_finalizer<W: Workload>(object: &W, finalizer: &str) -> bool {
    object.finalizers().iter().any(|f| f == finalizer)
}

/// Add the token unless already present. Returns whether the list changed.
pub fn add_finalizer<W: Workload>(object: &mut W, finalizer: &str) -> bool {
    if has_finalizer(object, finalizer) {
        return false;
    }
    object.finalizers_mut().push(finalizer.to_string());
    true
}

/// Remove every occurrence of the token. Returns whether the list changed.
pub fn remove_finalizer<W: Workload>(object: &mut W, finalizer: &str) -> bool {
    let finalizers = object.finalizers_mut();
    let before = finalizers.len();
    finalizers.retain(|f| f != finalizer);
    finalizers.len() != before
}
