//! Logging and observability infrastructure for reconciler
//!
//! Structured logging through `tracing`: a subscriber initializer for hosts,
//! a per-request span, and phase lifecycle events carrying `key` and `phase`
//! fields.

use std::time::Duration;
use tracing::{Level, debug, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::types::{ObjectKey, Trigger};

/// Initialize tracing subscriber for structured logging
///
/// Sets up tracing with either compact (default) or verbose format.
/// `RUST_LOG` takes precedence over the built-in filter.
///
/// # Arguments
/// * `verbose` - If true, include targets and emit span close events with timing
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("reconciler=debug,info")
            } else {
                EnvFilter::try_new("reconciler=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create the span that scopes every event of one reconciliation request.
///
/// `kind` and `trigger` start empty and are recorded once the object has been
/// fetched and classified.
pub fn reconcile_span(key: &ObjectKey) -> tracing::Span {
    span!(
        Level::INFO,
        "reconcile",
        namespace = %key.namespace,
        name = %key.name,
        kind = tracing::field::Empty,
        trigger = tracing::field::Empty,
    )
}

/// Record the object kind and classified trigger on a request span.
pub fn record_trigger(span: &tracing::Span, kind: &str, trigger: Trigger) {
    span.record("kind", kind);
    span.record("trigger", trigger.as_str());
}

pub fn log_phase_start(key: &ObjectKey, phase: &str) {
    debug!(key = %key, phase = %phase, "Starting phase");
}

pub fn log_phase_complete(key: &ObjectKey, phase: &str, duration_ms: u128) {
    debug!(
        key = %key,
        phase = %phase,
        duration_ms = %duration_ms,
        "Phase completed"
    );
}

/// Log a phase that halted the pipeline to ask for another pass.
pub fn log_phase_requeue(key: &ObjectKey, phase: &str, after: Option<Duration>) {
    match after {
        Some(delay) => info!(
            key = %key,
            phase = %phase,
            requeue_after_ms = %delay.as_millis(),
            "Phase requested delayed requeue"
        ),
        None => info!(key = %key, phase = %phase, "Phase requested immediate requeue"),
    }
}

pub fn log_phase_error(key: &ObjectKey, phase: &str, error: &str, duration_ms: u128) {
    error!(
        key = %key,
        phase = %phase,
        duration_ms = %duration_ms,
        error = %error,
        "Phase failed"
    );
}
