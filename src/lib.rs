//! reconciler - generic convergence loop for declaratively managed resources
//!
//! This crate drives a managed resource toward its desired state by comparing
//! it against the live state of an external system of record and issuing
//! corrective operations until the two converge, or until the resource has been
//! deleted and its remote counterpart cleaned up.
//!
//! The engine is generic over the resource kind. A kind plugs in by
//! implementing [`Workload`]; the control plane that stores the objects and the
//! remote system that materializes them plug in through [`ControlPlane`] and
//! [`RemoteSystem`].
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! reconciler = "0.1"
//! tokio = { version = "1", features = ["rt-multi-thread", "macros"] }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reconciler::{Config, ObjectKey, Reconciler, RequestContext};
//!
//! let config = Config::discover(None)?;
//! let reconciler = Reconciler::from_config(control_plane, remote, &config);
//!
//! // Called by the host once per watch event.
//! let result = reconciler
//!     .reconcile(RequestContext::new(), ObjectKey::new("default", "pool-a"))
//!     .await?;
//! let encoded = result.encode();
//! ```
//!
//! # Pass Lifecycle
//!
//! Each call builds a fresh request and runs the phases in order: resolve
//! desired state, resolve current state, finalize, create-or-update,
//! wait-until-ready. The first failing or requeue-signaling phase ends the pass.
//! Failures come back as a [`ReconcileError`] carrying the request key; every
//! failure is retryable.
//!
//! # Stable Public API
//!
//! - [`Reconciler`] - entry point
//! - [`Workload`], [`ControlPlane`], [`RemoteSystem`] - integration seams
//! - [`ReconcileResult`] and [`ResultEncoding`] - requeue policy and its host encoding
//! - [`ReconcileError`], [`PhaseError`] - error envelope and causes
//! - [`Config`] and [`ConfigBuilder`] - configuration management
//!
//! Internal modules are accessible via module paths but are marked `#[doc(hidden)]`
//! and are not covered by semver stability guarantees.

// ============================================================================
// Stable Public API - covered by semver guarantees for 0.x minor releases
// ============================================================================

pub use reconciler_engine::Reconciler;

pub use reconciler_phase_api::{
    ControlPlane, ObjectKey, Phase, ReconcileResult, RemoteSystem, Request, RequestContext,
    ResultEncoding, Trigger, Workload,
};

pub use reconciler_config::{Config, ConfigBuilder, ConfigSource, ReconcilerSettings};

pub use reconciler_utils::error::{
    ControlPlaneError, ErrorCategory, PhaseError, ReconcileError, RemoteError, UserFriendlyError,
    wrap,
};

pub use reconciler_engine::{classify, finalizer_name};

pub use reconciler_utils::logging::init_tracing;

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub use reconciler_utils::{error, logging, types};

#[doc(hidden)]
pub use reconciler_config as config;

#[doc(hidden)]
pub use reconciler_engine::{controller, finalizer, phases, pipeline, trigger};

#[cfg(feature = "test-utils")]
#[doc(hidden)]
pub use reconciler_engine::testing;
