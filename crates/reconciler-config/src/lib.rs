//! Configuration management for reconciler
//!
//! Provides the configuration model, file/environment discovery with
//! precedence, a programmatic builder, and validation. The engine never reads
//! configuration itself: hosts resolve a [`Config`] and hand the plain
//! [`ReconcilerSettings`] value to the reconciler constructor.
//!
//! Precedence (highest first):
//! `RECONCILER_*` environment overrides > config file > built-in defaults.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use discovery::{CONFIG_ENV_VAR, CONFIG_FILE_NAME};
pub use model::{
    Config, DEFAULT_FINALIZER_SUFFIX, DEFAULT_PHASE_TIMEOUT_SECS, DEFAULT_REQUEUE_AFTER_SECS,
    ReconcilerSettings, ReconcilerTable,
};
pub use reconciler_utils::types::ConfigSource;
