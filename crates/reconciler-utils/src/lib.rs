//! Foundation utilities for reconciler: object identity, triggers, conditions,
//! the error taxonomy with its request envelope, and structured logging.

pub mod error;
pub mod logging;
pub mod types;
