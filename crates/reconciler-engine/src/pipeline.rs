//! Ordered phase execution with short-circuiting
//!
//! A [`Pipeline`] runs its phases one after another against a single
//! [`Request`]. The first phase that fails or asks for a requeue ends the pass;
//! a phase that marks the request complete ends it with no requeue.

use std::time::Instant;
use tracing::Instrument;

use reconciler_phase_api::{Phase, ReconcileResult, Request, RequestContext, Workload};
use reconciler_utils::error::{PHASE_RECONCILIATION_STAGE, ReconcileError, wrap};
use reconciler_utils::logging;
use reconciler_utils::types::ObjectKey;

/// How a successful pass through the pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Every phase ran, or a phase marked the request complete.
    Completed,
    /// A phase asked for another pass.
    Requeue,
}

pub struct Pipeline<W: Workload> {
    phases: Vec<Box<dyn Phase<W>>>,
}

impl<W: Workload> Pipeline<W> {
    #[must_use]
    pub fn new(phases: Vec<Box<dyn Phase<W>>>) -> Self {
        Self { phases }
    }

    /// Phase names in execution order.
    pub fn phase_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.phases.iter().map(|phase| phase.id())
    }

    /// Build a fresh request for `key` and run every phase against it.
    ///
    /// # Errors
    ///
    /// Returns the first phase failure, wrapped with the request key and the
    /// phase reconciliation stage.
    pub async fn run(
        &self,
        context: RequestContext,
        key: ObjectKey,
    ) -> Result<ReconcileResult, ReconcileError> {
        let mut request = Request::new(context, key);
        self.run_request(&mut request).await.map(|(result, _)| result)
    }

    /// Run every phase against an existing request.
    ///
    /// Also reports how the pass ended so callers can log or assert on it.
    ///
    /// # Errors
    ///
    /// Returns the first phase failure, wrapped with the request key and the
    /// phase reconciliation stage.
    pub async fn run_request(
        &self,
        request: &mut Request<W>,
    ) -> Result<(ReconcileResult, Halt), ReconcileError> {
        for phase in &self.phases {
            let id = phase.id();
            let span = request.span.clone();
            logging::log_phase_start(&request.key, id);
            let started = Instant::now();

            let outcome = phase.run(request).instrument(span).await;
            let elapsed = started.elapsed().as_millis();

            let result = wrap(&request.key, PHASE_RECONCILIATION_STAGE, outcome).inspect_err(
                |err| logging::log_phase_error(&err.key, id, &err.source.to_string(), elapsed),
            )?;
            logging::log_phase_complete(&request.key, id, elapsed);

            if result.is_requeue() {
                logging::log_phase_requeue(&request.key, id, result.requeue_delay());
                return Ok((result, Halt::Requeue));
            }
            if request.is_complete() {
                return Ok((ReconcileResult::no_requeue(), Halt::Completed));
            }
        }

        Ok((ReconcileResult::no_requeue(), Halt::Completed))
    }
}
