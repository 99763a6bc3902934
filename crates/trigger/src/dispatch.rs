//! Mode selection and outcome mapping on top of a [`JobRunner`].
//!
//! The dispatcher owns no execution concern of its own: scheduling, polling,
//! log capture and attempt retries all belong to the runner. It only decides
//! which runner operation to call and what the result means for the caller.

use std::sync::Arc;

use crate::errors::DispatchError;
use crate::request::JobRequest;
use crate::runner::{DispatchOutcome, ExecutionHandle, JobRunner};

/// Hands job requests to a [`JobRunner`].
#[derive(Clone)]
pub struct Dispatcher {
    runner: Arc<dyn JobRunner>,
}

impl Dispatcher {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self { runner }
    }

    /// Submits `request` without waiting for the job to finish.
    ///
    /// Only the submission acknowledgement is returned; nothing is kept that
    /// would be notified when the job completes.
    pub async fn schedule(&self, request: &JobRequest) -> Result<ExecutionHandle, DispatchError> {
        let handle = self.runner.schedule(request).await?;
        info!(
            execution_id = %handle.execution_id,
            log_url = %handle.log_url,
            input = %request.input,
            "job scheduled"
        );
        Ok(handle)
    }

    /// Runs `request` to completion.
    ///
    /// Fails with [`DispatchError::JobFailed`] when the job does not succeed.
    /// On success, structured output (if any) is emitted as a log event.
    pub async fn run(&self, request: &JobRequest) -> Result<DispatchOutcome, DispatchError> {
        let outcome = self.runner.run(request).await?;

        if !outcome.succeeded {
            warn!(
                execution_id = %outcome.execution_id,
                log_url = %outcome.log_url,
                "job failed"
            );
            return Err(DispatchError::JobFailed {
                log_url: outcome.log_url,
            });
        }

        info!(
            execution_id = %outcome.execution_id,
            log_url = %outcome.log_url,
            input = %request.input,
            "job run successfully"
        );
        if let Some(output) = &outcome.json_output {
            info!(
                execution_id = %outcome.execution_id,
                json_output = %output,
                "job output"
            );
        }
        Ok(outcome)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
