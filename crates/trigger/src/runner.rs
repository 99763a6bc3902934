//! The Job Runner port.
//!
//! The runner is the external engine that provisions a container, runs it,
//! and tracks it to completion. This crate only defines what the gateway
//! needs from it; the `runner` crate supplies an HTTP implementation and tests
//! supply in-memory stubs.
//!
//! Submitting and awaiting completion are separate operations, so a caller
//! that only schedules never holds anything tied to the job's completion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::ExecutionId;
use crate::request::JobRequest;

/// The runner's acknowledgement that a job was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionHandle {
    pub execution_id: ExecutionId,
    /// Where the execution's logs can be inspected.
    pub log_url: String,
}

/// Terminal result of a job that was run to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub execution_id: ExecutionId,
    pub log_url: String,
    /// Structured output the job produced, if any.
    pub json_output: Option<serde_json::Value>,
    pub succeeded: bool,
}

/// The runner could not accept, or report on, a job.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The runner could not be reached.
    #[error("Job runner unavailable: {0}")]
    Transport(String),

    /// The runner answered with a non-success status.
    #[error("Job runner unavailable: status {status}: {message}")]
    Status {
        /// HTTP status code returned by the runner.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The runner answered with something that is not a valid response.
    #[error("Job runner unavailable: unexpected response: {0}")]
    Protocol(String),
}

/// Launches jobs.
///
/// Implementations must be shareable across concurrently running requests.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Submits `request` and returns as soon as the runner has accepted it.
    ///
    /// Must not wait for, or register interest in, the job's completion.
    async fn schedule(&self, request: &JobRequest) -> Result<ExecutionHandle, RunnerError>;

    /// Submits `request` and waits until the job reaches a terminal state.
    ///
    /// A job that ran but did not succeed is reported through
    /// [`DispatchOutcome::succeeded`], not as an error.
    async fn run(&self, request: &JobRequest) -> Result<DispatchOutcome, RunnerError>;
}
