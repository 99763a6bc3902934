//! JSON bodies exchanged with the job-runner service.

use serde::{Deserialize, Serialize};
use trigger::{DispatchMode, ExecutionId, JobRequest};

/// Body of `POST v1/executions`.
#[derive(Debug, Serialize)]
pub struct SubmitBody<'a> {
    pub mode: DispatchMode,
    pub job: &'a JobRequest,
}

/// Answer to `POST v1/executions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub execution_id: ExecutionId,
    pub log_url: String,
}

/// Lifecycle state reported by `GET v1/executions/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Succeeded | ExecutionState::Failed | ExecutionState::Cancelled
        )
    }
}

/// Answer to `GET v1/executions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionStatus {
    pub execution_id: ExecutionId,
    pub log_url: String,
    pub state: ExecutionState,
    #[serde(default)]
    pub json_output: Option<serde_json::Value>,
}
