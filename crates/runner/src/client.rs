use async_trait::async_trait;
use serde::de::DeserializeOwned;
use trigger::{
    DispatchMode, DispatchOutcome, ExecutionHandle, ExecutionId, JobRequest, JobRunner,
    RunnerError,
};
use url::Url;

use crate::config::RunnerConfig;
use crate::wire::{ExecutionState, ExecutionStatus, SubmitBody, SubmitResponse};

/// Status polls that may fail back to back before `run` gives up on the runner.
pub const MAX_CONSECUTIVE_POLL_FAILURES: u32 = 5;

/// [`JobRunner`] backed by the job-runner HTTP API.
#[derive(Debug, Clone)]
pub struct HttpJobRunner {
    config: RunnerConfig,
    client: reqwest::Client,
}

impl HttpJobRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn submit(
        &self,
        mode: DispatchMode,
        request: &JobRequest,
    ) -> Result<SubmitResponse, RunnerError> {
        let url = self.endpoint(&["v1", "executions"])?;
        let body = SubmitBody { mode, job: request };
        debug!(%url, %mode, trigger_id = %request.trigger_id, "submitting job");
        send_json(self.client.post(url).json(&body)).await
    }

    async fn status(&self, execution_id: &ExecutionId) -> Result<ExecutionStatus, RunnerError> {
        let url = self.endpoint(&["v1", "executions", execution_id.as_str()])?;
        send_json(self.client.get(url)).await
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RunnerError> {
        let base = &self.config.base_url;
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| RunnerError::Protocol(format!("runner URL {base} cannot take a path")))?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }
}

#[async_trait]
impl JobRunner for HttpJobRunner {
    async fn schedule(&self, request: &JobRequest) -> Result<ExecutionHandle, RunnerError> {
        let accepted = self.submit(DispatchMode::Schedule, request).await?;
        Ok(ExecutionHandle {
            execution_id: accepted.execution_id,
            log_url: accepted.log_url,
        })
    }

    async fn run(&self, request: &JobRequest) -> Result<DispatchOutcome, RunnerError> {
        let accepted = self.submit(DispatchMode::Run, request).await?;
        let mut failures = 0;

        loop {
            tokio::time::sleep(self.config.poll_interval).await;
            let status = match self.status(&accepted.execution_id).await {
                Ok(status) => {
                    failures = 0;
                    status
                }
                Err(error) => {
                    failures += 1;
                    if failures >= MAX_CONSECUTIVE_POLL_FAILURES {
                        return Err(error);
                    }
                    warn!(
                        execution_id = %accepted.execution_id,
                        failures,
                        %error,
                        "status poll failed, polling again"
                    );
                    continue;
                }
            };
            trace!(execution_id = %status.execution_id, state = ?status.state, "polled execution");

            if status.state.is_terminal() {
                return Ok(DispatchOutcome {
                    execution_id: status.execution_id,
                    log_url: status.log_url,
                    json_output: status.json_output,
                    succeeded: status.state == ExecutionState::Succeeded,
                });
            }
        }
    }
}

async fn send_json<T>(request: reqwest::RequestBuilder) -> Result<T, RunnerError>
where
    T: DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|e| RunnerError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = match response.text().await {
            Ok(body) if !body.is_empty() => body,
            _ => status.canonical_reason().unwrap_or("no reason").to_owned(),
        };
        return Err(RunnerError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| RunnerError::Transport(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| RunnerError::Protocol(e.to_string()))
}
