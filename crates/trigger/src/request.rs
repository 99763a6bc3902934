//! Normalized job-launch requests.
//!
//! A [`JobRequest`] is built once per inbound event from three sources: the
//! object reference extracted from the event, the route the event arrived on
//! ([`TriggerContext`]), and the process-wide [`JobDefaults`]. Building is a
//! pure function; nothing here touches the network or the environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::JobDefaults;
use crate::identifiers::{JobName, Namespace, TriggerId};
use crate::types::{ObjectReference, Placement, ResourceSpec, Timestamp};

/// Job variable that carries the `gs://bucket/path` of the triggering object.
///
/// Always present in [`JobRequest::env`] and never overridable by configured
/// extra variables.
pub const INPUT_PATH_VAR: &str = "INPUT_PATH";

/// How the gateway hands a job to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Submit and return as soon as the runner accepts the job.
    Schedule,
    /// Submit and wait for the job to reach a terminal state.
    Run,
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchMode::Schedule => write!(f, "schedule"),
            DispatchMode::Run => write!(f, "run"),
        }
    }
}

/// Per-request facts that are not part of the event body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    pub trigger_id: TriggerId,
    pub namespace: Namespace,
    pub name: JobName,
    pub mode: DispatchMode,
    pub received_at: Timestamp,
}

impl TriggerContext {
    /// Context for a request that arrived just now.
    pub fn new(namespace: Namespace, name: JobName, mode: DispatchMode) -> Self {
        Self {
            trigger_id: TriggerId::new_random(),
            namespace,
            name,
            mode,
            received_at: Timestamp::now(),
        }
    }
}

/// Everything the Job Runner needs to launch one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub trigger_id: TriggerId,
    pub triggered_at: Timestamp,
    pub namespace: Namespace,
    pub name: JobName,
    pub mode: DispatchMode,
    pub container_image: String,
    /// Variables set inside the job container. Always contains [`INPUT_PATH_VAR`].
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub resources: ResourceSpec,
    pub placement: Placement,
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub service_account: Option<String>,
    pub input: ObjectReference,
}

impl JobRequest {
    /// Returns the `gs://` URI of the triggering object.
    pub fn input_path(&self) -> String {
        self.input.to_uri()
    }
}

/// Builds the job request for `input`.
///
/// Configured extra variables are applied first; [`INPUT_PATH_VAR`] is
/// written last so it always wins over a configured variable of the same name.
pub fn build_job_request(
    input: ObjectReference,
    context: &TriggerContext,
    defaults: &JobDefaults,
) -> JobRequest {
    let mut env = defaults.extra_env.clone();
    env.insert(INPUT_PATH_VAR.to_owned(), input.to_uri());

    JobRequest {
        trigger_id: context.trigger_id,
        triggered_at: context.received_at,
        namespace: context.namespace.clone(),
        name: context.name.clone(),
        mode: context.mode,
        container_image: defaults.container_image.clone(),
        env,
        labels: defaults.labels.clone(),
        resources: defaults.resources.clone(),
        placement: defaults.placement.clone(),
        timeout_seconds: defaults.timeout_seconds,
        max_attempts: defaults.max_attempts,
        service_account: defaults.service_account.clone(),
        input,
    }
}
