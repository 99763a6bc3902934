use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::Instrument;
use trigger::{
    build_job_request, extract, DispatchMode, ExecutionId, JobName, JobRequest, Namespace,
    TriggerContext,
};

use crate::error::GatewayError;
use crate::AppState;

/// Successful answer of both trigger endpoints.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: &'static str,
    pub execution_id: ExecutionId,
    pub log_url: String,
}

pub async fn hello() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

pub async fn schedule(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<TriggerResponse>, GatewayError> {
    let context = trigger_context(namespace, name, DispatchMode::Schedule)?;
    let span = request_span(&context);

    async move {
        let request = job_request(&state, &context, &body)?;
        let handle = state.dispatcher.schedule(&request).await?;

        Ok::<_, GatewayError>(Json(TriggerResponse {
            message: "job scheduled",
            execution_id: handle.execution_id,
            log_url: handle.log_url,
        }))
    }
    .instrument(span)
    .await
}

pub async fn run(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<TriggerResponse>, GatewayError> {
    let context = trigger_context(namespace, name, DispatchMode::Run)?;
    let span = request_span(&context);

    async move {
        let request = job_request(&state, &context, &body)?;
        let outcome = state.dispatcher.run(&request).await?;

        Ok::<_, GatewayError>(Json(TriggerResponse {
            message: "job run successfully",
            execution_id: outcome.execution_id,
            log_url: outcome.log_url,
        }))
    }
    .instrument(span)
    .await
}

fn trigger_context(
    namespace: String,
    name: String,
    mode: DispatchMode,
) -> Result<TriggerContext, GatewayError> {
    let namespace =
        Namespace::new(namespace).ok_or(GatewayError::EmptyRouteParameter("namespace"))?;
    let name = JobName::new(name).ok_or(GatewayError::EmptyRouteParameter("name"))?;
    Ok(TriggerContext::new(namespace, name, mode))
}

fn request_span(context: &TriggerContext) -> tracing::Span {
    info_span!(
        "trigger",
        trigger_id = %context.trigger_id,
        mode = %context.mode,
        namespace = %context.namespace,
        name = %context.name,
    )
}

/// Parses the body, extracts the object reference and builds the job request.
fn job_request(
    state: &AppState,
    context: &TriggerContext,
    body: &[u8],
) -> Result<JobRequest, GatewayError> {
    let envelope: Value = serde_json::from_slice(body).map_err(|e| {
        debug!("body is not JSON: {}", e);
        GatewayError::InvalidJson
    })?;
    let input = extract(&envelope)?;
    info!(input = %input, "received storage event");

    Ok(build_job_request(input, context, &state.defaults))
}
