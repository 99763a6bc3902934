use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use listener::{serve, AppState};
use rstest::rstest;
use serde_json::{json, Value};
use trigger::{
    DispatchOutcome, ExecutionHandle, ExecutionId, GatewayConfig, JobRequest, JobRunner,
    RunnerError,
};

const AUDIT_TYPE: &str = "type.googleapis.com/google.events.cloud.audit.v1.LogEntryData";

/// Records every request it receives and answers with fixed results.
#[derive(Default)]
struct RecordingRunner {
    succeed: bool,
    hang_on_run: bool,
    requests: Mutex<Vec<JobRequest>>,
}

impl RecordingRunner {
    fn succeeding() -> Self {
        Self {
            succeed: true,
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self::default()
    }

    fn never_completing() -> Self {
        Self {
            hang_on_run: true,
            ..Self::default()
        }
    }

    fn last_request(&self) -> JobRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl JobRunner for RecordingRunner {
    async fn schedule(&self, request: &JobRequest) -> Result<ExecutionHandle, RunnerError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(ExecutionHandle {
            execution_id: ExecutionId::new("exec-scheduled").unwrap(),
            log_url: "https://logs.example/exec-scheduled".to_owned(),
        })
    }

    async fn run(&self, request: &JobRequest) -> Result<DispatchOutcome, RunnerError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.hang_on_run {
            std::future::pending::<()>().await;
        }
        Ok(DispatchOutcome {
            execution_id: ExecutionId::new("exec-run").unwrap(),
            log_url: "https://logs.example/exec-run".to_owned(),
            json_output: Some(json!({ "status": "done" })),
            succeeded: self.succeed,
        })
    }
}

struct Unreachable;

#[async_trait]
impl JobRunner for Unreachable {
    async fn schedule(&self, _request: &JobRequest) -> Result<ExecutionHandle, RunnerError> {
        Err(RunnerError::Transport("connection refused".to_owned()))
    }

    async fn run(&self, _request: &JobRequest) -> Result<DispatchOutcome, RunnerError> {
        Err(RunnerError::Transport("connection refused".to_owned()))
    }
}

fn config() -> GatewayConfig {
    GatewayConfig::from_vars([
        ("SMARTJOB_PROJECT", "my-project"),
        ("SMARTJOB_REGION", "europe-west1"),
        ("SMARTJOB_STAGING", "gs://staging"),
        ("SMARTJOB_DOCKER_IMAGE", "gcr.io/my-project/worker:1"),
        ("SMARTJOB_ADD_ENV_INPUT_PATH", "gs://configured/should-lose"),
    ])
    .unwrap()
}

async fn spawn_gateway(runner: Arc<dyn JobRunner>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let state = AppState::new(&config(), runner);
    tokio::spawn(async move {
        serve(listener, state, std::future::pending()).await.unwrap();
    });
    address
}

async fn post(address: SocketAddr, path: &str, body: impl Into<reqwest::Body>) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{address}{path}"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

fn finalized_event() -> Value {
    json!({
        "kind": "storage#object",
        "id": "my-bucket/folder/file.png/12345",
        "bucket": "my-bucket",
        "generation": "12345",
    })
}

fn audit_event(resource_name: &str) -> Value {
    json!({
        "@type": AUDIT_TYPE,
        "protoPayload": { "resourceName": resource_name },
    })
}

#[tokio::test]
async fn hello_world() {
    let address = spawn_gateway(Arc::new(RecordingRunner::succeeding())).await;

    let response = reqwest::get(format!("http://{address}/")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Hello World" }));
}

#[tokio::test]
async fn run_builds_input_path_from_finalized_event() {
    let runner = Arc::new(RecordingRunner::succeeding());
    let address = spawn_gateway(runner.clone()).await;

    let (status, body) = post(address, "/run/ns/job1", finalized_event().to_string()).await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "job run successfully");
    assert_eq!(body["execution_id"], "exec-run");
    assert_eq!(body["log_url"], "https://logs.example/exec-run");

    let request = runner.last_request();
    assert_eq!(request.input_path(), "gs://my-bucket/folder/file.png");
    assert_eq!(request.env["INPUT_PATH"], "gs://my-bucket/folder/file.png");
    assert_eq!(request.namespace.as_str(), "ns");
    assert_eq!(request.name.as_str(), "job1");
    assert_eq!(request.container_image, "gcr.io/my-project/worker:1");
}

#[tokio::test]
async fn run_rejects_event_without_bucket() {
    let runner = Arc::new(RecordingRunner::succeeding());
    let address = spawn_gateway(runner.clone()).await;
    let mut event = finalized_event();
    event.as_object_mut().unwrap().remove("bucket");

    let (status, body) = post(address, "/run/ns/job1", event.to_string()).await;

    assert_eq!(status, 400);
    assert!(body["detail"].as_str().unwrap().contains("bucket"));
    assert!(runner.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn schedule_returns_without_waiting_for_completion() {
    let runner = Arc::new(RecordingRunner::never_completing());
    let address = spawn_gateway(runner.clone()).await;
    let event = audit_event("projects/_/buckets/b2/objects/img.png");

    let (status, body) = tokio::time::timeout(
        Duration::from_secs(5),
        post(address, "/schedule/ns/job2", event.to_string()),
    )
    .await
    .expect("schedule must answer before the job completes");

    assert_eq!(status, 200);
    assert_eq!(body["message"], "job scheduled");
    assert!(!body["execution_id"].as_str().unwrap().is_empty());
    assert_eq!(body["log_url"], "https://logs.example/exec-scheduled");
    assert_eq!(runner.last_request().input_path(), "gs://b2/img.png");
}

#[tokio::test]
async fn failed_run_reports_log_url() {
    let address = spawn_gateway(Arc::new(RecordingRunner::failing())).await;

    let (status, body) = post(address, "/run/ns/job1", finalized_event().to_string()).await;

    assert_eq!(status, 500);
    assert_eq!(
        body["detail"],
        "Job launch failed, job_log_url=https://logs.example/exec-run"
    );
}

#[rstest]
#[case::schedule("/schedule/ns/job")]
#[case::run("/run/ns/job")]
#[tokio::test]
async fn malformed_json_is_rejected(#[case] path: &str) {
    let address = spawn_gateway(Arc::new(RecordingRunner::succeeding())).await;

    let (status, body) = post(address, path, "{not json").await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "detail": "Invalid JSON body" }));
}

#[rstest]
#[case::unknown_shape(json!({ "hello": "world" }), "unrecognized event shape")]
#[case::bad_prefix(audit_event("buckets/b/objects/x"), "projects/_/buckets/")]
#[case::bad_format(audit_event("projects/_/buckets/b"), "bad resourceName format")]
#[case::not_an_object(json!(["storage#object"]), "JSON object")]
#[tokio::test]
async fn schedule_names_the_violated_precondition(#[case] event: Value, #[case] expected: &str) {
    let address = spawn_gateway(Arc::new(RecordingRunner::succeeding())).await;

    let (status, body) = post(address, "/schedule/ns/job", event.to_string()).await;

    assert_eq!(status, 400);
    assert!(
        body["detail"].as_str().unwrap().contains(expected),
        "detail {:?} should mention {expected:?}",
        body["detail"]
    );
}

#[tokio::test]
async fn unreachable_runner_is_a_bad_gateway() {
    let address = spawn_gateway(Arc::new(Unreachable)).await;

    let (status, body) = post(address, "/schedule/ns/job", finalized_event().to_string()).await;

    assert_eq!(status, 502);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Job runner unavailable"));
}
