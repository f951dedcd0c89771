//! Backend tests against an in-memory SAPI service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anneal_adapter_dwave::{DwaveBackend, DwaveConfig, DwaveError, DwaveResult, Transport};
use anneal_hal::{Annealer, HalError, JobId, JobStatus};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rustc_hash::FxHashMap;
use serde_json::{Value, json};

const SOLVER: &str = "DW_2000Q_VFYC_1";

/// Replays canned SAPI responses and records every request.
struct MockSapi {
    solvers: String,
    submit: String,
    problems: Mutex<Vec<String>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<String>>,
}

impl MockSapi {
    fn new(problem_responses: Vec<Value>) -> Arc<Self> {
        let couplers: Vec<[u32; 2]> = (0..8u32)
            .flat_map(|a| ((a + 1)..8).map(move |b| [a, b]))
            .collect();
        let solvers = json!([
            {
                "id": SOLVER,
                "description": "test annealer",
                "properties": {
                    "num_qubits": 8,
                    "couplers": couplers,
                    "j_range": [-1.0, 1.0],
                    "h_range": [-2.0, 2.0]
                }
            },
            { "id": "small", "properties": { "num_qubits": 2, "couplers": [[0, 1]] } }
        ]);
        let mut problems: Vec<String> = problem_responses.iter().map(Value::to_string).collect();
        problems.reverse();

        Arc::new(Self {
            solvers: solvers.to_string(),
            submit: json!([{ "id": "prob-1", "status": "PENDING" }]).to_string(),
            problems: Mutex::new(problems),
            gets: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
        })
    }

    fn problem_gets(&self) -> usize {
        self.gets
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with("/sapi/problems/"))
            .count()
    }

    fn posted(&self) -> Vec<Value> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|b| serde_json::from_str(b).unwrap())
            .collect()
    }
}

#[async_trait]
impl Transport for MockSapi {
    async fn get(&self, path: &str) -> DwaveResult<String> {
        self.gets.lock().unwrap().push(path.to_string());
        if path == "/sapi/solvers/remote" {
            return Ok(self.solvers.clone());
        }
        match path.strip_prefix("/sapi/problems/") {
            Some("prob-1") => {
                let body = self.problems.lock().unwrap().pop().ok_or_else(|| {
                    DwaveError::ApiError {
                        status: 500,
                        message: "no more responses".into(),
                    }
                })?;
                let response: Value = serde_json::from_str(&body).unwrap();
                match response["http_status"].as_u64() {
                    Some(status) => Err(DwaveError::ApiError {
                        status: status as u16,
                        message: response["message"].as_str().unwrap_or_default().into(),
                    }),
                    None => Ok(body),
                }
            }
            Some(other) => Err(DwaveError::JobNotFound(other.to_string())),
            None => Err(DwaveError::ApiError {
                status: 404,
                message: path.to_string(),
            }),
        }
    }

    async fn post(&self, path: &str, body: String) -> DwaveResult<String> {
        assert_eq!(path, "/sapi/problems");
        self.posts.lock().unwrap().push(body);
        Ok(self.submit.clone())
    }
}

fn pending() -> Value {
    json!({ "id": "prob-1", "status": "PENDING" })
}

/// A failed request instead of a problem body.
fn http_error(status: u16, message: &str) -> Value {
    json!({ "http_status": status, "message": message })
}

/// Two samples over five active variables, one padding byte each.
fn completed() -> Value {
    json!({
        "id": "prob-1",
        "status": "COMPLETED",
        "answer": {
            "format": "qp",
            "solutions": BASE64.encode([0b1011_0000u8, 0b0100_1111]),
            "energies": [-3.5, -1.0],
            "num_occurrences": [60, 40],
            "active_variables": [0, 1, 2, 4, 5]
        }
    })
}

async fn connect(mock: &Arc<MockSapi>, config: DwaveConfig) -> DwaveBackend {
    DwaveBackend::with_transport(config, mock.clone()).await.unwrap()
}

fn ising_source() -> &'static str {
    r"
        __qpu__ pair() {
            0 0 1.5;
            1 1 -2.0;
            0 1 0.5;
        }
    "
}

#[tokio::test(start_paused = true)]
async fn test_polls_until_completed_then_decodes() {
    let mock = MockSapi::new(vec![pending(), pending(), completed(), completed()]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();

    let buffer = backend.execute(&kernels, None).await.unwrap();

    assert_eq!(mock.problem_gets(), 3);
    assert_eq!(buffer.solver, SOLVER);
    assert_eq!(buffer.job_id, Some(JobId::new("prob-1")));
    assert_eq!(buffer.active_variables, vec![0, 1, 2, 4, 5]);
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.samples[0].bits, vec![1, 0, 1, 1, 0]);
    assert_eq!(buffer.samples[1].bits, vec![0, 1, 0, 0, 1]);
    assert_eq!(buffer.samples[0].energy, -3.5);
    assert_eq!(buffer.samples[1].occurrences, 40);
    assert_eq!(buffer.total_reads(), 100);

    let embedding = buffer.embedding.unwrap();
    assert_eq!(embedding.chain(0), Some(&[0][..]));
    assert_eq!(embedding.chain(1), Some(&[1][..]));

    assert!(buffer.schedule.is_none());

    // The cached result was handed out once; asking again refetches.
    let again = backend.result(&JobId::new("prob-1")).await.unwrap();
    assert_eq!(again.len(), 2);
    assert!(again.embedding.is_some());
    assert_eq!(mock.problem_gets(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_while_polling_is_not_retried() {
    let mock = MockSapi::new(vec![pending(), http_error(502, "bad gateway"), completed()]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();

    let err = backend.execute(&kernels, None).await.unwrap_err();
    assert!(matches!(err, HalError::Transport(ref msg) if msg.contains("502")));
    assert_eq!(mock.problem_gets(), 2);
}

#[tokio::test]
async fn test_submission_payload() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();

    let job_id = backend.submit(&kernels, None).await.unwrap();
    assert_eq!(job_id, JobId::new("prob-1"));

    let posts = mock.posted();
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0],
        json!([{
            "solver": SOLVER,
            "type": "ising",
            "data": "8 3\n0 0 1.5\n1 1 -2\n0 1 0.5",
            "params": { "num_reads": 100, "annealing_time": 20 }
        }])
    );
}

#[tokio::test]
async fn test_configured_reads_and_time() {
    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        num_reads: 1000,
        anneal_time: 5.0,
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();
    backend.submit(&kernels, None).await.unwrap();

    let posts = mock.posted();
    let params = &posts[0][0]["params"];
    assert_eq!(params["num_reads"], json!(1000));
    assert_eq!(params["annealing_time"], json!(5));
}

#[tokio::test]
async fn test_out_of_range_weights_are_normalized() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels =
        DwaveBackend::compile("__qpu__ k() { 0 1 4.0; 1 2 -2.0; 0 0 -6.0; 2 2 3.0; }").unwrap();
    backend.submit(&kernels, None).await.unwrap();

    assert_eq!(
        mock.posted()[0][0]["data"],
        json!("8 4\n0 1 1\n1 2 -0.5\n0 0 -1\n2 2 0.5")
    );
}

#[tokio::test]
async fn test_bias_normalization_can_be_disabled() {
    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        normalize_biases: false,
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    let kernels = DwaveBackend::compile("__qpu__ k() { 0 0 -6.0; 0 1 0.5; }").unwrap();
    backend.submit(&kernels, None).await.unwrap();

    assert_eq!(mock.posted()[0][0]["data"], json!("8 2\n0 0 -6\n0 1 0.5"));
}

#[tokio::test]
async fn test_anneal_directive_schedule_travels_with_result() {
    let mock = MockSapi::new(vec![completed()]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile(
        r"
        __qpu__ paused(double ta) {
            0 1 -1.0;
            anneal ta 40 60;
        }
        ",
    )
    .unwrap();
    let mut bindings = FxHashMap::default();
    bindings.insert("ta".to_string(), 100.0);
    let buffer = backend.execute(&kernels, Some(&bindings)).await.unwrap();

    let posts = mock.posted();
    assert_eq!(
        posts[0][0]["params"],
        json!({ "num_reads": 100, "annealing_time": 20 })
    );
    assert_eq!(
        buffer.schedule.unwrap().to_pairs(),
        vec![[0.0, 0.0], [40.0, 0.4], [60.0, 0.4], [100.0, 1.0]]
    );
}

#[tokio::test]
async fn test_reverse_anneal_keeps_annealing_time() {
    let mock = MockSapi::new(vec![completed()]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels =
        DwaveBackend::compile("__qpu__ k() { 0 1 -1.0; anneal 10 10 10 reverse; }").unwrap();
    let buffer = backend.execute(&kernels, None).await.unwrap();

    let posts = mock.posted();
    let params = &posts[0][0]["params"];
    assert_eq!(params, &json!({ "num_reads": 100, "annealing_time": 20 }));
    assert!(params.get("anneal_schedule").is_none());
    assert_eq!(
        buffer.schedule.unwrap().to_pairs(),
        vec![[0.0, 1.0], [10.0, 0.0]]
    );
}

#[tokio::test]
async fn test_chain_couplers_are_normalized() {
    let path = std::env::temp_dir().join(format!("dwave-chains-{}.txt", uuid::Uuid::new_v4()));
    std::fs::write(&path, "0: 0 2\n1: 1\n").unwrap();

    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        load_embedding: Some(path.clone()),
        chain_strength: 3.0,
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    let kernels = DwaveBackend::compile("__qpu__ k() { 0 1 4.0; }").unwrap();
    backend.submit(&kernels, None).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(
        mock.posted()[0][0]["data"],
        json!("8 2\n0 1 1\n0 2 -0.75")
    );
}

#[tokio::test]
async fn test_kernel_without_terms_is_configuration_error() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile("__qpu__ empty() { anneal 20 0 0; }").unwrap();

    let err = backend.submit(&kernels, None).await.unwrap_err();
    assert!(matches!(err, HalError::Configuration(ref msg) if msg.contains("empty")));
    assert!(mock.posted().is_empty());
}

#[tokio::test]
async fn test_two_kernels_unsupported() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile(
        "__qpu__ a() { 0 1 1.0; } __qpu__ b() { 0 1 -1.0; }",
    )
    .unwrap();

    let err = backend.submit(&kernels, None).await.unwrap_err();
    assert!(matches!(err, HalError::UnsupportedBatch(2)));
    assert!(mock.posted().is_empty());
}

#[tokio::test]
async fn test_execute_source_runs_last_kernel() {
    let mock = MockSapi::new(vec![completed()]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let buffer = backend
        .execute_source(
            "__qpu__ base() { 0 1 0.25; } __qpu__ main() { base(); 1 1 1.0; }",
            None,
        )
        .await
        .unwrap();
    assert_eq!(buffer.len(), 2);
    assert_eq!(
        mock.posted()[0][0]["data"],
        json!("8 2\n0 1 0.25\n1 1 1")
    );
}

#[tokio::test]
async fn test_unbound_parameter_rejected() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile("__qpu__ k(double j) { 0 1 j; }").unwrap();

    let err = backend.submit(&kernels, None).await.unwrap_err();
    assert!(matches!(err, HalError::Compile(ref msg) if msg.contains("'j'")));
}

#[tokio::test]
async fn test_unknown_solver_is_configuration_error() {
    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        solver: "Advantage_system9.9".into(),
        ..DwaveConfig::default()
    };
    let err = DwaveBackend::with_transport(config, mock.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::Configuration(ref msg) if msg.contains("Advantage_system9.9")));
}

#[tokio::test]
async fn test_solver_catalog() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    assert_eq!(backend.solvers().names(), vec![SOLVER, "small"]);
    assert_eq!(backend.solver().num_qubits(), 8);
    assert!(backend.solvers().get("small").unwrap().j_range.is_none());
}

#[tokio::test]
async fn test_problem_too_large_for_trivial_embedding() {
    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        solver: "small".into(),
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    let kernels = DwaveBackend::compile("__qpu__ k() { 0 2 1.0; }").unwrap();
    let err = backend.submit(&kernels, None).await.unwrap_err();
    assert!(matches!(err, HalError::Embedding(_)));
}

#[tokio::test(start_paused = true)]
async fn test_failed_problem() {
    let mock = MockSapi::new(vec![
        pending(),
        json!({ "id": "prob-1", "status": "FAILED", "error_message": "h out of range" }),
    ]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();

    let err = backend.execute(&kernels, None).await.unwrap_err();
    assert!(matches!(
        err,
        HalError::RemoteExecution { ref status } if status == "FAILED: h out of range"
    ));
    assert_eq!(mock.problem_gets(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_poll_timeout() {
    let mock = MockSapi::new(vec![pending(); 64]);
    let config = DwaveConfig {
        poll_interval_ms: 300,
        poll_timeout_secs: Some(1),
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();

    let err = backend.execute(&kernels, None).await.unwrap_err();
    assert!(matches!(err, HalError::Timeout(ref id) if id == "prob-1"));
    assert_eq!(mock.problem_gets(), 4);
}

#[tokio::test]
async fn test_truncated_answer_is_decode_error() {
    let mut truncated = completed();
    truncated["answer"]["solutions"] = json!(BASE64.encode([0b1011_0000u8]));
    let mock = MockSapi::new(vec![truncated]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();

    let job_id = backend.submit(&kernels, None).await.unwrap();
    let err = backend.status(&job_id).await.unwrap_err();
    assert!(matches!(err, HalError::Decode(_)));
}

#[tokio::test]
async fn test_status_of_unknown_problem() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let err = backend.status(&JobId::new("nope")).await.unwrap_err();
    assert!(matches!(err, HalError::JobNotFound(ref id) if id == "nope"));
}

#[tokio::test]
async fn test_problem_id_outside_one_path_segment() {
    let mock = MockSapi::new(vec![]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let err = backend
        .status(&JobId::new("../solvers/remote"))
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::JobNotFound(_)));
    assert_eq!(mock.problem_gets(), 0);
}

#[tokio::test]
async fn test_status_reports_remote_state() {
    let mock = MockSapi::new(vec![
        json!({ "id": "prob-1", "status": "IN_PROGRESS" }),
        json!({ "id": "prob-1", "status": "CANCELLED" }),
    ]);
    let backend = connect(&mock, DwaveConfig::default()).await;
    let job_id = JobId::new("prob-1");
    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::InProgress);
    assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Cancelled);
}

#[tokio::test]
async fn test_persist_then_load_embedding() {
    let path = std::env::temp_dir().join(format!("dwave-embedding-{}.txt", uuid::Uuid::new_v4()));

    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        persist_embedding: Some(path.clone()),
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();
    backend.submit(&kernels, None).await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "0: 0\n1: 1\n");

    // A loaded embedding with moved chains renumbers the problem lines.
    std::fs::write(&path, "0: 6\n1: 3\n").unwrap();
    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        load_embedding: Some(path.clone()),
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    backend.submit(&kernels, None).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(
        mock.posted()[0][0]["data"],
        json!("8 3\n6 6 1.5\n3 3 -2\n6 3 0.5")
    );
}

#[tokio::test]
async fn test_unknown_embedding_algorithm() {
    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        embedding_algorithm: "minorminer".into(),
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    let kernels = DwaveBackend::compile(ising_source()).unwrap();
    let err = backend.submit(&kernels, None).await.unwrap_err();
    assert!(matches!(err, HalError::Configuration(_)));
}

#[tokio::test]
async fn test_poll_settings_from_config() {
    let mock = MockSapi::new(vec![]);
    let config = DwaveConfig {
        poll_interval_ms: 20,
        poll_timeout_secs: Some(3),
        ..DwaveConfig::default()
    };
    let backend = connect(&mock, config).await;
    assert_eq!(backend.poll_interval(), Duration::from_millis(20));
    assert_eq!(backend.poll_timeout(), Some(Duration::from_secs(3)));
    assert_eq!(backend.name(), "dwave");
}
