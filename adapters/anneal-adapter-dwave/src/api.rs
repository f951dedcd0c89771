//! D-Wave SAPI REST client.
//!
//! ## Flow
//!
//! 1. `GET /sapi/solvers/remote` → solver catalog
//! 2. `POST /sapi/problems` with a one-element problem array → `[{ id, status }]`
//! 3. Poll `GET /sapi/problems/{id}` until `COMPLETED`
//! 4. Decode `answer` (see [`crate::decode`])
//!
//! HTTP goes through the [`Transport`] trait so the client can run against
//! an in-memory service in tests.

use std::sync::Arc;

use anneal_hal::{HardwareTopology, SolverDescriptor};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{DwaveError, DwaveResult};

/// Solver catalog endpoint.
pub const SOLVERS_PATH: &str = "/sapi/solvers/remote";

/// Problem submission endpoint.
pub const PROBLEMS_PATH: &str = "/sapi/problems";

/// Request function used by [`SapiClient`].
///
/// Implementations return the response body of a successful request. No
/// retries are performed at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET` a path relative to the service root.
    async fn get(&self, path: &str) -> DwaveResult<String>;

    /// `POST` a JSON body to a path relative to the service root.
    async fn post(&self, path: &str, body: String) -> DwaveResult<String>;
}

// ─── HTTP transport ─────────────────────────────────────────────────

/// [`Transport`] over HTTPS.
#[derive(Clone)]
pub struct HttpTransport {
    /// HTTP client.
    client: Client,
    /// Service root, without trailing slash.
    base_url: String,
    /// SAPI token, sent as `X-Auth-Token`.
    token: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for `base_url` authenticated with `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> DwaveResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DwaveError::MissingToken);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(DwaveError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build the full URL for a path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Return the body of a successful response, map failures to errors.
    async fn handle_response(&self, response: reqwest::Response) -> DwaveResult<String> {
        let status = response.status();

        if status.is_success() {
            Ok(response.text().await?)
        } else {
            let message = response.text().await.unwrap_or_default();

            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(DwaveError::AuthFailed(message))
                }
                StatusCode::NOT_FOUND => Err(DwaveError::JobNotFound(message)),
                _ => Err(DwaveError::ApiError {
                    status: status.as_u16(),
                    message,
                }),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> DwaveResult<String> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .header("Content-Type", "application/json")
            .header("Accept", "*/*")
            .send()
            .await?;

        self.handle_response(response).await
    }

    #[instrument(skip(self, body))]
    async fn post(&self, path: &str, body: String) -> DwaveResult<String> {
        let url = self.url(path);
        debug!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(&url)
            .header("X-Auth-Token", &self.token)
            .header("Content-Type", "application/json")
            .header("Accept", "*/*")
            .body(body)
            .send()
            .await?;

        self.handle_response(response).await
    }
}

// ─── SAPI client ────────────────────────────────────────────────────

/// Typed access to the SAPI endpoints.
#[derive(Clone)]
pub struct SapiClient {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for SapiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SapiClient").finish_non_exhaustive()
    }
}

impl SapiClient {
    /// Create a client on top of a transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch the solver catalog.
    #[instrument(skip(self))]
    pub async fn list_solvers(&self) -> DwaveResult<Vec<SolverInfo>> {
        let body = self.transport.get(SOLVERS_PATH).await?;
        let solvers: Vec<SolverInfo> = serde_json::from_str(&body)?;
        debug!("Solver catalog lists {} solvers", solvers.len());
        Ok(solvers)
    }

    /// Submit one problem, returning its initial status entry.
    #[instrument(skip(self, problem), fields(solver = %problem.solver))]
    pub async fn submit_problem(&self, problem: &ProblemSubmission) -> DwaveResult<ProblemStatus> {
        let body = serde_json::to_string(&[problem])?;
        let response = self.transport.post(PROBLEMS_PATH, body).await?;
        let entries: Vec<ProblemStatus> = serde_json::from_str(&response)?;
        let entry = entries.into_iter().next().ok_or_else(|| {
            DwaveError::UnexpectedResponse("submission response lists no problem".into())
        })?;
        if !is_problem_id(&entry.id) {
            return Err(DwaveError::UnexpectedResponse(format!(
                "invalid problem id '{}'",
                entry.id
            )));
        }
        Ok(entry)
    }

    /// Get the status (and answer, once completed) of a problem.
    ///
    /// Ids that cannot name a problem are reported as not found without
    /// sending a request.
    #[instrument(skip(self))]
    pub async fn get_problem(&self, problem_id: &str) -> DwaveResult<ProblemStatus> {
        if !is_problem_id(problem_id) {
            return Err(DwaveError::JobNotFound(problem_id.to_string()));
        }
        let body = self
            .transport
            .get(&format!("{PROBLEMS_PATH}/{problem_id}"))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Problem ids are single path segments of ASCII letters, digits, `-` and `_`.
fn is_problem_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

// ─── Wire types ─────────────────────────────────────────────────────

/// One entry of the solver catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverInfo {
    /// Solver name.
    pub id: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Hardware properties.
    pub properties: SolverProperties,
}

/// Hardware properties of a solver.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverProperties {
    /// Number of hardware qubits.
    pub num_qubits: u32,
    /// Working couplers.
    #[serde(default)]
    pub couplers: Vec<[u32; 2]>,
    /// Allowed coupling strengths `[min, max]`.
    #[serde(default)]
    pub j_range: Option<Vec<f64>>,
    /// Allowed bias values `[min, max]`.
    #[serde(default)]
    pub h_range: Option<Vec<f64>>,
}

impl SolverInfo {
    /// Convert into the backend-neutral descriptor.
    ///
    /// Ranges that are not exactly two numbers are treated as absent.
    pub fn into_descriptor(self) -> SolverDescriptor {
        let couplers = self
            .properties
            .couplers
            .iter()
            .map(|[a, b]| (*a, *b))
            .collect();
        let topology = HardwareTopology::new(self.properties.num_qubits, couplers);

        let mut descriptor = SolverDescriptor::new(self.id.trim(), topology)
            .with_description(self.description);
        if let Some([min, max]) = self.properties.j_range.as_deref() {
            descriptor = descriptor.with_j_range(*min, *max);
        }
        if let Some([min, max]) = self.properties.h_range.as_deref() {
            descriptor = descriptor.with_h_range(*min, *max);
        }
        descriptor
    }
}

/// A problem as sent to `POST /sapi/problems`.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemSubmission {
    /// Target solver.
    pub solver: String,
    /// Problem type tag, always `"ising"`.
    #[serde(rename = "type")]
    pub problem_type: String,
    /// `"<qubits> <lines>\n<i> <j> <weight>\n..."`.
    pub data: String,
    /// Solver parameters.
    pub params: ProblemParams,
}

/// Solver parameters of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemParams {
    /// Reads per job.
    pub num_reads: u32,
    /// Anneal time in microseconds.
    pub annealing_time: serde_json::Number,
}

/// Status entry of a problem.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemStatus {
    /// Problem identifier.
    pub id: String,
    /// `PENDING`, `IN_PROGRESS`, `COMPLETED`, `FAILED` or `CANCELLED`.
    pub status: String,
    /// Failure reason reported with `FAILED`.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Packed answer, present once completed.
    #[serde(default)]
    pub answer: Option<Answer>,
}

/// Packed answer of a completed problem.
#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    /// Base64 packed sample bits.
    pub solutions: String,
    /// Energy per sample.
    pub energies: Vec<f64>,
    /// Occurrence count per sample.
    pub num_occurrences: Vec<i64>,
    /// Hardware qubits present in every sample.
    pub active_variables: Vec<u32>,
}
