//! D-Wave backend implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use anneal_hal::{
    AnnealBuffer, Annealer, Embedding, EmbeddingAlgorithm, EmbeddingRegistry, HalError,
    HalResult, Job, JobId, JobStatus, SolverDescriptor, SolverRegistry,
};
use anneal_ir::{AnnealScheduleGenerator, Kernel, ScheduleTable};

use crate::api::{HttpTransport, ProblemStatus, SapiClient, SolverInfo, Transport};
use crate::config::DwaveConfig;
use crate::decode::decode_answer;
use crate::encode::{encode, single_kernel};
use crate::error::DwaveError;
use crate::normalize::normalize;
use crate::problem::IsingProblem;

/// Maximum number of cached jobs before evicting completed entries.
const MAX_CACHED_JOBS: usize = 10_000;

/// Job cache entry.
struct CachedJob {
    job: Job,
    embedding: Embedding,
    schedule: Option<ScheduleTable>,
    result: Option<AnnealBuffer>,
}

/// D-Wave annealing backend.
///
/// Construction fetches the solver catalog once; the configured solver must
/// be listed in it.
///
/// # Authentication
///
/// ```bash
/// export DWAVE_API_KEY="your-sapi-token"
/// export DWAVE_SOLVER="DW_2000Q_VFYC_1"   # optional
/// ```
///
/// # Example
///
/// ```ignore
/// use anneal_adapter_dwave::DwaveBackend;
/// use anneal_hal::Annealer;
///
/// let backend = DwaveBackend::from_env().await?;
/// let kernels = DwaveBackend::compile("__qpu__ k() { 0 0 1.0; 0 1 -1.0; }")?;
/// let buffer = backend.execute(&kernels, None).await?;
/// println!("{} samples", buffer.len());
/// ```
pub struct DwaveBackend {
    /// Backend configuration.
    config: DwaveConfig,
    /// SAPI client.
    client: SapiClient,
    /// Solver catalog, fixed after construction.
    solvers: Arc<SolverRegistry>,
    /// The configured solver.
    solver: SolverDescriptor,
    /// Embedding algorithms by name.
    embeddings: EmbeddingRegistry,
    /// Cached job information.
    jobs: Arc<Mutex<FxHashMap<String, CachedJob>>>,
}

impl std::fmt::Debug for DwaveBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DwaveBackend")
            .field("config", &self.config)
            .field("solver", &self.solver.name)
            .field("embeddings", &self.embeddings)
            .finish_non_exhaustive()
    }
}

impl DwaveBackend {
    /// Create a backend from `DWAVE_*` environment variables.
    pub async fn from_env() -> HalResult<Self> {
        let config = DwaveConfig::from_env()?;
        Self::new(config).await
    }

    /// Create a backend talking HTTPS to `config.url`.
    pub async fn new(config: DwaveConfig) -> HalResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.url, config.token()?)?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Create a backend on top of any transport.
    #[instrument(skip(config, transport), fields(solver = %config.solver))]
    pub async fn with_transport(
        config: DwaveConfig,
        transport: Arc<dyn Transport>,
    ) -> HalResult<Self> {
        config.validate()?;
        let client = SapiClient::new(transport);

        let catalog = client.list_solvers().await?;
        let solvers =
            SolverRegistry::from_descriptors(catalog.into_iter().map(SolverInfo::into_descriptor));
        let solver = solvers.get(&config.solver)?.clone();
        info!(
            "Using D-Wave solver {} ({} qubits, {} couplers)",
            solver.name,
            solver.num_qubits(),
            solver.topology.couplers().len()
        );

        Ok(Self {
            config,
            client,
            solvers: Arc::new(solvers),
            solver,
            embeddings: EmbeddingRegistry::new(),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        })
    }

    /// Register an additional embedding algorithm.
    pub fn with_embedding_algorithm(mut self, algorithm: impl EmbeddingAlgorithm + 'static) -> Self {
        self.embeddings.register(algorithm);
        self
    }

    /// The backend configuration.
    pub fn config(&self) -> &DwaveConfig {
        &self.config
    }

    /// The solver catalog fetched at construction.
    pub fn solvers(&self) -> &SolverRegistry {
        &self.solvers
    }

    /// The embedding algorithms available to this backend.
    pub fn embedding_registry(&self) -> &EmbeddingRegistry {
        &self.embeddings
    }

    /// Compile QMI source into kernels.
    pub fn compile(source: &str) -> HalResult<Vec<Kernel>> {
        anneal_qmi::compile(source)
            .map_err(DwaveError::from)
            .map_err(HalError::from)
    }

    /// Compile QMI source and run its last kernel.
    ///
    /// Earlier kernels in the source are only available as call targets.
    pub async fn execute_source(
        &self,
        source: &str,
        bindings: Option<&FxHashMap<String, f64>>,
    ) -> HalResult<AnnealBuffer> {
        let kernels = Self::compile(source)?;
        let entry = kernels.len().saturating_sub(1);
        self.execute(&kernels[entry..], bindings).await
    }

    /// Load, or compute and optionally persist, the embedding of a kernel.
    fn resolve_embedding(&self, kernel: &Kernel) -> HalResult<Embedding> {
        let topology = &self.solver.topology;

        let embedding = if let Some(ref path) = self.config.load_embedding {
            debug!("Loading embedding from {}", path.display());
            Embedding::load_file(path)?
        } else {
            let algorithm = self.embeddings.get(&self.config.embedding_algorithm)?;
            let embedding = algorithm.embed(kernel.graph(), topology)?;
            debug!(
                "Computed embedding with '{}': {} chains",
                algorithm.name(),
                embedding.len()
            );
            if let Some(ref path) = self.config.persist_embedding {
                embedding.persist_file(path)?;
                debug!("Persisted embedding to {}", path.display());
            }
            embedding
        };

        embedding.validate(kernel.graph(), topology)?;
        Ok(embedding)
    }

    /// Fetch a problem, mapping a 404 to `JobNotFound`.
    async fn fetch(&self, job_id: &JobId) -> HalResult<ProblemStatus> {
        self.client
            .get_problem(&job_id.0)
            .await
            .map_err(|e| match e {
                DwaveError::JobNotFound(_) => HalError::JobNotFound(job_id.0.clone()),
                other => other.into(),
            })
    }

    /// Decode the answer of a completed problem, attaching what the job
    /// cache knows about it.
    fn decode(
        &self,
        job_id: &JobId,
        problem: &ProblemStatus,
        cached: Option<&CachedJob>,
    ) -> HalResult<AnnealBuffer> {
        let answer = problem.answer.as_ref().ok_or_else(|| {
            HalError::Decode(format!("completed problem {job_id} carries no answer"))
        })?;
        let mut buffer = decode_answer(answer, &self.solver.name)?.with_job_id(job_id.clone());
        if let Some(cached) = cached {
            buffer = buffer.with_embedding(cached.embedding.clone());
            if let Some(ref schedule) = cached.schedule {
                buffer = buffer.with_schedule(schedule.clone());
            }
        }
        Ok(buffer)
    }
}

#[async_trait]
impl Annealer for DwaveBackend {
    fn name(&self) -> &str {
        "dwave"
    }

    fn solver(&self) -> &SolverDescriptor {
        &self.solver
    }

    #[instrument(skip(self, kernels, bindings))]
    async fn submit(
        &self,
        kernels: &[Kernel],
        bindings: Option<&FxHashMap<String, f64>>,
    ) -> HalResult<JobId> {
        let kernel = single_kernel(kernels)?;
        let kernel = match bindings {
            Some(bindings) => kernel.bind(bindings),
            None => kernel.clone(),
        };

        let schedule = match kernel.anneal() {
            Some(directive) => {
                let empty = FxHashMap::default();
                let table = AnnealScheduleGenerator::new()
                    .generate(directive, bindings.unwrap_or(&empty))?;
                debug!("Anneal schedule: {}", table);
                Some(table)
            }
            None => None,
        };

        let problem = IsingProblem::from_kernel(&kernel)?;
        if problem.is_empty() {
            return Err(HalError::Configuration(format!(
                "kernel '{}' has no terms; buffer size must be positive",
                kernel.name()
            )));
        }
        let embedding = self.resolve_embedding(&kernel)?;
        let mut hardware_problem =
            problem.embed(&embedding, &self.solver.topology, self.config.chain_strength)?;
        normalize(
            &mut hardware_problem,
            &self.solver,
            self.config.normalize_biases,
        );

        let submission = encode(
            &hardware_problem,
            &self.solver,
            self.config.num_reads,
            self.config.anneal_time,
        )?;

        info!(
            "Submitting kernel '{}' to {}: {} variables, {} lines, {} reads",
            kernel.name(),
            self.solver.name,
            embedding.len(),
            hardware_problem.len(),
            self.config.num_reads
        );

        let response = self.client.submit_problem(&submission).await?;
        let job_id = JobId::new(response.id.clone());
        let status = JobStatus::from_remote(&response.status, response.error_message.as_deref());
        info!("Job submitted: {} (status: {})", job_id, response.status);

        let job = Job::new(job_id.clone(), self.solver.name.clone(), self.config.num_reads)
            .with_status(status);
        {
            let mut jobs = self.jobs.lock().await;
            if jobs.len() >= MAX_CACHED_JOBS {
                jobs.retain(|_, j| !j.job.status.is_terminal());
            }
            jobs.insert(
                job_id.0.clone(),
                CachedJob {
                    job,
                    embedding,
                    schedule,
                    result: None,
                },
            );
        }

        Ok(job_id)
    }

    #[instrument(skip(self))]
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        {
            let jobs = self.jobs.lock().await;
            if let Some(cached) = jobs.get(&job_id.0) {
                if cached.result.is_some() {
                    return Ok(JobStatus::Completed);
                }
            }
        }

        let problem = self.fetch(job_id).await?;
        let status = JobStatus::from_remote(&problem.status, problem.error_message.as_deref());
        if let JobStatus::Unknown(ref s) = status {
            warn!("Problem {} reports unknown status '{}'", job_id, s);
        }

        let mut jobs = self.jobs.lock().await;
        let result = if status.is_success() {
            Some(self.decode(job_id, &problem, jobs.get(&job_id.0))?)
        } else {
            None
        };
        if let Some(cached) = jobs.get_mut(&job_id.0) {
            cached.job = cached.job.clone().with_status(status.clone());
            if result.is_some() {
                cached.result = result;
            }
        }

        Ok(status)
    }

    /// Hands out the decoded result and drops it from the job cache; a
    /// later call fetches the problem again.
    #[instrument(skip(self))]
    async fn result(&self, job_id: &JobId) -> HalResult<AnnealBuffer> {
        {
            let mut jobs = self.jobs.lock().await;
            if let Some(result) = jobs.get_mut(&job_id.0).and_then(|c| c.result.take()) {
                return Ok(result);
            }
        }

        let problem = self.fetch(job_id).await?;
        let status = JobStatus::from_remote(&problem.status, problem.error_message.as_deref());
        match status {
            JobStatus::Completed => {
                let mut jobs = self.jobs.lock().await;
                let buffer = self.decode(job_id, &problem, jobs.get(&job_id.0))?;
                if let Some(cached) = jobs.get_mut(&job_id.0) {
                    cached.job = cached.job.clone().with_status(JobStatus::Completed);
                }
                Ok(buffer)
            }
            JobStatus::Failed(_) | JobStatus::Cancelled => Err(HalError::RemoteExecution {
                status: status.as_remote(),
            }),
            other => Err(HalError::Decode(format!(
                "problem {job_id} has no answer yet (status {})",
                other.as_remote()
            ))),
        }
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    fn poll_timeout(&self) -> Option<Duration> {
        self.config.poll_timeout()
    }
}
