//! Annealer Hardware Abstraction Layer
//!
//! This crate provides the backend-independent side of running an
//! annealing kernel on remote hardware:
//!
//! - [`Annealer`], the job lifecycle trait with a provided polling `wait()`
//! - [`SolverDescriptor`] / [`SolverRegistry`] describing the available
//!   solvers and their [`HardwareTopology`]
//! - [`Embedding`] and the pluggable [`EmbeddingAlgorithm`]s held in an
//!   [`EmbeddingRegistry`]
//! - [`AnnealBuffer`], the decoded measurement data of a job
//!
//! # Example: Running a Kernel
//!
//! ```ignore
//! use anneal_adapter_dwave::DwaveBackend;
//! use anneal_hal::Annealer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = DwaveBackend::from_env().await?;
//!     let kernels = anneal_qmi::compile("__qpu__ k() { 0 1 -1.0; }")?;
//!
//!     let buffer = backend.execute(&kernels, None).await?;
//!     if let Some(best) = buffer.lowest_energy() {
//!         println!("{} at energy {}", best.bitstring(), best.energy);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod embedding;
pub mod error;
pub mod job;
pub mod registry;
pub mod result;
pub mod solver;

pub use backend::{Annealer, DEFAULT_POLL_INTERVAL};
pub use embedding::{Embedding, EmbeddingAlgorithm, TrivialEmbedding};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use registry::{DEFAULT_EMBEDDING_ALGORITHM, EmbeddingRegistry};
pub use result::{AnnealBuffer, Sample};
pub use solver::{HardwareTopology, SolverDescriptor, SolverRegistry, WeightRange};
