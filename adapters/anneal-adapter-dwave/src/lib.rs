//! D-Wave Adapter for the Annealer HAL
//!
//! This crate runs QMI kernels on D-Wave annealers through the SAPI REST
//! interface (`https://cloud.dwavesys.com/sapi`).
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Bind parameters, generate anneal schedule | `backend` | bound [`anneal_ir::Kernel`] |
//! | Load or compute embedding | `backend` | [`anneal_hal::Embedding`] |
//! | Map onto hardware qubits | [`problem`] | [`IsingProblem`] |
//! | Rescale weights, chain couplers included, into solver ranges | [`normalize`] | [`IsingProblem`] |
//! | Build payload | [`encode`] | [`ProblemSubmission`] |
//! | Submit, poll until `COMPLETED` | [`api`], [`anneal_hal::Annealer::wait`] | [`ProblemStatus`] |
//! | Unpack base64 samples | [`decode`] | [`anneal_hal::AnnealBuffer`] |
//!
//! # Authentication
//!
//! Set the `DWAVE_API_KEY` environment variable to your SAPI token, or put
//! `api_key` in a YAML file loaded with [`DwaveConfig::from_file`]:
//!
//! ```bash
//! export DWAVE_API_KEY="your-sapi-token"
//! ```
//!
//! # Example
//!
//! ```ignore
//! use anneal_adapter_dwave::DwaveBackend;
//! use anneal_hal::Annealer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = DwaveBackend::from_env().await?;
//!
//!     let buffer = backend
//!         .execute_source("__qpu__ k() { 0 0 1.0; 1 1 -1.0; 0 1 0.5; }", None)
//!         .await?;
//!     if let Some(best) = buffer.lowest_energy() {
//!         println!("{} at energy {}", best.bitstring(), best.energy);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
mod backend;
mod config;
pub mod decode;
pub mod encode;
mod error;
pub mod normalize;
pub mod problem;

pub use api::{
    Answer, HttpTransport, ProblemParams, ProblemStatus, ProblemSubmission, SapiClient,
    SolverInfo, Transport,
};
pub use backend::DwaveBackend;
pub use config::{DEFAULT_SOLVER, DEFAULT_URL, DwaveConfig};
pub use error::{DwaveError, DwaveResult};
pub use problem::{IsingProblem, IsingTerm};

// Re-export common types for convenience.
pub use anneal_hal::{AnnealBuffer, Annealer};
