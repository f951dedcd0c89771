//! Configuration for the D-Wave backend.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `DWAVE_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DWAVE_API_KEY` | `api_key` |
//! | `DWAVE_URL` | `url` |
//! | `DWAVE_SOLVER` | `solver` |
//! | `DWAVE_NUM_READS` | `num_reads` |
//! | `DWAVE_ANNEAL_TIME` | `anneal_time` |
//! | `DWAVE_EMBEDDING` | `embedding_algorithm` |
//! | `DWAVE_LOAD_EMBEDDING` | `load_embedding` |
//! | `DWAVE_PERSIST_EMBEDDING` | `persist_embedding` |
//! | `DWAVE_CHAIN_STRENGTH` | `chain_strength` |
//! | `DWAVE_POLL_INTERVAL_MS` | `poll_interval_ms` |
//! | `DWAVE_POLL_TIMEOUT_SECS` | `poll_timeout_secs` |
//! | `DWAVE_NORMALIZE_BIASES` | `normalize_biases` |

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anneal_hal::DEFAULT_EMBEDDING_ALGORITHM;
use serde::{Deserialize, Serialize};

use crate::error::{DwaveError, DwaveResult};

/// Default SAPI endpoint.
pub const DEFAULT_URL: &str = "https://cloud.dwavesys.com";

/// Solver used when none is configured.
pub const DEFAULT_SOLVER: &str = "DW_2000Q_VFYC_1";

/// D-Wave backend settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct DwaveConfig {
    /// SAPI token, sent as `X-Auth-Token`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// SAPI base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Name of the solver jobs are sent to.
    #[serde(default = "default_solver")]
    pub solver: String,

    /// Reads per job.
    #[serde(default = "default_num_reads")]
    pub num_reads: u32,

    /// Anneal time in microseconds, used when the kernel has no anneal directive.
    #[serde(default = "default_anneal_time")]
    pub anneal_time: f64,

    /// Registry name of the embedding algorithm.
    #[serde(default = "default_embedding_algorithm")]
    pub embedding_algorithm: String,

    /// Read the embedding from this file instead of computing it.
    #[serde(default)]
    pub load_embedding: Option<PathBuf>,

    /// Write computed embeddings to this file.
    #[serde(default)]
    pub persist_embedding: Option<PathBuf>,

    /// Magnitude of the ferromagnetic coupling that holds a chain together.
    #[serde(default = "default_chain_strength")]
    pub chain_strength: f64,

    /// Delay between two status requests in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting after this many seconds; unset polls forever.
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,

    /// Rescale biases against the solver's h range as well as couplings.
    #[serde(default = "default_true")]
    pub normalize_biases: bool,
}

impl fmt::Debug for DwaveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DwaveConfig")
            .field("api_key", &"[REDACTED]")
            .field("url", &self.url)
            .field("solver", &self.solver)
            .field("num_reads", &self.num_reads)
            .field("anneal_time", &self.anneal_time)
            .field("embedding_algorithm", &self.embedding_algorithm)
            .field("load_embedding", &self.load_embedding)
            .field("persist_embedding", &self.persist_embedding)
            .field("chain_strength", &self.chain_strength)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("normalize_biases", &self.normalize_biases)
            .finish()
    }
}

// Default value functions
fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_solver() -> String {
    DEFAULT_SOLVER.to_string()
}

fn default_num_reads() -> u32 {
    100
}

fn default_anneal_time() -> f64 {
    20.0
}

fn default_embedding_algorithm() -> String {
    DEFAULT_EMBEDDING_ALGORITHM.to_string()
}

fn default_chain_strength() -> f64 {
    1.0
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl Default for DwaveConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: default_url(),
            solver: default_solver(),
            num_reads: default_num_reads(),
            anneal_time: default_anneal_time(),
            embedding_algorithm: default_embedding_algorithm(),
            load_embedding: None,
            persist_embedding: None,
            chain_strength: default_chain_strength(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: None,
            normalize_biases: true,
        }
    }
}

impl DwaveConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> DwaveResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DwaveError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> DwaveResult<Self> {
        let config: DwaveConfig =
            serde_yaml_ng::from_str(contents).map_err(|e| DwaveError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the `DWAVE_*` environment variables.
    pub fn from_env() -> DwaveResult<Self> {
        let config = Self::default().merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> DwaveResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables that are set override the current values.
    pub fn merge_env(self) -> DwaveResult<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides looked up by variable name.
    pub fn merge_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> DwaveResult<Self> {
        fn parsed<T: std::str::FromStr>(key: &str, value: String) -> DwaveResult<T> {
            value
                .trim()
                .parse()
                .map_err(|_| DwaveError::Config(format!("{key}: cannot parse '{value}'")))
        }

        if let Some(v) = lookup("DWAVE_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("DWAVE_URL") {
            self.url = v;
        }
        if let Some(v) = lookup("DWAVE_SOLVER") {
            self.solver = v;
        }
        if let Some(v) = lookup("DWAVE_NUM_READS") {
            self.num_reads = parsed("DWAVE_NUM_READS", v)?;
        }
        if let Some(v) = lookup("DWAVE_ANNEAL_TIME") {
            self.anneal_time = parsed("DWAVE_ANNEAL_TIME", v)?;
        }
        if let Some(v) = lookup("DWAVE_EMBEDDING") {
            self.embedding_algorithm = v;
        }
        if let Some(v) = lookup("DWAVE_LOAD_EMBEDDING") {
            self.load_embedding = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("DWAVE_PERSIST_EMBEDDING") {
            self.persist_embedding = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("DWAVE_CHAIN_STRENGTH") {
            self.chain_strength = parsed("DWAVE_CHAIN_STRENGTH", v)?;
        }
        if let Some(v) = lookup("DWAVE_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parsed("DWAVE_POLL_INTERVAL_MS", v)?;
        }
        if let Some(v) = lookup("DWAVE_POLL_TIMEOUT_SECS") {
            self.poll_timeout_secs = Some(parsed("DWAVE_POLL_TIMEOUT_SECS", v)?);
        }
        if let Some(v) = lookup("DWAVE_NORMALIZE_BIASES") {
            self.normalize_biases = parsed("DWAVE_NORMALIZE_BIASES", v)?;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> DwaveResult<()> {
        if let Some(ref key) = self.api_key {
            if key.trim().is_empty() {
                return Err(DwaveError::MissingToken);
            }
        }
        if self.url.trim().is_empty() {
            return Err(DwaveError::Config("url must not be empty".into()));
        }
        if self.solver.trim().is_empty() {
            return Err(DwaveError::Config("solver must not be empty".into()));
        }
        if self.num_reads == 0 {
            return Err(DwaveError::Config(
                "num_reads must be greater than 0".into(),
            ));
        }
        if !(self.anneal_time.is_finite() && self.anneal_time > 0.0) {
            return Err(DwaveError::Config(format!(
                "anneal_time must be positive, got {}",
                self.anneal_time
            )));
        }
        if !(self.chain_strength.is_finite() && self.chain_strength > 0.0) {
            return Err(DwaveError::Config(format!(
                "chain_strength must be positive, got {}",
                self.chain_strength
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(DwaveError::Config(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The token, or `MissingToken` when none is configured.
    pub fn token(&self) -> DwaveResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(DwaveError::MissingToken)
    }

    /// Delay between two status requests.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Upper bound on the total wait.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }
}
