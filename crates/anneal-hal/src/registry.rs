//! Registry of embedding algorithms.
//!
//! The [`EmbeddingRegistry`] is the lookup point for the configured
//! `embedding_algorithm` name. The built-in `"trivial"` algorithm is always
//! present in a registry created with [`EmbeddingRegistry::new`].

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::embedding::{EmbeddingAlgorithm, TrivialEmbedding};
use crate::error::{HalError, HalResult};

/// Name of the algorithm used when none is configured.
pub const DEFAULT_EMBEDDING_ALGORITHM: &str = "trivial";

/// Named embedding algorithms.
#[derive(Clone)]
pub struct EmbeddingRegistry {
    algorithms: FxHashMap<String, Arc<dyn EmbeddingAlgorithm>>,
}

impl EmbeddingRegistry {
    /// Create a registry holding the built-in algorithms.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(TrivialEmbedding);
        registry
    }

    /// Create a registry with no algorithms.
    pub fn empty() -> Self {
        Self {
            algorithms: FxHashMap::default(),
        }
    }

    /// Register an algorithm under its own name, replacing any previous one.
    pub fn register(&mut self, algorithm: impl EmbeddingAlgorithm + 'static) {
        let name = algorithm.name().to_string();
        debug!("Registering embedding algorithm: {}", name);
        self.algorithms.insert(name, Arc::new(algorithm));
    }

    /// Look up an algorithm by name.
    pub fn get(&self, name: &str) -> HalResult<Arc<dyn EmbeddingAlgorithm>> {
        self.algorithms.get(name).cloned().ok_or_else(|| {
            HalError::Configuration(format!(
                "No embedding algorithm registered with name '{name}'"
            ))
        })
    }

    /// List all algorithm names, sorted.
    pub fn available_algorithms(&self) -> Vec<String> {
        let mut names: Vec<_> = self.algorithms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if an algorithm is registered.
    pub fn has_algorithm(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }
}

impl Default for EmbeddingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmbeddingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingRegistry")
            .field("algorithms", &self.available_algorithms())
            .finish()
    }
}
