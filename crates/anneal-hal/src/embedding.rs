//! Minor embeddings of logical problem graphs onto hardware.
//!
//! An [`Embedding`] maps every active logical vertex to a chain of hardware
//! qubits. Chains are produced by an [`EmbeddingAlgorithm`]; the concrete
//! search is pluggable (see [`crate::registry::EmbeddingRegistry`]).
//!
//! # Text format
//!
//! ```text
//! 0: 0 4
//! 1: 1
//! 3: 7 11 15
//! ```
//!
//! One record per line, `<vertex>: <qubit> <qubit> ...`, ordered by vertex.
//! Blank lines are ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anneal_ir::{InteractionGraph, QubitId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};
use crate::solver::HardwareTopology;

/// Logical vertex to hardware chain mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embedding {
    chains: BTreeMap<u32, Vec<u32>>,
}

impl Embedding {
    /// Create an empty embedding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chain of a logical vertex.
    pub fn insert(&mut self, vertex: u32, chain: Vec<u32>) {
        self.chains.insert(vertex, chain);
    }

    /// Chain of a logical vertex.
    pub fn chain(&self, vertex: u32) -> Option<&[u32]> {
        self.chains.get(&vertex).map(Vec::as_slice)
    }

    /// Number of embedded vertices.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no vertex is embedded.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Iterate over `(vertex, chain)` in vertex order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u32])> + '_ {
        self.chains.iter().map(|(v, c)| (*v, c.as_slice()))
    }

    /// Read an embedding in the text format.
    pub fn load(reader: impl BufRead) -> HalResult<Self> {
        let mut embedding = Self::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let bad = |what: &str| {
                HalError::Embedding(format!("line {}: {what}: '{line}'", lineno + 1))
            };

            let (vertex, chain) = line.split_once(':').ok_or_else(|| bad("missing ':'"))?;
            let vertex: u32 = vertex
                .trim()
                .parse()
                .map_err(|_| bad("invalid vertex index"))?;
            let chain = chain
                .split_whitespace()
                .map(str::parse::<u32>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| bad("invalid qubit index"))?;
            if embedding.chains.insert(vertex, chain).is_some() {
                return Err(bad("duplicate vertex"));
            }
        }
        Ok(embedding)
    }

    /// Write the embedding in the text format.
    pub fn persist(&self, mut writer: impl Write) -> HalResult<()> {
        for (vertex, chain) in &self.chains {
            let qubits: Vec<String> = chain.iter().map(u32::to_string).collect();
            writeln!(writer, "{vertex}: {}", qubits.join(" "))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load from a file.
    pub fn load_file(path: impl AsRef<Path>) -> HalResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::load(BufReader::new(file))
    }

    /// Persist to a file, replacing it.
    pub fn persist_file(&self, path: impl AsRef<Path>) -> HalResult<()> {
        let file = File::create(path.as_ref())?;
        self.persist(BufWriter::new(file))
    }

    /// Check the embedding against a problem and a hardware graph.
    ///
    /// Every active vertex needs a non-empty chain, chains must be pairwise
    /// disjoint and reference only existing hardware qubits.
    pub fn validate(
        &self,
        problem: &InteractionGraph,
        hardware: &HardwareTopology,
    ) -> HalResult<()> {
        for vertex in problem.active_vertices() {
            match self.chains.get(&vertex.0) {
                None => {
                    return Err(HalError::Embedding(format!(
                        "vertex {vertex} has no chain"
                    )));
                }
                Some(chain) if chain.is_empty() => {
                    return Err(HalError::Embedding(format!(
                        "vertex {vertex} has an empty chain"
                    )));
                }
                Some(_) => {}
            }
        }

        let mut used = FxHashSet::default();
        for (vertex, chain) in &self.chains {
            for &q in chain {
                if !hardware.contains(q) {
                    return Err(HalError::Embedding(format!(
                        "vertex {vertex} uses qubit {q} outside the {} hardware qubits",
                        hardware.num_qubits()
                    )));
                }
                if !used.insert(q) {
                    return Err(HalError::Embedding(format!(
                        "qubit {q} appears in more than one chain"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A minor-embedding search.
pub trait EmbeddingAlgorithm: Send + Sync {
    /// Registry name of the algorithm.
    fn name(&self) -> &str;

    /// Embed `problem` into `hardware`.
    fn embed(
        &self,
        problem: &InteractionGraph,
        hardware: &HardwareTopology,
    ) -> HalResult<Embedding>;
}

/// Identity embedding: logical vertex `i` runs on hardware qubit `i`.
///
/// Succeeds only when every logical edge is a hardware coupler.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialEmbedding;

impl EmbeddingAlgorithm for TrivialEmbedding {
    fn name(&self) -> &str {
        "trivial"
    }

    fn embed(
        &self,
        problem: &InteractionGraph,
        hardware: &HardwareTopology,
    ) -> HalResult<Embedding> {
        for (a, b, _) in problem.edges() {
            if !hardware.are_coupled(a.0, b.0) {
                return Err(HalError::Embedding(format!(
                    "logical edge ({a}, {b}) is not a hardware coupler"
                )));
            }
        }

        let mut embedding = Embedding::new();
        for QubitId(v) in problem.active_vertices() {
            if !hardware.contains(v) {
                return Err(HalError::Embedding(format!(
                    "logical vertex {v} exceeds the {} hardware qubits",
                    hardware.num_qubits()
                )));
            }
            embedding.insert(v, vec![v]);
        }
        Ok(embedding)
    }
}
