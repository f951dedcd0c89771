//! Solver descriptions and the solver catalog.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HalError, HalResult};

/// Hardware qubit graph of an annealing solver.
///
/// Couplers are undirected: `(a, b)` allows an interaction in both
/// directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TopologyRepr", into = "TopologyRepr")]
pub struct HardwareTopology {
    num_qubits: u32,
    couplers: Vec<(u32, u32)>,
    adjacency: FxHashMap<u32, FxHashSet<u32>>,
}

#[derive(Serialize, Deserialize)]
struct TopologyRepr {
    num_qubits: u32,
    couplers: Vec<(u32, u32)>,
}

impl From<TopologyRepr> for HardwareTopology {
    fn from(repr: TopologyRepr) -> Self {
        Self::new(repr.num_qubits, repr.couplers)
    }
}

impl From<HardwareTopology> for TopologyRepr {
    fn from(topology: HardwareTopology) -> Self {
        Self {
            num_qubits: topology.num_qubits,
            couplers: topology.couplers,
        }
    }
}

impl HardwareTopology {
    /// Create a topology from a qubit count and coupler list.
    pub fn new(num_qubits: u32, couplers: Vec<(u32, u32)>) -> Self {
        let mut adjacency: FxHashMap<u32, FxHashSet<u32>> = FxHashMap::default();
        for &(a, b) in &couplers {
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
        }
        Self {
            num_qubits,
            couplers,
            adjacency,
        }
    }

    /// Fully connected topology of `n` qubits.
    pub fn full(n: u32) -> Self {
        let mut couplers = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                couplers.push((i, j));
            }
        }
        Self::new(n, couplers)
    }

    /// Number of hardware qubits (indices are `0..num_qubits`).
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The coupler list as reported by the solver.
    pub fn couplers(&self) -> &[(u32, u32)] {
        &self.couplers
    }

    /// Whether `q` is a valid hardware index.
    pub fn contains(&self, q: u32) -> bool {
        q < self.num_qubits
    }

    /// Whether two qubits share a coupler.
    pub fn are_coupled(&self, a: u32, b: u32) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Neighbours of a qubit, sorted.
    pub fn neighbors(&self, q: u32) -> Vec<u32> {
        let mut out: Vec<u32> = self
            .adjacency
            .get(&q)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }
}

/// Closed interval of allowed weight values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

impl WeightRange {
    /// Create a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Static description of one remote solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverDescriptor {
    /// Solver name, e.g. `DW_2000Q_VFYC_1`.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Hardware qubit graph.
    pub topology: HardwareTopology,
    /// Allowed coupling strengths.
    pub j_range: Option<WeightRange>,
    /// Allowed bias values.
    pub h_range: Option<WeightRange>,
}

impl SolverDescriptor {
    /// Create a descriptor without weight ranges.
    pub fn new(name: impl Into<String>, topology: HardwareTopology) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            topology,
            j_range: None,
            h_range: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the coupling range.
    pub fn with_j_range(mut self, min: f64, max: f64) -> Self {
        self.j_range = Some(WeightRange::new(min, max));
        self
    }

    /// Set the bias range.
    pub fn with_h_range(mut self, min: f64, max: f64) -> Self {
        self.h_range = Some(WeightRange::new(min, max));
        self
    }

    /// Number of hardware qubits.
    pub fn num_qubits(&self) -> u32 {
        self.topology.num_qubits()
    }
}

/// Read-only catalog of solvers keyed by name.
///
/// Built once from the remote solver list and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct SolverRegistry {
    solvers: FxHashMap<String, SolverDescriptor>,
}

impl SolverRegistry {
    /// Build the catalog. A later descriptor replaces an earlier one with
    /// the same name.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = SolverDescriptor>) -> Self {
        let mut solvers = FxHashMap::default();
        for descriptor in descriptors {
            debug!(
                solver = %descriptor.name,
                qubits = descriptor.num_qubits(),
                "registering solver"
            );
            solvers.insert(descriptor.name.clone(), descriptor);
        }
        Self { solvers }
    }

    /// Look up a solver by name.
    pub fn get(&self, name: &str) -> HalResult<&SolverDescriptor> {
        self.solvers.get(name).ok_or_else(|| {
            HalError::Configuration(format!(
                "Unknown solver '{name}'; available: {}",
                self.names().join(", ")
            ))
        })
    }

    /// Whether a solver with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.solvers.contains_key(name)
    }

    /// All solver names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.solvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of solvers.
    pub fn len(&self) -> usize {
        self.solvers.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.solvers.is_empty()
    }
}
