//! Weighted interaction graph of a logical Ising problem.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::instruction::Instruction;
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// Undirected problem graph.
///
/// Vertex `i` is logical variable `i`; its weight is the bias set by an
/// `i i w` term, if any. Edge weights are the coupling strengths.
/// Vertices that appear in no term are kept so that indices stay dense,
/// they are reported as inactive.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: UnGraph<Option<ParameterExpression>, ParameterExpression, u32>,
}

impl InteractionGraph {
    /// Create a graph with `num_vertices` unconnected, bias-free vertices.
    pub fn new(num_vertices: usize) -> Self {
        let mut graph = UnGraph::with_capacity(num_vertices, num_vertices);
        for _ in 0..num_vertices {
            graph.add_node(None);
        }
        Self { graph }
    }

    /// Build the graph of `num_vertices` vertices from a list of instructions.
    ///
    /// Anneal directives are ignored. Later terms overwrite earlier ones on
    /// the same vertex or edge.
    pub fn from_instructions<'a>(
        num_vertices: usize,
        instructions: impl IntoIterator<Item = &'a Instruction>,
    ) -> Self {
        let mut graph = Self::new(num_vertices);
        for term in instructions.into_iter().filter_map(Instruction::as_coupling) {
            if term.is_bias() {
                graph.set_bias(term.a, term.weight.clone());
            } else {
                graph.add_edge(term.a, term.b, term.weight.clone());
            }
        }
        graph
    }

    fn node(&mut self, q: QubitId) -> NodeIndex<u32> {
        while self.graph.node_count() <= q.index() {
            self.graph.add_node(None);
        }
        NodeIndex::new(q.index())
    }

    /// Set (or overwrite) the bias of a vertex.
    pub fn set_bias(&mut self, q: QubitId, weight: ParameterExpression) {
        let n = self.node(q);
        self.graph[n] = Some(weight);
    }

    /// Add an edge, overwriting the weight if it already exists.
    pub fn add_edge(&mut self, a: QubitId, b: QubitId, weight: ParameterExpression) {
        let na = self.node(a);
        let nb = self.node(b);
        self.graph.update_edge(na, nb, weight);
    }

    /// Number of vertices (`max qubit index + 1`).
    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of coupling edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Bias of a vertex, if one was set.
    pub fn bias(&self, q: QubitId) -> Option<&ParameterExpression> {
        self.graph
            .node_weight(NodeIndex::new(q.index()))
            .and_then(Option::as_ref)
    }

    /// Weight of the edge between two vertices.
    pub fn edge_weight(&self, a: QubitId, b: QubitId) -> Option<&ParameterExpression> {
        if a.index() >= self.num_vertices() || b.index() >= self.num_vertices() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(a.index()), NodeIndex::new(b.index()))
            .and_then(|e| self.graph.edge_weight(e))
    }

    /// Whether two vertices are coupled.
    pub fn has_edge(&self, a: QubitId, b: QubitId) -> bool {
        self.edge_weight(a, b).is_some()
    }

    /// Iterate over `(a, b, weight)` with `a < b`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn edges(&self) -> impl Iterator<Item = (QubitId, QubitId, &ParameterExpression)> + '_ {
        self.graph.edge_references().map(|e| {
            let (s, t) = (e.source().index() as u32, e.target().index() as u32);
            (QubitId(s.min(t)), QubitId(s.max(t)), e.weight())
        })
    }

    /// Iterate over `(vertex, bias)` for every vertex that has a bias.
    #[allow(clippy::cast_possible_truncation)]
    pub fn biases(&self) -> impl Iterator<Item = (QubitId, &ParameterExpression)> + '_ {
        self.graph.node_indices().filter_map(|n| {
            self.graph[n].as_ref().map(|w| (QubitId(n.index() as u32), w))
        })
    }

    /// Neighbours of a vertex, sorted.
    #[allow(clippy::cast_possible_truncation)]
    pub fn neighbors(&self, q: QubitId) -> Vec<QubitId> {
        if q.index() >= self.num_vertices() {
            return Vec::new();
        }
        let mut out: Vec<QubitId> = self
            .graph
            .neighbors(NodeIndex::new(q.index()))
            .map(|n| QubitId(n.index() as u32))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of distinct neighbours.
    pub fn degree(&self, q: QubitId) -> usize {
        self.neighbors(q).len()
    }

    /// Whether the vertex takes part in any term.
    pub fn is_active(&self, q: QubitId) -> bool {
        self.bias(q).is_some() || self.degree(q) > 0
    }

    /// All vertices that take part in at least one term, ascending.
    #[allow(clippy::cast_possible_truncation)]
    pub fn active_vertices(&self) -> Vec<QubitId> {
        (0..self.num_vertices() as u32)
            .map(QubitId)
            .filter(|q| self.is_active(*q))
            .collect()
    }

    /// The underlying petgraph graph, for embedding algorithms.
    pub fn as_petgraph(&self) -> &UnGraph<Option<ParameterExpression>, ParameterExpression, u32> {
        &self.graph
    }
}
