//! Concrete Ising problems.
//!
//! A bound [`Kernel`] is flattened into [`IsingTerm`]s in program order,
//! mapped onto hardware qubits through an [`Embedding`] and rendered into
//! the SAPI `data` text.

use anneal_hal::{Embedding, HalError, HalResult, HardwareTopology};
use anneal_ir::{IrError, Kernel};

/// One `<i> <j> <weight>` line of a problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsingTerm {
    pub a: u32,
    pub b: u32,
    pub weight: f64,
}

impl IsingTerm {
    /// Create a term.
    pub fn new(a: u32, b: u32, weight: f64) -> Self {
        Self { a, b, weight }
    }

    /// Whether this term is a bias (self-loop).
    pub fn is_bias(&self) -> bool {
        self.a == self.b
    }
}

/// Terms of one problem, in program order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsingProblem {
    terms: Vec<IsingTerm>,
}

impl IsingProblem {
    /// Create a problem from terms.
    pub fn new(terms: Vec<IsingTerm>) -> Self {
        Self { terms }
    }

    /// Flatten a kernel. Every weight must be a constant; a remaining
    /// symbol is reported as an unbound parameter.
    pub fn from_kernel(kernel: &Kernel) -> HalResult<Self> {
        let terms = kernel
            .coupling_terms()
            .map(|term| match term.weight.as_f64() {
                Some(weight) => Ok(IsingTerm::new(term.a.0, term.b.0, weight)),
                None => Err(IrError::UnboundParameter {
                    name: term.weight.to_string(),
                    kernel: kernel.name().to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { terms })
    }

    /// All terms.
    pub fn terms(&self) -> &[IsingTerm] {
        &self.terms
    }

    /// All terms, mutably.
    pub fn terms_mut(&mut self) -> &mut [IsingTerm] {
        &mut self.terms
    }

    /// Number of lines the problem renders to.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the problem has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Map logical variables to hardware qubits.
    ///
    /// A bias is split evenly over the vertex chain. A coupling is placed on
    /// the first hardware coupler joining the two chains. Every coupler
    /// inside a chain gets `-chain_strength`. With single-qubit chains the
    /// result has the same lines as the input, renumbered.
    pub fn embed(
        &self,
        embedding: &Embedding,
        hardware: &HardwareTopology,
        chain_strength: f64,
    ) -> HalResult<Self> {
        let chain = |v: u32| {
            embedding
                .chain(v)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| HalError::Embedding(format!("vertex {v} has no chain")))
        };

        let mut terms = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            if term.is_bias() {
                let qubits = chain(term.a)?;
                #[allow(clippy::cast_precision_loss)]
                let share = term.weight / qubits.len() as f64;
                terms.extend(qubits.iter().map(|&q| IsingTerm::new(q, q, share)));
            } else {
                let (ca, cb) = (chain(term.a)?, chain(term.b)?);
                let (qa, qb) = ca
                    .iter()
                    .flat_map(|&qa| cb.iter().map(move |&qb| (qa, qb)))
                    .find(|&(qa, qb)| hardware.are_coupled(qa, qb))
                    .ok_or_else(|| {
                        HalError::Embedding(format!(
                            "no hardware coupler joins the chains of {} and {}",
                            term.a, term.b
                        ))
                    })?;
                terms.push(IsingTerm::new(qa, qb, term.weight));
            }
        }

        for (_, qubits) in embedding.iter() {
            for (i, &qa) in qubits.iter().enumerate() {
                for &qb in &qubits[i + 1..] {
                    if hardware.are_coupled(qa, qb) {
                        terms.push(IsingTerm::new(qa, qb, -chain_strength));
                    }
                }
            }
        }

        Ok(Self { terms })
    }

    /// Render the SAPI `data` text: a `<num_qubits> <num_lines>` header
    /// followed by one `<i> <j> <weight>` line per term.
    pub fn to_data(&self, num_qubits: u32) -> String {
        let lines: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("{} {} {}", t.a, t.b, t.weight))
            .collect();
        format!("{} {}\n{}", num_qubits, lines.len(), lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anneal_ir::KernelBuilder;

    fn kernel() -> Kernel {
        let mut b = KernelBuilder::new("k", ["x"]);
        b.coupling(0u32, 0u32, 1.5).unwrap();
        b.coupling(0u32, 1u32, -0.5).unwrap();
        b.coupling(1u32, 1u32, "x").unwrap();
        b.finish()
    }

    #[test]
    fn test_from_kernel_requires_bound_weights() {
        let err = IsingProblem::from_kernel(&kernel()).unwrap_err();
        assert!(matches!(err, HalError::Compile(ref msg) if msg.contains("'x'")));

        let bindings = [("x".to_string(), 2.0)].into_iter().collect();
        let problem = IsingProblem::from_kernel(&kernel().bind(&bindings)).unwrap();
        assert_eq!(
            problem.terms(),
            &[
                IsingTerm::new(0, 0, 1.5),
                IsingTerm::new(0, 1, -0.5),
                IsingTerm::new(1, 1, 2.0)
            ]
        );
    }

    #[test]
    fn test_to_data() {
        let problem = IsingProblem::new(vec![
            IsingTerm::new(0, 0, 1.5),
            IsingTerm::new(0, 4, -1.0),
        ]);
        assert_eq!(problem.to_data(2048), "2048 2\n0 0 1.5\n0 4 -1");
    }

    #[test]
    fn test_embed_single_qubit_chains_renumbers() {
        let problem = IsingProblem::new(vec![
            IsingTerm::new(0, 0, 1.0),
            IsingTerm::new(0, 1, -0.5),
        ]);
        let mut embedding = Embedding::new();
        embedding.insert(0, vec![4]);
        embedding.insert(1, vec![7]);
        let hardware = HardwareTopology::new(8, vec![(4, 7)]);

        let embedded = problem.embed(&embedding, &hardware, 1.0).unwrap();
        assert_eq!(
            embedded.terms(),
            &[IsingTerm::new(4, 4, 1.0), IsingTerm::new(4, 7, -0.5)]
        );
    }

    #[test]
    fn test_embed_long_chain() {
        let problem = IsingProblem::new(vec![
            IsingTerm::new(0, 0, 1.0),
            IsingTerm::new(0, 1, -0.5),
        ]);
        let mut embedding = Embedding::new();
        embedding.insert(0, vec![0, 1]);
        embedding.insert(1, vec![2]);
        let hardware = HardwareTopology::new(3, vec![(0, 1), (1, 2)]);

        let embedded = problem.embed(&embedding, &hardware, 2.0).unwrap();
        assert_eq!(
            embedded.terms(),
            &[
                IsingTerm::new(0, 0, 0.5),
                IsingTerm::new(1, 1, 0.5),
                IsingTerm::new(1, 2, -0.5),
                IsingTerm::new(0, 1, -2.0),
            ]
        );
    }

    #[test]
    fn test_embed_unjoined_chains() {
        let problem = IsingProblem::new(vec![IsingTerm::new(0, 1, 1.0)]);
        let mut embedding = Embedding::new();
        embedding.insert(0, vec![0]);
        embedding.insert(1, vec![2]);
        let hardware = HardwareTopology::new(3, vec![(0, 1)]);
        assert!(matches!(
            problem.embed(&embedding, &hardware, 1.0),
            Err(HalError::Embedding(_))
        ));
    }
}
