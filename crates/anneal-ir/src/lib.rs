//! Annealing Program Intermediate Representation
//!
//! This crate holds the data structures shared by the QMI compiler and the
//! annealer backends.
//!
//! # Core Components
//!
//! - **Terms**: [`Instruction`] is either a [`CouplingTerm`] (`a b weight`,
//!   a bias when `a == b`) or an [`AnnealDirective`]
//! - **Parameters**: [`ParameterExpression`] for literal or symbolic weights
//! - **Kernels**: [`Kernel`], built through a [`KernelBuilder`]
//! - **Graph**: [`InteractionGraph`], the logical problem graph of a kernel
//! - **Schedules**: [`AnnealScheduleGenerator`] expands a directive into a
//!   [`ScheduleTable`]
//!
//! # Example
//!
//! ```rust
//! use anneal_ir::{KernelBuilder, QubitId};
//!
//! let mut builder = KernelBuilder::new("ising", Vec::<String>::new());
//! builder.coupling(0u32, 0u32, 1.5).unwrap();
//! builder.coupling(1u32, 1u32, -2.0).unwrap();
//! builder.coupling(0u32, 1u32, 0.5).unwrap();
//! let kernel = builder.finish();
//!
//! assert_eq!(kernel.graph().num_vertices(), 2);
//! assert!(kernel.graph().has_edge(QubitId(0), QubitId(1)));
//! ```

pub mod error;
pub mod graph;
pub mod instruction;
pub mod kernel;
pub mod parameter;
pub mod qubit;
pub mod schedule;

pub use error::{IrError, IrResult};
pub use graph::InteractionGraph;
pub use instruction::{AnnealDirection, AnnealDirective, CouplingTerm, Instruction};
pub use kernel::{Kernel, KernelBuilder};
pub use parameter::ParameterExpression;
pub use qubit::QubitId;
pub use schedule::{AnnealScheduleGenerator, SchedulePoint, ScheduleTable};
