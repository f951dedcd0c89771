//! AST-to-kernel lowering for QMI.

use anneal_ir::{AnnealDirective, Kernel, KernelBuilder, ParameterExpression};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::{KernelDecl, Program, Statement, Value};
use crate::error::{CompileError, CompileResult};

/// Lower a parsed program to kernels, in declaration order.
pub(crate) fn lower_to_kernels(program: &Program) -> CompileResult<Vec<Kernel>> {
    let mut lowerer = Lowerer::default();
    for decl in &program.kernels {
        lowerer.lower_kernel(decl)?;
    }
    Ok(lowerer.kernels)
}

/// Lowers kernel declarations one at a time.
///
/// A kernel may only call kernels declared before it.
#[derive(Default)]
struct Lowerer {
    /// Finished kernels in declaration order.
    kernels: Vec<Kernel>,
    /// Kernel name -> index into `kernels`.
    by_name: FxHashMap<String, usize>,
}

impl Lowerer {
    fn lower_kernel(&mut self, decl: &KernelDecl) -> CompileResult<()> {
        if self.by_name.contains_key(&decl.name) {
            return Err(CompileError::DuplicateKernel(decl.name.clone()));
        }

        let mut builder = KernelBuilder::new(&decl.name, decl.params.iter().map(|p| p.name.clone()));
        for stmt in &decl.body {
            self.lower_statement(&mut builder, stmt)?;
        }
        let kernel = builder.finish();
        debug!(
            kernel = kernel.name(),
            line = decl.line,
            vertices = kernel.num_vertices(),
            edges = kernel.graph().num_edges(),
            "lowered kernel"
        );

        self.by_name.insert(decl.name.clone(), self.kernels.len());
        self.kernels.push(kernel);
        Ok(())
    }

    fn lower_statement(&self, builder: &mut KernelBuilder, stmt: &Statement) -> CompileResult<()> {
        match stmt {
            Statement::Term { a, b, weight } => {
                builder.coupling(*a, *b, weight.to_parameter())?;
            }
            Statement::Anneal {
                ta,
                tp,
                tq,
                direction,
            } => {
                builder.anneal(AnnealDirective::new(
                    ta.to_parameter(),
                    tp.to_parameter(),
                    tq.to_parameter(),
                    *direction,
                ))?;
            }
            Statement::Call { callee, args } => {
                let kernel = self
                    .by_name
                    .get(callee)
                    .and_then(|&i| self.kernels.get(i))
                    .ok_or_else(|| CompileError::UndefinedKernel(callee.clone()))?;
                let args: Vec<ParameterExpression> = args.iter().map(Value::to_parameter).collect();
                builder.call(kernel, &args)?;
            }
        }
        Ok(())
    }
}
