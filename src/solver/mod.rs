use crate::environment::Environment;
use crate::error::Result;
use crate::expr::{Constant, Expression, Variable};
use std::path::Path;

pub mod rsmt;

/// Result of a `check-sat` query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CheckSatResult {
    Sat,
    Unsat,
    Unknown,
}

/// The abstract SMT backend interface (§4.5). BMC code talks to this
/// trait exclusively; only `solver::rsmt` is allowed to name a
/// specific solver.
pub trait SmtBackend {
    fn declare_const(&mut self, variable: &Variable) -> Result<()>;
    fn assert(&mut self, formula: &Expression) -> Result<()>;
    fn push(&mut self) -> Result<()>;
    fn pop(&mut self) -> Result<()>;
    fn check_sat(&mut self) -> Result<CheckSatResult>;

    /// Evaluates `expr` under the model of the last `Sat` result.
    fn get_value(&mut self, expr: &Expression) -> Result<Constant>;
}

pub trait DumpFormula {
    fn dump_formula_to_file(&self, path: &Path) -> Result<()>;
}

pub trait Solver: SmtBackend + DumpFormula {}
impl<T: SmtBackend + DumpFormula> Solver for T {}

pub fn create_solver(env: &Environment) -> Result<Box<dyn Solver>> {
    let solver = rsmt::RsmtBackend::new_from_env(env)?;
    Ok(Box::new(solver))
}
