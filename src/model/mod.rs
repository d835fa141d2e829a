//! `ModelIR`: the parsed, sort-checked transition system extracted from
//! a BTOR2 file. Built once by the BTOR2 parser and never mutated
//! again; the BMC engine only reads from it.

use crate::error::Result;
use crate::expr::{Expression, Role, Sort, Variable};
use crate::validate::Validate;
use std::collections::BTreeMap;

/// A `state` declaration: its declared sort, an optional initial-value
/// constraint, and the expression defining its next-cycle value.
#[derive(Clone, Debug)]
pub struct State {
    name: String,
    sort: Sort,
    init_expr: Option<Expression>,
    next_expr: Expression,
}

impl State {
    pub fn new(name: impl Into<String>, sort: Sort, init_expr: Option<Expression>, next_expr: Expression) -> Self {
        Self {
            name: name.into(),
            sort,
            init_expr,
            next_expr,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn init_expr(&self) -> Option<&Expression> {
        self.init_expr.as_ref()
    }

    pub fn next_expr(&self) -> &Expression {
        &self.next_expr
    }

    pub fn variable(&self) -> Variable {
        Variable::new(self.name.clone(), self.sort.clone(), Role::State)
    }
}

/// An `input` declaration: free at every step, driven only by the
/// stimulus script (or left unconstrained).
#[derive(Clone, Debug)]
pub struct Input {
    name: String,
    sort: Sort,
}

impl Input {
    pub fn new(name: impl Into<String>, sort: Sort) -> Self {
        Self {
            name: name.into(),
            sort,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn variable(&self) -> Variable {
        Variable::new(self.name.clone(), self.sort.clone(), Role::Input)
    }
}

/// An `output`/`bad`/`constraint` sink: a named expression over
/// current-step state/input variables.
#[derive(Clone, Debug)]
pub struct Output {
    name: String,
    expr: Expression,
    kind: OutputKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputKind {
    Output,
    Bad,
    Constraint,
}

impl Output {
    pub fn new(name: impl Into<String>, expr: Expression, kind: OutputKind) -> Self {
        Self {
            name: name.into(),
            expr,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expr(&self) -> &Expression {
        &self.expr
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }
}

/// The parsed transition system: states, inputs, sinks, and the sort
/// table used while parsing (kept for diagnostics/dumping).
#[derive(Clone, Debug, Default)]
pub struct ModelIR {
    sorts: BTreeMap<usize, Sort>,
    states: Vec<State>,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl ModelIR {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sorts(&self) -> &BTreeMap<usize, Sort> {
        &self.sorts
    }

    pub fn sorts_mut(&mut self) -> &mut BTreeMap<usize, Sort> {
        &mut self.sorts
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut Vec<State> {
        &mut self.states
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut Vec<Input> {
        &mut self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut Vec<Output> {
        &mut self.outputs
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name() == name)
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name() == name)
    }

    /// Every signal that may appear as the left-hand side of a stimulus
    /// drive or property leaf: states and inputs, by name.
    pub fn signal_sort(&self, name: &str) -> Option<&Sort> {
        self.state(name)
            .map(State::sort)
            .or_else(|| self.input(name).map(Input::sort))
    }

    /// The disjunction of all `bad` sinks — the property to falsify
    /// absent a script `[PROPERTY]` override (§3's "outputs" note).
    pub fn bad_disjunction(&self) -> Result<Expression> {
        let bads: Vec<Expression> = self
            .outputs
            .iter()
            .filter(|o| o.kind() == OutputKind::Bad)
            .map(|o| o.expr().clone())
            .collect();
        crate::expr::Boolean::disjunction(&bads)
    }

    /// All `constraint` sinks, asserted globally at every unrolled step.
    pub fn constraints(&self) -> impl Iterator<Item = &Expression> {
        self.outputs
            .iter()
            .filter(|o| o.kind() == OutputKind::Constraint)
            .map(Output::expr)
    }
}

impl Validate for ModelIR {
    fn validate(&self) -> Result<()> {
        for state in &self.states {
            if let Some(init) = state.init_expr() {
                init.sort().expect_sort(state.sort())?;
            }
            state.next_expr().sort().expect_sort(state.sort())?;

            for var in state.next_expr().variables() {
                if var.step().is_some() {
                    return Err(format!(
                        "next_expr of state '{}' references a stepped variable '{}'",
                        state.name(),
                        var.identifier()
                    )
                    .into());
                }
                let known = self.state(var.name()).is_some() || self.input(var.name()).is_some();
                if !known {
                    return Err(format!(
                        "next_expr of state '{}' references undeclared variable '{}'",
                        state.name(),
                        var.name()
                    )
                    .into());
                }
            }
        }

        for output in self.outputs.iter().filter(|o| o.kind() != OutputKind::Output) {
            output.expr().sort().expect_boolean().or_else(|_| {
                output.expr().sort().expect_sort(&Sort::bit_vector(1))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BitVector, Constant};

    fn bv_var(name: &str, width: usize, role: Role) -> Expression {
        Variable::new(name, Sort::bit_vector(width), role).into()
    }

    #[test]
    fn test_validate_rejects_next_expr_referencing_undeclared_variable() {
        let mut model = ModelIR::new();
        let bogus = bv_var("ghost", 4, Role::State);
        model.states_mut().push(State::new(
            "s",
            Sort::bit_vector(4),
            None,
            bogus,
        ));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed_model() {
        let mut model = ModelIR::new();
        let next = BitVector::add(
            bv_var("s", 4, Role::State),
            bv_var("i", 4, Role::Input),
        )
        .unwrap();
        model.states_mut().push(State::new(
            "s",
            Sort::bit_vector(4),
            Some(Expression::constant(Constant::bit_vector_u64(0, 4), Sort::bit_vector(4))),
            next,
        ));
        model.inputs_mut().push(Input::new("i", Sort::bit_vector(4)));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_bad_disjunction_of_no_bads_is_false() {
        let model = ModelIR::new();
        let expr = model.bad_disjunction().unwrap();
        assert_eq!(expr, Expression::constant(false.into(), Sort::boolean()));
    }
}
