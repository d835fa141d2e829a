use crate::error::Result;
use std::convert::TryFrom;
use std::fmt;

mod array;
mod bitvector;
mod bitvector_value;
mod boolean;
mod constant;
mod sort;
mod variable;

pub use self::array::{Array, ArrayValue};
pub use self::bitvector::BitVector;
pub use self::bitvector_value::BitVectorValue;
pub use self::boolean::Boolean;
pub use self::constant::Constant;
pub use self::sort::Sort;
pub use self::variable::{Role, Variable};

/// The operator at the root of an `Expression` node (§3 `Expr` node
/// kinds). `Eq`/`Neq` and `Ite` apply across any sort so they live here
/// rather than in `boolean`/`bitvector`.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Operator {
    Constant(Constant),
    Variable(Variable),
    Ite,
    Equal,
    Boolean(Boolean),
    BitVector(BitVector),
    Array(Array),
}

macro_rules! impl_operator_from {
    ( $name:ident ) => {
        impl From<$name> for Operator {
            fn from(op: $name) -> Self {
                Self::$name(op)
            }
        }
    };
}

impl_operator_from!(Boolean);
impl_operator_from!(BitVector);
impl_operator_from!(Array);

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constant(c) => c.fmt(f),
            Self::Variable(v) => v.fmt(f),
            Self::Ite => write!(f, "ite"),
            Self::Equal => write!(f, "="),
            Self::Boolean(op) => op.fmt(f),
            Self::BitVector(op) => op.fmt(f),
            Self::Array(op) => op.fmt(f),
        }
    }
}

/// A referentially transparent expression tree (§3). Structurally equal
/// subexpressions compare equal via the derived `PartialEq`, giving the
/// sharing spec.md recommends an arena for without needing one.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Expression {
    operator: Operator,
    operands: Vec<Expression>,
    sort: Sort,
}

impl Expression {
    pub fn new(operator: Operator, operands: Vec<Expression>, sort: Sort) -> Self {
        Self {
            operator,
            operands,
            sort,
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn operands(&self) -> &[Expression] {
        &self.operands
    }

    pub fn operands_mut(&mut self) -> &mut Vec<Expression> {
        &mut self.operands
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn constant(value: Constant, sort: Sort) -> Expression {
        Expression::new(Operator::Constant(value), vec![], sort)
    }

    pub fn variable(variable: Variable) -> Expression {
        let sort = variable.sort().clone();
        Expression::new(Operator::Variable(variable), vec![], sort)
    }

    pub fn ite(cond: Expression, then: Expression, else_: Expression) -> Result<Expression> {
        match cond.sort().bit_width() {
            Some(1) => {}
            _ => return Err(format!("Expected Bool or 1-bit BitVec but was {}", cond.sort()).into()),
        }
        then.sort().expect_sort(else_.sort())?;

        let sort = then.sort().clone();
        Ok(Expression::new(Operator::Ite, vec![cond, then, else_], sort))
    }

    pub fn equal(lhs: Expression, rhs: Expression) -> Result<Expression> {
        lhs.sort().expect_sort(rhs.sort())?;

        Ok(Expression::new(
            Operator::Equal,
            vec![lhs, rhs],
            Sort::boolean(),
        ))
    }

    pub fn unequal(lhs: Expression, rhs: Expression) -> Result<Expression> {
        Boolean::not(Self::equal(lhs, rhs)?)
    }

    /// Returns every `Variable` occurring in this expression, in
    /// left-to-right operand order, duplicates included.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut variables = Vec::new();
        match &self.operator {
            Operator::Variable(variable) => variables.push(variable),
            _ => {
                for operand in &self.operands {
                    variables.append(&mut operand.variables())
                }
            }
        }
        variables
    }

    pub fn variables_mut(&mut self) -> Vec<&mut Variable> {
        let mut variables = Vec::new();
        match &mut self.operator {
            Operator::Variable(variable) => variables.push(variable),
            _ => {
                for operand in &mut self.operands {
                    variables.append(&mut operand.variables_mut())
                }
            }
        }
        variables
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.operator, Operator::Constant(_))
    }

    pub fn unwrap_constant(&self) -> &Constant {
        match &self.operator {
            Operator::Constant(c) => c,
            _ => panic!("Expression is not a constant"),
        }
    }

    /// Substitutes every occurrence of `var` (matched by name and role,
    /// ignoring `step`) with `replacement`. Used by the BMC engine to
    /// bind `next_expr`'s current-step variables to a concrete frame.
    pub fn substitute(&self, var: &Variable, replacement: &Expression) -> Expression {
        match &self.operator {
            Operator::Variable(v) if v.name() == var.name() && v.role() == var.role() => {
                replacement.clone()
            }
            _ => {
                let operands = self
                    .operands
                    .iter()
                    .map(|op| op.substitute(var, replacement))
                    .collect();
                Expression::new(self.operator.clone(), operands, self.sort.clone())
            }
        }
    }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Self {
        Self::variable(var)
    }
}

impl TryFrom<&Expression> for bool {
    type Error = &'static str;

    fn try_from(e: &Expression) -> std::result::Result<bool, Self::Error> {
        match e.operator() {
            Operator::Constant(c) => bool::try_from(c),
            _ => Err("cannot convert"),
        }
    }
}

impl TryFrom<&Expression> for u64 {
    type Error = &'static str;

    fn try_from(e: &Expression) -> std::result::Result<u64, Self::Error> {
        match e.operator() {
            Operator::Constant(c) => u64::try_from(c),
            _ => Err("cannot convert"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.operands.is_empty() {
            self.operator.fmt(f)
        } else {
            write!(f, "({}", self.operator)?;
            for operand in &self.operands {
                write!(f, " {}", operand)?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structurally_equal_subexpressions_compare_equal() {
        let a = Expression::constant(Constant::bit_vector_u64(3, 4), Sort::bit_vector(4));
        let b = Expression::constant(Constant::bit_vector_u64(3, 4), Sort::bit_vector(4));
        assert_eq!(a, b);
    }

    #[test]
    fn test_equal_requires_same_sort() {
        let a = Expression::constant(Constant::bit_vector_u64(3, 4), Sort::bit_vector(4));
        let b = Expression::constant(Constant::bit_vector_u64(3, 8), Sort::bit_vector(8));
        assert!(Expression::equal(a, b).is_err());
    }

    #[test]
    fn test_substitute_replaces_matching_variable_only() {
        let x = Variable::new("x", Sort::bit_vector(4), Role::State);
        let y = Variable::new("y", Sort::bit_vector(4), Role::State);
        let expr = BitVector::add(x.clone().into(), y.clone().into()).unwrap();

        let replacement: Expression =
            Expression::constant(Constant::bit_vector_u64(1, 4), Sort::bit_vector(4));
        let substituted = expr.substitute(&x, &replacement);

        assert_eq!(substituted.variables(), vec![&y]);
    }

    #[test]
    fn test_variables_collects_in_order() {
        let x = Variable::new("x", Sort::bit_vector(4), Role::Input);
        let y = Variable::new("y", Sort::bit_vector(4), Role::Input);
        let expr = BitVector::add(x.clone().into(), y.clone().into()).unwrap();
        assert_eq!(expr.variables(), vec![&x, &y]);
    }
}
