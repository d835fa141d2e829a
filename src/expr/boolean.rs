use crate::error::Result;
use crate::expr::{Expression, Sort};
use std::fmt;

/// Propositional operators.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Boolean {
    Not,
    And,
    Or,
    Xor,
    Implies,
    Iff,
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Not => write!(f, "not"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Xor => write!(f, "xor"),
            Self::Implies => write!(f, "=>"),
            Self::Iff => write!(f, "="),
        }
    }
}

macro_rules! bool_binary {
    ( $name:ident, $variant:ident ) => {
        pub fn $name(lhs: Expression, rhs: Expression) -> Result<Expression> {
            lhs.sort().expect_boolean()?;
            rhs.sort().expect_boolean()?;

            Ok(Expression::new(Self::$variant.into(), vec![lhs, rhs], Sort::boolean()))
        }
    };
}

impl Boolean {
    pub fn not(expr: Expression) -> Result<Expression> {
        expr.sort().expect_boolean()?;

        Ok(Expression::new(Self::Not.into(), vec![expr], Sort::boolean()))
    }

    bool_binary!(and, And);
    bool_binary!(or, Or);
    bool_binary!(xor, Xor);
    bool_binary!(implies, Implies);
    bool_binary!(iff, Iff);

    /// Conjunction of a (possibly empty) slice of Boolean formulas; the
    /// empty conjunction is `true`.
    pub fn conjunction(formulas: &[Expression]) -> Result<Expression> {
        for formula in formulas {
            formula.sort().expect_boolean()?;
        }
        match formulas.len() {
            0 => Ok(Expression::constant(true.into(), Sort::boolean())),
            1 => Ok(formulas[0].clone()),
            _ => Ok(Expression::new(Self::And.into(), formulas.to_vec(), Sort::boolean())),
        }
    }

    /// Disjunction of a (possibly empty) slice of Boolean formulas; the
    /// empty disjunction is `false`.
    pub fn disjunction(formulas: &[Expression]) -> Result<Expression> {
        for formula in formulas {
            formula.sort().expect_boolean()?;
        }
        match formulas.len() {
            0 => Ok(Expression::constant(false.into(), Sort::boolean())),
            1 => Ok(formulas[0].clone()),
            _ => Ok(Expression::new(Self::Or.into(), formulas.to_vec(), Sort::boolean())),
        }
    }
}
