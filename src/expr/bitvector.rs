use crate::error::Result;
use crate::expr::{Expression, Sort};
use std::fmt;

/// Bit-vector operators (§3 `Bv*` node kinds). Comparisons follow the
/// BTOR2 convention of returning a 1-bit `BitVec` rather than `Bool`.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum BitVector {
    Not,
    Neg,
    RedAnd,
    RedOr,
    RedXor,
    Inc,
    Dec,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Add,
    Sub,
    Mul,
    Udiv,
    Sdiv,
    Urem,
    Srem,
    Smod,
    Shl,
    Lshr,
    Ashr,
    Rol,
    Ror,
    Ult,
    Ulte,
    Ugt,
    Ugte,
    Slt,
    Slte,
    Sgt,
    Sgte,
    Concat,
    Extract(usize, usize),
    Zext(usize),
    Sext(usize),
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Not => write!(f, "bvnot"),
            Self::Neg => write!(f, "bvneg"),
            Self::RedAnd => write!(f, "redand"),
            Self::RedOr => write!(f, "redor"),
            Self::RedXor => write!(f, "redxor"),
            Self::Inc => write!(f, "inc"),
            Self::Dec => write!(f, "dec"),
            Self::And => write!(f, "bvand"),
            Self::Or => write!(f, "bvor"),
            Self::Xor => write!(f, "bvxor"),
            Self::Nand => write!(f, "bvnand"),
            Self::Nor => write!(f, "bvnor"),
            Self::Xnor => write!(f, "bvxnor"),
            Self::Add => write!(f, "bvadd"),
            Self::Sub => write!(f, "bvsub"),
            Self::Mul => write!(f, "bvmul"),
            Self::Udiv => write!(f, "bvudiv"),
            Self::Sdiv => write!(f, "bvsdiv"),
            Self::Urem => write!(f, "bvurem"),
            Self::Srem => write!(f, "bvsrem"),
            Self::Smod => write!(f, "bvsmod"),
            Self::Shl => write!(f, "bvshl"),
            Self::Lshr => write!(f, "bvlshr"),
            Self::Ashr => write!(f, "bvashr"),
            Self::Rol => write!(f, "rol"),
            Self::Ror => write!(f, "ror"),
            Self::Ult => write!(f, "bvult"),
            Self::Ulte => write!(f, "bvule"),
            Self::Ugt => write!(f, "bvugt"),
            Self::Ugte => write!(f, "bvuge"),
            Self::Slt => write!(f, "bvslt"),
            Self::Slte => write!(f, "bvsle"),
            Self::Sgt => write!(f, "bvsgt"),
            Self::Sgte => write!(f, "bvsge"),
            Self::Concat => write!(f, "concat"),
            Self::Extract(hi, lo) => write!(f, "(_ extract {} {})", hi, lo),
            Self::Zext(n) => write!(f, "zero_extend {}", n),
            Self::Sext(n) => write!(f, "sign_extend {}", n),
        }
    }
}

macro_rules! bv_unary_same_width {
    ( $name:ident, $variant:ident ) => {
        pub fn $name(expr: Expression) -> Result<Expression> {
            expr.sort().expect_bit_vector()?;
            let sort = expr.sort().clone();
            Ok(Expression::new(Self::$variant.into(), vec![expr], sort))
        }
    };
}

macro_rules! bv_unary_to_bool1 {
    ( $name:ident, $variant:ident ) => {
        pub fn $name(expr: Expression) -> Result<Expression> {
            expr.sort().expect_bit_vector()?;
            Ok(Expression::new(
                Self::$variant.into(),
                vec![expr],
                Sort::bit_vector(1),
            ))
        }
    };
}

macro_rules! bv_binary_same_width {
    ( $name:ident, $variant:ident ) => {
        pub fn $name(lhs: Expression, rhs: Expression) -> Result<Expression> {
            lhs.sort().expect_bit_vector()?;
            rhs.sort().expect_sort(lhs.sort())?;
            let sort = lhs.sort().clone();
            Ok(Expression::new(Self::$variant.into(), vec![lhs, rhs], sort))
        }
    };
}

macro_rules! bv_compare {
    ( $name:ident, $variant:ident ) => {
        pub fn $name(lhs: Expression, rhs: Expression) -> Result<Expression> {
            lhs.sort().expect_bit_vector()?;
            rhs.sort().expect_sort(lhs.sort())?;
            Ok(Expression::new(
                Self::$variant.into(),
                vec![lhs, rhs],
                Sort::bit_vector(1),
            ))
        }
    };
}

impl BitVector {
    bv_unary_same_width!(not, Not);
    bv_unary_same_width!(neg, Neg);
    bv_unary_same_width!(inc, Inc);
    bv_unary_same_width!(dec, Dec);

    bv_unary_to_bool1!(redand, RedAnd);
    bv_unary_to_bool1!(redor, RedOr);
    bv_unary_to_bool1!(redxor, RedXor);

    bv_binary_same_width!(and, And);
    bv_binary_same_width!(or, Or);
    bv_binary_same_width!(xor, Xor);
    bv_binary_same_width!(nand, Nand);
    bv_binary_same_width!(nor, Nor);
    bv_binary_same_width!(xnor, Xnor);
    bv_binary_same_width!(add, Add);
    bv_binary_same_width!(sub, Sub);
    bv_binary_same_width!(mul, Mul);
    bv_binary_same_width!(udiv, Udiv);
    bv_binary_same_width!(sdiv, Sdiv);
    bv_binary_same_width!(urem, Urem);
    bv_binary_same_width!(srem, Srem);
    bv_binary_same_width!(smod, Smod);
    bv_binary_same_width!(shl, Shl);
    bv_binary_same_width!(lshr, Lshr);
    bv_binary_same_width!(ashr, Ashr);
    bv_binary_same_width!(rol, Rol);
    bv_binary_same_width!(ror, Ror);

    bv_compare!(ult, Ult);
    bv_compare!(ulte, Ulte);
    bv_compare!(ugt, Ugt);
    bv_compare!(ugte, Ugte);
    bv_compare!(slt, Slt);
    bv_compare!(slte, Slte);
    bv_compare!(sgt, Sgt);
    bv_compare!(sgte, Sgte);

    pub fn concat(lhs: Expression, rhs: Expression) -> Result<Expression> {
        lhs.sort().expect_bit_vector()?;
        rhs.sort().expect_bit_vector()?;
        let width = lhs.sort().unwrap_bit_vector() + rhs.sort().unwrap_bit_vector();
        Ok(Expression::new(
            Self::Concat.into(),
            vec![lhs, rhs],
            Sort::bit_vector(width),
        ))
    }

    /// `slice hi lo` in BTOR2; result width is `hi - lo + 1`.
    pub fn extract(expr: Expression, hi: usize, lo: usize) -> Result<Expression> {
        expr.sort().expect_bit_vector()?;
        let width = expr.sort().unwrap_bit_vector();
        if hi < lo || hi >= width {
            return Err(format!(
                "Extract bounds [{}, {}] out of range for width {}",
                hi, lo, width
            )
            .into());
        }
        Ok(Expression::new(
            Self::Extract(hi, lo).into(),
            vec![expr],
            Sort::bit_vector(hi - lo + 1),
        ))
    }

    pub fn zero_extend(expr: Expression, n: usize) -> Result<Expression> {
        expr.sort().expect_bit_vector()?;
        let width = expr.sort().unwrap_bit_vector() + n;
        Ok(Expression::new(
            Self::Zext(n).into(),
            vec![expr],
            Sort::bit_vector(width),
        ))
    }

    pub fn sign_extend(expr: Expression, n: usize) -> Result<Expression> {
        expr.sort().expect_bit_vector()?;
        let width = expr.sort().unwrap_bit_vector() + n;
        Ok(Expression::new(
            Self::Sext(n).into(),
            vec![expr],
            Sort::bit_vector(width),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Role, Variable};

    fn bv(name: &str, width: usize) -> Expression {
        Variable::new(name, Sort::bit_vector(width), Role::Aux).into()
    }

    #[test]
    fn test_concat_sums_widths() {
        let expr = BitVector::concat(bv("a", 4), bv("b", 8)).unwrap();
        assert_eq!(*expr.sort(), Sort::bit_vector(12));
    }

    #[test]
    fn test_extract_computes_width() {
        let expr = BitVector::extract(bv("a", 8), 5, 2).unwrap();
        assert_eq!(*expr.sort(), Sort::bit_vector(4));
    }

    #[test]
    fn test_extract_rejects_out_of_range() {
        assert!(BitVector::extract(bv("a", 8), 8, 0).is_err());
        assert!(BitVector::extract(bv("a", 8), 2, 5).is_err());
    }

    #[test]
    fn test_add_requires_matching_width() {
        assert!(BitVector::add(bv("a", 4), bv("b", 8)).is_err());
        assert!(BitVector::add(bv("a", 4), bv("b", 4)).is_ok());
    }

    #[test]
    fn test_comparison_result_is_one_bit() {
        let expr = BitVector::ult(bv("a", 8), bv("b", 8)).unwrap();
        assert_eq!(*expr.sort(), Sort::bit_vector(1));
    }

    #[test]
    fn test_zero_extend_widens() {
        let expr = BitVector::zero_extend(bv("a", 4), 4).unwrap();
        assert_eq!(*expr.sort(), Sort::bit_vector(8));
    }
}
