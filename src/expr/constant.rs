use crate::error::Result;
use crate::expr::{ArrayValue, BitVectorValue};
use num_bigint::BigUint;
use std::convert::TryFrom;
use std::fmt;

/// A fully-evaluated value: the leaf of a solver model, or a literal in
/// source text.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Constant {
    Boolean(bool),
    BitVector(BitVectorValue),
    Array(Box<ArrayValue>),
}

impl Constant {
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn bit_vector(value: BitVectorValue) -> Self {
        Self::BitVector(value)
    }

    pub fn bit_vector_u64(value: u64, bits: usize) -> Self {
        Self::bit_vector(BitVectorValue::new(value, bits))
    }

    pub fn bit_vector_big_uint(value: BigUint, bits: usize) -> Result<Self> {
        Ok(Self::bit_vector(BitVectorValue::checked_new_big(
            value, bits,
        )?))
    }

    pub fn array(value: ArrayValue) -> Self {
        Self::Array(Box::new(value))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    pub fn is_bit_vector(&self) -> bool {
        matches!(self, Self::BitVector(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn unwrap_boolean(&self) -> bool {
        match self {
            Self::Boolean(v) => *v,
            _ => panic!("Expected Boolean"),
        }
    }

    pub fn unwrap_bit_vector(&self) -> &BitVectorValue {
        match self {
            Self::BitVector(v) => v,
            _ => panic!("Expected BitVec"),
        }
    }

    pub fn unwrap_array(&self) -> &ArrayValue {
        match self {
            Self::Array(v) => v,
            _ => panic!("Expected Array"),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::BitVector(v) => write!(f, "{}", v),
            Self::Array(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

impl From<BitVectorValue> for Constant {
    fn from(value: BitVectorValue) -> Self {
        Self::bit_vector(value)
    }
}

impl From<ArrayValue> for Constant {
    fn from(value: ArrayValue) -> Self {
        Self::array(value)
    }
}

impl TryFrom<&Constant> for bool {
    type Error = &'static str;

    fn try_from(c: &Constant) -> std::result::Result<bool, Self::Error> {
        match c {
            Constant::Boolean(v) => Ok(*v),
            Constant::BitVector(v) => Ok(!v.is_zero()),
            _ => Err("Cannot convert constant to bool"),
        }
    }
}

impl TryFrom<&Constant> for u64 {
    type Error = &'static str;

    fn try_from(c: &Constant) -> std::result::Result<u64, Self::Error> {
        match c {
            Constant::Boolean(true) => Ok(1),
            Constant::Boolean(false) => Ok(0),
            Constant::BitVector(v) => v.value_u64().ok_or("failed to convert to u64"),
            _ => Err("Cannot convert constant to u64"),
        }
    }
}
