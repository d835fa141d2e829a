use crate::error::Result;
use bit_vec::BitVec;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A concrete, width-tagged bit-vector value.
///
/// Backed by `bit_vec::BitVec` (bit `i` is the `i`-th least-significant
/// bit) so that width-exact literals of arbitrary size can be built
/// without losing bits to a fixed-width integer, while still offering a
/// `BigUint` view for arithmetic-free consumers (decimal printing,
/// comparisons).
#[derive(Clone, Debug)]
pub struct BitVectorValue {
    bits: BitVec,
}

impl BitVectorValue {
    pub fn new(value: u64, width: usize) -> Self {
        Self::new_big(BigUint::from(value), width)
    }

    pub fn new_big(value: BigUint, width: usize) -> Self {
        let mut bits = BitVec::from_elem(width, false);
        for i in 0..width {
            bits.set(i, value.bit(i as u64));
        }
        Self { bits }
    }

    /// Parses a BTOR2 `const` binary literal (e.g. `"0101"`); the string
    /// length fixes the width.
    pub fn from_binary_str(s: &str) -> Result<Self> {
        let width = s.len();
        let mut bits = BitVec::from_elem(width, false);
        for (i, c) in s.chars().rev().enumerate() {
            match c {
                '0' => {}
                '1' => bits.set(i, true),
                _ => return Err(format!("Invalid binary digit '{}'", c).into()),
            }
        }
        Ok(Self { bits })
    }

    pub fn zero(width: usize) -> Self {
        Self::new(0, width)
    }

    pub fn bits(&self) -> usize {
        self.bits.len()
    }

    pub fn is_zero(&self) -> bool {
        !self.bits.iter().any(|b| b)
    }

    pub fn value(&self) -> BigUint {
        let mut v = BigUint::from(0u8);
        for i in (0..self.bits.len()).rev() {
            v <<= 1u32;
            if self.bits.get(i).unwrap_or(false) {
                v |= BigUint::from(1u8);
            }
        }
        v
    }

    pub fn value_u64(&self) -> Option<u64> {
        self.value().to_u64()
    }

    /// Fails if `value` needs more than `width` bits.
    pub fn checked_new_big(value: BigUint, width: usize) -> Result<Self> {
        let needed = value.bits() as usize;
        if needed > width {
            return Err(format!(
                "Literal {} does not fit into {} bits (needs {})",
                value, width, needed
            )
            .into());
        }
        Ok(Self::new_big(value, width))
    }
}

impl PartialEq for BitVectorValue {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits() && self.value() == other.value()
    }
}

impl Eq for BitVectorValue {}

impl Hash for BitVectorValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
        self.value().hash(state);
    }
}

impl PartialOrd for BitVectorValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BitVectorValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bits()
            .cmp(&other.bits())
            .then_with(|| self.value().cmp(&other.value()))
    }
}

impl fmt::Display for BitVectorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.value(), self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_binary_str_round_trips_through_value() {
        let v = BitVectorValue::from_binary_str("0010").unwrap();
        assert_eq!(v.bits(), 4);
        assert_eq!(v.value_u64(), Some(2));
        assert_eq!(v.to_string(), "2_4");
    }

    #[test]
    fn test_checked_new_big_rejects_overflow() {
        assert!(BitVectorValue::checked_new_big(BigUint::from(16u8), 4).is_err());
        assert!(BitVectorValue::checked_new_big(BigUint::from(15u8), 4).is_ok());
    }

    #[test]
    fn test_is_zero() {
        assert!(BitVectorValue::new(0, 8).is_zero());
        assert!(!BitVectorValue::new(1, 8).is_zero());
    }
}
