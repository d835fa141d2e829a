use crate::error::Result;
use crate::expr::{Constant, Expression, Sort};
use std::collections::BTreeMap;
use std::fmt;

/// Array read/write operators (`ArrayRead`/`ArrayWrite` in `spec.md` §3).
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Array {
    Read,
    Write,
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

impl Array {
    pub fn read(array: Expression, index: Expression) -> Result<Expression> {
        array.sort().expect_array()?;
        let (idx_sort, elem_sort) = array.sort().unwrap_array();
        index.sort().expect_sort(idx_sort)?;

        let result_sort = elem_sort.clone();
        Ok(Expression::new(Self::Read.into(), vec![array, index], result_sort))
    }

    pub fn write(array: Expression, index: Expression, value: Expression) -> Result<Expression> {
        array.sort().expect_array()?;
        let (idx_sort, elem_sort) = array.sort().unwrap_array();
        index.sort().expect_sort(idx_sort)?;
        value.sort().expect_sort(elem_sort)?;

        let result_sort = array.sort().clone();
        Ok(Expression::new(
            Self::Write.into(),
            vec![array, index, value],
            result_sort,
        ))
    }
}

/// A concrete array model value: a sparse map of entries over an
/// (optional) default, exactly as the solver reports it (§4.4: `{idx0:
/// v0, idx1: v1, default: d}`).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ArrayValue {
    entries: BTreeMap<Constant, Constant>,
    default: Option<Constant>,
}

impl ArrayValue {
    pub fn new(default: Option<Constant>) -> Self {
        Self {
            entries: BTreeMap::new(),
            default,
        }
    }

    pub fn select(&self, index: &Constant) -> Option<&Constant> {
        self.entries.get(index).or(self.default.as_ref())
    }

    pub fn store(&mut self, index: Constant, value: Constant) {
        self.entries.insert(index, value);
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Constant, &Constant)> {
        self.entries.iter()
    }

    pub fn default_value(&self) -> Option<&Constant> {
        self.default.as_ref()
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (index, value) in &self.entries {
            write!(f, "{}: {}, ", index, value)?;
        }
        match &self.default {
            Some(value) => write!(f, "default: {}", value)?,
            None => write!(f, "default: ?")?,
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Role;
    use crate::expr::Variable;

    #[test]
    fn test_read_after_write_sorts_match() {
        let arr = Variable::new(
            "mem",
            Sort::array(&Sort::bit_vector(4), &Sort::bit_vector(8)),
            Role::Aux,
        );
        let idx: Expression = Variable::new("idx", Sort::bit_vector(4), Role::Aux).into();
        let val: Expression = Variable::new("val", Sort::bit_vector(8), Role::Aux).into();

        let written = Array::write(arr.into(), idx.clone(), val).unwrap();
        let read = Array::read(written, idx).unwrap();

        assert_eq!(*read.sort(), Sort::bit_vector(8));
    }

    #[test]
    fn test_array_value_select_falls_back_to_default() {
        let mut value = ArrayValue::new(Some(Constant::bit_vector_u64(0, 8)));
        value.store(Constant::bit_vector_u64(3, 4), Constant::bit_vector_u64(9, 8));

        assert_eq!(
            value.select(&Constant::bit_vector_u64(3, 4)),
            Some(&Constant::bit_vector_u64(9, 8))
        );
        assert_eq!(
            value.select(&Constant::bit_vector_u64(1, 4)),
            Some(&Constant::bit_vector_u64(0, 8))
        );
    }
}
