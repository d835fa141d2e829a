use crate::error::Result;

/// Implemented by IR types that carry structural invariants which can't
/// be enforced purely by their constructors (cross-referencing fields,
/// ordering constraints, and the like).
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
