use crate::error::Result;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default bound when neither `-k` nor the environment file set one.
pub const DEFAULT_K_MAX: usize = 20;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Solver {
    #[serde(rename = "z3")]
    Z3,
    #[serde(rename = "cvc4")]
    Cvc4,
    #[serde(rename = "yices2")]
    Yices2,
}

impl Default for Solver {
    fn default() -> Self {
        Self::Z3
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Z3 => write!(f, "Z3"),
            Self::Cvc4 => write!(f, "CVC4"),
            Self::Yices2 => write!(f, "Yices2"),
        }
    }
}

/// Run configuration: loadable from a sibling `.yaml` file or `--env`,
/// then overridden field-by-field by CLI flags (teacher's
/// `build_environment` pattern).
#[derive(Debug, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub solver: Solver,
    #[serde(default = "default_k_max")]
    pub k_max: usize,
    #[serde(default)]
    pub solver_timeout_ms: Option<u64>,
    #[serde(default = "disabled")]
    pub debug: bool,
    #[serde(default = "disabled")]
    pub skip_solving: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            solver: Solver::default(),
            k_max: default_k_max(),
            solver_timeout_ms: None,
            debug: false,
            skip_solving: false,
        }
    }
}

impl Environment {
    pub fn from_file(path: &Path) -> Result<Environment> {
        let file = File::open(path)
            .map_err(|_| format!("Environment file '{}' could not be loaded", path.display()))?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }

    pub fn k_max(&self) -> usize {
        self.k_max
    }

    pub fn solver_timeout_ms(&self) -> Option<u64> {
        self.solver_timeout_ms
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_yaml::to_string(self).unwrap())
    }
}

fn disabled() -> bool {
    false
}

fn default_k_max() -> usize {
    DEFAULT_K_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_environment_uses_default_k_max() {
        let env = Environment::default();
        assert_eq!(env.k_max(), DEFAULT_K_MAX);
        assert!(!env.debug);
    }
}
