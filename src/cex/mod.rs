//! Counter-example extraction and stable-format rendering (§4.4, §6).

use crate::expr::Constant;
use std::fmt;

/// Every signal's value at one unrolled step: inputs, states, and the
/// designated output, in insertion order (§4.4's input-then-state-
/// then-output grouping), not alphabetical.
#[derive(Clone, Debug, Default)]
pub struct StepValues {
    signals: Vec<(String, Constant)>,
}

impl StepValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Constant) {
        let name = name.into();
        match self.signals.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.signals.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Constant> {
        self.signals.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Constant)> {
        self.signals.iter().map(|(n, v)| (n, v))
    }
}

/// A `PropertyHit` witness: the step at which the property held, the
/// source text of the property that was checked, and every signal's
/// value at every unrolled step 0..=hit_step.
#[derive(Clone, Debug)]
pub struct CounterExample {
    property: String,
    hit_step: usize,
    steps: Vec<StepValues>,
}

impl CounterExample {
    pub fn new(property: impl Into<String>, hit_step: usize, steps: Vec<StepValues>) -> Self {
        Self {
            property: property.into(),
            hit_step,
            steps,
        }
    }

    pub fn hit_step(&self) -> usize {
        self.hit_step
    }

    pub fn steps(&self) -> &[StepValues] {
        &self.steps
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl fmt::Display for CounterExample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "!!! Property '{}' holds at step {} !!!",
            self.property, self.hit_step
        )?;
        for (k, values) in self.steps.iter().enumerate() {
            writeln!(f, "--- step {} ---", k)?;
            for (name, value) in values.iter() {
                writeln!(f, "  {}: {}", name, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BitVectorValue;

    #[test]
    fn test_display_matches_stable_format() {
        let mut step0 = StepValues::new();
        step0.insert("clk", Constant::boolean(false));
        step0.insert("out", Constant::bit_vector(BitVectorValue::new(0, 4)));

        let cex = CounterExample::new("out == 2", 0, vec![step0]);
        let rendered = cex.to_string();

        assert_eq!(
            rendered,
            "!!! Property 'out == 2' holds at step 0 !!!\n--- step 0 ---\n  clk: false\n  out: 0_4\n"
        );
    }
}
