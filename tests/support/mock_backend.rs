//! An in-memory `Solver` for integration tests: no SMT binary is
//! spawned. It evaluates the deterministic `Let`/`Assume`-shaped
//! equalities the BMC engine asserts (init/transition/stimulus, always
//! fully grounded once the previous step is known) directly, and
//! brute-forces the handful of genuinely free bits that survive into a
//! property query, such as an unconstrained initial state.
//!
//! This is deliberately not a general solver: a `constraint` or
//! stimulus assertion that isn't a plain `var == <value>` equality is
//! only usable as the final, bracketed property query, never as a
//! source of new bindings.

use hwbmc::error::Result;
use hwbmc::expr::{Boolean, BitVector, Constant, Expression, Operator, Sort, Variable};
use hwbmc::solver::{CheckSatResult, DumpFormula, SmtBackend};
use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::path::Path;

pub struct MockBackend {
    sorts: RefCell<BTreeMap<String, Sort>>,
    model: RefCell<BTreeMap<String, Constant>>,
    frames: RefCell<Vec<Vec<String>>>,
    last_query: RefCell<Option<Expression>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            sorts: RefCell::new(BTreeMap::new()),
            model: RefCell::new(BTreeMap::new()),
            frames: RefCell::new(Vec::new()),
            last_query: RefCell::new(None),
        }
    }

    fn learn(&self, key: String, value: Constant) {
        self.model.borrow_mut().insert(key.clone(), value);
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.push(key);
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtBackend for MockBackend {
    fn declare_const(&mut self, variable: &Variable) -> Result<()> {
        self.sorts
            .borrow_mut()
            .insert(variable.identifier(), variable.sort().clone());
        Ok(())
    }

    fn assert(&mut self, formula: &Expression) -> Result<()> {
        let frame_open = !self.frames.borrow().is_empty();
        if !frame_open {
            if let Operator::Equal = formula.operator() {
                let lhs = &formula.operands()[0];
                let rhs = &formula.operands()[1];
                if let Operator::Variable(v) = lhs.operator() {
                    let snapshot = self.model.borrow().clone();
                    if !snapshot.contains_key(&v.identifier()) {
                        if let Some(value) = evaluate(rhs, &snapshot) {
                            self.learn(v.identifier(), value);
                            return Ok(());
                        }
                    }
                }
            }
        }
        *self.last_query.borrow_mut() = Some(formula.clone());
        Ok(())
    }

    fn push(&mut self) -> Result<()> {
        self.frames.borrow_mut().push(Vec::new());
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        if let Some(frame) = self.frames.borrow_mut().pop() {
            let mut model = self.model.borrow_mut();
            for key in frame {
                model.remove(&key);
            }
        }
        Ok(())
    }

    fn check_sat(&mut self) -> Result<CheckSatResult> {
        let query = self
            .last_query
            .borrow()
            .clone()
            .ok_or("mock backend: check-sat with no pending query")?;
        let snapshot = self.model.borrow().clone();

        if let Some(c) = evaluate(&query, &snapshot) {
            let truth = bool::try_from(&c).unwrap_or(false);
            return Ok(if truth {
                CheckSatResult::Sat
            } else {
                CheckSatResult::Unsat
            });
        }

        let free = free_vars(&query, &snapshot);
        let total_bits: usize = free.iter().map(|v| v.sort().bit_width().unwrap_or(1)).sum();
        if free.is_empty() || total_bits > 16 {
            return Ok(CheckSatResult::Unknown);
        }

        let mut assignment = snapshot;
        match brute_force(&query, &free, &mut assignment, 0) {
            Some(found) => {
                for (key, value) in found {
                    self.learn(key, value);
                }
                Ok(CheckSatResult::Sat)
            }
            None => Ok(CheckSatResult::Unsat),
        }
    }

    fn get_value(&mut self, expr: &Expression) -> Result<Constant> {
        let snapshot = self.model.borrow().clone();
        evaluate(expr, &snapshot).ok_or_else(|| "mock backend: value not determined".into())
    }
}

impl DumpFormula for MockBackend {
    fn dump_formula_to_file(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

fn free_vars(expr: &Expression, model: &BTreeMap<String, Constant>) -> Vec<Variable> {
    let mut seen = std::collections::BTreeSet::new();
    let mut result = Vec::new();
    for v in expr.variables() {
        if !model.contains_key(&v.identifier()) && seen.insert(v.identifier()) {
            result.push(v.clone());
        }
    }
    result
}

fn brute_force(
    query: &Expression,
    free: &[Variable],
    assignment: &mut BTreeMap<String, Constant>,
    idx: usize,
) -> Option<BTreeMap<String, Constant>> {
    if idx == free.len() {
        return match evaluate(query, assignment) {
            Some(c) if bool::try_from(&c).unwrap_or(false) => Some(assignment.clone()),
            _ => None,
        };
    }
    let var = &free[idx];
    let width = var.sort().bit_width().unwrap_or(1).min(16);
    for raw in 0..(1u64 << width) {
        let value = if var.sort().is_boolean() {
            Constant::boolean(raw != 0)
        } else {
            Constant::bit_vector_u64(raw, width)
        };
        assignment.insert(var.identifier(), value);
        if let Some(found) = brute_force(query, free, assignment, idx + 1) {
            return Some(found);
        }
    }
    assignment.remove(&var.identifier());
    None
}

fn mask(width: usize) -> BigUint {
    (BigUint::from(1u8) << width) - BigUint::from(1u8)
}

fn to_signed(value: &BigUint, width: usize) -> BigInt {
    let v = BigInt::from(value.clone());
    let half = BigInt::from(1) << (width - 1);
    if v >= half {
        v - (BigInt::from(1) << width)
    } else {
        v
    }
}

fn bv_value(c: &Constant) -> Option<(BigUint, usize)> {
    match c {
        Constant::Boolean(b) => Some((BigUint::from(*b as u8), 1)),
        Constant::BitVector(v) => Some((v.value(), v.bits())),
        Constant::Array(_) => None,
    }
}

fn bool_result(sort: &Sort, value: bool) -> Constant {
    if sort.is_boolean() {
        Constant::boolean(value)
    } else {
        Constant::bit_vector_u64(value as u64, 1)
    }
}

fn evaluate(expr: &Expression, model: &BTreeMap<String, Constant>) -> Option<Constant> {
    match expr.operator() {
        Operator::Constant(c) => Some(c.clone()),
        Operator::Variable(v) => model.get(&v.identifier()).cloned(),
        Operator::Equal => {
            let l = evaluate(&expr.operands()[0], model)?;
            let r = evaluate(&expr.operands()[1], model)?;
            Some(Constant::boolean(l == r))
        }
        Operator::Ite => {
            let c = evaluate(&expr.operands()[0], model)?;
            let cond = bool::try_from(&c).ok()?;
            evaluate(&expr.operands()[if cond { 1 } else { 2 }], model)
        }
        Operator::Boolean(op) => eval_boolean(op, expr.operands(), model),
        Operator::BitVector(op) => eval_bitvector(op, expr.operands(), model, expr.sort()),
        Operator::Array(_) => None,
    }
}

fn eval_boolean(op: &Boolean, operands: &[Expression], model: &BTreeMap<String, Constant>) -> Option<Constant> {
    let mut vals = Vec::with_capacity(operands.len());
    for operand in operands {
        vals.push(bool::try_from(&evaluate(operand, model)?).ok()?);
    }
    let result = match op {
        Boolean::Not => !vals[0],
        Boolean::And => vals[0] && vals[1],
        Boolean::Or => vals[0] || vals[1],
        Boolean::Xor => vals[0] ^ vals[1],
        Boolean::Implies => !vals[0] || vals[1],
        Boolean::Iff => vals[0] == vals[1],
    };
    Some(Constant::boolean(result))
}

fn eval_bitvector(
    op: &BitVector,
    operands: &[Expression],
    model: &BTreeMap<String, Constant>,
    result_sort: &Sort,
) -> Option<Constant> {
    use BitVector::*;

    let get = |i: usize| -> Option<(BigUint, usize)> { bv_value(&evaluate(&operands[i], model)?) };

    match op {
        Not => {
            let (a, w) = get(0)?;
            Constant::bit_vector_big_uint(mask(w) ^ a, w).ok()
        }
        Neg => {
            let (a, w) = get(0)?;
            let modulus = mask(w) + BigUint::from(1u8);
            Constant::bit_vector_big_uint((&modulus - a % &modulus) % &modulus, w).ok()
        }
        And => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            Constant::bit_vector_big_uint(a & b, w).ok()
        }
        Or => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            Constant::bit_vector_big_uint(a | b, w).ok()
        }
        Xor => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            Constant::bit_vector_big_uint(a ^ b, w).ok()
        }
        Add => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            Constant::bit_vector_big_uint((a + b) & mask(w), w).ok()
        }
        Sub => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            let modulus = mask(w) + BigUint::from(1u8);
            Constant::bit_vector_big_uint((&modulus + a - b) % &modulus, w).ok()
        }
        Mul => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            Constant::bit_vector_big_uint((a * b) & mask(w), w).ok()
        }
        Udiv => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            if b == BigUint::from(0u8) {
                Constant::bit_vector_big_uint(mask(w), w).ok()
            } else {
                Constant::bit_vector_big_uint(a / b, w).ok()
            }
        }
        Urem => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            if b == BigUint::from(0u8) {
                Constant::bit_vector_big_uint(a, w).ok()
            } else {
                Constant::bit_vector_big_uint(a % b, w).ok()
            }
        }
        Shl => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            let shift = b.to_u64().unwrap_or(0) as usize;
            let v = if shift >= w { BigUint::from(0u8) } else { (a << shift) & mask(w) };
            Constant::bit_vector_big_uint(v, w).ok()
        }
        Lshr => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            let shift = b.to_u64().unwrap_or(0) as usize;
            let v = if shift >= w { BigUint::from(0u8) } else { a >> shift };
            Constant::bit_vector_big_uint(v, w).ok()
        }
        Ashr => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            let shift = b.to_u64().unwrap_or(0) as usize;
            let sign = a.bit((w - 1) as u64);
            let v = if shift >= w {
                if sign { mask(w) } else { BigUint::from(0u8) }
            } else {
                let shifted = a >> shift;
                if sign {
                    shifted | (mask(w) ^ mask(w - shift))
                } else {
                    shifted
                }
            };
            Constant::bit_vector_big_uint(v, w).ok()
        }
        Ult | Ulte | Ugt | Ugte => {
            let (a, _) = get(0)?;
            let (b, _) = get(1)?;
            let r = match op {
                Ult => a < b,
                Ulte => a <= b,
                Ugt => a > b,
                Ugte => a >= b,
                _ => unreachable!(),
            };
            Some(bool_result(result_sort, r))
        }
        Slt | Slte | Sgt | Sgte => {
            let (a, w) = get(0)?;
            let (b, _) = get(1)?;
            let (sa, sb) = (to_signed(&a, w), to_signed(&b, w));
            let r = match op {
                Slt => sa < sb,
                Slte => sa <= sb,
                Sgt => sa > sb,
                Sgte => sa >= sb,
                _ => unreachable!(),
            };
            Some(bool_result(result_sort, r))
        }
        Concat => {
            let (a, wa) = get(0)?;
            let (b, wb) = get(1)?;
            Constant::bit_vector_big_uint((a << wb) | b, wa + wb).ok()
        }
        Extract(hi, lo) => {
            let (a, _) = get(0)?;
            Constant::bit_vector_big_uint((a >> *lo) & mask(hi - lo + 1), hi - lo + 1).ok()
        }
        Zext(n) => {
            let (a, w) = get(0)?;
            Constant::bit_vector_big_uint(a, w + n).ok()
        }
        Sext(n) => {
            let (a, w) = get(0)?;
            let sign = a.bit((w - 1) as u64);
            let v = if sign {
                a | (mask(w + *n) ^ mask(w))
            } else {
                a
            };
            Constant::bit_vector_big_uint(v, w + n).ok()
        }
        // Not needed by any scenario this scaffold drives; a real solver
        // backend handles these, this one reports unknown.
        RedAnd | RedOr | RedXor | Inc | Dec | Nand | Nor | Xnor | Sdiv | Srem | Smod | Rol | Ror => None,
    }
}
