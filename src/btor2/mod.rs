//! The BTOR2 line-oriented parser (§4.1): a single linear pass over an
//! `nid -> Expression` table, producing a `ModelIR`.

use crate::error::{Error, ErrorKind, Result};
use crate::expr::{Array, BitVector, Boolean, Constant, Expression, Role, Sort, Variable};
use crate::model::{ModelIR, Output, OutputKind, State};
use num_bigint::BigUint;
use num_traits::Num;
use std::collections::BTreeMap;
use std::fmt;

/// Closed-set classification of a BTOR2 parse failure (§4.1's
/// `BTOR2ParseError { line_no, reason }` contract): a caller can match
/// on the variant instead of scraping the rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Btor2ParseReason {
    /// An op token this parser doesn't recognize.
    UnknownOp(String),
    /// A nid that was referenced but never defined.
    UndefinedRef(i64),
    /// Two operand sorts that are required to match don't.
    SortMismatch(String),
    /// An operand, result, or literal width is wrong for its operator.
    WidthMismatch(String),
    /// A `state` line already has an `init`.
    DuplicateInit(i64),
    /// A `state` line has no `next`.
    DanglingState(String),
    /// Any other malformed line (missing or unparsable tokens) that
    /// doesn't fall into the categories above.
    Malformed(String),
}

impl fmt::Display for Btor2ParseReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownOp(op) => write!(f, "unknown op '{}'", op),
            Self::UndefinedRef(nid) => write!(f, "undefined ref {}", nid),
            Self::SortMismatch(detail) => write!(f, "sort mismatch: {}", detail),
            Self::WidthMismatch(detail) => write!(f, "width mismatch: {}", detail),
            Self::DuplicateInit(nid) => write!(f, "state {} already has an init", nid),
            Self::DanglingState(name) => write!(f, "state '{}' has no next", name),
            Self::Malformed(detail) => write!(f, "{}", detail),
        }
    }
}

fn parse_error(line_no: usize, reason: Btor2ParseReason) -> Error {
    ErrorKind::Btor2Parse(line_no, reason).into()
}

fn malformed(line_no: usize, detail: impl Into<String>) -> Error {
    parse_error(line_no, Btor2ParseReason::Malformed(detail.into()))
}

struct Parser {
    line_no: usize,
    sorts: BTreeMap<i64, Sort>,
    exprs: BTreeMap<i64, Expression>,
    state_init: BTreeMap<i64, Option<Expression>>,
    state_next: BTreeMap<i64, Option<Expression>>,
    state_name: BTreeMap<i64, String>,
    state_order: Vec<i64>,
    input_order: Vec<i64>,
    input_name: BTreeMap<i64, String>,
    model: ModelIR,
}

/// Parses a full BTOR2 source text into a `ModelIR`.
pub fn parse(source: &str) -> Result<ModelIR> {
    let mut parser = Parser {
        line_no: 0,
        sorts: BTreeMap::new(),
        exprs: BTreeMap::new(),
        state_init: BTreeMap::new(),
        state_next: BTreeMap::new(),
        state_name: BTreeMap::new(),
        state_order: Vec::new(),
        input_order: Vec::new(),
        input_name: BTreeMap::new(),
        model: ModelIR::new(),
    };
    parser.run(source)
}

impl Parser {
    fn run(mut self, source: &str) -> Result<ModelIR> {
        for raw in source.lines() {
            self.line_no += 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            self.parse_line(line)?;
        }

        for nid in &self.state_order {
            let name = self.state_name[nid].clone();
            let sort = self.sorts[nid].clone();
            let init = self.state_init.get(nid).cloned().flatten();
            let next = match self.state_next.get(nid).cloned().flatten() {
                Some(expr) => expr,
                None => {
                    return Err(parse_error(
                        self.line_no,
                        Btor2ParseReason::DanglingState(name),
                    ))
                }
            };
            self.model.states_mut().push(State::new(name, sort, init, next));
        }
        for nid in &self.input_order {
            let name = self.input_name[nid].clone();
            let sort = self.sorts[nid].clone();
            self.model.inputs_mut().push(crate::model::Input::new(name, sort));
        }
        for (nid, sort) in &self.sorts {
            self.model.sorts_mut().insert(*nid as usize, sort.clone());
        }

        Ok(self.model)
    }

    fn parse_line(&mut self, line: &str) -> Result<()> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(malformed(self.line_no, "expected '<nid> <op> ...'"));
        }
        let nid: i64 = tokens[0]
            .parse()
            .map_err(|_| malformed(self.line_no, format!("invalid nid '{}'", tokens[0])))?;
        let op = tokens[1];
        let rest = &tokens[2..];

        match op {
            "sort" => self.parse_sort(nid, rest),
            "input" => self.parse_input(nid, rest),
            "state" => self.parse_state(nid, rest),
            "init" => self.parse_init(nid, rest),
            "next" => self.parse_next(nid, rest),
            "const" => self.parse_const(nid, rest, 2),
            "constd" => self.parse_const(nid, rest, 10),
            "consth" => self.parse_const(nid, rest, 16),
            "zero" => self.parse_zero_one_ones(nid, rest, ZeroOneOnes::Zero),
            "one" => self.parse_zero_one_ones(nid, rest, ZeroOneOnes::One),
            "ones" => self.parse_zero_one_ones(nid, rest, ZeroOneOnes::Ones),
            "not" => self.unary(nid, rest, |e| BitVector::not(e)),
            "neg" => self.unary(nid, rest, |e| BitVector::neg(e)),
            "redand" => self.unary(nid, rest, |e| BitVector::redand(e)),
            "redor" => self.unary(nid, rest, |e| BitVector::redor(e)),
            "redxor" => self.unary(nid, rest, |e| BitVector::redxor(e)),
            "inc" => self.unary(nid, rest, |e| BitVector::inc(e)),
            "dec" => self.unary(nid, rest, |e| BitVector::dec(e)),
            "and" => self.logical_or_bv(nid, rest, Boolean::and, BitVector::and),
            "or" => self.logical_or_bv(nid, rest, Boolean::or, BitVector::or),
            "xor" => self.logical_or_bv(nid, rest, Boolean::xor, BitVector::xor),
            "nand" => self.binary(nid, rest, |a, b| BitVector::nand(a, b)),
            "nor" => self.binary(nid, rest, |a, b| BitVector::nor(a, b)),
            "xnor" => self.binary(nid, rest, |a, b| BitVector::xnor(a, b)),
            "implies" => self.binary(nid, rest, |a, b| Boolean::implies(a, b)),
            "iff" => self.binary(nid, rest, |a, b| Boolean::iff(a, b)),
            "add" => self.binary(nid, rest, |a, b| BitVector::add(a, b)),
            "sub" => self.binary(nid, rest, |a, b| BitVector::sub(a, b)),
            "mul" => self.binary(nid, rest, |a, b| BitVector::mul(a, b)),
            "udiv" => self.binary(nid, rest, |a, b| BitVector::udiv(a, b)),
            "sdiv" => self.binary(nid, rest, |a, b| BitVector::sdiv(a, b)),
            "urem" => self.binary(nid, rest, |a, b| BitVector::urem(a, b)),
            "srem" => self.binary(nid, rest, |a, b| BitVector::srem(a, b)),
            "smod" => self.binary(nid, rest, |a, b| BitVector::smod(a, b)),
            "sll" => self.binary(nid, rest, |a, b| BitVector::shl(a, b)),
            "srl" => self.binary(nid, rest, |a, b| BitVector::lshr(a, b)),
            "sra" => self.binary(nid, rest, |a, b| BitVector::ashr(a, b)),
            "rol" => self.binary(nid, rest, |a, b| BitVector::rol(a, b)),
            "ror" => self.binary(nid, rest, |a, b| BitVector::ror(a, b)),
            "eq" => self.binary(nid, rest, |a, b| Expression::equal(a, b)),
            "neq" => self.binary(nid, rest, |a, b| Expression::unequal(a, b)),
            "ult" => self.binary(nid, rest, |a, b| BitVector::ult(a, b)),
            "ulte" => self.binary(nid, rest, |a, b| BitVector::ulte(a, b)),
            "ugt" => self.binary(nid, rest, |a, b| BitVector::ugt(a, b)),
            "ugte" => self.binary(nid, rest, |a, b| BitVector::ugte(a, b)),
            "slt" => self.binary(nid, rest, |a, b| BitVector::slt(a, b)),
            "slte" => self.binary(nid, rest, |a, b| BitVector::slte(a, b)),
            "sgt" => self.binary(nid, rest, |a, b| BitVector::sgt(a, b)),
            "sgte" => self.binary(nid, rest, |a, b| BitVector::sgte(a, b)),
            "concat" => self.binary(nid, rest, |a, b| BitVector::concat(a, b)),
            "slice" => self.parse_slice(nid, rest),
            "uext" => self.parse_extend(nid, rest, BitVector::zero_extend),
            "sext" => self.parse_extend(nid, rest, BitVector::sign_extend),
            "ite" => self.parse_ite(nid, rest),
            "read" => self.binary(nid, rest, |a, b| Array::read(a, b)),
            "write" => self.parse_write(nid, rest),
            "output" => self.parse_sink(nid, rest, OutputKind::Output),
            "bad" => self.parse_sink(nid, rest, OutputKind::Bad),
            "constraint" => self.parse_sink(nid, rest, OutputKind::Constraint),
            "fair" | "justice" => Ok(()), // recognized, unsupported: retained unreferenced
            other => Err(parse_error(
                self.line_no,
                Btor2ParseReason::UnknownOp(other.to_string()),
            )),
        }
    }

    fn sort_of(&self, nid: i64) -> Result<&Sort> {
        self.sorts.get(&nid).ok_or_else(|| {
            parse_error(self.line_no, Btor2ParseReason::UndefinedRef(nid))
        })
    }

    fn expr_of(&self, nid: i64) -> Result<Expression> {
        self.exprs.get(&nid).cloned().ok_or_else(|| {
            parse_error(self.line_no, Btor2ParseReason::UndefinedRef(nid))
        })
    }

    fn parse_nid(&self, token: &str) -> Result<i64> {
        token
            .parse()
            .map_err(|_| malformed(self.line_no, format!("invalid nid '{}'", token)))
    }

    fn parse_sort(&mut self, nid: i64, rest: &[&str]) -> Result<()> {
        match rest.first() {
            Some(&"bitvec") => {
                let width: usize = rest
                    .get(1)
                    .ok_or_else(|| malformed(self.line_no, "sort bitvec: missing width"))?
                    .parse()
                    .map_err(|_| malformed(self.line_no, "sort bitvec: invalid width"))?;
                self.sorts.insert(nid, Sort::bit_vector(width));
                self.sort_decls.insert(nid, SortDecl::BitVector(width));
            }
            Some(&"array") => {
                let index_nid = self.parse_nid(
                    rest.get(1)
                        .ok_or_else(|| malformed(self.line_no, "sort array: missing index sort"))?,
                )?;
                let element_nid = self.parse_nid(rest.get(2).ok_or_else(|| {
                    malformed(self.line_no, "sort array: missing element sort")
                })?)?;
                let index = self.sort_of(index_nid)?.clone();
                let element = self.sort_of(element_nid)?.clone();
                self.sorts.insert(nid, Sort::array(&index, &element));
                self.sort_decls
                    .insert(nid, SortDecl::Array { index_nid, element_nid });
            }
            _ => return Err(malformed(self.line_no, "unknown sort kind")),
        }
        Ok(())
    }

    fn parse_input(&mut self, nid: i64, rest: &[&str]) -> Result<()> {
        let sort_nid = self.parse_nid(
            rest.first()
                .ok_or_else(|| malformed(self.line_no, "input: missing sort ref"))?,
        )?;
        let sort = self.sort_of(sort_nid)?.clone();
        let name = rest.get(1).map(|s| s.to_string()).unwrap_or_else(|| format!("input{}", nid));
        let var = Variable::new(name.clone(), sort.clone(), Role::Input);
        self.exprs.insert(nid, var.into());
        self.input_order.push(nid);
        self.input_name.insert(nid, name);
        Ok(())
    }

    fn parse_state(&mut self, nid: i64, rest: &[&str]) -> Result<()> {
        let sort_nid = self.parse_nid(
            rest.first()
                .ok_or_else(|| malformed(self.line_no, "state: missing sort ref"))?,
        )?;
        let sort = self.sort_of(sort_nid)?.clone();
        let name = rest.get(1).map(|s| s.to_string()).unwrap_or_else(|| format!("state{}", nid));
        let var = Variable::new(name.clone(), sort.clone(), Role::State);
        self.exprs.insert(nid, var.into());
        self.state_order.push(nid);
        self.state_name.insert(nid, name);
        Ok(())
    }

    fn parse_init(&mut self, _nid: i64, rest: &[&str]) -> Result<()> {
        let state_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "init: missing state ref"))?,
        )?;
        let value_nid = self.parse_nid(
            rest.get(2)
                .ok_or_else(|| malformed(self.line_no, "init: missing value ref"))?,
        )?;
        if self.state_init.get(&state_nid).map_or(false, Option::is_some) {
            return Err(parse_error(
                self.line_no,
                Btor2ParseReason::DuplicateInit(state_nid),
            ));
        }
        let value = self.expr_of(value_nid)?;
        let state_sort = self.exprs[&state_nid].sort().clone();
        value.sort().expect_sort(&state_sort).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::SortMismatch(e.to_string()))
        })?;
        self.state_init.insert(state_nid, Some(value));
        Ok(())
    }

    fn parse_next(&mut self, _nid: i64, rest: &[&str]) -> Result<()> {
        let state_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "next: missing state ref"))?,
        )?;
        let value_nid = self.parse_nid(
            rest.get(2)
                .ok_or_else(|| malformed(self.line_no, "next: missing value ref"))?,
        )?;
        if self.state_next.get(&state_nid).map_or(false, Option::is_some) {
            return Err(malformed(
                self.line_no,
                format!("state {} already has a next", state_nid),
            ));
        }
        let value = self.expr_of(value_nid)?;
        let state_sort = self.exprs[&state_nid].sort().clone();
        value.sort().expect_sort(&state_sort).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::SortMismatch(e.to_string()))
        })?;
        self.state_next.insert(state_nid, Some(value));
        Ok(())
    }

    fn parse_const(&mut self, nid: i64, rest: &[&str], radix: u32) -> Result<()> {
        let sort_nid = self.parse_nid(
            rest.first()
                .ok_or_else(|| malformed(self.line_no, "const: missing sort ref"))?,
        )?;
        let width = self.sort_of(sort_nid)?.unwrap_bit_vector();
        let literal = rest
            .get(1)
            .ok_or_else(|| malformed(self.line_no, "const: missing literal"))?;
        let value = if radix == 2 {
            return self.insert_binary_const(nid, width, literal);
        } else {
            BigUint::from_str_radix(literal, radix)
                .map_err(|_| malformed(self.line_no, format!("invalid literal '{}'", literal)))?
        };
        let constant = Constant::bit_vector_big_uint(value, width).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::WidthMismatch(e.to_string()))
        })?;
        self.exprs
            .insert(nid, Expression::constant(constant, Sort::bit_vector(width)));
        Ok(())
    }

    fn insert_binary_const(&mut self, nid: i64, width: usize, literal: &str) -> Result<()> {
        let padded = if literal.len() < width {
            format!("{}{}", "0".repeat(width - literal.len()), literal)
        } else if literal.len() > width {
            return Err(parse_error(
                self.line_no,
                Btor2ParseReason::WidthMismatch(format!(
                    "literal '{}' does not fit into {} bits",
                    literal, width
                )),
            ));
        } else {
            literal.to_string()
        };
        let value = crate::expr::BitVectorValue::from_binary_str(&padded).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::WidthMismatch(e.to_string()))
        })?;
        self.exprs.insert(
            nid,
            Expression::constant(Constant::bit_vector(value), Sort::bit_vector(width)),
        );
        Ok(())
    }

    fn parse_zero_one_ones(&mut self, nid: i64, rest: &[&str], kind: ZeroOneOnes) -> Result<()> {
        let sort_nid = self.parse_nid(
            rest.first()
                .ok_or_else(|| malformed(self.line_no, "missing sort ref"))?,
        )?;
        let width = self.sort_of(sort_nid)?.unwrap_bit_vector();
        let value = match kind {
            ZeroOneOnes::Zero => BigUint::from(0u8),
            ZeroOneOnes::One => BigUint::from(1u8),
            ZeroOneOnes::Ones => (BigUint::from(1u8) << width) - BigUint::from(1u8),
        };
        let constant = Constant::bit_vector_big_uint(value, width).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::WidthMismatch(e.to_string()))
        })?;
        self.exprs
            .insert(nid, Expression::constant(constant, Sort::bit_vector(width)));
        Ok(())
    }

    fn unary<F>(&mut self, nid: i64, rest: &[&str], f: F) -> Result<()>
    where
        F: FnOnce(Expression) -> Result<Expression>,
    {
        let a_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "missing operand"))?,
        )?;
        let a = self.expr_of(a_nid)?;
        let expr = f(a).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::SortMismatch(e.to_string()))
        })?;
        self.exprs.insert(nid, expr);
        Ok(())
    }

    fn binary<F>(&mut self, nid: i64, rest: &[&str], f: F) -> Result<()>
    where
        F: FnOnce(Expression, Expression) -> Result<Expression>,
    {
        let a_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "missing first operand"))?,
        )?;
        let b_nid = self.parse_nid(
            rest.get(2)
                .ok_or_else(|| malformed(self.line_no, "missing second operand"))?,
        )?;
        let a = self.expr_of(a_nid)?;
        let b = self.expr_of(b_nid)?;
        let expr = f(a, b).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::SortMismatch(e.to_string()))
        })?;
        self.exprs.insert(nid, expr);
        Ok(())
    }

    /// `and`/`or`/`xor` are overloaded between `Bool` and 1-bit
    /// `BitVec` operands in BTOR2; dispatch on the first operand's sort.
    fn logical_or_bv<B, V>(&mut self, nid: i64, rest: &[&str], boolean: B, bitvec: V) -> Result<()>
    where
        B: FnOnce(Expression, Expression) -> Result<Expression>,
        V: FnOnce(Expression, Expression) -> Result<Expression>,
    {
        let a_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "missing first operand"))?,
        )?;
        let b_nid = self.parse_nid(
            rest.get(2)
                .ok_or_else(|| malformed(self.line_no, "missing second operand"))?,
        )?;
        let a = self.expr_of(a_nid)?;
        let b = self.expr_of(b_nid)?;
        let expr = if a.sort().is_boolean() {
            boolean(a, b)
        } else {
            bitvec(a, b)
        }
        .map_err(|e| parse_error(self.line_no, Btor2ParseReason::SortMismatch(e.to_string())))?;
        self.exprs.insert(nid, expr);
        Ok(())
    }

    fn parse_slice(&mut self, nid: i64, rest: &[&str]) -> Result<()> {
        let a_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "slice: missing operand"))?,
        )?;
        let hi: usize = rest
            .get(2)
            .ok_or_else(|| malformed(self.line_no, "slice: missing hi"))?
            .parse()
            .map_err(|_| malformed(self.line_no, "slice: invalid hi"))?;
        let lo: usize = rest
            .get(3)
            .ok_or_else(|| malformed(self.line_no, "slice: missing lo"))?
            .parse()
            .map_err(|_| malformed(self.line_no, "slice: invalid lo"))?;
        let a = self.expr_of(a_nid)?;
        let expr = BitVector::extract(a, hi, lo).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::WidthMismatch(e.to_string()))
        })?;
        self.exprs.insert(nid, expr);
        Ok(())
    }

    fn parse_extend<F>(&mut self, nid: i64, rest: &[&str], f: F) -> Result<()>
    where
        F: FnOnce(Expression, usize) -> Result<Expression>,
    {
        let a_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "extend: missing operand"))?,
        )?;
        let n: usize = rest
            .get(2)
            .ok_or_else(|| malformed(self.line_no, "extend: missing width"))?
            .parse()
            .map_err(|_| malformed(self.line_no, "extend: invalid width"))?;
        let a = self.expr_of(a_nid)?;
        let expr = f(a, n).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::WidthMismatch(e.to_string()))
        })?;
        self.exprs.insert(nid, expr);
        Ok(())
    }

    fn parse_ite(&mut self, nid: i64, rest: &[&str]) -> Result<()> {
        let c_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "ite: missing cond"))?,
        )?;
        let t_nid = self.parse_nid(
            rest.get(2)
                .ok_or_else(|| malformed(self.line_no, "ite: missing then"))?,
        )?;
        let e_nid = self.parse_nid(
            rest.get(3)
                .ok_or_else(|| malformed(self.line_no, "ite: missing else"))?,
        )?;
        let cond = self.expr_of(c_nid)?;
        let then = self.expr_of(t_nid)?;
        let else_ = self.expr_of(e_nid)?;
        let expr = Expression::ite(cond, then, else_).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::SortMismatch(e.to_string()))
        })?;
        self.exprs.insert(nid, expr);
        Ok(())
    }

    fn parse_write(&mut self, nid: i64, rest: &[&str]) -> Result<()> {
        let a_nid = self.parse_nid(
            rest.get(1)
                .ok_or_else(|| malformed(self.line_no, "write: missing array"))?,
        )?;
        let i_nid = self.parse_nid(
            rest.get(2)
                .ok_or_else(|| malformed(self.line_no, "write: missing index"))?,
        )?;
        let v_nid = self.parse_nid(
            rest.get(3)
                .ok_or_else(|| malformed(self.line_no, "write: missing value"))?,
        )?;
        let array = self.expr_of(a_nid)?;
        let index = self.expr_of(i_nid)?;
        let value = self.expr_of(v_nid)?;
        let expr = Array::write(array, index, value).map_err(|e| {
            parse_error(self.line_no, Btor2ParseReason::SortMismatch(e.to_string()))
        })?;
        self.exprs.insert(nid, expr);
        Ok(())
    }

    fn parse_sink(&mut self, nid: i64, rest: &[&str], kind: OutputKind) -> Result<()> {
        let a_nid = self.parse_nid(
            rest.first()
                .ok_or_else(|| malformed(self.line_no, "sink: missing operand"))?,
        )?;
        let expr = self.expr_of(a_nid)?;
        let name = rest.get(1).map(|s| s.to_string()).unwrap_or_else(|| format!("{:?}{}", kind, nid));
        self.model.outputs_mut().push(Output::new(name, expr, kind));
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum ZeroOneOnes {
    Zero,
    One,
    Ones,
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_minimal_counter() {
        let source = "\
1 sort bitvec 4
2 zero 1
3 one 1
4 input 1 rst_n
5 state 1 cnt
6 init 1 5 2
7 add 1 5 3
8 ite 1 4 2 7
9 next 1 5 8
10 ult 1 5 2
11 bad 10
";
        let model = parse(source).unwrap();
        assert_eq!(model.states().len(), 1);
        assert_eq!(model.inputs().len(), 1);
        assert_eq!(model.outputs().len(), 1);
        assert_eq!(model.states()[0].name(), "cnt");
    }

    #[test]
    fn test_reports_unknown_op_with_line_number() {
        let source = "1 sort bitvec 4\n2 frobnicate 1\n";
        let err = parse(source).unwrap_err();
        assert!(format!("{}", err).contains("btor2:2"));
    }

    #[test]
    fn test_reports_undefined_ref() {
        let source = "1 sort bitvec 4\n2 input 1\n3 not 99\n";
        let err = parse(source).unwrap_err();
        assert!(format!("{}", err).contains("btor2:3"));
    }

    #[test]
    fn test_dangling_state_without_next_is_an_error() {
        let source = "1 sort bitvec 4\n2 state 1 s\n";
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_duplicate_init_is_rejected() {
        let source = "\
1 sort bitvec 4
2 zero 1
3 state 1 s
4 init 1 3 2
5 init 1 3 2
6 next 1 3 2
";
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_const_binary_decimal_hex_agree() {
        let source = "\
1 sort bitvec 4
2 const 1 0011
3 constd 1 3
4 consth 1 3
5 state 1 s
6 init 1 5 2
7 next 1 5 3
8 eq 1 2 4
9 output 8
";
        let model = parse(source).unwrap();
        assert_eq!(model.outputs().len(), 1);
    }

    #[test]
    fn test_array_sort_and_read_write() {
        let source = "\
1 sort bitvec 4
2 sort bitvec 8
3 sort array 1 2
4 state 3 mem
5 input 1 idx
6 input 2 val
7 write 3 4 5 6
8 next 3 4 7
9 read 2 4 5
10 output 9
";
        let model = parse(source).unwrap();
        assert_eq!(model.states()[0].sort(), &Sort::array(&Sort::bit_vector(4), &Sort::bit_vector(8)));
    }

    #[test]
    fn test_unknown_op_reason_is_matchable() {
        let source = "1 sort bitvec 4\n2 frobnicate 1\n";
        match parse(source).unwrap_err().kind() {
            ErrorKind::Btor2Parse(_, Btor2ParseReason::UnknownOp(op)) => assert_eq!(op, "frobnicate"),
            other => panic!("expected UnknownOp, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_state_reason_is_matchable() {
        let source = "1 sort bitvec 4\n2 state 1 s\n";
        match parse(source).unwrap_err().kind() {
            ErrorKind::Btor2Parse(_, Btor2ParseReason::DanglingState(name)) => assert_eq!(name, "s"),
            other => panic!("expected DanglingState, got {:?}", other),
        }
    }
}
