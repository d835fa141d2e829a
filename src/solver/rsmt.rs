use crate::environment;
use crate::error::{Error, Result};
use crate::expr;
use crate::solver::{CheckSatResult, DumpFormula, SmtBackend};
use num_bigint::BigUint;
use rsmt2::parse::*;
use rsmt2::print::{Expr2Smt, Sort2Smt, Sym2Smt};
use rsmt2::{SmtConf, SmtRes};
use std::cell::RefCell;
use std::fs::File;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

/// `rsmt2`-backed `SmtBackend`, the only module allowed to name a
/// specific solver binary (§4.5).
pub struct RsmtBackend {
    solver: Rc<RefCell<rsmt2::Solver<Parser>>>,
}

impl RsmtBackend {
    pub fn new_from_env(env: &environment::Environment) -> Result<Self> {
        let mut conf = match env.solver() {
            environment::Solver::Z3 => SmtConf::z3(),
            environment::Solver::Cvc4 => SmtConf::cvc4(),
            environment::Solver::Yices2 => SmtConf::yices_2(),
        };

        conf.models();
        if let Some(timeout_ms) = env.solver_timeout_ms() {
            conf.option("timeout", timeout_ms.to_string());
        }

        let parser = Parser::new();
        let solver = Rc::new(RefCell::new(rsmt2::Solver::new(conf, parser)?));

        Ok(Self { solver })
    }
}

impl DumpFormula for RsmtBackend {
    fn dump_formula_to_file(&self, path: &Path) -> Result<()> {
        let mut solver = self.solver.borrow_mut();
        let file = File::create(path)?;
        Ok(solver.tee(file)?)
    }
}

impl SmtBackend for RsmtBackend {
    fn declare_const(&mut self, variable: &expr::Variable) -> Result<()> {
        let mut solver = self.solver.borrow_mut();
        Ok(solver.declare_const(variable, variable.sort())?)
    }

    fn assert(&mut self, formula: &expr::Expression) -> Result<()> {
        let mut solver = self.solver.borrow_mut();
        Ok(solver.assert(formula)?)
    }

    fn push(&mut self) -> Result<()> {
        let mut solver = self.solver.borrow_mut();
        Ok(solver.push(1)?)
    }

    fn pop(&mut self) -> Result<()> {
        let mut solver = self.solver.borrow_mut();
        Ok(solver.pop(1)?)
    }

    fn check_sat(&mut self) -> Result<CheckSatResult> {
        let mut solver = self.solver.borrow_mut();
        match solver.check_sat_or_unknown()? {
            Some(true) => Ok(CheckSatResult::Sat),
            Some(false) => Ok(CheckSatResult::Unsat),
            None => Ok(CheckSatResult::Unknown),
        }
    }

    fn get_value(&mut self, expr: &expr::Expression) -> Result<expr::Constant> {
        let mut solver = self.solver.borrow_mut();
        let values = solver.get_values(&[expr.clone()])?;
        values
            .into_iter()
            .next()
            .map(|(_, value)| value)
            .ok_or_else(|| Error::from("solver returned no value"))
    }
}

impl Expr2Smt<()> for expr::Expression {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, i: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        use expr::{BitVector, Operator};

        match self.operator() {
            Operator::BitVector(BitVector::RedAnd) => {
                return write_redop(w, &self.operands()[0], true);
            }
            Operator::BitVector(BitVector::RedOr) => {
                return write_redop(w, &self.operands()[0], false);
            }
            Operator::BitVector(BitVector::RedXor) => {
                return write_redxor(w, &self.operands()[0]);
            }
            Operator::BitVector(BitVector::Rol) => {
                return write_rotate(w, &self.operands()[0], &self.operands()[1], true);
            }
            Operator::BitVector(BitVector::Ror) => {
                return write_rotate(w, &self.operands()[0], &self.operands()[1], false);
            }
            _ => {}
        }

        if self.operands().is_empty() {
            self.operator().expr_to_smt2(w, i)
        } else {
            write!(w, "(")?;
            self.operator().expr_to_smt2(w, i)?;
            for operand in self.operands() {
                write!(w, " ")?;
                operand.expr_to_smt2(w, i)?;
            }
            write!(w, ")")?;
            Ok(())
        }
    }
}

/// `bvredand`/`bvredor` aren't part of the core `FixedSizeBitVectors`
/// theory, so they're expanded into a comparison against the all-zero
/// (`redor`) or all-ones (`redand`) bit pattern of the operand's width.
fn write_redop<Writer>(w: &mut Writer, operand: &expr::Expression, is_and: bool) -> SmtRes<()>
where
    Writer: ::std::io::Write,
{
    let width = operand.sort().unwrap_bit_vector();
    let bound = if is_and {
        (num_bigint::BigUint::from(1u8) << width) - num_bigint::BigUint::from(1u8)
    } else {
        num_bigint::BigUint::from(0u8)
    };
    let (then_bit, else_bit) = if is_and { (1, 0) } else { (0, 1) };
    write!(w, "(ite (= ")?;
    operand.expr_to_smt2(w, ())?;
    write!(w, " (_ bv{} {})) (_ bv{} 1) (_ bv{} 1))", bound, width, then_bit, else_bit)?;
    Ok(())
}

/// No single SMT-LIB symbol folds a bit-vector's bits with `xor`; this
/// builds the balanced tree of single-bit `extract`s explicitly.
fn write_redxor<Writer>(w: &mut Writer, operand: &expr::Expression) -> SmtRes<()>
where
    Writer: ::std::io::Write,
{
    let width = operand.sort().unwrap_bit_vector();
    fn write_bit<Writer: ::std::io::Write>(w: &mut Writer, operand: &expr::Expression, bit: usize) -> SmtRes<()> {
        write!(w, "(_ extract {} {}) ", bit, bit)?;
        Ok(())
    }
    if width == 1 {
        return operand.expr_to_smt2(w, ());
    }
    write!(w, "(bvxor ")?;
    for _ in 1..width {
        write!(w, "(bvxor ")?;
    }
    write!(w, "(")?;
    write_bit(w, operand, 0)?;
    operand.expr_to_smt2(w, ())?;
    write!(w, ")")?;
    for bit in 1..width {
        write!(w, " (")?;
        write_bit(w, operand, bit)?;
        operand.expr_to_smt2(w, ())?;
        write!(w, "))")?;
    }
    write!(w, ")")?;
    Ok(())
}

/// BTOR2's `rol`/`ror` take a run-time rotate amount, so the static
/// SMT-LIB `(_ rotate_left i)` index doesn't apply; rotation is
/// expressed via `bvshl`/`bvlshr` around the amount taken `mod` width.
fn write_rotate<Writer>(
    w: &mut Writer,
    value: &expr::Expression,
    amount: &expr::Expression,
    left: bool,
) -> SmtRes<()>
where
    Writer: ::std::io::Write,
{
    let width = value.sort().unwrap_bit_vector();
    write!(w, "(bvor (")?;
    write!(w, "{} ", if left { "bvshl" } else { "bvlshr" })?;
    value.expr_to_smt2(w, ())?;
    write!(w, " (bvurem ")?;
    amount.expr_to_smt2(w, ())?;
    write!(w, " (_ bv{} {}))) (", width, width)?;
    write!(w, "{} ", if left { "bvlshr" } else { "bvshl" })?;
    value.expr_to_smt2(w, ())?;
    write!(w, " (bvsub (_ bv{} {}) (bvurem ", width, width)?;
    amount.expr_to_smt2(w, ())?;
    write!(w, " (_ bv{} {})))))", width, width)?;
    Ok(())
}

impl Expr2Smt<()> for expr::Operator {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, i: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        match self {
            Self::Variable(v) => v.sym_to_smt2(w, i),
            Self::Constant(c) => c.expr_to_smt2(w, i),
            Self::Ite => {
                write!(w, "ite")?;
                Ok(())
            }
            Self::Equal => {
                write!(w, "=")?;
                Ok(())
            }
            Self::Boolean(op) => op.expr_to_smt2(w, i),
            Self::BitVector(op) => op.expr_to_smt2(w, i),
            Self::Array(op) => op.expr_to_smt2(w, i),
        }
    }
}

impl Expr2Smt<()> for expr::Constant {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, _: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        match self {
            Self::Boolean(true) => write!(w, "true")?,
            Self::Boolean(false) => write!(w, "false")?,
            Self::BitVector(bv) => write!(w, "(_ bv{} {})", bv.value(), bv.bits())?,
            Self::Array(value) => {
                write!(w, "unsupported literal array constant {}", value)?;
            }
        };
        Ok(())
    }
}

impl Expr2Smt<()> for expr::Boolean {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, _: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        match self {
            Self::Not => write!(w, "not")?,
            Self::And => write!(w, "and")?,
            Self::Or => write!(w, "or")?,
            Self::Xor => write!(w, "xor")?,
            Self::Implies => write!(w, "=>")?,
            Self::Iff => write!(w, "=")?,
        };
        Ok(())
    }
}

impl Expr2Smt<()> for expr::BitVector {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, _: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        match self {
            Self::Not => write!(w, "bvnot")?,
            Self::Neg => write!(w, "bvneg")?,
            Self::RedAnd => write!(w, "(_ redand)")?,
            Self::RedOr => write!(w, "(_ redor)")?,
            Self::RedXor => write!(w, "(_ redxor)")?,
            Self::Inc => write!(w, "bvinc")?,
            Self::Dec => write!(w, "bvdec")?,
            Self::And => write!(w, "bvand")?,
            Self::Or => write!(w, "bvor")?,
            Self::Xor => write!(w, "bvxor")?,
            Self::Nand => write!(w, "bvnand")?,
            Self::Nor => write!(w, "bvnor")?,
            Self::Xnor => write!(w, "bvxnor")?,
            Self::Add => write!(w, "bvadd")?,
            Self::Sub => write!(w, "bvsub")?,
            Self::Mul => write!(w, "bvmul")?,
            Self::Udiv => write!(w, "bvudiv")?,
            Self::Sdiv => write!(w, "bvsdiv")?,
            Self::Urem => write!(w, "bvurem")?,
            Self::Srem => write!(w, "bvsrem")?,
            Self::Smod => write!(w, "bvsmod")?,
            Self::Shl => write!(w, "bvshl")?,
            Self::Lshr => write!(w, "bvlshr")?,
            Self::Ashr => write!(w, "bvashr")?,
            Self::Rol => write!(w, "(_ rotate_left)")?,
            Self::Ror => write!(w, "(_ rotate_right)")?,
            Self::Ult => write!(w, "bvult")?,
            Self::Ulte => write!(w, "bvule")?,
            Self::Ugt => write!(w, "bvugt")?,
            Self::Ugte => write!(w, "bvuge")?,
            Self::Slt => write!(w, "bvslt")?,
            Self::Slte => write!(w, "bvsle")?,
            Self::Sgt => write!(w, "bvsgt")?,
            Self::Sgte => write!(w, "bvsge")?,
            Self::Concat => write!(w, "concat")?,
            Self::Extract(hi, lo) => write!(w, "(_ extract {} {})", hi, lo)?,
            Self::Zext(n) => write!(w, "(_ zero_extend {})", n)?,
            Self::Sext(n) => write!(w, "(_ sign_extend {})", n)?,
        };
        Ok(())
    }
}

impl Expr2Smt<()> for expr::Array {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, _: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        match self {
            Self::Read => write!(w, "select")?,
            Self::Write => write!(w, "store")?,
        };
        Ok(())
    }
}

impl Sym2Smt<()> for expr::Variable {
    fn sym_to_smt2<Writer>(&self, w: &mut Writer, _: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        write!(w, "{}", self.identifier())?;
        Ok(())
    }
}

impl Sort2Smt for expr::Sort {
    fn sort_to_smt2<Writer>(&self, w: &mut Writer) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        match self {
            Self::Boolean => write!(w, "Bool")?,
            Self::BitVector(width) => write!(w, "(_ BitVec {})", width)?,
            Self::Array { index, element } => {
                write!(w, "(Array ")?;
                index.sort_to_smt2(w)?;
                write!(w, " ")?;
                element.sort_to_smt2(w)?;
                write!(w, ")")?
            }
        };
        Ok(())
    }
}

mod parser {
    use super::*;
    use nom::{
        branch::alt,
        bytes::complete::{tag, take_while1},
        character::complete::{char, digit1, hex_digit1, multispace1},
        combinator::{all_consuming, map, map_res, value},
        sequence::{preceded, terminated, tuple},
        IResult,
    };

    fn bit_vec_sort(input: &str) -> IResult<&str, expr::Sort> {
        map(
            tuple((
                tag("(_"),
                multispace1,
                tag("BitVec"),
                multispace1,
                map_res(digit1, FromStr::from_str),
                char(')'),
            )),
            |(_, _, _, _, bits, _)| expr::Sort::bit_vector(bits),
        )(input)
    }

    fn array_sort(input: &str) -> IResult<&str, expr::Sort> {
        map(
            tuple((
                tag("(Array"),
                multispace1,
                sort,
                multispace1,
                sort,
                char(')'),
            )),
            |(_, _, index, _, element, _)| expr::Sort::array(&index, &element),
        )(input)
    }

    fn sort(input: &str) -> IResult<&str, expr::Sort> {
        alt((value(expr::Sort::Boolean, tag("Bool")), bit_vec_sort, array_sort))(input)
    }

    fn bin_digit1(input: &str) -> IResult<&str, &str> {
        take_while1(|c| c == '0' || c == '1')(input)
    }

    fn boolean_literal(input: &str) -> IResult<&str, expr::Constant> {
        alt((
            value(expr::Constant::boolean(false), tag("false")),
            value(expr::Constant::boolean(true), tag("true")),
        ))(input)
    }

    fn bitvec_literal_hex(input: &str) -> IResult<&str, expr::Constant> {
        map(preceded(tag("#x"), hex_digit1), |s: &str| {
            let value = BigUint::parse_bytes(s.as_bytes(), 16).unwrap_or_default();
            expr::Constant::bit_vector(expr::BitVectorValue::new_big(value, s.len() * 4))
        })(input)
    }

    fn bitvec_literal_binary(input: &str) -> IResult<&str, expr::Constant> {
        map(preceded(tag("#b"), bin_digit1), |s: &str| {
            expr::Constant::bit_vector(
                expr::BitVectorValue::from_binary_str(s).unwrap_or_else(|_| expr::BitVectorValue::zero(s.len())),
            )
        })(input)
    }

    fn bitvec_literal_smt(input: &str) -> IResult<&str, expr::Constant> {
        // (_ bv42 64)
        map(
            tuple((tag("(_ bv"), digit1, char(' '), digit1, char(')'))),
            |(_, value, _, width, _): (_, &str, _, &str, _)| {
                let value = BigUint::parse_bytes(value.as_bytes(), 10).unwrap_or_default();
                let width: usize = width.parse().unwrap_or(0);
                expr::Constant::bit_vector(expr::BitVectorValue::new_big(value, width))
            },
        )(input)
    }

    fn bitvec_literal(input: &str) -> IResult<&str, expr::Constant> {
        alt((bitvec_literal_hex, bitvec_literal_binary, bitvec_literal_smt))(input)
    }

    fn as_const(input: &str) -> IResult<&str, expr::Sort> {
        // (as const (Array (_ BitVec 64) (_ BitVec 8)))
        preceded(tag("(as const "), terminated(sort, char(')')))(input)
    }

    fn array_init(input: &str) -> IResult<&str, expr::ArrayValue> {
        // ((as const (Array (_ BitVec 64) (_ BitVec 8))) (_ bv0 8))
        map(
            tuple((char('('), as_const, multispace1, literal, char(')'))),
            |(_, _, _, value, _)| expr::ArrayValue::new(Some(value)),
        )(input)
    }

    fn array_store(input: &str) -> IResult<&str, expr::ArrayValue> {
        // (store mem addr value)
        map(
            tuple((
                tag("(store"),
                multispace1,
                array_nested,
                multispace1,
                literal,
                multispace1,
                literal,
                char(')'),
            )),
            |(_, _, mut arr, _, addr, _, value, _)| {
                arr.store(addr, value);
                arr
            },
        )(input)
    }

    fn array_nested(input: &str) -> IResult<&str, expr::ArrayValue> {
        alt((array_init, array_store))(input)
    }

    fn array_literal(input: &str) -> IResult<&str, expr::Constant> {
        map(array_nested, expr::Constant::array)(input)
    }

    fn literal(input: &str) -> IResult<&str, expr::Constant> {
        alt((boolean_literal, bitvec_literal, array_literal))(input)
    }

    pub(super) fn parse_literal(input: &str) -> SmtRes<expr::Constant> {
        match all_consuming(literal)(input) {
            Ok((_, lit)) => Ok(lit),
            Err(_) => Err("Failed to parse literal!".into()),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self {}
    }
}

impl<'a> ValueParser<expr::Constant, &'a str> for Parser {
    fn parse_value(self, input: &'a str) -> SmtRes<expr::Constant> {
        parser::parse_literal(input)
    }
}

impl<'a> ExprParser<String, (), &'a str> for Parser {
    fn parse_expr(self, input: &'a str, _: ()) -> SmtRes<String> {
        Ok(input.into())
    }
}
