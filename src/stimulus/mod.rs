//! The `[CLOCK]`/`[PROPERTY]`/`[PROCESS]` stimulus script grammar
//! (§4.2), parsed with `nom` the way the teacher's `solver/rsmt.rs`
//! parses solver response values.

use crate::error::{Error, ErrorKind, Result};
use crate::model::ModelIR;
use crate::validate::Validate;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, hex_digit1, multispace0},
    combinator::{map, map_res, recognize},
    sequence::{preceded, tuple},
    IResult,
};
use num_bigint::BigUint;
use num_traits::Num;
use std::collections::BTreeMap;

fn parse_error(line_no: usize, reason: impl Into<String>) -> Error {
    ErrorKind::ScriptParse(line_no, reason.into()).into()
}

/// Comparison operator a `[PROPERTY]` leaf may use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A parsed literal: the raw value plus the width it was written with
/// (before zero-extension coercion to the signal's declared width).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Literal {
    value: BigUint,
}

impl Literal {
    pub fn value(&self) -> &BigUint {
        &self.value
    }
}

/// The `[PROPERTY]` predicate: either a leaf comparison or the literal
/// `true`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PropExpr {
    True,
    Compare {
        signal: String,
        op: CompareOp,
        literal: Literal,
        signed: bool,
    },
}

/// One `[PROCESS]` segment: a set of input drives held for `hold`
/// steps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Segment {
    drives: BTreeMap<String, Literal>,
    hold: u32,
}

impl Segment {
    pub fn drives(&self) -> &BTreeMap<String, Literal> {
        &self.drives
    }

    pub fn hold(&self) -> u32 {
        self.hold
    }
}

/// The full parsed stimulus script.
#[derive(Clone, Debug, Default)]
pub struct StimulusIR {
    clocks: BTreeMap<String, u32>,
    property: Option<PropExpr>,
    segments: Vec<Segment>,
    signed_inputs: std::collections::BTreeSet<String>,
}

impl StimulusIR {
    pub fn clocks(&self) -> &BTreeMap<String, u32> {
        &self.clocks
    }

    pub fn property(&self) -> Option<&PropExpr> {
        self.property.as_ref()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_signed(&self, name: &str) -> bool {
        self.signed_inputs.contains(name)
    }

    /// Clock value at unroll step `k`: `(k / period) mod 2`.
    pub fn clock_value_at(period: u32, k: usize) -> bool {
        ((k as u32 / period) % 2) == 1
    }

    /// The drive set in effect at unroll step `k`; once the segments
    /// are exhausted, the last segment's drives persist.
    pub fn drives_at(&self, k: usize) -> Option<&BTreeMap<String, Literal>> {
        if self.segments.is_empty() {
            return None;
        }
        let mut remaining = k;
        for segment in &self.segments {
            if remaining < segment.hold() as usize {
                return Some(segment.drives());
            }
            remaining -= segment.hold() as usize;
        }
        self.segments.last().map(Segment::drives)
    }
}

impl Validate for StimulusIR {
    fn validate(&self) -> Result<()> {
        for (name, period) in &self.clocks {
            if *period == 0 {
                return Err(format!("clock '{}' has period 0", name).into());
            }
        }
        Ok(())
    }
}

/// Binds a parsed `StimulusIR` against a `ModelIR`, resolving every
/// referenced signal name. Deferred from parse time per §4.2.
pub fn bind(stimulus: &StimulusIR, model: &ModelIR) -> Result<()> {
    for name in stimulus.clocks.keys() {
        if model.signal_sort(name).is_none() {
            return Err(ErrorKind::Binding(format!("unknown clock signal '{}'", name)).into());
        }
    }
    for segment in &stimulus.segments {
        for name in segment.drives().keys() {
            if model.input(name).is_none() {
                return Err(ErrorKind::Binding(format!("unknown input '{}'", name)).into());
            }
        }
    }
    if let Some(PropExpr::Compare { signal, .. }) = &stimulus.property {
        let known = model.signal_sort(signal).is_some()
            || model.outputs().iter().any(|o| o.name() == signal);
        if !known {
            return Err(ErrorKind::Binding(format!("unknown property signal '{}'", signal)).into());
        }
    }
    Ok(())
}

/// Parses a full stimulus script.
pub fn parse(source: &str) -> Result<StimulusIR> {
    let mut ir = StimulusIR::default();
    let mut seen_clock_section = false;
    let mut seen_property_section = false;
    let mut seen_process_section = false;

    let mut section: Option<Section> = None;
    let mut pending_drives: BTreeMap<String, Literal> = BTreeMap::new();

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = parse_section_header(line) {
            section = Some(match header {
                "CLOCK" => {
                    if seen_clock_section {
                        return Err(parse_error(line_no, "duplicate [CLOCK] section"));
                    }
                    seen_clock_section = true;
                    Section::Clock
                }
                "PROPERTY" => {
                    if seen_property_section {
                        return Err(parse_error(line_no, "duplicate [PROPERTY] section"));
                    }
                    seen_property_section = true;
                    Section::Property
                }
                "PROCESS" => {
                    if seen_process_section {
                        return Err(parse_error(line_no, "duplicate [PROCESS] section"));
                    }
                    seen_process_section = true;
                    Section::Process
                }
                other => return Err(parse_error(line_no, format!("unknown section '[{}]'", other))),
            });
            continue;
        }

        match section {
            None => return Err(parse_error(line_no, "content before any section header")),
            Some(Section::Clock) => {
                let (name, period) = parse_clock_line(line)
                    .map_err(|_| parse_error(line_no, "malformed clock line"))?;
                if period == 0 {
                    return Err(parse_error(line_no, "clock period must be >= 1"));
                }
                ir.clocks.insert(name, period);
            }
            Some(Section::Property) => {
                if ir.property.is_some() {
                    return Err(parse_error(line_no, "duplicate property line"));
                }
                ir.property = Some(
                    parse_prop_line(line).map_err(|_| parse_error(line_no, "malformed property line"))?,
                );
            }
            Some(Section::Process) => {
                if let Some(rest) = line.strip_prefix("signed ") {
                    ir.signed_inputs.insert(rest.trim().to_string());
                    continue;
                }
                if let Some(hold_str) = line.strip_prefix('#') {
                    let hold: u32 = hold_str
                        .trim()
                        .parse()
                        .map_err(|_| parse_error(line_no, "malformed hold count"))?;
                    ir.segments.push(Segment {
                        drives: std::mem::take(&mut pending_drives),
                        hold,
                    });
                    continue;
                }
                let (name, literal) = parse_drive_line(line)
                    .map_err(|_| parse_error(line_no, "malformed drive line"))?;
                pending_drives.insert(name, literal);
            }
        }
    }

    if !pending_drives.is_empty() {
        ir.segments.push(Segment {
            drives: pending_drives,
            hold: 1,
        });
    }

    Ok(ir)
}

enum Section {
    Clock,
    Property,
    Process,
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_section_header(line: &str) -> Option<&str> {
    if line.starts_with('[') && line.ends_with(']') {
        Some(&line[1..line.len() - 1])
    } else {
        None
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn uint(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse)(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        map(preceded(tag("0x"), hex_digit1), |s: &str| Literal {
            value: BigUint::from_str_radix(s, 16).unwrap_or_default(),
        }),
        map(
            preceded(tag("0b"), take_while1(|c| c == '0' || c == '1')),
            |s: &str| Literal {
                value: BigUint::from_str_radix(s, 2).unwrap_or_default(),
            },
        ),
        map(recognize(digit1), |s: &str| Literal {
            value: BigUint::from_str_radix(s, 10).unwrap_or_default(),
        }),
    ))(input)
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        map(tag("=="), |_| CompareOp::Eq),
        map(tag("!="), |_| CompareOp::Neq),
        map(tag("<="), |_| CompareOp::Lte),
        map(tag(">="), |_| CompareOp::Gte),
        map(tag("<"), |_| CompareOp::Lt),
        map(tag(">"), |_| CompareOp::Gt),
    ))(input)
}

fn parse_clock_line(input: &str) -> std::result::Result<(String, u32), ()> {
    let parsed: IResult<&str, (&str, &str, &str, u32)> = tuple((
        identifier,
        multispace0,
        tag("="),
        preceded(multispace0, uint),
    ))(input);
    match parsed {
        Ok((rest, (name, _, _, period))) if rest.trim().is_empty() => {
            Ok((name.to_string(), period))
        }
        _ => Err(()),
    }
}

fn parse_drive_line(input: &str) -> std::result::Result<(String, Literal), ()> {
    let parsed: IResult<&str, (&str, &str, &str, Literal)> = tuple((
        identifier,
        multispace0,
        tag("="),
        preceded(multispace0, literal),
    ))(input);
    match parsed {
        Ok((rest, (name, _, _, lit))) if rest.trim().is_empty() => Ok((name.to_string(), lit)),
        _ => Err(()),
    }
}

fn parse_prop_line(input: &str) -> std::result::Result<PropExpr, ()> {
    if input.trim() == "true" {
        return Ok(PropExpr::True);
    }
    let signed_prefixed = input.trim().strip_prefix("signed ");
    let (signed, body) = match signed_prefixed {
        Some(rest) => (true, rest),
        None => (false, input.trim()),
    };
    let parsed: IResult<&str, (&str, &str, CompareOp, &str, Literal)> = tuple((
        identifier,
        multispace0,
        compare_op,
        multispace0,
        literal,
    ))(body);
    match parsed {
        Ok((rest, (name, _, op, _, lit))) if rest.trim().is_empty() => Ok(PropExpr::Compare {
            signal: name.to_string(),
            op,
            literal: lit,
            signed,
        }),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_clock_property_process() {
        let source = "\
[CLOCK]
clk = 1

[PROPERTY]
cnt == 5

[PROCESS]
rst_n = 0
#1
rst_n = 1
en = 1
#3
";
        let ir = parse(source).unwrap();
        assert_eq!(ir.clocks().get("clk"), Some(&1));
        assert!(matches!(ir.property(), Some(PropExpr::Compare { .. })));
        assert_eq!(ir.segments().len(), 2);
        assert_eq!(ir.segments()[0].hold(), 1);
        assert_eq!(ir.segments()[1].hold(), 3);
    }

    #[test]
    fn test_trailing_drives_without_hash_become_one_step_segment() {
        let source = "\
[PROCESS]
en = 1
";
        let ir = parse(source).unwrap();
        assert_eq!(ir.segments().len(), 1);
        assert_eq!(ir.segments()[0].hold(), 1);
    }

    #[test]
    fn test_zero_period_clock_is_rejected() {
        let source = "[CLOCK]\nclk = 0\n";
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_duplicate_property_line_is_rejected() {
        let source = "[PROPERTY]\ntrue\ncnt == 1\n";
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let source = "[BOGUS]\nfoo = 1\n";
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_hex_and_binary_literals() {
        let source = "[PROCESS]\na = 0xff\nb = 0b101\n#1\n";
        let ir = parse(source).unwrap();
        let drives = &ir.segments()[0].drives();
        assert_eq!(drives["a"].value(), &BigUint::from(255u32));
        assert_eq!(drives["b"].value(), &BigUint::from(5u32));
    }

    #[test]
    fn test_signed_prefix_on_process_section() {
        let source = "[PROCESS]\nsigned x\nx = 1\n#1\n";
        let ir = parse(source).unwrap();
        assert!(ir.is_signed("x"));
    }

    #[test]
    fn test_clock_value_at_matches_period_semantics() {
        assert_eq!(StimulusIR::clock_value_at(1, 0), false);
        assert_eq!(StimulusIR::clock_value_at(1, 1), true);
        assert_eq!(StimulusIR::clock_value_at(2, 0), false);
        assert_eq!(StimulusIR::clock_value_at(2, 1), false);
        assert_eq!(StimulusIR::clock_value_at(2, 2), true);
    }
}
