//! And-inverter graphs: the circuit shape consumed by the compiler.
//!
//! A [`Literal`] packs a node index and a negation flag as `2 * index + neg`.
//! Index 0 is the constant, so literal `0` is `false` and `1` is `true`.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::{BddError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Literal(u32);

impl Literal {
    pub const FALSE: Literal = Literal(0);
    pub const TRUE: Literal = Literal(1);

    pub const fn new(raw: u32) -> Self {
        Literal(raw)
    }

    pub const fn from_index(index: u32, negated: bool) -> Self {
        Literal((index << 1) | negated as u32)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The node this literal refers to (`raw / 2`).
    pub const fn index(self) -> u32 {
        self.0 >> 1
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    pub const fn is_constant(self) -> bool {
        self.index() == 0
    }

    /// The literal with the negation flag cleared.
    pub const fn regular(self) -> Self {
        Literal(self.0 & !1)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal(self.0 ^ 1)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A two-input AND gate `lhs = rhs0 ∧ rhs1`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AndGate {
    pub lhs: Literal,
    pub rhs0: Literal,
    pub rhs1: Literal,
}

impl AndGate {
    pub fn new(lhs: Literal, rhs0: Literal, rhs1: Literal) -> Self {
        Self { lhs, rhs0, rhs1 }
    }
}

impl fmt::Display for AndGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} & {}", self.lhs, self.rhs0, self.rhs1)
    }
}

/// A single-output combinational circuit.
///
/// Gates may be listed in any order; the compiler sorts them by dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Circuit {
    pub inputs: Vec<Literal>,
    pub gates: Vec<AndGate>,
    pub output: Literal,
}

impl Default for Literal {
    fn default() -> Self {
        Literal::FALSE
    }
}

impl Circuit {
    pub fn new(inputs: Vec<Literal>, gates: Vec<AndGate>, output: Literal) -> Self {
        Self { inputs, gates, output }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Evaluates the output for the given input values (in input order).
    ///
    /// Serves as a reference model for the compiled diagram.
    pub fn simulate(&self, values: &[bool]) -> Result<bool> {
        if values.len() != self.inputs.len() {
            return Err(BddError::MalformedCircuit(format!(
                "expected {} input values, got {}",
                self.inputs.len(),
                values.len()
            )));
        }

        let mut known: HashMap<u32, bool> = HashMap::new();
        known.insert(0, false);
        for (lit, &value) in self.inputs.iter().zip(values) {
            known.insert(lit.index(), value);
        }
        let gates: HashMap<u32, &AndGate> = self.gates.iter().map(|g| (g.lhs.index(), g)).collect();

        // Explicit stack to stay safe on deep circuits.
        let mut stack = vec![self.output.index()];
        let mut on_stack = std::collections::HashSet::new();
        while let Some(&index) = stack.last() {
            if known.contains_key(&index) {
                stack.pop();
                continue;
            }
            let Some(gate) = gates.get(&index) else {
                return Err(BddError::MalformedCircuit(format!("literal {} is not defined", 2 * index)));
            };
            let pending: Vec<u32> = [gate.rhs0.index(), gate.rhs1.index()]
                .into_iter()
                .filter(|i| !known.contains_key(i))
                .collect();
            if pending.is_empty() {
                let value = |lit: Literal| known[&lit.index()] ^ lit.is_negated();
                let out = value(gate.rhs0) && value(gate.rhs1);
                known.insert(index, out);
                on_stack.remove(&index);
                stack.pop();
            } else {
                if !on_stack.insert(index) {
                    return Err(BddError::MalformedCircuit(format!("cycle through gate {}", gate)));
                }
                stack.extend(pending);
            }
        }

        Ok(known[&self.output.index()] ^ self.output.is_negated())
    }

    /// Parses the ASCII AIGER (`aag`) format.
    ///
    /// Only combinational circuits with exactly one output are accepted.
    /// The symbol table and comment section are ignored.
    pub fn from_aag(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let malformed = |msg: String| BddError::MalformedCircuit(msg);

        let header = lines.next().ok_or_else(|| malformed("empty input".to_string()))?;
        let mut fields = header.split_whitespace();
        if fields.next() != Some("aag") {
            return Err(malformed(format!("bad header '{}'", header)));
        }
        let numbers: Vec<u32> = fields
            .map(|f| f.parse::<u32>().map_err(|_| malformed(format!("bad header field '{}'", f))))
            .collect::<Result<_>>()?;
        let &[max_index, num_inputs, num_latches, num_outputs, num_ands] = numbers.as_slice() else {
            return Err(malformed(format!("header needs 5 numbers, got '{}'", header)));
        };
        if num_latches != 0 {
            return Err(malformed(format!("latches are not supported ({} given)", num_latches)));
        }
        if num_outputs != 1 {
            return Err(malformed(format!("exactly one output is required ({} given)", num_outputs)));
        }

        let mut parse_line = |what: &str, arity: usize| -> Result<Vec<Literal>> {
            let line = lines.next().ok_or_else(|| malformed(format!("missing {} line", what)))?;
            let lits: Vec<Literal> = line
                .split_whitespace()
                .map(|t| t.parse::<u32>().map(Literal::new).map_err(|_| malformed(format!("bad literal '{}'", t))))
                .collect::<Result<_>>()?;
            if lits.len() != arity {
                return Err(malformed(format!("{} line '{}' needs {} literals", what, line, arity)));
            }
            if let Some(lit) = lits.iter().find(|l| l.index() > max_index) {
                return Err(malformed(format!("literal {} exceeds maximum index {}", lit, max_index)));
            }
            Ok(lits)
        };

        let mut inputs = Vec::with_capacity(num_inputs as usize);
        for _ in 0..num_inputs {
            inputs.push(parse_line("input", 1)?[0]);
        }
        let output = parse_line("output", 1)?[0];
        let mut gates = Vec::with_capacity(num_ands as usize);
        for _ in 0..num_ands {
            let lits = parse_line("and", 3)?;
            gates.push(AndGate::new(lits[0], lits[1], lits[2]));
        }

        debug!(
            "Parsed aag: M={} I={} A={} output={}",
            max_index, num_inputs, num_ands, output
        );
        Ok(Circuit { inputs, gates, output })
    }
}
