//! Error type shared by the whole pipeline.

use crate::types::{Level, Var};

/// Errors reported by the BDD engine, the circuit compiler, the sampler and the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BddError {
    /// The circuit is not well-formed (dangling reference, cycle, redefinition, bad literal).
    MalformedCircuit(String),
    /// A node was requested whose child does not lie strictly below its variable.
    OrderingViolation {
        variable: Var,
        child: Var,
    },
    /// The variable was not created by this manager.
    UnknownVariable(Var),
    /// The level lies outside the current order.
    LevelOutOfRange(Level),
    /// Internal defect detected (stale counts, parity mismatch, broken invariant).
    InconsistentState(String),
    /// Sampling was requested from a function with no satisfying assignment.
    Unsatisfiable,
    /// The encoder received fewer bits than its fields declare.
    LayoutMismatch {
        expected: usize,
        actual: usize,
    },
}

impl std::fmt::Display for BddError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BddError::MalformedCircuit(msg) => write!(f, "Malformed circuit: {}", msg),
            BddError::OrderingViolation { variable, child } => {
                write!(f, "Ordering violation: {} must precede child variable {}", variable, child)
            }
            BddError::UnknownVariable(var) => write!(f, "Unknown variable {}", var),
            BddError::LevelOutOfRange(level) => write!(f, "Level {} is out of range", level),
            BddError::InconsistentState(msg) => write!(f, "Inconsistent state: {}", msg),
            BddError::Unsatisfiable => write!(f, "Function has no satisfying assignment"),
            BddError::LayoutMismatch { expected, actual } => {
                write!(f, "Layout mismatch: expected at least {} bits, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for BddError {}

pub type Result<T> = std::result::Result<T, BddError>;
