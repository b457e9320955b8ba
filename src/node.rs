use crate::reference::Ref;
use crate::types::Var;

/// A decision node stored in the manager's arena.
///
/// `low` is the ELSE edge and is never complemented for a stored node.
/// `rc` counts parent nodes plus external owners holding a retained edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub variable: Var,
    pub low: Ref,
    pub high: Ref,
    pub rc: u32,
}

impl Node {
    pub fn new(variable: Var, low: Ref, high: Ref) -> Self {
        Self {
            variable,
            low,
            high,
            rc: 0,
        }
    }

    /// The single terminal node, pinned with an unbounded reference count.
    pub fn terminal() -> Self {
        Self {
            variable: Var::TERMINAL,
            low: Ref::ONE,
            high: Ref::ONE,
            rc: u32::MAX,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.variable.is_terminal()
    }
}
