use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::types::NodeId;

/// An edge to a BDD node, possibly complemented.
///
/// Uses a 32-bit representation where the least significant bit is the
/// complement flag and the remaining bits store the node ID.
/// The constant false is the complement of the single terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Ref(u32);

impl Ref {
    /// The terminal `true`.
    pub const ONE: Self = Self::positive(NodeId::TERMINAL);
    /// The terminal `false`, i.e. the complemented `true`.
    pub const ZERO: Self = Self::negative(NodeId::TERMINAL);

    pub const fn new(id: NodeId, negated: bool) -> Self {
        Self((id.raw() << 1) | (negated as u32))
    }

    pub const fn positive(id: NodeId) -> Self {
        Self::new(id, false)
    }

    pub const fn negative(id: NodeId) -> Self {
        Self::new(id, true)
    }

    /// Returns the node ID this edge points to.
    #[inline]
    pub const fn id(self) -> NodeId {
        NodeId::new(self.0 >> 1)
    }

    #[inline]
    pub const fn is_negated(self) -> bool {
        (self.0 & 1) != 0
    }

    /// Returns the same edge with the complement bit cleared.
    #[inline]
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Complements the edge when `flag` is set.
    #[inline]
    pub const fn negate_if(self, flag: bool) -> Self {
        Self(self.0 ^ (flag as u32))
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        self.id().is_terminal()
    }

    /// Returns the raw underlying value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_negated() {
            write!(f, "~{}", self.id())
        } else {
            write!(f, "{}", self.id())
        }
    }
}
