//! Type-safe wrappers for variables, levels and node ids.
//!
//! The three newtypes keep variable identity (stable across reordering),
//! position in the order (changes on every swap) and arena slots apart.

use std::fmt;

/// A variable identifier (1-indexed).
///
/// Variables are created by the manager in circuit-input order. Unlike levels,
/// variable IDs are stable across reordering operations.
///
/// # Invariants
///
/// - Variable IDs of decision variables are >= 1 (0 is reserved for terminals)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Pseudo-variable carried by the terminal node.
    pub const TERMINAL: Var = Var(0);

    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns the 0-based position of this variable in per-variable tables.
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub const fn is_terminal(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A level in the variable ordering (0-indexed).
///
/// # Invariants
///
/// - Level 0 is the topmost level (closest to root)
/// - Levels increase downward toward terminals
/// - After reordering, the same variable may be at a different level
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    pub const fn new(index: usize) -> Self {
        Level(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns the next level down (index + 1).
    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }

    /// Returns the previous level up (index - 1), or None if at level 0.
    pub fn prev(self) -> Option<Self> {
        if self.0 > 0 {
            Some(Level(self.0 - 1))
        } else {
            None
        }
    }

    pub fn is_top(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Level(index)
    }
}

/// Index of a node slot in the manager's arena.
///
/// Slot 0 always holds the terminal ONE. The upper bit is kept free so that a
/// [`Ref`][crate::reference::Ref] can pack the id together with a complement bit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const TERMINAL: NodeId = NodeId(0);
    pub const MAX: u32 = 0x7FFF_FFFF;

    /// # Panics
    ///
    /// Panics if `id` does not fit into 31 bits.
    pub const fn new(id: u32) -> Self {
        assert!(id <= Self::MAX, "NodeId must fit into 31 bits");
        NodeId(id)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_terminal(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.index(), 1);
        assert!(v1 < v2);
        assert!(Var::TERMINAL.is_terminal());
        assert!(!v1.is_terminal());
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_level_navigation() {
        let l0 = Level::new(0);
        let l1 = l0.next();

        assert_eq!(l1.index(), 1);
        assert_eq!(l1.prev(), Some(l0));
        assert_eq!(l0.prev(), None);
        assert!(l0.is_top());
        assert!(!l1.is_top());
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new(7).to_string(), "@7");
        assert!(NodeId::TERMINAL.is_terminal());
        assert_eq!(NodeId::new(3).index(), 3);
    }
}
