//! Per-variable subtables forming the unique table.
//!
//! The manager keeps a plain `Vec<Node>` arena plus one subtable per variable:
//!
//! ```text
//! subtables[0] → nodes testing x1
//! subtables[1] → nodes testing x2
//! ...
//! ```
//!
//! Each subtable maps `(low, high)` children to the arena slot of the node.
//! The variable is implicit in which subtable is consulted. Keeping the
//! tables split by variable makes an adjacent swap touch only two of them.

use std::collections::HashMap;

use crate::reference::Ref;
use crate::types::{NodeId, Var};

/// Unique table for the nodes testing a single variable.
#[derive(Debug, Clone)]
pub struct Subtable {
    pub variable: Var,
    nodes: HashMap<(Ref, Ref), NodeId>,
}

impl Subtable {
    pub fn new(variable: Var) -> Self {
        Self {
            variable,
            nodes: HashMap::new(),
        }
    }

    /// Look up a node by its children.
    pub fn find(&self, low: Ref, high: Ref) -> Option<NodeId> {
        self.nodes.get(&(low, high)).copied()
    }

    pub fn insert(&mut self, low: Ref, high: Ref, id: NodeId) {
        let old = self.nodes.insert((low, high), id);
        debug_assert!(old.is_none(), "duplicate key ({}, {}) in subtable of {}", low, high, self.variable);
    }

    /// Remove a node from the subtable, returning its id if it was present.
    pub fn remove(&mut self, low: Ref, high: Ref) -> Option<NodeId> {
        self.nodes.remove(&(low, high))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all node ids in this subtable.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.values().copied()
    }

    /// Iterate over all `(low, high, id)` tuples.
    pub fn iter(&self) -> impl Iterator<Item = (Ref, Ref, NodeId)> + '_ {
        self.nodes.iter().map(|(&(low, high), &id)| (low, high, id))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_subtable_basic() {
        let mut st = Subtable::new(Var::new(1));

        let low = Ref::ONE;
        let high = Ref::ZERO;

        assert!(st.find(low, high).is_none());

        st.insert(low, high, NodeId::new(42));
        assert_eq!(st.find(low, high), Some(NodeId::new(42)));
        assert_eq!(st.len(), 1);

        assert_eq!(st.remove(low, high), Some(NodeId::new(42)));
        assert!(st.find(low, high).is_none());
        assert!(st.is_empty());
    }

    #[test]
    fn test_subtable_multiple_nodes() {
        let mut st = Subtable::new(Var::new(1));

        let a = Ref::positive(NodeId::new(2));
        let b = Ref::negative(NodeId::new(3));
        st.insert(Ref::ONE, Ref::ZERO, NodeId::new(10));
        st.insert(a, b, NodeId::new(20));
        st.insert(Ref::ONE, b, NodeId::new(30));

        assert_eq!(st.len(), 3);
        assert_eq!(st.find(a, b), Some(NodeId::new(20)));
        assert_eq!(st.find(Ref::ONE, b), Some(NodeId::new(30)));
        assert_eq!(st.find(b, a), None);

        let mut ids: Vec<_> = st.ids().collect();
        ids.sort();
        assert_eq!(ids, vec![NodeId::new(10), NodeId::new(20), NodeId::new(30)]);

        st.clear();
        assert!(st.is_empty());
    }
}
