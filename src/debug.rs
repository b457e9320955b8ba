//! Debugging and verification helpers for BDD structures.
//!
//! These walk the diagram and are meant for tests and troubleshooting,
//! not for hot paths.

use std::collections::HashSet;
use std::fmt::{self, Write};

use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::{NodeId, Var};

/// Information about one decision node, as seen through an edge.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node_ref: Ref,
    pub variable: Var,
    pub level: usize,
    pub low: Ref,
    pub high: Ref,
    pub rc: u32,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: var={} level={} low={} high={} rc={}",
            self.node_ref, self.variable, self.level, self.low, self.high, self.rc
        )
    }
}

impl Bdd {
    /// Decision nodes reachable from `roots`, in DFS order.
    pub fn reachable(&self, roots: &[Ref]) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = roots.iter().map(|r| r.id()).collect();
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            order.push(id);
            let node = self.node(id);
            stack.push(node.high.id());
            stack.push(node.low.id());
        }
        order
    }

    /// Checks the structural invariants of every node reachable from `roots`.
    ///
    /// - reduction: `low != high`
    /// - ordering: both children lie strictly below the node
    /// - complement normalization: the stored `low` edge is regular
    /// - unique table: the subtable of the node's variable maps its children back to it
    /// - reference counts: every reachable node is held by someone
    /// - the live node counter matches the unique tables
    pub fn check_invariants(&self, roots: &[Ref]) -> Result<()> {
        for id in self.reachable(roots) {
            let node = self.node(id);
            let this = Ref::positive(id);
            let level = self.level_of(this);

            if node.is_terminal() {
                return Err(BddError::InconsistentState(format!("{} is a freed slot", id)));
            }
            if node.low == node.high {
                return Err(BddError::InconsistentState(format!("{} is redundant", id)));
            }
            if node.low.is_negated() {
                return Err(BddError::InconsistentState(format!("{} has a complemented low edge", id)));
            }
            for child in [node.low, node.high] {
                if self.level_of(child) <= level {
                    return Err(BddError::OrderingViolation {
                        variable: node.variable,
                        child: self.var_of(child),
                    });
                }
            }
            if self.subtables.borrow()[node.variable.index()].find(node.low, node.high) != Some(id) {
                return Err(BddError::InconsistentState(format!("{} is missing from the unique table", id)));
            }
            if node.rc == 0 && !roots.iter().any(|r| r.id() == id) {
                return Err(BddError::InconsistentState(format!("{} has parents but a zero count", id)));
            }
        }

        let stored: usize = self.subtables.borrow().iter().map(|st| st.len()).sum();
        if stored != self.live_nodes() {
            return Err(BddError::InconsistentState(format!(
                "live count {} disagrees with {} stored nodes",
                self.live_nodes(),
                stored
            )));
        }
        Ok(())
    }

    /// Truth table of `f` over `vars`, where bit `i` of the row index is the value of `vars[i]`.
    pub fn truth_table(&self, f: Ref, vars: &[Var]) -> Vec<bool> {
        assert!(vars.len() < 32, "truth table over {} variables is too large", vars.len());
        (0..1u64 << vars.len())
            .map(|row| {
                self.evaluate(f, |v| match vars.iter().position(|&u| u == v) {
                    Some(i) => (row >> i) & 1 == 1,
                    None => false,
                })
            })
            .collect()
    }

    pub fn node_info(&self, f: Ref) -> Option<NodeInfo> {
        if f.is_terminal() {
            return None;
        }
        let node = self.node(f.id());
        Some(NodeInfo {
            node_ref: f,
            variable: node.variable,
            level: self.level_of(f).index(),
            low: self.low_node(f),
            high: self.high_node(f),
            rc: node.rc,
        })
    }

    /// Compact dump of the diagram under `root`, sorted by level.
    pub fn debug_string(&self, root: Ref) -> String {
        let mut infos: Vec<NodeInfo> = self
            .reachable(&[root])
            .into_iter()
            .filter_map(|id| self.node_info(Ref::positive(id)))
            .collect();
        infos.sort_by_key(|info| (info.level, info.node_ref));

        let mut result = String::new();
        let _ = writeln!(result, "BDD {} (size={}):", root, infos.len());
        for info in &infos {
            let _ = writeln!(result, "  {}", info);
        }
        result
    }

    /// Print the current variable ordering.
    pub fn debug_ordering(&self) -> String {
        let names: Vec<String> = self
            .ordering()
            .iter()
            .enumerate()
            .map(|(level, var)| format!("{}@L{}", var, level))
            .collect();
        format!("Ordering: [{}]", names.join(", "))
    }
}
