//! Exact path counting over a complemented-edge BDD.
//!
//! # Polarity classes
//!
//! With complemented edges, a path from the root reaches the single terminal
//! `1` after passing an even or odd number of complement bits. The path
//! denotes `true` exactly when that number is even. The same physical node
//! can be reached with either parity, so every count is keyed by
//! `(node, parity)`, where the parity includes the bit of the edge entering
//! the node.
//!
//! For a node `n` at level `l`, `N(n, p)` is the number of assignments to the
//! variables at levels `l..num_vars` under which the walk from `n`, started
//! with parity `p`, ends with even parity:
//!
//! ```text
//! N(1, Even) = 1
//! N(1, Odd)  = 0
//! N(n, p)    = Σ over c in {low, high}: N(c, p ⊕ bit(c)) · 2^(level(c) - l - 1)
//! ```
//!
//! The factor accounts for the variables skipped by the edge. Since
//! `N(n, Even) + N(n, Odd) = 2^(num_vars - l)`, both classes are exact
//! complements of each other, and the number of satisfying assignments of
//! `root` is `N(root, bit(root)) · 2^level(root)`.

use std::collections::HashMap;
use std::fmt;

use log::{debug, info};
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::NodeId;

/// Parity of the complement bits accumulated along a path.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(negated: bool) -> Self {
        if negated {
            Parity::Odd
        } else {
            Parity::Even
        }
    }

    pub fn flip_if(self, flag: bool) -> Self {
        match (self, flag) {
            (p, false) => p,
            (Parity::Even, true) => Parity::Odd,
            (Parity::Odd, true) => Parity::Even,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Even => write!(f, "even"),
            Parity::Odd => write!(f, "odd"),
        }
    }
}

/// Memoized satisfying-path counts for one root edge.
///
/// The counts refer to physical node ids and are only valid for the manager
/// generation they were computed in. Any garbage collection or reordering
/// makes them stale (see [`PathCounter::is_stale`]).
#[derive(Debug, Clone)]
pub struct PathCounter {
    root: Ref,
    num_vars: usize,
    root_level: usize,
    generation: u64,
    memo: HashMap<(NodeId, Parity), BigUint>,
}

impl PathCounter {
    /// Counts satisfying paths for every node reachable from `root`.
    pub fn new(bdd: &Bdd, root: Ref) -> Self {
        let num_vars = bdd.num_vars();
        let mut memo: HashMap<(NodeId, Parity), BigUint> = HashMap::new();
        memo.insert((NodeId::TERMINAL, Parity::Even), BigUint::one());
        memo.insert((NodeId::TERMINAL, Parity::Odd), BigUint::zero());

        // Iterative post-order: a node is finished once both children are.
        let mut stack = vec![(root.id(), false)];
        while let Some((id, expanded)) = stack.pop() {
            if memo.contains_key(&(id, Parity::Even)) {
                continue;
            }
            let node = bdd.node(id);
            if !expanded {
                stack.push((id, true));
                for child in [node.low, node.high] {
                    if !memo.contains_key(&(child.id(), Parity::Even)) {
                        stack.push((child.id(), false));
                    }
                }
                continue;
            }

            let level = bdd.level_of(Ref::positive(id)).index();
            for parity in [Parity::Even, Parity::Odd] {
                let mut total = BigUint::zero();
                for child in [node.low, node.high] {
                    let gap = bdd.level_of(child).index() - level - 1;
                    let count = &memo[&(child.id(), parity.flip_if(child.is_negated()))];
                    total += count << gap;
                }
                memo.insert((id, parity), total);
            }
        }

        let counter = Self {
            root,
            num_vars,
            root_level: bdd.level_of(root).index(),
            generation: bdd.generation(),
            memo,
        };
        info!(
            "Counted paths of {}: {} satisfying assignments over {} variables ({} nodes)",
            root,
            counter.satisfying(),
            num_vars,
            counter.memo.len() / 2 - 1
        );
        counter
    }

    pub fn root(&self) -> Ref {
        self.root
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// `N(id, parity)`, or `None` if the node is not reachable from the root.
    pub fn count(&self, id: NodeId, parity: Parity) -> Option<&BigUint> {
        self.memo.get(&(id, parity))
    }

    /// Assignments to the variables from the level of `f` downwards that make `f` true.
    pub fn count_edge(&self, f: Ref) -> Option<&BigUint> {
        self.count(f.id(), Parity::of(f.is_negated()))
    }

    /// Number of satisfying assignments of the root over all variables.
    pub fn satisfying(&self) -> BigUint {
        match self.count_edge(self.root) {
            Some(count) => count << self.root_level,
            None => BigUint::zero(),
        }
    }

    /// Number of falsifying assignments of the root over all variables.
    pub fn unsatisfying(&self) -> BigUint {
        (BigUint::one() << self.num_vars) - self.satisfying()
    }

    /// Whether the manager has changed node identities since the counts were computed.
    pub fn is_stale(&self, bdd: &Bdd) -> bool {
        let stale = bdd.generation() != self.generation || bdd.num_vars() != self.num_vars;
        if stale {
            debug!("PathCounter for {} is stale", self.root);
        }
        stale
    }
}
