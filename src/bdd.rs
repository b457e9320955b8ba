//! The BDD manager: node arena, unique table, complemented edges and the AND engine.
//!
//! # Representation
//!
//! All nodes live in one arena owned by [`Bdd`]. Slot 0 is the single
//! terminal `1`, and `0` is its complemented edge. Every other slot holds a
//! decision node `(variable, low, high)`, where `low` is the ELSE edge and
//! `high` is the THEN edge.
//!
//! A [`Ref`] is a node id plus a complement bit. A node and its negation
//! share the same slot. To keep the representation canonical, the ELSE edge
//! of a stored node is never complemented:
//!
//! ```text
//! mk(v, ~e, t) = ~mk(v, e, ~t)
//! ```
//!
//! # Ownership
//!
//! Each node carries a reference count: one per parent node, plus one per
//! external owner that called [`Bdd::retain`] (or received an edge from
//! [`Bdd::mk_node`]). Results of `apply_*` are *floating*: they stay valid
//! until the next garbage collection, which happens only inside
//! [`Bdd::collect_garbage`], reordering and circuit compilation. Edges that
//! must survive those points have to be retained.
//!
//! # Example
//!
//! ```
//! use bdd_sampler::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let x = bdd.new_var();
//! let y = bdd.new_var();
//! let fx = bdd.mk_var(x).unwrap();
//! let fy = bdd.mk_var(y).unwrap();
//!
//! let f = bdd.apply_and(fx, fy).unwrap();
//! let g = bdd.apply_and(fy, fx).unwrap();
//! assert_eq!(f, g);
//! assert!(bdd.is_zero(bdd.apply_and(f, -f).unwrap()));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;

use log::debug;

use crate::cache::{OpCache, OpKey};
use crate::error::{BddError, Result};
use crate::node::Node;
use crate::reference::Ref;
use crate::subtable::Subtable;
use crate::types::{Level, NodeId, Var};

/// Tunables of the manager.
#[derive(Debug, Clone)]
pub struct BddConfig {
    /// The operation cache has `2^cache_bits` slots.
    pub cache_bits: usize,
    /// Sift variables during compilation once the diagram grows past `reorder_threshold`.
    pub auto_reorder: bool,
    /// Live node count that triggers automatic reordering. Doubles after each trigger.
    pub reorder_threshold: usize,
    /// Sifting stops moving a variable further once the size exceeds `best * max_growth`.
    pub max_growth: f64,
    /// Upper bound on the number of full sifting passes in one `reorder_all`.
    pub max_reorder_passes: usize,
    /// Run a final `reorder_all` once the circuit output is built.
    pub reorder_on_finish: bool,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            cache_bits: 16,
            auto_reorder: true,
            reorder_threshold: 4096,
            max_growth: 1.2,
            max_reorder_passes: 4,
            reorder_on_finish: true,
        }
    }
}

impl BddConfig {
    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_auto_reorder(mut self, enabled: bool) -> Self {
        self.auto_reorder = enabled;
        self
    }

    pub fn with_reorder_threshold(mut self, threshold: usize) -> Self {
        self.reorder_threshold = threshold;
        self
    }

    pub fn with_max_growth(mut self, max_growth: f64) -> Self {
        self.max_growth = max_growth;
        self
    }

    pub fn with_max_reorder_passes(mut self, passes: usize) -> Self {
        self.max_reorder_passes = passes;
        self
    }

    pub fn with_reorder_on_finish(mut self, enabled: bool) -> Self {
        self.reorder_on_finish = enabled;
        self
    }
}

/// Pending work of the iterative conjunction.
enum AndTask {
    /// Resolve `f ∧ g`, pushing its result.
    Expand(Ref, Ref),
    /// Pop the THEN and ELSE results and build the node testing the variable.
    Combine(OpKey, Var),
}

/// The BDD manager.
pub struct Bdd {
    config: BddConfig,
    pub(crate) nodes: RefCell<Vec<Node>>,
    pub(crate) free: RefCell<Vec<NodeId>>,
    /// Unique tables, indexed by `var.index()`.
    pub(crate) subtables: RefCell<Vec<Subtable>>,
    /// Level to variable.
    pub(crate) var_order: RefCell<Vec<Var>>,
    /// Variable (by `var.index()`) to level.
    pub(crate) level_map: RefCell<Vec<Level>>,
    pub(crate) cache: RefCell<OpCache<OpKey, Ref>>,
    /// Number of nodes stored across all subtables.
    live: Cell<usize>,
    generation: Cell<u64>,
}

impl Default for Bdd {
    fn default() -> Self {
        Self::with_config(BddConfig::default())
    }
}

impl fmt::Debug for Bdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bdd")
            .field("num_vars", &self.num_vars())
            .field("live_nodes", &self.live_nodes())
            .field("arena", &self.nodes.borrow().len())
            .field("generation", &self.generation.get())
            .finish()
    }
}

impl Bdd {
    pub fn with_config(config: BddConfig) -> Self {
        let cache = OpCache::new(config.cache_bits);
        Self {
            config,
            nodes: RefCell::new(vec![Node::terminal()]),
            free: RefCell::new(Vec::new()),
            subtables: RefCell::new(Vec::new()),
            var_order: RefCell::new(Vec::new()),
            level_map: RefCell::new(Vec::new()),
            cache: RefCell::new(cache),
            live: Cell::new(0),
            generation: Cell::new(0),
        }
    }

    pub fn config(&self) -> &BddConfig {
        &self.config
    }

    /// Tears down every node, variable and cached result.
    ///
    /// All previously handed out edges and variables become invalid.
    pub fn reset(&self) {
        debug!("reset()");
        *self.nodes.borrow_mut() = vec![Node::terminal()];
        self.free.borrow_mut().clear();
        self.subtables.borrow_mut().clear();
        self.var_order.borrow_mut().clear();
        self.level_map.borrow_mut().clear();
        self.cache.borrow_mut().clear();
        self.live.set(0);
        self.bump_generation();
    }

    /// Counter bumped by every event that may invalidate node identities
    /// (garbage collection, swaps, reset).
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn bump_generation(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    // ---- variables and levels ----

    /// Creates a fresh variable placed at the bottom of the current order.
    pub fn new_var(&self) -> Var {
        let var = Var::new(self.num_vars() as u32 + 1);
        let level = Level::new(self.num_vars());
        self.subtables.borrow_mut().push(Subtable::new(var));
        self.var_order.borrow_mut().push(var);
        self.level_map.borrow_mut().push(level);
        debug!("new_var() -> {} at {}", var, level);
        var
    }

    pub fn num_vars(&self) -> usize {
        self.var_order.borrow().len()
    }

    pub fn contains_var(&self, var: Var) -> bool {
        !var.is_terminal() && var.index() < self.num_vars()
    }

    /// Returns the current level of `var`, if it belongs to this manager.
    pub fn level(&self, var: Var) -> Option<Level> {
        if self.contains_var(var) {
            Some(self.level_map.borrow()[var.index()])
        } else {
            None
        }
    }

    pub fn var_at_level(&self, level: Level) -> Option<Var> {
        self.var_order.borrow().get(level.index()).copied()
    }

    /// Variables from the top of the order to the bottom.
    pub fn ordering(&self) -> Vec<Var> {
        self.var_order.borrow().clone()
    }

    /// Level of the node an edge points to. The terminal sits at `num_vars()`.
    pub fn level_of(&self, f: Ref) -> Level {
        let var = self.var_of(f);
        if var.is_terminal() {
            Level::new(self.num_vars())
        } else {
            self.level_map.borrow()[var.index()]
        }
    }

    // ---- nodes ----

    pub fn node(&self, id: NodeId) -> Node {
        self.nodes.borrow()[id.index()]
    }

    /// The variable tested at the top of `f` (`Var::TERMINAL` for constants).
    pub fn var_of(&self, f: Ref) -> Var {
        self.nodes.borrow()[f.id().index()].variable
    }

    pub fn low(&self, id: NodeId) -> Ref {
        self.nodes.borrow()[id.index()].low
    }

    pub fn high(&self, id: NodeId) -> Ref {
        self.nodes.borrow()[id.index()].high
    }

    /// ELSE cofactor of `f`, with the complement of `f` pushed into it.
    pub fn low_node(&self, f: Ref) -> Ref {
        self.low(f.id()).negate_if(f.is_negated())
    }

    /// THEN cofactor of `f`, with the complement of `f` pushed into it.
    pub fn high_node(&self, f: Ref) -> Ref {
        self.high(f.id()).negate_if(f.is_negated())
    }

    /// Cofactors of `f` with respect to the variable at `level`.
    ///
    /// Returns `(f, f)` if `f` does not test that variable at its top.
    pub fn top_cofactors(&self, f: Ref, level: Level) -> (Ref, Ref) {
        if f.is_terminal() || self.level_of(f) > level {
            return (f, f);
        }
        debug_assert_eq!(self.level_of(f), level);
        (self.low_node(f), self.high_node(f))
    }

    pub fn zero(&self) -> Ref {
        Ref::ZERO
    }

    pub fn one(&self) -> Ref {
        Ref::ONE
    }

    pub fn is_zero(&self, f: Ref) -> bool {
        f == Ref::ZERO
    }

    pub fn is_one(&self, f: Ref) -> bool {
        f == Ref::ONE
    }

    pub fn is_terminal(&self, f: Ref) -> bool {
        f.is_terminal()
    }

    /// Number of decision nodes currently stored in the unique tables.
    ///
    /// Includes dead nodes (zero references) that were not yet collected.
    pub fn live_nodes(&self) -> usize {
        self.live.get()
    }

    /// Number of decision nodes stored for `var`.
    pub fn nodes_at(&self, var: Var) -> usize {
        self.subtables.borrow().get(var.index()).map_or(0, |st| st.len())
    }

    /// Number of distinct decision nodes reachable from `roots` (terminal excluded).
    pub fn node_count(&self, roots: &[Ref]) -> usize {
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = roots.iter().map(|r| r.id()).collect();
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            let node = self.node(id);
            stack.push(node.low.id());
            stack.push(node.high.id());
        }
        visited.len()
    }

    // ---- reference counting ----

    /// Registers an external owner of `f`.
    pub fn retain(&self, f: Ref) {
        if f.is_terminal() {
            return;
        }
        let mut nodes = self.nodes.borrow_mut();
        let node = &mut nodes[f.id().index()];
        node.rc = node.rc.saturating_add(1);
    }

    /// Drops an external owner of `f`.
    ///
    /// The node is not freed right away: it stays in the unique table (and can
    /// be revived by `mk`) until the next garbage collection.
    ///
    /// # Panics
    ///
    /// Panics if the reference count of `f` is already zero.
    pub fn release(&self, f: Ref) {
        if f.is_terminal() {
            return;
        }
        let mut nodes = self.nodes.borrow_mut();
        let node = &mut nodes[f.id().index()];
        assert!(node.rc > 0, "release of {} with zero reference count", f);
        node.rc -= 1;
    }

    pub fn ref_count(&self, f: Ref) -> u32 {
        self.nodes.borrow()[f.id().index()].rc
    }

    /// Frees every node with a zero reference count, cascading to children.
    ///
    /// Returns the number of freed nodes.
    pub fn collect_garbage(&self) -> usize {
        let nodes = self.nodes.borrow();
        let subtables = self.subtables.borrow();
        let dead: Vec<NodeId> = subtables
            .iter()
            .flat_map(|st| st.ids())
            .filter(|id| nodes[id.index()].rc == 0)
            .collect();
        drop(subtables);
        drop(nodes);

        let freed = self.free_cascade(dead);
        self.cache.borrow_mut().clear();
        self.bump_generation();
        debug!("collect_garbage() freed {} nodes, {} live", freed, self.live_nodes());
        freed
    }

    /// Removes the given zero-count nodes from their subtables and the arena,
    /// then does the same for every child whose count drops to zero.
    pub(crate) fn free_cascade(&self, mut stack: Vec<NodeId>) -> usize {
        let mut freed = 0;
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.is_terminal() || node.rc > 0 {
                continue;
            }

            let removed = self.subtables.borrow_mut()[node.variable.index()].remove(node.low, node.high);
            debug_assert_eq!(removed, Some(id));
            self.live.set(self.live.get() - 1);
            self.nodes.borrow_mut()[id.index()] = Node::new(Var::TERMINAL, Ref::ONE, Ref::ONE);
            self.free.borrow_mut().push(id);
            freed += 1;

            for child in [node.low, node.high] {
                if let Some(orphan) = self.dec_ref(child) {
                    stack.push(orphan);
                }
            }
        }
        freed
    }

    /// Increments the parent count of `f`'s node.
    pub(crate) fn inc_ref(&self, f: Ref) {
        self.retain(f);
    }

    /// Decrements the parent count of `f`'s node, returning its id if the count hit zero.
    pub(crate) fn dec_ref(&self, f: Ref) -> Option<NodeId> {
        if f.is_terminal() {
            return None;
        }
        let mut nodes = self.nodes.borrow_mut();
        let node = &mut nodes[f.id().index()];
        debug_assert!(node.rc > 0, "dec_ref of {} with zero reference count", f);
        node.rc = node.rc.saturating_sub(1);
        if node.rc == 0 {
            Some(f.id())
        } else {
            None
        }
    }

    // ---- node construction ----

    /// Finds or creates the node `(v, low, high)` without touching its reference count.
    pub(crate) fn mk(&self, v: Var, low: Ref, high: Ref) -> Result<Ref> {
        let Some(level) = self.level(v) else {
            return Err(BddError::UnknownVariable(v));
        };
        for child in [low, high] {
            if !child.is_terminal() && self.level_of(child) <= level {
                return Err(BddError::OrderingViolation {
                    variable: v,
                    child: self.var_of(child),
                });
            }
        }

        if low == high {
            return Ok(low);
        }

        if low.is_negated() {
            return Ok(-self.mk(v, -low, -high)?);
        }

        if let Some(id) = self.subtables.borrow()[v.index()].find(low, high) {
            return Ok(Ref::positive(id));
        }

        let id = self.allocate(Node::new(v, low, high));
        self.inc_ref(low);
        self.inc_ref(high);
        self.subtables.borrow_mut()[v.index()].insert(low, high, id);
        self.live.set(self.live.get() + 1);
        debug!("mk({}, {}, {}) -> new {}", v, low, high, id);
        Ok(Ref::positive(id))
    }

    fn allocate(&self, node: Node) -> NodeId {
        if let Some(id) = self.free.borrow_mut().pop() {
            self.nodes.borrow_mut()[id.index()] = node;
            return id;
        }
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId::new(nodes.len() as u32);
        nodes.push(node);
        id
    }

    /// Returns the canonical edge for `if v then high else low`.
    ///
    /// The returned edge is owned by the caller: its reference count has been
    /// incremented and must eventually be given back with [`Bdd::release`].
    ///
    /// Fails with [`BddError::OrderingViolation`] if a child is not strictly below `v`.
    pub fn mk_node(&self, v: Var, low: Ref, high: Ref) -> Result<Ref> {
        let res = self.mk(v, low, high)?;
        self.retain(res);
        Ok(res)
    }

    /// Returns an owned edge for the positive literal of `v`.
    pub fn mk_var(&self, v: Var) -> Result<Ref> {
        self.mk_node(v, Ref::ZERO, Ref::ONE)
    }

    // ---- apply ----

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    /// Conjunction of two edges.
    ///
    /// The result is floating: retain it if it must outlive the next garbage collection.
    ///
    /// The Shannon expansion runs on an explicit stack, so the depth of the
    /// diagram is not limited by the thread's call stack.
    pub fn apply_and(&self, f: Ref, g: Ref) -> Result<Ref> {
        let mut tasks = vec![AndTask::Expand(f, g)];
        let mut results: Vec<Ref> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                AndTask::Expand(f, g) => {
                    if let Some(res) = self.and_terminal_case(f, g) {
                        results.push(res);
                        continue;
                    }

                    let key = OpKey::and(f, g);
                    if let Some(res) = self.cache.borrow_mut().get(&key) {
                        debug!("cache: apply_and({}, {}) -> {}", f, g, res);
                        results.push(res);
                        continue;
                    }

                    let level = self.level_of(f).min(self.level_of(g));
                    let Some(v) = self.var_at_level(level) else {
                        return Err(BddError::LevelOutOfRange(level));
                    };
                    let (f0, f1) = self.top_cofactors(f, level);
                    let (g0, g1) = self.top_cofactors(g, level);

                    // The ELSE branch is expanded first, so its result lands below the THEN result.
                    tasks.push(AndTask::Combine(key, v));
                    tasks.push(AndTask::Expand(f1, g1));
                    tasks.push(AndTask::Expand(f0, g0));
                }
                AndTask::Combine(key, v) => {
                    let (Some(t), Some(e)) = (results.pop(), results.pop()) else {
                        return Err(BddError::InconsistentState("apply_and result stack underflow".to_string()));
                    };
                    let res = self.mk(v, e, t)?;
                    debug!("computed: {:?} -> {}", key, res);
                    self.cache.borrow_mut().insert(key, res);
                    results.push(res);
                }
            }
        }

        match (results.pop(), results.is_empty()) {
            (Some(res), true) => Ok(res),
            _ => Err(BddError::InconsistentState("apply_and left unbalanced results".to_string())),
        }
    }

    fn and_terminal_case(&self, f: Ref, g: Ref) -> Option<Ref> {
        if self.is_zero(f) || self.is_zero(g) || f == -g {
            Some(Ref::ZERO)
        } else if self.is_one(f) || f == g {
            Some(g)
        } else if self.is_one(g) {
            Some(f)
        } else {
            None
        }
    }

    pub fn apply_or(&self, f: Ref, g: Ref) -> Result<Ref> {
        Ok(-self.apply_and(-f, -g)?)
    }

    pub fn apply_xor(&self, f: Ref, g: Ref) -> Result<Ref> {
        let a = self.apply_and(f, -g)?;
        let b = self.apply_and(-f, g)?;
        self.apply_or(a, b)
    }

    /// `ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)`
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        let a = self.apply_and(f, g)?;
        let b = self.apply_and(-f, h)?;
        self.apply_or(a, b)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache.borrow().hits()
    }

    pub fn cache_misses(&self) -> usize {
        self.cache.borrow().misses()
    }

    // ---- evaluation ----

    /// Evaluates `f` under the given variable assignment.
    pub fn evaluate(&self, f: Ref, value: impl Fn(Var) -> bool) -> bool {
        let mut cur = f;
        while !cur.is_terminal() {
            cur = if value(self.var_of(cur)) {
                self.high_node(cur)
            } else {
                self.low_node(cur)
            };
        }
        self.is_one(cur)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn setup(n: usize) -> (Bdd, Vec<Var>, Vec<Ref>) {
        let bdd = Bdd::default();
        let vars: Vec<Var> = (0..n).map(|_| bdd.new_var()).collect();
        let lits = vars.iter().map(|&v| bdd.mk_var(v).unwrap()).collect();
        (bdd, vars, lits)
    }

    #[test]
    fn test_var() {
        let (bdd, vars, lits) = setup(1);
        let x = lits[0];

        assert_eq!(bdd.var_of(x), vars[0]);
        assert_eq!(bdd.high_node(x), bdd.one());
        assert_eq!(bdd.low_node(x), bdd.zero());
        assert_eq!(bdd.ref_count(x), 1);
    }

    #[test]
    fn test_not_var() {
        let (bdd, _, lits) = setup(1);
        let x = lits[0];
        let not_x = bdd.apply_not(x);

        assert_eq!(x.id(), not_x.id());
        assert_eq!(bdd.high_node(not_x), bdd.zero());
        assert_eq!(bdd.low_node(not_x), bdd.one());
    }

    #[test]
    fn test_stored_low_is_regular() {
        let (bdd, _, lits) = setup(3);
        let f = bdd.apply_xor(lits[0], bdd.apply_or(lits[1], -lits[2]).unwrap()).unwrap();

        for st in bdd.subtables.borrow().iter() {
            for (low, _, _) in st.iter() {
                assert!(!low.is_negated());
            }
        }
        assert!(!bdd.is_terminal(f));
    }

    #[test]
    fn test_terminal() {
        let bdd = Bdd::default();

        assert!(bdd.is_zero(bdd.zero()));
        assert!(bdd.is_one(bdd.one()));
        assert_eq!(bdd.apply_not(bdd.one()), bdd.zero());
        assert_eq!(bdd.level_of(bdd.one()), Level::new(0));
    }

    #[test]
    fn test_mk_reduction() {
        let (bdd, vars, lits) = setup(2);
        let y = lits[1];

        let r = bdd.mk_node(vars[0], y, y).unwrap();
        assert_eq!(r, y);
    }

    #[test]
    fn test_mk_hash_consing() {
        let (bdd, vars, lits) = setup(2);
        let y = lits[1];

        let a = bdd.mk_node(vars[0], bdd.zero(), y).unwrap();
        let b = bdd.mk_node(vars[0], bdd.zero(), y).unwrap();
        assert_eq!(a, b);
        assert_eq!(bdd.ref_count(a), 2);
        assert_eq!(a, bdd.apply_and(lits[0], y).unwrap());
    }

    #[test]
    fn test_mk_complement_normalization() {
        let (bdd, vars, lits) = setup(2);
        let y = lits[1];

        let a = bdd.mk_node(vars[0], -y, y).unwrap();
        let b = bdd.mk_node(vars[0], y, -y).unwrap();
        assert_eq!(a, -b);
    }

    #[test]
    fn test_mk_ordering_violation() {
        let (bdd, vars, lits) = setup(2);
        let x = lits[0];

        let err = bdd.mk_node(vars[1], bdd.zero(), x).unwrap_err();
        assert_eq!(
            err,
            BddError::OrderingViolation {
                variable: vars[1],
                child: vars[0],
            }
        );
        let err = bdd.mk_node(vars[0], bdd.zero(), x).unwrap_err();
        assert!(matches!(err, BddError::OrderingViolation { .. }));
    }

    #[test]
    fn test_mk_unknown_variable() {
        let bdd = Bdd::default();
        let err = bdd.mk_node(Var::new(5), bdd.zero(), bdd.one()).unwrap_err();
        assert_eq!(err, BddError::UnknownVariable(Var::new(5)));
    }

    #[test]
    fn test_and_base_cases() {
        let (bdd, _, lits) = setup(2);
        let f = bdd.apply_or(lits[0], lits[1]).unwrap();

        assert_eq!(bdd.apply_and(f, bdd.zero()).unwrap(), bdd.zero());
        assert_eq!(bdd.apply_and(bdd.one(), f).unwrap(), f);
        assert_eq!(bdd.apply_and(f, f).unwrap(), f);
        assert_eq!(bdd.apply_and(f, -f).unwrap(), bdd.zero());
    }

    #[test]
    fn test_and_commutes() {
        let (bdd, _, lits) = setup(3);
        let (x, y, z) = (lits[0], lits[1], lits[2]);

        let a = bdd.apply_and(bdd.apply_and(x, -y).unwrap(), z).unwrap();
        let b = bdd.apply_and(z, bdd.apply_and(-y, x).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_de_morgan() {
        let (bdd, _, lits) = setup(2);
        let (x, y) = (lits[0], lits[1]);

        let f = bdd.apply_and(x, y).unwrap();
        let g = -bdd.apply_or(-x, -y).unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn test_xor_itself() {
        let (bdd, _, lits) = setup(1);
        let x = lits[0];
        assert_eq!(bdd.apply_xor(x, x).unwrap(), bdd.zero());
        assert_eq!(bdd.apply_xor(x, -x).unwrap(), bdd.one());
    }

    #[test]
    fn test_apply_ite() {
        let (bdd, _, lits) = setup(3);
        let (x, y, z) = (lits[0], lits[1], lits[2]);

        let f = bdd.apply_ite(x, y, z).unwrap();
        assert_eq!(bdd.high_node(f), y);
        assert_eq!(bdd.low_node(f), z);
        assert_eq!(bdd.var_of(f), bdd.var_of(x));
    }

    #[test]
    fn test_evaluate() {
        let (bdd, vars, lits) = setup(2);
        let f = bdd.apply_xor(lits[0], lits[1]).unwrap();

        for bits in 0..4u32 {
            let a = bits & 1 == 1;
            let b = bits & 2 == 2;
            let res = bdd.evaluate(f, |v| if v == vars[0] { a } else { b });
            assert_eq!(res, a ^ b);
        }
    }

    #[test]
    fn test_garbage_collection() {
        let (bdd, _, lits) = setup(3);
        let (x, y, z) = (lits[0], lits[1], lits[2]);

        let keep = bdd.apply_and(x, y).unwrap();
        bdd.retain(keep);
        let tmp = bdd.apply_or(bdd.apply_and(y, z).unwrap(), x).unwrap();
        assert!(!bdd.is_terminal(tmp));

        let before = bdd.live_nodes();
        let freed = bdd.collect_garbage();
        assert!(freed > 0);
        assert_eq!(bdd.live_nodes(), before - freed);

        // Retained results and the literals survive.
        assert_eq!(bdd.apply_and(y, x).unwrap(), keep);
        assert_eq!(bdd.high_node(z), bdd.one());

        bdd.release(keep);
        bdd.collect_garbage();
        assert_eq!(bdd.live_nodes(), 3);
    }

    #[test]
    fn test_free_slots_are_reused() {
        let (bdd, _, lits) = setup(2);
        let f = bdd.apply_and(lits[0], lits[1]).unwrap();
        let arena = bdd.nodes.borrow().len();

        assert!(!bdd.is_terminal(f));
        assert_eq!(bdd.collect_garbage(), 1);
        let g = bdd.apply_and(lits[0], -lits[1]).unwrap();
        assert!(!bdd.is_terminal(g));
        assert_eq!(bdd.nodes.borrow().len(), arena);
    }

    #[test]
    fn test_generation_bumps() {
        let bdd = Bdd::default();
        let g0 = bdd.generation();
        bdd.collect_garbage();
        assert!(bdd.generation() > g0);
    }

    #[test]
    fn test_reset() {
        let (bdd, _, lits) = setup(2);
        bdd.apply_and(lits[0], lits[1]).unwrap();
        bdd.reset();

        assert_eq!(bdd.num_vars(), 0);
        assert_eq!(bdd.live_nodes(), 0);
        assert_eq!(bdd.nodes.borrow().len(), 1);
    }

    fn stored_nodes(bdd: &Bdd) -> usize {
        bdd.subtables.borrow().iter().map(|st| st.len()).sum()
    }

    #[test]
    fn test_and_over_deep_diagram() {
        let n = 20_000;
        let bdd = Bdd::with_config(BddConfig::default().with_cache_bits(10));
        let vars: Vec<Var> = (0..n).map(|_| bdd.new_var()).collect();

        // Built bottom-up, each step only adds one node on top.
        let mut chain = bdd.one();
        for &v in vars[..n - 1].iter().rev() {
            chain = bdd.mk(v, Ref::ZERO, chain).unwrap();
        }
        let last = bdd.mk_var(vars[n - 1]).unwrap();

        // Reaches the bottom variable through every level.
        let f = bdd.apply_and(chain, last).unwrap();
        assert_eq!(bdd.node_count(&[f]), n);
        assert!(bdd.evaluate(f, |_| true));
        assert!(!bdd.evaluate(f, |v| v != vars[n - 1]));
        assert_eq!(bdd.apply_and(f, -last).unwrap(), bdd.zero());
    }

    #[test]
    fn test_live_count_tracks_subtables() {
        let (bdd, _, lits) = setup(4);
        assert_eq!(bdd.live_nodes(), stored_nodes(&bdd));

        let f = bdd.apply_xor(bdd.apply_and(lits[0], lits[3]).unwrap(), lits[1]).unwrap();
        bdd.retain(f);
        assert_eq!(bdd.live_nodes(), stored_nodes(&bdd));

        bdd.swap_adjacent(Level::new(1)).unwrap();
        assert_eq!(bdd.live_nodes(), stored_nodes(&bdd));

        bdd.collect_garbage();
        assert_eq!(bdd.live_nodes(), stored_nodes(&bdd));

        bdd.reset();
        assert_eq!(bdd.live_nodes(), 0);
    }

    #[test]
    fn test_config_builder() {
        let config = BddConfig::default()
            .with_cache_bits(4)
            .with_auto_reorder(false)
            .with_max_reorder_passes(2);
        let bdd = Bdd::with_config(config);

        assert_eq!(bdd.cache.borrow().capacity(), 16);
        assert!(!bdd.config().auto_reorder);
        assert_eq!(bdd.config().max_reorder_passes, 2);
    }
}
