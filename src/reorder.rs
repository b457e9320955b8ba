//! Dynamic variable reordering.
//!
//! # Variable ordering
//!
//! The size of a BDD is highly sensitive to the variable order. For the
//! equality comparator `(x₁ ⇔ y₁) ∧ … ∧ (xₙ ⇔ yₙ)`, the interleaved order
//! `x₁, y₁, …, xₙ, yₙ` needs O(n) nodes while `x₁, …, xₙ, y₁, …, yₙ` needs
//! O(2ⁿ). Finding the optimal order is NP-complete, so we use heuristics
//! built from local transformations.
//!
//! # Adjacent swap
//!
//! [`Bdd::swap_adjacent`] exchanges the variables at levels `i` and `i+1` in
//! place. Only nodes testing the upper variable `x` that have a child testing
//! the lower variable `y` are touched. Each such node `f = x ? f1 : f0` is
//! rewritten to
//!
//! ```text
//! f = y ? (x ? f11 : f01) : (x ? f10 : f00)
//! ```
//!
//! keeping its arena slot. Every existing edge therefore still denotes the
//! same function after the swap. Nodes that lose their last parent are freed
//! on the spot.
//!
//! # Rudell's sifting
//!
//! [`Bdd::sift`] moves one variable through all positions by adjacent swaps,
//! records the diagram size at each, and settles at the best one.
//! [`Bdd::reorder_all`] sifts every variable, largest subtable first, and
//! repeats while the total size keeps shrinking.
//!
//! # References
//!
//! - R. Rudell. "Dynamic variable ordering for ordered binary decision diagrams."
//!   ICCAD 1993. DOI: 10.1109/ICCAD.1993.580054
//!
//! - C. Meinel & T. Theobald. "Algorithms and Data Structures in VLSI Design."
//!   Springer, 1998. Chapter 4.

use log::{debug, info};

use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::{Level, NodeId, Var};

/// Statistics collected during reordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReorderStats {
    /// Number of adjacent swaps performed
    pub swaps: usize,
    /// Live node count before reordering
    pub initial_size: usize,
    /// Live node count after reordering
    pub final_size: usize,
    /// Smallest live node count observed
    pub best_size: usize,
    /// Number of variables sifted
    pub variables_processed: usize,
    /// Number of full sifting passes
    pub passes: usize,
}

impl ReorderStats {
    /// Calculate the size reduction ratio.
    pub fn reduction_ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        1.0 - (self.final_size as f64 / self.initial_size as f64)
    }

    /// Calculate the percentage reduction.
    pub fn reduction_percent(&self) -> f64 {
        self.reduction_ratio() * 100.0
    }
}

impl Bdd {
    /// Swaps the variables at `level` and `level + 1`.
    ///
    /// All edges held by callers keep denoting the same functions. Nodes with
    /// no remaining references among the touched ones are freed, the op cache
    /// is cleared and the generation is bumped.
    pub fn swap_adjacent(&self, level: Level) -> Result<()> {
        let n = self.num_vars();
        if level.index() + 1 >= n {
            return Err(BddError::LevelOutOfRange(level));
        }
        let x = self.var_order.borrow()[level.index()];
        let y = self.var_order.borrow()[level.index() + 1];
        debug!("swap_adjacent({}): {} <-> {}", level, x, y);

        // Update the order first, so that `mk` sees x below y.
        {
            let mut order = self.var_order.borrow_mut();
            order.swap(level.index(), level.index() + 1);
            let mut levels = self.level_map.borrow_mut();
            levels[x.index()] = level.next();
            levels[y.index()] = level;
        }

        // Nodes testing x with at least one child testing y must be rewritten.
        let touched: Vec<(Ref, Ref, NodeId)> = self.subtables.borrow()[x.index()]
            .iter()
            .filter(|&(low, high, _)| self.var_of(low) == y || self.var_of(high) == y)
            .collect();
        {
            let mut subtables = self.subtables.borrow_mut();
            for &(low, high, _) in &touched {
                subtables[x.index()].remove(low, high);
            }
        }

        let mut orphans = Vec::new();
        for &(low, high, id) in &touched {
            let (f00, f01) = self.cofactors_by(low, y);
            let (f10, f11) = self.cofactors_by(high, y);

            let new_low = self.mk(x, f00, f10)?;
            let new_high = self.mk(x, f01, f11)?;
            debug_assert!(!new_low.is_negated());
            debug_assert_ne!(new_low, new_high);

            self.inc_ref(new_low);
            self.inc_ref(new_high);
            {
                let mut nodes = self.nodes.borrow_mut();
                let node = &mut nodes[id.index()];
                node.variable = y;
                node.low = new_low;
                node.high = new_high;
            }
            // Moves from subtable[x] to subtable[y]; the live count is unchanged.
            self.subtables.borrow_mut()[y.index()].insert(new_low, new_high, id);

            for child in [low, high] {
                if let Some(orphan) = self.dec_ref(child) {
                    orphans.push(orphan);
                }
            }
        }
        let freed = self.free_cascade(orphans);

        self.cache.borrow_mut().clear();
        self.bump_generation();
        debug!(
            "swap_adjacent({}): rewrote {} nodes, freed {}, live = {}",
            level,
            touched.len(),
            freed,
            self.live_nodes()
        );
        Ok(())
    }

    /// Cofactors `(else, then)` of `f` with respect to `v`, if `f` tests `v` at its top.
    fn cofactors_by(&self, f: Ref, v: Var) -> (Ref, Ref) {
        if self.var_of(f) == v {
            (self.low_node(f), self.high_node(f))
        } else {
            (f, f)
        }
    }

    /// Moves `var` from `from` to `to` by adjacent swaps, returning the number of swaps.
    fn move_var(&self, from: usize, to: usize) -> Result<usize> {
        let mut cur = from;
        while cur > to {
            self.swap_adjacent(Level::new(cur - 1))?;
            cur -= 1;
        }
        while cur < to {
            self.swap_adjacent(Level::new(cur))?;
            cur += 1;
        }
        Ok(from.abs_diff(to))
    }

    /// Sifts a single variable to its locally best level.
    ///
    /// # Algorithm
    ///
    /// 1. Collect garbage, so that sizes only count reachable nodes
    /// 2. Move the variable towards the closer end of the order, recording the size after each swap
    /// 3. Return to the starting level, then explore the other direction the same way
    /// 4. Move the variable to the level with the minimum size
    ///
    /// A direction is abandoned once the size exceeds `best * max_growth`.
    /// Ties keep the original level (or the first level seen).
    pub fn sift(&self, var: Var) -> Result<ReorderStats> {
        let Some(start) = self.level(var) else {
            return Err(BddError::UnknownVariable(var));
        };
        self.collect_garbage();

        let n = self.num_vars();
        let start = start.index();
        let initial_size = self.live_nodes();
        let mut stats = ReorderStats {
            initial_size,
            final_size: initial_size,
            best_size: initial_size,
            variables_processed: 1,
            ..Default::default()
        };
        if n <= 1 {
            return Ok(stats);
        }

        let max_growth = self.config().max_growth;
        let mut best_level = start;
        let mut cur = start;

        let up_first = start <= n - 1 - start;
        for up in [up_first, !up_first] {
            stats.swaps += self.move_var(cur, start)?;
            cur = start;
            loop {
                let next = if up {
                    if cur == 0 {
                        break;
                    }
                    cur - 1
                } else {
                    if cur + 1 >= n {
                        break;
                    }
                    cur + 1
                };
                stats.swaps += self.move_var(cur, next)?;
                cur = next;

                let size = self.live_nodes();
                debug!("  {} at level {}: size = {}", var, cur, size);
                if size < stats.best_size {
                    stats.best_size = size;
                    best_level = cur;
                }
                if size as f64 > stats.best_size as f64 * max_growth {
                    break;
                }
            }
        }

        stats.swaps += self.move_var(cur, best_level)?;
        stats.final_size = self.live_nodes();
        debug!(
            "sift({}): level {} -> {}, size {} -> {}, {} swaps",
            var, start, best_level, initial_size, stats.final_size, stats.swaps
        );
        Ok(stats)
    }

    /// Sifts every variable, repeating until no pass shrinks the diagram
    /// or `max_reorder_passes` is exhausted.
    ///
    /// Variables are processed in decreasing order of the number of nodes
    /// testing them. Variables with no nodes are skipped.
    pub fn reorder_all(&self) -> Result<ReorderStats> {
        self.collect_garbage();
        let initial_size = self.live_nodes();
        let mut stats = ReorderStats {
            initial_size,
            final_size: initial_size,
            best_size: initial_size,
            ..Default::default()
        };

        for _ in 0..self.config().max_reorder_passes {
            let before = self.live_nodes();

            let mut vars: Vec<(usize, Var)> = self
                .ordering()
                .into_iter()
                .map(|v| (self.nodes_at(v), v))
                .filter(|&(count, _)| count > 0)
                .collect();
            vars.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

            for &(_, var) in &vars {
                let s = self.sift(var)?;
                stats.swaps += s.swaps;
                stats.variables_processed += 1;
                stats.best_size = stats.best_size.min(s.best_size);
            }
            stats.passes += 1;

            let after = self.live_nodes();
            debug!("reorder pass {}: size {} -> {}", stats.passes, before, after);
            if after >= before {
                break;
            }
        }

        stats.final_size = self.live_nodes();
        info!(
            "Reordering complete: size {} -> {} ({:.1}% reduction), {} swaps, {} passes",
            stats.initial_size,
            stats.final_size,
            stats.reduction_percent(),
            stats.swaps,
            stats.passes
        );
        Ok(stats)
    }
}
