//! Uniform sampling of satisfying assignments.
//!
//! A sample is a random walk from the root to the terminal. At every node
//! the walk takes the THEN branch with probability
//!
//! ```text
//! w(then) / (w(then) + w(else)),   w(c) = N(c, bit(c)) · 2^(level(c) - level(node) - 1)
//! ```
//!
//! where `N` comes from the [`PathCounter`]. The complement of the current
//! edge is pushed into both children before they are weighed, so the edge
//! bit carries the accumulated parity. Variables skipped by an edge or not
//! tested at all are drawn uniformly. Every satisfying assignment is
//! therefore produced with the same probability `1 / satisfying()`.

use log::{debug, warn};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rand::Rng;

use crate::bdd::Bdd;
use crate::count::{Parity, PathCounter};
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::Var;

/// One full assignment to the manager's variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
    tested: Vec<bool>,
}

impl Assignment {
    /// Value of `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` is not covered by this assignment.
    pub fn value(&self, var: Var) -> bool {
        self.values[var.index()]
    }

    /// Whether the walk decided `var` (as opposed to drawing it as a don't-care).
    pub fn is_tested(&self, var: Var) -> bool {
        self.tested[var.index()]
    }

    /// Values of `vars`, in the given order.
    pub fn bits(&self, vars: &[Var]) -> Vec<bool> {
        vars.iter().map(|&v| self.value(v)).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        self.values.iter().enumerate().map(|(i, &b)| (Var::new(i as u32 + 1), b))
    }
}

/// Draws satisfying assignments of the root of a [`PathCounter`].
pub struct Sampler<'a> {
    bdd: &'a Bdd,
    counts: &'a PathCounter,
}

impl<'a> Sampler<'a> {
    /// Fails with [`BddError::InconsistentState`] if the counts are stale.
    pub fn new(bdd: &'a Bdd, counts: &'a PathCounter) -> Result<Self> {
        let sampler = Self { bdd, counts };
        sampler.check_fresh()?;
        Ok(sampler)
    }

    fn check_fresh(&self) -> Result<()> {
        if self.counts.is_stale(self.bdd) {
            return Err(BddError::InconsistentState(
                "path counts were computed before the last garbage collection or reordering".to_string(),
            ));
        }
        Ok(())
    }

    /// Draws one assignment uniformly from the satisfying assignments of the root.
    ///
    /// Fails with [`BddError::Unsatisfiable`] if there are none.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Assignment> {
        self.check_fresh()?;
        if self.counts.satisfying().is_zero() {
            return Err(BddError::Unsatisfiable);
        }

        let n = self.counts.num_vars();
        let mut values: Vec<bool> = (0..n).map(|_| rng.random_bool(0.5)).collect();
        let mut tested = vec![false; n];

        let mut cur = self.counts.root();
        while !cur.is_terminal() {
            let var = self.bdd.var_of(cur);
            let level = self.bdd.level_of(cur).index();
            let low = self.bdd.low_node(cur);
            let high = self.bdd.high_node(cur);

            let w_low = self.weight(low, level)?;
            let w_high = self.weight(high, level)?;
            let total = &w_low + &w_high;

            let take_high = if total.is_zero() {
                warn!("Both branches of {} have zero weight, splitting evenly", cur);
                rng.random_bool(0.5)
            } else {
                rng.random::<f64>() < ratio(&w_high, &total)
            };

            values[var.index()] = take_high;
            tested[var.index()] = true;
            cur = if take_high { high } else { low };
        }

        if cur != Ref::ONE {
            return Err(BddError::InconsistentState(format!(
                "walk ended at {} with {} parity",
                cur,
                Parity::of(cur.is_negated())
            )));
        }
        debug!("sampled {:?}", values);
        Ok(Assignment { values, tested })
    }

    /// Draws `count` independent assignments.
    pub fn sample_many<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<Assignment>> {
        (0..count).map(|_| self.sample(rng)).collect()
    }

    /// Satisfying assignments of the variables below `level` routed through `child`.
    fn weight(&self, child: Ref, level: usize) -> Result<BigUint> {
        let Some(count) = self.counts.count_edge(child) else {
            return Err(BddError::InconsistentState(format!("no path count for {}", child)));
        };
        let gap = self.bdd.level_of(child).index() - level - 1;
        Ok(count << gap)
    }
}

/// `num / den` as `f64`, exact to 53 bits even for huge operands.
fn ratio(num: &BigUint, den: &BigUint) -> f64 {
    let shift = den.bits().saturating_sub(53) as usize;
    let n = (num >> shift).to_f64().unwrap_or(0.0);
    let d = (den >> shift).to_f64().unwrap_or(1.0);
    n / d
}

/// Counts the paths of `root` and draws `count` samples in one go.
pub fn sample_function<R: Rng + ?Sized>(bdd: &Bdd, root: Ref, count: usize, rng: &mut R) -> Result<Vec<Assignment>> {
    let counts = PathCounter::new(bdd, root);
    Sampler::new(bdd, &counts)?.sample_many(count, rng)
}
