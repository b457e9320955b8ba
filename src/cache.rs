//! Operation cache (the computed table).
//!
//! A direct-mapped array where each key hashes to exactly one slot, and a
//! collision simply overwrites the previous entry. The full key is stored
//! next to the value, so a lookup can never return a result computed for a
//! different operation. Dropping entries only costs recomputation.

use crate::reference::Ref;
use crate::utils::{mix, pairing3, MyHash};

/// Key of a memoized operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OpKey {
    /// Conjunction of two edges, stored with the smaller raw edge first.
    And(Ref, Ref),
}

impl OpKey {
    /// Builds the key for `f ∧ g`, canonicalizing the unordered pair.
    pub fn and(f: Ref, g: Ref) -> Self {
        if f.raw() <= g.raw() {
            OpKey::And(f, g)
        } else {
            OpKey::And(g, f)
        }
    }
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        match *self {
            OpKey::And(f, g) => mix(pairing3(1, f.raw() as u64, g.raw() as u64)),
        }
    }
}

/// A direct-mapped, size-bounded memo table.
pub struct OpCache<K, V> {
    entries: Vec<Option<(K, V)>>,
    bitmask: u64,
    hits: usize,
    misses: usize,
    faults: usize,
}

impl<K, V> OpCache<K, V> {
    /// Creates a new cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);

        let size = 1usize << bits;
        Self {
            entries: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: 0,
            misses: 0,
            faults: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Number of misses caused by a different key occupying the slot.
    pub fn faults(&self) -> usize {
        self.faults
    }

    /// Clears all entries. This is O(n).
    pub fn clear(&mut self) {
        self.entries.fill_with(|| None);
    }
}

impl<K, V> OpCache<K, V>
where
    K: MyHash + Eq,
    V: Copy,
{
    #[inline]
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    #[inline]
    pub fn get(&mut self, key: &K) -> Option<V> {
        let idx = self.index(key);
        match &self.entries[idx] {
            Some((k, v)) if k == key => {
                self.hits += 1;
                Some(*v)
            }
            Some(_) => {
                self.faults += 1;
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts a result, overwriting whatever occupied the slot.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Some((key, value));
    }
}
