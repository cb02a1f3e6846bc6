//! Brightest-first triplet enumeration.
//!
//! Yields index triples (i, j, k), i < j < k, ordered by increasing index
//! sum. Band lists are sorted brightest-first, so the strongest — most
//! reliable — bands are tried before dim ones and a triplet budget cuts
//! off the noisy tail rather than the signal.
//!
//! Implementation: min-heap keyed by index sum, with a set for dedup.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// Iterator over triplets of `0..n` in order of increasing index sum.
pub struct BreadthFirstTriplets {
    n: usize,
    heap: BinaryHeap<Reverse<(usize, [usize; 3])>>,
    seen: HashSet<[usize; 3]>,
}

impl BreadthFirstTriplets {
    pub fn new(n: usize) -> Self {
        let mut heap = BinaryHeap::new();
        let mut seen = HashSet::new();
        if n >= 3 {
            let initial = [0, 1, 2];
            seen.insert(initial);
            heap.push(Reverse((3, initial)));
        }
        Self { n, heap, seen }
    }

    /// Total number of triplets over `n` items: C(n, 3).
    pub fn total(n: usize) -> usize {
        if n < 3 {
            0
        } else {
            n * (n - 1) * (n - 2) / 6
        }
    }
}

impl Iterator for BreadthFirstTriplets {
    type Item = [usize; 3];

    fn next(&mut self) -> Option<[usize; 3]> {
        let Reverse((_, combo)) = self.heap.pop()?;

        // Successors: bump each position while keeping i < j < k
        for position in 0..3 {
            let bumped = combo[position] + 1;
            let upper = if position < 2 {
                combo[position + 1]
            } else {
                self.n
            };
            if bumped < upper {
                let mut next = combo;
                next[position] = bumped;
                if self.seen.insert(next) {
                    let sum = next[0] + next[1] + next[2];
                    self.heap.push(Reverse((sum, next)));
                }
            }
        }

        Some(combo)
    }
}
