//! Searches the space of stage shift configurations for the smallest trie.
//!
//! Every combination of `stages - 1` shifts in `[min_shift..=max_shift]`
//! is a candidate. Candidates are pure functions of the read-only input
//! array, so they fan out over the rayon pool and reduce to a single
//! winner; the `(total_size, ordinal)` key is totally ordered, which makes
//! the winner independent of scheduling.

use rayon::prelude::*;

use crate::trie::{build_trie, Trie};

/// Decomposes a candidate ordinal into its shift tuple: mixed-radix base
/// `delta` digits, rightmost digit varying fastest.
fn shifts_for_ordinal(ordinal: usize, delta: usize, min_shift: u32, stages: usize) -> Vec<u32> {
    let mut shifts = vec![0; stages - 1];
    let mut rest = ordinal;
    for shift in shifts.iter_mut().rev() {
        *shift = min_shift + (rest % delta) as u32;
        rest /= delta;
    }
    shifts
}

/// Builds every candidate trie concurrently and keeps the smallest, ties
/// going to the earliest shift tuple.
pub fn build_best_trie(values: &[u32], min_shift: u32, max_shift: u32, stages: usize) -> Trie {
    assert!(stages >= 2, "a trie needs at least a root and a leaf stage");
    assert!(
        (1..=max_shift).contains(&min_shift),
        "invalid shift bounds {min_shift}..={max_shift}"
    );
    let delta = (max_shift - min_shift + 1) as usize;
    let candidates = delta.pow(stages as u32 - 1);
    let (trie, _ordinal) = (0..candidates)
        .into_par_iter()
        .map(|ordinal| {
            let shifts = shifts_for_ordinal(ordinal, delta, min_shift, stages);
            (build_trie(values, &shifts), ordinal)
        })
        .min_by_key(|(trie, ordinal)| (trie.total_size, *ordinal))
        .expect("shift bounds admit at least one candidate");
    trie
}
