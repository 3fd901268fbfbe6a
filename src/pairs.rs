//! Adjacent-pair counting and the single-pair merge pass.
//!
//! Both training and encoding are built from the two primitives here: a
//! pure histogram of adjacent token pairs, and one left-to-right rewrite of
//! a chosen pair into its composite id.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::table::{Pair, TokenId};

/// Sequence length below which counting stays on a single thread.
const PARALLEL_COUNT_THRESHOLD: usize = 64 * 1024;

/// Maps raw bytes onto their identity token ids.
#[must_use]
pub fn byte_tokens(data: &[u8]) -> Vec<TokenId> {
    data.iter().map(|&b| TokenId::from(b)).collect()
}

/// Counts adjacent, possibly overlapping pair occurrences in `sequence`.
///
/// Every index `i < len - 1` contributes exactly one count to the pair
/// `(sequence[i], sequence[i + 1])`. Counting is associative, so long
/// sequences are sharded across threads and the per-shard histograms merged
/// by summation; selection of a merge from the result stays serial.
#[must_use]
pub fn count_pairs(sequence: &[TokenId]) -> FxHashMap<Pair, usize> {
    if sequence.len() < 2 {
        return FxHashMap::default();
    }
    if sequence.len() < PARALLEL_COUNT_THRESHOLD {
        return count_pairs_serial(sequence);
    }
    (0..sequence.len() - 1)
        .into_par_iter()
        .fold(FxHashMap::default, |mut local: FxHashMap<Pair, usize>, i| {
            *local.entry((sequence[i], sequence[i + 1])).or_insert(0) += 1;
            local
        })
        .reduce(FxHashMap::default, |mut acc, local| {
            for (pair, count) in local {
                *acc.entry(pair).or_insert(0) += count;
            }
            acc
        })
}

fn count_pairs_serial(sequence: &[TokenId]) -> FxHashMap<Pair, usize> {
    let mut counts = FxHashMap::default();
    let mut prev = sequence[0];
    for &current in &sequence[1..] {
        *counts.entry((prev, current)).or_insert(0) += 1;
        prev = current;
    }
    counts
}

/// Replaces every non-overlapping occurrence of `pair` with `new_id`.
///
/// One left-to-right scan with separate read and write cursors; a freshly
/// written `new_id` is never reconsidered as the left element of the next
/// match, so `(a, a)` in `aaa` merges once, not twice. Returns the number
/// of replacements made.
pub fn merge_pass(sequence: &mut Vec<TokenId>, pair: Pair, new_id: TokenId) -> usize {
    if sequence.len() < 2 {
        return 0;
    }
    let original_len = sequence.len();
    let mut read = 0usize;
    let mut write = 0usize;
    let mut merged = 0usize;
    while read < original_len {
        if read + 1 < original_len && sequence[read] == pair.0 && sequence[read + 1] == pair.1 {
            sequence[write] = new_id;
            write += 1;
            read += 2;
            merged += 1;
        } else {
            if write != read {
                sequence[write] = sequence[read];
            }
            write += 1;
            read += 1;
        }
    }
    sequence.truncate(write);
    merged
}
