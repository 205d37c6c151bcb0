//! Expansion-path analysis for recursive specialization.
//!
//! When lookahead expansion keeps re-deriving the same rule shape (as it
//! does for self-embedding grammars like `B -> '(' B ')'`), the spine of
//! rules from the root to the cursor grows a repeating tail. Detecting the
//! longest repeated suffix of that spine identifies the innermost recurring
//! subtree, which the generator splits off as an independently solvable
//! sub-context instead of expanding forever.

use crate::grammar::RuleId;

/// The length of the longest suffix of `spine` that immediately repeats:
/// the largest `k` with `spine[m-2k..m-k] == spine[m-k..]`. Zero when no
/// suffix repeats.
#[must_use]
pub fn longest_repeated_suffix(spine: &[RuleId]) -> usize {
    let m = spine.len();
    for k in (1..=m / 2).rev() {
        if spine[m - 2 * k..m - k] == spine[m - k..] {
            return k;
        }
    }
    0
}

/// The spine depth at which to cut a node with a repeated suffix of length
/// `k`: the root of the innermost repetition.
#[must_use]
pub const fn cut_depth(spine_len: usize, k: usize) -> usize {
    spine_len - k
}
