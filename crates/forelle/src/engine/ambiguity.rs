//! Ambiguity resolution hooks.
//!
//! When a context reduces to more than one completed parse, the generator
//! consults an [`AmbiguityResolver`] before giving up. A resolver can pick a
//! preferred parse (typically by ranking the competing root rules); if it
//! declines, the multi-parse reduce survives and is reported as an error if
//! the automaton can actually reach it.

use hashbrown::HashMap;

use crate::grammar::{Grammar, RuleId};
use crate::node::{NodeArena, NodeData, NodeId};

type RandomState = ahash::RandomState;

/// Chooses among competing completed parses of the same input region.
pub trait AmbiguityResolver {
    /// Return the preferred candidate, or `None` to leave the ambiguity
    /// standing.
    fn resolve(
        &self,
        grammar: &Grammar,
        arena: &NodeArena,
        candidates: &[NodeId],
    ) -> Option<NodeId>;
}

/// Never resolves anything; every reachable ambiguity becomes an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolution;

impl AmbiguityResolver for NoResolution {
    fn resolve(&self, _: &Grammar, _: &NodeArena, _: &[NodeId]) -> Option<NodeId> {
        None
    }
}

/// Resolves by root rule rank: the candidate whose root rule has the lowest
/// rank wins. Candidates with unranked root rules, or ties, stay ambiguous.
#[derive(Debug, Default)]
pub struct PreferredRules {
    ranks: HashMap<RuleId, usize, RandomState>,
}

impl PreferredRules {
    #[must_use]
    pub fn new(ordered: impl IntoIterator<Item = RuleId>) -> Self {
        Self {
            ranks: ordered
                .into_iter()
                .enumerate()
                .map(|(rank, rule)| (rule, rank))
                .collect(),
        }
    }
}

impl AmbiguityResolver for PreferredRules {
    fn resolve(
        &self,
        _grammar: &Grammar,
        arena: &NodeArena,
        candidates: &[NodeId],
    ) -> Option<NodeId> {
        let mut best: Option<(usize, NodeId)> = None;
        let mut tied = false;
        for candidate in candidates {
            let NodeData::Parent { rule, .. } = arena.get(*candidate) else {
                return None;
            };
            let rank = *self.ranks.get(rule)?;
            match best {
                Some((b, _)) if rank == b => tied = true,
                Some((b, _)) if rank < b => {
                    best = Some((rank, *candidate));
                    tied = false;
                }
                None => best = Some((rank, *candidate)),
                Some(_) => {}
            }
        }
        if tied {
            return None;
        }
        best.map(|(_, node)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{nt, t, Grammar};

    #[test]
    fn preferred_rules_pick_the_lowest_rank() {
        let grammar = Grammar::builder()
            .rule("S", [nt("A")])
            .rule("S", [nt("B")])
            .rule("A", [t("x")])
            .rule("B", [t("x")])
            .start_symbol("S")
            .build()
            .unwrap();
        let mut arena = NodeArena::new();
        let s = grammar.non_terminal("S").unwrap();
        let rules = grammar.rules_for(s).to_vec();
        let via_a = arena.rule_root(rules[0], grammar.rule(rules[0]));
        let via_b = arena.rule_root(rules[1], grammar.rule(rules[1]));

        let resolver = PreferredRules::new([rules[1], rules[0]]);
        assert_eq!(
            resolver.resolve(&grammar, &arena, &[via_a, via_b]),
            Some(via_b)
        );

        let none = NoResolution;
        assert_eq!(none.resolve(&grammar, &arena, &[via_a, via_b]), None);

        // Unranked candidate keeps the ambiguity.
        let partial = PreferredRules::new([rules[0]]);
        assert_eq!(partial.resolve(&grammar, &arena, &[via_a, via_b]), None);
    }
}
