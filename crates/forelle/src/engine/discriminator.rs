//! Discriminator construction and reuse.
//!
//! A discriminator is a synthetic non-terminal whose rules each encode one
//! possible continuation after a contested lookahead token: `D -> t s_1 |
//! t s_2 | ...`. Parsing `D` decides which continuation the input actually
//! takes, and the decision carries back to the hypothesis that owned the
//! continuation.
//!
//! This module holds the pieces the generator composes: gathering the
//! post-token suffix sequences out of a hypothesis node, and the two reuse
//! checks (exact-body and prefix) against the trie of already-synthesized
//! discriminator rules.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::engine::trie::{DiscriminatorRule, DiscriminatorTrie};
use crate::error::InvariantError;
use crate::grammar::{FirstFollow, Grammar, NonTerminal, RuleId, Symbol, Token};
use crate::node::{NodeArena, NodeId};

type RandomState = ahash::RandomState;

/// How a discriminator rule stands in for a real decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminatorMode {
    /// The rule consumes a prefix of the continuation; parsing resumes in
    /// the outer context afterwards.
    Prefix,
    /// The rule consumes the contested token and the full remainder of the
    /// continuation.
    PostToken,
}

/// One recorded usage of a discriminator rule: the real rule it stood in
/// for at some decision point, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscriminatorContext {
    pub original_rule: RuleId,
    pub mode: DiscriminatorMode,
}

/// One continuation gathered from a hypothesis node: the expanded variant
/// of the node that places the contested token on a leaf, the leaf index of
/// that token, and the symbols remaining after it.
#[derive(Debug, Clone)]
pub struct GatheredSuffix {
    pub variant: NodeId,
    pub token_pos: usize,
    pub suffix: Vec<Symbol>,
}

/// Compute the suffix sequences that remain immediately after `token` is
/// consumed from `node`'s cursor position, expanding through non-terminals
/// that can reach the token at their head.
///
/// Returns `None` when the token could "leak" past the node into its FOLLOW
/// set with no captured suffix (a nullable derivation exhausts the node
/// before the token), or when the expansion budget runs out. Either way the
/// caller must fall back to another strategy.
///
/// # Errors
///
/// Only on internal cursor inconsistencies.
pub fn gather_post_token_suffixes(
    grammar: &Grammar,
    sets: &FirstFollow,
    arena: &mut NodeArena,
    token: Token,
    node: NodeId,
    depth_budget: usize,
) -> Result<Option<Vec<GatheredSuffix>>, InvariantError> {
    let mut out = Vec::new();
    let complete = gather_into(grammar, sets, arena, token, node, depth_budget, &mut out)?;
    if !complete {
        return Ok(None);
    }
    // Distinct expansion routes can converge on the same variant.
    let mut seen = BTreeSet::new();
    out.retain(|g| seen.insert((g.variant, g.token_pos)));
    Ok(Some(out))
}

fn gather_into(
    grammar: &Grammar,
    sets: &FirstFollow,
    arena: &mut NodeArena,
    token: Token,
    node: NodeId,
    depth: usize,
    out: &mut Vec<GatheredSuffix>,
) -> Result<bool, InvariantError> {
    if depth == 0 {
        return Ok(false);
    }
    let pos = arena.cursor_position(node).ok_or(InvariantError::NoCursor)?;
    if pos >= arena.leaf_count(node) {
        // The node is exhausted but the token is still expected: it would be
        // matched by whatever follows this node, with no suffix to capture.
        return Ok(false);
    }
    let leaf = arena
        .leaf_at(node, pos)
        .ok_or(InvariantError::NoLeafAtCursor)?;
    match leaf {
        Symbol::Token(t) => {
            if t == token {
                let suffix = arena.leaf_symbols_from(node, pos + 1);
                out.push(GatheredSuffix {
                    variant: node,
                    token_pos: pos,
                    suffix,
                });
            }
            Ok(true)
        }
        Symbol::NonTerminal(n) => {
            let rest = arena.leaf_symbols_from(node, pos + 1);
            if sets.is_nullable(n) && rest.is_empty() {
                return Ok(false);
            }
            let rest_first = sets.first_of_sequence(&rest);
            for rule_id in grammar.rules_for(n).to_vec() {
                let rule = grammar.rule(rule_id);
                let head_first = sets.first_of_sequence(rule.symbols());
                let reachable = head_first.contains(&token)
                    || (sets.is_sequence_nullable(rule.symbols()) && rest_first.contains(&token));
                if !reachable {
                    continue;
                }
                let expanded = arena.expand_cursor_leaf(node, rule_id, grammar.rule(rule_id))?;
                if !gather_into(grammar, sets, arena, token, expanded, depth - 1, out)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

/// Find an existing discriminator whose rule bodies are exactly `bodies`.
#[must_use]
pub fn find_exact_discriminator(
    grammar: &Grammar,
    trie: &DiscriminatorTrie,
    bodies: &BTreeSet<Vec<Symbol>>,
) -> Option<NonTerminal> {
    let mut candidates: Option<BTreeSet<NonTerminal>> = None;
    for body in bodies {
        let owners: BTreeSet<NonTerminal> =
            trie.exact(body).iter().map(|r| r.symbol).collect();
        candidates = Some(match candidates {
            None => owners,
            Some(prev) => prev.intersection(&owners).copied().collect(),
        });
        if candidates.as_ref().is_some_and(BTreeSet::is_empty) {
            return None;
        }
    }
    candidates?
        .into_iter()
        .find(|disc| grammar.rules_for(*disc).len() == bodies.len())
}

/// A successful prefix-reuse lookup: an existing discriminator plus, for
/// each needed body, the discriminator rule covering its longest prefix.
#[derive(Debug)]
pub struct PrefixReuse {
    pub discriminator: NonTerminal,
    /// Indexed like the `bodies` argument: `(rule, prefix_len)`.
    pub assignments: Vec<(RuleId, usize)>,
}

/// Decide whether an existing discriminator can serve as a prefix
/// recognizer for the given continuation bodies.
///
/// The joint constraints: every assignment is a prefix of its body, the
/// longest available prefix per body is taken, the discriminator switches
/// on the same leading token, every rule of the discriminator is assigned
/// to at least one body, and the assignment must actually discriminate
/// (not every body mapping to one rule).
#[must_use]
pub fn find_prefix_discriminator(
    grammar: &Grammar,
    trie: &DiscriminatorTrie,
    bodies: &[Vec<Symbol>],
) -> Option<PrefixReuse> {
    // Per body, the longest matching rule per discriminator.
    let mut per_body: Vec<HashMap<NonTerminal, (RuleId, usize), RandomState>> = Vec::new();
    for body in bodies {
        let mut longest: HashMap<NonTerminal, (RuleId, usize), RandomState> = HashMap::default();
        for (len, DiscriminatorRule { symbol, rule }) in trie.with_prefix_values(body) {
            let entry = longest.entry(symbol).or_insert((rule, len));
            if len > entry.1 {
                *entry = (rule, len);
            }
        }
        per_body.push(longest);
    }

    let mut candidates: BTreeSet<NonTerminal> = per_body
        .first()
        .map(|m| m.keys().copied().collect())
        .unwrap_or_default();
    for longest in &per_body[1..] {
        candidates.retain(|d| longest.contains_key(d));
    }

    for disc in candidates {
        let assignments: Vec<(RuleId, usize)> =
            per_body.iter().map(|m| m[&disc]).collect();
        let used: BTreeSet<RuleId> = assignments.iter().map(|(r, _)| *r).collect();
        if used.len() < 2 {
            continue;
        }
        if grammar.rules_for(disc).iter().any(|r| !used.contains(r)) {
            continue;
        }
        return Some(PrefixReuse {
            discriminator: disc,
            assignments,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{nt, t};

    fn setup() -> (Grammar, FirstFollow) {
        let grammar = Grammar::builder()
            .rule("S", [nt("X")])
            .rule("S", [nt("Y")])
            .rule("X", [t("x"), t("z")])
            .rule("Y", [t("x"), t("w")])
            .start_symbol("S")
            .build()
            .unwrap();
        let sets = FirstFollow::compute(&grammar);
        (grammar, sets)
    }

    #[test]
    fn gathering_expands_to_the_token_and_captures_the_rest() {
        let (grammar, sets) = setup();
        let mut arena = NodeArena::new();
        let s = grammar.non_terminal("S").unwrap();
        let x_tok = grammar.token("x").unwrap();
        let via_x = grammar.rules_for(s)[0];
        let root = arena.rule_root(via_x, grammar.rule(via_x));

        let gathered = gather_post_token_suffixes(&grammar, &sets, &mut arena, x_tok, root, 16)
            .unwrap()
            .expect("no leak expected");
        assert_eq!(gathered.len(), 1);
        assert_eq!(gathered[0].token_pos, 0);
        assert_eq!(
            gathered[0].suffix,
            vec![Symbol::Token(grammar.token("z").unwrap())]
        );
        assert_eq!(arena.render(&grammar, gathered[0].variant), "S(X(. x z))");
    }

    #[test]
    fn gathering_fails_when_the_token_leaks_past_the_node() {
        let grammar = Grammar::builder()
            .rule("A", [nt("B"), t("x")])
            .rule("B", [])
            .rule("B", [t("x")])
            .start_symbol("A")
            .build()
            .unwrap();
        let sets = FirstFollow::compute(&grammar);
        let mut arena = NodeArena::new();
        let x = grammar.token("x").unwrap();

        // Node rooted at B itself: nullable with nothing after, so `x`
        // could belong to FOLLOW(B) instead of B.
        let b = grammar.non_terminal("B").unwrap();
        let b_rules = grammar.rules_for(b).to_vec();
        let a = grammar.non_terminal("A").unwrap();
        let a_rule = grammar.rules_for(a)[0];
        let root = arena.rule_root(a_rule, grammar.rule(a_rule));

        // From inside A the rest is non-empty, so gathering succeeds and
        // finds both routes to `x`.
        let ok = gather_post_token_suffixes(&grammar, &sets, &mut arena, x, root, 16)
            .unwrap()
            .expect("captured within A");
        assert_eq!(ok.len(), 2);

        // But a bare B node leaks.
        let empty_rule = b_rules
            .iter()
            .copied()
            .find(|r| grammar.rule(*r).is_empty())
            .unwrap();
        let trailing = arena.rule_root(empty_rule, grammar.rule(empty_rule));
        assert!(arena.is_fully_consumed(trailing));
        let leaked =
            gather_post_token_suffixes(&grammar, &sets, &mut arena, x, trailing, 16).unwrap();
        assert!(leaked.is_none());
    }

    #[test]
    fn exact_reuse_requires_the_full_body_set() {
        let (mut grammar, _) = setup();
        let mut trie = DiscriminatorTrie::new();
        let x = Symbol::Token(grammar.token("x").unwrap());
        let z = Symbol::Token(grammar.token("z").unwrap());
        let w = Symbol::Token(grammar.token("w").unwrap());

        let disc = grammar.new_discriminator();
        let body_a = vec![x, z];
        let body_b = vec![x, w];
        for body in [&body_a, &body_b] {
            let rule = grammar.push_rule(
                disc,
                body.iter().copied().collect(),
                crate::grammar::RuleInfo::default(),
            );
            trie.insert(body, DiscriminatorRule { symbol: disc, rule });
        }

        let full: BTreeSet<Vec<Symbol>> = BTreeSet::from([body_a.clone(), body_b.clone()]);
        assert_eq!(find_exact_discriminator(&grammar, &trie, &full), Some(disc));

        let partial: BTreeSet<Vec<Symbol>> = BTreeSet::from([body_a]);
        assert_eq!(find_exact_discriminator(&grammar, &trie, &partial), None);
    }

    #[test]
    fn prefix_reuse_applies_the_joint_constraints() {
        let (mut grammar, _) = setup();
        let mut trie = DiscriminatorTrie::new();
        let x = Symbol::Token(grammar.token("x").unwrap());
        let z = Symbol::Token(grammar.token("z").unwrap());
        let w = Symbol::Token(grammar.token("w").unwrap());

        let disc = grammar.new_discriminator();
        let mut rules = Vec::new();
        for body in [vec![x, z], vec![x, w]] {
            let rule = grammar.push_rule(
                disc,
                body.iter().copied().collect(),
                crate::grammar::RuleInfo::default(),
            );
            trie.insert(&body, DiscriminatorRule { symbol: disc, rule });
            rules.push(rule);
        }

        // Longer continuations sharing those prefixes reuse the
        // discriminator.
        let needed = [vec![x, z, w], vec![x, w, z]];
        let reuse = find_prefix_discriminator(&grammar, &trie, &needed).unwrap();
        assert_eq!(reuse.discriminator, disc);
        assert_eq!(reuse.assignments, vec![(rules[0], 2), (rules[1], 2)]);

        // Degenerate: both continuations map to the same rule.
        let degenerate = [vec![x, z, w], vec![x, z]];
        assert!(find_prefix_discriminator(&grammar, &trie, &degenerate).is_none());
    }
}
