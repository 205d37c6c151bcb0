//! Symbol-sequence trie indexing discriminator rules.
//!
//! Every synthesized discriminator rule is registered here under its full
//! body. Reuse queries come in two modes: exact (find the rules whose body
//! is exactly a sequence) and prefix (find the rules whose body is a prefix
//! of a sequence), matching the two ways an existing discriminator can stand
//! in for a new decision.

use std::collections::BTreeMap;

use crate::grammar::{NonTerminal, RuleId, Symbol};

/// A registered discriminator rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscriminatorRule {
    /// The discriminator that owns the rule.
    pub symbol: NonTerminal,
    /// The rule id within the grammar.
    pub rule: RuleId,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<Symbol, TrieNode>,
    values: Vec<DiscriminatorRule>,
}

/// Prefix trie from rule bodies to the discriminator rules with that body.
#[derive(Debug, Default)]
pub struct DiscriminatorTrie {
    root: TrieNode,
}

impl DiscriminatorTrie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a discriminator rule under its body.
    pub fn insert(&mut self, body: &[Symbol], value: DiscriminatorRule) {
        let mut node = &mut self.root;
        for symbol in body {
            node = node.children.entry(*symbol).or_default();
        }
        node.values.push(value);
    }

    /// The rules whose body is exactly `body`.
    #[must_use]
    pub fn exact(&self, body: &[Symbol]) -> &[DiscriminatorRule] {
        let mut node = &self.root;
        for symbol in body {
            match node.children.get(symbol) {
                Some(next) => node = next,
                None => return &[],
            }
        }
        &node.values
    }

    /// The rules whose body is `body` or one of its non-empty prefixes,
    /// paired with the prefix length, shortest first.
    #[must_use]
    pub fn with_prefix_values(&self, body: &[Symbol]) -> Vec<(usize, DiscriminatorRule)> {
        let mut out = Vec::new();
        let mut node = &self.root;
        for (depth, symbol) in body.iter().enumerate() {
            match node.children.get(symbol) {
                Some(next) => node = next,
                None => return out,
            }
            for value in &node.values {
                out.push((depth + 1, *value));
            }
        }
        out
    }
}
