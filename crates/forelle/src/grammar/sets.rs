//! Nullable, FIRST, and FOLLOW set computation.
//!
//! Sets are computed once per grammar with the usual fixpoint iterations and
//! are stored as ordered token sets, so every observable iteration order is
//! stable across runs. Synthesized discriminators are registered after the
//! fact through [`FirstFollow::register_discriminator`] rather than by
//! recomputation, because discriminators never occur in any rule body and
//! would otherwise receive an empty FOLLOW set.

use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};

use crate::grammar::builder::Grammar;
use crate::grammar::symbol::{NonTerminal, Symbol, Token};

type RandomState = ahash::RandomState;

/// Precomputed nullable/FIRST/FOLLOW information for a grammar.
#[derive(Debug)]
pub struct FirstFollow {
    nullable: HashSet<NonTerminal, RandomState>,
    first: HashMap<NonTerminal, BTreeSet<Token>, RandomState>,
    follow: HashMap<NonTerminal, BTreeSet<Token>, RandomState>,
    empty: BTreeSet<Token>,
}

impl FirstFollow {
    /// Compute all three sets for a grammar.
    #[must_use]
    pub fn compute(grammar: &Grammar) -> Self {
        let mut nullable: HashSet<NonTerminal, RandomState> = HashSet::default();
        loop {
            let mut changed = false;
            for (_, rule) in grammar.rules() {
                if !nullable.contains(&rule.produced())
                    && rule.symbols().iter().all(|s| match s {
                        Symbol::Token(_) => false,
                        Symbol::NonTerminal(n) => nullable.contains(n),
                    })
                {
                    nullable.insert(rule.produced());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut first: HashMap<NonTerminal, BTreeSet<Token>, RandomState> = HashMap::default();
        for nt in grammar.non_terminals() {
            first.insert(*nt, BTreeSet::new());
        }
        loop {
            let mut changed = false;
            for (_, rule) in grammar.rules() {
                let mut additions = BTreeSet::new();
                for sym in rule.symbols() {
                    match sym {
                        Symbol::Token(t) => {
                            additions.insert(*t);
                            break;
                        }
                        Symbol::NonTerminal(n) => {
                            if let Some(set) = first.get(n) {
                                additions.extend(set.iter().copied());
                            }
                            if !nullable.contains(n) {
                                break;
                            }
                        }
                    }
                }
                let target = first.entry(rule.produced()).or_default();
                for t in additions {
                    changed |= target.insert(t);
                }
            }
            if !changed {
                break;
            }
        }

        let mut follow: HashMap<NonTerminal, BTreeSet<Token>, RandomState> = HashMap::default();
        for nt in grammar.non_terminals() {
            follow.insert(*nt, BTreeSet::new());
        }
        loop {
            let mut changed = false;
            for (_, rule) in grammar.rules() {
                let symbols = rule.symbols();
                for (i, sym) in symbols.iter().enumerate() {
                    let Symbol::NonTerminal(n) = sym else {
                        continue;
                    };
                    // Tokens derivable right after this occurrence.
                    let mut additions = BTreeSet::new();
                    let mut tail_nullable = true;
                    for rest in &symbols[i + 1..] {
                        match rest {
                            Symbol::Token(t) => {
                                additions.insert(*t);
                                tail_nullable = false;
                                break;
                            }
                            Symbol::NonTerminal(m) => {
                                if let Some(set) = first.get(m) {
                                    additions.extend(set.iter().copied());
                                }
                                if !nullable.contains(m) {
                                    tail_nullable = false;
                                    break;
                                }
                            }
                        }
                    }
                    if tail_nullable {
                        if let Some(set) = follow.get(&rule.produced()) {
                            additions.extend(set.iter().copied());
                        }
                    }
                    let target = follow.entry(*n).or_default();
                    for t in additions {
                        changed |= target.insert(t);
                    }
                }
            }
            if !changed {
                break;
            }
        }

        Self {
            nullable,
            first,
            follow,
            empty: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn is_nullable(&self, nt: NonTerminal) -> bool {
        self.nullable.contains(&nt)
    }

    /// Whether a symbol sequence can derive the empty string.
    #[must_use]
    pub fn is_sequence_nullable(&self, symbols: &[Symbol]) -> bool {
        symbols.iter().all(|s| match s {
            Symbol::Token(_) => false,
            Symbol::NonTerminal(n) => self.is_nullable(*n),
        })
    }

    #[must_use]
    pub fn first(&self, nt: NonTerminal) -> &BTreeSet<Token> {
        self.first.get(&nt).unwrap_or(&self.empty)
    }

    /// FIRST of a symbol sequence.
    #[must_use]
    pub fn first_of_sequence(&self, symbols: &[Symbol]) -> BTreeSet<Token> {
        let mut out = BTreeSet::new();
        for sym in symbols {
            match sym {
                Symbol::Token(t) => {
                    out.insert(*t);
                    break;
                }
                Symbol::NonTerminal(n) => {
                    out.extend(self.first(*n).iter().copied());
                    if !self.is_nullable(*n) {
                        break;
                    }
                }
            }
        }
        out
    }

    #[must_use]
    pub fn follow(&self, nt: NonTerminal) -> &BTreeSet<Token> {
        self.follow.get(&nt).unwrap_or(&self.empty)
    }

    /// Record the sets of a freshly synthesized discriminator.
    ///
    /// Discriminator rules always start with the switched token, so the
    /// discriminator is never nullable and its FIRST set is that singleton.
    /// Its FOLLOW set cannot be derived from rule occurrences (there are
    /// none) and is supplied by the synthesizer.
    pub(crate) fn register_discriminator(
        &mut self,
        disc: NonTerminal,
        token: Token,
        follow: BTreeSet<Token>,
    ) {
        let mut first = BTreeSet::new();
        first.insert(token);
        self.first.insert(disc, first);
        self.follow.insert(disc, follow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::builder::{nt, t};

    fn tiered() -> Grammar {
        Grammar::builder()
            .rule("E", [nt("T")])
            .rule("E", [nt("T"), t("+"), nt("E")])
            .rule("T", [t("Id")])
            .start_symbol("E")
            .build()
            .unwrap()
    }

    #[test]
    fn first_sets_of_tiered_grammar() {
        let grammar = tiered();
        let sets = FirstFollow::compute(&grammar);
        let e = grammar.non_terminal("E").unwrap();
        let t_sym = grammar.non_terminal("T").unwrap();
        let id = grammar.token("Id").unwrap();

        assert!(!sets.is_nullable(e));
        assert_eq!(sets.first(e).len(), 1);
        assert!(sets.first(e).contains(&id));
        assert!(sets.first(t_sym).contains(&id));
    }

    #[test]
    fn follow_includes_end_marker_and_tail_tokens() {
        let grammar = tiered();
        let sets = FirstFollow::compute(&grammar);
        let e = grammar.non_terminal("E").unwrap();
        let t_sym = grammar.non_terminal("T").unwrap();
        let plus = grammar.token("+").unwrap();
        let end = grammar.starts()[0].end;

        assert!(sets.follow(e).contains(&end));
        assert!(sets.follow(t_sym).contains(&plus));
        assert!(sets.follow(t_sym).contains(&end));
    }

    #[test]
    fn nullable_propagates_through_sequences() {
        let grammar = Grammar::builder()
            .rule("A", [nt("B"), nt("C")])
            .rule("B", [])
            .rule("B", [t("x")])
            .rule("C", [])
            .start_symbol("A")
            .build()
            .unwrap();
        let sets = FirstFollow::compute(&grammar);
        let a = grammar.non_terminal("A").unwrap();
        let c = grammar.non_terminal("C").unwrap();
        let x = grammar.token("x").unwrap();

        assert!(sets.is_nullable(a));
        assert!(sets.is_nullable(c));
        assert!(sets.first(a).contains(&x));
        assert!(sets.first(c).is_empty());
    }

    #[test]
    fn first_of_sequence_skips_nullable_heads() {
        let grammar = Grammar::builder()
            .rule("A", [nt("B"), t(";")])
            .rule("B", [])
            .rule("B", [t("x")])
            .start_symbol("A")
            .build()
            .unwrap();
        let sets = FirstFollow::compute(&grammar);
        let (_, rule) = grammar.rules().next().unwrap();
        let firsts = sets.first_of_sequence(rule.symbols());

        assert!(firsts.contains(&grammar.token("x").unwrap()));
        assert!(firsts.contains(&grammar.token(";").unwrap()));
    }
}
