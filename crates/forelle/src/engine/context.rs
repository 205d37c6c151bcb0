//! Parsing contexts.
//!
//! A context is the unit of memoization of the generation engine: the set of
//! parse hypotheses still alive at a decision point, plus an optional
//! lookahead restriction imposed by an enclosing token switch. Contexts are
//! interned; two contexts with the same node set and the same restriction
//! are the same context, which is what ties the recursion off on cyclic
//! grammars.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::grammar::Token;
use crate::node::NodeId;

type RandomState = ahash::RandomState;

/// Identifies an interned context within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u32);

impl ContextId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The identity of a context: its hypothesis nodes and its lookahead
/// restriction. `None` means any continuation token is possible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextData {
    nodes: BTreeSet<NodeId>,
    lookahead: Option<BTreeSet<Token>>,
}

impl ContextData {
    #[must_use]
    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    #[must_use]
    pub fn lookahead(&self) -> Option<&BTreeSet<Token>> {
        self.lookahead.as_ref()
    }

    /// Whether a token is admitted by the lookahead restriction.
    #[must_use]
    pub fn admits(&self, token: Token) -> bool {
        self.lookahead.as_ref().is_none_or(|set| set.contains(&token))
    }
}

/// Interning arena for parsing contexts.
pub struct ContextArena {
    contexts: Vec<ContextData>,
    index: HashMap<ContextData, ContextId, RandomState>,
}

impl ContextArena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            contexts: Vec::new(),
            index: HashMap::default(),
        }
    }

    /// Intern a context. Empty node sets are representable but the engine
    /// never creates them.
    pub fn intern(
        &mut self,
        nodes: BTreeSet<NodeId>,
        lookahead: Option<BTreeSet<Token>>,
    ) -> ContextId {
        let data = ContextData { nodes, lookahead };
        if let Some(id) = self.index.get(&data) {
            return *id;
        }
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(data.clone());
        self.index.insert(data, id);
        id
    }

    #[must_use]
    pub fn get(&self, id: ContextId) -> &ContextData {
        &self.contexts[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl Default for ContextArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextArena")
            .field("contexts", &self.contexts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{nt, t, Grammar};
    use crate::node::NodeArena;

    #[test]
    fn interning_is_identity_on_nodes_and_lookahead() {
        let grammar = Grammar::builder()
            .rule("A", [t("x")])
            .rule("A", [nt("B")])
            .rule("B", [t("y")])
            .start_symbol("A")
            .build()
            .unwrap();
        let mut nodes = NodeArena::new();
        let mut contexts = ContextArena::new();

        let roots: BTreeSet<NodeId> = grammar
            .rules_for(grammar.non_terminal("A").unwrap())
            .iter()
            .map(|id| nodes.rule_root(*id, grammar.rule(*id)))
            .collect();

        let a = contexts.intern(roots.clone(), None);
        let b = contexts.intern(roots.clone(), None);
        assert_eq!(a, b);

        let x = grammar.token("x").unwrap();
        let restricted = contexts.intern(roots, Some(BTreeSet::from([x])));
        assert_ne!(a, restricted);
        assert!(contexts.get(restricted).admits(x));
        assert!(!contexts.get(restricted).admits(grammar.token("y").unwrap()));
        assert!(contexts.get(a).admits(x));
    }
}
