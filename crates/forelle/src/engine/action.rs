//! Decision actions.
//!
//! The action assigned to a solved context tells a table-driven parser what
//! to do when it reaches that context. Actions reference other contexts by
//! id; the generator guarantees that every referenced context has an action
//! of its own before an automaton is returned.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::engine::context::ContextId;
use crate::grammar::Token;
use crate::node::NodeId;

/// What a parser does upon reaching a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionAction {
    /// The parse of this context's symbol is complete. More than one node
    /// means the grammar is ambiguous at this point; the resolver flags such
    /// actions as errors when they are reachable.
    Reduce(SmallVec<[NodeId; 2]>),

    /// Consume one token of input and continue.
    EatToken { token: Token, next: ContextId },

    /// Branch on the next token of input without consuming it.
    TokenSwitch { branches: BTreeMap<Token, ContextId> },

    /// Recursively parse a sub-context, then continue with `next`.
    ParseSubContext { sub: ContextId, next: ContextId },

    /// Recursively parse a sub-context, then branch on which hypothesis the
    /// sub-parse produced. `branches` pairs each hypothesis node with the
    /// context to continue in. Unresolved until the resolver proves the
    /// branch choice is well-defined for every possible sub-parse outcome.
    SubContextSwitch {
        sub: ContextId,
        branches: Vec<(NodeId, ContextId)>,
        resolved: bool,
    },

    /// Continue in a specialized copy of this context whose nodes have been
    /// expanded far enough to make progress.
    Delegate { next: ContextId },
}

impl DecisionAction {
    /// The contexts this action can transfer control to.
    #[must_use]
    pub fn successors(&self) -> Vec<ContextId> {
        match self {
            Self::Reduce(_) => Vec::new(),
            Self::EatToken { next, .. } | Self::Delegate { next } => vec![*next],
            Self::TokenSwitch { branches } => branches.values().copied().collect(),
            Self::ParseSubContext { sub, next } => vec![*sub, *next],
            Self::SubContextSwitch { sub, branches, .. } => {
                let mut out = vec![*sub];
                out.extend(branches.iter().map(|(_, ctx)| *ctx));
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::ContextArena;
    use std::collections::BTreeSet;

    #[test]
    fn successors_cover_every_referenced_context() {
        let mut contexts = ContextArena::new();
        let a = contexts.intern(BTreeSet::new(), None);
        let b = contexts.intern(BTreeSet::new(), Some(BTreeSet::new()));

        assert!(DecisionAction::Reduce(SmallVec::new()).successors().is_empty());
        assert_eq!(DecisionAction::Delegate { next: a }.successors(), vec![a]);

        let parse = DecisionAction::ParseSubContext { sub: a, next: b };
        assert_eq!(parse.successors(), vec![a, b]);

        let switch = DecisionAction::SubContextSwitch {
            sub: a,
            branches: Vec::new(),
            resolved: false,
        };
        assert_eq!(switch.successors(), vec![a]);
    }
}
