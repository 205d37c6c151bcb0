//! # Decision Automaton
//!
//! The frozen output of generation: a closed map from contexts to actions,
//! rooted at one context per start symbol. The automaton owns the grammar
//! (including any discriminator rules synthesized into it) and the node and
//! context arenas the actions refer into, so ids stay interpretable for the
//! automaton's whole lifetime.

use hashbrown::HashMap;

use crate::engine::action::DecisionAction;
use crate::engine::context::{ContextArena, ContextId};
use crate::engine::discriminator::DiscriminatorContext;
use crate::grammar::{Grammar, NonTerminal, RuleId, StartSymbol};
use crate::node::NodeArena;

type RandomState = ahash::RandomState;

/// A complete, deterministic parsing automaton.
pub struct DecisionAutomaton {
    grammar: Grammar,
    nodes: NodeArena,
    contexts: ContextArena,
    actions: HashMap<ContextId, DecisionAction, RandomState>,
    roots: Vec<(StartSymbol, ContextId)>,
    discriminators: HashMap<RuleId, Vec<DiscriminatorContext>, RandomState>,
}

impl DecisionAutomaton {
    pub(crate) fn new(
        grammar: Grammar,
        nodes: NodeArena,
        contexts: ContextArena,
        actions: HashMap<ContextId, DecisionAction, RandomState>,
        roots: Vec<(StartSymbol, ContextId)>,
        discriminators: HashMap<RuleId, Vec<DiscriminatorContext>, RandomState>,
    ) -> Self {
        Self {
            grammar,
            nodes,
            contexts,
            actions,
            roots,
            discriminators,
        }
    }

    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    #[must_use]
    pub fn contexts(&self) -> &ContextArena {
        &self.contexts
    }

    /// The action of a context, if the context is part of the automaton.
    #[must_use]
    pub fn action(&self, ctx: ContextId) -> Option<&DecisionAction> {
        self.actions.get(&ctx)
    }

    /// Number of contexts with an action.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The root context of a start symbol (the user's non-terminal, not the
    /// synthetic marker).
    #[must_use]
    pub fn start_context(&self, symbol: NonTerminal) -> Option<ContextId> {
        self.roots
            .iter()
            .find(|(start, _)| start.symbol == symbol)
            .map(|(_, ctx)| *ctx)
    }

    #[must_use]
    pub fn roots(&self) -> &[(StartSymbol, ContextId)] {
        &self.roots
    }

    /// The recorded usages of a synthesized discriminator rule: which real
    /// rule it stood in for and in which mode, one entry per decision point
    /// that relied on it.
    #[must_use]
    pub fn discriminator_usages(&self, rule: RuleId) -> &[DiscriminatorContext] {
        self.discriminators.get(&rule).map_or(&[], Vec::as_slice)
    }
}

impl std::fmt::Debug for DecisionAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionAutomaton")
            .field("contexts", &self.actions.len())
            .field("starts", &self.roots.len())
            .field("discriminator_rules", &self.discriminators.len())
            .finish()
    }
}
