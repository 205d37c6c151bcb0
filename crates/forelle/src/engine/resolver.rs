//! Final linking pass over unresolved sub-context switches.
//!
//! The generator defers the dispatch table of a sub-context switch until
//! the whole automaton exists, because whether two sub-parse outcomes can
//! be told apart depends on decisions made elsewhere. This pass walks the
//! automaton breadth-first from the start contexts, computes for every
//! reachable context the **differentiable sets** of its eventual parse
//! outcomes, and proves each switch's branch choice well-defined. It also
//! reports reachable multi-parse reductions (ambiguities the resolver
//! declined to settle) and any context an action still references without
//! having been solved.

use std::collections::{BTreeSet, VecDeque};

use hashbrown::{HashMap, HashSet};

use crate::engine::action::DecisionAction;
use crate::engine::context::{ContextArena, ContextId};
use crate::grammar::{Grammar, StartSymbol};
use crate::node::{NodeArena, NodeId};

type RandomState = ahash::RandomState;

/// Resolve every reachable unresolved switch in place.
///
/// Returns the diagnostics collected (empty on success) and the set of
/// contexts reachable from the start contexts, which the caller uses to
/// prune the automaton.
pub(crate) fn link_switches(
    grammar: &Grammar,
    nodes: &NodeArena,
    contexts: &ContextArena,
    actions: &mut HashMap<ContextId, DecisionAction, RandomState>,
    roots: &[(StartSymbol, ContextId)],
) -> (BTreeSet<String>, HashSet<ContextId, RandomState>) {
    let mut errors = BTreeSet::new();
    let mut reachable: HashSet<ContextId, RandomState> = HashSet::default();
    let mut queue: VecDeque<ContextId> = VecDeque::new();
    for (_, root) in roots {
        if reachable.insert(*root) {
            queue.push_back(*root);
        }
    }

    let mut differ = Differentiator {
        contexts,
        actions,
        memo: HashMap::default(),
        in_progress: HashSet::default(),
    };
    let mut resolutions: Vec<ContextId> = Vec::new();
    let mut order: Vec<ContextId> = Vec::new();

    while let Some(ctx) = queue.pop_front() {
        order.push(ctx);
        let Some(action) = differ.actions.get(&ctx) else {
            errors.insert(render(grammar, nodes, contexts, ctx, "decision point left unsolved"));
            continue;
        };
        for successor in action.successors() {
            if reachable.insert(successor) {
                queue.push_back(successor);
            }
        }
    }

    for ctx in order {
        match differ.actions.get(&ctx) {
            Some(DecisionAction::Reduce(candidates)) if candidates.len() > 1 => {
                errors.insert(render(
                    grammar,
                    nodes,
                    contexts,
                    ctx,
                    "ambiguous parses at decision point",
                ));
            }
            Some(DecisionAction::SubContextSwitch {
                sub,
                branches,
                resolved: false,
            }) => {
                let sub = *sub;
                let branches = branches.clone();
                let mut well_defined = true;
                for outcome_set in differ.sets(sub) {
                    let mut targets: BTreeSet<ContextId> = BTreeSet::new();
                    for (hypothesis, next) in &branches {
                        let matched = outcome_set
                            .iter()
                            .any(|o| nodes.derives_from(grammar, *o, *hypothesis));
                        if matched {
                            targets.insert(*next);
                        }
                    }
                    if targets.len() != 1 {
                        well_defined = false;
                        errors.insert(render(
                            grammar,
                            nodes,
                            contexts,
                            sub,
                            "sub-context outcomes cannot be differentiated",
                        ));
                        break;
                    }
                }
                if well_defined {
                    resolutions.push(ctx);
                }
            }
            _ => {}
        }
    }

    for ctx in resolutions {
        if let Some(DecisionAction::SubContextSwitch { resolved, .. }) = actions.get_mut(&ctx) {
            *resolved = true;
        }
    }

    (errors, reachable)
}

fn render(
    grammar: &Grammar,
    nodes: &NodeArena,
    contexts: &ContextArena,
    ctx: ContextId,
    what: &str,
) -> String {
    let mut lines: Vec<String> = contexts
        .get(ctx)
        .nodes()
        .iter()
        .map(|n| nodes.render(grammar, *n))
        .collect();
    lines.sort();
    format!("{what}:\n  {}", lines.join("\n  "))
}

/// Computes, per context, the finest partition of eventual parse outcomes
/// that downstream parsing can distinguish.
struct Differentiator<'a> {
    contexts: &'a ContextArena,
    actions: &'a HashMap<ContextId, DecisionAction, RandomState>,
    memo: HashMap<ContextId, Vec<BTreeSet<NodeId>>, RandomState>,
    in_progress: HashSet<ContextId, RandomState>,
}

impl Differentiator<'_> {
    fn sets(&mut self, ctx: ContextId) -> Vec<BTreeSet<NodeId>> {
        if let Some(memoized) = self.memo.get(&ctx) {
            return memoized.clone();
        }
        if !self.in_progress.insert(ctx) {
            // Recursive reference: recursion cannot distinguish less than
            // the base case, so treat it as maximally differentiated.
            return self
                .contexts
                .get(ctx)
                .nodes()
                .iter()
                .map(|n| BTreeSet::from([*n]))
                .collect();
        }

        let result = match self.actions.get(&ctx) {
            None => self
                .contexts
                .get(ctx)
                .nodes()
                .iter()
                .map(|n| BTreeSet::from([*n]))
                .collect(),
            Some(DecisionAction::Reduce(candidates)) => {
                // A multi-parse reduce caps differentiation at the whole
                // ambiguous group.
                vec![candidates.iter().copied().collect()]
            }
            Some(
                DecisionAction::EatToken { next, .. } | DecisionAction::Delegate { next },
            ) => self.sets(*next),
            Some(DecisionAction::ParseSubContext { next, .. }) => self.sets(*next),
            Some(DecisionAction::TokenSwitch { branches }) => {
                let successors: Vec<ContextId> = branches.values().copied().collect();
                self.merged(&successors)
            }
            Some(DecisionAction::SubContextSwitch { branches, .. }) => {
                let successors: Vec<ContextId> = branches.iter().map(|(_, c)| *c).collect();
                self.merged(&successors)
            }
        };

        self.in_progress.remove(&ctx);
        self.memo.insert(ctx, result.clone());
        result
    }

    /// Union of the successors' differentiable sets, with subsumed subsets
    /// removed so ambiguity in one branch caps differentiation overall.
    fn merged(&mut self, successors: &[ContextId]) -> Vec<BTreeSet<NodeId>> {
        let mut all: Vec<BTreeSet<NodeId>> = Vec::new();
        for successor in successors {
            for set in self.sets(*successor) {
                if !all.contains(&set) {
                    all.push(set);
                }
            }
        }
        let kept: Vec<BTreeSet<NodeId>> = all
            .iter()
            .filter(|set| {
                !all.iter()
                    .any(|other| *set != other && set.is_subset(other))
            })
            .cloned()
            .collect();
        kept
    }
}
