//! # Parser Generator
//!
//! The memoized recursive decision procedure mapping parsing contexts to
//! actions.
//!
//! ## Overview
//!
//! Each context is decided by trying a fixed sequence of strategies, first
//! applicable wins: completed-parse reduction, lookahead narrowing, conflict
//! classification, common-leaf shifting, recursive specialization,
//! token-set branching, and finally single-token specialization with
//! discriminator synthesis. Contexts already on the solving stack count as
//! solved, which is what lets lookahead search cross recursive grammar
//! structure without diverging; a later linking pass verifies that every
//! referenced context really did get an action.
//!
//! Failures are cached alongside successes so a failing strategy is derived
//! at most once, and a hard cap on specialization expansions bounds the
//! search on grammars that are genuinely not parseable with bounded
//! lookahead.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use smallvec::smallvec;

use crate::automaton::DecisionAutomaton;
use crate::engine::action::DecisionAction;
use crate::engine::ambiguity::AmbiguityResolver;
use crate::engine::context::{ContextArena, ContextData, ContextId};
use crate::engine::discriminator::{
    self, DiscriminatorContext, DiscriminatorMode, GatheredSuffix,
};
use crate::engine::path;
use crate::engine::resolver;
use crate::engine::trie::{DiscriminatorRule, DiscriminatorTrie};
use crate::error::{GenerateError, InvariantError};
use crate::grammar::{FirstFollow, Grammar, NonTerminal, RuleId, RuleInfo, Symbol, Token};
use crate::node::{NodeArena, NodeData, NodeId};

type RandomState = ahash::RandomState;

/// Bounds on the otherwise-unbounded parts of lookahead search.
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    /// Total specialization expansions allowed per generation run. Hitting
    /// the cap fails the affected decision points instead of diverging.
    pub expansion_cap: usize,
    /// Maximum derivation depth explored while gathering post-token
    /// suffixes for a discriminator.
    pub gather_depth: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            expansion_cap: 512,
            gather_depth: 64,
        }
    }
}

/// Generate a decision automaton for a validated grammar.
///
/// Either every decision point reachable from the start symbols resolves to
/// a deterministic action and the closed automaton is returned, or the
/// sorted list of diagnostics is returned. There is no partial output.
///
/// # Errors
///
/// [`GenerateError::Unresolved`] for ambiguous or insufficient-lookahead
/// grammars, [`GenerateError::Invariant`] for internal engine bugs.
pub fn generate(
    grammar: Grammar,
    ambiguity: &dyn AmbiguityResolver,
    options: GenerateOptions,
) -> Result<DecisionAutomaton, GenerateError> {
    let sets = FirstFollow::compute(&grammar);
    let mut generator = Generator {
        grammar,
        sets,
        nodes: NodeArena::new(),
        contexts: ContextArena::new(),
        trie: DiscriminatorTrie::new(),
        actions: HashMap::default(),
        failed: HashMap::default(),
        solving: Vec::new(),
        default_contexts: HashMap::default(),
        discriminator_contexts: HashMap::default(),
        expansions: 0,
        options,
        ambiguity,
    };

    let mut errors: BTreeSet<String> = BTreeSet::new();
    let starts = generator.grammar.starts().to_vec();
    let mut roots = Vec::with_capacity(starts.len());
    for start in starts {
        let root = generator.default_context(start.marker);
        roots.push((start, root));
        if !generator.try_solve(root)? {
            errors.insert(generator.failure_message(root));
        }
    }

    let (link_errors, reachable) = resolver::link_switches(
        &generator.grammar,
        &generator.nodes,
        &generator.contexts,
        &mut generator.actions,
        &roots,
    );
    errors.extend(link_errors);

    if !errors.is_empty() {
        return Err(GenerateError::Unresolved {
            errors: errors.into_iter().collect(),
        });
    }

    generator.actions.retain(|ctx, _| reachable.contains(ctx));
    Ok(DecisionAutomaton::new(
        generator.grammar,
        generator.nodes,
        generator.contexts,
        generator.actions,
        roots,
        generator.discriminator_contexts,
    ))
}

enum Decision {
    Action(DecisionAction),
    Fail(String),
}

struct Generator<'a> {
    grammar: Grammar,
    sets: FirstFollow,
    nodes: NodeArena,
    contexts: ContextArena,
    trie: DiscriminatorTrie,
    actions: HashMap<ContextId, DecisionAction, RandomState>,
    failed: HashMap<ContextId, String, RandomState>,
    solving: Vec<ContextId>,
    default_contexts: HashMap<NonTerminal, ContextId, RandomState>,
    discriminator_contexts: HashMap<RuleId, Vec<DiscriminatorContext>, RandomState>,
    expansions: usize,
    options: GenerateOptions,
    ambiguity: &'a dyn AmbiguityResolver,
}

impl Generator<'_> {
    /// The top-level decision context of a non-terminal: one hypothesis per
    /// producing rule, cursor at the start, no lookahead restriction.
    fn default_context(&mut self, nt: NonTerminal) -> ContextId {
        if let Some(id) = self.default_contexts.get(&nt) {
            return *id;
        }
        let mut hypotheses = BTreeSet::new();
        for rule_id in self.grammar.rules_for(nt).to_vec() {
            hypotheses.insert(self.nodes.rule_root(rule_id, self.grammar.rule(rule_id)));
        }
        let ctx = self.contexts.intern(hypotheses, None);
        self.default_contexts.insert(nt, ctx);
        ctx
    }

    /// Solve a context, memoizing success and failure. A context already on
    /// the solving stack counts as solved.
    fn try_solve(&mut self, ctx: ContextId) -> Result<bool, InvariantError> {
        if self.actions.contains_key(&ctx) || self.solving.contains(&ctx) {
            return Ok(true);
        }
        if self.failed.contains_key(&ctx) {
            return Ok(false);
        }
        self.solving.push(ctx);
        let outcome = self.decide(ctx);
        self.solving.pop();
        match outcome? {
            Decision::Action(action) => {
                self.actions.insert(ctx, action);
                Ok(true)
            }
            Decision::Fail(message) => {
                self.failed.insert(ctx, message);
                Ok(false)
            }
        }
    }

    fn failure_message(&self, ctx: ContextId) -> String {
        self.failed
            .get(&ctx)
            .cloned()
            .unwrap_or_else(|| self.render_context(ctx, "unresolved decision point"))
    }

    fn render_context(&self, ctx: ContextId, what: &str) -> String {
        let mut lines: Vec<String> = self
            .contexts
            .get(ctx)
            .nodes()
            .iter()
            .map(|n| self.nodes.render(&self.grammar, *n))
            .collect();
        lines.sort();
        format!("{what}:\n  {}", lines.join("\n  "))
    }

    /// The tokens that can come next for one hypothesis, before any
    /// context-level lookahead restriction.
    fn next_tokens(&self, node: NodeId) -> Result<BTreeSet<Token>, InvariantError> {
        let pos = self
            .nodes
            .cursor_position(node)
            .ok_or(InvariantError::NoCursor)?;
        let remaining = self.nodes.leaf_symbols_from(node, pos);
        let mut out = self.sets.first_of_sequence(&remaining);
        if self.sets.is_sequence_nullable(&remaining) {
            if let Symbol::NonTerminal(produced) = self.nodes.produced(&self.grammar, node) {
                out.extend(self.sets.follow(produced).iter().copied());
            }
        }
        Ok(out)
    }

    fn root_rule(&self, node: NodeId) -> Result<RuleId, InvariantError> {
        match self.nodes.get(node) {
            NodeData::Parent { rule, .. } => Ok(*rule),
            NodeData::Leaf { .. } => Err(InvariantError::CorruptState(
                "context hypothesis is a bare leaf".to_string(),
            )),
        }
    }

    /// Record that a discriminator rule stood in for a real rule at some
    /// decision point. A rule accumulates one entry per distinct usage.
    fn record_discriminator_use(&mut self, rule: RuleId, usage: DiscriminatorContext) {
        let usages = self.discriminator_contexts.entry(rule).or_default();
        if !usages.contains(&usage) {
            usages.push(usage);
        }
    }

    fn decide(&mut self, ctx: ContextId) -> Result<Decision, InvariantError> {
        let data = self.contexts.get(ctx).clone();
        let hypotheses: Vec<NodeId> = data.nodes().iter().copied().collect();

        // 1. A single completed hypothesis: this decision is done.
        if hypotheses.len() == 1 && self.nodes.is_fully_consumed(hypotheses[0]) {
            return Ok(Decision::Action(DecisionAction::Reduce(smallvec![
                hypotheses[0]
            ])));
        }

        let mut next: Vec<BTreeSet<Token>> = Vec::with_capacity(hypotheses.len());
        for node in &hypotheses {
            let mut tokens = self.next_tokens(*node)?;
            tokens.retain(|t| data.admits(*t));
            next.push(tokens);
        }
        let mut lookahead: BTreeSet<Token> = BTreeSet::new();
        for tokens in &next {
            lookahead.extend(tokens.iter().copied());
        }
        if lookahead.is_empty() {
            return Ok(Decision::Fail(
                self.render_context(ctx, "no viable lookahead at decision point"),
            ));
        }

        // 2. Lookahead narrowing: partition hypotheses by which tokens keep
        // them alive, and branch when the partition is non-trivial.
        let mut groups: BTreeMap<BTreeSet<NodeId>, BTreeSet<Token>> = BTreeMap::new();
        for token in &lookahead {
            let alive: BTreeSet<NodeId> = hypotheses
                .iter()
                .zip(&next)
                .filter(|(_, tokens)| tokens.contains(token))
                .map(|(node, _)| *node)
                .collect();
            groups.entry(alive).or_default().insert(*token);
        }
        let narrows = groups.len() > 1
            || groups
                .keys()
                .next()
                .is_some_and(|alive| alive.len() < hypotheses.len());
        if narrows {
            let mut branches = BTreeMap::new();
            for (alive, tokens) in &groups {
                let sub = self.contexts.intern(alive.clone(), Some(tokens.clone()));
                if !self.try_solve(sub)? {
                    return Ok(Decision::Fail(self.failure_message(sub)));
                }
                for token in tokens {
                    branches.insert(*token, sub);
                }
            }
            if groups.len() == 1 {
                // Only dead hypotheses were shed; no branching needed.
                let next_ctx = *branches
                    .values()
                    .next()
                    .ok_or_else(|| InvariantError::CorruptState("empty narrowing".into()))?;
                return Ok(Decision::Action(DecisionAction::Delegate { next: next_ctx }));
            }
            return Ok(Decision::Action(DecisionAction::TokenSwitch { branches }));
        }

        let trailing: Vec<bool> = hypotheses
            .iter()
            .map(|n| self.nodes.is_fully_consumed(*n))
            .collect();

        // 3. Reduce-reduce: every hypothesis is complete. Let the ambiguity
        // resolver pick one; otherwise keep them all, and the linking pass
        // reports an error if this point is actually reachable.
        if trailing.iter().all(|t| *t) {
            if let Some(choice) = self
                .ambiguity
                .resolve(&self.grammar, &self.nodes, &hypotheses)
            {
                if hypotheses.contains(&choice) {
                    return Ok(Decision::Action(DecisionAction::Reduce(smallvec![choice])));
                }
            }
            return Ok(Decision::Action(DecisionAction::Reduce(
                hypotheses.iter().copied().collect(),
            )));
        }

        // 4. Shift-reduce: some hypotheses are complete, some are not, and
        // lookahead could not tell them apart.
        if trailing.iter().any(|t| *t) {
            return Ok(Decision::Fail(
                self.render_context(ctx, "shift-reduce conflict at decision point"),
            ));
        }

        // 5. Common cursor leaf: every hypothesis wants the same symbol
        // next, so consume it uniformly.
        let mut leaves = Vec::with_capacity(hypotheses.len());
        for node in &hypotheses {
            leaves.push(self.nodes.symbol_at_cursor(*node)?);
        }
        if leaves.iter().all(|l| *l == leaves[0]) {
            match leaves[0] {
                Symbol::Token(token) => {
                    let mut advanced = BTreeSet::new();
                    for node in &hypotheses {
                        advanced.insert(self.nodes.advance_cursor(*node)?);
                    }
                    let next_ctx = self.contexts.intern(advanced, None);
                    if !self.try_solve(next_ctx)? {
                        return Ok(Decision::Fail(self.failure_message(next_ctx)));
                    }
                    return Ok(Decision::Action(DecisionAction::EatToken {
                        token,
                        next: next_ctx,
                    }));
                }
                Symbol::NonTerminal(nt) => {
                    let sub = self.default_context(nt);
                    if self.try_solve(sub)? {
                        let mut advanced = BTreeSet::new();
                        for node in &hypotheses {
                            advanced.insert(self.nodes.advance_cursor(*node)?);
                        }
                        let next_ctx = self.contexts.intern(advanced, None);
                        if !self.try_solve(next_ctx)? {
                            return Ok(Decision::Fail(self.failure_message(next_ctx)));
                        }
                        return Ok(Decision::Action(DecisionAction::ParseSubContext {
                            sub,
                            next: next_ctx,
                        }));
                    }
                    // The sub-decision is itself conflicted; later
                    // strategies may still crack this context.
                }
            }
        }

        // 6. Recursive specialization: split off recurring subtrees so that
        // self-embedding lookahead terminates.
        if let Some(action) = self.try_recursive_specialization(&hypotheses)? {
            return Ok(Decision::Action(action));
        }

        // 7. Plain token branching.
        if lookahead.len() > 1 {
            let mut branches = BTreeMap::new();
            for token in &lookahead {
                let restriction = BTreeSet::from([*token]);
                let sub = self
                    .contexts
                    .intern(data.nodes().clone(), Some(restriction));
                if !self.try_solve(sub)? {
                    return Ok(Decision::Fail(self.failure_message(sub)));
                }
                branches.insert(*token, sub);
            }
            return Ok(Decision::Action(DecisionAction::TokenSwitch { branches }));
        }

        // 8. Single lookahead token: discriminate or specialize.
        let token = *lookahead
            .first()
            .ok_or_else(|| InvariantError::CorruptState("empty lookahead".into()))?;
        if hypotheses.len() >= 2 {
            if let Some(action) = self.try_discriminator(&hypotheses, token)? {
                return Ok(Decision::Action(action));
            }
        }
        self.try_specialize(ctx, &data, &hypotheses, token)
    }

    fn try_recursive_specialization(
        &mut self,
        hypotheses: &[NodeId],
    ) -> Result<Option<DecisionAction>, InvariantError> {
        let mut sub_nodes = BTreeSet::new();
        let mut branch_map: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        for node in hypotheses {
            let spine_rules = self.nodes.spine_rules(*node);
            let k = path::longest_repeated_suffix(&spine_rules);
            if k == 0 {
                return Ok(None);
            }
            let depth = path::cut_depth(spine_rules.len(), k);
            if depth == 0 {
                return Ok(None);
            }
            let spine = self.nodes.cursor_spine(*node);
            let subtree = spine[depth];
            let produced = self.grammar.rule(spine_rules[depth]).produced();
            let collapsed = self.nodes.collapse_spine_ancestor(*node, depth, produced)?;
            sub_nodes.insert(subtree);
            branch_map.entry(subtree).or_default().insert(collapsed);
        }

        let sub = self.contexts.intern(sub_nodes, None);
        if !self.try_solve(sub)? {
            return Ok(None);
        }
        let mut branches = Vec::with_capacity(branch_map.len());
        for (hypothesis, collapsed) in branch_map {
            let next = self.contexts.intern(collapsed, None);
            if !self.try_solve(next)? {
                return Ok(None);
            }
            branches.push((hypothesis, next));
        }
        Ok(Some(DecisionAction::SubContextSwitch {
            sub,
            branches,
            resolved: false,
        }))
    }

    fn try_discriminator(
        &mut self,
        hypotheses: &[NodeId],
        token: Token,
    ) -> Result<Option<DecisionAction>, InvariantError> {
        // Gather the post-token continuations of every hypothesis; any leak
        // or empty gather disqualifies the whole strategy.
        let mut gathered: Vec<(NodeId, Vec<GatheredSuffix>)> = Vec::new();
        for node in hypotheses {
            let suffixes = discriminator::gather_post_token_suffixes(
                &self.grammar,
                &self.sets,
                &mut self.nodes,
                token,
                *node,
                self.options.gather_depth,
            )?;
            match suffixes {
                Some(suffixes) if !suffixes.is_empty() => gathered.push((*node, suffixes)),
                _ => return Ok(None),
            }
        }

        // A continuation shared by two different hypotheses cannot be
        // discriminated.
        let mut body_owner: BTreeMap<Vec<Symbol>, usize> = BTreeMap::new();
        let mut entries: Vec<(usize, GatheredSuffix, Vec<Symbol>)> = Vec::new();
        for (owner, (_, suffixes)) in gathered.iter().enumerate() {
            for suffix in suffixes {
                let mut body = Vec::with_capacity(suffix.suffix.len() + 1);
                body.push(Symbol::Token(token));
                body.extend(suffix.suffix.iter().copied());
                match body_owner.get(&body) {
                    Some(previous) if *previous != owner => return Ok(None),
                    _ => {
                        body_owner.insert(body.clone(), owner);
                    }
                }
                entries.push((owner, suffix.clone(), body));
            }
        }

        if let Some(action) = self.try_prefix_discriminator(&entries)? {
            return Ok(Some(action));
        }
        self.try_post_token_discriminator(&gathered, &body_owner, &entries)
    }

    fn try_prefix_discriminator(
        &mut self,
        entries: &[(usize, GatheredSuffix, Vec<Symbol>)],
    ) -> Result<Option<DecisionAction>, InvariantError> {
        let bodies: Vec<Vec<Symbol>> = entries.iter().map(|(_, _, body)| body.clone()).collect();
        let Some(reuse) =
            discriminator::find_prefix_discriminator(&self.grammar, &self.trie, &bodies)
        else {
            return Ok(None);
        };

        let sub = self.default_context(reuse.discriminator);
        if !self.try_solve(sub)? {
            return Ok(None);
        }

        // After the discriminator consumed a prefix, each hypothesis
        // resumes right behind that prefix.
        let mut branch_nodes: BTreeMap<RuleId, BTreeSet<NodeId>> = BTreeMap::new();
        for ((_, suffix, body), (rule, len)) in entries.iter().zip(&reuse.assignments) {
            let resumed = self.nodes.with_cursor(suffix.variant, suffix.token_pos + len)?;
            branch_nodes.entry(*rule).or_default().insert(resumed);
            let mode = if *len < body.len() {
                DiscriminatorMode::Prefix
            } else {
                DiscriminatorMode::PostToken
            };
            let original = self.root_rule(suffix.variant)?;
            self.record_discriminator_use(
                *rule,
                DiscriminatorContext {
                    original_rule: original,
                    mode,
                },
            );
        }

        let mut branches = Vec::with_capacity(branch_nodes.len());
        for (rule, resumed) in branch_nodes {
            let next = self.contexts.intern(resumed, None);
            if !self.try_solve(next)? {
                return Ok(None);
            }
            let hypothesis = self.nodes.rule_root(rule, self.grammar.rule(rule));
            branches.push((hypothesis, next));
        }
        Ok(Some(DecisionAction::SubContextSwitch {
            sub,
            branches,
            resolved: false,
        }))
    }

    fn try_post_token_discriminator(
        &mut self,
        gathered: &[(NodeId, Vec<GatheredSuffix>)],
        body_owner: &BTreeMap<Vec<Symbol>, usize>,
        entries: &[(usize, GatheredSuffix, Vec<Symbol>)],
    ) -> Result<Option<DecisionAction>, InvariantError> {
        let token = match entries.first().and_then(|(_, _, body)| body.first()) {
            Some(Symbol::Token(t)) => *t,
            _ => return Ok(None),
        };
        let body_set: BTreeSet<Vec<Symbol>> = body_owner.keys().cloned().collect();

        let disc = match discriminator::find_exact_discriminator(&self.grammar, &self.trie, &body_set)
        {
            Some(disc) => disc,
            None => {
                let disc = self.grammar.new_discriminator();
                let mut follow = BTreeSet::new();
                for (node, _) in gathered {
                    if let Symbol::NonTerminal(produced) =
                        self.nodes.produced(&self.grammar, *node)
                    {
                        follow.extend(self.sets.follow(produced).iter().copied());
                    }
                }
                for (body, owner) in body_owner {
                    let original = self.root_rule(gathered[*owner].0)?;
                    let rule = self.grammar.push_rule(
                        disc,
                        body.iter().copied().collect(),
                        RuleInfo {
                            mapped_rules: vec![original],
                            ..RuleInfo::default()
                        },
                    );
                    self.trie
                        .insert(body, DiscriminatorRule { symbol: disc, rule });
                }
                self.sets.register_discriminator(disc, token, follow);
                disc
            }
        };

        let sub = self.default_context(disc);
        if !self.try_solve(sub)? {
            return Ok(None);
        }

        let mut branches = Vec::new();
        for rule_id in self.grammar.rules_for(disc).to_vec() {
            let body: Vec<Symbol> = self.grammar.rule(rule_id).symbols().to_vec();
            let mut done = BTreeSet::new();
            for (_, suffix, entry_body) in entries {
                if *entry_body == body {
                    let leaves = self.nodes.leaf_count(suffix.variant);
                    done.insert(self.nodes.with_cursor(suffix.variant, leaves)?);
                    let original = self.root_rule(suffix.variant)?;
                    self.record_discriminator_use(
                        rule_id,
                        DiscriminatorContext {
                            original_rule: original,
                            mode: DiscriminatorMode::PostToken,
                        },
                    );
                }
            }
            if done.is_empty() {
                return Ok(None);
            }
            let next = self.contexts.intern(done, None);
            if !self.try_solve(next)? {
                return Ok(None);
            }
            let hypothesis = self.nodes.rule_root(rule_id, self.grammar.rule(rule_id));
            branches.push((hypothesis, next));
        }
        Ok(Some(DecisionAction::SubContextSwitch {
            sub,
            branches,
            resolved: false,
        }))
    }

    fn try_specialize(
        &mut self,
        ctx: ContextId,
        data: &ContextData,
        hypotheses: &[NodeId],
        token: Token,
    ) -> Result<Decision, InvariantError> {
        let mut specialized: BTreeSet<NodeId> = BTreeSet::new();
        let mut expanded_any = false;
        for node in hypotheses {
            let leaf = self.nodes.symbol_at_cursor(*node)?;
            let Symbol::NonTerminal(nt) = leaf else {
                specialized.insert(*node);
                continue;
            };
            let mut grew = false;
            for rule_id in self.grammar.rules_for(nt).to_vec() {
                let expanded =
                    self.nodes
                        .expand_cursor_leaf(*node, rule_id, self.grammar.rule(rule_id))?;
                if self.next_tokens(expanded)?.contains(&token) {
                    specialized.insert(expanded);
                    grew = true;
                    expanded_any = true;
                }
            }
            if !grew {
                specialized.insert(*node);
            }
        }

        let next_ctx = self
            .contexts
            .intern(specialized, data.lookahead().cloned());
        if !expanded_any || next_ctx == ctx {
            return Ok(Decision::Fail(self.render_context(
                ctx,
                "ambiguous or insufficient-lookahead decision point",
            )));
        }
        self.expansions += 1;
        if self.expansions > self.options.expansion_cap {
            return Ok(Decision::Fail(self.render_context(
                ctx,
                "lookahead expansion limit reached at decision point",
            )));
        }
        if !self.try_solve(next_ctx)? {
            return Ok(Decision::Fail(self.failure_message(next_ctx)));
        }
        Ok(Decision::Action(DecisionAction::Delegate { next: next_ctx }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ambiguity::NoResolution;
    use crate::grammar::{nt, t};

    fn solve(grammar: Grammar) -> Result<DecisionAutomaton, GenerateError> {
        generate(grammar, &NoResolution, GenerateOptions::default())
    }

    #[test]
    fn ll1_grammar_generates() {
        let grammar = Grammar::builder()
            .rule("S", [t("a"), nt("S")])
            .rule("S", [t("b")])
            .start_symbol("S")
            .build()
            .unwrap();
        let automaton = solve(grammar).expect("LL(1) grammar must generate");
        let s = automaton.grammar().non_terminal("S").unwrap();
        assert!(automaton.start_context(s).is_some());
    }

    #[test]
    fn nullable_lifting_requires_specialization() {
        let grammar = Grammar::builder()
            .rule("A", [nt("B"), t(";")])
            .rule("B", [])
            .rule("B", [t(";")])
            .start_symbol("A")
            .build()
            .unwrap();
        solve(grammar).expect("lifting grammar must generate");
    }

    #[test]
    fn identical_alternatives_report_one_ambiguity() {
        let grammar = Grammar::builder()
            .rule("S", [nt("Foo")])
            .rule("S", [nt("Bar")])
            .rule("Foo", [t("Id")])
            .rule("Bar", [t("Id")])
            .start_symbol("S")
            .build()
            .unwrap();
        let err = solve(grammar).unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.messages()[0].contains("ambiguous"));
    }

    #[test]
    fn self_embedding_lookahead_terminates() {
        let grammar = Grammar::builder()
            .rule("B", [t("("), nt("B"), t(")")])
            .rule("B", [])
            .start_symbol("B")
            .build()
            .unwrap();
        // Must finish; either outcome is a definite answer.
        let _ = solve(grammar);
    }
}
