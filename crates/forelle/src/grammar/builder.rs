//! Grammar container and builder.
//!
//! The builder enforces the input contract of the generation engine: unique
//! symbol names, no degenerate `S -> S` rules, every referenced non-terminal
//! produced by at least one rule, and no un-rewritten left recursion. For
//! each declared start symbol `S` it appends the augmented rule
//! `Start<S> -> S End<S>`.
//!
//! The built [`Grammar`] is append-only: the generator may synthesize
//! discriminator rules into it, but nothing is ever removed or mutated.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::error::GrammarError;
use crate::grammar::rule::{Rule, RuleId, RuleInfo};
use crate::grammar::symbol::{Name, NonTerminal, Symbol, SymbolInterner, SyntheticKind, Token};

type RandomState = ahash::RandomState;

/// A start symbol together with its augmentation.
#[derive(Debug, Clone, Copy)]
pub struct StartSymbol {
    /// The user's start non-terminal.
    pub symbol: NonTerminal,
    /// The synthetic `Start<S>` marker.
    pub marker: NonTerminal,
    /// The synthetic `End<S>` end-of-input token.
    pub end: Token,
    /// The augmented rule `Start<S> -> S End<S>`.
    pub rule: RuleId,
}

/// A validated, normalized context-free grammar.
pub struct Grammar {
    interner: SymbolInterner,
    rules: Vec<Rule>,
    by_produced: HashMap<NonTerminal, SmallVec<[RuleId; 4]>, RandomState>,
    non_terminal_order: Vec<NonTerminal>,
    tokens: HashMap<Name, Token, RandomState>,
    non_terminals: HashMap<Name, NonTerminal, RandomState>,
    starts: Vec<StartSymbol>,
    discriminator_count: u32,
}

impl Grammar {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, r)| (RuleId(i as u32), r))
    }

    /// The rules producing a non-terminal, in declaration order.
    #[must_use]
    pub fn rules_for(&self, nt: NonTerminal) -> &[RuleId] {
        self.by_produced.get(&nt).map_or(&[], |ids| ids)
    }

    /// All non-terminals in first-definition order, including synthetic ones.
    #[must_use]
    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminal_order
    }

    #[must_use]
    pub fn starts(&self) -> &[StartSymbol] {
        &self.starts
    }

    /// Look up a user token by name.
    #[must_use]
    pub fn token(&self, name: &str) -> Option<Token> {
        let name = self.interner.get(name)?;
        self.tokens.get(&name).copied()
    }

    /// Look up a user non-terminal by name.
    #[must_use]
    pub fn non_terminal(&self, name: &str) -> Option<NonTerminal> {
        let name = self.interner.get(name)?;
        self.non_terminals.get(&name).copied()
    }

    /// The start entry for a user non-terminal, if it was declared as a
    /// start symbol.
    #[must_use]
    pub fn start_for(&self, symbol: NonTerminal) -> Option<&StartSymbol> {
        self.starts.iter().find(|s| s.symbol == symbol)
    }

    /// The synthesized discriminator symbols, in creation order.
    #[must_use]
    pub fn discriminators(&self) -> Vec<NonTerminal> {
        self.non_terminal_order
            .iter()
            .copied()
            .filter(NonTerminal::is_discriminator)
            .collect()
    }

    #[must_use]
    pub fn resolve(&self, name: Name) -> &str {
        self.interner.resolve(name)
    }

    /// Render a symbol as plain text.
    #[must_use]
    pub fn render_symbol(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol.name())
    }

    /// Render a rule, optionally marking a cursor position with an inline
    /// `.` (a position equal to the rule length renders a trailing cursor).
    #[must_use]
    pub fn render_rule(&self, id: RuleId, cursor: Option<usize>) -> String {
        let rule = self.rule(id);
        let mut out = String::new();
        out.push_str(self.interner.resolve(rule.produced().name()));
        out.push_str(" ->");
        for (i, sym) in rule.symbols().iter().enumerate() {
            if cursor == Some(i) {
                out.push_str(" .");
            }
            out.push(' ');
            out.push_str(self.render_symbol(*sym));
        }
        if cursor == Some(rule.len()) {
            out.push_str(" .");
        }
        out
    }

    /// Invent a fresh discriminator non-terminal.
    pub(crate) fn new_discriminator(&mut self) -> NonTerminal {
        let name = self
            .interner
            .intern(&format!("Disc{}", self.discriminator_count));
        self.discriminator_count += 1;
        let nt = NonTerminal::new(name, Some(SyntheticKind::Discriminator));
        self.non_terminal_order.push(nt);
        nt
    }

    /// Append a rule. Used by the builder and by discriminator synthesis;
    /// existing rules and ids are never disturbed.
    pub(crate) fn push_rule(
        &mut self,
        produced: NonTerminal,
        symbols: SmallVec<[Symbol; 4]>,
        info: RuleInfo,
    ) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(Rule::new(produced, symbols, info));
        self.by_produced.entry(produced).or_default().push(id);
        id
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("rules", &self.rules.len())
            .field("non_terminals", &self.non_terminal_order.len())
            .field("starts", &self.starts.len())
            .finish()
    }
}

/// A symbol reference inside a builder rule body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolSpec {
    Token(String),
    NonTerminal(String),
}

/// Shorthand for a token reference in a rule body.
#[must_use]
pub fn t(name: &str) -> SymbolSpec {
    SymbolSpec::Token(name.to_string())
}

/// Shorthand for a non-terminal reference in a rule body.
#[must_use]
pub fn nt(name: &str) -> SymbolSpec {
    SymbolSpec::NonTerminal(name.to_string())
}

/// Builder validating the engine's input contract.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<(String, Vec<SymbolSpec>, RuleInfo)>,
    starts: Vec<String>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a production rule.
    #[must_use]
    pub fn rule(self, produced: &str, body: impl IntoIterator<Item = SymbolSpec>) -> Self {
        self.rule_with_info(produced, body, RuleInfo::default())
    }

    /// Add a production rule with extended info.
    #[must_use]
    pub fn rule_with_info(
        mut self,
        produced: &str,
        body: impl IntoIterator<Item = SymbolSpec>,
        info: RuleInfo,
    ) -> Self {
        self.rules
            .push((produced.to_string(), body.into_iter().collect(), info));
        self
    }

    /// Declare a start symbol. Each start symbol `S` receives an augmented
    /// rule `Start<S> -> S End<S>`.
    #[must_use]
    pub fn start_symbol(mut self, name: &str) -> Self {
        self.starts.push(name.to_string());
        self
    }

    /// Validate and build the grammar.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] when the input contract is violated.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        if self.starts.is_empty() {
            return Err(GrammarError::NoStartSymbol);
        }

        let mut interner = SymbolInterner::new();
        let produced_names: HashSet<&str, RandomState> = self
            .rules
            .iter()
            .map(|(name, _, _)| name.as_str())
            .collect();

        // Resolve every body symbol, checking kind consistency as we go.
        let mut tokens: HashMap<Name, Token, RandomState> = HashMap::default();
        let mut non_terminals: HashMap<Name, NonTerminal, RandomState> = HashMap::default();
        let mut non_terminal_order = Vec::new();

        let intern_nt = |interner: &mut SymbolInterner,
                             non_terminals: &mut HashMap<Name, NonTerminal, RandomState>,
                             order: &mut Vec<NonTerminal>,
                             name: &str| {
            let key = interner.intern(name);
            *non_terminals.entry(key).or_insert_with(|| {
                let nt = NonTerminal::new(key, None);
                order.push(nt);
                nt
            })
        };

        for (produced, _, _) in &self.rules {
            intern_nt(
                &mut interner,
                &mut non_terminals,
                &mut non_terminal_order,
                produced,
            );
        }

        let mut rules = Vec::new();
        let mut by_produced: HashMap<NonTerminal, SmallVec<[RuleId; 4]>, RandomState> =
            HashMap::default();

        for (produced, body, info) in &self.rules {
            let lhs = intern_nt(
                &mut interner,
                &mut non_terminals,
                &mut non_terminal_order,
                produced,
            );
            let mut symbols: SmallVec<[Symbol; 4]> = SmallVec::new();
            for spec in body {
                let symbol = match spec {
                    SymbolSpec::Token(name) => {
                        if produced_names.contains(name.as_str()) {
                            return Err(GrammarError::SymbolKindConflict { name: name.clone() });
                        }
                        let key = interner.intern(name);
                        Symbol::Token(*tokens.entry(key).or_insert_with(|| Token::new(key, None)))
                    }
                    SymbolSpec::NonTerminal(name) => {
                        if !produced_names.contains(name.as_str()) {
                            return Err(GrammarError::UndefinedNonTerminal { name: name.clone() });
                        }
                        Symbol::NonTerminal(intern_nt(
                            &mut interner,
                            &mut non_terminals,
                            &mut non_terminal_order,
                            name,
                        ))
                    }
                };
                symbols.push(symbol);
            }

            if symbols.len() == 1 && symbols[0] == Symbol::NonTerminal(lhs) {
                return Err(GrammarError::DegenerateRule {
                    name: produced.clone(),
                });
            }

            let id = RuleId(rules.len() as u32);
            rules.push(Rule::new(lhs, symbols, info.clone()));
            by_produced.entry(lhs).or_default().push(id);
        }

        check_left_recursion(&rules, &by_produced, &interner)?;

        let mut grammar = Grammar {
            interner,
            rules,
            by_produced,
            non_terminal_order,
            tokens,
            non_terminals,
            starts: Vec::new(),
            discriminator_count: 0,
        };

        for start in &self.starts {
            let Some(symbol) = grammar.non_terminal(start).filter(|s| {
                !grammar.rules_for(*s).is_empty()
            }) else {
                return Err(GrammarError::UnknownStartSymbol {
                    name: start.clone(),
                });
            };
            let marker_name = grammar.interner.intern(&format!("Start<{start}>"));
            let end_name = grammar.interner.intern(&format!("End<{start}>"));
            let marker = NonTerminal::new(marker_name, Some(SyntheticKind::Start));
            let end = Token::new(end_name, Some(SyntheticKind::End));
            grammar.non_terminal_order.push(marker);
            let rule = grammar.push_rule(
                marker,
                SmallVec::from_vec(vec![Symbol::NonTerminal(symbol), Symbol::Token(end)]),
                RuleInfo::default(),
            );
            grammar.starts.push(StartSymbol {
                symbol,
                marker,
                end,
                rule,
            });
        }

        Ok(grammar)
    }
}

/// Reject direct and indirect left recursion, including recursion reachable
/// through nullable rule prefixes. The engine relies on the absence of left
/// recursion for termination of head expansion.
fn check_left_recursion(
    rules: &[Rule],
    by_produced: &HashMap<NonTerminal, SmallVec<[RuleId; 4]>, RandomState>,
    interner: &SymbolInterner,
) -> Result<(), GrammarError> {
    // Nullable fixpoint over the raw rules.
    let mut nullable: HashSet<NonTerminal, RandomState> = HashSet::default();
    loop {
        let mut changed = false;
        for rule in rules {
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

    // Left-corner edges: N -> M whenever M appears in a rule of N with only
    // nullable symbols before it.
    let left_corners = |n: NonTerminal| -> Vec<NonTerminal> {
        let mut out = Vec::new();
        for id in by_produced.get(&n).map_or(&[][..], |ids| ids) {
            for sym in rules[id.index()].symbols() {
                match sym {
                    Symbol::Token(_) => break,
                    Symbol::NonTerminal(m) => {
                        out.push(*m);
                        if !nullable.contains(m) {
                            break;
                        }
                    }
                }
            }
        }
        out
    };

    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut colors: HashMap<NonTerminal, Color, RandomState> = HashMap::default();
    let mut path: Vec<NonTerminal> = Vec::new();

    // Iterative DFS with an explicit stack of (node, next-edge-index).
    for rule in rules {
        let root = rule.produced();
        if colors.get(&root).copied().unwrap_or(Color::White) != Color::White {
            continue;
        }
        let mut stack: Vec<(NonTerminal, Vec<NonTerminal>, usize)> =
            vec![(root, left_corners(root), 0)];
        colors.insert(root, Color::Gray);
        path.push(root);
        while let Some((node, edges, idx)) = stack.last_mut() {
            if *idx >= edges.len() {
                colors.insert(*node, Color::Black);
                path.pop();
                stack.pop();
                continue;
            }
            let next = edges[*idx];
            *idx += 1;
            match colors.get(&next).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    let mut cycle: Vec<String> = path
                        .iter()
                        .skip_while(|n| **n != next)
                        .map(|n| interner.resolve(n.name()).to_string())
                        .collect();
                    cycle.push(interner.resolve(next.name()).to_string());
                    return Err(GrammarError::LeftRecursion { cycle });
                }
                Color::White => {
                    colors.insert(next, Color::Gray);
                    path.push(next);
                    let next_edges = left_corners(next);
                    stack.push((next, next_edges, 0));
                }
                Color::Black => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_augments_start_symbols() {
        let grammar = Grammar::builder()
            .rule("A", [nt("B"), t(";")])
            .rule("B", [])
            .rule("B", [t(";")])
            .start_symbol("A")
            .build()
            .expect("grammar should build");

        assert_eq!(grammar.starts().len(), 1);
        let start = grammar.starts()[0];
        assert!(start.marker.is_start_marker());
        assert!(start.end.is_end_marker());
        let rule = grammar.rule(start.rule);
        assert_eq!(rule.len(), 2);
        assert_eq!(rule.produced(), start.marker);
    }

    #[test]
    fn rejects_undefined_non_terminal() {
        let err = Grammar::builder()
            .rule("A", [nt("Missing")])
            .start_symbol("A")
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::UndefinedNonTerminal { .. }));
    }

    #[test]
    fn rejects_degenerate_rule() {
        let err = Grammar::builder()
            .rule("A", [nt("A")])
            .rule("A", [t("x")])
            .start_symbol("A")
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::DegenerateRule { .. }));
    }

    #[test]
    fn rejects_direct_left_recursion() {
        let err = Grammar::builder()
            .rule("E", [nt("E"), t("+"), t("x")])
            .rule("E", [t("x")])
            .start_symbol("E")
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::LeftRecursion { .. }));
    }

    #[test]
    fn rejects_left_recursion_through_nullable_prefix() {
        let err = Grammar::builder()
            .rule("A", [nt("N"), nt("B")])
            .rule("B", [nt("A"), t("x")])
            .rule("B", [t("y")])
            .rule("N", [])
            .rule("A", [t("z")])
            .start_symbol("A")
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::LeftRecursion { .. }));
    }

    #[test]
    fn rejects_symbol_used_as_token_and_non_terminal() {
        let err = Grammar::builder()
            .rule("A", [t("B")])
            .rule("B", [t("x")])
            .start_symbol("A")
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::SymbolKindConflict { .. }));
    }

    #[test]
    fn renders_rules_with_cursor() {
        let grammar = Grammar::builder()
            .rule("E", [nt("T"), t("+"), nt("T")])
            .rule("T", [t("x")])
            .start_symbol("E")
            .build()
            .unwrap();
        let (id, _) = grammar.rules().next().unwrap();
        assert_eq!(grammar.render_rule(id, None), "E -> T + T");
        assert_eq!(grammar.render_rule(id, Some(1)), "E -> T . + T");
        assert_eq!(grammar.render_rule(id, Some(3)), "E -> T + T .");
    }

    #[test]
    fn discriminator_symbols_are_tracked() {
        let mut grammar = Grammar::builder()
            .rule("A", [t("x")])
            .start_symbol("A")
            .build()
            .unwrap();
        let d0 = grammar.new_discriminator();
        let d1 = grammar.new_discriminator();
        assert_ne!(d0, d1);
        assert_eq!(grammar.discriminators().len(), 2);
        assert_eq!(grammar.resolve(d0.name()), "Disc0");
    }
}
