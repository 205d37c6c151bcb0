//! # Automaton Walker
//!
//! A reference interpreter that drives a [`DecisionAutomaton`] over a token
//! sequence and reconstructs the parse tree, used to validate generated
//! automata against concrete inputs.
//!
//! The walker appends the grammar's end-of-input marker itself, executes
//! actions starting from the requested start context, and rebuilds the tree
//! from the reduce node of each frame. Trees produced by discriminator
//! sub-parses are flattened back into the continuations they stand in for,
//! so discriminators never appear in the returned tree.

use std::collections::VecDeque;

use thiserror::Error;

use crate::automaton::DecisionAutomaton;
use crate::engine::action::DecisionAction;
use crate::engine::context::ContextId;
use crate::grammar::{Grammar, NonTerminal, RuleId, Symbol, Token};
use crate::node::{NodeData, NodeId};

/// Failures while interpreting an automaton over input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    #[error("'{name}' is not a start symbol of this automaton")]
    UnknownStartSymbol { name: String },

    #[error("unexpected {} at position {position}, expected {expected}",
        found.as_deref().unwrap_or("end of input"))]
    UnexpectedToken {
        position: usize,
        found: Option<String>,
        expected: String,
    },

    #[error("input is ambiguous under this automaton")]
    AmbiguousParse,

    #[error("automaton contains an unresolved switch")]
    UnresolvedSwitch,

    #[error("input continues past a complete parse at position {position}")]
    TrailingInput { position: usize },

    #[error("walker invariant violated: {0}")]
    Internal(String),
}

/// A concrete parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    Token(Token),
    Node { rule: RuleId, children: Vec<ParseTree> },
}

impl ParseTree {
    /// Render as `Prod(child child ...)`, tokens by name.
    #[must_use]
    pub fn render(&self, grammar: &Grammar) -> String {
        match self {
            Self::Token(token) => grammar.resolve(token.name()).to_string(),
            Self::Node { rule, children } => {
                let name = grammar.resolve(grammar.rule(*rule).produced().name());
                let inner = children
                    .iter()
                    .map(|c| c.render(grammar))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{name}({inner})")
            }
        }
    }
}

/// Look up a sequence of tokens by name. `None` if any name is unknown.
#[must_use]
pub fn token_sequence(grammar: &Grammar, names: &[&str]) -> Option<Vec<Token>> {
    names.iter().map(|name| grammar.token(name)).collect()
}

/// Parse `input` from `start`, returning the tree with the start/end
/// augmentation stripped.
///
/// # Errors
///
/// [`WalkError`] when the input is rejected or the automaton cannot be
/// interpreted.
pub fn parse(
    automaton: &DecisionAutomaton,
    start: NonTerminal,
    input: &[Token],
) -> Result<ParseTree, WalkError> {
    let grammar = automaton.grammar();
    let (root, end) = automaton
        .start_context(start)
        .zip(grammar.start_for(start).map(|s| s.end))
        .ok_or_else(|| WalkError::UnknownStartSymbol {
            name: grammar.resolve(start.name()).to_string(),
        })?;

    let mut tokens = input.to_vec();
    tokens.push(end);
    let mut walker = Walker {
        automaton,
        tokens,
        pos: 0,
    };
    let (_, tree) = walker.run(root, VecDeque::new())?;
    if walker.pos != walker.tokens.len() {
        return Err(WalkError::TrailingInput {
            position: walker.pos,
        });
    }
    match tree {
        ParseTree::Node { mut children, .. } if children.len() == 2 => Ok(children.remove(0)),
        _ => Err(WalkError::Internal(
            "start augmentation did not produce a two-child root".to_string(),
        )),
    }
}

struct Walker<'a> {
    automaton: &'a DecisionAutomaton,
    tokens: Vec<Token>,
    pos: usize,
}

impl Walker<'_> {
    /// Execute one frame: run actions until a reduce, returning the reduce
    /// node and its reconstructed tree. `queue` holds the trees of leaves
    /// the caller already consumed on this frame's behalf.
    fn run(
        &mut self,
        mut ctx: ContextId,
        mut queue: VecDeque<ParseTree>,
    ) -> Result<(NodeId, ParseTree), WalkError> {
        loop {
            let action = self
                .automaton
                .action(ctx)
                .ok_or_else(|| WalkError::Internal("action missing for context".to_string()))?
                .clone();
            match action {
                DecisionAction::Reduce(candidates) => {
                    if candidates.len() != 1 {
                        return Err(WalkError::AmbiguousParse);
                    }
                    let node = candidates[0];
                    let tree = self.build(node, &mut queue)?;
                    if !queue.is_empty() {
                        return Err(WalkError::Internal(
                            "leftover subtrees after reduce".to_string(),
                        ));
                    }
                    return Ok((node, tree));
                }
                DecisionAction::EatToken { token, next } => {
                    if self.tokens.get(self.pos) != Some(&token) {
                        return Err(self.unexpected(self.render_token(token)));
                    }
                    queue.push_back(ParseTree::Token(token));
                    self.pos += 1;
                    ctx = next;
                }
                DecisionAction::TokenSwitch { branches } => {
                    let expected = || {
                        branches
                            .keys()
                            .map(|t| self.render_token(*t))
                            .collect::<Vec<_>>()
                            .join(" or ")
                    };
                    let Some(found) = self.tokens.get(self.pos) else {
                        return Err(self.unexpected(expected()));
                    };
                    let Some(next) = branches.get(found) else {
                        return Err(self.unexpected(expected()));
                    };
                    ctx = *next;
                }
                DecisionAction::ParseSubContext { sub, next } => {
                    let transferred = self.transfer(sub, &mut queue)?;
                    let (_, tree) = self.run(sub, transferred)?;
                    queue.push_back(tree);
                    ctx = next;
                }
                DecisionAction::SubContextSwitch {
                    sub,
                    branches,
                    resolved,
                } => {
                    if !resolved {
                        return Err(WalkError::UnresolvedSwitch);
                    }
                    let transferred = self.transfer(sub, &mut queue)?;
                    let (outcome, tree) = self.run(sub, transferred)?;
                    let nodes = self.automaton.nodes();
                    let grammar = self.automaton.grammar();
                    let from_discriminator = matches!(
                        nodes.produced(grammar, outcome),
                        Symbol::NonTerminal(n) if n.is_discriminator()
                    );
                    if from_discriminator {
                        // The discriminator's children are the real
                        // continuation; splice them back in.
                        match tree {
                            ParseTree::Node { children, .. } => queue.extend(children),
                            ParseTree::Token(_) => {
                                return Err(WalkError::Internal(
                                    "discriminator parse produced a bare token".to_string(),
                                ));
                            }
                        }
                    } else {
                        queue.push_back(tree);
                    }
                    let target = branches
                        .iter()
                        .find(|(hypothesis, _)| nodes.derives_from(grammar, outcome, *hypothesis))
                        .map(|(_, next)| *next);
                    ctx = target.ok_or_else(|| {
                        WalkError::Internal("no branch matches the sub-parse outcome".to_string())
                    })?;
                }
                DecisionAction::Delegate { next } => ctx = next,
            }
        }
    }

    /// Move the trees for the leaves a sub-context considers already
    /// consumed from the caller's queue into the sub-frame.
    fn transfer(
        &self,
        sub: ContextId,
        queue: &mut VecDeque<ParseTree>,
    ) -> Result<VecDeque<ParseTree>, WalkError> {
        let nodes = self.automaton.nodes();
        let mut consumed: Option<usize> = None;
        for node in self.automaton.contexts().get(sub).nodes() {
            let pos = nodes.cursor_position(*node).ok_or_else(|| {
                WalkError::Internal("sub-context hypothesis has no cursor".to_string())
            })?;
            match consumed {
                Some(prev) if prev != pos => {
                    return Err(WalkError::Internal(
                        "sub-context hypotheses disagree on consumed leaves".to_string(),
                    ));
                }
                _ => consumed = Some(pos),
            }
        }
        let consumed = consumed.unwrap_or(0);
        if consumed > queue.len() {
            return Err(WalkError::Internal(
                "sub-context expects more consumed leaves than available".to_string(),
            ));
        }
        Ok(queue.split_off(queue.len() - consumed))
    }

    /// Rebuild the tree of a fully consumed node by pairing its leaves, in
    /// order, with the consumed trees.
    fn build(
        &self,
        node: NodeId,
        queue: &mut VecDeque<ParseTree>,
    ) -> Result<ParseTree, WalkError> {
        match self.automaton.nodes().get(node) {
            NodeData::Leaf { .. } => queue.pop_front().ok_or_else(|| {
                WalkError::Internal("missing subtree for a consumed leaf".to_string())
            }),
            NodeData::Parent { rule, children, .. } => {
                let mut built = Vec::with_capacity(children.len());
                for child in children {
                    built.push(self.build(*child, queue)?);
                }
                Ok(ParseTree::Node {
                    rule: *rule,
                    children: built,
                })
            }
        }
    }

    fn render_token(&self, token: Token) -> String {
        self.automaton
            .grammar()
            .resolve(token.name())
            .to_string()
    }

    fn unexpected(&self, expected: String) -> WalkError {
        WalkError::UnexpectedToken {
            position: self.pos,
            found: self
                .tokens
                .get(self.pos)
                .map(|t| self.render_token(*t)),
            expected,
        }
    }
}
