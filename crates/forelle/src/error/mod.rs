//! # Error Types
//!
//! Error types for grammar construction and automaton generation.
//!
//! ## Overview
//!
//! - [`GrammarError`]: violations of the input contract detected while
//!   building a [`Grammar`](crate::grammar::Grammar)
//! - [`InvariantError`]: internal consistency failures in the engine. These
//!   indicate a bug in the engine, never a problem with the input grammar,
//!   and generation aborts when one surfaces.
//! - [`GenerateError`]: the outcome of a failed generation run, either a
//!   non-empty list of human-readable ambiguity diagnostics or a fatal
//!   invariant violation.
//!
//! When the `diagnostics` feature is enabled, errors integrate with
//! [`miette`] for rich reporting.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Errors raised while building or validating a grammar.
///
/// The generation engine expects an already-normalized rule set; these errors
/// reject inputs that violate that contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("symbol '{name}' is used both as a token and as a non-terminal")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::symbol_kind_conflict)))]
    SymbolKindConflict { name: String },

    #[error("non-terminal '{name}' has no producing rule")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_non_terminal)))]
    UndefinedNonTerminal { name: String },

    #[error("degenerate rule '{name} -> {name}' is not allowed")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::degenerate_rule)))]
    DegenerateRule { name: String },

    #[error("left recursion must be rewritten before generation: {}", cycle.join(" -> "))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::left_recursion)))]
    LeftRecursion { cycle: Vec<String> },

    #[error("no start symbol was declared")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::no_start_symbol)))]
    NoStartSymbol,

    #[error("start symbol '{name}' has no producing rule")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unknown_start_symbol)))]
    UnknownStartSymbol { name: String },
}

/// Internal consistency failures.
///
/// Asserted throughout the potential-parse-node operations and the
/// generator. They are fatal: generation never recovers from one, because it
/// means the engine itself is in an invalid state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum InvariantError {
    #[error("node has no cursor")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(engine::no_cursor)))]
    NoCursor,

    #[error("cursor is already trailing at the outermost level")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(engine::cursor_trailing)))]
    CursorAlreadyTrailing,

    #[error("cursor index {index} is out of range for a node with {leaves} leaves")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(engine::cursor_out_of_range)))]
    CursorOutOfRange { index: usize, leaves: usize },

    #[error("no leaf under a trailing cursor")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(engine::no_leaf_at_cursor)))]
    NoLeafAtCursor,

    #[error("engine state is inconsistent: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(engine::corrupt_state)))]
    CorruptState(String),
}

/// The failure outcome of a generation run.
///
/// Generation either fully succeeds with a closed automaton or fails with a
/// non-empty, sorted list of diagnostics; it never returns a partial result.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GenerateError {
    /// One or more decision points could not be resolved. Each entry renders
    /// the competing partial parse trees with the cursor shown inline.
    #[error("grammar could not be resolved:\n{}", errors.join("\n"))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(generate::unresolved)))]
    Unresolved { errors: Vec<String> },

    /// An internal consistency check failed; this is a bug in the engine.
    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

impl GenerateError {
    /// The diagnostic strings for an [`GenerateError::Unresolved`] failure.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Unresolved { errors } => errors,
            Self::Invariant(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_error_display() {
        let err = GrammarError::LeftRecursion {
            cycle: vec!["Exp".to_string(), "Term".to_string(), "Exp".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "left recursion must be rewritten before generation: Exp -> Term -> Exp"
        );
    }

    #[test]
    fn invariant_error_display() {
        let err = InvariantError::CursorOutOfRange { index: 4, leaves: 2 };
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn generate_error_collects_messages() {
        let err = GenerateError::Unresolved {
            errors: vec!["ambiguous decision".to_string()],
        };
        assert_eq!(err.messages().len(), 1);
        assert!(err.to_string().contains("ambiguous decision"));
    }
}
