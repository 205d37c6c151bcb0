//! # Grammar Model
//!
//! Validated context-free grammars and the derived set computations the
//! generation engine consumes.
//!
//! ## Overview
//!
//! - [`symbol`]: interned tokens, non-terminals, and synthetic markers
//! - [`rule`]: immutable production rules
//! - [`builder`]: the [`GrammarBuilder`] enforcing the engine's input
//!   contract, and the append-only [`Grammar`] container
//! - [`sets`]: nullable/FIRST/FOLLOW fixpoints over a built grammar

pub mod builder;
pub mod rule;
pub mod sets;
pub mod symbol;

pub use builder::{nt, t, Grammar, GrammarBuilder, StartSymbol, SymbolSpec};
pub use rule::{Rule, RuleId, RuleInfo};
pub use sets::FirstFollow;
pub use symbol::{Name, NonTerminal, Symbol, SymbolInterner, SyntheticKind, Token};
