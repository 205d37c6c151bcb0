//! # Forelle
//!
//! A parser-generator core: given a context-free grammar (possibly
//! ambiguous), Forelle synthesizes a deterministic top-down parsing
//! automaton, resolving conflicts that plain LL(1) cannot handle by
//! synthesizing bounded-lookahead discriminator sub-grammars and by
//! recognizing common prefixes, instead of rejecting the grammar outright.
//!
//! ## Overview
//!
//! - [`grammar`]: validated grammars, interned symbols, FIRST/FOLLOW sets
//! - [`node`]: hash-consed potential parse nodes with a consumption cursor
//! - [`engine`]: the memoized decision procedure, discriminator synthesis,
//!   and the final switch-linking pass
//! - [`automaton`]: the frozen context-to-action map
//! - [`testing`]: a reference interpreter that walks an automaton over
//!   token sequences
//! - [`error`]: grammar, invariant, and generation errors
//!
//! ## Example
//!
//! ```
//! use forelle::{generate, GenerateOptions, Grammar, NoResolution};
//! use forelle::grammar::{nt, t};
//! use forelle::testing::{parse, token_sequence};
//!
//! let grammar = Grammar::builder()
//!     .rule("List", [t("Id")])
//!     .rule("List", [t("Id"), t(","), nt("List")])
//!     .start_symbol("List")
//!     .build()
//!     .expect("valid grammar");
//!
//! let automaton = generate(grammar, &NoResolution, GenerateOptions::default())
//!     .expect("deterministic automaton");
//! let grammar = automaton.grammar();
//! let list = grammar.non_terminal("List").expect("known symbol");
//! let input = token_sequence(grammar, &["Id", ",", "Id"]).expect("known tokens");
//!
//! let tree = parse(&automaton, list, &input).expect("input accepted");
//! assert_eq!(tree.render(grammar), "List(Id , List(Id))");
//! ```

pub mod automaton;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod node;
pub mod testing;

pub use automaton::DecisionAutomaton;
pub use engine::{
    generate, AmbiguityResolver, DecisionAction, GenerateOptions, NoResolution, PreferredRules,
};
pub use error::{GenerateError, GrammarError, InvariantError};
pub use grammar::{Grammar, GrammarBuilder};
