//! # Generation Engine
//!
//! Everything between a validated grammar and a frozen automaton.
//!
//! ## Overview
//!
//! - [`context`]: interned parsing contexts, the unit of memoization
//! - [`action`]: the actions a solved context maps to
//! - [`generator`]: the memoized decision procedure
//! - [`discriminator`] and [`trie`]: lookahead discriminator synthesis and
//!   reuse
//! - [`path`]: repeated-spine detection for recursive specialization
//! - [`ambiguity`]: the resolver hook for reduce-reduce conflicts
//!
//! The [`resolver`] linking pass is internal; it runs at the end of
//! [`generator::generate`].

pub mod action;
pub mod ambiguity;
pub mod context;
pub mod discriminator;
pub mod generator;
pub mod path;
pub(crate) mod resolver;
pub mod trie;

pub use action::DecisionAction;
pub use ambiguity::{AmbiguityResolver, NoResolution, PreferredRules};
pub use context::{ContextArena, ContextData, ContextId};
pub use discriminator::{DiscriminatorContext, DiscriminatorMode};
pub use generator::{generate, GenerateOptions};
