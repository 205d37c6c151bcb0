//! Interned grammar symbols.
//!
//! Symbols are identity-compared atoms: a [`Token`] is a terminal, a
//! [`NonTerminal`] may carry a [`SyntheticKind`] tagging it as a start
//! marker, an end-of-input marker, or a discriminator invented by the
//! generator. Names are interned through [`lasso`] so symbol comparison and
//! hashing never touch string contents.

use std::cmp::Ordering;
use std::fmt;

use lasso::{Key, Rodeo, Spur};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interned symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Name(Spur);

impl Name {
    /// Resolve this name against the interner that created it.
    #[must_use]
    pub fn resolve<'a>(&self, interner: &'a SymbolInterner) -> &'a str {
        interner.resolve(*self)
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.into_usize().cmp(&other.0.into_usize())
    }
}

/// How a synthetic non-terminal (or end marker) came to exist.
///
/// User-authored symbols carry no synthetic kind. Discriminators are invented
/// by the generator purely to decide between ambiguous continuations and are
/// never part of the grammar's semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SyntheticKind {
    /// The augmented start marker `Start<S>`.
    Start,
    /// The end-of-input marker `End<S>`.
    End,
    /// A generated lookahead discriminator.
    Discriminator,
}

/// A terminal symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    name: Name,
    synthetic: Option<SyntheticKind>,
}

impl Token {
    pub(crate) const fn new(name: Name, synthetic: Option<SyntheticKind>) -> Self {
        Self { name, synthetic }
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        self.name
    }

    /// Whether this token is the synthetic end-of-input marker.
    #[must_use]
    pub const fn is_end_marker(&self) -> bool {
        matches!(self.synthetic, Some(SyntheticKind::End))
    }
}

/// A non-terminal symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NonTerminal {
    name: Name,
    synthetic: Option<SyntheticKind>,
}

impl NonTerminal {
    pub(crate) const fn new(name: Name, synthetic: Option<SyntheticKind>) -> Self {
        Self { name, synthetic }
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        self.name
    }

    #[must_use]
    pub const fn synthetic(&self) -> Option<SyntheticKind> {
        self.synthetic
    }

    /// Whether this non-terminal is a generated discriminator.
    #[must_use]
    pub const fn is_discriminator(&self) -> bool {
        matches!(self.synthetic, Some(SyntheticKind::Discriminator))
    }

    /// Whether this non-terminal is the augmented start marker of a start
    /// symbol.
    #[must_use]
    pub const fn is_start_marker(&self) -> bool {
        matches!(self.synthetic, Some(SyntheticKind::Start))
    }
}

/// A grammar symbol: either a terminal or a non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Symbol {
    Token(Token),
    NonTerminal(NonTerminal),
}

impl Symbol {
    #[must_use]
    pub const fn name(&self) -> Name {
        match self {
            Self::Token(t) => t.name,
            Self::NonTerminal(n) => n.name,
        }
    }

    #[must_use]
    pub const fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    #[must_use]
    pub const fn as_token(&self) -> Option<Token> {
        match self {
            Self::Token(t) => Some(*t),
            Self::NonTerminal(_) => None,
        }
    }

    #[must_use]
    pub const fn as_non_terminal(&self) -> Option<NonTerminal> {
        match self {
            Self::Token(_) => None,
            Self::NonTerminal(n) => Some(*n),
        }
    }
}

impl From<Token> for Symbol {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<NonTerminal> for Symbol {
    fn from(nt: NonTerminal) -> Self {
        Self::NonTerminal(nt)
    }
}

/// Interner for symbol names.
pub struct SymbolInterner {
    rodeo: Rodeo,
}

impl SymbolInterner {
    #[must_use]
    pub fn new() -> Self {
        Self { rodeo: Rodeo::new() }
    }

    /// Intern a name, returning the existing key if it was seen before.
    pub fn intern(&mut self, s: &str) -> Name {
        Name(self.rodeo.get_or_intern(s))
    }

    /// Look up the key for an already-interned name.
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Name> {
        self.rodeo.get(s).map(Name)
    }

    /// Resolve a name to its string content.
    ///
    /// # Panics
    ///
    /// Panics if the name was not created by this interner.
    #[must_use]
    pub fn resolve(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for SymbolInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolInterner")
            .field("len", &self.rodeo.len())
            .finish()
    }
}
