//! Production rules.

use smallvec::SmallVec;

use crate::grammar::symbol::{Name, NonTerminal, Symbol};

/// Identifies a rule within its grammar.
///
/// The grammar is append-only, so ids stay valid for the lifetime of the
/// grammar even after discriminator rules are synthesized into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Extended rule information beyond the produced symbol and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleInfo {
    /// Right-associativity flag carried through from precedence rewriting.
    pub right_associative: bool,
    /// Which original rule(s) this rule stands in for after rewriting.
    /// Empty means the rule maps to itself.
    pub mapped_rules: Vec<RuleId>,
    /// Parser state variables this rule requires to be set.
    pub required_variables: Vec<Name>,
    /// Parser state variables this rule sets or consumes.
    pub consumed_variables: Vec<Name>,
}

/// An immutable production rule.
///
/// Rules never mutate after insertion into a grammar and are compared
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    produced: NonTerminal,
    symbols: SmallVec<[Symbol; 4]>,
    info: RuleInfo,
}

impl Rule {
    pub(crate) fn new(
        produced: NonTerminal,
        symbols: SmallVec<[Symbol; 4]>,
        info: RuleInfo,
    ) -> Self {
        Self {
            produced,
            symbols,
            info,
        }
    }

    #[must_use]
    pub const fn produced(&self) -> NonTerminal {
        self.produced
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[must_use]
    pub const fn info(&self) -> &RuleInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::{SymbolInterner, Token};

    #[test]
    fn rule_exposes_its_shape() {
        let mut interner = SymbolInterner::new();
        let exp = NonTerminal::new(interner.intern("Exp"), None);
        let plus = Token::new(interner.intern("+"), None);
        let rule = Rule::new(
            exp,
            SmallVec::from_vec(vec![
                Symbol::NonTerminal(exp),
                Symbol::Token(plus),
                Symbol::NonTerminal(exp),
            ]),
            RuleInfo::default(),
        );

        assert_eq!(rule.produced(), exp);
        assert_eq!(rule.len(), 3);
        assert!(!rule.is_empty());
        assert!(rule.symbols()[1].is_token());
        assert!(rule.info().mapped_rules.is_empty());
    }

    #[test]
    fn empty_rule_has_no_symbols() {
        let mut interner = SymbolInterner::new();
        let b = NonTerminal::new(interner.intern("B"), None);
        let rule = Rule::new(b, SmallVec::new(), RuleInfo::default());
        assert!(rule.is_empty());
        assert_eq!(rule.len(), 0);
    }
}
