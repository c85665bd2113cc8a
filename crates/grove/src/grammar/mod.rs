//! # Grammar Module
//!
//! Context-free grammars over an opaque atom type.
//!
//! ## Overview
//!
//! A [`Grammar`] is a list of rules `lhs → symbol*`. Symbols are either
//! [`Nonterminal`]s, interned by name, or terminals built from a
//! [`TerminalSymbol`]. A grammar is *open* while rules are added and becomes
//! *closed* once [`Grammar::close`] expands optional occurrences into plain
//! rules. Recognizers always work on a closed grammar.
//!
//! ## Usage
//!
//! ```
//! use grove::grammar::{Grammar, TerminalSymbol};
//!
//! let mut grammar = Grammar::<char>::new();
//! let expr = grammar.nonterminal("expr");
//! let digit = grammar.terminal(TerminalSymbol::range('0', '9'));
//! let plus = grammar.token('+');
//! grammar.add_rule(expr, [expr.into(), plus, expr.into()])?;
//! grammar.add_rule(expr, [digit])?;
//! grammar.close();
//! assert_eq!(grammar.rules_for(expr).len(), 2);
//! # Ok::<(), grove::GrammarError>(())
//! ```
//!
//! ## Analysis
//!
//! [`GrammarAnalysis`] computes nullability and FIRST/FOLLOW sets, and
//! [`PreparedGrammar`] bundles a closed grammar, a start symbol, the useful
//! rule subset and the interned dotted states shared by both recognizers.

mod analysis;
mod attributes;
mod builder;
mod prepared;
mod state;
mod terminal;

pub use analysis::{GrammarAnalysis, Lookahead};
pub use attributes::{Attributes, PRIORITY, PRUNABLE};
pub use builder::Grammar;
pub use prepared::PreparedGrammar;
pub use state::{State, StateId, StateTable};
pub use terminal::{TerminalSymbol, TokenMatcher};

use lasso::Spur;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::hash::Hash;

/// Input atom accepted by the recognizers.
///
/// Any cheap-to-compare value works: `char`, `u8`, or a lexer's token type.
pub trait Token: Clone + Debug + Eq + Hash + Send + Sync + 'static {}

impl<T> Token for T where T: Clone + Debug + Eq + Hash + Send + Sync + 'static {}

/// An interned nonterminal name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonterminal(Spur);

/// Index of a terminal definition within its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(u32);

impl TerminalId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A grammar symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(TerminalId),
    Nonterminal(Nonterminal),
}

impl Symbol {
    /// Mark an occurrence of this symbol as optional in a rule body.
    #[must_use]
    pub const fn optional(self) -> RhsItem {
        RhsItem {
            symbol: self,
            optional: true,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    #[must_use]
    pub const fn as_nonterminal(self) -> Option<Nonterminal> {
        match self {
            Self::Nonterminal(nt) => Some(nt),
            Self::Terminal(_) => None,
        }
    }

    #[must_use]
    pub const fn as_terminal(self) -> Option<TerminalId> {
        match self {
            Self::Terminal(id) => Some(id),
            Self::Nonterminal(_) => None,
        }
    }
}

impl Nonterminal {
    /// Mark an occurrence of this nonterminal as optional in a rule body.
    #[must_use]
    pub const fn optional(self) -> RhsItem {
        Symbol::Nonterminal(self).optional()
    }
}

impl From<Nonterminal> for Symbol {
    fn from(nt: Nonterminal) -> Self {
        Self::Nonterminal(nt)
    }
}

/// One occurrence of a symbol in a rule body as written, before closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RhsItem {
    pub symbol: Symbol,
    pub optional: bool,
}

impl From<Symbol> for RhsItem {
    fn from(symbol: Symbol) -> Self {
        Self {
            symbol,
            optional: false,
        }
    }
}

impl From<Nonterminal> for RhsItem {
    fn from(nt: Nonterminal) -> Self {
        Symbol::Nonterminal(nt).into()
    }
}

/// Index of a rule in a closed grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A production rule of a closed grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub lhs: Nonterminal,
    pub rhs: SmallVec<[Symbol; 4]>,
}

impl Rule {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rhs.len()
    }
}
