//! Terminal symbols
//!
//! A terminal matches input atoms. Atoms are opaque: the engine only asks a
//! terminal whether it accepts the atom at a position. Greedy terminals
//! consume the longest run of accepted atoms as a single leaf.

use crate::grammar::Token;
use compact_str::{format_compact, CompactString};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// How a terminal decides whether it accepts an atom.
#[derive(Clone)]
pub enum TokenMatcher<T: Token> {
    /// Exactly this atom.
    Exact(T),
    /// Any of the listed atoms.
    OneOf(SmallVec<[T; 4]>),
    /// Any atom satisfying the predicate.
    Predicate(Predicate<T>),
    /// Every atom.
    Any,
}

impl<T: Token> TokenMatcher<T> {
    /// Whether the atom is accepted.
    pub fn matches(&self, atom: &T) -> bool {
        match self {
            Self::Exact(token) => token == atom,
            Self::OneOf(tokens) => tokens.contains(atom),
            Self::Predicate(predicate) => predicate(atom),
            Self::Any => true,
        }
    }
}

impl<T: Token> fmt::Debug for TokenMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(token) => f.debug_tuple("Exact").field(token).finish(),
            Self::OneOf(tokens) => f.debug_tuple("OneOf").field(tokens).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Any => f.write_str("Any"),
        }
    }
}

/// A terminal symbol definition.
///
/// ```
/// use grove::grammar::TerminalSymbol;
///
/// let digit = TerminalSymbol::<char>::range('0', '9').greedy();
/// assert_eq!(digit.match_len(&['1', '2', 'x'], 0), 2);
/// assert_eq!(digit.match_len(&['1', '2', 'x'], 2), 0);
/// ```
#[derive(Clone, Debug)]
pub struct TerminalSymbol<T: Token> {
    name: CompactString,
    matcher: TokenMatcher<T>,
    greedy: bool,
}

impl<T: Token> TerminalSymbol<T> {
    /// A terminal matching exactly `token`, named after its debug form.
    pub fn token(token: T) -> Self {
        Self {
            name: format_compact!("{token:?}"),
            matcher: TokenMatcher::Exact(token),
            greedy: false,
        }
    }

    /// A terminal matching any of `tokens`.
    pub fn one_of(name: impl Into<CompactString>, tokens: impl IntoIterator<Item = T>) -> Self {
        Self {
            name: name.into(),
            matcher: TokenMatcher::OneOf(tokens.into_iter().collect()),
            greedy: false,
        }
    }

    /// A terminal matching every atom for which `predicate` holds.
    pub fn predicate<F>(name: impl Into<CompactString>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            matcher: TokenMatcher::Predicate(Arc::new(predicate)),
            greedy: false,
        }
    }

    /// A terminal matching any single atom.
    pub fn any() -> Self {
        Self {
            name: CompactString::const_new("$any"),
            matcher: TokenMatcher::Any,
            greedy: false,
        }
    }

    /// Consume the longest run of matching atoms instead of a single atom.
    #[must_use]
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Rename the terminal. Names are used for display only.
    #[must_use]
    pub fn named(mut self, name: impl Into<CompactString>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &TokenMatcher<T> {
        &self.matcher
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// Whether the single atom is accepted.
    pub fn matches(&self, atom: &T) -> bool {
        self.matcher.matches(atom)
    }

    /// Number of atoms consumed at `position`; zero means no match.
    pub fn match_len(&self, input: &[T], position: usize) -> usize {
        let Some(first) = input.get(position) else {
            return 0;
        };
        if !self.matcher.matches(first) {
            return 0;
        }
        if !self.greedy {
            return 1;
        }
        1 + input[position + 1..]
            .iter()
            .take_while(|atom| self.matcher.matches(atom))
            .count()
    }

    /// Whether two definitions always match the same atoms the same way.
    pub(crate) fn same_definition(&self, other: &Self) -> bool {
        self.greedy == other.greedy
            && match (&self.matcher, &other.matcher) {
                (TokenMatcher::Exact(a), TokenMatcher::Exact(b)) => a == b,
                (TokenMatcher::OneOf(a), TokenMatcher::OneOf(b)) => a == b && self.name == other.name,
                (TokenMatcher::Any, TokenMatcher::Any) => true,
                _ => false,
            }
    }
}

impl TerminalSymbol<char> {
    /// A terminal matching characters in `lo..=hi`, named `[lo-hi]`.
    pub fn range(lo: char, hi: char) -> Self {
        Self::predicate(format_compact!("[{lo}-{hi}]"), move |c: &char| (lo..=hi).contains(c))
    }

    /// A terminal matching any character of `set`, named `[set]`.
    pub fn chars(set: &str) -> Self {
        Self::one_of(format_compact!("[{set}]"), set.chars())
    }
}
