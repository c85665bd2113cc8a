//! # Error Types
//!
//! Errors reported by grammar construction and by misuse of the parsing API.
//!
//! ## Overview
//!
//! Two kinds of failure are modelled as Rust errors:
//!
//! - [`GrammarError`]: the grammar cannot be built or prepared for parsing
//!   (undefined start symbol, mutation after closing, conflicting attributes)
//! - [`UsageError`]: the API was driven in an order it does not support
//!   (advancing a completed state, continuing a parse that had no successful
//!   prefix, walking trees that were never selected or no longer exist)
//!
//! A parse that does not match its input is *not* an error. Recognizers
//! always return a [`ParseResult`](crate::backend::ParseResult) and record
//! the outcome there.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! and carry stable diagnostic codes.

use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Errors raised while building a grammar or preparing it for a recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    /// The requested start symbol has no rules.
    #[error("start symbol `{name}` is not defined by any rule")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::undefined_start),
            help("add at least one rule for the start symbol")
        )
    )]
    UndefinedStart { name: CompactString },

    /// Rules cannot be added once the grammar has been closed.
    #[error("cannot add a rule for `{lhs}`: the grammar is closed")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::closed)))]
    ClosedGrammar { lhs: CompactString },

    /// Attributes are write-once; a different value was supplied for an existing name.
    #[error("attribute `{name}` of `{symbol}` is already `{existing}`, cannot change it to `{attempted}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::attribute_conflict)))]
    AttributeConflict {
        symbol: CompactString,
        name: CompactString,
        existing: CompactString,
        attempted: CompactString,
    },
}

/// Errors caused by calling the API out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum UsageError {
    /// A completed state has no symbol to advance over.
    #[error("cannot advance a completed state")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(usage::completed_state)))]
    CompletedState,

    /// Continuation requires a result whose prefix was accepted.
    #[error("cannot continue: the parse did not succeed on a prefix of the input")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(usage::no_prefix)))]
    NoPrefix,

    /// Replaying requires a tree to have been produced first.
    #[error("no tree has been selected yet")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(usage::no_tree_selected), help("call `next_tree` first"))
    )]
    NoTreeSelected,

    /// Every tree of the forest has already been produced.
    #[error("no more trees are available")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(usage::no_more_trees), help("check `has_more_trees` or call `reset`"))
    )]
    NoMoreTrees,
}
