//! # Grove
//!
//! General context-free parsing with shared packed parse forests.
//!
//! ## Overview
//!
//! Grove accepts any context-free grammar, including ambiguous,
//! left-recursive and cyclic ones, and returns every derivation of the
//! input as one compact forest. It provides:
//!
//! - **Grammars**: rules over interned nonterminals and terminal
//!   definitions that match input atoms, with optional items and
//!   per-symbol attributes
//! - **Two recognizers**: an Earley chart parser and a GLL parser, both
//!   building the same [`ParseForest`]
//! - **Forest analysis**: ambiguity and infinite-ambiguity detection plus
//!   exact parse counts of any size
//! - **Tree extraction**: a [`ForestWalker`] that enumerates trees one at a
//!   time, with pluggable tie-breaking
//! - **Prefix parsing**: when a parse fails, the longest accepted prefix can
//!   be returned and parsing resumed after it
//!
//! ## Quick Start
//!
//! ```
//! use grove::backend::earley::{EarleyConfig, EarleyParser};
//! use grove::backend::Recognizer;
//! use grove::grammar::{Grammar, TerminalSymbol};
//! use grove::walker::ParseTreeBuilder;
//!
//! // E → E '+' E | digit
//! let mut grammar = Grammar::<char>::new();
//! let e = grammar.nonterminal("E");
//! let plus = grammar.token('+');
//! let digit = grammar.terminal(TerminalSymbol::range('0', '9'));
//! grammar.add_rule(e, [e.into(), plus, e.into()])?;
//! grammar.add_rule(e, [digit])?;
//!
//! let mut parser = EarleyParser::new(&grammar, e, EarleyConfig::default())?;
//! let input: Vec<char> = "1+2+3".chars().collect();
//! let result = parser.parse(&input);
//! assert!(result.succeeded());
//!
//! let forest = result.forest().expect("accepted parses have a forest");
//! assert!(forest.is_ambiguous());
//! assert_eq!(forest.total_parses(), 2);
//!
//! let mut walker = forest.walker();
//! let mut builder = ParseTreeBuilder::new();
//! while walker.has_more_trees() {
//!     walker.next_tree(&mut builder)?;
//! }
//! assert_eq!(builder.trees().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! A parse that does not accept its input is an ordinary [`ParseResult`].
//! Only malformed grammars ([`GrammarError`]) and misuse of the API
//! ([`UsageError`]) are reported as errors.

pub mod backend;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod walker;

// Re-export commonly used types
pub use backend::earley::{EarleyConfig, EarleyParser};
pub use backend::gll::{GllConfig, GllParser};
pub use backend::{ParseResult, Recognizer};
pub use error::{GrammarError, UsageError};
pub use forest::{NodeId, NodeLabel, ParseForest, Span};
pub use grammar::{Grammar, Nonterminal, Symbol, TerminalSymbol, Token};
pub use walker::{ForestWalker, ParseTree, ParseTreeBuilder, TreeBuilder, TreeSelector};
