//! Tree construction callbacks

use crate::forest::Span;
use crate::grammar::{Attributes, Token};
use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt;

/// Receives one parse tree as a sequence of events.
///
/// Every tree is bracketed by [`start_tree`](Self::start_tree) and
/// [`end_tree`](Self::end_tree). Nonterminals open and close around their
/// children; terminals arrive as [`token`](Self::token) with the atoms they
/// consumed (several for greedy terminals). Spans are absolute input
/// positions.
pub trait TreeBuilder<T: Token> {
    fn start_tree(&mut self, ambiguous: bool, infinitely_ambiguous: bool);

    fn end_tree(&mut self, made_ambiguous_choice: bool);

    fn start_nonterminal(&mut self, name: &str, attributes: &Attributes, span: Span);

    fn end_nonterminal(&mut self, name: &str, attributes: &Attributes, span: Span);

    fn token(&mut self, tokens: &[T], attributes: &Attributes, span: Span);
}

/// A concrete parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree<T: Token> {
    Nonterminal {
        name: CompactString,
        attributes: Attributes,
        span: Span,
        children: Vec<ParseTree<T>>,
    },
    Token {
        tokens: SmallVec<[T; 1]>,
        attributes: Attributes,
        span: Span,
    },
}

impl<T: Token> ParseTree<T> {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Nonterminal { span, .. } | Self::Token { span, .. } => *span,
        }
    }

    /// Name of a nonterminal node.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Nonterminal { name, .. } => Some(name),
            Self::Token { .. } => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[ParseTree<T>] {
        match self {
            Self::Nonterminal { children, .. } => children,
            Self::Token { .. } => &[],
        }
    }

    /// The atoms covered by the tree, left to right.
    #[must_use]
    pub fn yield_tokens(&self) -> Vec<T> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens(&self, out: &mut Vec<T>) {
        match self {
            Self::Nonterminal { children, .. } => {
                for child in children {
                    child.collect_tokens(out);
                }
            }
            Self::Token { tokens, .. } => out.extend(tokens.iter().cloned()),
        }
    }
}

/// Bracketed rendering: `expr('x' letter('a'))`.
impl<T: Token> fmt::Display for ParseTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nonterminal { name, children, .. } => {
                write!(f, "{name}(")?;
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            Self::Token { tokens, .. } if tokens.len() == 1 => write!(f, "{:?}", tokens[0]),
            Self::Token { tokens, .. } => write!(f, "{:?}", tokens.as_slice()),
        }
    }
}

/// Flags reported around one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeInfo {
    pub ambiguous: bool,
    pub infinitely_ambiguous: bool,
    pub made_ambiguous_choice: bool,
}

struct OpenNode<T: Token> {
    name: CompactString,
    attributes: Attributes,
    span: Span,
    children: Vec<ParseTree<T>>,
}

/// Builds [`ParseTree`] values, one per tree walked.
pub struct ParseTreeBuilder<T: Token> {
    open: Vec<OpenNode<T>>,
    roots: Vec<ParseTree<T>>,
    pending: TreeInfo,
    trees: Vec<(ParseTree<T>, TreeInfo)>,
}

impl<T: Token> Default for ParseTreeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> ParseTreeBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: Vec::new(),
            roots: Vec::new(),
            pending: TreeInfo::default(),
            trees: Vec::new(),
        }
    }

    /// Trees built so far with their flags.
    #[must_use]
    pub fn trees(&self) -> &[(ParseTree<T>, TreeInfo)] {
        &self.trees
    }

    #[must_use]
    pub fn last(&self) -> Option<&ParseTree<T>> {
        self.trees.last().map(|(tree, _)| tree)
    }

    #[must_use]
    pub fn into_trees(self) -> Vec<ParseTree<T>> {
        self.trees.into_iter().map(|(tree, _)| tree).collect()
    }

    fn attach(&mut self, tree: ParseTree<T>) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(tree),
            None => self.roots.push(tree),
        }
    }
}

impl<T: Token> TreeBuilder<T> for ParseTreeBuilder<T> {
    fn start_tree(&mut self, ambiguous: bool, infinitely_ambiguous: bool) {
        self.open.clear();
        self.roots.clear();
        self.pending = TreeInfo {
            ambiguous,
            infinitely_ambiguous,
            made_ambiguous_choice: false,
        };
    }

    fn end_tree(&mut self, made_ambiguous_choice: bool) {
        self.pending.made_ambiguous_choice = made_ambiguous_choice;
        let mut roots = std::mem::take(&mut self.roots);
        if roots.len() == 1 {
            if let Some(root) = roots.pop() {
                self.trees.push((root, self.pending));
            }
        } else if !roots.is_empty() {
            let start = roots.first().map_or(0, |tree| tree.span().start);
            let end = roots.last().map_or(0, |tree| tree.span().end);
            let root = ParseTree::Nonterminal {
                name: CompactString::const_new(""),
                attributes: Attributes::new(),
                span: Span::new(start, end),
                children: roots,
            };
            self.trees.push((root, self.pending));
        }
    }

    fn start_nonterminal(&mut self, name: &str, attributes: &Attributes, span: Span) {
        self.open.push(OpenNode {
            name: name.into(),
            attributes: attributes.clone(),
            span,
            children: Vec::new(),
        });
    }

    fn end_nonterminal(&mut self, _name: &str, _attributes: &Attributes, _span: Span) {
        if let Some(node) = self.open.pop() {
            self.attach(ParseTree::Nonterminal {
                name: node.name,
                attributes: node.attributes,
                span: node.span,
                children: node.children,
            });
        }
    }

    fn token(&mut self, tokens: &[T], attributes: &Attributes, span: Span) {
        self.attach(ParseTree::Token {
            tokens: tokens.iter().cloned().collect(),
            attributes: attributes.clone(),
            span,
        });
    }
}

/// Records callbacks as readable lines; handy for debugging and tests.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    pub events: Vec<String>,
}

impl EventRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Token> TreeBuilder<T> for EventRecorder {
    fn start_tree(&mut self, ambiguous: bool, infinitely_ambiguous: bool) {
        self.events
            .push(format!("start tree ambiguous={ambiguous} infinite={infinitely_ambiguous}"));
    }

    fn end_tree(&mut self, made_ambiguous_choice: bool) {
        self.events
            .push(format!("end tree choice={made_ambiguous_choice}"));
    }

    fn start_nonterminal(&mut self, name: &str, _attributes: &Attributes, span: Span) {
        self.events.push(format!("start {name} {span}"));
    }

    fn end_nonterminal(&mut self, name: &str, _attributes: &Attributes, span: Span) {
        self.events.push(format!("end {name} {span}"));
    }

    fn token(&mut self, tokens: &[T], _attributes: &Attributes, span: Span) {
        self.events.push(format!("token {tokens:?} {span}"));
    }
}
