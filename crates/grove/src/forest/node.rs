//! Forest nodes and families

use crate::grammar::{StateId, Symbol};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Index of a node in its forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Half-open range of input positions `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// What a node stands for: a grammar symbol, or a partially recognized
/// rule (an intermediate node labelled by its dotted state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    Symbol(Symbol),
    State(StateId),
}

impl NodeLabel {
    #[must_use]
    pub const fn symbol(self) -> Option<Symbol> {
        match self {
            Self::Symbol(symbol) => Some(symbol),
            Self::State(_) => None,
        }
    }

    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        matches!(self, Self::State(_))
    }
}

/// One way of deriving a node: no child, one child `v`, or children `w`
/// and `v` split at a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Family {
    pub(crate) w: Option<NodeId>,
    pub(crate) v: Option<NodeId>,
}

impl Family {
    /// The family of an empty derivation.
    #[must_use]
    pub const fn epsilon() -> Self {
        Self { w: None, v: None }
    }

    #[must_use]
    pub const fn unary(v: NodeId) -> Self {
        Self { w: None, v: Some(v) }
    }

    #[must_use]
    pub const fn binary(w: NodeId, v: NodeId) -> Self {
        Self {
            w: Some(w),
            v: Some(v),
        }
    }

    /// Left child of a binary family.
    #[must_use]
    pub const fn left(&self) -> Option<NodeId> {
        self.w
    }

    /// Right (or only) child.
    #[must_use]
    pub const fn right(&self) -> Option<NodeId> {
        self.v
    }

    #[must_use]
    pub const fn is_epsilon(&self) -> bool {
        self.w.is_none() && self.v.is_none()
    }

    /// Children in left-to-right order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        self.w.into_iter().chain(self.v)
    }
}

/// A node of the shared packed parse forest.
#[derive(Debug, Clone)]
pub struct ForestNode {
    pub(crate) label: NodeLabel,
    pub(crate) left: usize,
    pub(crate) right: usize,
    pub(crate) families: SmallVec<[Family; 2]>,
}

impl ForestNode {
    pub(crate) fn new(label: NodeLabel, left: usize, right: usize) -> Self {
        debug_assert!(left <= right);
        Self {
            label,
            left,
            right,
            families: SmallVec::new(),
        }
    }

    #[must_use]
    pub const fn label(&self) -> NodeLabel {
        self.label
    }

    /// Extent relative to the start of the parse.
    #[must_use]
    pub const fn extent(&self) -> (usize, usize) {
        (self.left, self.right)
    }

    #[must_use]
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Whether the node has more than one family.
    #[must_use]
    pub fn has_alternatives(&self) -> bool {
        self.families.len() > 1
    }

    /// Whether the node covers no input.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.left == self.right
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.label, NodeLabel::Symbol(Symbol::Terminal(_)))
    }
}
