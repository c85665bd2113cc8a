//! Tie-break policies for ambiguous nodes
//!
//! When a node has several usable families the walker asks a
//! [`TreeSelector`] which one to follow. Selectors see every candidate
//! together with the families already tried at this point of the
//! enumeration, and must return an untried one.

use crate::forest::{NodeId, NodeLabel, Span};
use crate::grammar::{Attributes, Symbol};
use smallvec::SmallVec;

/// A child of a candidate family.
#[derive(Debug, Clone, Copy)]
pub struct ChildView<'a> {
    pub node: NodeId,
    pub label: NodeLabel,
    /// The child's symbol; for an intermediate node, the symbol before its dot.
    pub symbol: Option<Symbol>,
    /// Attributes of `symbol`.
    pub attributes: &'a Attributes,
    pub span: Span,
}

/// A family the walker may follow.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Index of the family within its node.
    pub family: usize,
    pub children: SmallVec<[ChildView<'a>; 2]>,
}

impl Candidate<'_> {
    /// Highest `priority` attribute among the children, 0 when none is set.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.children
            .iter()
            .filter_map(|child| child.attributes.priority())
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_epsilon(&self) -> bool {
        self.children.is_empty()
    }
}

/// The selector's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Position in the candidate slice.
    pub index: usize,
    /// Whether the choice was arbitrary among equally good candidates.
    pub ambiguous_choice: bool,
}

/// Chooses which family of an ambiguous node to follow.
pub trait TreeSelector {
    /// Pick one of `candidates` whose `family` is not in `already_tried`.
    fn select(&mut self, candidates: &[Candidate<'_>], already_tried: &[usize]) -> Selection;

    /// Forget any state; called when the walker is reset.
    fn reset(&mut self) {}
}

fn untried<'c, 'a>(
    candidates: &'c [Candidate<'a>],
    already_tried: &'c [usize],
) -> impl Iterator<Item = (usize, &'c Candidate<'a>)> + 'c {
    candidates
        .iter()
        .enumerate()
        .filter(move |(_, candidate)| !already_tried.contains(&candidate.family))
}

/// Takes families in order. Every choice among several candidates counts
/// as ambiguous.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialSelector;

impl SequentialSelector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TreeSelector for SequentialSelector {
    fn select(&mut self, candidates: &[Candidate<'_>], already_tried: &[usize]) -> Selection {
        let index = untried(candidates, already_tried)
            .map(|(index, _)| index)
            .next()
            .unwrap_or(0);
        Selection {
            index,
            ambiguous_choice: candidates.len() > 1,
        }
    }
}

/// Prefers the family whose children carry the highest `priority`
/// attribute. Only ties count as ambiguous choices.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrioritySelector;

impl PrioritySelector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TreeSelector for PrioritySelector {
    fn select(&mut self, candidates: &[Candidate<'_>], already_tried: &[usize]) -> Selection {
        let mut best: Option<(usize, i64)> = None;
        let mut ties = 0;
        for (index, candidate) in untried(candidates, already_tried) {
            let priority = candidate.priority();
            match best {
                Some((_, current)) if priority < current => {}
                Some((_, current)) if priority == current => ties += 1,
                _ => {
                    best = Some((index, priority));
                    ties = 0;
                }
            }
        }
        Selection {
            index: best.map_or(0, |(index, _)| index),
            ambiguous_choice: ties > 0,
        }
    }
}

/// Takes families in order without reporting ambiguous choices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSelector;

impl NoOpSelector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TreeSelector for NoOpSelector {
    fn select(&mut self, candidates: &[Candidate<'_>], already_tried: &[usize]) -> Selection {
        let index = untried(candidates, already_tried)
            .map(|(index, _)| index)
            .next()
            .unwrap_or(0);
        Selection {
            index,
            ambiguous_choice: false,
        }
    }
}
