//! Chart data structure for Earley parser

use crate::backend::ChartPosition;
use crate::forest::NodeId;
use crate::grammar::{Nonterminal, PreparedGrammar, StateId, Symbol, Token};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// An Earley item: a dotted rule, where it started, and the forest node
/// covering the part of the rule already recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EarleyItem {
    pub state: StateId,
    pub origin: usize,
    /// `None` while the dot is at the start of the rule.
    pub node: Option<NodeId>,
}

impl EarleyItem {
    pub(crate) const fn new(state: StateId, origin: usize, node: Option<NodeId>) -> Self {
        Self {
            state,
            origin,
            node,
        }
    }
}

/// The items of one input position.
///
/// Items waiting on a terminal are kept apart for the scanner; items
/// waiting on a nonterminal are indexed by that nonterminal for the
/// completer.
#[derive(Debug, Default)]
pub(crate) struct ChartSet {
    items: Vec<EarleyItem>,
    seen: HashSet<EarleyItem, ahash::RandomState>,
    scans: Vec<EarleyItem>,
    waiting: HashMap<Nonterminal, SmallVec<[EarleyItem; 4]>, ahash::RandomState>,
    predicted: HashSet<Nonterminal, ahash::RandomState>,
}

impl ChartSet {
    /// Add an item; returns true if it was new.
    pub(crate) fn add<T: Token>(&mut self, grammar: &PreparedGrammar<T>, item: EarleyItem) -> bool {
        if !self.seen.insert(item) {
            return false;
        }
        self.items.push(item);
        match grammar.state(item.state).next {
            Some(Symbol::Terminal(_)) => self.scans.push(item),
            Some(Symbol::Nonterminal(nt)) => self.waiting.entry(nt).or_default().push(item),
            None => {}
        }
        true
    }

    /// The item at `index` in insertion order.
    pub(crate) fn get(&self, index: usize) -> Option<EarleyItem> {
        self.items.get(index).copied()
    }

    /// Items whose next symbol is `nt`.
    pub(crate) fn waiting_on(&self, nt: Nonterminal) -> SmallVec<[EarleyItem; 4]> {
        self.waiting.get(&nt).cloned().unwrap_or_default()
    }

    /// Mark `nt` as predicted here; returns true the first time.
    pub(crate) fn predict(&mut self, nt: Nonterminal) -> bool {
        self.predicted.insert(nt)
    }

    pub(crate) fn scans(&self) -> &[EarleyItem] {
        &self.scans
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot with absolute positions.
    pub(crate) fn snapshot(&self, position: usize, offset: usize) -> ChartPosition {
        ChartPosition {
            position: position + offset,
            items: self
                .items
                .iter()
                .map(|item| (item.state, item.origin + offset))
                .collect(),
        }
    }
}

/// One [`ChartSet`] per input position, including the end of input.
#[derive(Debug)]
pub(crate) struct EarleyChart {
    sets: Vec<ChartSet>,
}

impl EarleyChart {
    pub(crate) fn new(input_len: usize) -> Self {
        let mut sets = Vec::with_capacity(input_len + 1);
        sets.resize_with(input_len + 1, ChartSet::default);
        Self { sets }
    }

    pub(crate) fn set(&self, position: usize) -> &ChartSet {
        &self.sets[position]
    }

    pub(crate) fn set_mut(&mut self, position: usize) -> &mut ChartSet {
        &mut self.sets[position]
    }

    pub(crate) fn snapshot(&self, offset: usize) -> Vec<ChartPosition> {
        self.sets
            .iter()
            .enumerate()
            .map(|(position, set)| set.snapshot(position, offset))
            .collect()
    }
}
