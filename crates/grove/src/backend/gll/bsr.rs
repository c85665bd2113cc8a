//! Binary subtree representation
//!
//! A BSR element `(slot, i, k, j)` says that the part of a rule before
//! `slot` derives `i..j`, split at pivot `k`: everything before the last
//! symbol covers `i..k` and the last symbol covers `k..j`. Elements for a
//! slot right after the first symbol of an incomplete rule add nothing and
//! are not stored.
//!
//! [`BsrSet::into_forest`] rebuilds the same packed forest the Earley
//! recognizer would have built, by expanding nodes top-down from the root.

use crate::forest::{Family, NodeId, NodeLabel, ParseForest};
use crate::grammar::{PreparedGrammar, StateId, Symbol, Token};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct BsrSet {
    pivots: HashMap<(StateId, usize, usize), SmallVec<[usize; 2]>, ahash::RandomState>,
    seen: HashSet<(StateId, usize, usize, usize), ahash::RandomState>,
}

impl BsrSet {
    pub(crate) fn add<T: Token>(
        &mut self,
        grammar: &PreparedGrammar<T>,
        slot: StateId,
        i: usize,
        k: usize,
        j: usize,
    ) {
        let state = grammar.state(slot);
        if state.dot == 1 && !state.is_complete() {
            return;
        }
        if self.seen.insert((slot, i, k, j)) {
            self.pivots.entry((slot, i, j)).or_default().push(k);
        }
    }

    /// Pivots recorded for `slot` over `i..j`.
    pub(crate) fn pivots(&self, slot: StateId, i: usize, j: usize) -> &[usize] {
        self.pivots.get(&(slot, i, j)).map_or(&[], |pivots| pivots.as_slice())
    }

    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }

    /// Build the forest of derivations of the start symbol over `0..end`.
    pub(crate) fn into_forest<T: Token>(
        self,
        grammar: &Arc<PreparedGrammar<T>>,
        end: usize,
        offset: usize,
    ) -> (ParseForest<T>, NodeId) {
        let mut extraction = Extraction {
            grammar: grammar.as_ref(),
            bsr: &self,
            forest: ParseForest::new(Arc::clone(grammar), offset),
            pending: Vec::new(),
        };
        let start = NodeLabel::Symbol(Symbol::Nonterminal(grammar.start()));
        let root = extraction.child(start, 0, end);
        while let Some(node) = extraction.pending.pop() {
            extraction.expand(node);
        }
        (extraction.forest, root)
    }
}

struct Extraction<'a, T: Token> {
    grammar: &'a PreparedGrammar<T>,
    bsr: &'a BsrSet,
    forest: ParseForest<T>,
    pending: Vec<NodeId>,
}

impl<T: Token> Extraction<'_, T> {
    fn expand(&mut self, node: NodeId) {
        let grammar = self.grammar;
        let bsr = self.bsr;
        let current = self.forest.node(node);
        let (left, right) = current.extent();
        match current.label() {
            NodeLabel::Symbol(Symbol::Nonterminal(nt)) => {
                for &rule in grammar.rules_for(nt) {
                    let completed = grammar.states().completed(rule, grammar.rule(rule).len());
                    for &pivot in bsr.pivots(completed, left, right) {
                        self.pack(node, completed, left, pivot, right);
                    }
                }
            }
            NodeLabel::State(slot) => {
                for &pivot in bsr.pivots(slot, left, right) {
                    self.pack(node, slot, left, pivot, right);
                }
            }
            NodeLabel::Symbol(Symbol::Terminal(_)) => {}
        }
    }

    /// Add the family of `(slot, i, k, j)` to `parent`.
    fn pack(&mut self, parent: NodeId, slot: StateId, i: usize, k: usize, j: usize) {
        let grammar = self.grammar;
        let state = grammar.state(slot);
        let Some(last) = state.previous else {
            self.forest.add_family(parent, Family::epsilon());
            return;
        };
        let right = self.child(NodeLabel::Symbol(last), k, j);
        let family = match state.dot {
            1 => Family::unary(right),
            2 => {
                let first = grammar.rule(state.rule).rhs[0];
                Family::binary(self.child(NodeLabel::Symbol(first), i, k), right)
            }
            _ => match grammar.states().retreat(slot) {
                Some(before) => Family::binary(self.child(NodeLabel::State(before), i, k), right),
                None => Family::unary(right),
            },
        };
        self.forest.add_family(parent, family);
    }

    fn child(&mut self, label: NodeLabel, left: usize, right: usize) -> NodeId {
        let (node, fresh) = self.forest.intern_node_fresh(label, left, right);
        if fresh && !matches!(label, NodeLabel::Symbol(Symbol::Terminal(_))) {
            self.pending.push(node);
        }
        node
    }
}
