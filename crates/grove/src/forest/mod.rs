//! # Parse Forest
//!
//! A shared packed parse forest (SPPF) holding every derivation of a parse.
//!
//! ## Overview
//!
//! Nodes live in an arena addressed by [`NodeId`]. A node is identified by
//! its label and extent; requesting the same `(label, left, right)` twice
//! returns the same node. Each node owns an ordered list of [`Family`]
//! values, one per way of deriving it, and a node with several families is
//! locally ambiguous.
//!
//! Recognizers build the forest, then finish it exactly once:
//!
//! 1. empty derivations are trimmed out of their parents,
//! 2. families are sorted by the identity of their children, so the result
//!    does not depend on which recognizer built the forest,
//! 3. ambiguity, loop families and exact parse counts are recorded,
//! 4. unreachable nodes are dropped and the arena is compacted.
//!
//! After that the forest is read-only. Trees are extracted with a
//! [`ForestWalker`](crate::walker::ForestWalker).

mod node;
mod prune;

pub use node::{Family, ForestNode, NodeId, NodeLabel, Span};

use crate::grammar::{Attributes, PreparedGrammar, StateId, Symbol, Token};
use crate::walker::{ForestWalker, SequentialSelector, TreeSelector};
use hashbrown::HashMap;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use prune::ForestAnalysis;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A shared packed parse forest.
pub struct ParseForest<T: Token> {
    grammar: Arc<PreparedGrammar<T>>,
    nodes: Vec<ForestNode>,
    index: HashMap<(NodeLabel, usize, usize), NodeId, ahash::RandomState>,
    roots: Vec<NodeId>,
    tokens: Vec<T>,
    offset: usize,
    analysis: ForestAnalysis,
}

impl<T: Token> ParseForest<T> {
    pub(crate) fn new(grammar: Arc<PreparedGrammar<T>>, offset: usize) -> Self {
        Self {
            grammar,
            nodes: Vec::new(),
            index: HashMap::default(),
            roots: Vec::new(),
            tokens: Vec::new(),
            offset,
            analysis: ForestAnalysis::default(),
        }
    }

    /// The node for `(label, left, right)`, created on first request.
    pub(crate) fn intern_node(&mut self, label: NodeLabel, left: usize, right: usize) -> NodeId {
        *self.index.entry((label, left, right)).or_insert_with(|| {
            self.nodes.push(ForestNode::new(label, left, right));
            NodeId((self.nodes.len() - 1) as u32)
        })
    }

    /// Like [`intern_node`](Self::intern_node), also reporting whether the node is new.
    pub(crate) fn intern_node_fresh(
        &mut self,
        label: NodeLabel,
        left: usize,
        right: usize,
    ) -> (NodeId, bool) {
        let before = self.nodes.len();
        let id = self.intern_node(label, left, right);
        (id, self.nodes.len() > before)
    }

    /// Attach a family unless an identical one is already present.
    pub(crate) fn add_family(&mut self, node: NodeId, family: Family) -> bool {
        let families = &mut self.nodes[node.index()].families;
        if families.contains(&family) {
            return false;
        }
        families.push(family);
        true
    }

    /// Node for the advanced state `state` spanning `left..right`.
    ///
    /// `v` is the node of the symbol just passed over and `w` the node for
    /// the part of the rule before it. When that part is empty and the rule
    /// is not complete, `v` itself stands for the partial rule. Otherwise a
    /// symbol node (completed state) or an intermediate node is returned
    /// with the family `(w, v)`, or `(v)` when `w` is absent.
    pub(crate) fn make_node(
        &mut self,
        state: StateId,
        left: usize,
        right: usize,
        w: Option<NodeId>,
        v: NodeId,
    ) -> NodeId {
        let current = *self.grammar.state(state);
        if current.dot == 1 && !current.is_complete() {
            return v;
        }
        let label = if current.is_complete() {
            NodeLabel::Symbol(Symbol::Nonterminal(current.lhs))
        } else {
            NodeLabel::State(state)
        };
        let node = self.intern_node(label, left, right);
        let family = match w {
            Some(w) => Family::binary(w, v),
            None => Family::unary(v),
        };
        self.add_family(node, family);
        node
    }

    /// Root the forest, record the consumed input and run pruning.
    pub(crate) fn finish(&mut self, roots: Vec<NodeId>, tokens: Vec<T>) {
        self.roots = roots;
        self.tokens = tokens;
        self.prune();
    }

    /// Roots of the forest; more than one root means the forest is ambiguous.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &ForestNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ForestNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by identity; extents are relative to [`offset`](Self::offset).
    #[must_use]
    pub fn find(&self, label: NodeLabel, left: usize, right: usize) -> Option<NodeId> {
        self.index.get(&(label, left, right)).copied()
    }

    #[must_use]
    pub fn grammar(&self) -> &Arc<PreparedGrammar<T>> {
        &self.grammar
    }

    /// The input consumed by the parse this forest describes.
    #[must_use]
    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    /// Position of the first consumed token in the complete input.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute input span of a node.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        let node = self.node(id);
        Span::new(self.offset + node.left, self.offset + node.right)
    }

    /// Display name of a label: the symbol name, or the dotted rule.
    #[must_use]
    pub fn label_name(&self, label: NodeLabel) -> Cow<'_, str> {
        match label {
            NodeLabel::Symbol(symbol) => Cow::Borrowed(self.grammar.name(symbol)),
            NodeLabel::State(state) => Cow::Owned(self.grammar.display_state(state)),
        }
    }

    /// Attributes of a node's symbol; intermediate nodes have none.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &Attributes {
        match self.node(id).label {
            NodeLabel::Symbol(symbol) => self.grammar.attributes(symbol),
            NodeLabel::State(_) => self.grammar.grammar().empty_attributes(),
        }
    }

    /// Whether any node has several families, a binary family whose
    /// children do not abut, or there are several roots.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.analysis.ambiguous
    }

    /// Whether some reachable family loops back to one of its ancestors.
    #[must_use]
    pub fn is_infinitely_ambiguous(&self) -> bool {
        self.analysis.infinitely_ambiguous
    }

    #[must_use]
    pub fn is_node_ambiguous(&self, id: NodeId) -> bool {
        self.analysis.node_ambiguous[id.index()]
    }

    /// Whether a loop family is reachable from the node.
    #[must_use]
    pub fn is_node_infinitely_ambiguous(&self, id: NodeId) -> bool {
        self.analysis.node_infinite[id.index()]
    }

    /// Whether family `family` of `id` leads back to an ancestor.
    #[must_use]
    pub fn is_loop_family(&self, id: NodeId, family: usize) -> bool {
        self.analysis.loop_families.contains(&(id, family as u32))
    }

    /// Exact number of derivations below a node, loop families excluded.
    #[must_use]
    pub fn exact_parses(&self, id: NodeId) -> &BigUint {
        &self.analysis.counts[id.index()]
    }

    /// Exact number of parse trees over all roots.
    #[must_use]
    pub fn exact_total_parses(&self) -> &BigUint {
        &self.analysis.total
    }

    /// Number of parse trees, saturating at `u64::MAX`.
    #[must_use]
    pub fn total_parses(&self) -> u64 {
        self.analysis.total.to_u64().unwrap_or(u64::MAX)
    }

    /// A walker that rotates through every tree in order.
    #[must_use]
    pub fn walker(&self) -> ForestWalker<'_, T> {
        ForestWalker::new(self, Box::new(SequentialSelector::new()))
    }

    /// A walker using `selector` to break ties.
    #[must_use]
    pub fn walker_with<'f>(&'f self, selector: Box<dyn TreeSelector + 'f>) -> ForestWalker<'f, T> {
        ForestWalker::new(self, selector)
    }
}

impl<T: Token> fmt::Debug for ParseForest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseForest")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .field("offset", &self.offset)
            .field("ambiguous", &self.analysis.ambiguous)
            .field("infinitely_ambiguous", &self.analysis.infinitely_ambiguous)
            .finish()
    }
}

/// One line per node: `#id name[left..right]` followed by its families.
impl<T: Token> fmt::Display for ParseForest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, node) in self.nodes() {
            write!(
                f,
                "#{} {}[{}..{}]",
                id.0,
                self.label_name(node.label),
                node.left,
                node.right
            )?;
            for family in node.families() {
                f.write_str(" (")?;
                for (position, child) in family.children().enumerate() {
                    if position > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "#{}", child.0)?;
                }
                f.write_str(")")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn prepared() -> Arc<PreparedGrammar<char>> {
        let mut grammar = Grammar::new();
        let s = grammar.nonterminal("S");
        let a = grammar.token('a');
        let b = grammar.token('b');
        grammar.add_rule(s, [a, b]).unwrap();
        Arc::new(PreparedGrammar::new(&grammar, s).unwrap())
    }

    #[test]
    fn test_node_identity_is_idempotent() {
        let grammar = prepared();
        let start = grammar.start();
        let mut forest = ParseForest::new(grammar, 0);
        let label = NodeLabel::Symbol(Symbol::Nonterminal(start));
        let first = forest.intern_node(label, 0, 2);
        let second = forest.intern_node(label, 0, 2);
        assert_eq!(first, second);
        assert_eq!(forest.len(), 1);
        assert_ne!(forest.intern_node(label, 0, 1), first);
        assert_eq!(forest.find(label, 0, 2), Some(first));
    }

    #[test]
    fn test_families_are_deduplicated() {
        let grammar = prepared();
        let start = grammar.start();
        let mut forest = ParseForest::new(grammar, 0);
        let node = forest.intern_node(NodeLabel::Symbol(Symbol::Nonterminal(start)), 0, 0);
        assert!(forest.add_family(node, Family::epsilon()));
        assert!(!forest.add_family(node, Family::epsilon()));
        assert_eq!(forest.node(node).families().len(), 1);
    }

    #[test]
    fn test_make_node_shapes() {
        let grammar = prepared();
        let rule = grammar.rules_for(grammar.start())[0];
        let initial = grammar.states().initial(rule);
        let after_a = grammar.states().advance(initial).unwrap();
        let complete = grammar.states().advance(after_a).unwrap();
        let rhs = grammar.rule(rule).rhs.clone();
        let mut forest = ParseForest::new(Arc::clone(&grammar), 0);
        let a = forest.intern_node(NodeLabel::Symbol(rhs[0]), 0, 1);
        let b = forest.intern_node(NodeLabel::Symbol(rhs[1]), 1, 2);

        assert_eq!(forest.make_node(after_a, 0, 1, None, a), a);
        let s = forest.make_node(complete, 0, 2, Some(a), b);
        assert_eq!(
            forest.node(s).label(),
            NodeLabel::Symbol(Symbol::Nonterminal(grammar.start()))
        );
        assert_eq!(forest.node(s).families(), &[Family::binary(a, b)]);
        assert_eq!(forest.make_node(complete, 0, 2, Some(a), b), s);
        assert_eq!(forest.node(s).families().len(), 1);
    }
}
