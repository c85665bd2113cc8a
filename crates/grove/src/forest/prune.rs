//! Forest finishing: epsilon trimming, reachability, ambiguity and counting.

use super::{Family, NodeId, NodeLabel, ParseForest};
use crate::grammar::Token;
use hashbrown::HashSet;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use smallvec::SmallVec;

/// Facts recorded about a finished forest, indexed by node.
#[derive(Debug, Default)]
pub(crate) struct ForestAnalysis {
    pub(crate) ambiguous: bool,
    pub(crate) infinitely_ambiguous: bool,
    pub(crate) node_ambiguous: Vec<bool>,
    pub(crate) node_infinite: Vec<bool>,
    pub(crate) loop_families: HashSet<(NodeId, u32), ahash::RandomState>,
    pub(crate) counts: Vec<BigUint>,
    pub(crate) total: BigUint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    OnPath,
    Done,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    family: usize,
    child: usize,
}

impl<T: Token> ParseForest<T> {
    pub(super) fn prune(&mut self) {
        let created = self.nodes.len();
        self.trim_epsilon();
        self.order_families();
        let visits = self.analyse();
        self.compact(&visits);
        log::debug!(
            "finished forest: {} of {} nodes reachable, {} roots, ambiguous={}, infinitely ambiguous={}, {} parses",
            self.nodes.len(),
            created,
            self.roots.len(),
            self.analysis.ambiguous,
            self.analysis.infinitely_ambiguous,
            self.analysis.total
        );
    }

    fn prunable(&self, label: NodeLabel) -> bool {
        match label {
            NodeLabel::Symbol(symbol) => self.grammar.attributes(symbol).is_prunable(),
            NodeLabel::State(_) => true,
        }
    }

    /// Remove references to pure-epsilon nodes: nodes with a single family
    /// that, after trimming, has no children. Families are rewritten in
    /// place and never merged, so counts and ambiguity are unaffected.
    fn trim_epsilon(&mut self) {
        let mut trimmed = vec![false; self.nodes.len()];
        loop {
            let mut changed = false;
            for (index, node) in self.nodes.iter().enumerate() {
                if trimmed[index] || !node.is_empty() || node.families.len() != 1 {
                    continue;
                }
                if !self.prunable(node.label) {
                    continue;
                }
                if node.families[0].children().all(|child| trimmed[child.index()]) {
                    trimmed[index] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        if !trimmed.contains(&true) {
            return;
        }

        let keep = |child: Option<NodeId>| child.filter(|id| !trimmed[id.index()]);
        for node in &mut self.nodes {
            for family in &mut node.families {
                *family = match (keep(family.w), keep(family.v)) {
                    (Some(w), Some(v)) => Family::binary(w, v),
                    (Some(only), None) | (None, Some(only)) => Family::unary(only),
                    (None, None) => Family::epsilon(),
                };
            }
        }
    }

    /// Sort every node's families, and the roots, by the identity of
    /// their children. Loop families are the back edges of the walk in
    /// `analyse`, so its visiting order must depend only on the forest's
    /// content and not on the order a recognizer added families in.
    fn order_families(&mut self) {
        let identities: Vec<(NodeLabel, usize, usize)> = self
            .nodes
            .iter()
            .map(|node| (node.label, node.left, node.right))
            .collect();
        let key = |family: &Family| -> SmallVec<[(NodeLabel, usize, usize); 2]> {
            family.children().map(|child| identities[child.index()]).collect()
        };
        for node in &mut self.nodes {
            if node.families.len() > 1 {
                node.families.sort_by_cached_key(&key);
            }
        }
        self.roots.sort_by_key(|root| identities[root.index()]);
    }

    /// Depth-first walk from the roots. Records reachability, loop
    /// families (a child already on the active path), per-node ambiguity
    /// and exact counts, computed in post-order over non-loop families.
    fn analyse(&mut self) -> Vec<Visit> {
        let size = self.nodes.len();
        let mut visits = vec![Visit::Unseen; size];
        let mut analysis = ForestAnalysis {
            node_ambiguous: vec![false; size],
            node_infinite: vec![false; size],
            counts: vec![BigUint::zero(); size],
            ..ForestAnalysis::default()
        };

        let mut stack: Vec<Frame> = Vec::new();
        for root in self.roots.clone() {
            if visits[root.index()] != Visit::Unseen {
                continue;
            }
            visits[root.index()] = Visit::OnPath;
            stack.push(Frame {
                node: root,
                family: 0,
                child: 0,
            });

            while let Some(&frame) = stack.last() {
                let top = stack.len() - 1;
                let node = &self.nodes[frame.node.index()];
                if frame.family == node.families.len() {
                    self.settle(frame.node, &mut analysis);
                    visits[frame.node.index()] = Visit::Done;
                    stack.pop();
                    continue;
                }
                let family = node.families[frame.family];
                let child = match frame.child {
                    0 => family.w,
                    1 => family.v,
                    _ => {
                        stack[top].family += 1;
                        stack[top].child = 0;
                        continue;
                    }
                };
                stack[top].child += 1;
                let Some(child) = child else {
                    continue;
                };
                match visits[child.index()] {
                    Visit::OnPath => {
                        analysis
                            .loop_families
                            .insert((frame.node, frame.family as u32));
                    }
                    Visit::Unseen => {
                        visits[child.index()] = Visit::OnPath;
                        stack.push(Frame {
                            node: child,
                            family: 0,
                            child: 0,
                        });
                    }
                    Visit::Done => {}
                }
            }
        }

        analysis.infinitely_ambiguous = !analysis.loop_families.is_empty();
        analysis.ambiguous =
            self.roots.len() > 1 || analysis.node_ambiguous.iter().any(|ambiguous| *ambiguous);
        analysis.total = self
            .roots
            .iter()
            .map(|root| &analysis.counts[root.index()])
            .sum();
        self.analysis = analysis;
        visits
    }

    /// Post-order step for one node; all children of its non-loop families are done.
    fn settle(&self, id: NodeId, analysis: &mut ForestAnalysis) {
        let node = &self.nodes[id.index()];
        let overlaps = node.families.iter().any(|family| match (family.w, family.v) {
            (Some(w), Some(v)) => {
                let (w, v) = (&self.nodes[w.index()], &self.nodes[v.index()]);
                w.right != v.left && !w.is_empty() && !v.is_empty()
            }
            _ => false,
        });
        analysis.node_ambiguous[id.index()] = node.families.len() > 1 || overlaps;

        if node.families.is_empty() {
            analysis.counts[id.index()] = BigUint::one();
            return;
        }

        let mut count = BigUint::zero();
        let mut has_loop = false;
        let mut infinite = false;
        for (index, family) in node.families.iter().enumerate() {
            if analysis.loop_families.contains(&(id, index as u32)) {
                has_loop = true;
                continue;
            }
            let mut product = BigUint::one();
            for child in family.children() {
                product *= &analysis.counts[child.index()];
                infinite |= analysis.node_infinite[child.index()];
            }
            count += product;
        }
        // A loop over an empty extent can be taken once more, adding one derivation.
        if has_loop && node.is_empty() {
            count += 1u32;
        }
        analysis.counts[id.index()] = count;
        analysis.node_infinite[id.index()] = has_loop || infinite;
    }

    /// Drop nodes the walk never reached and renumber the rest.
    fn compact(&mut self, visits: &[Visit]) {
        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut next = 0u32;
        for (index, visit) in visits.iter().enumerate() {
            if *visit == Visit::Done {
                remap[index] = Some(NodeId(next));
                next += 1;
            }
        }
        if next as usize == self.nodes.len() {
            return;
        }

        let map = |id: NodeId| remap[id.index()].unwrap_or(id);
        let old = std::mem::take(&mut self.nodes);
        self.index.clear();
        for (index, mut node) in old.into_iter().enumerate() {
            if remap[index].is_none() {
                continue;
            }
            for family in &mut node.families {
                family.w = family.w.map(map);
                family.v = family.v.map(map);
            }
            self.index.insert((node.label, node.left, node.right), NodeId(self.nodes.len() as u32));
            self.nodes.push(node);
        }
        self.roots = self.roots.iter().map(|root| map(*root)).collect();

        retain_reachable(&mut self.analysis.node_ambiguous, visits);
        retain_reachable(&mut self.analysis.node_infinite, visits);
        retain_reachable(&mut self.analysis.counts, visits);
        self.analysis.loop_families = self
            .analysis
            .loop_families
            .iter()
            .map(|(id, family)| (map(*id), *family))
            .collect();
    }
}

fn retain_reachable<V>(values: &mut Vec<V>, visits: &[Visit]) {
    let mut position = 0;
    values.retain(|_| {
        position += 1;
        visits[position - 1] == Visit::Done
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, PreparedGrammar, Symbol};
    use std::sync::Arc;

    /// `S → B | A`, `A → B | 'a'`, `B → A`
    fn cyclic() -> (Arc<PreparedGrammar<char>>, [NodeLabel; 4]) {
        let mut grammar = Grammar::new();
        let s = grammar.nonterminal("S");
        let a_nt = grammar.nonterminal("A");
        let b_nt = grammar.nonterminal("B");
        let a = grammar.token('a');
        grammar.add_rule(s, [b_nt]).unwrap();
        grammar.add_rule(s, [a_nt]).unwrap();
        grammar.add_rule(a_nt, [b_nt]).unwrap();
        grammar.add_rule(a_nt, [a]).unwrap();
        grammar.add_rule(b_nt, [a_nt]).unwrap();
        let labels = [
            Symbol::Nonterminal(s),
            Symbol::Nonterminal(a_nt),
            Symbol::Nonterminal(b_nt),
            a,
        ]
        .map(NodeLabel::Symbol);
        (Arc::new(PreparedGrammar::new(&grammar, s).unwrap()), labels)
    }

    fn cyclic_forest(reversed: bool) -> ParseForest<char> {
        let (grammar, [s, a_nt, b_nt, a]) = cyclic();
        let mut forest = ParseForest::new(grammar, 0);
        let s = forest.intern_node(s, 0, 1);
        let a_nt = forest.intern_node(a_nt, 0, 1);
        let b_nt = forest.intern_node(b_nt, 0, 1);
        let a = forest.intern_node(a, 0, 1);
        let mut families = vec![
            (s, Family::unary(b_nt)),
            (s, Family::unary(a_nt)),
            (a_nt, Family::unary(b_nt)),
            (a_nt, Family::unary(a)),
            (b_nt, Family::unary(a_nt)),
        ];
        if reversed {
            families.reverse();
        }
        for (node, family) in families {
            forest.add_family(node, family);
        }
        forest.finish(vec![s], vec!['a']);
        forest
    }

    #[test]
    fn test_counts_ignore_family_insertion_order() {
        let forward = cyclic_forest(false);
        let reversed = cyclic_forest(true);
        for forest in [&forward, &reversed] {
            assert!(forest.is_infinitely_ambiguous());
            assert_eq!(forest.exact_total_parses(), &BigUint::one());
        }
        for (left, right) in forward.nodes().zip(reversed.nodes()) {
            assert_eq!(left.1.families().len(), right.1.families().len());
        }
    }

    #[test]
    fn test_split_that_skips_input_is_ambiguous() {
        let (grammar, [s, _, _, a]) = cyclic();
        let mut forest = ParseForest::new(grammar, 0);
        let root = forest.intern_node(s, 0, 3);
        let first = forest.intern_node(a, 0, 1);
        let last = forest.intern_node(a, 2, 3);
        forest.add_family(root, Family::binary(first, last));
        forest.finish(vec![root], vec!['a', 'x', 'a']);

        let root = forest.roots()[0];
        assert_eq!(forest.node(root).families().len(), 1);
        assert!(forest.is_node_ambiguous(root));
        assert!(forest.is_ambiguous());
        assert!(!forest.is_infinitely_ambiguous());
    }

    #[test]
    fn test_abutting_split_is_not_ambiguous() {
        let (grammar, [s, _, _, a]) = cyclic();
        let mut forest = ParseForest::new(grammar, 0);
        let root = forest.intern_node(s, 0, 2);
        let first = forest.intern_node(a, 0, 1);
        let last = forest.intern_node(a, 1, 2);
        forest.add_family(root, Family::binary(first, last));
        forest.finish(vec![root], vec!['a', 'a']);

        assert!(!forest.is_node_ambiguous(forest.roots()[0]));
        assert!(!forest.is_ambiguous());
        assert_eq!(forest.total_parses(), 1);
    }
}
