//! Call-return forest
//!
//! Each call of a nonterminal `X` at position `k` is a cluster `(X, k)`.
//! Callers attach return points `(slot, i)`: the slot after `X` in the
//! calling rule and where that rule started. Every end position `j` reached
//! by `X` from `k` is recorded as a pop, so return points attached later can
//! be resumed without parsing `X` again.

use crate::grammar::{Nonterminal, StateId};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// Return point: continue at `slot` in a rule that started at the position.
pub(crate) type ReturnPoint = (StateId, usize);

#[derive(Debug, Default)]
pub(crate) struct CallReturnForest {
    clusters: HashMap<(Nonterminal, usize), SmallVec<[ReturnPoint; 4]>, ahash::RandomState>,
    edges: HashSet<(Nonterminal, usize, ReturnPoint), ahash::RandomState>,
    popped: HashMap<(Nonterminal, usize), SmallVec<[usize; 4]>, ahash::RandomState>,
    popped_seen: HashSet<(Nonterminal, usize, usize), ahash::RandomState>,
}

impl CallReturnForest {
    /// Create the cluster `(nt, k)`; returns false if it already existed.
    pub(crate) fn open(&mut self, nt: Nonterminal, k: usize) -> bool {
        match self.clusters.entry((nt, k)) {
            hashbrown::hash_map::Entry::Occupied(_) => false,
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(SmallVec::new());
                true
            }
        }
    }

    /// Attach a return point to `(nt, k)`; returns false if already attached.
    pub(crate) fn attach(&mut self, nt: Nonterminal, k: usize, point: ReturnPoint) -> bool {
        if !self.edges.insert((nt, k, point)) {
            return false;
        }
        self.clusters.entry((nt, k)).or_default().push(point);
        true
    }

    pub(crate) fn returns(&self, nt: Nonterminal, k: usize) -> SmallVec<[ReturnPoint; 4]> {
        self.clusters.get(&(nt, k)).cloned().unwrap_or_default()
    }

    /// Record that `nt` derives `k..j`; returns false if already known.
    pub(crate) fn pop(&mut self, nt: Nonterminal, k: usize, j: usize) -> bool {
        if !self.popped_seen.insert((nt, k, j)) {
            return false;
        }
        self.popped.entry((nt, k)).or_default().push(j);
        true
    }

    /// End positions recorded for `(nt, k)`, in discovery order.
    pub(crate) fn popped(&self, nt: Nonterminal, k: usize) -> &[usize] {
        self.popped.get(&(nt, k)).map_or(&[], |ends| ends.as_slice())
    }

    pub(crate) fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, StateTable};

    #[test]
    fn test_clusters_edges_and_pops() {
        let mut grammar = Grammar::<char>::new();
        let s = grammar.nonterminal("S");
        let a = grammar.token('a');
        grammar.add_rule(s, [s.into(), a]).unwrap();
        grammar.close();
        let states = StateTable::new(&grammar);
        let after_s = states.advance(states.initial(grammar.rules_for(s)[0])).unwrap();

        let mut crf = CallReturnForest::default();
        assert!(crf.open(s, 0));
        assert!(!crf.open(s, 0));
        assert!(crf.attach(s, 0, (after_s, 0)));
        assert!(!crf.attach(s, 0, (after_s, 0)));
        assert_eq!(crf.returns(s, 0).as_slice(), &[(after_s, 0)]);
        assert!(crf.returns(s, 1).is_empty());

        assert!(crf.pop(s, 0, 2));
        assert!(crf.pop(s, 0, 1));
        assert!(!crf.pop(s, 0, 2));
        assert_eq!(crf.popped(s, 0), &[2, 1]);
        assert!(crf.popped(s, 3).is_empty());
        assert_eq!(crf.cluster_count(), 1);
    }
}
