//! # Forest Walker
//!
//! Extracts individual parse trees from a [`ParseForest`].
//!
//! ## Overview
//!
//! Each call to [`ForestWalker::next_tree`] walks one tree depth first and
//! reports it to a [`TreeBuilder`]. Intermediate nodes are transparent: only
//! symbol nodes produce events.
//!
//! Successive calls enumerate the trees like an odometer. Every visit to a
//! node with several usable families is recorded; the next tree keeps the
//! earlier choices, advances the last visit that still has untried
//! families, and chooses afresh below it. When every choice is exhausted the
//! walker moves to the next root.
//!
//! A family is usable when it is not a loop family, none of its children
//! is already open on the current path, and every child has at least one
//! finite derivation. If a node has no usable family the
//! walker falls back, in order, to a family already known to complete, a
//! family never selected, an empty family, or any family without an open
//! child; failing all of those the node is emitted without children. That
//! fallback is remembered per node so repeated walks stay consistent.
//!
//! ## Counting
//!
//! The exact number of trees is computed by the forest with arbitrary
//! precision; [`ForestWalker::total_parses`] saturates at `u64::MAX`.

mod builder;
mod selector;

pub use builder::{EventRecorder, ParseTree, ParseTreeBuilder, TreeBuilder, TreeInfo};
pub use selector::{
    Candidate, ChildView, NoOpSelector, PrioritySelector, Selection, SequentialSelector,
    TreeSelector,
};

use crate::error::UsageError;
use crate::forest::{Family, NodeId, NodeLabel, ParseForest};
use crate::grammar::{Symbol, Token};
use hashbrown::{HashMap, HashSet};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use smallvec::SmallVec;

/// One decision at an ambiguous node, in visit order.
#[derive(Debug, Clone)]
struct Choice {
    node: NodeId,
    tried: SmallVec<[usize; 4]>,
    candidates: usize,
    chosen: usize,
    ambiguous: bool,
    /// Pick a new, untried family on the next walk.
    reselect: bool,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter(NodeId),
    Leave(NodeId, Option<usize>),
    Close(NodeId),
}

/// Walks the trees of a forest one at a time.
pub struct ForestWalker<'f, T: Token> {
    forest: &'f ParseForest<T>,
    selector: Box<dyn TreeSelector + 'f>,
    root: usize,
    plan: Vec<Choice>,
    last: Option<(usize, Vec<Choice>)>,
    produced: BigUint,
    exhausted: bool,
    escapes: HashMap<NodeId, Option<usize>, ahash::RandomState>,
    productive: HashSet<(NodeId, usize), ahash::RandomState>,
    selected: HashSet<(NodeId, usize), ahash::RandomState>,
}

impl<'f, T: Token> ForestWalker<'f, T> {
    pub fn new(forest: &'f ParseForest<T>, selector: Box<dyn TreeSelector + 'f>) -> Self {
        Self {
            forest,
            selector,
            root: 0,
            plan: Vec::new(),
            last: None,
            produced: BigUint::zero(),
            exhausted: forest.roots().is_empty(),
            escapes: HashMap::default(),
            productive: HashSet::default(),
            selected: HashSet::default(),
        }
    }

    #[must_use]
    pub fn forest(&self) -> &'f ParseForest<T> {
        self.forest
    }

    #[must_use]
    pub fn has_more_trees(&self) -> bool {
        !self.exhausted
    }

    /// Emit the next tree.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::NoMoreTrees`] once every tree has been produced.
    pub fn next_tree<B>(&mut self, builder: &mut B) -> Result<(), UsageError>
    where
        B: TreeBuilder<T> + ?Sized,
    {
        if self.exhausted {
            return Err(UsageError::NoMoreTrees);
        }
        let plan = std::mem::take(&mut self.plan);
        let trace = self.walk(self.root, &plan, builder);
        self.produced += 1u32;
        self.last = Some((self.root, trace.clone()));
        self.advance(trace);
        Ok(())
    }

    /// Emit the most recently produced tree again.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::NoTreeSelected`] before the first call to
    /// [`next_tree`](Self::next_tree).
    pub fn replay_tree<B>(&mut self, builder: &mut B) -> Result<(), UsageError>
    where
        B: TreeBuilder<T> + ?Sized,
    {
        let (root, trace) = self.last.clone().ok_or(UsageError::NoTreeSelected)?;
        self.walk(root, &trace, builder);
        Ok(())
    }

    /// Start the enumeration over from the first tree.
    pub fn reset(&mut self) {
        self.root = 0;
        self.plan.clear();
        self.last = None;
        self.produced = BigUint::zero();
        self.exhausted = self.forest.roots().is_empty();
        self.escapes.clear();
        self.productive.clear();
        self.selected.clear();
        self.selector.reset();
    }

    /// Trees produced since construction or the last reset.
    #[must_use]
    pub fn trees_produced(&self) -> &BigUint {
        &self.produced
    }

    #[must_use]
    pub fn exact_total_parses(&self) -> &BigUint {
        self.forest.exact_total_parses()
    }

    #[must_use]
    pub fn total_parses(&self) -> u64 {
        self.forest.total_parses()
    }

    /// Exact count minus trees produced, and zero once the walker is
    /// exhausted. On an infinitely ambiguous forest the walker may run out
    /// before the count is reached, so this is only an upper bound there.
    #[must_use]
    pub fn exact_remaining_parses(&self) -> BigUint {
        let total = self.forest.exact_total_parses();
        if !self.exhausted && *total > self.produced {
            total - &self.produced
        } else {
            BigUint::zero()
        }
    }

    #[must_use]
    pub fn remaining_parses(&self) -> u64 {
        self.exact_remaining_parses().to_u64().unwrap_or(u64::MAX)
    }

    /// Prepare the plan for the next tree from the trace of this one.
    fn advance(&mut self, mut trace: Vec<Choice>) {
        while trace
            .last()
            .is_some_and(|choice| choice.tried.len() >= choice.candidates)
        {
            trace.pop();
        }
        match trace.last_mut() {
            Some(choice) => {
                choice.reselect = true;
                self.plan = trace;
            }
            None => {
                self.plan.clear();
                self.root += 1;
                if self.root >= self.forest.roots().len() {
                    self.exhausted = true;
                }
            }
        }
    }

    fn walk<B>(&mut self, root: usize, plan: &[Choice], builder: &mut B) -> Vec<Choice>
    where
        B: TreeBuilder<T> + ?Sized,
    {
        let forest = self.forest;
        let mut trace = Vec::with_capacity(plan.len());
        let mut on_path = vec![false; forest.len()];
        let mut made_choice = false;

        builder.start_tree(forest.is_ambiguous(), forest.is_infinitely_ambiguous());
        let mut steps = vec![Step::Enter(forest.roots()[root])];
        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(id) => {
                    let node = forest.node(id);
                    match node.label() {
                        NodeLabel::Symbol(Symbol::Terminal(_)) => {
                            let (left, right) = node.extent();
                            builder.token(
                                &forest.tokens()[left..right],
                                forest.attributes(id),
                                forest.span(id),
                            );
                            continue;
                        }
                        NodeLabel::Symbol(Symbol::Nonterminal(_)) => {
                            builder.start_nonterminal(
                                &forest.label_name(node.label()),
                                forest.attributes(id),
                                forest.span(id),
                            );
                            steps.push(Step::Close(id));
                        }
                        NodeLabel::State(_) => {}
                    }
                    on_path[id.index()] = true;
                    let family = self.choose(id, &on_path, plan, &mut trace, &mut made_choice);
                    steps.push(Step::Leave(id, family));
                    if let Some(family) = family {
                        let family = node.families()[family];
                        steps.extend(family.right().map(Step::Enter));
                        steps.extend(family.left().map(Step::Enter));
                    }
                }
                Step::Leave(id, family) => {
                    on_path[id.index()] = false;
                    if let Some(family) = family {
                        self.productive.insert((id, family));
                    }
                }
                Step::Close(id) => {
                    builder.end_nonterminal(
                        &forest.label_name(forest.node(id).label()),
                        forest.attributes(id),
                        forest.span(id),
                    );
                }
            }
        }
        builder.end_tree(made_choice);
        trace
    }

    fn choose(
        &mut self,
        id: NodeId,
        on_path: &[bool],
        plan: &[Choice],
        trace: &mut Vec<Choice>,
        made_choice: &mut bool,
    ) -> Option<usize> {
        let forest = self.forest;
        let families = forest.node(id).families();
        let open = |family: &Family| family.children().any(|child| on_path[child.index()]);
        let barren = |family: &Family| family.children().any(|child| forest.exact_parses(child).is_zero());
        let candidates: SmallVec<[usize; 4]> = (0..families.len())
            .filter(|index| {
                let family = &families[*index];
                !forest.is_loop_family(id, *index) && !open(family) && !barren(family)
            })
            .collect();

        match candidates.len() {
            0 => return self.escape(id, on_path),
            1 => {
                self.selected.insert((id, candidates[0]));
                return Some(candidates[0]);
            }
            _ => {}
        }

        let planned = plan.get(trace.len()).filter(|choice| choice.node == id);
        let choice = match planned {
            Some(choice) if !choice.reselect => choice.clone(),
            _ => {
                let mut tried = planned.map(|choice| choice.tried.clone()).unwrap_or_default();
                let (chosen, ambiguous) = self.select(id, &candidates, &tried);
                tried.push(chosen);
                Choice {
                    node: id,
                    tried,
                    candidates: candidates.len(),
                    chosen,
                    ambiguous,
                    reselect: false,
                }
            }
        };
        *made_choice |= choice.ambiguous;
        self.selected.insert((id, choice.chosen));
        let chosen = choice.chosen;
        trace.push(Choice {
            reselect: false,
            ..choice
        });
        Some(chosen)
    }

    fn select(&mut self, id: NodeId, candidates: &[usize], tried: &[usize]) -> (usize, bool) {
        let forest = self.forest;
        let grammar = forest.grammar();
        let families = forest.node(id).families();
        let views: Vec<Candidate<'f>> = candidates
            .iter()
            .map(|&family| Candidate {
                family,
                children: families[family]
                    .children()
                    .map(|child| {
                        let label = forest.node(child).label();
                        let symbol = match label {
                            NodeLabel::Symbol(symbol) => Some(symbol),
                            NodeLabel::State(state) => grammar.state(state).previous,
                        };
                        ChildView {
                            node: child,
                            label,
                            symbol,
                            attributes: symbol.map_or_else(
                                || grammar.grammar().empty_attributes(),
                                |symbol| grammar.attributes(symbol),
                            ),
                            span: forest.span(child),
                        }
                    })
                    .collect(),
            })
            .collect();

        let selection = self.selector.select(&views, tried);
        match views.get(selection.index) {
            Some(view) if !tried.contains(&view.family) => (view.family, selection.ambiguous_choice),
            _ => {
                log::warn!(
                    "tree selector returned unusable candidate {} of {}; taking the first untried family",
                    selection.index,
                    views.len()
                );
                let family = candidates
                    .iter()
                    .copied()
                    .find(|family| !tried.contains(family))
                    .unwrap_or(candidates[0]);
                (family, selection.ambiguous_choice)
            }
        }
    }

    /// Choose a family for a node whose families are all loops or open.
    fn escape(&mut self, id: NodeId, on_path: &[bool]) -> Option<usize> {
        let forest = self.forest;
        let families = forest.node(id).families();
        let open = |family: &Family| family.children().any(|child| on_path[child.index()]);
        if let Some(&remembered) = self.escapes.get(&id) {
            if remembered.map_or(true, |family| !open(&families[family])) {
                return remembered;
            }
        }

        let usable: SmallVec<[usize; 4]> = (0..families.len())
            .filter(|index| !open(&families[*index]))
            .collect();
        let pick = usable
            .iter()
            .copied()
            .find(|family| self.productive.contains(&(id, *family)))
            .or_else(|| {
                usable
                    .iter()
                    .copied()
                    .find(|family| !self.selected.contains(&(id, *family)))
            })
            .or_else(|| usable.iter().copied().find(|family| families[*family].is_epsilon()))
            .or_else(|| usable.first().copied());

        self.escapes.entry(id).or_insert(pick);
        if let Some(family) = pick {
            self.selected.insert((id, family));
        }
        pick
    }
}
