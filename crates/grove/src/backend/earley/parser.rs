//! Earley parser implementation
//!
//! Items carry the forest node for the recognized part of their rule, so
//! the forest is complete when the last item set closes. Nullable
//! completions at the current position are remembered per nonterminal,
//! which lets items that arrive after an empty completion still advance
//! over it.

use crate::backend::earley::chart::{EarleyChart, EarleyItem};
use crate::backend::earley::config::EarleyConfig;
use crate::backend::progress::ProgressTicker;
use crate::backend::{Algorithm, ParseMetrics, ParseResult, ProgressMonitor};
use crate::forest::{Family, NodeId, NodeLabel, ParseForest};
use crate::grammar::{Nonterminal, PreparedGrammar, Symbol, TerminalId, Token};
use hashbrown::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Where recognition stopped.
#[derive(Debug, Clone, Copy)]
struct Outcome {
    /// Position of the atom no item could consume, if input remained.
    stopped: Option<usize>,
    /// Last position > 0 where the start symbol completed from 0.
    checkpoint: Option<usize>,
}

struct EarleyRun<'g, 'i, T: Token> {
    grammar: &'g PreparedGrammar<T>,
    config: &'g EarleyConfig,
    input: &'i [T],
    offset: usize,
    chart: EarleyChart,
    forest: ParseForest<T>,
    furthest: usize,
    work_items: usize,
}

/// Recognize `input[offset..]`.
pub(crate) fn parse<T: Token>(
    grammar: &Arc<PreparedGrammar<T>>,
    config: &EarleyConfig,
    input: &[T],
    offset: usize,
    monitor: Option<&mut (dyn ProgressMonitor + 'static)>,
) -> ParseResult<T> {
    let start_time = Instant::now();
    let tokens = input.get(offset..).unwrap_or_default();
    let mut ticker = ProgressTicker::start(monitor, Algorithm::Earley, tokens.len());

    let mut run = EarleyRun {
        grammar: grammar.as_ref(),
        config,
        input: tokens,
        offset,
        chart: EarleyChart::new(tokens.len()),
        forest: ParseForest::new(Arc::clone(grammar), offset),
        furthest: 0,
        work_items: 0,
    };
    let outcome = run.recognize(&mut ticker);
    ticker.finish();
    run.into_result(outcome, start_time)
}

impl<T: Token> EarleyRun<'_, '_, T> {
    fn recognize(&mut self, ticker: &mut ProgressTicker<'_>) -> Outcome {
        let end = self.input.len();
        let mut checkpoint = None;
        let mut position = 0;
        self.predict(self.grammar.start(), 0);

        loop {
            ticker.tick(position);
            self.close(position);
            if self.config.prefix_parsing && position > 0 && self.start_node(position).is_some() {
                log::trace!("prefix checkpoint at {}", self.offset + position);
                checkpoint = Some(position);
            }
            if position == end {
                return Outcome {
                    stopped: None,
                    checkpoint,
                };
            }

            self.scan(position);
            match (position + 1..=self.furthest).find(|next| !self.chart.set(*next).is_empty()) {
                Some(next) => position = next,
                None => {
                    return Outcome {
                        stopped: Some(position),
                        checkpoint,
                    }
                }
            }
        }
    }

    /// Run prediction and completion at `position` until no item is added.
    fn close(&mut self, position: usize) {
        let grammar = self.grammar;
        let mut nullable: HashMap<Nonterminal, NodeId, ahash::RandomState> = HashMap::default();
        let mut cursor = 0;
        while let Some(item) = self.chart.set(position).get(cursor) {
            cursor += 1;
            self.work_items += 1;
            let state = grammar.state(item.state);
            match state.next {
                Some(Symbol::Terminal(_)) => {}
                Some(Symbol::Nonterminal(nt)) => {
                    self.predict(nt, position);
                    if let Some(&empty) = nullable.get(&nt) {
                        self.advance(item, position, empty);
                    }
                }
                None => {
                    let node = match item.node {
                        Some(node) => node,
                        None => {
                            let label = NodeLabel::Symbol(Symbol::Nonterminal(state.lhs));
                            let node = self.forest.intern_node(label, position, position);
                            self.forest.add_family(node, Family::epsilon());
                            node
                        }
                    };
                    if item.origin == position {
                        nullable.insert(state.lhs, node);
                    }
                    for waiting in self.chart.set(item.origin).waiting_on(state.lhs) {
                        self.advance(waiting, position, node);
                    }
                }
            }
        }
    }

    fn predict(&mut self, nt: Nonterminal, position: usize) {
        let grammar = self.grammar;
        if !self.chart.set_mut(position).predict(nt) {
            return;
        }
        for &rule in grammar.rules_for(nt) {
            if self.config.lookahead && !grammar.can_start(rule, self.input, position) {
                continue;
            }
            let item = EarleyItem::new(grammar.states().initial(rule), position, None);
            self.chart.set_mut(position).add(grammar, item);
        }
    }

    fn scan(&mut self, position: usize) {
        let grammar = self.grammar;
        let input = self.input;
        let mut lengths: HashMap<TerminalId, usize, ahash::RandomState> = HashMap::default();
        let scans = self.chart.set(position).scans().to_vec();
        for item in scans {
            let Some(Symbol::Terminal(terminal)) = grammar.state(item.state).next else {
                continue;
            };
            let len = *lengths
                .entry(terminal)
                .or_insert_with(|| grammar.terminal(terminal).match_len(input, position));
            if len == 0 {
                continue;
            }
            let label = NodeLabel::Symbol(Symbol::Terminal(terminal));
            let leaf = self.forest.intern_node(label, position, position + len);
            self.advance(item, position + len, leaf);
        }
    }

    /// Move the dot of `item` over the symbol recognized by `node`, ending at `position`.
    fn advance(&mut self, item: EarleyItem, position: usize, node: NodeId) {
        let grammar = self.grammar;
        let Ok(next) = grammar.states().advance(item.state) else {
            return;
        };
        let made = self
            .forest
            .make_node(next, item.origin, position, item.node, node);
        self.chart
            .set_mut(position)
            .add(grammar, EarleyItem::new(next, item.origin, Some(made)));
        self.furthest = self.furthest.max(position);
    }

    fn start_node(&self, end: usize) -> Option<NodeId> {
        let label = NodeLabel::Symbol(Symbol::Nonterminal(self.grammar.start()));
        self.forest.find(label, 0, end)
    }

    fn into_result(mut self, outcome: Outcome, start_time: Instant) -> ParseResult<T> {
        let len = self.input.len();
        let chart = self
            .config
            .retain_chart
            .then(|| self.chart.snapshot(self.offset));
        let nodes_created = self.forest.len();

        let accepted = match outcome.stopped {
            None => self.start_node(len),
            Some(_) => None,
        };
        let success = accepted.is_some();
        let root = match accepted {
            Some(root) => Some((root, len)),
            None => outcome
                .checkpoint
                .and_then(|end| self.start_node(end).map(|root| (root, end))),
        };

        let (token_count, last_token, more_input) = match outcome.stopped {
            Some(position) => (position + 1, self.input.get(position).cloned(), true),
            None => (len, self.input.last().cloned(), false),
        };
        if success {
            log::debug!(
                "Earley parse accepted {} tokens at offset {}: {} items, {} nodes",
                len,
                self.offset,
                self.work_items,
                nodes_created
            );
        } else {
            log::debug!(
                "Earley parse failed after {} tokens at offset {} on {:?}",
                token_count,
                self.offset,
                last_token
            );
        }

        let prefix_end = match root {
            Some((_, end)) if !success => Some(self.offset + end),
            _ => None,
        };
        let forest = match root {
            Some((root, end)) => {
                self.forest.finish(vec![root], self.input[..end].to_vec());
                Some(self.forest)
            }
            None => None,
        };

        ParseResult {
            algorithm: Algorithm::Earley,
            success,
            forest,
            offset: self.offset,
            token_count,
            last_token,
            more_input,
            prefix_end,
            metrics: ParseMetrics {
                tokens_consumed: if success { len } else { self.furthest },
                nodes_created,
                work_items: self.work_items,
                parse_time: start_time.elapsed(),
            },
            chart,
        }
    }
}
