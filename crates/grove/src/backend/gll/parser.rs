//! GLL parser implementation
//!
//! A descriptor `(slot, i, j)` means: continue the rule of `slot`, which
//! started at `i`, from input position `j`. Processing a descriptor matches
//! terminals in a straight line until the rule ends or a nonterminal is
//! called. Calls and returns meet in the call-return forest, and every step
//! is written to the BSR set, which becomes the forest once the worklist is
//! empty.

use crate::backend::gll::bsr::BsrSet;
use crate::backend::gll::config::GllConfig;
use crate::backend::gll::crf::CallReturnForest;
use crate::backend::progress::ProgressTicker;
use crate::backend::{Algorithm, ParseMetrics, ParseResult, ProgressMonitor};
use crate::grammar::{Nonterminal, PreparedGrammar, RuleId, StateId, Symbol, Token};
use hashbrown::HashSet;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Descriptor {
    slot: StateId,
    start: usize,
    position: usize,
}

struct GllRun<'g, 'i, T: Token> {
    grammar: &'g PreparedGrammar<T>,
    config: &'g GllConfig,
    input: &'i [T],
    seen: HashSet<Descriptor, ahash::RandomState>,
    pending: Vec<Descriptor>,
    crf: CallReturnForest,
    bsr: BsrSet,
    furthest: usize,
    processed: usize,
}

/// Recognize `input[offset..]`.
pub(crate) fn parse<T: Token>(
    grammar: &Arc<PreparedGrammar<T>>,
    config: &GllConfig,
    input: &[T],
    offset: usize,
    monitor: Option<&mut (dyn ProgressMonitor + 'static)>,
) -> ParseResult<T> {
    let start_time = Instant::now();
    let tokens = input.get(offset..).unwrap_or_default();
    let mut ticker = ProgressTicker::start(monitor, Algorithm::Gll, tokens.len());

    let mut run = GllRun {
        grammar: grammar.as_ref(),
        config,
        input: tokens,
        seen: HashSet::default(),
        pending: Vec::new(),
        crf: CallReturnForest::default(),
        bsr: BsrSet::default(),
        furthest: 0,
        processed: 0,
    };
    run.recognize(&mut ticker);
    ticker.finish();

    let len = tokens.len();
    let start = grammar.start();
    let ends = run.crf.popped(start, 0);
    let success = ends.contains(&len);
    let accepted = if success {
        Some(len)
    } else if config.prefix_parsing {
        ends.iter().copied().filter(|end| *end > 0).max()
    } else {
        None
    };

    let (token_count, last_token, more_input) = if run.furthest < len {
        (run.furthest + 1, tokens.get(run.furthest).cloned(), true)
    } else {
        (len, tokens.last().cloned(), false)
    };
    log::debug!(
        "GLL parse at offset {} {}: {} descriptors, {} clusters, {} BSR elements",
        offset,
        if success { "accepted" } else { "failed" },
        run.processed,
        run.crf.cluster_count(),
        run.bsr.len()
    );

    let work_items = run.processed;
    let furthest = run.furthest;
    let (forest, nodes_created) = match accepted {
        Some(end) => {
            let (mut forest, root) = run.bsr.into_forest(grammar, end, offset);
            let nodes_created = forest.len();
            forest.finish(vec![root], tokens[..end].to_vec());
            (Some(forest), nodes_created)
        }
        None => (None, 0),
    };

    ParseResult {
        algorithm: Algorithm::Gll,
        success,
        forest,
        offset,
        token_count,
        last_token,
        more_input,
        prefix_end: accepted.filter(|_| !success).map(|end| offset + end),
        metrics: ParseMetrics {
            tokens_consumed: furthest,
            nodes_created,
            work_items,
            parse_time: start_time.elapsed(),
        },
        chart: None,
    }
}

impl<T: Token> GllRun<'_, '_, T> {
    fn recognize(&mut self, ticker: &mut ProgressTicker<'_>) {
        let start = self.grammar.start();
        self.crf.open(start, 0);
        self.start_rules(start, 0);
        while let Some(descriptor) = self.pending.pop() {
            self.processed += 1;
            self.process(descriptor);
            ticker.tick(self.furthest);
        }
    }

    fn add_descriptor(&mut self, slot: StateId, start: usize, position: usize) {
        let descriptor = Descriptor {
            slot,
            start,
            position,
        };
        if self.seen.insert(descriptor) {
            self.pending.push(descriptor);
        }
    }

    /// Queue every rule of `nt` that may start at `position`.
    fn start_rules(&mut self, nt: Nonterminal, position: usize) {
        let grammar = self.grammar;
        for &rule in grammar.rules_for(nt) {
            if self.selects(rule, nt, position) {
                self.add_descriptor(grammar.states().initial(rule), position, position);
            }
        }
    }

    fn selects(&self, rule: RuleId, nt: Nonterminal, position: usize) -> bool {
        let grammar = self.grammar;
        if !self.config.lookahead {
            return true;
        }
        if !grammar.analysis().rule_nullable(rule) {
            return grammar.first_allows(rule, self.input, position);
        }
        if !self.config.follow_check || self.config.prefix_parsing {
            return true;
        }
        grammar.first_allows(rule, self.input, position)
            || grammar.follow_allows(nt, self.input, position)
    }

    fn process(&mut self, descriptor: Descriptor) {
        let grammar = self.grammar;
        let states = grammar.states();
        let Descriptor {
            mut slot,
            start,
            mut position,
        } = descriptor;

        loop {
            let state = grammar.state(slot);
            match state.next {
                None => {
                    if state.dot == 0 {
                        self.bsr.add(grammar, slot, start, start, start);
                    }
                    self.pop(state.lhs, start, position);
                    return;
                }
                Some(Symbol::Terminal(terminal)) => {
                    let len = grammar.terminal(terminal).match_len(self.input, position);
                    if len == 0 {
                        return;
                    }
                    let Ok(next) = states.advance(slot) else {
                        return;
                    };
                    self.bsr.add(grammar, next, start, position, position + len);
                    slot = next;
                    position += len;
                    self.furthest = self.furthest.max(position);
                }
                Some(Symbol::Nonterminal(nt)) => {
                    if let Ok(next) = states.advance(slot) {
                        self.call(nt, next, start, position);
                    }
                    return;
                }
            }
        }
    }

    /// Call `nt` at `position`, returning to `slot` of a rule started at `start`.
    fn call(&mut self, nt: Nonterminal, slot: StateId, start: usize, position: usize) {
        if self.crf.open(nt, position) {
            self.crf.attach(nt, position, (slot, start));
            self.start_rules(nt, position);
            return;
        }
        if !self.crf.attach(nt, position, (slot, start)) {
            return;
        }
        let ends: Vec<usize> = self.crf.popped(nt, position).to_vec();
        for end in ends {
            self.add_descriptor(slot, start, end);
            self.bsr.add(self.grammar, slot, start, position, end);
        }
    }

    /// `nt` derives `start..position`: resume every caller waiting on it.
    fn pop(&mut self, nt: Nonterminal, start: usize, position: usize) {
        if !self.crf.pop(nt, start, position) {
            return;
        }
        for (slot, origin) in self.crf.returns(nt, start) {
            self.add_descriptor(slot, origin, position);
            self.bsr.add(self.grammar, slot, origin, start, position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn parse_str(grammar: &Grammar<char>, start: Nonterminal, config: &GllConfig, text: &str) -> ParseResult<char> {
        let prepared = Arc::new(PreparedGrammar::new(grammar, start).unwrap());
        let input: Vec<char> = text.chars().collect();
        parse(&prepared, config, &input, 0, None)
    }

    #[test]
    fn test_left_recursion_terminates() {
        let mut grammar = Grammar::new();
        let s = grammar.nonterminal("S");
        let a = grammar.token('a');
        grammar.add_rule(s, [s.into(), a]).unwrap();
        grammar.add_rule(s, [a]).unwrap();

        let result = parse_str(&grammar, s, &GllConfig::default(), "aaaa");
        assert!(result.succeeded());
        assert_eq!(result.forest().map(|forest| forest.total_parses()), Some(1));
        assert!(result.metrics().work_items > 0);
    }

    #[test]
    fn test_follow_check_rejects_nullable_start() {
        // S → A 'b', A → ε | 'a'
        let mut grammar = Grammar::new();
        let s = grammar.nonterminal("S");
        let a_nt = grammar.nonterminal("A");
        let a = grammar.token('a');
        let b = grammar.token('b');
        grammar.add_rule(s, [a_nt.into(), b]).unwrap();
        grammar.add_rule(a_nt, Vec::<Symbol>::new()).unwrap();
        grammar.add_rule(a_nt, [a]).unwrap();

        for follow_check in [true, false] {
            let config = GllConfig::default().with_follow_check(follow_check);
            assert!(parse_str(&grammar, s, &config, "ab").succeeded());
            assert!(parse_str(&grammar, s, &config, "b").succeeded());
            let failed = parse_str(&grammar, s, &config, "c");
            assert!(!failed.succeeded());
            assert_eq!(failed.token_count(), 1);
        }
    }

    #[test]
    fn test_prefix_end_is_longest_accepted() {
        let mut grammar = Grammar::new();
        let s = grammar.nonterminal("S");
        let a = grammar.token('a');
        grammar.add_rule(s, [s.into(), a]).unwrap();
        grammar.add_rule(s, [a]).unwrap();

        let config = GllConfig::default().with_prefix_parsing(true);
        let result = parse_str(&grammar, s, &config, "aaab");
        assert!(!result.succeeded());
        assert!(result.prefix_succeeded());
        assert_eq!(result.prefix_end(), Some(3));
        assert_eq!(result.token_count(), 4);
        assert_eq!(result.last_token(), Some(&'b'));
    }
}
