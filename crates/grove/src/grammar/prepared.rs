use crate::error::GrammarError;
use crate::grammar::analysis::{useful_rules, GrammarAnalysis, Lookahead};
use crate::grammar::{
    Attributes, Grammar, Nonterminal, Rule, RuleId, State, StateId, StateTable, Symbol,
    TerminalId, TerminalSymbol, Token,
};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::fmt::Write;

/// A closed grammar prepared for recognition from one start symbol.
///
/// Holds the useful rule subset, the interned states and the analysis
/// tables. Recognizers and the forests they build share it behind an `Arc`.
#[derive(Debug)]
pub struct PreparedGrammar<T: Token> {
    grammar: Grammar<T>,
    start: Nonterminal,
    useful: Vec<bool>,
    useful_by_lhs: HashMap<Nonterminal, SmallVec<[RuleId; 4]>, ahash::RandomState>,
    states: StateTable,
    analysis: GrammarAnalysis,
    undefined: Vec<Nonterminal>,
}

impl<T: Token> PreparedGrammar<T> {
    /// Prepare `grammar` for parsing from `start`.
    ///
    /// An open grammar is copied and closed; the caller's grammar is left
    /// untouched. Undefined nonterminals are logged and the rules depending
    /// on them are left out.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UndefinedStart`] if no rule defines `start`.
    pub fn new(grammar: &Grammar<T>, start: Nonterminal) -> Result<Self, GrammarError> {
        let mut grammar = grammar.clone();
        grammar.close();
        if grammar.rules_for(start).is_empty() {
            return Err(GrammarError::UndefinedStart {
                name: grammar.nonterminal_name(start).into(),
            });
        }

        let undefined = grammar.undefined_nonterminals();
        if !undefined.is_empty() {
            let names: Vec<&str> = undefined
                .iter()
                .map(|nt| grammar.nonterminal_name(*nt))
                .collect();
            log::warn!(
                "grammar uses undefined nonterminals; rules depending on them are ignored: {}",
                names.join(", ")
            );
        }

        let useful = useful_rules(&grammar);
        let mut useful_by_lhs: HashMap<Nonterminal, SmallVec<[RuleId; 4]>, ahash::RandomState> =
            HashMap::default();
        for (index, rule) in grammar.rules().iter().enumerate() {
            if useful[index] {
                useful_by_lhs
                    .entry(rule.lhs)
                    .or_default()
                    .push(RuleId(index as u32));
            }
        }
        let states = StateTable::new(&grammar);
        let analysis = GrammarAnalysis::compute(&grammar, &useful, start);

        Ok(Self {
            grammar,
            start,
            useful,
            useful_by_lhs,
            states,
            analysis,
            undefined,
        })
    }

    #[must_use]
    pub fn grammar(&self) -> &Grammar<T> {
        &self.grammar
    }

    #[must_use]
    pub fn start(&self) -> Nonterminal {
        self.start
    }

    /// Useful rules for `nt`.
    #[must_use]
    pub fn rules_for(&self, nt: Nonterminal) -> &[RuleId] {
        self.useful_by_lhs.get(&nt).map_or(&[], |ids| ids.as_slice())
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> &Rule {
        self.grammar.rule(id)
    }

    #[must_use]
    pub fn is_useful(&self, id: RuleId) -> bool {
        self.useful[id.index()]
    }

    #[must_use]
    pub fn states(&self) -> &StateTable {
        &self.states
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &State {
        self.states.state(id)
    }

    #[must_use]
    pub fn analysis(&self) -> &GrammarAnalysis {
        &self.analysis
    }

    /// Nonterminals referenced but never defined.
    #[must_use]
    pub fn undefined_nonterminals(&self) -> &[Nonterminal] {
        &self.undefined
    }

    #[must_use]
    pub fn terminal(&self, id: TerminalId) -> &TerminalSymbol<T> {
        self.grammar.terminal_symbol(id)
    }

    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        self.grammar.name(symbol)
    }

    #[must_use]
    pub fn attributes(&self, symbol: Symbol) -> &Attributes {
        self.grammar.attributes(symbol)
    }

    /// Render a state as `lhs → α · β`.
    #[must_use]
    pub fn display_state(&self, id: StateId) -> String {
        let state = self.state(id);
        let rule = self.rule(state.rule);
        let mut out = String::new();
        out.push_str(self.grammar.nonterminal_name(state.lhs));
        out.push_str(" →");
        for (position, symbol) in rule.rhs.iter().enumerate() {
            if position == state.dot as usize {
                out.push_str(" ·");
            }
            let _ = write!(out, " {}", self.name(*symbol));
        }
        if state.is_complete() {
            out.push_str(" ·");
        }
        out
    }

    /// Whether `rule` can start at `position`: it is nullable, or one of
    /// its FIRST terminals accepts the atom there.
    pub(crate) fn can_start(&self, rule: RuleId, input: &[T], position: usize) -> bool {
        self.analysis.rule_nullable(rule) || self.first_allows(rule, input, position)
    }

    /// Whether one of the FIRST terminals of `rule` accepts `position`.
    pub(crate) fn first_allows(&self, rule: RuleId, input: &[T], position: usize) -> bool {
        input.get(position).is_some_and(|atom| {
            self.analysis
                .rule_first(rule)
                .iter()
                .any(|terminal| self.terminal(*terminal).matches(atom))
        })
    }

    /// Whether something in FOLLOW(`nt`) accepts `position`.
    pub(crate) fn follow_allows(&self, nt: Nonterminal, input: &[T], position: usize) -> bool {
        self.analysis.follow(nt).any(|lookahead| match lookahead {
            Lookahead::EndOfInput => position == input.len(),
            Lookahead::Terminal(terminal) => input
                .get(position)
                .is_some_and(|atom| self.terminal(terminal).matches(atom)),
        })
    }
}
