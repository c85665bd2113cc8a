//! Dotted rules
//!
//! A state is a rule with a cursor. States are interned once per grammar:
//! the states of a rule of length `n` occupy `n + 1` consecutive ids, so
//! advancing is an increment and equal states always share an id.

use crate::error::UsageError;
use crate::grammar::{Grammar, Nonterminal, RuleId, Symbol, Token};

/// Interned dotted rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A rule with a cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    pub rule: RuleId,
    pub lhs: Nonterminal,
    pub dot: u32,
    /// Symbol after the dot; `None` when completed.
    pub next: Option<Symbol>,
    /// Symbol before the dot; `None` at the start of the rule.
    pub previous: Option<Symbol>,
}

impl State {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.next.is_none()
    }
}

/// All dotted states of a closed grammar.
#[derive(Debug, Clone)]
pub struct StateTable {
    base: Vec<u32>,
    states: Vec<State>,
}

impl StateTable {
    #[must_use]
    pub fn new<T: Token>(grammar: &Grammar<T>) -> Self {
        let mut base = Vec::with_capacity(grammar.rules().len());
        let mut states = Vec::new();
        for (index, rule) in grammar.rules().iter().enumerate() {
            base.push(states.len() as u32);
            for dot in 0..=rule.rhs.len() {
                states.push(State {
                    rule: RuleId(index as u32),
                    lhs: rule.lhs,
                    dot: dot as u32,
                    next: rule.rhs.get(dot).copied(),
                    previous: dot.checked_sub(1).map(|before| rule.rhs[before]),
                });
            }
        }
        Self { base, states }
    }

    /// The state with the dot at the start of `rule`.
    #[must_use]
    pub fn initial(&self, rule: RuleId) -> StateId {
        StateId(self.base[rule.index()])
    }

    /// The completed state of `rule`.
    #[must_use]
    pub fn completed(&self, rule: RuleId, rule_len: usize) -> StateId {
        StateId(self.base[rule.index()] + rule_len as u32)
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Move the dot over the next symbol.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::CompletedState`] if the state is already complete.
    pub fn advance(&self, id: StateId) -> Result<StateId, UsageError> {
        if self.state(id).is_complete() {
            return Err(UsageError::CompletedState);
        }
        Ok(StateId(id.0 + 1))
    }

    /// Move the dot back over the previous symbol, if any.
    #[must_use]
    pub fn retreat(&self, id: StateId) -> Option<StateId> {
        (self.state(id).dot > 0).then(|| StateId(id.0 - 1))
    }

    #[must_use]
    pub fn is_complete(&self, id: StateId) -> bool {
        self.state(id).is_complete()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_interned_per_rule() {
        let mut grammar = Grammar::<char>::new();
        let s = grammar.nonterminal("S");
        let a = grammar.token('a');
        grammar.add_rule(s, [a, a]).unwrap();
        grammar.add_rule(s, Vec::<Symbol>::new()).unwrap();
        grammar.close();
        let table = StateTable::new(&grammar);
        assert_eq!(table.len(), 4);

        let first = grammar.rules_for(s)[0];
        let start = table.initial(first);
        let middle = table.advance(start).unwrap();
        let end = table.advance(middle).unwrap();
        assert_eq!(end, table.completed(first, 2));
        assert_eq!(table.state(middle).previous, Some(a));
        assert_eq!(table.state(middle).next, Some(a));
        assert!(table.is_complete(end));
        assert_eq!(table.retreat(end), Some(middle));
        assert_eq!(table.retreat(start), None);
    }

    #[test]
    fn test_advance_completed_state_is_usage_error() {
        let mut grammar = Grammar::<char>::new();
        let s = grammar.nonterminal("S");
        grammar.add_rule(s, Vec::<Symbol>::new()).unwrap();
        grammar.close();
        let table = StateTable::new(&grammar);
        let empty = table.initial(grammar.rules_for(s)[0]);
        assert!(table.is_complete(empty));
        assert_eq!(table.advance(empty), Err(UsageError::CompletedState));
    }
}
