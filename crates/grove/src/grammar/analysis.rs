//! Grammar analysis
//!
//! Nullability, FIRST and FOLLOW sets, and the useful subset of rules.
//! All sets are least fixed points computed by iterating until nothing
//! changes.

use crate::grammar::{Grammar, Nonterminal, RuleId, Symbol, TerminalId, Token};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// An element of a FOLLOW set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookahead {
    Terminal(TerminalId),
    EndOfInput,
}

/// Least fixed point of "every item of some rule body is nullable".
///
/// `lhs(i)` is the left-hand side of rule `i`; `body_nullable(i, set)` says
/// whether rule `i`'s body is nullable given the current nullable set.
pub(crate) fn nullable_fixed_point<L, B>(
    rule_count: usize,
    lhs: L,
    body_nullable: B,
) -> HashSet<Nonterminal, ahash::RandomState>
where
    L: Fn(usize) -> Nonterminal,
    B: Fn(usize, &HashSet<Nonterminal, ahash::RandomState>) -> bool,
{
    let mut nullable = HashSet::default();
    loop {
        let mut changed = false;
        for index in 0..rule_count {
            let nt = lhs(index);
            if !nullable.contains(&nt) && body_nullable(index, &nullable) {
                nullable.insert(nt);
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

/// Marks the rules that do not transitively depend on an undefined nonterminal.
///
/// A nonterminal is broken when it has no rules, or when every one of its
/// rules mentions a broken nonterminal. Rules mentioning a broken
/// nonterminal are not useful.
pub(crate) fn useful_rules<T: Token>(grammar: &Grammar<T>) -> Vec<bool> {
    let rules = grammar.rules();
    let mut broken: HashSet<Nonterminal, ahash::RandomState> = rules
        .iter()
        .flat_map(|rule| rule.rhs.iter())
        .filter_map(|symbol| symbol.as_nonterminal())
        .filter(|nt| grammar.rules_for(*nt).is_empty())
        .collect();

    let mentions_broken = |rule: RuleId, broken: &HashSet<Nonterminal, ahash::RandomState>| {
        grammar
            .rule(rule)
            .rhs
            .iter()
            .filter_map(|symbol| symbol.as_nonterminal())
            .any(|nt| broken.contains(&nt))
    };

    loop {
        let mut changed = false;
        for rule in rules {
            if broken.contains(&rule.lhs) {
                continue;
            }
            if grammar
                .rules_for(rule.lhs)
                .iter()
                .all(|id| mentions_broken(*id, &broken))
            {
                broken.insert(rule.lhs);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    (0..rules.len())
        .map(|index| !mentions_broken(RuleId(index as u32), &broken))
        .collect()
}

/// Nullable, FIRST and FOLLOW sets over a subset of a closed grammar's rules.
#[derive(Debug, Clone)]
pub struct GrammarAnalysis {
    nullable: HashSet<Nonterminal, ahash::RandomState>,
    first: HashMap<Nonterminal, HashSet<TerminalId, ahash::RandomState>, ahash::RandomState>,
    follow: HashMap<Nonterminal, HashSet<Lookahead, ahash::RandomState>, ahash::RandomState>,
    rule_first: Vec<SmallVec<[TerminalId; 4]>>,
    rule_nullable: Vec<bool>,
}

impl GrammarAnalysis {
    /// Analyse the rules of `grammar` for which `included[rule]` holds, with
    /// FOLLOW(`start`) seeded by end of input.
    #[must_use]
    pub fn compute<T: Token>(grammar: &Grammar<T>, included: &[bool], start: Nonterminal) -> Self {
        let rules = grammar.rules();
        let active: Vec<usize> = (0..rules.len()).filter(|index| included[*index]).collect();

        let nullable = nullable_fixed_point(
            active.len(),
            |index| rules[active[index]].lhs,
            |index, nullable| {
                rules[active[index]]
                    .rhs
                    .iter()
                    .all(|symbol| symbol.as_nonterminal().is_some_and(|nt| nullable.contains(&nt)))
            },
        );

        let mut analysis = Self {
            nullable,
            first: HashMap::default(),
            follow: HashMap::default(),
            rule_first: Vec::new(),
            rule_nullable: Vec::new(),
        };

        loop {
            let mut changed = false;
            for &index in &active {
                let rule = &rules[index];
                let body = analysis.first_of_sequence(&rule.rhs);
                let set = analysis.first.entry(rule.lhs).or_default();
                for terminal in body {
                    changed |= set.insert(terminal);
                }
            }
            if !changed {
                break;
            }
        }

        analysis
            .follow
            .entry(start)
            .or_default()
            .insert(Lookahead::EndOfInput);
        loop {
            let mut changed = false;
            for &index in &active {
                let rule = &rules[index];
                for (position, symbol) in rule.rhs.iter().enumerate() {
                    let Symbol::Nonterminal(nt) = *symbol else {
                        continue;
                    };
                    let rest = &rule.rhs[position + 1..];
                    let mut additions: Vec<Lookahead> = analysis
                        .first_of_sequence(rest)
                        .into_iter()
                        .map(Lookahead::Terminal)
                        .collect();
                    if analysis.sequence_nullable(rest) {
                        if let Some(lhs_follow) = analysis.follow.get(&rule.lhs) {
                            additions.extend(lhs_follow.iter().copied());
                        }
                    }
                    let set = analysis.follow.entry(nt).or_default();
                    for lookahead in additions {
                        changed |= set.insert(lookahead);
                    }
                }
            }
            if !changed {
                break;
            }
        }

        analysis.rule_first = rules
            .iter()
            .map(|rule| analysis.first_of_sequence(&rule.rhs).into_iter().collect())
            .collect();
        analysis.rule_nullable = rules
            .iter()
            .map(|rule| analysis.sequence_nullable(&rule.rhs))
            .collect();
        analysis
    }

    #[must_use]
    pub fn is_nullable(&self, nt: Nonterminal) -> bool {
        self.nullable.contains(&nt)
    }

    /// Terminals that can begin a derivation of `nt`.
    pub fn first(&self, nt: Nonterminal) -> impl Iterator<Item = TerminalId> + '_ {
        self.first.get(&nt).into_iter().flatten().copied()
    }

    /// What can follow `nt` in a sentential form derived from the start symbol.
    pub fn follow(&self, nt: Nonterminal) -> impl Iterator<Item = Lookahead> + '_ {
        self.follow.get(&nt).into_iter().flatten().copied()
    }

    /// Terminals that can begin the body of `rule`.
    #[must_use]
    pub fn rule_first(&self, rule: RuleId) -> &[TerminalId] {
        &self.rule_first[rule.index()]
    }

    /// Whether the body of `rule` derives the empty string.
    #[must_use]
    pub fn rule_nullable(&self, rule: RuleId) -> bool {
        self.rule_nullable[rule.index()]
    }

    fn sequence_nullable(&self, symbols: &[Symbol]) -> bool {
        symbols
            .iter()
            .all(|symbol| symbol.as_nonterminal().is_some_and(|nt| self.is_nullable(nt)))
    }

    fn first_of_sequence(&self, symbols: &[Symbol]) -> HashSet<TerminalId, ahash::RandomState> {
        let mut set = HashSet::default();
        for symbol in symbols {
            match *symbol {
                Symbol::Terminal(id) => {
                    set.insert(id);
                    break;
                }
                Symbol::Nonterminal(nt) => {
                    set.extend(self.first(nt));
                    if !self.is_nullable(nt) {
                        break;
                    }
                }
            }
        }
        set
    }
}
