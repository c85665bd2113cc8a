use crate::error::GrammarError;
use crate::grammar::analysis::nullable_fixed_point;
use crate::grammar::attributes::{Attributes, Merge};
use crate::grammar::{
    Nonterminal, RhsItem, Rule, RuleId, Symbol, TerminalId, TerminalSymbol, Token,
};
use hashbrown::{HashMap, HashSet};
use lasso::Rodeo;
use smallvec::SmallVec;
use std::sync::Arc;

type RhsItems = SmallVec<[RhsItem; 4]>;

/// A context-free grammar.
///
/// Rules are added while the grammar is open. [`Grammar::close`] expands
/// optional occurrences and freezes the rule list; the closed rules are
/// what [`Grammar::rules`] returns.
///
/// Attributes are write-once per symbol and may be set at any time.
#[derive(Clone)]
pub struct Grammar<T: Token> {
    interner: Rodeo,
    terminals: Vec<TerminalSymbol<T>>,
    declared: Vec<(Nonterminal, RhsItems)>,
    declared_seen: HashSet<(Nonterminal, RhsItems), ahash::RandomState>,
    rules: Vec<Rule>,
    rule_index: HashMap<Rule, RuleId, ahash::RandomState>,
    by_lhs: HashMap<Nonterminal, SmallVec<[RuleId; 4]>, ahash::RandomState>,
    attributes: HashMap<Symbol, Arc<Attributes>, ahash::RandomState>,
    attribute_pool: HashSet<Arc<Attributes>, ahash::RandomState>,
    empty: Arc<Attributes>,
    closed: bool,
}

impl<T: Token> Default for Grammar<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> Grammar<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interner: Rodeo::new(),
            terminals: Vec::new(),
            declared: Vec::new(),
            declared_seen: HashSet::default(),
            rules: Vec::new(),
            rule_index: HashMap::default(),
            by_lhs: HashMap::default(),
            attributes: HashMap::default(),
            attribute_pool: HashSet::default(),
            empty: Arc::new(Attributes::new()),
            closed: false,
        }
    }

    /// The nonterminal called `name`, interning it on first use.
    pub fn nonterminal(&mut self, name: &str) -> Nonterminal {
        Nonterminal(self.interner.get_or_intern(name))
    }

    /// Look up an existing nonterminal without interning.
    #[must_use]
    pub fn find_nonterminal(&self, name: &str) -> Option<Nonterminal> {
        self.interner.get(name).map(Nonterminal)
    }

    /// Register a terminal definition.
    ///
    /// Exact-token and fixed-set terminals with identical definitions share
    /// one symbol; predicate terminals are always distinct.
    pub fn terminal(&mut self, terminal: TerminalSymbol<T>) -> Symbol {
        if let Some(index) = self
            .terminals
            .iter()
            .position(|existing| existing.same_definition(&terminal))
        {
            return Symbol::Terminal(TerminalId(index as u32));
        }
        self.terminals.push(terminal);
        Symbol::Terminal(TerminalId((self.terminals.len() - 1) as u32))
    }

    /// Shorthand for a terminal matching exactly `token`.
    pub fn token(&mut self, token: T) -> Symbol {
        self.terminal(TerminalSymbol::token(token))
    }

    /// Add `lhs → rhs`. Re-adding an identical rule has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::ClosedGrammar`] once the grammar is closed.
    pub fn add_rule<I>(&mut self, lhs: Nonterminal, rhs: I) -> Result<(), GrammarError>
    where
        I: IntoIterator,
        I::Item: Into<RhsItem>,
    {
        if self.closed {
            return Err(GrammarError::ClosedGrammar {
                lhs: self.nonterminal_name(lhs).into(),
            });
        }
        let items: RhsItems = rhs.into_iter().map(Into::into).collect();
        if self.declared_seen.insert((lhs, items.clone())) {
            self.declared.push((lhs, items));
        }
        Ok(())
    }

    /// Set an attribute on a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::AttributeConflict`] if the attribute already
    /// has a different value.
    pub fn set_attribute(
        &mut self,
        symbol: Symbol,
        name: &str,
        value: &str,
    ) -> Result<(), GrammarError> {
        let current = self.attributes(symbol);
        let next = match current.merge(name, value) {
            Merge::Unchanged => return Ok(()),
            Merge::Added(next) => next,
            Merge::Conflict(existing) => {
                return Err(GrammarError::AttributeConflict {
                    symbol: self.name(symbol).into(),
                    name: name.into(),
                    existing,
                    attempted: value.into(),
                })
            }
        };
        let shared = match self.attribute_pool.get(&next) {
            Some(shared) => Arc::clone(shared),
            None => {
                let shared = Arc::new(next);
                self.attribute_pool.insert(Arc::clone(&shared));
                shared
            }
        };
        self.attributes.insert(symbol, shared);
        Ok(())
    }

    /// The attribute set of a symbol (empty if none were set).
    #[must_use]
    pub fn attributes(&self, symbol: Symbol) -> &Attributes {
        self.attributes.get(&symbol).unwrap_or(&self.empty)
    }

    pub(crate) fn empty_attributes(&self) -> &Attributes {
        &self.empty
    }

    /// Close the grammar.
    ///
    /// Each optional occurrence of a symbol that is not already nullable is
    /// expanded into two rules, one with and one without the symbol.
    /// Occurrences of nullable symbols are kept as plain occurrences.
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let declared = std::mem::take(&mut self.declared);
        let nullable = nullable_fixed_point(
            declared.len(),
            |index| declared[index].0,
            |index, nullable| {
                declared[index].1.iter().all(|item| {
                    item.optional
                        || item
                            .symbol
                            .as_nonterminal()
                            .is_some_and(|nt| nullable.contains(&nt))
                })
            },
        );

        for (lhs, items) in &declared {
            let mut variants: Vec<SmallVec<[Symbol; 4]>> = vec![SmallVec::new()];
            for item in items {
                let expand = item.optional
                    && !item
                        .symbol
                        .as_nonterminal()
                        .is_some_and(|nt| nullable.contains(&nt));
                if expand {
                    let mut with_symbol = variants.clone();
                    for variant in &mut with_symbol {
                        variant.push(item.symbol);
                    }
                    variants.extend(with_symbol);
                } else {
                    for variant in &mut variants {
                        variant.push(item.symbol);
                    }
                }
            }
            for rhs in variants {
                self.push_rule(Rule { lhs: *lhs, rhs });
            }
        }
        self.declared = declared;
        self.closed = true;
        log::debug!(
            "closed grammar: {} declared rules, {} rules after expansion, {} terminals",
            self.declared.len(),
            self.rules.len(),
            self.terminals.len()
        );
    }

    /// Close the grammar and return it.
    #[must_use]
    pub fn closed(mut self) -> Self {
        self.close();
        self
    }

    fn push_rule(&mut self, rule: Rule) {
        if self.rule_index.contains_key(&rule) {
            return;
        }
        let id = RuleId(self.rules.len() as u32);
        self.by_lhs.entry(rule.lhs).or_default().push(id);
        self.rule_index.insert(rule.clone(), id);
        self.rules.push(rule);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Rules of the closed grammar; empty while the grammar is open.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    /// Closed rules with `nt` on the left-hand side.
    #[must_use]
    pub fn rules_for(&self, nt: Nonterminal) -> &[RuleId] {
        self.by_lhs.get(&nt).map_or(&[], |ids| ids.as_slice())
    }

    /// Whether any rule, open or closed, defines `nt`.
    #[must_use]
    pub fn defines(&self, nt: Nonterminal) -> bool {
        if self.closed {
            self.by_lhs.contains_key(&nt)
        } else {
            self.declared.iter().any(|(lhs, _)| *lhs == nt)
        }
    }

    /// Nonterminals used in some rule body but defined by no rule, in order of first use.
    #[must_use]
    pub fn undefined_nonterminals(&self) -> Vec<Nonterminal> {
        let defined: HashSet<Nonterminal> = self.declared.iter().map(|(lhs, _)| *lhs).collect();
        let mut seen = HashSet::new();
        self.declared
            .iter()
            .flat_map(|(_, items)| items.iter())
            .filter_map(|item| item.symbol.as_nonterminal())
            .filter(|nt| !defined.contains(nt) && seen.insert(*nt))
            .collect()
    }

    #[must_use]
    pub fn terminal_symbol(&self, id: TerminalId) -> &TerminalSymbol<T> {
        &self.terminals[id.index()]
    }

    #[must_use]
    pub fn terminals(&self) -> &[TerminalSymbol<T>] {
        &self.terminals
    }

    #[must_use]
    pub fn nonterminal_name(&self, nt: Nonterminal) -> &str {
        self.interner.resolve(&nt.0)
    }

    /// Display name of a symbol.
    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(id) => self.terminal_symbol(id).name(),
            Symbol::Nonterminal(nt) => self.nonterminal_name(nt),
        }
    }
}

impl<T: Token> std::fmt::Debug for Grammar<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("terminals", &self.terminals.len())
            .field("declared", &self.declared.len())
            .field("rules", &self.rules.len())
            .field("closed", &self.closed)
            .finish()
    }
}
