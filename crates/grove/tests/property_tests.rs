//! Property-based tests for both recognizer backends
//!
//! These tests use proptest to generate random inputs over small alphabets
//! and check that the Earley and GLL backends agree with each other and
//! with counts computed independently.

#![cfg(test)]

use grove::backend::earley::{EarleyConfig, EarleyParser};
use grove::backend::gll::{GllConfig, GllParser};
use grove::backend::Recognizer;
use grove::grammar::{Grammar, Nonterminal, Symbol, TerminalSymbol};
use grove::walker::ParseTreeBuilder;
use num_bigint::BigUint;
use proptest::prelude::*;

/// `E → E '+' E | E '*' E | '(' E ')' | digit`
fn expression_grammar() -> (Grammar<char>, Nonterminal) {
    let mut grammar = Grammar::new();
    let e = grammar.nonterminal("E");
    let plus = grammar.token('+');
    let times = grammar.token('*');
    let open = grammar.token('(');
    let close = grammar.token(')');
    let digit = grammar.terminal(TerminalSymbol::range('0', '9'));
    grammar.add_rule(e, [e.into(), plus, e.into()]).unwrap();
    grammar.add_rule(e, [e.into(), times, e.into()]).unwrap();
    grammar.add_rule(e, [open, e.into(), close]).unwrap();
    grammar.add_rule(e, [digit]).unwrap();
    (grammar, e)
}

/// `S → 'a' S 'b' | S S | ε`
fn balanced_grammar() -> (Grammar<char>, Nonterminal) {
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a = grammar.token('a');
    let b = grammar.token('b');
    grammar.add_rule(s, [a, s.into(), b]).unwrap();
    grammar.add_rule(s, [s, s]).unwrap();
    grammar.add_rule(s, Vec::<Symbol>::new()).unwrap();
    (grammar, s)
}

fn catalan(n: u32) -> BigUint {
    // C(n) = (2n)! / ((n + 1)! n!)
    let mut value = BigUint::from(1u32);
    for k in 0..n {
        value = value * BigUint::from(2 * (2 * k + 1)) / BigUint::from(k + 2);
    }
    value
}

fn expression_input() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop::sample::select(vec!['1', '2', '+', '*', '(', ')']), 0..9)
        .prop_map(|atoms| atoms.into_iter().collect())
}

/// Rules over nonterminals `A`, `B`, `C` (symbols 0 to 2) and tokens
/// `'a'`, `'b'` (symbols 3 and 4). The first rule always belongs to `A`.
fn small_grammar() -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
    let rule = (0usize..3, proptest::collection::vec(0usize..5, 0..4));
    proptest::collection::vec(rule, 1..7).prop_map(|mut rules| {
        rules[0].0 = 0;
        rules
    })
}

fn build_grammar(rules: &[(usize, Vec<usize>)]) -> (Grammar<char>, Nonterminal) {
    let mut grammar = Grammar::new();
    let nonterminals = ["A", "B", "C"].map(|name| grammar.nonterminal(name));
    let tokens = [grammar.token('a'), grammar.token('b')];
    for (lhs, rhs) in rules {
        let rhs: Vec<Symbol> = rhs
            .iter()
            .map(|&symbol| match symbol {
                0..=2 => Symbol::Nonterminal(nonterminals[symbol]),
                _ => tokens[symbol - 3],
            })
            .collect();
        grammar.add_rule(nonterminals[*lhs], rhs).unwrap();
    }
    (grammar, nonterminals[0])
}

proptest! {
    #[test]
    fn prop_backends_agree_on_expressions(text in expression_input()) {
        let (grammar, e) = expression_grammar();
        let input: Vec<char> = text.chars().collect();
        let earley = EarleyParser::new(&grammar, e, EarleyConfig::default()).unwrap().parse(&input);
        let gll = GllParser::new(&grammar, e, GllConfig::default()).unwrap().parse(&input);

        prop_assert_eq!(earley.succeeded(), gll.succeeded());
        prop_assert_eq!(earley.token_count(), gll.token_count());
        prop_assert_eq!(earley.last_token(), gll.last_token());
        prop_assert_eq!(earley.more_input(), gll.more_input());
        if let (Some(left), Some(right)) = (earley.forest(), gll.forest()) {
            prop_assert_eq!(left.exact_total_parses(), right.exact_total_parses());
            prop_assert_eq!(left.is_ambiguous(), right.is_ambiguous());
        }
    }

    #[test]
    fn prop_sum_chain_counts_are_catalan(operands in 1usize..12) {
        let (grammar, e) = expression_grammar();
        let input: Vec<char> = vec!["1"; operands].join("+").chars().collect();
        let result = EarleyParser::new(&grammar, e, EarleyConfig::default()).unwrap().parse(&input);
        prop_assert!(result.succeeded());
        let forest = result.forest().unwrap();
        prop_assert_eq!(forest.exact_total_parses(), &catalan(operands as u32 - 1));
    }

    #[test]
    fn prop_walker_produces_every_counted_tree(text in expression_input()) {
        let (grammar, e) = expression_grammar();
        let input: Vec<char> = text.chars().collect();
        let result = EarleyParser::new(&grammar, e, EarleyConfig::default()).unwrap().parse(&input);
        if let Some(forest) = result.forest() {
            let mut walker = forest.walker();
            let mut builder = ParseTreeBuilder::new();
            while walker.has_more_trees() {
                walker.next_tree(&mut builder).unwrap();
            }
            prop_assert_eq!(BigUint::from(builder.trees().len()), forest.exact_total_parses().clone());
            for (tree, _) in builder.trees() {
                prop_assert_eq!(tree.yield_tokens(), input.clone());
            }
        }
    }

    #[test]
    fn prop_infinite_grammar_parses_terminate(text in "[ab]{0,8}") {
        let (grammar, s) = balanced_grammar();
        let input: Vec<char> = text.chars().collect();
        let earley = EarleyParser::new(&grammar, s, EarleyConfig::default()).unwrap().parse(&input);
        let gll = GllParser::new(&grammar, s, GllConfig::default()).unwrap().parse(&input);
        prop_assert_eq!(earley.succeeded(), gll.succeeded());

        if let (Some(forest), Some(other)) = (earley.forest(), gll.forest()) {
            prop_assert!(forest.is_infinitely_ambiguous());
            prop_assert_eq!(forest.exact_total_parses(), other.exact_total_parses());

            let bound = forest.total_parses();
            let mut walker = forest.walker();
            let mut builder = ParseTreeBuilder::new();
            let mut walks = 0u64;
            while walker.has_more_trees() {
                prop_assert!(walks < bound, "more than {} trees from {:?}", bound, text);
                walker.next_tree(&mut builder).unwrap();
                walks += 1;
            }
            prop_assert!(walks >= 1);
            prop_assert_eq!(walker.remaining_parses(), 0);
            for (tree, _) in builder.trees() {
                prop_assert_eq!(tree.yield_tokens(), input.clone());
            }
        }
    }

    #[test]
    fn prop_backends_agree_on_cyclic_grammars(rules in small_grammar(), text in "[ab]{0,4}") {
        let (grammar, start) = build_grammar(&rules);
        let input: Vec<char> = text.chars().collect();
        let earley = EarleyParser::new(&grammar, start, EarleyConfig::default());
        let gll = GllParser::new(&grammar, start, GllConfig::default());
        prop_assert_eq!(earley.is_ok(), gll.is_ok());
        let (Ok(mut earley), Ok(mut gll)) = (earley, gll) else {
            return Ok(());
        };
        let earley = earley.parse(&input);
        let gll = gll.parse(&input);

        prop_assert_eq!(earley.succeeded(), gll.succeeded(), "{:?} on {:?}", rules, text);
        if let (Some(left), Some(right)) = (earley.forest(), gll.forest()) {
            prop_assert_eq!(
                left.exact_total_parses(),
                right.exact_total_parses(),
                "{:?} on {:?}",
                rules,
                text
            );
            prop_assert_eq!(left.is_ambiguous(), right.is_ambiguous());
            prop_assert_eq!(left.is_infinitely_ambiguous(), right.is_infinitely_ambiguous());
        }
    }
}
