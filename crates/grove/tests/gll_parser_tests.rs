//! Tests for GLL parser backend

use grove::backend::earley::{EarleyConfig, EarleyParser};
use grove::backend::gll::{GllConfig, GllParser};
use grove::backend::{Algorithm, Recognizer};
use grove::forest::{NodeLabel, ParseForest, Span};
use grove::grammar::{Grammar, Nonterminal, Symbol, TerminalSymbol};
use grove::UsageError;
use num_bigint::BigUint;

fn chars(text: &str) -> Vec<char> {
    text.chars().collect()
}

fn gll(grammar: &Grammar<char>, start: Nonterminal) -> GllParser<char> {
    GllParser::new(grammar, start, GllConfig::default()).unwrap()
}

/// `S → E`, `E → E '+' E | digit`
fn sum_grammar() -> (Grammar<char>, Nonterminal) {
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let e = grammar.nonterminal("E");
    let plus = grammar.token('+');
    let digit = grammar.terminal(TerminalSymbol::range('0', '9'));
    grammar.add_rule(s, [e]).unwrap();
    grammar.add_rule(e, [e.into(), plus, e.into()]).unwrap();
    grammar.add_rule(e, [digit]).unwrap();
    (grammar, s)
}

/// `S → A B`, `A → 'a'`, `B → 'b' B | ε`
fn prefix_grammar() -> (Grammar<char>, Nonterminal) {
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a_nt = grammar.nonterminal("A");
    let b_nt = grammar.nonterminal("B");
    let a = grammar.token('a');
    let b = grammar.token('b');
    grammar.add_rule(s, [a_nt, b_nt]).unwrap();
    grammar.add_rule(a_nt, [a]).unwrap();
    grammar.add_rule(b_nt, [b, b_nt.into()]).unwrap();
    grammar.add_rule(b_nt, Vec::<Symbol>::new()).unwrap();
    (grammar, s)
}

/// `expr → word`, `word → letter word | ε`, `letter → [a-z] | ε`
fn word_grammar() -> (Grammar<char>, Nonterminal) {
    let mut grammar = Grammar::new();
    let expr = grammar.nonterminal("expr");
    let word = grammar.nonterminal("word");
    let letter = grammar.nonterminal("letter");
    let lower = grammar.terminal(TerminalSymbol::range('a', 'z'));
    grammar.add_rule(expr, [word]).unwrap();
    grammar.add_rule(word, [letter, word]).unwrap();
    grammar.add_rule(word, Vec::<Symbol>::new()).unwrap();
    grammar.add_rule(letter, [lower]).unwrap();
    grammar.add_rule(letter, Vec::<Symbol>::new()).unwrap();
    (grammar, expr)
}

/// Nodes as `(label name, span, family count)`, sorted.
fn shape(forest: &ParseForest<char>) -> Vec<(String, Span, usize)> {
    let mut nodes: Vec<_> = forest
        .nodes()
        .map(|(id, node)| {
            (
                forest.label_name(node.label()).into_owned(),
                forest.span(id),
                node.families().len(),
            )
        })
        .collect();
    nodes.sort_by(|a, b| (&a.0, a.1.start, a.1.end).cmp(&(&b.0, b.1.start, b.1.end)));
    nodes
}

#[test]
fn test_unambiguous_parse_has_one_tree() {
    let (grammar, s) = prefix_grammar();
    let result = gll(&grammar, s).parse(&chars("abbb"));

    assert!(result.succeeded());
    assert_eq!(result.algorithm(), Algorithm::Gll);
    let forest = result.forest().unwrap();
    assert!(!forest.is_ambiguous());
    assert_eq!(forest.exact_total_parses(), &BigUint::from(1u32));
    assert!(result.chart().is_none());
}

#[test]
fn test_exact_ambiguity_count() {
    let mut grammar = Grammar::new();
    let expr = grammar.nonterminal("expr");
    let letter = grammar.nonterminal("letter");
    let letter_or_number = grammar.nonterminal("letterOrNumber");
    let number = grammar.nonterminal("number");
    let x = grammar.token('x');
    let b = grammar.token('b');
    let lower = grammar.terminal(TerminalSymbol::range('a', 'z'));
    let digit = grammar.terminal(TerminalSymbol::range('0', '9'));
    grammar
        .add_rule(expr, [x, letter.into(), letter_or_number.into(), letter.into()])
        .unwrap();
    grammar.add_rule(letter_or_number, [letter]).unwrap();
    grammar.add_rule(letter_or_number, [number]).unwrap();
    grammar.add_rule(letter, [lower]).unwrap();
    grammar.add_rule(number, [digit]).unwrap();
    grammar.add_rule(number, [b]).unwrap();

    let result = gll(&grammar, expr).parse(&chars("xabb"));
    assert!(result.succeeded());
    let forest = result.forest().unwrap();
    assert!(forest.is_ambiguous());
    assert_eq!(forest.total_parses(), 2);
}

#[test]
fn test_infinite_ambiguity_with_finite_count() {
    let (grammar, expr) = word_grammar();
    let result = gll(&grammar, expr).parse(&chars("word"));

    assert!(result.succeeded());
    let forest = result.forest().unwrap();
    assert!(forest.is_infinitely_ambiguous());
    assert_eq!(forest.exact_total_parses(), &BigUint::from(2u32));
}

#[test]
fn test_prefix_parsing_and_continuation() {
    let (grammar, s) = prefix_grammar();
    let config = GllConfig::default().with_prefix_parsing(true);
    let mut parser = GllParser::new(&grammar, s, config).unwrap();
    let input = chars("abbabbbba");

    let first = parser.parse(&input);
    assert!(first.prefix_succeeded());
    assert_eq!(first.prefix_end(), Some(3));

    let second = first.continue_parsing(&mut parser, &input).unwrap();
    assert!(second.prefix_succeeded());
    assert_eq!(second.prefix_end(), Some(8));

    let third = second.continue_parsing(&mut parser, &input).unwrap();
    assert!(third.succeeded());
    let forest = third.forest().unwrap();
    assert_eq!(forest.span(forest.roots()[0]), Span::new(8, 9));
    assert_eq!(
        third.continue_parsing(&mut parser, &input).unwrap_err(),
        UsageError::NoPrefix
    );
}

#[test]
fn test_failure_diagnostics() {
    let (grammar, s) = sum_grammar();
    let result = gll(&grammar, s).parse(&chars("1+2-3"));

    assert!(!result.succeeded());
    assert!(!result.prefix_succeeded());
    assert_eq!(result.token_count(), 4);
    assert_eq!(result.last_token(), Some(&'-'));
    assert!(result.more_input());
}

#[test]
fn test_forest_matches_earley() {
    let (sum, s) = sum_grammar();
    let (word, expr) = word_grammar();
    let (prefix, p) = prefix_grammar();
    let cases = [
        (&sum, s, "1+2+3+4"),
        (&word, expr, "word"),
        (&prefix, p, "abbbb"),
    ];
    for (grammar, start, text) in cases {
        let input = chars(text);
        let earley = EarleyParser::new(grammar, start, EarleyConfig::default())
            .unwrap()
            .parse(&input);
        let generalized = gll(grammar, start).parse(&input);
        let (earley, gll) = (earley.forest().unwrap(), generalized.forest().unwrap());

        assert_eq!(shape(earley), shape(gll), "{text}");
        assert_eq!(earley.exact_total_parses(), gll.exact_total_parses(), "{text}");
        assert_eq!(earley.is_ambiguous(), gll.is_ambiguous(), "{text}");
        assert_eq!(
            earley.is_infinitely_ambiguous(),
            gll.is_infinitely_ambiguous(),
            "{text}"
        );
    }
}

#[test]
fn test_mutual_recursion_counts_match_earley() {
    // S → B | A, A → B | 'a', B → A, with S's rules in both orders
    for swapped in [false, true] {
        let mut grammar = Grammar::new();
        let s = grammar.nonterminal("S");
        let a_nt = grammar.nonterminal("A");
        let b_nt = grammar.nonterminal("B");
        let a = grammar.token('a');
        let alternatives = if swapped { [a_nt, b_nt] } else { [b_nt, a_nt] };
        for alternative in alternatives {
            grammar.add_rule(s, [alternative]).unwrap();
        }
        grammar.add_rule(a_nt, [b_nt]).unwrap();
        grammar.add_rule(a_nt, [a]).unwrap();
        grammar.add_rule(b_nt, [a_nt]).unwrap();

        let input = chars("a");
        let earley = EarleyParser::new(&grammar, s, EarleyConfig::default())
            .unwrap()
            .parse(&input);
        let generalized = gll(&grammar, s).parse(&input);
        let (earley, gll) = (earley.forest().unwrap(), generalized.forest().unwrap());

        assert_eq!(shape(earley), shape(gll));
        assert!(earley.is_infinitely_ambiguous());
        assert!(gll.is_infinitely_ambiguous());
        assert_eq!(earley.total_parses(), 1, "swapped={swapped}");
        assert_eq!(gll.total_parses(), 1, "swapped={swapped}");
    }
}

#[test]
fn test_intermediate_nodes_span_rule_prefixes() {
    // S → 'a' 'b' 'c'
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a = grammar.token('a');
    let b = grammar.token('b');
    let c = grammar.token('c');
    grammar.add_rule(s, [a, b, c]).unwrap();

    let result = gll(&grammar, s).parse(&chars("abc"));
    let forest = result.forest().unwrap();
    let intermediate: Vec<_> = forest
        .nodes()
        .filter(|(_, node)| node.label().is_intermediate())
        .map(|(id, node)| (forest.label_name(node.label()).into_owned(), forest.span(id)))
        .collect();
    assert_eq!(intermediate, vec![("S → 'a' 'b' · 'c'".to_string(), Span::new(0, 2))]);
    let root = forest.roots()[0];
    assert_eq!(
        forest.find(NodeLabel::Symbol(Symbol::Nonterminal(s)), 0, 3),
        Some(root)
    );
}

#[test]
fn test_follow_check_does_not_change_results() {
    let (grammar, expr) = word_grammar();
    for follow_check in [true, false] {
        let config = GllConfig::default().with_follow_check(follow_check);
        let mut parser = GllParser::new(&grammar, expr, config).unwrap();
        let result = parser.parse(&chars("ab"));
        assert!(result.succeeded());
        assert_eq!(result.forest().unwrap().total_parses(), 2);
        assert!(!parser.parse(&chars("a1")).succeeded());
    }
}

#[test]
fn test_capabilities() {
    let capabilities = GllParser::<char>::capabilities();
    assert_eq!(capabilities.name, "GLL");
    assert!(capabilities.supports_cycles);
}
