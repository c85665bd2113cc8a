//! Tests for grammar construction, closing and analysis

use grove::backend::earley::{EarleyConfig, EarleyParser};
use grove::backend::Recognizer;
use grove::grammar::{Grammar, Lookahead, PreparedGrammar, Symbol, TerminalSymbol, PRIORITY};
use grove::GrammarError;

fn chars(text: &str) -> Vec<char> {
    text.chars().collect()
}

#[test]
fn test_optional_items_accept_both_forms() {
    // S → 'a'? 'b' 'a'?
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a = grammar.token('a');
    let b = grammar.token('b');
    grammar
        .add_rule(s, [a.optional(), b.into(), a.optional()])
        .unwrap();

    let mut parser = EarleyParser::new(&grammar, s, EarleyConfig::default()).unwrap();
    for text in ["b", "ab", "ba", "aba"] {
        let result = parser.parse(&chars(text));
        assert!(result.succeeded(), "{text}");
        assert_eq!(result.forest().unwrap().total_parses(), 1, "{text}");
    }
    for text in ["", "a", "aab", "abb"] {
        assert!(!parser.parse(&chars(text)).succeeded(), "{text}");
    }
}

#[test]
fn test_preparing_leaves_caller_grammar_open() {
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a = grammar.token('a');
    grammar.add_rule(s, [a.optional()]).unwrap();

    let prepared = PreparedGrammar::new(&grammar, s).unwrap();
    assert!(!grammar.is_closed());
    assert!(prepared.grammar().is_closed());
    assert_eq!(prepared.rules_for(s).len(), 2);

    // Still open, so more rules can be added.
    let b = grammar.token('b');
    assert!(grammar.add_rule(s, [b]).is_ok());
}

#[test]
fn test_closed_grammar_rejects_new_rules() {
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a = grammar.token('a');
    grammar.add_rule(s, [a]).unwrap();
    let mut grammar = grammar.closed();

    let error = grammar.add_rule(s, [a]).unwrap_err();
    assert_eq!(error, GrammarError::ClosedGrammar { lhs: "S".into() });
    assert_eq!(
        error.to_string(),
        "cannot add a rule for `S`: the grammar is closed"
    );
    // Attributes may still be set after closing.
    assert!(grammar.set_attribute(s.into(), PRIORITY, "3").is_ok());
    assert_eq!(grammar.attributes(s.into()).priority(), Some(3));
}

#[test]
fn test_undefined_start_symbol() {
    let mut grammar = Grammar::<char>::new();
    let s = grammar.nonterminal("S");
    let t = grammar.nonterminal("T");
    let a = grammar.token('a');
    grammar.add_rule(s, [a]).unwrap();

    let error = PreparedGrammar::new(&grammar, t).unwrap_err();
    assert_eq!(error, GrammarError::UndefinedStart { name: "T".into() });
    assert!(error.to_string().contains("`T`"));
}

#[test]
fn test_rules_with_undefined_symbols_are_left_out() {
    // S → A | 'a' ; A → missing 'b' ; B → 'b' (unreachable but defined)
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a_nt = grammar.nonterminal("A");
    let b_nt = grammar.nonterminal("B");
    let missing = grammar.nonterminal("missing");
    let a = grammar.token('a');
    let b = grammar.token('b');
    grammar.add_rule(s, [a_nt]).unwrap();
    grammar.add_rule(s, [a]).unwrap();
    grammar.add_rule(a_nt, [missing.into(), b]).unwrap();
    grammar.add_rule(b_nt, [b]).unwrap();

    let prepared = PreparedGrammar::new(&grammar, s).unwrap();
    assert_eq!(prepared.undefined_nonterminals(), &[missing]);
    assert_eq!(prepared.rules_for(s).len(), 1);
    assert!(prepared.rules_for(a_nt).is_empty());
    assert_eq!(prepared.rules_for(b_nt).len(), 1);

    let mut parser = EarleyParser::from_prepared(prepared.into(), EarleyConfig::default());
    assert!(parser.parse(&chars("a")).succeeded());
    assert!(!parser.parse(&chars("b")).succeeded());
}

#[test]
fn test_nullable_first_and_follow() {
    // E → T R ; R → '+' T R | ε ; T → digit | '(' E ')'
    let mut grammar = Grammar::new();
    let e = grammar.nonterminal("E");
    let r = grammar.nonterminal("R");
    let t = grammar.nonterminal("T");
    let plus = grammar.token('+');
    let open = grammar.token('(');
    let close = grammar.token(')');
    let digit = grammar.terminal(TerminalSymbol::range('0', '9'));
    grammar.add_rule(e, [t, r]).unwrap();
    grammar.add_rule(r, [plus, t.into(), r.into()]).unwrap();
    grammar.add_rule(r, Vec::<Symbol>::new()).unwrap();
    grammar.add_rule(t, [digit]).unwrap();
    grammar.add_rule(t, [open, e.into(), close]).unwrap();

    let prepared = PreparedGrammar::new(&grammar, e).unwrap();
    let analysis = prepared.analysis();
    let terminal = |symbol: Symbol| symbol.as_terminal().unwrap();

    assert!(analysis.is_nullable(r));
    assert!(!analysis.is_nullable(e));
    assert!(!analysis.is_nullable(t));

    let mut first_e: Vec<_> = analysis.first(e).collect();
    first_e.sort();
    let mut expected = vec![terminal(digit), terminal(open)];
    expected.sort();
    assert_eq!(first_e, expected);
    assert_eq!(analysis.first(r).collect::<Vec<_>>(), vec![terminal(plus)]);

    let follow_r: Vec<_> = analysis.follow(r).collect();
    assert!(follow_r.contains(&Lookahead::EndOfInput));
    assert!(follow_r.contains(&Lookahead::Terminal(terminal(close))));
    assert!(!follow_r.contains(&Lookahead::Terminal(terminal(plus))));

    let follow_t: Vec<_> = analysis.follow(t).collect();
    assert!(follow_t.contains(&Lookahead::Terminal(terminal(plus))));
    assert!(follow_t.contains(&Lookahead::Terminal(terminal(close))));
    assert!(follow_t.contains(&Lookahead::EndOfInput));
}

#[test]
fn test_dotted_states_display() {
    let mut grammar = Grammar::new();
    let s = grammar.nonterminal("S");
    let a = grammar.token('a');
    let b = grammar.token('b');
    grammar.add_rule(s, [a, b]).unwrap();

    let prepared = PreparedGrammar::new(&grammar, s).unwrap();
    let rule = prepared.rules_for(s)[0];
    let states = prepared.states();
    let initial = states.initial(rule);
    let middle = states.advance(initial).unwrap();
    let complete = states.advance(middle).unwrap();

    assert_eq!(prepared.display_state(initial), "S → · 'a' 'b'");
    assert_eq!(prepared.display_state(middle), "S → 'a' · 'b'");
    assert_eq!(prepared.display_state(complete), "S → 'a' 'b' ·");
    assert!(states.is_complete(complete));
    assert_eq!(states.retreat(complete), Some(middle));
    assert!(states.advance(complete).is_err());
}

#[test]
fn test_terminal_matchers() {
    let vowels = TerminalSymbol::chars("aeiou");
    let any = TerminalSymbol::<char>::any();
    let even = TerminalSymbol::predicate("even digit", |c: &char| {
        c.to_digit(10).is_some_and(|d| d % 2 == 0)
    });

    assert!(vowels.matches(&'e'));
    assert!(!vowels.matches(&'x'));
    assert!(any.matches(&'x'));
    assert!(even.matches(&'4'));
    assert!(!even.matches(&'3'));
    assert_eq!(even.name(), "even digit");

    let spaces = TerminalSymbol::token(' ').greedy();
    let input = chars("   x");
    assert_eq!(spaces.match_len(&input, 0), 3);
    assert_eq!(spaces.match_len(&input, 3), 0);
}
