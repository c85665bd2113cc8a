//! Ambiguous arithmetic example
//!
//! This example demonstrates how to:
//! 1. Build an ambiguous grammar with optional items and priorities
//! 2. Recognize input with both the Earley and GLL backends
//! 3. Inspect ambiguity flags and exact tree counts
//! 4. Walk every parse tree, or only the preferred ones

use grove::backend::{LoggingMonitor, Recognizer};
use grove::grammar::{Grammar, Nonterminal, PRIORITY, TerminalSymbol};
use grove::walker::{ParseTreeBuilder, PrioritySelector};
use grove::{EarleyConfig, EarleyParser, GllConfig, GllParser, GrammarError};

/// `expr → sign? term | expr '+' expr | expr '*' expr`, `term → digit+ | '(' expr ')'`
fn arithmetic_grammar() -> Result<(Grammar<char>, Nonterminal), GrammarError> {
    let mut grammar = Grammar::new();
    let expr = grammar.nonterminal("expr");
    let product = grammar.nonterminal("product");
    let term = grammar.nonterminal("term");
    let sign = grammar.token('-');
    let plus = grammar.token('+');
    let times = grammar.token('*');
    let open = grammar.token('(');
    let close = grammar.token(')');
    let digits = grammar.terminal(TerminalSymbol::range('0', '9').greedy().named("number"));

    grammar.add_rule(expr, [sign.optional(), term.into()])?;
    grammar.add_rule(expr, [expr.into(), plus, expr.into()])?;
    grammar.add_rule(expr, [product])?;
    grammar.add_rule(product, [expr.into(), times, expr.into()])?;
    grammar.add_rule(term, [digits])?;
    grammar.add_rule(term, [open, expr.into(), close])?;
    // Prefer reading `a + b * c` with the product grouped first.
    grammar.set_attribute(product.into(), PRIORITY, "1")?;
    Ok((grammar, expr))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (grammar, expr) = arithmetic_grammar()?;
    let input: Vec<char> = "12+-3*4+(5)".chars().collect();

    let mut earley = EarleyParser::new(&grammar, expr, EarleyConfig::default())?;
    earley.set_progress_monitor(Box::new(LoggingMonitor::new(4)));
    let result = earley.parse(&input);
    println!(
        "earley: success={} work items={} time={:?}",
        result.succeeded(),
        result.metrics().work_items,
        result.metrics().parse_time
    );

    let mut gll = GllParser::new(&grammar, expr, GllConfig::default())?;
    let other = gll.parse(&input);
    println!("gll:    success={}", other.succeeded());

    let Some(forest) = result.forest() else {
        println!(
            "no parse: stopped after {} tokens at {:?}",
            result.token_count(),
            result.last_token()
        );
        return Ok(());
    };
    println!(
        "ambiguous={} infinitely ambiguous={} trees={}",
        forest.is_ambiguous(),
        forest.is_infinitely_ambiguous(),
        forest.exact_total_parses()
    );

    let mut walker = forest.walker();
    let mut builder = ParseTreeBuilder::new();
    while walker.has_more_trees() {
        walker.next_tree(&mut builder)?;
    }
    for (index, (tree, _)) in builder.trees().iter().enumerate() {
        println!("tree {index}: {tree}");
    }

    let mut preferred = forest.walker_with(Box::new(PrioritySelector));
    let mut builder = ParseTreeBuilder::new();
    preferred.next_tree(&mut builder)?;
    if let Some(tree) = builder.last() {
        println!("preferred: {tree}");
    }
    Ok(())
}
