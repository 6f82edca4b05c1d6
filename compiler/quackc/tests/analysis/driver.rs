//! Processor behavior across units: parse failures, persistence, limits.

use pretty_assertions::assert_eq;
use quack_diagnostic::IssueKind;
use quack_eval::EvalConfig;
use quack_ir::{NodeId, TreeBuilder};
use quack_types::Value;
use quackc::{init_tracing, ParseError, Parser, Processor};

use crate::common::int;

/// Parser stand-in that hands back a tree built by a closure, or fails.
struct Canned<F>(F);

impl<F> Parser for Canned<F>
where
    F: FnMut(&str, &mut TreeBuilder<'_>) -> Result<NodeId, ParseError>,
{
    fn parse(&mut self, source: &str, builder: &mut TreeBuilder<'_>) -> Result<NodeId, ParseError> {
        (self.0)(source, builder)
    }
}

fn canned<F>(parse: F) -> Canned<F>
where
    F: FnMut(&str, &mut TreeBuilder<'_>) -> Result<NodeId, ParseError>,
{
    Canned(parse)
}

#[test]
fn parse_failure_yields_one_issue() {
    let mut processor = Processor::new().unwrap();
    let mut parser = canned(|_, _| {
        Err(ParseError {
            line: 3,
            message: "syntax error, unexpected end-of-input".to_owned(),
        })
    });
    let outcome = processor.process_source(&mut parser, "def foo(", "broken.rb");
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.issues[0].kind, IssueKind::ParseFailure);
    assert_eq!(
        outcome.issues[0].to_string(),
        "broken.rb:3 syntax error, unexpected end-of-input"
    );
    assert_eq!(outcome.result, Value::Broken);
}

#[test]
fn parsed_source_is_evaluated() {
    let mut processor = Processor::new().unwrap();
    let mut parser = canned(|source, b| {
        let n: i64 = source.trim().parse().map_err(|_| ParseError {
            line: 1,
            message: "expected an integer".to_owned(),
        })?;
        let lhs = b.int(n);
        let rhs = b.int(1);
        Ok(b.send(lhs, "+", &[rhs]))
    });
    let outcome = processor.process_source(&mut parser, "41", "ok.rb");
    assert!(!outcome.has_issues());
    assert_eq!(outcome.result, int(42));

    let outcome = processor.process_source(&mut parser, "forty-one", "bad.rb");
    assert_eq!(
        outcome.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["bad.rb:1 expected an integer"]
    );
}

#[test]
fn methods_persist_across_units_but_issues_do_not() {
    let mut processor = Processor::new().unwrap();

    // def twice(x); x + x; end; missing
    let first = {
        let mut b = processor.builder();
        let px = b.param("x");
        let params = b.params(&[px]);
        let lhs = b.lvar("x");
        let rhs = b.lvar("x");
        let sum = b.send(lhs, "+", &[rhs]);
        let def = b.defn("twice", params, Some(sum));
        let missing = b.lvar("missing");
        b.block(&[def, missing])
    };
    let outcome = processor.process_tree(first, "a.rb");
    assert_eq!(outcome.issues.len(), 1);

    // twice(4)
    let second = {
        let mut b = processor.builder();
        let four = b.int(4);
        b.fcall("twice", &[four])
    };
    let outcome = processor.process_tree(second, "b.rb");
    assert_eq!(outcome.issues, Vec::new());
    assert_eq!(outcome.result, int(8));
}

#[test]
fn locals_do_not_leak_between_units() {
    let mut processor = Processor::new().unwrap();
    let first = {
        let mut b = processor.builder();
        let one = b.int(1);
        b.lasgn("leftover", one)
    };
    processor.process_tree(first, "a.rb");

    let second = processor.builder().lvar("leftover");
    let outcome = processor.process_tree(second, "b.rb");
    assert_eq!(
        outcome.issues[0].to_string(),
        "b.rb:1 Undefined local variable or method `leftover' for main:Object"
    );
}

#[test]
fn call_depth_limit_cuts_off_unbounded_recursion() {
    let config = EvalConfig::default().with_max_call_depth(8);
    let mut processor = Processor::with_config(config).unwrap();
    assert_eq!(processor.config().max_call_depth, 8);

    // def count(n); count(n + 1); end; count(0)
    let root = {
        let mut b = processor.builder();
        let pn = b.param("n");
        let params = b.params(&[pn]);
        let n = b.lvar("n");
        let one = b.int(1);
        let next = b.send(n, "+", &[one]);
        let again = b.fcall("count", &[next]);
        let def = b.defn("count", params, Some(again));
        let zero = b.int(0);
        let call = b.fcall("count", &[zero]);
        b.block(&[def, call])
    };
    let outcome = processor.process_tree(root, "deep.rb");
    assert_eq!(outcome.issues, Vec::new());
    assert_eq!(outcome.result, Value::Broken);
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
