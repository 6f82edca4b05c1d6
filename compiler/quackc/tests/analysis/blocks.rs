//! Blocks: `yield`, block parameters and generic block methods.

use pretty_assertions::assert_eq;
use quack_ir::{NodeId, TreeBuilder};
use quack_types::Value;

use crate::common::{analyze, int};

/// `def name; yield(args...); end`
fn yielder(b: &mut TreeBuilder<'_>, name: &str, args: &[i64]) -> NodeId {
    let params = b.params(&[]);
    let args: Vec<NodeId> = args.iter().map(|n| b.int(*n)).collect();
    let body = b.yield_(&args);
    b.defn(name, params, Some(body))
}

/// `{ |params...| body }` where `body` reads `result`.
fn block_reading(b: &mut TreeBuilder<'_>, call: NodeId, params: &[&str], result: &str) -> NodeId {
    let params: Vec<NodeId> = params.iter().map(|p| b.param(p)).collect();
    let params = b.params(&params);
    let body = b.lvar(result);
    b.iter(call, Some(params), Some(body))
}

#[test]
fn yield_feeds_block_result_back() {
    // def foo(a); 4 + yield(a - 1); end; foo(7) { |x| x * 42 }
    let unit = analyze(|b| {
        let pa = b.param("a");
        let params = b.params(&[pa]);
        let four = b.int(4);
        let a = b.lvar("a");
        let one = b.int(1);
        let arg = b.send(a, "-", &[one]);
        let yielded = b.yield_(&[arg]);
        let sum = b.send(four, "+", &[yielded]);
        let def = b.defn("foo", params, Some(sum));

        let seven = b.int(7);
        let call = b.fcall("foo", &[seven]);
        let px = b.param("x");
        let block_params = b.params(&[px]);
        let x = b.lvar("x");
        let factor = b.int(42);
        let product = b.send(x, "*", &[factor]);
        let iter = b.iter(call, Some(block_params), Some(product));
        b.block(&[def, iter])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(256));
}

#[test]
fn missing_block_argument_is_nil() {
    // def foo; yield 1; end; foo { |a, b| b }
    let unit = analyze(|b| {
        let def = yielder(b, "foo", &[1]);
        let call = b.fcall("foo", &[]);
        let iter = block_reading(b, call, &["a", "b"], "b");
        b.block(&[def, iter])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.class_name().as_deref(), Some("NilClass"));
}

#[test]
fn excess_block_parameters_bind_nil() {
    // def foo; yield 1, 2, 3; end; foo { |a, b, c, d| d }
    let unit = analyze(|b| {
        let def = yielder(b, "foo", &[1, 2, 3]);
        let call = b.fcall("foo", &[]);
        let iter = block_reading(b, call, &["a", "b", "c", "d"], "d");
        b.block(&[def, iter])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.class_name().as_deref(), Some("NilClass"));
}

#[test]
fn block_parameters_take_yielded_values() {
    // def foo; yield 1, 2, 3; end; foo { |a, b, c| c }
    let unit = analyze(|b| {
        let def = yielder(b, "foo", &[1, 2, 3]);
        let call = b.fcall("foo", &[]);
        let iter = block_reading(b, call, &["a", "b", "c"], "c");
        b.block(&[def, iter])
    });
    assert_eq!(unit.value(), &int(3));
}

#[test]
fn yield_without_block_is_reported() {
    let unit = analyze(|b| {
        b.at(2);
        let def = yielder(b, "foo", &[]);
        b.at(4);
        let call = b.fcall("foo", &[]);
        b.block(&[def, call])
    });
    assert_eq!(unit.issues(), vec!["test.rb:2 no block given (yield)"]);
    assert_eq!(unit.value(), &Value::Broken);
}

#[test]
fn block_reads_enclosing_locals() {
    // base = 10; def run; yield; end; run { base + 1 }
    let unit = analyze(|b| {
        let ten = b.int(10);
        let base = b.lasgn("base", ten);
        let def = yielder(b, "run", &[]);
        let call = b.fcall("run", &[]);
        let read = b.lvar("base");
        let one = b.int(1);
        let sum = b.send(read, "+", &[one]);
        let iter = b.iter(call, None, Some(sum));
        b.block(&[base, def, iter])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(11));
}

#[test]
fn then_resolves_to_block_result_type() {
    // 5.then { |x| x.to_s }
    let unit = analyze(|b| {
        let five = b.int(5);
        let call = b.send(five, "then", &[]);
        let px = b.param("x");
        let params = b.params(&[px]);
        let x = b.lvar("x");
        let body = b.send(x, "to_s", &[]);
        b.iter(call, Some(params), Some(body))
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "#<String>");
}

#[test]
fn tap_returns_receiver() {
    // 5.tap { |x| x + 1 }
    let unit = analyze(|b| {
        let five = b.int(5);
        let call = b.send(five, "tap", &[]);
        let px = b.param("x");
        let params = b.params(&[px]);
        let x = b.lvar("x");
        let one = b.int(1);
        let body = b.send(x, "+", &[one]);
        b.iter(call, Some(params), Some(body))
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(5));
}

#[test]
fn required_block_missing_is_a_mismatch() {
    let unit = analyze(|b| {
        let five = b.int(5);
        b.send(five, "then", &[])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:1 Wrong argument type (block required)"]
    );
}
