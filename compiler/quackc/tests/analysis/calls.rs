//! Call checking: arity, keywords, argument types, undefined names.

use pretty_assertions::assert_eq;
use quack_ir::{NodeId, TreeBuilder};
use quack_types::Value;

use crate::common::{analyze, int};

/// `class Foo; def foo(a, b); end; end`
fn foo_class(b: &mut TreeBuilder<'_>) -> NodeId {
    let pa = b.param("a");
    let pb = b.param("b");
    let params = b.params(&[pa, pb]);
    let def = b.defn("foo", params, None);
    b.class("Foo", None, Some(def))
}

/// `Foo.new.foo(args...)`
fn call_foo(b: &mut TreeBuilder<'_>, args: &[i64]) -> NodeId {
    let args: Vec<NodeId> = args.iter().map(|n| b.int(*n)).collect();
    let class = b.constant("Foo");
    let object = b.send(class, "new", &[]);
    b.send(object, "foo", &args)
}

#[test]
fn too_few_arguments() {
    let unit = analyze(|b| {
        let class = foo_class(b);
        b.at(2);
        let call = call_foo(b, &[1]);
        b.block(&[class, call])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 Wrong number of arguments (given 1, expected 2)"]
    );
    assert_eq!(unit.value(), &Value::Broken);
}

#[test]
fn too_many_arguments() {
    let unit = analyze(|b| {
        let class = foo_class(b);
        b.at(2);
        let call = call_foo(b, &[1, 2, 3]);
        b.block(&[class, call])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 Wrong number of arguments (given 3, expected 2)"]
    );
}

#[test]
fn matching_call_returns_method_value() {
    let unit = analyze(|b| {
        let class = foo_class(b);
        let call = call_foo(b, &[1, 2]);
        b.block(&[class, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &Value::nil());
}

#[test]
fn optional_parameter_range() {
    // def opt(a, b = 1); a + b; end; opt; opt(2)
    let unit = analyze(|b| {
        let pa = b.param("a");
        let one = b.int(1);
        let pb = b.opt_param("b", one);
        let params = b.params(&[pa, pb]);
        let a = b.lvar("a");
        let bv = b.lvar("b");
        let sum = b.send(a, "+", &[bv]);
        let def = b.defn("opt", params, Some(sum));
        b.at(2);
        let bad = b.fcall("opt", &[]);
        b.at(3);
        let two = b.int(2);
        let good = b.fcall("opt", &[two]);
        b.block(&[def, bad, good])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 Wrong number of arguments (given 0, expected 1..2)"]
    );
    assert_eq!(unit.value(), &int(3));
}

#[test]
fn rest_parameter_collects_extra_arguments() {
    // def r(a, *rest); rest; end; r; r(1, 2, 3).length
    let unit = analyze(|b| {
        let pa = b.param("a");
        let rest = b.rest_param("rest");
        let params = b.params(&[pa, rest]);
        let body = b.lvar("rest");
        let def = b.defn("r", params, Some(body));
        b.at(2);
        let bad = b.fcall("r", &[]);
        b.at(3);
        let args = [b.int(1), b.int(2), b.int(3)];
        let call = b.fcall("r", &args);
        let length = b.send(call, "length", &[]);
        b.block(&[def, bad, length])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 Wrong number of arguments (given 0, expected 1+)"]
    );
    assert_eq!(unit.value(), &int(2));
}

#[test]
fn rest_parameter_is_array_of_its_arguments() {
    // def r(a, *rest); rest; end; r(1, 2, "x")
    let unit = analyze(|b| {
        let pa = b.param("a");
        let rest = b.rest_param("rest");
        let params = b.params(&[pa, rest]);
        let body = b.lvar("rest");
        let def = b.defn("r", params, Some(body));
        let args = [b.int(1), b.int(2), b.str("x")];
        let call = b.fcall("r", &args);
        b.block(&[def, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), r#"[2:Integer, "x":String]:Array"#);
}

#[test]
fn keyword_problems_aggregate_into_one_issue() {
    // def kw(a:, b: 2); end; kw(c: 1)
    let unit = analyze(|b| {
        let a = b.kw_param("a");
        let two = b.int(2);
        let kb = b.opt_kw_param("b", two);
        let params = b.params(&[a, kb]);
        let def = b.defn("kw", params, None);
        b.at(2);
        let one = b.int(1);
        let pair = b.pair("c", one);
        let call = b.fcall("kw", &[pair]);
        b.block(&[def, call])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 Wrong number of arguments (missing required keywords: a; unknown keywords: c)"]
    );
}

#[test]
fn keyword_arguments_bind() {
    // def kw(a:, b: 2); a * b; end; kw(a: 5)
    let unit = analyze(|b| {
        let a = b.kw_param("a");
        let two = b.int(2);
        let kb = b.opt_kw_param("b", two);
        let params = b.params(&[a, kb]);
        let av = b.lvar("a");
        let bv = b.lvar("b");
        let product = b.send(av, "*", &[bv]);
        let def = b.defn("kw", params, Some(product));
        let five = b.int(5);
        let pair = b.pair("a", five);
        let call = b.fcall("kw", &[pair]);
        b.block(&[def, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(10));
}

#[test]
fn builtin_argument_type_mismatch() {
    let unit = analyze(|b| {
        let one = b.int(1);
        let s = b.str("s");
        b.send(one, "+", &[s])
    });
    assert_eq!(
        unit.issues(),
        vec![r#"test.rb:1 Wrong argument type (argument 1 expected Integer, given "s":String)"#]
    );
}

#[test]
fn undefined_method_on_literal() {
    let unit = analyze(|b| {
        let one = b.int(1);
        let two = b.int(2);
        b.send(one, "frob", &[two])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:1 Undefined method `frob' for 1:Integer"]
    );
}

#[test]
fn undefined_local_or_method_on_main() {
    let unit = analyze(|b| b.fcall("x", &[]));
    assert_eq!(
        unit.issues(),
        vec!["test.rb:1 Undefined local variable or method `x' for main:Object"]
    );
}

#[test]
fn broken_receiver_reports_once() {
    // x.foo(1).bar
    let unit = analyze(|b| {
        let x = b.lvar("x");
        let one = b.int(1);
        let foo = b.send(x, "foo", &[one]);
        b.send(foo, "bar", &[])
    });
    assert_eq!(unit.issues().len(), 1);
    assert_eq!(unit.value(), &Value::Broken);
}

#[test]
fn float_division_by_integer() {
    let unit = analyze(|b| {
        let x = b.float(5.0);
        let two = b.int(2);
        b.send(x, "/", &[two])
    });
    assert_eq!(unit.describe(), "2.5:Float");
}

#[test]
fn string_conversion_resolves_through_duck_type() {
    // String(5)
    let unit = analyze(|b| {
        let five = b.int(5);
        b.fcall("String", &[five])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.class_name().as_deref(), Some("String"));
}
