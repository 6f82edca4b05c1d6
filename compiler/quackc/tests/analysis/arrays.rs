//! Arrays: literals, splats, element types and rest parameters.

use pretty_assertions::assert_eq;
use quack_ir::{NodeId, TreeBuilder};
use quack_types::Value;

use crate::common::{analyze, int, locals_equal, new_object};

fn ints(b: &mut TreeBuilder<'_>, values: &[i64]) -> Vec<NodeId> {
    values.iter().map(|n| b.int(*n)).collect()
}

fn one_two_three() -> Value {
    Value::union_all([&int(1), &int(2), &int(3)])
}

#[test]
fn empty_array_has_nil_element_type() {
    let unit = analyze(|b| b.array(&[]));
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "[]:Array");
    assert_eq!(unit.element_type(), Some(Value::nil()));
}

#[test]
fn literal_keeps_each_element() {
    // [1, 2, 3]
    let unit = analyze(|b| {
        let elements = ints(b, &[1, 2, 3]);
        b.array(&elements)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "[1:Integer, 2:Integer, 3:Integer]:Array");
    assert_eq!(unit.element_type(), Some(one_two_three()));
}

#[test]
fn splat_of_array_inlines_its_elements() {
    // a = [1, 2]; [*a, 3]
    let unit = analyze(|b| {
        let elements = ints(b, &[1, 2]);
        let literal = b.array(&elements);
        let assign = b.lasgn("a", literal);
        let a = b.lvar("a");
        let splat = b.splat(a);
        let three = b.int(3);
        let outer = b.array(&[splat, three]);
        b.block(&[assign, outer])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "[1:Integer, 2:Integer, 3:Integer]:Array");
    assert_eq!(unit.element_type(), Some(one_two_three()));
}

#[test]
fn splat_calls_user_to_a() {
    // class Foo; def to_a; [2, 3]; end; end; [1, *Foo.new]
    let unit = analyze(|b| {
        let params = b.params(&[]);
        let elements = ints(b, &[2, 3]);
        let body = b.array(&elements);
        let def = b.defn("to_a", params, Some(body));
        let class = b.class("Foo", None, Some(def));
        let one = b.int(1);
        let foo = b.constant("Foo");
        let object = b.send(foo, "new", &[]);
        let splat = b.splat(object);
        let outer = b.array(&[one, splat]);
        b.block(&[class, outer])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "[1:Integer, 2:Integer, 3:Integer]:Array");
    assert_eq!(unit.element_type(), Some(one_two_three()));
}

#[test]
fn splat_without_to_a_inserts_the_value() {
    // [1, *2, 3, *nil]
    let unit = analyze(|b| {
        let one = b.int(1);
        let two = b.int(2);
        let splat_two = b.splat(two);
        let three = b.int(3);
        let nil = b.nil();
        let splat_nil = b.splat(nil);
        b.array(&[one, splat_two, three, splat_nil])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "[1:Integer, 2:Integer, 3:Integer]:Array");
    assert_eq!(unit.element_type(), Some(one_two_three()));
}

#[test]
fn splat_of_merged_arrays_keeps_only_element_type() {
    // x = if a == b then [1] else [2, 3] end; [0, *x]
    let unit = analyze(|b| {
        let mut body = vec![new_object(b, "a"), new_object(b, "b")];
        let cond = locals_equal(b, "a", "b");
        let short = ints(b, &[1]);
        let short = b.array(&short);
        let long = ints(b, &[2, 3]);
        let long = b.array(&long);
        let branch = b.if_(cond, Some(short), Some(long));
        body.push(b.lasgn("x", branch));
        let zero = b.int(0);
        let x = b.lvar("x");
        let splat = b.splat(x);
        body.push(b.array(&[zero, splat]));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "#<Array[Integer]>");
    assert_eq!(
        unit.element_type(),
        Some(Value::union_all([&int(0), &int(1), &int(2), &int(3)]))
    );
}

#[test]
fn array_methods_fold_known_elements() {
    // [1, 2].length + [7, 8].first + ([] + [3]).first
    let unit = analyze(|b| {
        let pair = ints(b, &[1, 2]);
        let pair = b.array(&pair);
        let length = b.send(pair, "length", &[]);
        let other = ints(b, &[7, 8]);
        let other = b.array(&other);
        let first = b.send(other, "first", &[]);
        let sum = b.send(length, "+", &[first]);
        let empty = b.array(&[]);
        let three = b.int(3);
        let single = b.array(&[three]);
        let joined = b.send(empty, "+", &[single]);
        let head = b.send(joined, "first", &[]);
        b.send(sum, "+", &[head])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(12));
}

#[test]
fn first_of_empty_array_is_nil() {
    let unit = analyze(|b| {
        let empty = b.array(&[]);
        b.send(empty, "first", &[])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &Value::nil());
}

#[test]
fn array_conversion_wraps_scalars() {
    // Array(5)
    let unit = analyze(|b| {
        let five = b.int(5);
        b.fcall("Array", &[five])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "[5:Integer]:Array");
    assert_eq!(unit.element_type(), Some(int(5)));
}

#[test]
fn array_conversion_of_nil_is_empty() {
    let unit = analyze(|b| {
        let nil = b.nil();
        b.fcall("Array", &[nil])
    });
    assert_eq!(unit.describe(), "[]:Array");
}

#[test]
fn block_rest_parameter_collects_yielded_values() {
    // def foo; yield 1, 2, 3; end; foo { |a, *rest| rest }
    let unit = analyze(|b| {
        let params = b.params(&[]);
        let args = ints(b, &[1, 2, 3]);
        let body = b.yield_(&args);
        let def = b.defn("foo", params, Some(body));
        let call = b.fcall("foo", &[]);
        let pa = b.param("a");
        let rest = b.rest_param("rest");
        let block_params = b.params(&[pa, rest]);
        let result = b.lvar("rest");
        let iter = b.iter(call, Some(block_params), Some(result));
        b.block(&[def, iter])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "[2:Integer, 3:Integer]:Array");
}
