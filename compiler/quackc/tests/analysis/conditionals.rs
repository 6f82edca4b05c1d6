//! Conditionals: merging, narrowing, early returns and `case`.

use pretty_assertions::assert_eq;
use quack_ir::{NodeId, TreeBuilder};
use quack_types::Value;

use crate::common::{analyze, float, int, locals_equal, new_object};

/// `a = Object.new; b = Object.new; c = Object.new`
fn three_objects(b: &mut TreeBuilder<'_>) -> Vec<NodeId> {
    vec![new_object(b, "a"), new_object(b, "b"), new_object(b, "c")]
}

#[test]
fn merged_literals_divide_per_member() {
    // if a == b then 5 else 5.0 end / 2
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let five = b.int(5);
        let five_f = b.float(5.0);
        let branch = b.if_(cond, Some(five), Some(five_f));
        let two = b.int(2);
        body.push(b.send(branch, "/", &[two]));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(2).union(&float(2.5)));
    assert_eq!(unit.describe(), "Maybe(2:Integer | 2.5:Float)");
}

#[test]
fn three_way_conditional_unions_all_branches() {
    // x = if a == b then 4 / 2 elsif a == c then 5.0 / 2 else 0 end
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let first = locals_equal(b, "a", "b");
        let four = b.int(4);
        let two = b.int(2);
        let quotient = b.send(four, "/", &[two]);
        let second = locals_equal(b, "a", "c");
        let five = b.float(5.0);
        let two = b.int(2);
        let half = b.send(five, "/", &[two]);
        let zero = b.int(0);
        let elsif = b.if_(second, Some(half), Some(zero));
        let outer = b.if_(first, Some(quotient), Some(elsif));
        body.push(b.lasgn("x", outer));
        body.push(b.lvar("x"));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(
        unit.value(),
        &Value::union_all([&int(2), &float(2.5), &int(0)])
    );
    assert_eq!(unit.describe(), "Maybe(0:Integer | 2:Integer | 2.5:Float)");
}

#[test]
fn possibly_nil_receiver_is_reported() {
    // x = if a == b then 4 end; x / 2
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let four = b.int(4);
        let branch = b.if_(cond, Some(four), None);
        body.push(b.lasgn("x", branch));
        b.at(2);
        let x = b.lvar("x");
        let two = b.int(2);
        body.push(b.send(x, "/", &[two]));
        b.block(&body)
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 Undefined method `/' for nil:NilClass"]
    );
}

#[test]
fn truthiness_guard_removes_nil() {
    // x = if a == b then 4 end; if x then x / 2 else 0 end
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let four = b.int(4);
        let branch = b.if_(cond, Some(four), None);
        body.push(b.lasgn("x", branch));
        let guard = b.lvar("x");
        let x = b.lvar("x");
        let two = b.int(2);
        let half = b.send(x, "/", &[two]);
        let zero = b.int(0);
        body.push(b.if_(guard, Some(half), Some(zero)));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(2).union(&int(0)));
}

#[test]
fn negated_nil_check_narrows() {
    // x = if a == b then 4 end; if !x.nil? then x + 1 end
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let four = b.int(4);
        let branch = b.if_(cond, Some(four), None);
        body.push(b.lasgn("x", branch));
        let x = b.lvar("x");
        let check = b.send(x, "nil?", &[]);
        let negated = b.send(check, "!", &[]);
        let x = b.lvar("x");
        let one = b.int(1);
        let sum = b.send(x, "+", &[one]);
        body.push(b.if_(negated, Some(sum), None));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(5).union(&Value::nil()));
}

#[test]
fn literal_comparison_narrows_union() {
    // x = if a == b then 1 else :one end; if x == :one then x else 0 end
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let one = b.int(1);
        let sym = b.sym("one");
        let branch = b.if_(cond, Some(one), Some(sym));
        body.push(b.lasgn("x", branch));
        let x = b.lvar("x");
        let sym = b.sym("one");
        let test = b.send(x, "==", &[sym]);
        let x = b.lvar("x");
        let zero = b.int(0);
        body.push(b.if_(test, Some(x), Some(zero)));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "Maybe(0:Integer | :one:Symbol)");
}

#[test]
fn variable_assigned_in_one_branch_may_be_nil() {
    // if a == b then y = 1 end; y
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let one = b.int(1);
        let assign = b.lasgn("y", one);
        body.push(b.if_(cond, Some(assign), None));
        body.push(b.lvar("y"));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(1).union(&Value::nil()));
}

#[test]
fn early_return_narrows_rest_of_method() {
    // def f(a, b)
    //   x = if a == b then 3 end
    //   return 0 if x.nil?
    //   x * 2
    // end
    // f(Object.new, Object.new)
    let unit = analyze(|b| {
        let pa = b.param("a");
        let pb = b.param("b");
        let params = b.params(&[pa, pb]);
        let cond = locals_equal(b, "a", "b");
        let three = b.int(3);
        let pick = b.if_(cond, Some(three), None);
        let assign = b.lasgn("x", pick);
        let x = b.lvar("x");
        let check = b.send(x, "nil?", &[]);
        let zero = b.int(0);
        let ret = b.ret(Some(zero));
        let guard = b.if_(check, Some(ret), None);
        let x = b.lvar("x");
        let two = b.int(2);
        let product = b.send(x, "*", &[two]);
        let method_body = b.block(&[assign, guard, product]);
        let def = b.defn("f", params, Some(method_body));

        let c1 = b.constant("Object");
        let o1 = b.send(c1, "new", &[]);
        let c2 = b.constant("Object");
        let o2 = b.send(c2, "new", &[]);
        let call = b.fcall("f", &[o1, o2]);
        b.block(&[def, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(0).union(&int(6)));
}

#[test]
fn both_branches_returning_skip_the_rest() {
    let unit = analyze(|b| {
        let pa = b.param("a");
        let pb = b.param("b");
        let params = b.params(&[pa, pb]);
        let cond = locals_equal(b, "a", "b");
        let one = b.str("same");
        let r1 = b.ret(Some(one));
        let two = b.float(1.5);
        let r2 = b.ret(Some(two));
        let branch = b.if_(cond, Some(r1), Some(r2));
        let never = b.fcall("never_called", &[]);
        let method_body = b.block(&[branch, never]);
        let def = b.defn("g", params, Some(method_body));
        let c1 = b.constant("Object");
        let o1 = b.send(c1, "new", &[]);
        let c2 = b.constant("Object");
        let o2 = b.send(c2, "new", &[]);
        let call = b.fcall("g", &[o1, o2]);
        b.block(&[def, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), r#"Maybe(1.5:Float | "same":String)"#);
}

#[test]
fn return_outside_method_is_reported() {
    let unit = analyze(|b| {
        let one = b.int(1);
        b.ret(Some(one))
    });
    assert_eq!(unit.issues(), vec!["test.rb:1 unexpected return"]);
}

#[test]
fn or_defaults_a_nil_value() {
    // x = if a == b then 1 end; x || 5
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let one = b.int(1);
        let branch = b.if_(cond, Some(one), None);
        body.push(b.lasgn("x", branch));
        let x = b.lvar("x");
        let five = b.int(5);
        body.push(b.or(x, five));
        b.block(&body)
    });
    assert_eq!(unit.value(), &int(1).union(&int(5)));
}

#[test]
fn case_narrows_by_class() {
    // x = if a == b then 1 else "one" end
    // case x
    // when Integer then x + 1
    // when String then x.length
    // end
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let one = b.int(1);
        let text = b.str("one");
        let branch = b.if_(cond, Some(one), Some(text));
        body.push(b.lasgn("x", branch));

        let subject = b.lvar("x");
        let integer = b.constant("Integer");
        let x = b.lvar("x");
        let one = b.int(1);
        let sum = b.send(x, "+", &[one]);
        let when_int = b.when(&[integer], Some(sum));
        let string = b.constant("String");
        let x = b.lvar("x");
        let length = b.send(x, "length", &[]);
        let when_str = b.when(&[string], Some(length));
        body.push(b.case(subject, &[when_int, when_str], None));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(2).union(&int(3)));
}

#[test]
fn case_with_literal_tests() {
    // x = if a == b then 1 else 2 end
    // case x when 1, 3 then :odd else :even end
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        let cond = locals_equal(b, "a", "b");
        let one = b.int(1);
        let two = b.int(2);
        let branch = b.if_(cond, Some(one), Some(two));
        body.push(b.lasgn("x", branch));
        let subject = b.lvar("x");
        let one = b.int(1);
        let three = b.int(3);
        let odd = b.sym("odd");
        let when = b.when(&[one, three], Some(odd));
        let even = b.sym("even");
        body.push(b.case(subject, &[when], Some(even)));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "Maybe(:odd:Symbol | :even:Symbol)");
}

#[test]
fn narrowing_one_local_leaves_an_equal_one_alone() {
    // x = if a == b then 1 end
    // y = if a == b then 1 end
    // if x then y else 0 end
    // if x then y / 2 end
    let unit = analyze(|b| {
        let mut body = three_objects(b);
        for var in ["x", "y"] {
            let cond = locals_equal(b, "a", "b");
            let one = b.int(1);
            let branch = b.if_(cond, Some(one), None);
            body.push(b.lasgn(var, branch));
        }
        let x = b.lvar("x");
        let y = b.lvar("y");
        let zero = b.int(0);
        body.push(b.if_(x, Some(y), Some(zero)));
        b.block(&body)
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "Maybe(nil:NilClass | 0:Integer | 1:Integer)");

    let unit = analyze(|b| {
        let mut body = three_objects(b);
        for var in ["x", "y"] {
            let cond = locals_equal(b, "a", "b");
            let one = b.int(1);
            let branch = b.if_(cond, Some(one), None);
            body.push(b.lasgn(var, branch));
        }
        let x = b.lvar("x");
        b.at(4);
        let y = b.lvar("y");
        let two = b.int(2);
        let half = b.send(y, "/", &[two]);
        body.push(b.if_(x, Some(half), None));
        b.block(&body)
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:4 Undefined method `/' for nil:NilClass"]
    );
}

#[test]
fn fall_through_assignment_survives_partial_return() {
    // def f(a, b)
    //   if a == b then return 1 else y = 2 end
    //   y + 1
    // end
    // f(Object.new, Object.new)
    let unit = analyze(|b| {
        let pa = b.param("a");
        let pb = b.param("b");
        let params = b.params(&[pa, pb]);
        let cond = locals_equal(b, "a", "b");
        let one = b.int(1);
        let ret = b.ret(Some(one));
        let two = b.int(2);
        let assign = b.lasgn("y", two);
        let branch = b.if_(cond, Some(ret), Some(assign));
        let y = b.lvar("y");
        let one = b.int(1);
        let sum = b.send(y, "+", &[one]);
        let method_body = b.block(&[branch, sum]);
        let def = b.defn("f", params, Some(method_body));

        let c1 = b.constant("Object");
        let o1 = b.send(c1, "new", &[]);
        let c2 = b.constant("Object");
        let o2 = b.send(c2, "new", &[]);
        let call = b.fcall("f", &[o1, o2]);
        b.block(&[def, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(1).union(&int(3)));
}
