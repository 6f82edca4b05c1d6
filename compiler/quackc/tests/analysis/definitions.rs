//! Classes, methods, constants and where they may be defined.

use pretty_assertions::assert_eq;
use quack_types::Value;

use crate::common::{analyze, int, locals_equal, new_object};

#[test]
fn initialize_runs_against_new_instance() {
    // class Point
    //   def initialize(x); end
    //   def origin?; false; end
    // end
    // Point.new(1).origin?
    // Point.new
    let unit = analyze(|b| {
        let px = b.param("x");
        let params = b.params(&[px]);
        let init = b.defn("initialize", params, None);
        let params = b.params(&[]);
        let no = b.false_();
        let origin = b.defn("origin?", params, Some(no));
        let body = b.block(&[init, origin]);
        let class = b.class("Point", None, Some(body));

        let point = b.constant("Point");
        let one = b.int(1);
        let made = b.send(point, "new", &[one]);
        let check = b.send(made, "origin?", &[]);
        b.at(2);
        let point = b.constant("Point");
        let bad = b.send(point, "new", &[]);
        b.block(&[class, check, bad])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 Wrong number of arguments (given 0, expected 1)"]
    );
}

#[test]
fn instance_of_user_class_describes_by_class() {
    let unit = analyze(|b| {
        let class = b.class("Widget", None, None);
        let widget = b.constant("Widget");
        let made = b.send(widget, "new", &[]);
        b.block(&[class, made])
    });
    assert_eq!(unit.describe(), "#<Widget>");
}

#[test]
fn subclass_inherits_methods() {
    // class Base; def size; 3; end; end
    // class Child < Base; end
    // Child.new.size
    let unit = analyze(|b| {
        let params = b.params(&[]);
        let three = b.int(3);
        let size = b.defn("size", params, Some(three));
        let base = b.class("Base", None, Some(size));
        let parent = b.constant("Base");
        let child = b.class("Child", Some(parent), None);
        let child_ref = b.constant("Child");
        let made = b.send(child_ref, "new", &[]);
        let call = b.send(made, "size", &[]);
        b.block(&[base, child, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(3));
}

#[test]
fn methods_see_self() {
    // class Counter; def one; 1; end; def two; one + one; end; end
    let unit = analyze(|b| {
        let params = b.params(&[]);
        let one_lit = b.int(1);
        let one = b.defn("one", params, Some(one_lit));
        let params = b.params(&[]);
        let lhs = b.fcall("one", &[]);
        let rhs = b.fcall("one", &[]);
        let sum = b.send(lhs, "+", &[rhs]);
        let two = b.defn("two", params, Some(sum));
        let body = b.block(&[one, two]);
        let class = b.class("Counter", None, Some(body));
        let counter = b.constant("Counter");
        let made = b.send(counter, "new", &[]);
        let call = b.send(made, "two", &[]);
        b.block(&[class, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(2));
}

#[test]
fn reopened_class_gains_methods() {
    let unit = analyze(|b| {
        let first = b.class("Box", None, None);
        let params = b.params(&[]);
        let nine = b.int(9);
        let def = b.defn("nine", params, Some(nine));
        let reopened = b.class("Box", None, Some(def));
        let boxed = b.constant("Box");
        let made = b.send(boxed, "new", &[]);
        let call = b.send(made, "nine", &[]);
        b.block(&[first, reopened, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(9));
}

#[test]
fn reopening_core_class() {
    // class Integer; def double; self + self; end; end; 21.double
    let unit = analyze(|b| {
        let params = b.params(&[]);
        let lhs = b.self_ref();
        let rhs = b.self_ref();
        let sum = b.send(lhs, "+", &[rhs]);
        let def = b.defn("double", params, Some(sum));
        let class = b.class("Integer", None, Some(def));
        let n = b.int(21);
        let call = b.send(n, "double", &[]);
        b.block(&[class, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(42));
}

#[test]
fn superclass_mismatch_is_reported() {
    let unit = analyze(|b| {
        let first = b.class("Thing", None, None);
        b.at(3);
        let base = b.constant("String");
        let again = b.class("Thing", Some(base), None);
        b.block(&[first, again])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:3 superclass mismatch for class Thing"]
    );
}

#[test]
fn definitions_inside_branches_are_rejected() {
    let unit = analyze(|b| {
        let a = new_object(b, "a");
        let c = new_object(b, "c");
        let cond = locals_equal(b, "a", "c");
        b.at(2);
        let class = b.class("Late", None, None);
        let branch = b.if_(cond, Some(class), None);
        b.block(&[a, c, branch])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 class definition is only allowed at the top level or in a class body"]
    );
}

#[test]
fn definitions_inside_methods_are_rejected() {
    // def outer; def inner; end; end; outer
    let unit = analyze(|b| {
        let params = b.params(&[]);
        b.at(2);
        let inner = b.defn("inner", params, None);
        b.at(1);
        let params = b.params(&[]);
        let outer = b.defn("outer", params, Some(inner));
        let call = b.fcall("outer", &[]);
        b.block(&[outer, call])
    });
    assert_eq!(
        unit.issues(),
        vec!["test.rb:2 method definition is only allowed at the top level or in a class body"]
    );
}

#[test]
fn constants_resolve_lexically() {
    // class Config; LIMIT = 3; def limit; LIMIT; end; end; Config.new.limit
    let unit = analyze(|b| {
        let three = b.int(3);
        let decl = b.cdecl("LIMIT", three);
        let params = b.params(&[]);
        let read = b.constant("LIMIT");
        let def = b.defn("limit", params, Some(read));
        let body = b.block(&[decl, def]);
        let class = b.class("Config", None, Some(body));
        let config = b.constant("Config");
        let made = b.send(config, "new", &[]);
        let call = b.send(made, "limit", &[]);
        b.block(&[class, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.value(), &int(3));
}

#[test]
fn undefined_constant_is_reported() {
    let unit = analyze(|b| {
        let missing = b.constant("Missing");
        b.send(missing, "new", &[])
    });
    assert_eq!(unit.issues(), vec!["test.rb:1 uninitialized constant Missing"]);
    assert_eq!(unit.value(), &Value::Broken);
}

#[test]
fn class_methods_on_self() {
    // class Maker; def self.build; new; end; end; Maker.build
    let unit = analyze(|b| {
        let target = b.self_ref();
        let params = b.params(&[]);
        let body = b.fcall("new", &[]);
        let def = b.defs(target, "build", params, Some(body));
        let class = b.class("Maker", None, Some(def));
        let maker = b.constant("Maker");
        let call = b.send(maker, "build", &[]);
        b.block(&[class, call])
    });
    assert_eq!(unit.issues(), Vec::<String>::new());
    assert_eq!(unit.describe(), "#<Maker>");
}

#[test]
fn object_class_and_name() {
    // 1.class.name
    let unit = analyze(|b| {
        let one = b.int(1);
        let class = b.send(one, "class", &[]);
        b.send(class, "name", &[])
    });
    assert_eq!(unit.describe(), r#""Integer":String"#);
}
