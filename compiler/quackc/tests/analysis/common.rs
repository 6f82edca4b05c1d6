//! Shared helpers for analysis tests.

use quack_ir::{NodeId, TreeBuilder};
use quack_types::{Instance, Value};
use quackc::{Outcome, Processor};

pub const PATH: &str = "test.rb";

/// A processed unit together with the processor that ran it.
pub struct Unit {
    pub processor: Processor,
    pub outcome: Outcome,
}

impl Unit {
    /// Issues rendered as `path:line message`.
    pub fn issues(&self) -> Vec<String> {
        self.outcome.issues.iter().map(ToString::to_string).collect()
    }

    pub fn value(&self) -> &Value {
        &self.outcome.result
    }

    pub fn describe(&self) -> String {
        self.processor.describe(&self.outcome.result)
    }

    pub fn element_type(&self) -> Option<Value> {
        self.processor.element_type(&self.outcome.result)
    }

    pub fn class_name(&self) -> Option<String> {
        self.processor.class_name(&self.outcome.result)
    }
}

/// Build a unit with `build` and analyze it.
pub fn analyze(build: impl FnOnce(&mut TreeBuilder<'_>) -> NodeId) -> Unit {
    let mut processor = Processor::new().unwrap();
    let root = build(&mut processor.builder());
    let outcome = processor.process_tree(root, PATH);
    Unit { processor, outcome }
}

pub fn int(n: i64) -> Value {
    Value::Instance(Instance::int(n))
}

pub fn float(x: f64) -> Value {
    Value::Instance(Instance::float(x))
}

/// `name = Object.new`
pub fn new_object(b: &mut TreeBuilder<'_>, name: &str) -> NodeId {
    let class = b.constant("Object");
    let object = b.send(class, "new", &[]);
    b.lasgn(name, object)
}

/// `lhs == rhs` on two locals: undecidable when both hold fresh objects.
pub fn locals_equal(b: &mut TreeBuilder<'_>, lhs: &str, rhs: &str) -> NodeId {
    let l = b.lvar(lhs);
    let r = b.lvar(rhs);
    b.send(l, "==", &[r])
}
