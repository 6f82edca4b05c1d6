//! Array literals.
//!
//! An array whose every element is known keeps the element values, so
//! `[1, *[2, 3]]` evaluates to `[1, 2, 3]` with element type `1 | 2 | 3`.
//! Once any part is only known by type, the result is an array of unknown
//! length whose element type is the union of everything that went in.
//!
//! A splatted value contributes:
//!
//! - its elements, if it is an array
//! - the elements of `value.to_a`, if its class responds to `to_a`
//! - itself, otherwise

use quack_ir::{Name, NodeId, NodeKind};
use quack_types::{Call, ClassId, Instance, Value};

use super::Evaluator;

/// What one element position of a literal contributes.
enum Part {
    /// Exactly these elements, in order.
    Known(Vec<Value>),
    /// Some number of elements of this value.
    Unknown(Value),
}

impl Evaluator<'_> {
    pub(super) fn eval_array(&mut self, node: NodeId) -> Value {
        let arena = self.arena;
        let mut elements = Vec::new();
        let mut unknown: Vec<Value> = Vec::new();
        for child in arena.children_from(node, 0) {
            let part = if arena.kind(child) == NodeKind::Splat {
                let Some(inner) = arena.child(child, 0) else {
                    return self.malformed(child);
                };
                let value = self.eval(inner);
                self.splat(child, &value)
            } else {
                Part::Known(vec![self.eval(child)])
            };
            match part {
                Part::Known(values) => elements.extend(values),
                Part::Unknown(element) => unknown.push(element),
            }
        }

        let registry = self.registry.read();
        if unknown.is_empty() {
            return Value::Instance(registry.array_of(elements));
        }
        let element = Value::union_all(elements.iter().chain(&unknown));
        Value::Instance(registry.parameterized(ClassId::ARRAY, vec![element]))
    }

    fn splat(&mut self, node: NodeId, value: &Value) -> Part {
        let members = match value {
            Value::Broken | Value::Impossible => return Part::Unknown(value.clone()),
            Value::Instance(instance) => return self.splat_member(node, instance),
            Value::Union(u) => u.members().to_vec(),
        };
        // The members may have different lengths, so only the element type
        // survives.
        let mut element = Value::Impossible;
        for member in &members {
            let contributed = match self.splat_member(node, member) {
                Part::Known(values) => Value::union_all(&values),
                Part::Unknown(e) => e,
            };
            element = element.union(&contributed);
        }
        Part::Unknown(element)
    }

    fn splat_member(&mut self, node: NodeId, member: &Instance) -> Part {
        if let Some(part) = self.array_part(member) {
            return part;
        }
        let responds = self.registry.read().lookup_for(member, Name::TO_A).is_some();
        if !responds {
            return Part::Known(vec![Value::Instance(*member)]);
        }
        let converted = self.dispatch(
            node,
            &Value::Instance(*member),
            Name::TO_A,
            &Call::default(),
            None,
            false,
        );
        match &converted {
            Value::Instance(instance) => self
                .array_part(instance)
                .unwrap_or(Part::Unknown(Value::Broken)),
            _ => Part::Unknown(Value::Broken),
        }
    }

    /// The contribution of an array instance; `None` for anything else.
    fn array_part(&self, instance: &Instance) -> Option<Part> {
        let registry = self.registry.read();
        if !registry.is_subclass_of(instance.class, ClassId::ARRAY) {
            return None;
        }
        Some(match registry.elements(instance) {
            Some(items) => Part::Known(items.to_vec()),
            None => Part::Unknown(registry.element_value(instance)),
        })
    }
}
