//! Folding for `Array` and the `Array()` conversion.
//!
//! An array with known elements folds to exact results. One known only by
//! its element type folds to unknown instances of that type.

use quack_types::{ClassId, FoldCx, Instance, Value};

pub(super) fn length(cx: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let items = cx.registry.elements(receiver)?;
    Some(Value::Instance(Instance::int(i64::try_from(items.len()).ok()?)))
}

/// `first`: the first element, `nil` for an empty array.
pub(super) fn first(cx: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    match cx.registry.elements(receiver) {
        Some(items) => Some(items.first().cloned().unwrap_or_else(Value::nil)),
        None => Some(cx.registry.element_value(receiver).union(&Value::nil())),
    }
}

/// `+`: concatenation. Known on both sides keeps the elements.
pub(super) fn plus(cx: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    let registry = cx.registry;
    let Some(Value::Instance(other)) = args.first() else {
        return None;
    };
    if let (Some(lhs), Some(rhs)) = (registry.elements(receiver), registry.elements(other)) {
        let joined = lhs.iter().chain(rhs.iter()).cloned().collect();
        return Some(Value::Instance(registry.array_of(joined)));
    }
    let element = registry
        .element_value(receiver)
        .union(&registry.element_value(other));
    Some(Value::Instance(registry.parameterized(ClassId::ARRAY, vec![element])))
}

/// `Array(x)`: arrays pass through, `nil` becomes `[]`, anything else is
/// wrapped.
pub(super) fn wrap(cx: &FoldCx<'_>, _: &Instance, args: &[Value]) -> Option<Value> {
    let registry = cx.registry;
    let arg = args.first()?;
    if arg.members().is_empty() {
        return None;
    }
    Some(arg.map_members(|m| {
        if registry.is_subclass_of(m.class, ClassId::ARRAY) {
            Value::Instance(*m)
        } else if m.class == ClassId::NIL {
            Value::Instance(registry.array_of(Vec::new()))
        } else {
            Value::Instance(registry.array_of(vec![Value::Instance(*m)]))
        }
    }))
}

pub(super) fn nil_to_a(cx: &FoldCx<'_>, _: &Instance, _: &[Value]) -> Option<Value> {
    Some(Value::Instance(cx.registry.array_of(Vec::new())))
}
