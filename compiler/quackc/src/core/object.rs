//! Folding for `Object`, `Class`, `String`, `Symbol` and `NilClass`.

use quack_types::{ClassId, ConstValue, FoldCx, Instance, Value};

fn first(args: &[Value]) -> Option<&Value> {
    args.first().filter(|v| !v.members().is_empty())
}

/// `==`: definite when decidable, otherwise `true | false`.
pub(super) fn eq(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    let other = first(args)?;
    Some(Value::from_bool(Value::Instance(*receiver).equality(other)))
}

pub(super) fn not_eq(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    let other = first(args)?;
    let equal = Value::Instance(*receiver).equality(other);
    Some(Value::from_bool(equal.map(|b| !b)))
}

/// `!`: a single instance always has a definite truthiness.
pub(super) fn not(_: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let falsey = receiver.class == ClassId::NIL || receiver.class == ClassId::FALSE;
    Some(Value::Instance(Instance::boolean(falsey)))
}

pub(super) fn is_nil(_: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    Some(Value::Instance(Instance::boolean(receiver.class == ClassId::NIL)))
}

pub(super) fn class(_: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    Some(Value::Instance(Instance::class_ref(receiver.class)))
}

pub(super) fn nil_to_s(cx: &FoldCx<'_>, _: &Instance, _: &[Value]) -> Option<Value> {
    Some(Value::Instance(Instance::string(cx.interner.intern(""))))
}

// ===== Class =====

/// `Class === x`: whether every, no, or some members of `x` are instances.
pub(super) fn class_case_eq(cx: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    let target = receiver.referenced_class()?;
    let members = first(args)?.members();
    let hits = members
        .iter()
        .filter(|m| cx.registry.is_subclass_of(m.class, target))
        .count();
    let decided = match hits {
        0 => Some(false),
        n if n == members.len() => Some(true),
        _ => None,
    };
    Some(Value::from_bool(decided))
}

pub(super) fn class_name(cx: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let target = receiver.referenced_class()?;
    Some(Value::Instance(Instance::string(cx.registry.class(target).name)))
}

// ===== String / Symbol =====

pub(super) fn string_plus(cx: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    let Some(ConstValue::Str(lhs)) = receiver.value else {
        return None;
    };
    let Value::Instance(Instance {
        value: Some(ConstValue::Str(rhs)),
        ..
    }) = first(args)?
    else {
        return None;
    };
    let joined = format!("{}{}", cx.interner.lookup(lhs), cx.interner.lookup(*rhs));
    Some(Value::Instance(Instance::string(cx.interner.intern(&joined))))
}

pub(super) fn string_length(cx: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let Some(ConstValue::Str(s)) = receiver.value else {
        return None;
    };
    let length = cx.interner.lookup(s).chars().count();
    Some(Value::Instance(Instance::int(i64::try_from(length).ok()?)))
}

pub(super) fn symbol_to_s(_: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let Some(ConstValue::Sym(s)) = receiver.value else {
        return None;
    };
    Some(Value::Instance(Instance::string(s)))
}
