//! Folding for `Integer` and `Float` operators.
//!
//! A fold runs once per receiver member and maps over the argument's
//! members. A pair of known values folds to a known result; anything else
//! (unknown operand, overflow, integer division by zero) yields an unknown
//! instance of the result class.

use quack_types::{ClassId, ConstValue, FoldCx, Instance, Value};

/// Integer and float halves of one arithmetic operator.
struct Arith {
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
}

const ADD: Arith = Arith {
    int: i64::checked_add,
    float: |a, b| a + b,
};
const SUB: Arith = Arith {
    int: i64::checked_sub,
    float: |a, b| a - b,
};
const MUL: Arith = Arith {
    int: i64::checked_mul,
    float: |a, b| a * b,
};
const DIV: Arith = Arith {
    int: floor_div,
    float: |a, b| a / b,
};

/// Integer division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn arith(op: &Arith, receiver: &Instance, args: &[Value]) -> Option<Value> {
    let lhs = receiver.value?;
    let arg = args.first()?;
    Some(arg.map_members(|m| {
        let both_int = receiver.class == ClassId::INTEGER && m.class == ClassId::INTEGER;
        let folded = match (lhs, m.value) {
            (ConstValue::Int(a), Some(ConstValue::Int(b))) if both_int => {
                (op.int)(a, b).map(Instance::int)
            }
            (a, Some(b)) => a
                .as_f64()
                .zip(b.as_f64())
                .map(|(a, b)| Instance::float((op.float)(a, b))),
            (_, None) => None,
        };
        let class = if both_int {
            ClassId::INTEGER
        } else {
            ClassId::FLOAT
        };
        Value::Instance(folded.unwrap_or_else(|| Instance::of(class)))
    }))
}

pub(super) fn add(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    arith(&ADD, receiver, args)
}

pub(super) fn sub(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    arith(&SUB, receiver, args)
}

pub(super) fn mul(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    arith(&MUL, receiver, args)
}

pub(super) fn div(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    arith(&DIV, receiver, args)
}

// ===== Comparison =====

fn compare(receiver: &Instance, args: &[Value], op: fn(f64, f64) -> bool) -> Option<Value> {
    let lhs = receiver.value?.as_f64()?;
    let arg = args.first()?;
    Some(arg.map_members(|m| {
        let known = m.value.and_then(ConstValue::as_f64).map(|rhs| op(lhs, rhs));
        Value::from_bool(known)
    }))
}

pub(super) fn lt(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    compare(receiver, args, |a, b| a < b)
}

pub(super) fn gt(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    compare(receiver, args, |a, b| a > b)
}

pub(super) fn le(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    compare(receiver, args, |a, b| a <= b)
}

pub(super) fn ge(_: &FoldCx<'_>, receiver: &Instance, args: &[Value]) -> Option<Value> {
    compare(receiver, args, |a, b| a >= b)
}

// ===== Conversion =====

pub(super) fn to_f(_: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let value = receiver.value?.as_f64()?;
    Some(Value::Instance(Instance::float(value)))
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Float#to_i truncates toward zero"
)]
pub(super) fn to_i(_: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let value = receiver.value?.as_f64()?;
    if !value.is_finite() {
        return None;
    }
    Some(Value::Instance(Instance::int(value.trunc() as i64)))
}

pub(super) fn to_s(cx: &FoldCx<'_>, receiver: &Instance, _: &[Value]) -> Option<Value> {
    let text = match receiver.value? {
        ConstValue::Int(n) => n.to_string(),
        ConstValue::Float(bits) => format!("{:?}", f64::from_bits(bits)),
        _ => return None,
    };
    Some(Value::Instance(Instance::string(cx.interner.intern(&text))))
}
