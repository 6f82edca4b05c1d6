//! Abstract values.
//!
//! A [`Value`] is the analyzer's answer to "what could this expression
//! evaluate to?":
//!
//! - [`Instance`]: one class, optionally with a concrete value folded from
//!   literals and type arguments such as an array's element type
//! - [`UnionValue`]: several possible instances, flattened and deduplicated
//! - `Broken`: poison standing in for a value whose computation already
//!   reported an issue; every query on it succeeds silently
//! - `Impossible`: the value of an unreachable branch
//!
//! Values are plain data. Lists inside them (array elements, type
//! arguments) are interned in the registry's pool, so converting to types
//! and rendering both need the registry, see [`Value::ty`] and
//! [`Value::describe`].

use bitflags::bitflags;
use quack_ir::{Name, StringLookup};

use crate::{ClassId, ClassRegistry, ListId, Ty};

/// A concrete runtime value known statically.
///
/// Floats are stored as bit patterns so values stay `Eq + Hash + Ord`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstValue {
    Int(i64),
    Float(u64),
    Str(Name),
    Sym(Name),
    Bool(bool),
    Nil,
    /// A reference to a class, the value of a constant like `Foo`.
    Class(ClassId),
    /// A named singleton object such as the top-level `main`.
    Label(Name),
    /// The elements of an array literal.
    List(ListId),
}

impl ConstValue {
    #[inline]
    pub fn float(value: f64) -> Self {
        ConstValue::Float(value.to_bits())
    }

    /// Numeric view of an `Int` or `Float`.
    #[allow(clippy::cast_precision_loss, reason = "mirrors runtime Integer-to-Float coercion")]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            ConstValue::Int(i) => Some(i as f64),
            ConstValue::Float(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    /// Runtime equality of two known values. Integers and floats compare
    /// numerically.
    pub fn runtime_eq(self, other: ConstValue) -> bool {
        match (self, other) {
            (ConstValue::Int(a), ConstValue::Int(b)) => a == b,
            (ConstValue::Float(_) | ConstValue::Int(_), ConstValue::Float(_) | ConstValue::Int(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => self == other,
        }
    }
}

bitflags! {
    /// Possible truthiness outcomes of a value.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Truth: u8 {
        const TRUTHY = 1 << 0;
        const FALSE = 1 << 1;
        const NIL = 1 << 2;

        const FALSEY = Self::FALSE.bits() | Self::NIL.bits();
    }
}

/// An object of one known class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instance {
    pub class: ClassId,
    pub value: Option<ConstValue>,
    /// Type arguments as values, e.g. `[element]` for an array.
    pub args: Option<ListId>,
}

impl Instance {
    /// An instance of `class`. Singleton classes get their only value.
    pub fn of(class: ClassId) -> Self {
        let value = match class {
            ClassId::NIL => Some(ConstValue::Nil),
            ClassId::TRUE => Some(ConstValue::Bool(true)),
            ClassId::FALSE => Some(ConstValue::Bool(false)),
            _ => None,
        };
        Instance {
            class,
            value,
            args: None,
        }
    }

    #[inline]
    pub fn with_value(class: ClassId, value: ConstValue) -> Self {
        Instance {
            class,
            value: Some(value),
            args: None,
        }
    }

    pub fn nil() -> Self {
        Instance::of(ClassId::NIL)
    }

    pub fn boolean(value: bool) -> Self {
        Instance::of(if value { ClassId::TRUE } else { ClassId::FALSE })
    }

    pub fn int(value: i64) -> Self {
        Instance::with_value(ClassId::INTEGER, ConstValue::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Instance::with_value(ClassId::FLOAT, ConstValue::float(value))
    }

    pub fn string(value: Name) -> Self {
        Instance::with_value(ClassId::STRING, ConstValue::Str(value))
    }

    pub fn symbol(value: Name) -> Self {
        Instance::with_value(ClassId::SYMBOL, ConstValue::Sym(value))
    }

    /// The value of a constant naming `class`.
    pub fn class_ref(class: ClassId) -> Self {
        Instance::with_value(ClassId::CLASS, ConstValue::Class(class))
    }

    /// The class this instance refers to, when it is a class reference.
    pub fn referenced_class(&self) -> Option<ClassId> {
        match self.value {
            Some(ConstValue::Class(id)) => Some(id),
            _ => None,
        }
    }

    #[inline]
    pub fn value_known(&self) -> bool {
        self.value.is_some()
    }

    /// Truthiness follows the class: only `nil` and `false` are falsey.
    pub fn truth(&self) -> Truth {
        match self.class {
            ClassId::NIL => Truth::NIL,
            ClassId::FALSE => Truth::FALSE,
            _ => Truth::TRUTHY,
        }
    }

    /// Statically decided `==`, or `None` when it depends on runtime data.
    ///
    /// Two arrays are never decided: their elements may be unknown.
    pub fn equality(&self, other: &Instance) -> Option<bool> {
        match (self.value, other.value) {
            (Some(ConstValue::List(_)), Some(ConstValue::List(_))) => None,
            (Some(a), Some(b)) => Some(a.runtime_eq(b)),
            _ if self.class != other.class => Some(false),
            _ => None,
        }
    }
}

/// Two or more distinct instances.
///
/// Members are kept sorted, which makes equality and hashing independent of
/// the order values were merged in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnionValue(Vec<Instance>);

impl UnionValue {
    #[inline]
    pub fn members(&self) -> &[Instance] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a union has at least two members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The abstract value of an expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Instance(Instance),
    Union(UnionValue),
    Broken,
    Impossible,
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl Value {
    pub fn nil() -> Self {
        Value::Instance(Instance::nil())
    }

    /// `true | false`.
    pub fn boolean() -> Self {
        Value::Union(UnionValue(vec![
            Instance::boolean(true),
            Instance::boolean(false),
        ]))
    }

    /// A definite boolean, or the `true | false` union when undecided.
    pub fn from_bool(value: Option<bool>) -> Self {
        value.map_or_else(Value::boolean, |b| Value::Instance(Instance::boolean(b)))
    }

    /// Build a value from candidate instances.
    ///
    /// Duplicates are dropped; no candidates yields `Impossible` and a single
    /// candidate yields that instance.
    pub fn from_members(members: impl IntoIterator<Item = Instance>) -> Self {
        let mut members: Vec<Instance> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        match members.len() {
            0 => Value::Impossible,
            1 => Value::Instance(members[0]),
            _ => Value::Union(UnionValue(members)),
        }
    }

    /// The possible instances. Empty for the sentinels.
    pub fn members(&self) -> &[Instance] {
        match self {
            Value::Instance(i) => std::slice::from_ref(i),
            Value::Union(u) => u.members(),
            Value::Broken | Value::Impossible => &[],
        }
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        matches!(self, Value::Broken)
    }

    #[inline]
    pub fn is_impossible(&self) -> bool {
        matches!(self, Value::Impossible)
    }

    /// Merge two possibilities.
    ///
    /// `Broken` absorbs everything, `Impossible` is the identity.
    pub fn union(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Broken, _) | (_, Value::Broken) => Value::Broken,
            (Value::Impossible, v) | (v, Value::Impossible) => v.clone(),
            (a, b) if a == b => a.clone(),
            (a, b) => Value::from_members(a.members().iter().chain(b.members()).copied()),
        }
    }

    /// Union of all values; `Impossible` when the iterator is empty.
    pub fn union_all<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
        values
            .into_iter()
            .fold(Value::Impossible, |acc, v| acc.union(v))
    }

    // ===== Truthiness =====

    /// Every truthiness outcome this value may produce.
    pub fn truth(&self) -> Truth {
        match self {
            Value::Broken => Truth::all(),
            Value::Impossible => Truth::empty(),
            v => v
                .members()
                .iter()
                .fold(Truth::empty(), |acc, m| acc | m.truth()),
        }
    }

    pub fn maybe_truthy(&self) -> bool {
        self.truth().contains(Truth::TRUTHY)
    }

    pub fn maybe_falsey(&self) -> bool {
        self.truth().intersects(Truth::FALSEY)
    }

    pub fn maybe_nil(&self) -> bool {
        self.truth().contains(Truth::NIL)
    }

    pub fn definitely_truthy(&self) -> bool {
        self.truth() == Truth::TRUTHY
    }

    pub fn definitely_falsey(&self) -> bool {
        let truth = self.truth();
        !truth.is_empty() && Truth::FALSEY.contains(truth)
    }

    pub fn definitely_nil(&self) -> bool {
        self.truth() == Truth::NIL
    }

    /// The part of this value that can be truthy, or `Impossible`.
    pub fn narrow_for_truthy(&self) -> Value {
        self.retain(|m| m.truth() == Truth::TRUTHY)
    }

    /// The part of this value that can be falsey, or `Impossible`.
    pub fn narrow_for_falsey(&self) -> Value {
        self.retain(|m| Truth::FALSEY.contains(m.truth()))
    }

    /// Keep the members matching `keep`. Sentinels pass through unchanged.
    pub fn retain(&self, keep: impl Fn(&Instance) -> bool) -> Value {
        match self {
            Value::Broken | Value::Impossible => self.clone(),
            Value::Instance(i) if keep(i) => self.clone(),
            v => Value::from_members(v.members().iter().copied().filter(|m| keep(m))),
        }
    }

    /// Apply `f` to every member and merge the results.
    pub fn map_members(&self, mut f: impl FnMut(&Instance) -> Value) -> Value {
        match self {
            Value::Broken | Value::Impossible => self.clone(),
            Value::Instance(i) => f(i),
            Value::Union(u) => {
                let mut acc = Value::Impossible;
                for m in u.members() {
                    acc = acc.union(&f(m));
                    if acc.is_broken() {
                        break;
                    }
                }
                acc
            }
        }
    }

    // ===== Equality =====

    /// Statically decided `==` between two values.
    ///
    /// A union compares member-wise: the answer is definite only when every
    /// pairing agrees.
    pub fn equality(&self, other: &Value) -> Option<bool> {
        let (a, b) = (self.members(), other.members());
        if a.is_empty() || b.is_empty() {
            return None;
        }
        let mut seen: Option<bool> = None;
        for x in a {
            for y in b {
                match (x.equality(y), seen) {
                    (None, _) => return None,
                    (Some(r), None) => seen = Some(r),
                    (Some(r), Some(prev)) if r != prev => return None,
                    _ => {}
                }
            }
        }
        seen
    }

    // ===== Types =====

    /// The type describing this value. Sentinels are untyped.
    pub fn ty(&self, registry: &ClassRegistry) -> Ty {
        match self {
            Value::Instance(i) => instance_ty(i, registry),
            Value::Union(u) => Ty::union(u.members().iter().map(|m| instance_ty(m, registry))),
            Value::Broken | Value::Impossible => Ty::Any,
        }
    }

    /// A value of type `ty` with unknown contents.
    ///
    /// Types without a nominal class (`Any`, unbound variables, duck types)
    /// have no instance to stand for them and become `Broken`.
    pub fn from_ty(ty: &Ty, registry: &ClassRegistry) -> Value {
        match ty {
            Ty::Class(c) => Value::Instance(Instance::of(*c)),
            Ty::Generic(c, args) => {
                let args = args.iter().map(|a| Value::from_ty(a, registry)).collect();
                Value::Instance(registry.parameterized(*c, args))
            }
            Ty::Union(members) => {
                let mut instances = Vec::with_capacity(members.len());
                for m in members {
                    match Value::from_ty(m, registry) {
                        Value::Broken => return Value::Broken,
                        v => instances.extend_from_slice(v.members()),
                    }
                }
                Value::from_members(instances)
            }
            Ty::Any | Ty::Var(_) | Ty::Duck(_) | Ty::SelfType => Value::Broken,
        }
    }

    // ===== Rendering =====

    /// Human-readable form used in issue messages, e.g. `5:Integer`,
    /// `#<Foo>`, `nil:NilClass`.
    pub fn describe(&self, registry: &ClassRegistry, names: &dyn StringLookup) -> String {
        match self {
            Value::Instance(i) => describe_instance(i, registry, names),
            Value::Union(u) => {
                let parts: Vec<_> = u
                    .members()
                    .iter()
                    .map(|m| describe_instance(m, registry, names))
                    .collect();
                format!("Maybe({})", parts.join(" | "))
            }
            Value::Broken => "!Broken!".to_owned(),
            Value::Impossible => "!Impossible!".to_owned(),
        }
    }
}

fn instance_ty(instance: &Instance, registry: &ClassRegistry) -> Ty {
    match registry.type_args(instance) {
        Some(args) => Ty::Generic(instance.class, args.iter().map(|a| a.ty(registry)).collect()),
        None => Ty::Class(instance.class),
    }
}

fn describe_instance(i: &Instance, registry: &ClassRegistry, names: &dyn StringLookup) -> String {
    let class = names.lookup(registry.class(i.class).name);
    let Some(value) = i.value else {
        return match registry.type_args(i) {
            Some(_) => format!("#<{}>", instance_ty(i, registry).display(registry, names)),
            None => format!("#<{class}>"),
        };
    };
    let shown = match value {
        ConstValue::Int(n) => format!("{n}"),
        ConstValue::Float(bits) => format!("{:?}", f64::from_bits(bits)),
        ConstValue::Str(s) => format!("{:?}", names.lookup(s)),
        ConstValue::Sym(s) => format!(":{}", names.lookup(s)),
        ConstValue::Bool(b) => format!("{b}"),
        ConstValue::Nil => "nil".to_owned(),
        ConstValue::Class(id) => names.lookup(registry.class(id).name).to_owned(),
        ConstValue::Label(label) => names.lookup(label).to_owned(),
        ConstValue::List(id) => {
            let items: Vec<_> = registry
                .list(id)
                .iter()
                .map(|v| v.describe(registry, names))
                .collect();
            format!("[{}]", items.join(", "))
        }
    };
    format!("{shown}:{class}")
}
