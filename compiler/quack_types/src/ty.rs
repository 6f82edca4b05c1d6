//! Signature types.
//!
//! Types appear only in method signatures; expressions carry [`Value`]s.
//! A [`Ty`] is either nominal (a class, possibly with type arguments such
//! as `Array[Integer]`), structural (a duck type listing required methods),
//! a free type variable of a generic signature, the receiver's own type, or
//! `Any` for untyped parameters.
//!
//! Unions are kept in a canonical member order, so `Integer | String` and
//! `String | Integer` are the same type.
//!
//! [`Value`]: crate::Value

use quack_ir::{Name, StringLookup};
use rustc_hash::FxHashMap;

use crate::{Callable, ClassId, ClassRegistry, TypeVar};

/// A type expression in a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Untyped; compatible with everything in both directions.
    Any,
    /// Instances of a class or its subclasses.
    Class(ClassId),
    /// A parameterized class, `Array[T]` or `Hash[K, V]`. Arguments are
    /// covariant.
    Generic(ClassId, Vec<Ty>),
    /// A free type variable, bound per call by the resolver.
    Var(TypeVar),
    /// Any of the member types. Never nested, never fewer than two members.
    Union(Vec<Ty>),
    /// Anything responding to the listed methods.
    Duck(DuckType),
    /// The receiver's class.
    SelfType,
}

impl Ty {
    /// Flatten and deduplicate into a union; a single member is returned as is.
    ///
    /// Members are ordered by [`Ty::rank`]; the sort is stable, so members of
    /// equal rank keep their first-seen order.
    pub fn union(members: impl IntoIterator<Item = Ty>) -> Ty {
        let mut flat: Vec<Ty> = Vec::new();
        for ty in members {
            match ty {
                Ty::Union(inner) => {
                    for t in inner {
                        if !flat.contains(&t) {
                            flat.push(t);
                        }
                    }
                }
                t => {
                    if !flat.contains(&t) {
                        flat.push(t);
                    }
                }
            }
        }
        if flat.contains(&Ty::Any) {
            return Ty::Any;
        }
        flat.sort_by_key(Ty::rank);
        match flat.len() {
            0 => Ty::Any,
            1 => flat.swap_remove(0),
            _ => Ty::Union(flat),
        }
    }

    /// Sort key for union members: nominal types by class id first, then
    /// variables, `self`, and duck types.
    fn rank(&self) -> (u8, u32) {
        match self {
            Ty::Any => (0, 0),
            Ty::Class(c) | Ty::Generic(c, _) => (1, c.raw()),
            Ty::Var(v) => (2, v.raw()),
            Ty::SelfType => (3, 0),
            Ty::Union(_) => (4, 0),
            Ty::Duck(_) => (5, 0),
        }
    }

    /// True if any free variable occurs in this type.
    pub fn has_vars(&self) -> bool {
        match self {
            Ty::Var(_) => true,
            Ty::Union(members) | Ty::Generic(_, members) => members.iter().any(Ty::has_vars),
            Ty::Duck(duck) => duck.methods().iter().any(|(_, c)| c.has_vars()),
            Ty::Any | Ty::Class(_) | Ty::SelfType => false,
        }
    }

    /// Replace bound variables with their bindings.
    pub fn substitute(&self, bindings: &Bindings) -> Ty {
        match self {
            Ty::Var(v) => bindings.get(*v).cloned().unwrap_or(Ty::Var(*v)),
            Ty::Union(members) => Ty::union(members.iter().map(|m| m.substitute(bindings))),
            Ty::Generic(class, args) => {
                Ty::Generic(*class, args.iter().map(|a| a.substitute(bindings)).collect())
            }
            Ty::Duck(duck) => Ty::Duck(duck.substitute(bindings)),
            Ty::Any | Ty::Class(_) | Ty::SelfType => self.clone(),
        }
    }

    /// Replace `SelfType` with `receiver`.
    pub fn with_self(&self, receiver: &Ty) -> Ty {
        match self {
            Ty::SelfType => receiver.clone(),
            Ty::Union(members) => Ty::union(members.iter().map(|m| m.with_self(receiver))),
            Ty::Generic(class, args) => {
                Ty::Generic(*class, args.iter().map(|a| a.with_self(receiver)).collect())
            }
            _ => self.clone(),
        }
    }

    /// Render for issue messages.
    pub fn display(&self, registry: &ClassRegistry, names: &dyn StringLookup) -> String {
        match self {
            Ty::Any => "untyped".to_owned(),
            Ty::Class(c) => names.lookup(registry.class(*c).name).to_owned(),
            Ty::Generic(c, args) => {
                let args: Vec<_> = args.iter().map(|a| a.display(registry, names)).collect();
                format!("{}[{}]", names.lookup(registry.class(*c).name), args.join(", "))
            }
            Ty::Var(v) => format!("{v:?}"),
            Ty::Union(members) => members
                .iter()
                .map(|m| m.display(registry, names))
                .collect::<Vec<_>>()
                .join(" | "),
            Ty::Duck(duck) => {
                let methods: Vec<_> = duck
                    .methods()
                    .iter()
                    .map(|(name, _)| names.lookup(*name))
                    .collect();
                format!("#<Duck {}>", methods.join(", "))
            }
            Ty::SelfType => "self".to_owned(),
        }
    }
}

/// A structural type: the set of methods a value must respond to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DuckType {
    methods: Vec<(Name, Callable)>,
}

impl DuckType {
    /// Required methods in the order they were added.
    pub fn methods(&self) -> &[(Name, Callable)] {
        &self.methods
    }

    pub fn requirement(&self, name: Name) -> Option<&Callable> {
        self.methods.iter().find(|(n, _)| *n == name).map(|(_, c)| c)
    }

    fn substitute(&self, bindings: &Bindings) -> DuckType {
        DuckType {
            methods: self
                .methods
                .iter()
                .map(|(n, c)| (*n, c.substitute(bindings)))
                .collect(),
        }
    }
}

/// Builder for a [`DuckType`] that accretes method requirements.
///
/// The accumulator is an ordinary owned value: each `require` consumes it
/// and hands it back, and `finish` produces the immutable type. Requiring a
/// name twice keeps the first requirement.
#[derive(Clone, Debug, Default)]
pub struct DuckAccumulator {
    methods: Vec<(Name, Callable)>,
}

impl DuckAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn require(mut self, name: Name, signature: Callable) -> Self {
        if !self.methods.iter().any(|(n, _)| *n == name) {
            self.methods.push((name, signature));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn finish(self) -> Ty {
        Ty::Duck(DuckType {
            methods: self.methods,
        })
    }
}

/// Free-variable bindings produced by one resolution.
///
/// Bindings are final: once a variable is bound, later attempts to bind it
/// are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    map: FxHashMap<TypeVar, Ty>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: TypeVar) -> Option<&Ty> {
        self.map.get(&var)
    }

    pub fn is_bound(&self, var: TypeVar) -> bool {
        self.map.contains_key(&var)
    }

    /// Bind `var` unless already bound. Returns true on a new binding.
    pub fn bind(&mut self, var: TypeVar, ty: Ty) -> bool {
        if self.map.contains_key(&var) {
            return false;
        }
        self.map.insert(var, ty);
        true
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeVar, &Ty)> {
        self.map.iter().map(|(v, t)| (*v, t))
    }
}
