//! Class registry.
//!
//! Owns every class and method definition. Classes live in an arena
//! addressed by [`ClassId`]; a class's superclass is an id into the same
//! arena, so the inheritance graph holds no owning references.
//!
//! # Lifecycle
//!
//! 1. **Bootstrap**: the core table defines built-in classes and methods with
//!    [`ClassRegistry::define_method`], which appends overloads.
//! 2. **Sealed**: after [`ClassRegistry::seal`], methods can only be added
//!    through [`ClassRegistry::reopen`]. The evaluator calls it for `def`
//!    at the top level and in class bodies, never inside a branch.
//!
//! The registry also owns the [`ListPool`] behind array values and
//! parameterized instances. Clones share one pool, so list ids stay valid
//! across a clone.

use std::sync::Arc;

use quack_ir::{Name, NodeId, StringInterner};
use rustc_hash::FxHashMap;

use crate::{
    Callable, ClassId, ConstValue, Instance, ListId, ListPool, MethodId, RegistryError, TypeVar,
    Value,
};

/// Context handed to built-in folding functions.
pub struct FoldCx<'a> {
    pub registry: &'a ClassRegistry,
    pub interner: &'a StringInterner,
}

/// Computes a more precise result for a built-in call from the receiver
/// and positional arguments. `None` falls back to the declared return type.
pub type FoldFn = fn(&FoldCx<'_>, &Instance, &[Value]) -> Option<Value>;

/// How a method produces its result.
#[derive(Clone, Debug)]
pub enum MethodBody {
    /// Built-in; the result is the declared return type, optionally refined
    /// by a folding function.
    Builtin(Option<FoldFn>),
    /// Defined in the analyzed program; evaluated per call.
    User {
        params: NodeId,
        body: Option<NodeId>,
    },
    /// `Class#new`: allocate an instance and run `initialize`.
    Allocate,
}

/// Whether a method is looked up on instances or on the class object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Instance,
    Class,
}

#[derive(Clone, Debug)]
pub struct MethodDef {
    pub name: Name,
    pub owner: ClassId,
    pub kind: MethodKind,
    pub sig: Callable,
    pub body: MethodBody,
}

impl MethodDef {
    pub fn is_user(&self) -> bool {
        matches!(self.body, MethodBody::User { .. })
    }
}

/// A method to add when reopening a class.
#[derive(Clone, Debug)]
pub struct MethodSpec {
    pub kind: MethodKind,
    pub name: Name,
    pub sig: Callable,
    pub body: MethodBody,
}

/// A class definition.
#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: Name,
    /// Lookup key of the superclass; `None` only for the root.
    pub superclass: Option<ClassId>,
    /// Instance methods by name; several ids are overloads in declaration
    /// order.
    instance_methods: FxHashMap<Name, Vec<MethodId>>,
    class_methods: FxHashMap<Name, Vec<MethodId>>,
    constants: FxHashMap<Name, Value>,
}

impl ClassDef {
    fn new(name: Name, superclass: Option<ClassId>) -> Self {
        ClassDef {
            name,
            superclass,
            instance_methods: FxHashMap::default(),
            class_methods: FxHashMap::default(),
            constants: FxHashMap::default(),
        }
    }

    fn table(&self, kind: MethodKind) -> &FxHashMap<Name, Vec<MethodId>> {
        match kind {
            MethodKind::Instance => &self.instance_methods,
            MethodKind::Class => &self.class_methods,
        }
    }

    fn table_mut(&mut self, kind: MethodKind) -> &mut FxHashMap<Name, Vec<MethodId>> {
        match kind {
            MethodKind::Instance => &mut self.instance_methods,
            MethodKind::Class => &mut self.class_methods,
        }
    }

    /// Methods declared directly on this class.
    pub fn own_methods(&self, kind: MethodKind, name: Name) -> Option<&[MethodId]> {
        self.table(kind).get(&name).map(Vec::as_slice)
    }
}

/// Core classes and their superclasses, in `ClassId` order.
const CORE_CLASSES: [(Name, Option<ClassId>); ClassId::CORE_COUNT] = [
    (Name::BASIC_OBJECT, None),
    (Name::OBJECT, Some(ClassId::BASIC_OBJECT)),
    (Name::MODULE, Some(ClassId::OBJECT)),
    (Name::CLASS, Some(ClassId::MODULE)),
    (Name::NIL_CLASS, Some(ClassId::OBJECT)),
    (Name::TRUE_CLASS, Some(ClassId::OBJECT)),
    (Name::FALSE_CLASS, Some(ClassId::OBJECT)),
    (Name::NUMERIC, Some(ClassId::OBJECT)),
    (Name::INTEGER, Some(ClassId::NUMERIC)),
    (Name::FLOAT, Some(ClassId::NUMERIC)),
    (Name::STRING, Some(ClassId::OBJECT)),
    (Name::SYMBOL, Some(ClassId::OBJECT)),
    (Name::ARRAY, Some(ClassId::OBJECT)),
];

/// Registry of all classes and methods.
#[derive(Clone, Debug)]
pub struct ClassRegistry {
    classes: Vec<ClassDef>,
    by_name: FxHashMap<Name, ClassId>,
    methods: Vec<MethodDef>,
    sealed: bool,
    next_var: u32,
    lists: Arc<ListPool>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Create a registry holding the core class hierarchy and no methods.
    ///
    /// Class names are well-known interned names, valid in every
    /// `StringInterner`.
    pub fn new() -> Self {
        let mut registry = ClassRegistry {
            classes: Vec::with_capacity(32),
            by_name: FxHashMap::default(),
            methods: Vec::with_capacity(128),
            sealed: false,
            next_var: 0,
            lists: Arc::new(ListPool::new()),
        };
        for (name, superclass) in CORE_CLASSES {
            registry.push_class(name, superclass);
        }
        registry
    }

    fn push_class(&mut self, name: Name, superclass: Option<ClassId>) -> ClassId {
        #[allow(clippy::cast_possible_truncation, reason = "class count fits in u32")]
        let id = ClassId::from_raw(self.classes.len() as u32);
        self.classes.push(ClassDef::new(name, superclass));
        self.by_name.insert(name, id);
        id
    }

    // ===== Phases =====

    /// End the bootstrap phase.
    pub fn seal(&mut self) {
        tracing::debug!(
            classes = self.classes.len(),
            methods = self.methods.len(),
            "class registry sealed"
        );
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Mint a type variable unique within this registry.
    pub fn fresh_type_var(&mut self) -> TypeVar {
        let var = TypeVar::from_raw(self.next_var);
        self.next_var += 1;
        var
    }

    // ===== Classes =====

    /// Define a new class. Allowed in both phases.
    ///
    /// # Errors
    /// Returns `DuplicateClass` if the name is taken.
    pub fn define_class(
        &mut self,
        name: Name,
        superclass: Option<ClassId>,
    ) -> Result<ClassId, RegistryError> {
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateClass { name });
        }
        let superclass = superclass.or(Some(ClassId::OBJECT));
        let id = self.push_class(name, superclass);
        tracing::debug!(?name, ?id, ?superclass, "class defined");
        Ok(id)
    }

    pub fn class_named(&self, name: Name) -> Option<ClassId> {
        self.by_name.get(&name).copied()
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    pub fn superclass(&self, id: ClassId) -> Option<ClassId> {
        self.class(id).superclass
    }

    /// `id` followed by its superclasses up to the root.
    pub fn ancestors(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::successors(Some(id), move |c| self.superclass(*c))
    }

    /// True if `a` is `b` or inherits from it.
    pub fn is_subclass_of(&self, a: ClassId, b: ClassId) -> bool {
        self.ancestors(a).any(|c| c == b)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    // ===== Methods =====

    /// Add a bootstrap method, appending to any existing overloads.
    ///
    /// # Errors
    /// `Sealed` after bootstrap, `InvalidSignature` for a malformed signature.
    pub fn define_method(
        &mut self,
        owner: ClassId,
        kind: MethodKind,
        name: Name,
        sig: Callable,
        body: MethodBody,
    ) -> Result<MethodId, RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed {
                operation: "define_method",
            });
        }
        sig.validate()
            .map_err(|source| RegistryError::InvalidSignature { method: name, source })?;
        let id = self.push_method(owner, kind, name, sig, body);
        self.classes[owner.index()]
            .table_mut(kind)
            .entry(name)
            .or_default()
            .push(id);
        Ok(id)
    }

    /// Add methods to an existing class after bootstrap.
    ///
    /// A method replaces every overload of the same name declared directly on
    /// `class`; inherited definitions are shadowed, not touched.
    ///
    /// # Errors
    /// `InvalidSignature` for a malformed signature; no method of the batch is
    /// added in that case.
    pub fn reopen(
        &mut self,
        class: ClassId,
        methods: Vec<MethodSpec>,
    ) -> Result<Vec<MethodId>, RegistryError> {
        for spec in &methods {
            spec.sig
                .validate()
                .map_err(|source| RegistryError::InvalidSignature {
                    method: spec.name,
                    source,
                })?;
        }
        let mut ids = Vec::with_capacity(methods.len());
        for spec in methods {
            let id = self.push_method(class, spec.kind, spec.name, spec.sig, spec.body);
            tracing::debug!(?class, name = ?spec.name, kind = ?spec.kind, "class reopened");
            self.classes[class.index()]
                .table_mut(spec.kind)
                .insert(spec.name, vec![id]);
            ids.push(id);
        }
        Ok(ids)
    }

    fn push_method(
        &mut self,
        owner: ClassId,
        kind: MethodKind,
        name: Name,
        sig: Callable,
        body: MethodBody,
    ) -> MethodId {
        #[allow(clippy::cast_possible_truncation, reason = "method count fits in u32")]
        let id = MethodId::from_raw(self.methods.len() as u32);
        self.methods.push(MethodDef {
            name,
            owner,
            kind,
            sig,
            body,
        });
        id
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    /// Find an instance method, walking the superclass chain.
    pub fn lookup_instance_method(&self, class: ClassId, name: Name) -> Option<&[MethodId]> {
        self.lookup(class, MethodKind::Instance, name)
    }

    /// Find a class-level method, walking the superclass chain.
    pub fn lookup_class_method(&self, class: ClassId, name: Name) -> Option<&[MethodId]> {
        self.lookup(class, MethodKind::Class, name)
    }

    fn lookup(&self, class: ClassId, kind: MethodKind, name: Name) -> Option<&[MethodId]> {
        self.ancestors(class)
            .find_map(|c| self.class(c).own_methods(kind, name))
    }

    /// Methods a value responds to: class methods first for class references,
    /// then instance methods of its class.
    pub fn lookup_for(&self, receiver: &Instance, name: Name) -> Option<&[MethodId]> {
        if let Some(target) = receiver.referenced_class() {
            if let Some(found) = self.lookup_class_method(target, name) {
                return Some(found);
            }
        }
        self.lookup_instance_method(receiver.class, name)
    }

    // ===== Lists and parameterized instances =====

    pub fn intern_list(&self, values: Vec<Value>) -> ListId {
        self.lists.intern(values)
    }

    pub fn list(&self, id: ListId) -> Arc<[Value]> {
        self.lists.get(id)
    }

    /// An array with known elements. Its element type is the union of the
    /// elements, or `nil` when there are none.
    pub fn array_of(&self, elements: Vec<Value>) -> Instance {
        let element = if elements.is_empty() {
            Value::nil()
        } else {
            Value::union_all(&elements)
        };
        let args = self.intern_list(vec![element]);
        let items = self.intern_list(elements);
        Instance {
            class: ClassId::ARRAY,
            value: Some(ConstValue::List(items)),
            args: Some(args),
        }
    }

    /// An instance of `class` with unknown contents and the given type
    /// arguments, e.g. an array whose elements are only known by type.
    pub fn parameterized(&self, class: ClassId, args: Vec<Value>) -> Instance {
        Instance {
            args: Some(self.intern_list(args)),
            ..Instance::of(class)
        }
    }

    /// Elements of an array with known contents.
    pub fn elements(&self, instance: &Instance) -> Option<Arc<[Value]>> {
        match instance.value {
            Some(ConstValue::List(id)) => Some(self.list(id)),
            _ => None,
        }
    }

    /// Type arguments of a parameterized instance.
    pub fn type_args(&self, instance: &Instance) -> Option<Arc<[Value]>> {
        instance.args.map(|id| self.list(id))
    }

    /// The element type of an array, `Broken` when unknown.
    pub fn element_value(&self, instance: &Instance) -> Value {
        self.type_args(instance)
            .and_then(|args| args.first().cloned())
            .unwrap_or(Value::Broken)
    }

    // ===== Constants =====

    pub fn set_constant(&mut self, class: ClassId, name: Name, value: Value) {
        self.classes[class.index()].constants.insert(name, value);
    }

    /// Constant declared directly on `class`.
    pub fn constant(&self, class: ClassId, name: Name) -> Option<&Value> {
        self.class(class).constants.get(&name)
    }
}
