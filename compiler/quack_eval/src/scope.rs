//! Evaluation scopes.
//!
//! Scopes live on a stack owned by the evaluator. Each scope knows how to
//! reach its lexical parent:
//!
//! - a **branch** scope reads through to the scope directly below it,
//! - a **block** scope reads through to the scope the block literal appeared
//!   in (its *home*), which may sit far below a method call's scopes,
//! - **method**, **class body** and **top** scopes end the chain.
//!
//! Reads walk that chain; writes always land in the topmost scope. A child
//! never mutates its parent directly: the evaluator folds a finished branch
//! back in when it merges.
//!
//! Every assignment creates a [`Binding`] with a fresh [`BindingId`].
//! Narrowing replaces the value of one binding, so two locals holding equal
//! values are narrowed independently.

use quack_ir::{Name, NodeId};
use quack_types::{ClassId, ConstValue, Instance, Value};
use rustc_hash::FxHashMap;

/// Identity of one assignment to a local.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(u32);

impl BindingId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// The value a local was assigned, tagged with the assignment's identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub id: BindingId,
    pub value: Value,
}

/// A block literal passed to a call, bound to the scope it was written in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockRef {
    pub params: Option<NodeId>,
    pub body: Option<NodeId>,
    /// Stack index of the scope the block literal was evaluated in.
    pub home: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// The unit's outermost scope; `self` is `main`.
    Top,
    /// A `class ... end` body; `self` is the class.
    ClassBody { class: ClassId },
    /// One invocation of a user-defined method.
    Method {
        self_value: Instance,
        /// Class the method is defined on, for constant lookup.
        owner: ClassId,
        block: Option<BlockRef>,
    },
    /// One side of a conditional.
    Branch,
    /// One invocation of a block literal.
    Block { home: usize },
}

impl ScopeKind {
    /// Stack index of the lexical parent of the scope at `index`.
    fn parent(&self, index: usize) -> Option<usize> {
        match self {
            ScopeKind::Branch => index.checked_sub(1),
            ScopeKind::Block { home } => Some(*home),
            ScopeKind::Top | ScopeKind::ClassBody { .. } | ScopeKind::Method { .. } => None,
        }
    }

    /// Whether `class`, `def` and constant declarations may appear here.
    pub fn allows_definitions(&self) -> bool {
        matches!(self, ScopeKind::Top | ScopeKind::ClassBody { .. })
    }
}

/// How a scope's evaluation ended with respect to `return`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReturnState {
    #[default]
    Open,
    /// Every path returned; later expressions are unreachable.
    Returned(Value),
    /// Some paths returned these values; others fall through.
    Partial(Value),
}

impl ReturnState {
    pub fn is_returned(&self) -> bool {
        matches!(self, ReturnState::Returned(_))
    }

    /// The value returned on the paths that returned, if any did.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ReturnState::Open => None,
            ReturnState::Returned(v) | ReturnState::Partial(v) => Some(v),
        }
    }
}

/// One scope: locals, overrides, return state and the node memo.
#[derive(Clone, Debug)]
pub struct Scope {
    kind: ScopeKind,
    /// Locals in first-assignment order.
    locals: Vec<(Name, Binding)>,
    /// Replacement values for bindings, valid in this scope and the scopes
    /// reading through it.
    overrides: FxHashMap<BindingId, Value>,
    return_state: ReturnState,
    cache: FxHashMap<NodeId, Value>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Scope {
            kind,
            locals: Vec::new(),
            overrides: FxHashMap::default(),
            return_state: ReturnState::Open,
            cache: FxHashMap::default(),
        }
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    // ===== Locals =====

    pub fn local(&self, name: Name) -> Option<&Binding> {
        self.locals.iter().find(|(n, _)| *n == name).map(|(_, b)| b)
    }

    fn bind(&mut self, name: Name, binding: Binding) {
        match self.locals.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = binding,
            None => self.locals.push((name, binding)),
        }
    }

    pub fn locals(&self) -> &[(Name, Binding)] {
        &self.locals
    }

    fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.locals.iter().map(|(_, b)| b).find(|b| b.id == id)
    }

    // ===== Overrides =====

    pub fn override_for(&self, id: BindingId) -> Option<&Value> {
        self.overrides.get(&id)
    }

    pub fn add_override(&mut self, id: BindingId, value: Value) {
        self.overrides.insert(id, value);
    }

    pub fn overrides(&self) -> impl Iterator<Item = (BindingId, &Value)> {
        self.overrides.iter().map(|(id, v)| (*id, v))
    }

    // ===== Return state =====

    pub fn return_state(&self) -> &ReturnState {
        &self.return_state
    }

    /// Every path through the rest of this scope returns `value`.
    pub fn record_return(&mut self, value: Value) {
        let value = match &self.return_state {
            ReturnState::Partial(earlier) => earlier.union(&value),
            _ => value,
        };
        self.return_state = ReturnState::Returned(value);
    }

    /// Some paths return `value`; the others continue.
    pub fn record_partial_return(&mut self, value: Value) {
        self.return_state = match &self.return_state {
            ReturnState::Open => ReturnState::Partial(value),
            ReturnState::Partial(earlier) => ReturnState::Partial(earlier.union(&value)),
            ReturnState::Returned(earlier) => ReturnState::Returned(earlier.union(&value)),
        };
    }

    // ===== Memo =====

    pub fn cached(&self, node: NodeId) -> Option<&Value> {
        self.cache.get(&node)
    }

    pub fn cache(&mut self, node: NodeId, value: Value) {
        self.cache.insert(node, value);
    }
}

/// The evaluator's scope stack. Never empty: the bottom is the top-level
/// scope.
#[derive(Clone, Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    next_binding: u32,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope::new(ScopeKind::Top)],
            next_binding: 0,
        }
    }

    /// Push a scope and return its index.
    pub fn push(&mut self, kind: ScopeKind) -> usize {
        self.scopes.push(Scope::new(kind));
        self.scopes.len() - 1
    }

    /// Pop the topmost scope. The top-level scope is never popped.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn top_index(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn top(&self) -> &Scope {
        &self.scopes[self.top_index()]
    }

    pub fn top_mut(&mut self) -> &mut Scope {
        let index = self.top_index();
        &mut self.scopes[index]
    }

    /// The topmost scope followed by its lexical ancestors.
    pub fn chain(&self) -> impl Iterator<Item = &Scope> + '_ {
        let mut next = Some(self.top_index());
        std::iter::from_fn(move || {
            let index = next?;
            let scope = &self.scopes[index];
            next = scope.kind.parent(index);
            Some(scope)
        })
    }

    /// The scope ending the lexical chain: a method, class body or the top.
    pub fn frame(&self) -> &ScopeKind {
        let mut kind = &self.top().kind;
        for scope in self.chain() {
            kind = &scope.kind;
        }
        kind
    }

    /// Assign `value` to local `name` in the topmost scope as a new binding.
    pub fn assign(&mut self, name: Name, value: Value) -> BindingId {
        let id = BindingId(self.next_binding);
        self.next_binding += 1;
        self.top_mut().bind(name, Binding { id, value });
        id
    }

    /// A local's binding, before overrides.
    pub fn lookup_local(&self, name: Name) -> Option<&Binding> {
        self.chain().find_map(|s| s.local(name))
    }

    /// A local's current value.
    pub fn read_local(&self, name: Name) -> Option<Value> {
        self.lookup_local(name).map(|b| self.resolve(b))
    }

    /// The value of `binding` after the nearest override, if any.
    pub fn resolve(&self, binding: &Binding) -> Value {
        self.chain()
            .find_map(|s| s.override_for(binding.id))
            .unwrap_or(&binding.value)
            .clone()
    }

    /// The current value of the binding `id`, if it is visible from here.
    pub fn resolve_id(&self, id: BindingId) -> Option<Value> {
        self.chain()
            .find_map(|s| s.override_for(id))
            .or_else(|| {
                self.chain()
                    .find_map(|s| s.binding(id))
                    .map(|b| &b.value)
            })
            .cloned()
    }

    pub fn cached(&self, node: NodeId) -> Option<&Value> {
        self.chain().find_map(|s| s.cached(node))
    }

    /// `self` for the code at the top of the stack.
    pub fn self_value(&self) -> Instance {
        match self.frame() {
            ScopeKind::Method { self_value, .. } => *self_value,
            ScopeKind::ClassBody { class } => Instance::class_ref(*class),
            _ => Instance::with_value(ClassId::OBJECT, ConstValue::Label(Name::MAIN)),
        }
    }

    /// The block passed to the enclosing method invocation.
    pub fn current_block(&self) -> Option<BlockRef> {
        match self.frame() {
            ScopeKind::Method { block, .. } => *block,
            _ => None,
        }
    }

    /// True when a `return` here would return from a method.
    pub fn in_method(&self) -> bool {
        // A block scope cuts the walk: returning from its home method is not
        // modelled.
        for scope in self.chain() {
            match scope.kind {
                ScopeKind::Branch => {}
                ScopeKind::Method { .. } => return true,
                _ => return false,
            }
        }
        false
    }

    /// Class whose constants are visible first.
    pub fn lexical_class(&self) -> ClassId {
        match self.frame() {
            ScopeKind::ClassBody { class } => *class,
            ScopeKind::Method { owner, .. } => *owner,
            _ => ClassId::OBJECT,
        }
    }
}
