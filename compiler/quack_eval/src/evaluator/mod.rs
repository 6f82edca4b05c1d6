//! Abstract evaluator.
//!
//! Walks the expression tree of one unit without running it. Every node
//! evaluates to a [`Value`]: the set of shapes it could produce at run time.
//!
//! # Architecture
//!
//! All evaluation goes through [`Evaluator::eval`], which consults the
//! per-scope node memo and otherwise dispatches on the node kind. Helper
//! modules split the work:
//!
//! - `branch` - conditionals: fork, evaluate, merge
//! - `narrowing` - specializing a branch scope from its condition
//! - `dispatch` - method calls, `new`, user methods, blocks and `yield`
//! - `array` - array literals and splats
//!
//! # Recovery
//!
//! Problems are recorded in the unit's [`IssueLog`] and evaluation goes on
//! with [`Value::Broken`] in place of the unknown result. Anything done to a
//! `Broken` value yields `Broken` again and reports nothing.

mod array;
mod branch;
mod dispatch;
mod narrowing;

use quack_diagnostic::{IssueKind, IssueLog};
use quack_ir::{Literal, Name, NodeArena, NodeId, NodeKind, StringInterner};
use quack_stack::ensure_sufficient_stack;
use quack_types::{
    Callable, ClassId, ConstValue, Instance, MethodBody, MethodKind, MethodSpec, Param, Ty, Value,
};

use crate::scope::{ScopeKind, ScopeStack};
use crate::{EvalConfig, SharedRegistry};

use dispatch::ActiveCall;

/// Evaluator for one unit.
pub struct Evaluator<'a> {
    arena: &'a NodeArena,
    interner: &'a StringInterner,
    registry: &'a SharedRegistry,
    config: EvalConfig,
    issues: IssueLog,
    scopes: ScopeStack,
    /// User-method invocations in progress, outermost first.
    active: Vec<ActiveCall>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        arena: &'a NodeArena,
        interner: &'a StringInterner,
        registry: &'a SharedRegistry,
        config: EvalConfig,
        issues: IssueLog,
    ) -> Self {
        Evaluator {
            arena,
            interner,
            registry,
            config,
            issues,
            scopes: ScopeStack::new(),
            active: Vec::new(),
        }
    }

    pub fn issues(&self) -> &IssueLog {
        &self.issues
    }

    pub fn into_issues(self) -> IssueLog {
        self.issues
    }

    /// The scope stack; after [`Evaluator::evaluate`] only the top-level
    /// scope remains.
    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// Evaluate a unit's root expression and return its value.
    #[tracing::instrument(level = "debug", skip_all, fields(root = root.raw()))]
    pub fn evaluate(&mut self, root: NodeId) -> Value {
        let value = self.eval(root);
        tracing::debug!(issues = self.issues.len(), "unit evaluated");
        value
    }

    /// Evaluate `node` in the current scope, at most once per scope chain.
    pub(crate) fn eval(&mut self, node: NodeId) -> Value {
        if let Some(hit) = self.memo(node) {
            return hit;
        }
        let value = ensure_sufficient_stack(|| self.eval_node(node));
        self.scopes.top_mut().cache(node, value.clone());
        value
    }

    /// The memoised value of `node`, if it was already evaluated.
    ///
    /// A node reading or assigning a local is re-read, so that a condition
    /// reused as a branch value (`a || b`) sees the branch's narrowing.
    pub(crate) fn memo(&self, node: NodeId) -> Option<Value> {
        let hit = self.scopes.cached(node)?;
        let arena = self.arena;
        let local = match arena.kind(node) {
            NodeKind::Lvar | NodeKind::Lasgn => self.scopes.read_local(arena.name_at(node, 0)),
            _ => None,
        };
        Some(local.unwrap_or_else(|| hit.clone()))
    }

    fn eval_node(&mut self, node: NodeId) -> Value {
        let arena = self.arena;
        match arena.kind(node) {
            NodeKind::Lit => Self::eval_literal(arena.literal_at(node, 0)),
            NodeKind::True => Value::Instance(Instance::boolean(true)),
            NodeKind::False => Value::Instance(Instance::boolean(false)),
            NodeKind::Nil => Value::nil(),
            NodeKind::SelfRef => Value::Instance(self.scopes.self_value()),
            NodeKind::Lvar => self.eval_lvar(node),
            NodeKind::Lasgn => {
                let value = self.eval_opt(arena.child(node, 1));
                self.scopes.assign(arena.name_at(node, 0), value.clone());
                value
            }
            NodeKind::Const => self.eval_const(node),
            NodeKind::Cdecl => self.eval_cdecl(node),
            NodeKind::Call => self.eval_call(node, None),
            NodeKind::Iter => self.eval_iter(node),
            NodeKind::Yield => self.eval_yield(node),
            NodeKind::Pair => self.eval_opt(arena.child(node, 1)),
            NodeKind::If => match arena.child(node, 0) {
                Some(cond) => self.eval_if(cond, arena.child(node, 1), arena.child(node, 2)),
                None => self.malformed(node),
            },
            // `a && b` is `if a then b else a`; `a || b` is `if a then a else b`.
            NodeKind::And => match (arena.child(node, 0), arena.child(node, 1)) {
                (Some(a), Some(b)) => self.eval_if(a, Some(b), Some(a)),
                _ => self.malformed(node),
            },
            NodeKind::Or => match (arena.child(node, 0), arena.child(node, 1)) {
                (Some(a), Some(b)) => self.eval_if(a, Some(a), Some(b)),
                _ => self.malformed(node),
            },
            NodeKind::Return => self.eval_return(node),
            NodeKind::Block => self.eval_sequence(node),
            NodeKind::Array => self.eval_array(node),
            NodeKind::Defn => self.eval_defn(node),
            NodeKind::Defs => self.eval_defs(node),
            NodeKind::Class => self.eval_class(node),
            NodeKind::Params
            | NodeKind::Param
            | NodeKind::OptParam
            | NodeKind::RestParam
            | NodeKind::KwParam
            | NodeKind::OptKwParam
            | NodeKind::Splat
            | NodeKind::Case
            | NodeKind::When => self.malformed(node),
        }
    }

    /// Evaluate an optional child; an absent one is `nil`.
    fn eval_opt(&mut self, node: Option<NodeId>) -> Value {
        match node {
            Some(node) => self.eval(node),
            None => Value::nil(),
        }
    }

    /// A node whose kind or operands break the tree contract.
    fn malformed(&self, node: NodeId) -> Value {
        tracing::warn!(
            node = node.raw(),
            kind = ?self.arena.kind(node),
            "node not valid in expression position"
        );
        Value::Broken
    }

    // ===== Issues =====

    fn report(&mut self, kind: IssueKind, node: NodeId, message: impl Into<String>) {
        let line = self.arena.line(node);
        self.issues.report(kind, line, message);
    }

    fn describe(&self, value: &Value) -> String {
        value.describe(&self.registry.read(), self.interner)
    }

    fn name_str(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    // ===== Leaves =====

    fn eval_literal(literal: Option<Literal>) -> Value {
        match literal {
            Some(Literal::Int(n)) => Value::Instance(Instance::int(n)),
            Some(Literal::Float(bits)) => {
                Value::Instance(Instance::with_value(ClassId::FLOAT, ConstValue::Float(bits)))
            }
            Some(Literal::Str(s)) => Value::Instance(Instance::string(s)),
            Some(Literal::Sym(s)) => Value::Instance(Instance::symbol(s)),
            None => Value::Broken,
        }
    }

    fn eval_lvar(&mut self, node: NodeId) -> Value {
        let name = self.arena.name_at(node, 0);
        if let Some(value) = self.scopes.read_local(name) {
            return value;
        }
        let message = format!(
            "Undefined local variable or method `{}' for {}",
            self.name_str(name),
            self.describe(&Value::Instance(self.scopes.self_value()))
        );
        self.report(IssueKind::UndefinedLocalOrMethod, node, message);
        Value::Broken
    }

    /// Evaluate a statement sequence; stops after a statement that returns
    /// on every path.
    fn eval_sequence(&mut self, node: NodeId) -> Value {
        let arena = self.arena;
        let mut last = Value::nil();
        for child in arena.children_from(node, 0) {
            last = self.eval(child);
            if self.scopes.top().return_state().is_returned() {
                break;
            }
        }
        last
    }

    fn eval_return(&mut self, node: NodeId) -> Value {
        let value = self.eval_opt(self.arena.child(node, 0));
        if !self.scopes.in_method() {
            self.report(IssueKind::UnexpectedReturn, node, "unexpected return");
            return Value::Broken;
        }
        self.scopes.top_mut().record_return(value);
        Value::Impossible
    }

    // ===== Constants =====

    fn lookup_constant(&self, name: Name) -> Option<Value> {
        let registry = self.registry.read();
        let found = registry
            .ancestors(self.scopes.lexical_class())
            .chain(std::iter::once(ClassId::OBJECT))
            .find_map(|class| registry.constant(class, name).cloned())
            .or_else(|| {
                registry
                    .class_named(name)
                    .map(|class| Value::Instance(Instance::class_ref(class)))
            });
        found
    }

    fn eval_const(&mut self, node: NodeId) -> Value {
        let name = self.arena.name_at(node, 0);
        if let Some(value) = self.lookup_constant(name) {
            return value;
        }
        let message = format!("uninitialized constant {}", self.name_str(name));
        self.report(IssueKind::UndefinedConstant, node, message);
        Value::Broken
    }

    fn eval_cdecl(&mut self, node: NodeId) -> Value {
        let name = self.arena.name_at(node, 0);
        let value = self.eval_opt(self.arena.child(node, 1));
        if !self.definitions_allowed(node, "constant declaration") {
            return Value::Broken;
        }
        let class = self.scopes.lexical_class();
        let shared = self.registry;
        let Some(mut registry) = shared.try_write() else {
            return self.registry_busy(node, "constant declaration");
        };
        registry.set_constant(class, name, value.clone());
        value
    }

    // ===== Definitions =====

    /// Report and refuse a definition outside the top level or a class body.
    fn definitions_allowed(&mut self, node: NodeId, what: &str) -> bool {
        if self.scopes.top().kind().allows_definitions() {
            return true;
        }
        self.report(
            IssueKind::ReopenInBranch,
            node,
            format!("{what} is only allowed at the top level or in a class body"),
        );
        false
    }

    fn registry_busy(&mut self, node: NodeId, what: &str) -> Value {
        tracing::warn!(node = node.raw(), what, "class registry locked during definition");
        self.report(
            IssueKind::ReopenInBranch,
            node,
            format!("{what} is only allowed at the top level or in a class body"),
        );
        Value::Broken
    }

    /// Build the signature of a user method from its parameter list.
    ///
    /// User methods are untyped; the flags decide arity and keywords.
    fn signature_of(&self, params: Option<NodeId>) -> Callable {
        let arena = self.arena;
        let mut sig = Callable::returning(Ty::Any);
        let Some(params) = params else { return sig };
        for param in arena.children_from(params, 0) {
            let name = arena.name_at(param, 0);
            sig = match arena.kind(param) {
                NodeKind::Param => sig.param(Param::required(name, Ty::Any)),
                NodeKind::OptParam => sig.param(Param::optional(name, Ty::Any)),
                NodeKind::RestParam => sig.param(Param::rest(name, Ty::Any)),
                NodeKind::KwParam => sig.keyword(name, Ty::Any, false),
                NodeKind::OptKwParam => sig.keyword(name, Ty::Any, true),
                kind => {
                    tracing::warn!(?kind, "non-parameter node in parameter list");
                    sig
                }
            };
        }
        sig
    }

    fn define_method(
        &mut self,
        node: NodeId,
        owner: ClassId,
        kind: MethodKind,
        name: Name,
        params: Option<NodeId>,
        body: Option<NodeId>,
    ) -> Value {
        let spec = MethodSpec {
            kind,
            name,
            sig: self.signature_of(params),
            body: MethodBody::User {
                params: params.unwrap_or(NodeId::INVALID),
                body,
            },
        };
        let shared = self.registry;
        let Some(mut registry) = shared.try_write() else {
            return self.registry_busy(node, "method definition");
        };
        match registry.reopen(owner, vec![spec]) {
            Ok(_) => Value::Instance(Instance::symbol(name)),
            Err(error) => {
                tracing::warn!(%error, "method definition rejected");
                Value::Broken
            }
        }
    }

    fn eval_defn(&mut self, node: NodeId) -> Value {
        if !self.definitions_allowed(node, "method definition") {
            return Value::Broken;
        }
        let arena = self.arena;
        let owner = match self.scopes.top().kind() {
            ScopeKind::ClassBody { class } => *class,
            _ => ClassId::OBJECT,
        };
        self.define_method(
            node,
            owner,
            MethodKind::Instance,
            arena.name_at(node, 0),
            arena.child(node, 1),
            arena.child(node, 2),
        )
    }

    fn eval_defs(&mut self, node: NodeId) -> Value {
        if !self.definitions_allowed(node, "method definition") {
            return Value::Broken;
        }
        let arena = self.arena;
        let receiver = self.eval_opt(arena.child(node, 0));
        let target = match &receiver {
            Value::Instance(i) => i.referenced_class(),
            _ => None,
        };
        let Some(owner) = target else {
            tracing::warn!(node = node.raw(), "singleton method on a non-class receiver");
            return Value::Broken;
        };
        self.define_method(
            node,
            owner,
            MethodKind::Class,
            arena.name_at(node, 1),
            arena.child(node, 2),
            arena.child(node, 3),
        )
    }

    fn eval_class(&mut self, node: NodeId) -> Value {
        if !self.definitions_allowed(node, "class definition") {
            return Value::Broken;
        }
        let arena = self.arena;
        let name = arena.name_at(node, 0);
        let superclass = match arena.child(node, 1) {
            None => None,
            Some(sup) => match self.eval(sup) {
                Value::Instance(i) => i.referenced_class(),
                _ => None,
            },
        };

        let shared = self.registry;
        let (class, mismatch) = {
            let Some(mut registry) = shared.try_write() else {
                return self.registry_busy(node, "class definition");
            };
            match registry.class_named(name) {
                Some(existing) => {
                    let mismatch = superclass
                        .is_some_and(|sup| registry.superclass(existing) != Some(sup));
                    (existing, mismatch)
                }
                None => match registry.define_class(name, superclass) {
                    Ok(class) => (class, false),
                    Err(error) => {
                        tracing::warn!(%error, "class definition rejected");
                        return Value::Broken;
                    }
                },
            }
        };
        if mismatch {
            let message = format!("superclass mismatch for class {}", self.name_str(name));
            self.report(IssueKind::SuperclassMismatch, node, message);
        }

        self.scopes.push(ScopeKind::ClassBody { class });
        let value = self.eval_opt(arena.child(node, 2));
        self.scopes.pop();
        value
    }
}
