//! Method calls, allocation, user-method invocation, blocks and `yield`.
//!
//! A call on a union receiver is dispatched per member and the results are
//! merged. If any member cannot take the call, the call site gets one issue
//! (the first member's problem) and evaluates to `Broken`.

use quack_diagnostic::IssueKind;
use quack_ir::{Name, NodeId, NodeKind};
use quack_types::{
    BlockArg, Call, Callable, FoldCx, FoldFn, Instance, Matcher, MethodBody, MethodDef,
    MethodId, Resolver, Slot, Ty, Value, YieldTyper,
};

use super::Evaluator;
use crate::scope::{BlockRef, ReturnState, ScopeKind};

/// A user-method invocation in progress, for cycle detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct ActiveCall {
    method: MethodId,
    receiver: Instance,
    positional: Vec<Value>,
    keywords: Vec<(Name, Value)>,
}

/// Why one receiver member could not take a call.
struct CallFailure {
    kind: IssueKind,
    message: String,
}

/// Types a literal block for the generic resolver by evaluating it.
struct BlockTyper<'e, 'a> {
    evaluator: &'e mut Evaluator<'a>,
    block: Option<BlockRef>,
    receiver: Instance,
}

impl YieldTyper for BlockTyper<'_, '_> {
    fn block_return(&mut self, params: &[Ty]) -> Ty {
        let Some(block) = self.block else {
            return Ty::Any;
        };
        let shared = self.evaluator.registry;
        let args: Vec<Value> = {
            let registry = shared.read();
            let receiver_ty = Value::Instance(self.receiver).ty(&registry);
            params
                .iter()
                .map(|ty| {
                    if *ty == receiver_ty {
                        Value::Instance(self.receiver)
                    } else {
                        Value::from_ty(ty, &registry)
                    }
                })
                .collect()
        };
        let returned = self.evaluator.invoke_block(block, &args);
        let registry = shared.read();
        returned.ty(&registry)
    }
}

impl Evaluator<'_> {
    // ===== Call sites =====

    pub(super) fn eval_iter(&mut self, node: NodeId) -> Value {
        let arena = self.arena;
        let Some(call) = arena.child(node, 0) else {
            return self.malformed(node);
        };
        let block = BlockRef {
            params: arena.child(node, 1),
            body: arena.child(node, 2),
            home: self.scopes.top_index(),
        };
        if arena.kind(call) != NodeKind::Call {
            return self.malformed(node);
        }
        self.eval_call(call, Some(block))
    }

    #[tracing::instrument(level = "trace", skip_all, fields(node = node.raw()))]
    pub(super) fn eval_call(&mut self, node: NodeId, block: Option<BlockRef>) -> Value {
        let arena = self.arena;
        let receiver_node = arena.child(node, 0);
        let name = arena.name_at(node, 1);
        let arg_nodes: Vec<NodeId> = arena.children_from(node, 2).collect();

        // A bare identifier may be a local the parser could not tell apart
        // from a call.
        if receiver_node.is_none() && arg_nodes.is_empty() && block.is_none() {
            if let Some(value) = self.scopes.read_local(name) {
                return value;
            }
        }

        let receiver = match receiver_node {
            Some(r) => self.eval(r),
            None => Value::Instance(self.scopes.self_value()),
        };
        let call = self.eval_args(&arg_nodes, block);
        self.dispatch(node, &receiver, name, &call, block, receiver_node.is_none())
    }

    /// Evaluate arguments; trailing `Pair` nodes become keywords.
    fn eval_args(&mut self, nodes: &[NodeId], block: Option<BlockRef>) -> Call {
        let arena = self.arena;
        let mut call = Call::default();
        for &arg in nodes {
            if arena.kind(arg) == NodeKind::Pair {
                let value = self.eval_opt(arena.child(arg, 1));
                call.keywords.push((arena.name_at(arg, 0), value));
            } else {
                let value = self.eval(arg);
                call.positional.push(value);
            }
        }
        if let Some(block) = block {
            let arity = block
                .params
                .map_or(0, |params| arena.children_from(params, 0).count());
            call.block = Some(BlockArg::Literal { arity });
        }
        call
    }

    pub(super) fn dispatch(
        &mut self,
        node: NodeId,
        receiver: &Value,
        name: Name,
        call: &Call,
        block: Option<BlockRef>,
        receiverless: bool,
    ) -> Value {
        match receiver {
            Value::Broken => return Value::Broken,
            Value::Impossible => return Value::Impossible,
            Value::Instance(_) | Value::Union(_) => {}
        }
        let members = receiver.members().to_vec();
        let mut results = Vec::with_capacity(members.len());
        let mut failure = None;
        for member in &members {
            match self.call_member(member, name, call, block, receiverless) {
                Ok(value) => results.push(value),
                Err(problem) => {
                    failure.get_or_insert(problem);
                }
            }
        }
        if let Some(CallFailure { kind, message }) = failure {
            // A broken argument was already reported where it broke.
            if !call.has_broken() {
                self.report(kind, node, message);
            }
            return Value::Broken;
        }
        Value::union_all(&results)
    }

    fn call_member(
        &mut self,
        member: &Instance,
        name: Name,
        call: &Call,
        block: Option<BlockRef>,
        receiverless: bool,
    ) -> Result<Value, CallFailure> {
        let shared = self.registry;
        let selected = {
            let registry = shared.read();
            let Some(candidates) = registry.lookup_for(member, name) else {
                let what = if receiverless && call.positional.is_empty() && call.keywords.is_empty()
                {
                    "local variable or method"
                } else {
                    "method"
                };
                let message = format!(
                    "Undefined {what} `{}' for {}",
                    self.name_str(name),
                    Value::Instance(*member).describe(&registry, self.interner)
                );
                return Err(CallFailure {
                    kind: IssueKind::UndefinedLocalOrMethod,
                    message,
                });
            };
            let allocates = candidates
                .first()
                .is_some_and(|id| matches!(registry.method(*id).body, MethodBody::Allocate));
            if allocates {
                None
            } else {
                let id = Matcher::new(&registry)
                    .select(candidates, call)
                    .map_err(|mismatch| CallFailure {
                        kind: IssueKind::ArgumentMismatch,
                        message: mismatch.render(&registry, self.interner),
                    })?;
                Some((id, registry.method(id).clone()))
            }
        };

        let Some((id, method)) = selected else {
            return self.allocate(member, call, block);
        };
        match method.body {
            MethodBody::User { .. } => Ok(self.invoke_user(id, &method, *member, call, block)),
            MethodBody::Builtin(fold) => Ok(self.call_builtin(&method.sig, fold, member, call, block)),
            MethodBody::Allocate => self.allocate(member, call, block),
        }
    }

    // ===== Built-ins =====

    fn call_builtin(
        &mut self,
        sig: &Callable,
        fold: Option<FoldFn>,
        member: &Instance,
        call: &Call,
        block: Option<BlockRef>,
    ) -> Value {
        let literal = block.filter(|_| sig.block.is_some());
        let resolved = if sig.is_generic() || literal.is_some() {
            Some(self.resolve_generic(sig, call, member, literal))
        } else {
            None
        };

        if sig.ret == Ty::SelfType {
            return Value::Instance(*member);
        }
        if let Some(fold) = fold {
            let registry = self.registry.read();
            let cx = FoldCx {
                registry: &registry,
                interner: self.interner,
            };
            if let Some(value) = fold(&cx, member, &call.positional) {
                return value;
            }
        }
        let registry = self.registry.read();
        let ret = resolved
            .unwrap_or_else(|| sig.ret.with_self(&Value::Instance(*member).ty(&registry)));
        Value::from_ty(&ret, &registry)
    }

    /// Bind the free variables of `sig` for this call, evaluating a literal
    /// block when its result type is needed.
    fn resolve_generic(
        &mut self,
        sig: &Callable,
        call: &Call,
        member: &Instance,
        block: Option<BlockRef>,
    ) -> Ty {
        let shared = self.registry;
        let registry = shared.read();
        let receiver = Value::Instance(*member).ty(&registry);
        let mut typer = BlockTyper {
            evaluator: self,
            block,
            receiver: *member,
        };
        let resolution = Resolver::new(&registry).resolve(sig, call, &receiver, &mut typer);
        resolution.ret
    }

    // ===== Allocation =====

    /// `Foo.new(...)`: match `initialize`, run a user-defined one against
    /// the new instance, and return the instance.
    fn allocate(
        &mut self,
        member: &Instance,
        call: &Call,
        block: Option<BlockRef>,
    ) -> Result<Value, CallFailure> {
        let Some(class) = member.referenced_class() else {
            return Ok(Value::Broken);
        };
        let instance = Instance::of(class);
        let shared = self.registry;
        let initializer = {
            let registry = shared.read();
            match registry.lookup_instance_method(class, Name::INITIALIZE) {
                None => None,
                Some(candidates) => {
                    let id = Matcher::new(&registry)
                        .select(candidates, call)
                        .map_err(|mismatch| CallFailure {
                            kind: IssueKind::ArgumentMismatch,
                            message: mismatch.render(&registry, self.interner),
                        })?;
                    Some((id, registry.method(id).clone()))
                }
            }
        };
        if let Some((id, method)) = initializer {
            if method.is_user() {
                self.invoke_user(id, &method, instance, call, block);
            }
        }
        Ok(Value::Instance(instance))
    }

    // ===== User methods =====

    fn invoke_user(
        &mut self,
        id: MethodId,
        method: &MethodDef,
        receiver: Instance,
        call: &Call,
        block: Option<BlockRef>,
    ) -> Value {
        let MethodBody::User { params, body } = method.body else {
            return Value::Broken;
        };
        let key = ActiveCall {
            method: id,
            receiver,
            positional: call.positional.clone(),
            keywords: call.keywords.clone(),
        };
        if self.active.contains(&key) {
            tracing::warn!(method = self.name_str(method.name), "recursive call cut off");
            return Value::Broken;
        }
        if self.active.len() >= self.config.max_call_depth {
            tracing::warn!(
                method = self.name_str(method.name),
                depth = self.active.len(),
                "call depth limit reached"
            );
            return Value::Broken;
        }

        self.active.push(key);
        self.scopes.push(ScopeKind::Method {
            self_value: receiver,
            owner: method.owner,
            block,
        });
        if params.is_valid() {
            self.bind_method_params(params, &method.sig, call);
        }
        let last = self.eval_opt(body);
        let scope = self.scopes.pop();
        self.active.pop();

        match scope.map(|s| s.return_state().clone()) {
            Some(ReturnState::Returned(value)) => value,
            Some(ReturnState::Partial(value)) => value.union(&last),
            _ => last,
        }
    }

    /// Bind parameters in the fresh method scope. The call has already
    /// been matched against `sig`.
    fn bind_method_params(&mut self, params: NodeId, sig: &Callable, call: &Call) {
        let arena = self.arena;
        let positional: Vec<NodeId> = arena
            .children_from(params, 0)
            .filter(|p| {
                matches!(
                    arena.kind(*p),
                    NodeKind::Param | NodeKind::OptParam | NodeKind::RestParam
                )
            })
            .collect();
        let slots = sig.arrange(call.positional.len()).unwrap_or_default();
        for (param, slot) in positional.into_iter().zip(slots) {
            let value = match slot {
                Slot::Arg(i) => call.positional[i].clone(),
                Slot::Default => self.eval_opt(arena.child(param, 1)),
                Slot::Rest(range) => {
                    let rest = call.positional[range].to_vec();
                    Value::Instance(self.registry.read().array_of(rest))
                }
            };
            self.scopes.assign(arena.name_at(param, 0), value);
        }

        for param in arena.children_from(params, 0) {
            let default = match arena.kind(param) {
                NodeKind::KwParam => None,
                NodeKind::OptKwParam => arena.child(param, 1),
                _ => continue,
            };
            let name = arena.name_at(param, 0);
            let value = match call.keyword_value(name) {
                Some(value) => value.clone(),
                None => self.eval_opt(default),
            };
            self.scopes.assign(name, value);
        }
    }

    // ===== Blocks =====

    pub(super) fn eval_yield(&mut self, node: NodeId) -> Value {
        let arena = self.arena;
        let arg_nodes: Vec<NodeId> = arena.children_from(node, 0).collect();
        let args: Vec<Value> = arg_nodes.into_iter().map(|a| self.eval(a)).collect();
        let Some(block) = self.scopes.current_block() else {
            self.report(IssueKind::MissingBlock, node, "no block given (yield)");
            return Value::Broken;
        };
        self.invoke_block(block, &args)
    }

    /// Run a block literal with `args`. Block parameters are lenient: extra
    /// arguments are dropped and missing ones are `nil`.
    fn invoke_block(&mut self, block: BlockRef, args: &[Value]) -> Value {
        self.scopes.push(ScopeKind::Block { home: block.home });
        if let Some(params) = block.params {
            self.bind_block_params(params, args);
        }
        let value = self.eval_opt(block.body);
        self.scopes.pop();
        value
    }

    fn bind_block_params(&mut self, params: NodeId, args: &[Value]) {
        let arena = self.arena;
        let list: Vec<NodeId> = arena.children_from(params, 0).collect();
        let mut next = 0;
        for (index, &param) in list.iter().enumerate() {
            let value = match arena.kind(param) {
                NodeKind::Param => args.get(next).cloned().unwrap_or_else(Value::nil),
                NodeKind::OptParam => match args.get(next) {
                    Some(value) => value.clone(),
                    None => self.eval_opt(arena.child(param, 1)),
                },
                NodeKind::RestParam => {
                    // Leave one argument for every plain parameter after the rest.
                    let trailing = list[index + 1..]
                        .iter()
                        .filter(|p| arena.kind(**p) == NodeKind::Param)
                        .count();
                    let end = args.len().saturating_sub(trailing).max(next);
                    let rest = args.get(next..end).unwrap_or_default().to_vec();
                    next = end;
                    Value::Instance(self.registry.read().array_of(rest))
                }
                NodeKind::KwParam => Value::nil(),
                NodeKind::OptKwParam => self.eval_opt(arena.child(param, 1)),
                _ => continue,
            };
            if matches!(arena.kind(param), NodeKind::Param | NodeKind::OptParam) {
                next += 1;
            }
            self.scopes.assign(arena.name_at(param, 0), value);
        }
    }
}
