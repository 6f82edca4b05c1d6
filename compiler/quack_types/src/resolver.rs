//! Generic resolution.
//!
//! Binds the free type variables of a generic [`Callable`] against the
//! argument types of one [`Call`], then substitutes the bindings into the
//! return type.
//!
//! # Algorithm
//!
//! Each pass walks three legs in order:
//!
//! 1. positional parameters against their arguments,
//! 2. keyword parameters against the supplied keywords,
//! 3. the block: its return type against what the supplied block returns.
//!
//! A parameter typed as a bare variable binds directly to the argument's
//! type. A parameterized parameter such as `Array[T]` unifies its type
//! arguments pairwise with the argument's. A parameter typed as a duck type binds structurally: for each
//! required method `m`, find an `m` on the argument's class whose signature
//! satisfies the requirement (with the bindings known so far substituted),
//! and unify the requirement's return type with that method's return type.
//!
//! Requirements whose parameters still mention unbound variables wait for a
//! later pass, as does the block while its parameter types are unbound. If
//! a pass binds nothing, it is retried once with waiting disabled; if that
//! binds nothing either, resolution stops. Since every continuing pass binds
//! at least one variable, there are at most `max(k, 1)` passes for `k` free
//! variables.
//!
//! Bindings are final. Variables left unbound stay in the result type; the
//! caller treats them as unknown.

use rustc_hash::FxHashMap;

use crate::{
    BlockArg, Bindings, Call, Callable, ClassId, ClassRegistry, Matcher, Slot, Ty, TypeVar,
};

/// Types the result of a literal block.
///
/// The evaluator implements this by evaluating the block body with
/// parameters of the given types.
pub trait YieldTyper {
    fn block_return(&mut self, params: &[Ty]) -> Ty;
}

/// Outcome of one resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Return type with bindings substituted.
    pub ret: Ty,
    pub bindings: Bindings,
    /// Number of passes performed.
    pub passes: usize,
}

/// Resolver over one registry.
#[derive(Copy, Clone)]
pub struct Resolver<'r> {
    registry: &'r ClassRegistry,
    matcher: Matcher<'r>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Resolver {
            registry,
            matcher: Matcher::new(registry),
        }
    }

    /// Resolve `sig` for `call` on a receiver of type `receiver`.
    ///
    /// A literal block is evaluated through `yields` at most once.
    #[tracing::instrument(level = "trace", skip_all, fields(free = sig.free_vars.len()))]
    pub fn resolve(
        &self,
        sig: &Callable,
        call: &Call,
        receiver: &Ty,
        yields: &mut dyn YieldTyper,
    ) -> Resolution {
        let mut state = PassState {
            resolver: *self,
            sig,
            call,
            receiver,
            slots: sig.arrange(call.positional.len()),
            bindings: Bindings::new(),
            block_done: sig.block.is_none() || call.block.is_none(),
        };

        let limit = sig.free_vars.len().max(1);
        let mut passes = 0;
        while passes < limit {
            passes += 1;
            let before = state.bindings.len();
            state.sweep(yields, false);
            if state.bindings.len() == before {
                state.sweep(yields, true);
            }
            if state.bindings.len() == before || state.finished() {
                break;
            }
        }
        if !state.block_done {
            state.block_leg(yields, true);
        }

        tracing::trace!(passes, bound = state.bindings.len(), "generic resolution done");
        let ret = sig.ret.with_self(receiver).substitute(&state.bindings);
        Resolution {
            ret,
            bindings: state.bindings,
            passes,
        }
    }
}

struct PassState<'a, 'r> {
    resolver: Resolver<'r>,
    sig: &'a Callable,
    call: &'a Call,
    receiver: &'a Ty,
    slots: Option<Vec<Slot>>,
    bindings: Bindings,
    block_done: bool,
}

impl PassState<'_, '_> {
    fn finished(&self) -> bool {
        self.block_done
            && self
                .sig
                .free_vars
                .iter()
                .all(|v| self.bindings.is_bound(*v))
    }

    fn sweep(&mut self, yields: &mut dyn YieldTyper, forced: bool) {
        let (sig, call) = (self.sig, self.call);
        let registry = self.resolver.registry;

        if let Some(slots) = self.slots.clone() {
            for (param, slot) in sig.params.iter().zip(slots) {
                let args = match slot {
                    Slot::Arg(i) => i..i + 1,
                    Slot::Rest(range) => range,
                    Slot::Default => continue,
                };
                for i in args {
                    let concrete = call.positional[i].ty(registry);
                    self.unify(&param.ty, &concrete, forced);
                }
            }
        }

        for (name, value) in &call.keywords {
            if let Some(kw) = sig.keyword_param(*name) {
                self.unify(&kw.ty, &value.ty(registry), forced);
            }
        }

        if !self.block_done {
            self.block_leg(yields, forced);
        }
    }

    fn block_leg(&mut self, yields: &mut dyn YieldTyper, forced: bool) {
        let (sig, call) = (self.sig, self.call);
        let (Some(expected), Some(given)) = (&sig.block, &call.block) else {
            self.block_done = true;
            return;
        };
        let params: Vec<Ty> = expected
            .params
            .iter()
            .map(|t| t.with_self(self.receiver).substitute(&self.bindings))
            .collect();
        if !forced && params.iter().any(Ty::has_vars) {
            return;
        }
        self.block_done = true;
        let returned = match given {
            BlockArg::Literal { .. } => yields.block_return(&params),
            BlockArg::Typed(block) => block.ret.clone(),
        };
        self.unify(&expected.ret, &returned, forced);
    }

    fn is_free(&self, var: TypeVar) -> bool {
        self.sig.free_vars.contains(&var)
    }

    fn unify(&mut self, generic: &Ty, concrete: &Ty, forced: bool) {
        match generic {
            Ty::Var(v) if self.is_free(*v) => {
                if !matches!(concrete, Ty::Any) && !concrete.has_vars() {
                    self.bindings.bind(*v, concrete.clone());
                }
            }
            _ if generic == concrete => {}
            Ty::Generic(_, params) => match concrete {
                Ty::Generic(_, args) if args.len() == params.len() => {
                    for (param, arg) in params.iter().zip(args) {
                        self.unify(param, arg, forced);
                    }
                }
                Ty::Union(members) => self.unify_each(generic, members, forced),
                _ => {}
            },
            Ty::Duck(_) => match concrete {
                Ty::Class(c) => self.unify_duck(generic, *c, forced),
                Ty::Union(members) => self.unify_each(generic, members, forced),
                _ => {}
            },
            _ => {}
        }
    }

    /// Structural leg: match each requirement of the duck type against the
    /// methods of `class`.
    fn unify_duck(&mut self, generic: &Ty, class: ClassId, forced: bool) {
        let Ty::Duck(duck) = generic else { return };
        let registry = self.resolver.registry;
        for (name, required) in duck.methods() {
            let rewritten = required.substitute(&self.bindings);
            if !forced && rewritten.params.iter().any(|p| p.ty.has_vars()) {
                continue;
            }
            let Some(ids) = registry.lookup_instance_method(class, *name) else {
                continue;
            };
            let Some(found) = self.resolver.matcher.find_satisfying(ids, &rewritten) else {
                continue;
            };
            let concrete_ret = registry.method(found).sig.ret.with_self(&Ty::Class(class));
            self.unify(&required.ret, &concrete_ret, forced);
        }
    }

    /// Unify against each member of a union separately, binding each newly
    /// resolved variable to the union of its per-member results.
    fn unify_each(&mut self, generic: &Ty, members: &[Ty], forced: bool) {
        let mut found: FxHashMap<TypeVar, Vec<Ty>> = FxHashMap::default();
        for member in members {
            let saved = self.bindings.clone();
            self.unify(generic, member, forced);
            let scratch = std::mem::replace(&mut self.bindings, saved);
            for (var, ty) in scratch.iter() {
                if !self.bindings.is_bound(var) {
                    found.entry(var).or_default().push(ty.clone());
                }
            }
        }
        for (var, tys) in found {
            self.bindings.bind(var, Ty::union(tys));
        }
    }
}
