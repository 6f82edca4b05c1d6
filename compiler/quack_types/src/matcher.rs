//! Call matching.
//!
//! The relation `A <= B` reads "a value typed `A` may be supplied where `B`
//! is expected". `Any`, free variables and `SelfType` are gradual: they are
//! compatible in both directions, leaving variables to the resolver.
//! Type arguments are covariant: `Array[String] <= Array[Integer | String]`.
//! A class without arguments is compatible with any parameterization of it,
//! since its contents are unknown.
//!
//! Matching a [`Call`] against a [`Callable`] checks, in order: positional
//! count, positional types, keywords, and the block. Every violated
//! condition lands in one [`CallMismatch`] so the caller reports a single
//! issue per call site.
//!
//! Overload selection takes the first signature that matches, in
//! declaration order.

use quack_ir::{Name, StringLookup};

use crate::{BlockArg, Call, Callable, ClassId, ClassRegistry, Instance, MethodId, Slot, Ty, Value};

/// Where a mistyped argument sits in the call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgPosition {
    /// 0-based positional index.
    Positional(usize),
    Keyword(Name),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgTypeError {
    pub position: ArgPosition,
    pub expected: Ty,
    pub found: Value,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockProblem {
    /// The method requires a block and none was given.
    Missing,
    /// The supplied block's signature does not fit the method's.
    Incompatible,
}

/// Everything wrong with one call against one signature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallMismatch {
    /// Number of positional arguments supplied.
    pub given: usize,
    /// Accepted positional range `(min, max)` when `given` falls outside it.
    pub arity: Option<(usize, Option<usize>)>,
    pub missing_keywords: Vec<Name>,
    pub unknown_keywords: Vec<Name>,
    pub type_errors: Vec<ArgTypeError>,
    pub block: Option<BlockProblem>,
}

impl CallMismatch {
    fn is_empty(&self) -> bool {
        self.arity.is_none()
            && self.missing_keywords.is_empty()
            && self.unknown_keywords.is_empty()
            && self.type_errors.is_empty()
            && self.block.is_none()
    }

    /// Render as one issue message.
    ///
    /// Count and keyword problems come first, e.g.
    /// `Wrong number of arguments (given 0, expected 1+; missing required
    /// keywords: c; unknown keywords: e)`.
    pub fn render(&self, registry: &ClassRegistry, names: &dyn StringLookup) -> String {
        let join_names = |list: &[Name]| {
            list.iter()
                .map(|n| names.lookup(*n))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut counts = Vec::new();
        if let Some((min, max)) = self.arity {
            let expected = match max {
                Some(max) if max == min => format!("{min}"),
                Some(max) => format!("{min}..{max}"),
                None => format!("{min}+"),
            };
            counts.push(format!("given {}, expected {expected}", self.given));
        }
        if !self.missing_keywords.is_empty() {
            counts.push(format!(
                "missing required keywords: {}",
                join_names(&self.missing_keywords)
            ));
        }
        if !self.unknown_keywords.is_empty() {
            counts.push(format!(
                "unknown keywords: {}",
                join_names(&self.unknown_keywords)
            ));
        }
        if !counts.is_empty() {
            return format!("Wrong number of arguments ({})", counts.join("; "));
        }

        let mut types: Vec<String> = self
            .type_errors
            .iter()
            .map(|e| {
                let at = match e.position {
                    ArgPosition::Positional(i) => format!("argument {}", i + 1),
                    ArgPosition::Keyword(k) => format!("keyword {}", names.lookup(k)),
                };
                format!(
                    "{at} expected {}, given {}",
                    e.expected.display(registry, names),
                    e.found.describe(registry, names)
                )
            })
            .collect();
        match self.block {
            Some(BlockProblem::Missing) => types.push("block required".to_owned()),
            Some(BlockProblem::Incompatible) => types.push("incompatible block".to_owned()),
            None => {}
        }
        format!("Wrong argument type ({})", types.join("; "))
    }
}

/// Call matcher over one registry.
#[derive(Copy, Clone)]
pub struct Matcher<'r> {
    registry: &'r ClassRegistry,
}

impl<'r> Matcher<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Matcher { registry }
    }

    // ===== Subtyping =====

    /// `value <= ty`. Sentinels conform to everything.
    pub fn value_le(&self, value: &Value, ty: &Ty) -> bool {
        match value {
            Value::Broken | Value::Impossible => true,
            v => v.members().iter().all(|m| self.instance_le(m, ty)),
        }
    }

    fn instance_le(&self, instance: &Instance, ty: &Ty) -> bool {
        match ty {
            Ty::Any | Ty::Var(_) | Ty::SelfType => true,
            Ty::Class(c) => self.registry.is_subclass_of(instance.class, *c),
            Ty::Generic(c, params) => {
                self.registry.is_subclass_of(instance.class, *c)
                    && self.registry.type_args(instance).map_or(true, |args| {
                        args.len() == params.len()
                            && args.iter().zip(params).all(|(a, p)| self.value_le(a, p))
                    })
            }
            Ty::Union(members) => members.iter().any(|m| self.instance_le(instance, m)),
            Ty::Duck(duck) => duck.methods().iter().all(|(name, required)| {
                self.registry
                    .lookup_for(instance, *name)
                    .is_some_and(|ids| self.find_satisfying(ids, required).is_some())
            }),
        }
    }

    /// `a <= b` between signature types.
    pub fn ty_le(&self, a: &Ty, b: &Ty) -> bool {
        match (a, b) {
            (Ty::Any | Ty::Var(_) | Ty::SelfType, _) | (_, Ty::Any | Ty::Var(_) | Ty::SelfType) => {
                true
            }
            (Ty::Union(members), b) => members.iter().all(|m| self.ty_le(m, b)),
            (a, Ty::Union(members)) => members.iter().any(|m| self.ty_le(a, m)),
            (Ty::Generic(x, xs), Ty::Generic(y, ys)) => {
                self.registry.is_subclass_of(*x, *y)
                    && xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(a, b)| self.ty_le(a, b))
            }
            (Ty::Class(x) | Ty::Generic(x, _), Ty::Class(y) | Ty::Generic(y, _)) => {
                self.registry.is_subclass_of(*x, *y)
            }
            (Ty::Class(x) | Ty::Generic(x, _), Ty::Duck(duck)) => duck.methods().iter().all(|(name, required)| {
                self.registry
                    .lookup_instance_method(*x, *name)
                    .is_some_and(|ids| self.find_satisfying(ids, required).is_some())
            }),
            (Ty::Duck(have), Ty::Duck(want)) => want.methods().iter().all(|(name, required)| {
                have.requirement(*name)
                    .is_some_and(|provided| self.callable_satisfies(required, provided))
            }),
            (Ty::Duck(_), Ty::Class(y) | Ty::Generic(y, _)) => {
                *y == ClassId::OBJECT || *y == ClassId::BASIC_OBJECT
            }
        }
    }

    /// True if a method with signature `provided` can be called everywhere a
    /// method with signature `required` could be.
    ///
    /// Parameters are contravariant, the return type covariant.
    pub fn callable_satisfies(&self, required: &Callable, provided: &Callable) -> bool {
        if provided.min_args() > required.min_args() {
            return false;
        }
        match (required.max_args(), provided.max_args()) {
            (None, Some(_)) => return false,
            (Some(r), Some(p)) if r > p => return false,
            _ => {}
        }
        for (i, param) in required.params.iter().enumerate() {
            let Some(theirs) = provided
                .params
                .get(i)
                .or_else(|| provided.params.last().filter(|p| p.variadic))
            else {
                break;
            };
            if !self.ty_le(&param.ty, &theirs.ty) {
                return false;
            }
        }
        let keywords_ok = provided
            .keywords
            .iter()
            .filter(|k| !k.optional)
            .all(|k| required.keyword_param(k.name).is_some())
            && required.keywords.iter().all(|k| {
                provided
                    .keyword_param(k.name)
                    .is_some_and(|theirs| self.ty_le(&k.ty, &theirs.ty))
            });
        keywords_ok && self.ty_le(&provided.ret, &required.ret)
    }

    /// First overload in `ids` whose signature satisfies `required`.
    pub fn find_satisfying(&self, ids: &[MethodId], required: &Callable) -> Option<MethodId> {
        ids.iter()
            .copied()
            .find(|id| self.callable_satisfies(required, &self.registry.method(*id).sig))
    }

    // ===== Call matching =====

    /// Check `call` against `sig`.
    ///
    /// # Errors
    /// Returns every violated condition. Argument types are only checked
    /// when the positional count is accepted.
    pub fn match_call(&self, sig: &Callable, call: &Call) -> Result<(), CallMismatch> {
        let given = call.positional.len();
        let mut mismatch = CallMismatch {
            given,
            ..CallMismatch::default()
        };

        match sig.arrange(given) {
            None => mismatch.arity = Some((sig.min_args(), sig.max_args())),
            Some(slots) => {
                for (param, slot) in sig.params.iter().zip(slots) {
                    let args = match slot {
                        Slot::Arg(i) => i..i + 1,
                        Slot::Rest(range) => range,
                        Slot::Default => continue,
                    };
                    for i in args {
                        let arg = &call.positional[i];
                        if !self.value_le(arg, &param.ty) {
                            mismatch.type_errors.push(ArgTypeError {
                                position: ArgPosition::Positional(i),
                                expected: param.ty.clone(),
                                found: arg.clone(),
                            });
                        }
                    }
                }
            }
        }

        for kw in &sig.keywords {
            if !kw.optional && call.keyword_value(kw.name).is_none() {
                mismatch.missing_keywords.push(kw.name);
            }
        }
        for (name, value) in &call.keywords {
            match sig.keyword_param(*name) {
                None => mismatch.unknown_keywords.push(*name),
                Some(kw) if mismatch.arity.is_none() && !self.value_le(value, &kw.ty) => {
                    mismatch.type_errors.push(ArgTypeError {
                        position: ArgPosition::Keyword(*name),
                        expected: kw.ty.clone(),
                        found: value.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if let Some(expected) = &sig.block {
            match &call.block {
                None if expected.required => mismatch.block = Some(BlockProblem::Missing),
                Some(BlockArg::Typed(block)) => {
                    let ret_ok = self.ty_le(&block.ret, &expected.ret);
                    let params_ok = expected
                        .params
                        .iter()
                        .zip(&block.params)
                        .all(|(yielded, accepted)| self.ty_le(yielded, &accepted.ty));
                    if !(ret_ok && params_ok) {
                        mismatch.block = Some(BlockProblem::Incompatible);
                    }
                }
                _ => {}
            }
        }

        if mismatch.is_empty() {
            Ok(())
        } else {
            Err(mismatch)
        }
    }

    /// Pick the first overload that accepts `call`.
    ///
    /// # Errors
    /// When none matches, the mismatch against the first declared overload.
    #[tracing::instrument(level = "trace", skip_all, fields(candidates = candidates.len()))]
    pub fn select(&self, candidates: &[MethodId], call: &Call) -> Result<MethodId, CallMismatch> {
        let mut first_failure = None;
        for &id in candidates {
            match self.match_call(&self.registry.method(id).sig, call) {
                Ok(()) => return Ok(id),
                Err(m) => {
                    first_failure.get_or_insert(m);
                }
            }
        }
        Err(first_failure.unwrap_or_default())
    }
}
