//! Method signatures and call sites.
//!
//! A [`Callable`] describes what a method accepts: positional parameters
//! (each possibly optional or variadic), keyword parameters, an optional
//! block, a return type, and the free type variables that make it generic.
//! A [`Call`] is the evaluated argument list of one call-site occurrence.

use std::ops::Range;

use quack_ir::Name;

use crate::{Bindings, Ty, TypeVar, Value};

/// A positional parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Name,
    pub ty: Ty,
    pub optional: bool,
    /// Collects all remaining arguments (`*rest`).
    pub variadic: bool,
}

impl Param {
    pub fn required(name: Name, ty: Ty) -> Self {
        Param {
            name,
            ty,
            optional: false,
            variadic: false,
        }
    }

    pub fn optional(name: Name, ty: Ty) -> Self {
        Param {
            optional: true,
            ..Param::required(name, ty)
        }
    }

    pub fn rest(name: Name, ty: Ty) -> Self {
        Param {
            variadic: true,
            ..Param::required(name, ty)
        }
    }
}

/// A keyword parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeywordParam {
    pub name: Name,
    pub ty: Ty,
    pub optional: bool,
}

/// The block a method accepts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockSig {
    /// Types of the values the method yields.
    pub params: Vec<Ty>,
    /// What the method expects the block to return.
    pub ret: Ty,
    /// Whether calling without a block is a mismatch.
    pub required: bool,
}

/// Structural problem with a signature.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SignatureError {
    #[error("more than one variadic parameter")]
    MultipleVariadic,
    #[error("variadic parameter is not the last positional parameter")]
    VariadicNotLast,
    #[error("keyword declared twice")]
    DuplicateKeyword,
}

/// How call arguments map onto one positional parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// The parameter receives argument `i`.
    Arg(usize),
    /// An optional parameter left to its default.
    Default,
    /// A variadic parameter receiving these arguments.
    Rest(Range<usize>),
}

/// A method signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Callable {
    pub params: Vec<Param>,
    /// Keyword parameters in declaration order.
    pub keywords: Vec<KeywordParam>,
    pub block: Option<BlockSig>,
    pub ret: Ty,
    /// Free type variables owned by this signature; empty when not generic.
    pub free_vars: Vec<TypeVar>,
}

impl Callable {
    /// A signature with no parameters.
    pub fn returning(ret: Ty) -> Self {
        Callable {
            params: Vec::new(),
            keywords: Vec::new(),
            block: None,
            ret,
            free_vars: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn keyword(mut self, name: Name, ty: Ty, optional: bool) -> Self {
        self.keywords.push(KeywordParam { name, ty, optional });
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: BlockSig) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub fn generic(mut self, vars: impl IntoIterator<Item = TypeVar>) -> Self {
        self.free_vars.extend(vars);
        self
    }

    /// Check the parameter-list invariants.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SignatureError> {
        let variadics = self.params.iter().filter(|p| p.variadic).count();
        if variadics > 1 {
            return Err(SignatureError::MultipleVariadic);
        }
        if variadics == 1 && !self.params.last().is_some_and(|p| p.variadic) {
            return Err(SignatureError::VariadicNotLast);
        }
        for (i, kw) in self.keywords.iter().enumerate() {
            if self.keywords[..i].iter().any(|k| k.name == kw.name) {
                return Err(SignatureError::DuplicateKeyword);
            }
        }
        Ok(())
    }

    pub fn is_generic(&self) -> bool {
        !self.free_vars.is_empty()
    }

    pub fn has_vars(&self) -> bool {
        self.ret.has_vars()
            || self.params.iter().any(|p| p.ty.has_vars())
            || self.keywords.iter().any(|k| k.ty.has_vars())
            || self
                .block
                .as_ref()
                .is_some_and(|b| b.ret.has_vars() || b.params.iter().any(Ty::has_vars))
    }

    /// Number of positional arguments that must be supplied.
    pub fn min_args(&self) -> usize {
        self.params
            .iter()
            .filter(|p| !p.optional && !p.variadic)
            .count()
    }

    /// Largest accepted positional count; `None` when variadic.
    pub fn max_args(&self) -> Option<usize> {
        if self.params.iter().any(|p| p.variadic) {
            None
        } else {
            Some(self.params.len())
        }
    }

    pub fn accepts_count(&self, given: usize) -> bool {
        given >= self.min_args() && self.max_args().map_or(true, |max| given <= max)
    }

    /// Distribute `given` positional arguments over the parameters.
    ///
    /// Required parameters are filled first; leftover arguments go to
    /// optional parameters left to right, then to the variadic one.
    /// Returns `None` when the count is not accepted.
    pub fn arrange(&self, given: usize) -> Option<Vec<Slot>> {
        if !self.accepts_count(given) {
            return None;
        }
        let mut spare = given - self.min_args();
        let mut next = 0;
        let mut slots = Vec::with_capacity(self.params.len());
        for p in &self.params {
            if p.variadic {
                slots.push(Slot::Rest(next..next + spare));
                next += spare;
                spare = 0;
            } else if p.optional {
                if spare > 0 {
                    slots.push(Slot::Arg(next));
                    next += 1;
                    spare -= 1;
                } else {
                    slots.push(Slot::Default);
                }
            } else {
                slots.push(Slot::Arg(next));
                next += 1;
            }
        }
        Some(slots)
    }

    pub fn keyword_param(&self, name: Name) -> Option<&KeywordParam> {
        self.keywords.iter().find(|k| k.name == name)
    }

    /// Replace bound variables throughout the signature.
    ///
    /// Variables that received a binding are dropped from `free_vars`.
    #[must_use]
    pub fn substitute(&self, bindings: &Bindings) -> Callable {
        Callable {
            params: self
                .params
                .iter()
                .map(|p| Param {
                    ty: p.ty.substitute(bindings),
                    ..p.clone()
                })
                .collect(),
            keywords: self
                .keywords
                .iter()
                .map(|k| KeywordParam {
                    ty: k.ty.substitute(bindings),
                    ..k.clone()
                })
                .collect(),
            block: self.block.as_ref().map(|b| BlockSig {
                params: b.params.iter().map(|t| t.substitute(bindings)).collect(),
                ret: b.ret.substitute(bindings),
                required: b.required,
            }),
            ret: self.ret.substitute(bindings),
            free_vars: self
                .free_vars
                .iter()
                .copied()
                .filter(|v| !bindings.is_bound(*v))
                .collect(),
        }
    }
}

/// The block supplied at a call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockArg {
    /// A literal `{ |a, b| ... }` block; its return type is only known by
    /// evaluating it.
    Literal { arity: usize },
    /// A block with a declared signature.
    Typed(Callable),
}

/// The evaluated arguments of one call-site occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Call {
    pub positional: Vec<Value>,
    /// Keyword arguments in source order.
    pub keywords: Vec<(Name, Value)>,
    pub block: Option<BlockArg>,
}

impl Call {
    pub fn positional(args: impl IntoIterator<Item = Value>) -> Self {
        Call {
            positional: args.into_iter().collect(),
            ..Call::default()
        }
    }

    #[must_use]
    pub fn keyword(mut self, name: Name, value: Value) -> Self {
        self.keywords.push((name, value));
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: BlockArg) -> Self {
        self.block = Some(block);
        self
    }

    pub fn keyword_value(&self, name: Name) -> Option<&Value> {
        self.keywords.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// True if any argument is `Broken`.
    pub fn has_broken(&self) -> bool {
        self.positional.iter().any(Value::is_broken)
            || self.keywords.iter().any(|(_, v)| v.is_broken())
    }
}
