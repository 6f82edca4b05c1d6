//! Quack Types - values, signatures, and the class model.
//!
//! # Components
//!
//! - [`Value`]: abstract values (instances, unions, sentinels)
//! - [`Ty`] / [`Callable`]: signature types and method signatures
//! - [`ClassRegistry`]: classes, inheritance, method tables, constants
//! - [`ListPool`]: interned element and type-argument lists
//! - [`Matcher`]: the `<=` relation, call matching, overload selection
//! - [`Resolver`]: free-type-variable binding for generic signatures
//! - [`narrow`]: value-level narrowing used by branch specialization
//!
//! Everything here is independent of the expression tree walk; the
//! evaluator in `quack_eval` drives it.

mod callable;
mod error;
mod ids;
mod list;
mod matcher;
pub mod narrow;
mod registry;
mod resolver;
mod ty;
mod value;

pub use callable::{BlockArg, BlockSig, Call, Callable, KeywordParam, Param, SignatureError, Slot};
pub use error::RegistryError;
pub use ids::{ClassId, ListId, MethodId, TypeVar};
pub use list::ListPool;
pub use matcher::{ArgPosition, ArgTypeError, BlockProblem, CallMismatch, Matcher};
pub use registry::{
    ClassDef, ClassRegistry, FoldCx, FoldFn, MethodBody, MethodDef, MethodKind, MethodSpec,
};
pub use resolver::{Resolution, Resolver, YieldTyper};
pub use ty::{Bindings, DuckAccumulator, DuckType, Ty};
pub use value::{ConstValue, Instance, Truth, UnionValue, Value};
