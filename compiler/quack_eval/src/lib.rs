//! Quack Eval - flow-sensitive abstract evaluation.
//!
//! Walks a unit's expression tree, tracking for every expression the set of
//! values it could produce, and records an issue wherever a call cannot be
//! satisfied.
//!
//! # Components
//!
//! - [`Evaluator`]: the tree walk, conditionals, calls, blocks, definitions
//! - [`ScopeStack`] / [`Scope`]: locals, overrides, return state, node memo
//! - [`SharedRegistry`]: lock-protected class registry shared with the driver
//! - [`EvalConfig`]: evaluation limits

mod config;
mod evaluator;
mod scope;
mod shared;

pub use config::EvalConfig;
pub use evaluator::Evaluator;
pub use scope::{Binding, BindingId, BlockRef, ReturnState, Scope, ScopeKind, ScopeStack};
pub use shared::SharedRegistry;
