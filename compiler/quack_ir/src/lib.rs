//! Quack IR - expression tree types for the Quack analyzer.
//!
//! This crate holds the input representation shared by every phase:
//! - `Name` / `StringInterner`: interned identifiers
//! - `NodeArena` / `Node` / `NodeKind`: the flat, tagged expression tree
//! - `TreeBuilder`: node construction for parsers and tests
//! - `desugar`: lowering of `case` into `if`/`||`/`===` chains
//!
//! # Design
//!
//! Nodes are addressed by `NodeId`, a `u32` index that stays stable for the
//! life of the arena. The evaluator keys its per-scope cache on these ids,
//! so node identity is id identity.

mod arena;
mod build;
mod desugar;
mod interner;
mod name;
mod node;

pub use arena::NodeArena;
pub use build::TreeBuilder;
pub use desugar::desugar;
pub use interner::{StringInterner, StringLookup};
pub use name::Name;
pub use node::{Literal, Node, NodeId, NodeKind, Operand, OperandRange};
