//! Tagged expression tree nodes.
//!
//! The tree is flat: nodes live in a [`NodeArena`](crate::NodeArena) and refer
//! to their children through [`NodeId`] operands. Each node carries a kind
//! tag, an ordered operand list, and the 1-based source line it came from.
//!
//! The parser collaborator is trusted to produce well-formed operand lists;
//! the shapes per kind are documented on [`NodeKind`].

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Name;

/// Index into the node arena.
///
/// Assigned once when the node is allocated and stable for the arena's
/// lifetime, so it doubles as the evaluation-cache key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Invalid node ID (sentinel value).
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Hash for NodeId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "NodeId({})", self.0)
        } else {
            write!(f, "NodeId::INVALID")
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A literal operand.
///
/// Floats are stored as their bit pattern so literals stay `Eq + Hash`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Literal {
    Int(i64),
    Float(u64),
    Str(Name),
    Sym(Name),
}

impl Literal {
    /// Build a float literal from an `f64`.
    #[inline]
    pub fn float(value: f64) -> Self {
        Literal::Float(value.to_bits())
    }
}

/// One operand of a node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operand {
    /// A child node.
    Node(NodeId),
    /// An identifier (method, variable, constant, or keyword name).
    Name(Name),
    /// A literal value.
    Lit(Literal),
    /// An omitted optional child (no receiver, no else branch, ...).
    Absent,
}

impl Operand {
    #[inline]
    pub fn node(self) -> Option<NodeId> {
        match self {
            Operand::Node(id) => Some(id),
            _ => None,
        }
    }

    #[inline]
    pub fn name(self) -> Option<Name> {
        match self {
            Operand::Name(name) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub fn literal(self) -> Option<Literal> {
        match self {
            Operand::Lit(lit) => Some(lit),
            _ => None,
        }
    }
}

/// Node kind tag.
///
/// Operand shapes (`?` marks an operand that may be [`Operand::Absent`]):
///
/// | Kind         | Operands                                              |
/// |--------------|-------------------------------------------------------|
/// | `Lit`        | `[Lit]`                                               |
/// | `True`, `False`, `Nil`, `SelfRef` | `[]`                             |
/// | `Lvar`       | `[Name]`                                              |
/// | `Lasgn`      | `[Name, Node]`                                        |
/// | `Const`      | `[Name]`                                              |
/// | `Cdecl`      | `[Name, Node]`                                        |
/// | `Call`       | `[Node? receiver, Name method, Node args...]`         |
/// | `Iter`       | `[Node call, Node? params, Node? body]`               |
/// | `Params`     | `[Node param...]`                                     |
/// | `Param`, `RestParam`, `KwParam` | `[Name]`                           |
/// | `OptParam`, `OptKwParam` | `[Name, Node default]`                    |
/// | `Pair`       | `[Name keyword, Node value]`                          |
/// | `Yield`      | `[Node args...]`                                      |
/// | `If`         | `[Node cond, Node? then, Node? else]`                 |
/// | `And`, `Or`  | `[Node, Node]`                                        |
/// | `Case`       | `[Node subject, Node when..., Node? else]`            |
/// | `When`       | `[Node test..., Node? body]`                          |
/// | `Return`     | `[Node? value]`                                       |
/// | `Block`      | `[Node...]`                                           |
/// | `Array`      | `[Node element...]`                                   |
/// | `Splat`      | `[Node]`                                              |
/// | `Defn`       | `[Name, Node params, Node? body]`                     |
/// | `Defs`       | `[Node receiver, Name, Node params, Node? body]`      |
/// | `Class`      | `[Name, Node? superclass, Node? body]`                |
///
/// `Pair` nodes only appear as trailing `Call`/`Yield` arguments, where they
/// form the keyword-argument map. `Splat` nodes only appear as `Array`
/// elements.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Lit,
    True,
    False,
    Nil,
    SelfRef,
    Lvar,
    Lasgn,
    Const,
    Cdecl,
    Call,
    Iter,
    Params,
    Param,
    OptParam,
    RestParam,
    KwParam,
    OptKwParam,
    Pair,
    Yield,
    If,
    And,
    Or,
    Case,
    When,
    Return,
    Block,
    Array,
    Splat,
    Defn,
    Defs,
    Class,
}

impl NodeKind {
    /// True for the parameter kinds that may appear inside `Params`.
    pub fn is_param(self) -> bool {
        matches!(
            self,
            NodeKind::Param
                | NodeKind::OptParam
                | NodeKind::RestParam
                | NodeKind::KwParam
                | NodeKind::OptKwParam
        )
    }
}

/// Range of operands in the arena's flat operand list.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct OperandRange {
    pub start: u32,
    pub len: u16,
}

impl OperandRange {
    pub const EMPTY: OperandRange = OperandRange { start: 0, len: 0 };

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A single tree node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Node {
    pub kind: NodeKind,
    pub operands: OperandRange,
    /// 1-based source line.
    pub line: u32,
}
