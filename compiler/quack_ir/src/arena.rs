//! Flat storage for the expression tree.
//!
//! Nodes and their operands live in two contiguous vectors. A node refers to
//! its operands by range, and to its children by [`NodeId`], so the whole
//! tree is a pair of `Vec`s with no per-node allocation.

use crate::{Literal, Name, Node, NodeId, NodeKind, Operand, OperandRange};

/// Arena owning every node of one or more processed units.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    operands: Vec<Operand>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its stable id.
    ///
    /// # Panics
    /// Panics if the arena exceeds `u32::MAX` nodes or a single node has more
    /// than `u16::MAX` operands.
    pub fn alloc(&mut self, kind: NodeKind, operands: &[Operand], line: u32) -> NodeId {
        let range = self.push_operands(operands);
        let index = u32::try_from(self.nodes.len())
            .unwrap_or_else(|_| panic!("node arena exceeded {} nodes", u32::MAX));
        self.nodes.push(Node {
            kind,
            operands: range,
            line,
        });
        NodeId::new(index)
    }

    /// Overwrite a node in place, keeping its id and line.
    ///
    /// Used by lowering passes so that everything pointing at the old node
    /// now sees the rewritten form.
    pub fn replace(&mut self, id: NodeId, kind: NodeKind, operands: &[Operand]) {
        let range = self.push_operands(operands);
        let node = &mut self.nodes[id.index()];
        node.kind = kind;
        node.operands = range;
    }

    fn push_operands(&mut self, operands: &[Operand]) -> OperandRange {
        if operands.is_empty() {
            return OperandRange::EMPTY;
        }
        let start = u32::try_from(self.operands.len())
            .unwrap_or_else(|_| panic!("operand list exceeded {} entries", u32::MAX));
        let len = u16::try_from(operands.len())
            .unwrap_or_else(|_| panic!("node has more than {} operands", u16::MAX));
        self.operands.extend_from_slice(operands);
        OperandRange { start, len }
    }

    /// Get a node by id.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind
    }

    #[inline]
    pub fn line(&self, id: NodeId) -> u32 {
        self.get(id).line
    }

    /// Get the operand list of a node.
    #[inline]
    pub fn operands(&self, id: NodeId) -> &[Operand] {
        let range = self.get(id).operands;
        let start = range.start as usize;
        &self.operands[start..start + range.len()]
    }

    /// Operand `i` of a node, or `Absent` when out of range.
    #[inline]
    pub fn operand(&self, id: NodeId, i: usize) -> Operand {
        self.operands(id).get(i).copied().unwrap_or(Operand::Absent)
    }

    /// Operand `i` as a child node, if present.
    #[inline]
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.operand(id, i).node()
    }

    /// Operand `i` as a name; `Name::EMPTY` when it is not one.
    #[inline]
    pub fn name_at(&self, id: NodeId, i: usize) -> Name {
        self.operand(id, i).name().unwrap_or(Name::EMPTY)
    }

    /// Operand `i` as a literal, if present.
    #[inline]
    pub fn literal_at(&self, id: NodeId, i: usize) -> Option<Literal> {
        self.operand(id, i).literal()
    }

    /// Child nodes from operand `from` onwards, skipping absent slots.
    pub fn children_from(&self, id: NodeId, from: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.operands(id)
            .iter()
            .skip(from)
            .filter_map(|op| op.node())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
