//! Programmatic tree construction.
//!
//! [`TreeBuilder`] is the surface a parser collaborator (or a test) uses to
//! emit nodes with the operand shapes documented on [`NodeKind`]. It interns
//! identifiers on the fly and stamps every node with the current line.

use crate::{Literal, Name, NodeArena, NodeId, NodeKind, Operand, StringInterner};

#[inline]
fn opt(node: Option<NodeId>) -> Operand {
    node.map_or(Operand::Absent, Operand::Node)
}

fn nodes(ids: &[NodeId]) -> impl Iterator<Item = Operand> + '_ {
    ids.iter().copied().map(Operand::Node)
}

/// Builder that allocates nodes into an arena.
pub struct TreeBuilder<'a> {
    arena: &'a mut NodeArena,
    interner: &'a StringInterner,
    line: u32,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(arena: &'a mut NodeArena, interner: &'a StringInterner) -> Self {
        TreeBuilder {
            arena,
            interner,
            line: 1,
        }
    }

    /// Set the line stamped on subsequently built nodes.
    pub fn at(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn alloc(&mut self, kind: NodeKind, operands: &[Operand]) -> NodeId {
        self.arena.alloc(kind, operands, self.line)
    }

    fn named(&mut self, kind: NodeKind, name: &str) -> NodeId {
        let name = self.name(name);
        self.alloc(kind, &[Operand::Name(name)])
    }

    fn named_with(&mut self, kind: NodeKind, name: &str, child: NodeId) -> NodeId {
        let name = self.name(name);
        self.alloc(kind, &[Operand::Name(name), Operand::Node(child)])
    }

    // ===== Literals =====

    pub fn int(&mut self, value: i64) -> NodeId {
        self.alloc(NodeKind::Lit, &[Operand::Lit(Literal::Int(value))])
    }

    pub fn float(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::Lit, &[Operand::Lit(Literal::float(value))])
    }

    pub fn str(&mut self, value: &str) -> NodeId {
        let name = self.name(value);
        self.alloc(NodeKind::Lit, &[Operand::Lit(Literal::Str(name))])
    }

    pub fn sym(&mut self, value: &str) -> NodeId {
        let name = self.name(value);
        self.alloc(NodeKind::Lit, &[Operand::Lit(Literal::Sym(name))])
    }

    pub fn nil(&mut self) -> NodeId {
        self.alloc(NodeKind::Nil, &[])
    }

    pub fn true_(&mut self) -> NodeId {
        self.alloc(NodeKind::True, &[])
    }

    pub fn false_(&mut self) -> NodeId {
        self.alloc(NodeKind::False, &[])
    }

    pub fn self_ref(&mut self) -> NodeId {
        self.alloc(NodeKind::SelfRef, &[])
    }

    // ===== Variables and constants =====

    pub fn lvar(&mut self, name: &str) -> NodeId {
        self.named(NodeKind::Lvar, name)
    }

    pub fn lasgn(&mut self, name: &str, value: NodeId) -> NodeId {
        self.named_with(NodeKind::Lasgn, name, value)
    }

    pub fn constant(&mut self, name: &str) -> NodeId {
        self.named(NodeKind::Const, name)
    }

    pub fn cdecl(&mut self, name: &str, value: NodeId) -> NodeId {
        self.named_with(NodeKind::Cdecl, name, value)
    }

    // ===== Arrays =====

    /// Array literal; elements may be [`TreeBuilder::splat`] nodes.
    pub fn array(&mut self, elements: &[NodeId]) -> NodeId {
        let ops: Vec<_> = nodes(elements).collect();
        self.alloc(NodeKind::Array, &ops)
    }

    /// `*value` inside an array literal.
    pub fn splat(&mut self, value: NodeId) -> NodeId {
        self.alloc(NodeKind::Splat, &[Operand::Node(value)])
    }

    // ===== Calls =====

    /// Method call; `recv` is `None` for an implicit-self call.
    pub fn call(&mut self, recv: Option<NodeId>, method: &str, args: &[NodeId]) -> NodeId {
        let method = self.name(method);
        let mut ops = Vec::with_capacity(args.len() + 2);
        ops.push(opt(recv));
        ops.push(Operand::Name(method));
        ops.extend(nodes(args));
        self.alloc(NodeKind::Call, &ops)
    }

    /// Call with an explicit receiver.
    pub fn send(&mut self, recv: NodeId, method: &str, args: &[NodeId]) -> NodeId {
        self.call(Some(recv), method, args)
    }

    /// Call on implicit self.
    pub fn fcall(&mut self, method: &str, args: &[NodeId]) -> NodeId {
        self.call(None, method, args)
    }

    /// Keyword argument `key: value`.
    pub fn pair(&mut self, key: &str, value: NodeId) -> NodeId {
        self.named_with(NodeKind::Pair, key, value)
    }

    /// Attach a literal block to a call.
    pub fn iter(&mut self, call: NodeId, params: Option<NodeId>, body: Option<NodeId>) -> NodeId {
        self.alloc(
            NodeKind::Iter,
            &[Operand::Node(call), opt(params), opt(body)],
        )
    }

    pub fn yield_(&mut self, args: &[NodeId]) -> NodeId {
        let ops: Vec<_> = nodes(args).collect();
        self.alloc(NodeKind::Yield, &ops)
    }

    // ===== Parameters =====

    pub fn params(&mut self, params: &[NodeId]) -> NodeId {
        let ops: Vec<_> = nodes(params).collect();
        self.alloc(NodeKind::Params, &ops)
    }

    pub fn param(&mut self, name: &str) -> NodeId {
        self.named(NodeKind::Param, name)
    }

    pub fn opt_param(&mut self, name: &str, default: NodeId) -> NodeId {
        self.named_with(NodeKind::OptParam, name, default)
    }

    pub fn rest_param(&mut self, name: &str) -> NodeId {
        self.named(NodeKind::RestParam, name)
    }

    pub fn kw_param(&mut self, name: &str) -> NodeId {
        self.named(NodeKind::KwParam, name)
    }

    pub fn opt_kw_param(&mut self, name: &str, default: NodeId) -> NodeId {
        self.named_with(NodeKind::OptKwParam, name, default)
    }

    // ===== Control flow =====

    pub fn if_(&mut self, cond: NodeId, then: Option<NodeId>, els: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::If, &[Operand::Node(cond), opt(then), opt(els)])
    }

    pub fn and(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.alloc(NodeKind::And, &[Operand::Node(lhs), Operand::Node(rhs)])
    }

    pub fn or(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.alloc(NodeKind::Or, &[Operand::Node(lhs), Operand::Node(rhs)])
    }

    pub fn case(&mut self, subject: NodeId, whens: &[NodeId], els: Option<NodeId>) -> NodeId {
        let mut ops = Vec::with_capacity(whens.len() + 2);
        ops.push(Operand::Node(subject));
        ops.extend(nodes(whens));
        ops.push(opt(els));
        self.alloc(NodeKind::Case, &ops)
    }

    pub fn when(&mut self, tests: &[NodeId], body: Option<NodeId>) -> NodeId {
        let mut ops: Vec<_> = nodes(tests).collect();
        ops.push(opt(body));
        self.alloc(NodeKind::When, &ops)
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::Return, &[opt(value)])
    }

    pub fn block(&mut self, exprs: &[NodeId]) -> NodeId {
        let ops: Vec<_> = nodes(exprs).collect();
        self.alloc(NodeKind::Block, &ops)
    }

    // ===== Definitions =====

    pub fn defn(&mut self, name: &str, params: NodeId, body: Option<NodeId>) -> NodeId {
        let name = self.name(name);
        self.alloc(
            NodeKind::Defn,
            &[Operand::Name(name), Operand::Node(params), opt(body)],
        )
    }

    pub fn defs(
        &mut self,
        recv: NodeId,
        name: &str,
        params: NodeId,
        body: Option<NodeId>,
    ) -> NodeId {
        let name = self.name(name);
        self.alloc(
            NodeKind::Defs,
            &[
                Operand::Node(recv),
                Operand::Name(name),
                Operand::Node(params),
                opt(body),
            ],
        )
    }

    pub fn class(&mut self, name: &str, superclass: Option<NodeId>, body: Option<NodeId>) -> NodeId {
        let name = self.name(name);
        self.alloc(
            NodeKind::Class,
            &[Operand::Name(name), opt(superclass), opt(body)],
        )
    }
}
