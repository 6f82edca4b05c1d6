//! Condition analysis for branch scopes.
//!
//! Recognised conditions, where `x` is a local variable:
//!
//! | Condition              | True side                 | False side           |
//! |------------------------|---------------------------|----------------------|
//! | `x`, `x = e`           | truthy part of `x`        | falsey part of `x`   |
//! | `x == v`, `v == x`     | members equal to `v`      | members not `v`      |
//! | `x != v`               | as `x == v`, flipped      |                      |
//! | `x.nil?`               | `nil`                     | non-nil part         |
//! | `!c`                   | false side of `c`         | true side of `c`     |
//! | `Class === x`          | members of `Class`        | other members        |
//! | `v === x`              | as `x == v`               |                      |
//! | `a && b`               | both true sides           | nothing              |
//! | `a \|\| b`             | nothing                   | both false sides     |
//!
//! A narrowed local gets an override in the branch scope mapping its
//! binding to the narrowed value. When a narrowing leaves nothing, the branch
//! cannot be taken.

use quack_ir::{Name, NodeId, NodeKind};
use quack_types::narrow::{narrow_equal, narrow_nil, narrow_truthiness};
use quack_types::{Instance, Value};

use super::Evaluator;

impl Evaluator<'_> {
    /// Specialize the current (branch) scope for `cond` having been
    /// `polarity`. Returns `false` when that is impossible.
    pub(super) fn narrow(&mut self, cond: NodeId, polarity: bool) -> bool {
        let arena = self.arena;
        match arena.kind(cond) {
            NodeKind::Lvar | NodeKind::Lasgn => {
                let name = arena.name_at(cond, 0);
                self.narrow_local(name, |v| narrow_truthiness(v, polarity))
            }
            NodeKind::And if polarity => self.narrow_both(cond, true),
            NodeKind::Or if !polarity => self.narrow_both(cond, false),
            NodeKind::Call => self.narrow_call(cond, polarity),
            _ => true,
        }
    }

    fn narrow_both(&mut self, cond: NodeId, polarity: bool) -> bool {
        let arena = self.arena;
        match (arena.child(cond, 0), arena.child(cond, 1)) {
            (Some(a), Some(b)) => self.narrow(a, polarity) && self.narrow(b, polarity),
            _ => true,
        }
    }

    fn narrow_call(&mut self, cond: NodeId, polarity: bool) -> bool {
        let arena = self.arena;
        let Some(receiver) = arena.child(cond, 0) else {
            return self.local_name(cond).map_or(true, |name| {
                self.narrow_local(name, |v| narrow_truthiness(v, polarity))
            });
        };
        let args: Vec<NodeId> = arena.children_from(cond, 2).collect();
        match (arena.name_at(cond, 1), args.as_slice()) {
            (Name::NOT, []) => self.narrow(receiver, !polarity),
            (Name::IS_NIL, []) => match self.local_name(receiver) {
                Some(name) => self.narrow_local(name, |v| narrow_nil(v, polarity)),
                None => true,
            },
            (Name::EQ, [arg]) => self.narrow_equality(receiver, *arg, polarity),
            (Name::NOT_EQ, [arg]) => self.narrow_equality(receiver, *arg, !polarity),
            (Name::CASE_EQ, [arg]) => self.narrow_case_eq(receiver, *arg, polarity),
            _ => true,
        }
    }

    /// `lhs == rhs`: narrow whichever side is a local by the other side's
    /// value.
    fn narrow_equality(&mut self, lhs: NodeId, rhs: NodeId, polarity: bool) -> bool {
        let mut feasible = true;
        for (subject, other) in [(lhs, rhs), (rhs, lhs)] {
            let Some(name) = self.local_name(subject) else {
                continue;
            };
            let Some(target) = self.known_value(other) else {
                continue;
            };
            feasible &= self.narrow_local(name, |v| narrow_equal(v, &target, polarity));
        }
        feasible
    }

    /// `pattern === subject`: a class pattern narrows by class, anything
    /// else by equality.
    fn narrow_case_eq(&mut self, pattern: NodeId, subject: NodeId, polarity: bool) -> bool {
        let Some(name) = self.local_name(subject) else {
            return true;
        };
        let class = match self.known_value(pattern) {
            Some(Value::Instance(i)) => i.referenced_class(),
            _ => None,
        };
        let Some(class) = class else {
            return self.narrow_equality(subject, pattern, polarity);
        };
        let shared = self.registry;
        let registry = shared.read();
        self.narrow_local(name, |v| {
            v.retain(|m: &Instance| registry.is_subclass_of(m.class, class) == polarity)
        })
    }

    /// Name of the local `node` reads, if it reads one.
    fn local_name(&self, node: NodeId) -> Option<Name> {
        let arena = self.arena;
        let name = match arena.kind(node) {
            NodeKind::Lvar => arena.name_at(node, 0),
            // A bare identifier the parser emitted as a call.
            NodeKind::Call if arena.child(node, 0).is_none() && arena.operands(node).len() == 2 => {
                arena.name_at(node, 1)
            }
            _ => return None,
        };
        self.scopes.lookup_local(name).map(|_| name)
    }

    /// The value a condition operand had, without evaluating anything that
    /// could report.
    fn known_value(&mut self, node: NodeId) -> Option<Value> {
        if let Some(value) = self.memo(node) {
            return Some(value);
        }
        match self.arena.kind(node) {
            NodeKind::Lit | NodeKind::Nil | NodeKind::True | NodeKind::False => {
                Some(self.eval(node))
            }
            _ => self.local_name(node).and_then(|name| self.scopes.read_local(name)),
        }
    }

    /// Narrow local `name` with `f`, recording an override of its binding
    /// in the current scope. Returns `false` if nothing is left.
    fn narrow_local(&mut self, name: Name, f: impl FnOnce(&Value) -> Value) -> bool {
        let Some(binding) = self.scopes.lookup_local(name) else {
            return true;
        };
        let id = binding.id;
        let current = self.scopes.resolve(binding);
        let narrowed = f(&current);
        if narrowed.is_impossible() {
            return false;
        }
        if narrowed != current {
            self.scopes.top_mut().add_override(id, narrowed);
        }
        true
    }
}
