//! Lowering of `case` into conditional chains.
//!
//! ```text
//! case s
//! when a, b then x
//! when c then y
//! else z
//! end
//! ```
//!
//! becomes
//!
//! ```text
//! if (a === s) || (b === s) then x
//! elsif c === s then y
//! else z
//! end
//! ```
//!
//! The subject node is shared by every `===` call rather than copied, so the
//! evaluator's per-node cache evaluates it once. The rewritten `If` takes
//! over the `Case` node's id, keeping parents untouched.

use crate::{Name, NodeArena, NodeId, NodeKind, Operand};

/// Rewrite every `Case` node in the arena in place.
///
/// Nodes allocated by the rewrite are never `Case`, so running this twice is
/// a no-op.
pub fn desugar(arena: &mut NodeArena) {
    let count = arena.len();
    for index in 0..count {
        #[allow(clippy::cast_possible_truncation, reason = "arena ids fit in u32")]
        let id = NodeId::new(index as u32);
        if arena.kind(id) == NodeKind::Case {
            lower_case(arena, id);
        }
    }
}

fn lower_case(arena: &mut NodeArena, case: NodeId) {
    let line = arena.line(case);
    let ops = arena.operands(case).to_vec();
    let Some(subject) = ops.first().and_then(|op| op.node()) else {
        return;
    };
    let (whens, els) = match ops.split_last() {
        Some((last, rest)) if ops.len() >= 2 => (&rest[1..], *last),
        _ => (&[][..], Operand::Absent),
    };

    if whens.is_empty() {
        let tail = match els {
            Operand::Node(_) => els,
            _ => Operand::Node(arena.alloc(NodeKind::Nil, &[], line)),
        };
        arena.replace(case, NodeKind::Block, &[Operand::Node(subject), tail]);
        return;
    }

    // Build from the innermost `else` outwards; the outermost `If` reuses
    // the case node.
    let mut rest = els;
    for (i, when) in whens.iter().enumerate().rev() {
        let Some(when) = when.node() else { continue };
        let (cond, body) = lower_when(arena, when, subject);
        let if_ops = [Operand::Node(cond), body, rest];
        if i == 0 {
            arena.replace(case, NodeKind::If, &if_ops);
            return;
        }
        rest = Operand::Node(arena.alloc(NodeKind::If, &if_ops, arena.line(when)));
    }
}

/// Lower one `when` clause into its `Or`-chained condition and its body.
fn lower_when(arena: &mut NodeArena, when: NodeId, subject: NodeId) -> (NodeId, Operand) {
    let line = arena.line(when);
    let ops = arena.operands(when).to_vec();
    let (body, tests) = match ops.split_last() {
        Some((body, tests)) => (*body, tests),
        None => (Operand::Absent, &[][..]),
    };

    let mut cond: Option<NodeId> = None;
    for test in tests.iter().filter_map(|op| op.node()) {
        let check = arena.alloc(
            NodeKind::Call,
            &[
                Operand::Node(test),
                Operand::Name(Name::CASE_EQ),
                Operand::Node(subject),
            ],
            line,
        );
        cond = Some(match cond {
            None => check,
            Some(prev) => arena.alloc(
                NodeKind::Or,
                &[Operand::Node(prev), Operand::Node(check)],
                line,
            ),
        });
    }

    // A `when` with no tests never matches.
    let cond = cond.unwrap_or_else(|| arena.alloc(NodeKind::False, &[], line));
    (cond, body)
}
