//! Conditionals: fork, evaluate, merge.
//!
//! For each polarity the condition's value allows, a branch scope is pushed,
//! narrowed from the condition, and the branch body evaluated in it (the
//! true side first). The finished branch scopes are then merged into the
//! current scope:
//!
//! - **Locals** assigned in any branch that did not return are merged: per
//!   branch, the assigned value or else the value from before the
//!   conditional (`nil` for a name new in the branch), unioned.
//! - **Returns**: if every branch returned, the current scope returns the
//!   union of their values. If only some did, it partially returns them and
//!   the overrides of the branches that fall through move into the current
//!   scope, so code after the conditional sees their narrowing.
//! - The conditional's **value** is the union of the last values of the
//!   branches that fall through.

use quack_ir::{Name, NodeId};
use quack_types::Value;

use super::Evaluator;
use crate::scope::{BindingId, Scope, ScopeKind};

/// A branch that was taken, with the value its body produced.
struct BranchOutcome {
    scope: Scope,
    value: Value,
}

impl BranchOutcome {
    fn falls_through(&self) -> bool {
        !self.scope.return_state().is_returned()
    }
}

impl Evaluator<'_> {
    #[tracing::instrument(level = "trace", skip_all, fields(cond = cond.raw()))]
    pub(super) fn eval_if(
        &mut self,
        cond: NodeId,
        then: Option<NodeId>,
        els: Option<NodeId>,
    ) -> Value {
        let condition = self.eval(cond);
        let mut outcomes = Vec::with_capacity(2);
        for (polarity, body) in [(true, then), (false, els)] {
            let feasible = if polarity {
                condition.maybe_truthy()
            } else {
                condition.maybe_falsey()
            };
            if !feasible {
                continue;
            }
            self.scopes.push(ScopeKind::Branch);
            if !self.narrow(cond, polarity) {
                tracing::trace!(polarity, "branch unreachable after narrowing");
                self.scopes.pop();
                continue;
            }
            let value = self.eval_opt(body);
            if let Some(scope) = self.scopes.pop() {
                outcomes.push(BranchOutcome { scope, value });
            }
        }
        self.merge_branches(&outcomes)
    }

    fn merge_branches(&mut self, outcomes: &[BranchOutcome]) -> Value {
        if outcomes.is_empty() {
            return Value::Impossible;
        }
        let live: Vec<&BranchOutcome> = outcomes.iter().filter(|o| o.falls_through()).collect();
        self.merge_locals(&live);

        let returned = Value::union_all(
            outcomes
                .iter()
                .filter_map(|o| o.scope.return_state().value()),
        );
        if live.is_empty() {
            self.scopes.top_mut().record_return(returned);
            return Value::Impossible;
        }
        if !returned.is_impossible() {
            self.fold_overrides(&live);
            self.scopes.top_mut().record_partial_return(returned);
        }
        Value::union_all(live.iter().map(|o| &o.value))
    }

    fn merge_locals(&mut self, live: &[&BranchOutcome]) {
        let mut names: Vec<Name> = Vec::new();
        for outcome in live {
            for (name, _) in outcome.scope.locals() {
                if !names.contains(name) {
                    names.push(*name);
                }
            }
        }
        for name in names {
            let before = self.scopes.read_local(name).unwrap_or_else(Value::nil);
            let merged = Value::union_all(
                live.iter()
                    .map(|o| o.scope.local(name).map_or(&before, |b| &b.value)),
            );
            self.scopes.assign(name, merged);
        }
    }

    /// Move the overrides of fall-through branches into the current scope.
    /// A branch without an override for a key contributes the key's current
    /// resolution.
    fn fold_overrides(&mut self, live: &[&BranchOutcome]) {
        let mut keys: Vec<BindingId> = Vec::new();
        for outcome in live {
            for (key, _) in outcome.scope.overrides() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        for key in keys {
            let Some(base) = self.scopes.resolve_id(key) else {
                continue;
            };
            let merged = Value::union_all(
                live.iter()
                    .map(|o| o.scope.override_for(key).unwrap_or(&base)),
            );
            self.scopes.top_mut().add_override(key, merged);
        }
    }
}
