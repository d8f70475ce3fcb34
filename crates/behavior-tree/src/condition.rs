//! Condition nodes and the reactive evaluation policy.
//!
//! # Evaluation Policy
//!
//! - The pre-start gate ([`gate`]) ticks every attached condition, whatever
//!   its priority, and records the result.
//! - Reactive checks reuse the recorded status while the blackboard is clean
//!   and only re-tick a condition once something was written this frame (or
//!   when it was never evaluated).
//! - Lower-priority guards are only re-ticked on frames with a write. A guard
//!   left unevaluated by a short-circuited gate waits for one too.
//! - Conditions with [`PriorityType::None`] are never re-ticked reactively.

use tracing::debug;

use crate::behavior::{Condition, TickContext};
use crate::node::Node;
use crate::{NodeId, NodeStatus, Params, PriorityType};

/// A condition attached to a composite or action.
pub struct ConditionNode {
    id: NodeId,
    name: String,
    class: Option<String>,
    parent: Option<NodeId>,
    priority: PriorityType,
    status: NodeStatus,
    last_status: Option<NodeStatus>,
    condition: Box<dyn Condition>,
}

impl ConditionNode {
    pub(crate) fn new(
        id: NodeId,
        name: impl Into<String>,
        priority: PriorityType,
        condition: Box<dyn Condition>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            class: None,
            parent: None,
            priority,
            status: NodeStatus::Failure,
            last_status: None,
            condition,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    pub(crate) fn set_class(&mut self, class: Option<String>) {
        self.class = class;
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry class, when built from a registry.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Id of the guarded node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// When this condition may interrupt running work.
    pub fn priority(&self) -> PriorityType {
        self.priority
    }

    /// Result of the most recent tick.
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Most recent recorded evaluation; `None` until first evaluated.
    pub fn last_status(&self) -> Option<NodeStatus> {
        self.last_status
    }

    pub fn params(&self) -> Params {
        self.condition.params()
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        self.condition.on_start(ctx);
        let status = NodeStatus::from_bool(self.condition.check(ctx));
        self.condition.on_finished(ctx);
        self.status = status;
        status
    }

    /// Fresh evaluation, recorded as the last status.
    fn evaluate(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        let status = self.tick(ctx);
        self.last_status = Some(status);
        status
    }

    fn is_stale(&self, ctx: &TickContext<'_>) -> bool {
        self.last_status.is_none() || ctx.is_values_changed()
    }
}

impl std::fmt::Debug for ConditionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("last_status", &self.last_status)
            .finish()
    }
}

/// Pre-start gate: every condition must succeed, evaluated in order.
pub(crate) fn gate(conditions: &mut [ConditionNode], ctx: &mut TickContext<'_>) -> bool {
    conditions
        .iter_mut()
        .all(|condition| condition.evaluate(ctx).is_success())
}

/// Reactive check of a running node's own `Self`/`Both` conditions.
///
/// Returns `false` when the guarded node must be aborted.
pub(crate) fn self_mode_allows(
    conditions: &mut [ConditionNode],
    ctx: &mut TickContext<'_>,
) -> bool {
    for condition in conditions.iter_mut() {
        if !condition.priority.aborts_self() {
            continue;
        }
        let status = match (condition.is_stale(ctx), condition.last_status) {
            (false, Some(cached)) => cached,
            _ => condition.evaluate(ctx),
        };
        if status.is_failure() {
            debug!(
                "condition {} `{}` failed in self mode",
                condition.id, condition.name
            );
            return false;
        }
    }
    true
}

/// Looks for a higher-priority branch (index below `current`) whose
/// `LowerPriority`/`Both` condition has just turned successful.
///
/// Only a fresh evaluation that flips the recorded status to `Success` counts;
/// a cached success preempts nothing. Nothing is re-ticked on a clean frame.
pub(crate) fn lower_priority_preemption(
    children: &mut [Node],
    current: usize,
    ctx: &mut TickContext<'_>,
) -> Option<usize> {
    if !ctx.is_values_changed() {
        return None;
    }
    let end = current.min(children.len());
    for (index, child) in children[..end].iter_mut().enumerate() {
        for condition in child.guard_conditions_mut() {
            if !condition.priority.aborts_lower_priority() {
                continue;
            }
            let previous = condition.last_status;
            let status = condition.evaluate(ctx);
            if status.is_success() && previous != Some(NodeStatus::Success) {
                debug!(
                    "condition {} `{}` preempts lower-priority branch {}",
                    condition.id, condition.name, current
                );
                return Some(index);
            }
        }
    }
    None
}

// ============================================================================
// Built-in conditions
// ============================================================================

/// Succeeds when a bool blackboard key holds the expected value.
#[derive(Debug, Clone)]
pub struct BlackboardFlag {
    key: String,
    expected: bool,
}

impl BlackboardFlag {
    pub fn new(key: impl Into<String>, expected: bool) -> Self {
        Self {
            key: key.into(),
            expected,
        }
    }

    /// Reads `Key` and `Expected` (default `true`).
    pub fn from_params(params: &Params) -> Self {
        Self::new(params.blackboard_key("Key"), params.bool_or("Expected", true))
    }
}

impl Condition for BlackboardFlag {
    fn check(&mut self, ctx: &mut TickContext<'_>) -> bool {
        ctx.blackboard().bool_value(&self.key) == self.expected
    }

    fn params(&self) -> Params {
        Params::new()
            .with_string("Key", self.key.clone())
            .with_bool("Expected", self.expected)
    }
}

/// Succeeds when a float blackboard key is at or below a threshold.
///
/// Typical use is a range check against a distance key.
#[derive(Debug, Clone)]
pub struct FloatAtMost {
    key: String,
    threshold: f32,
}

impl FloatAtMost {
    pub fn new(key: impl Into<String>, threshold: f32) -> Self {
        Self {
            key: key.into(),
            threshold,
        }
    }

    /// Reads `Key` and `Threshold` (default `100.0`).
    pub fn from_params(params: &Params) -> Self {
        Self::new(
            params.blackboard_key("Key"),
            params.float_or("Threshold", 100.0),
        )
    }
}

impl Condition for FloatAtMost {
    fn check(&mut self, ctx: &mut TickContext<'_>) -> bool {
        ctx.blackboard().float_value(&self.key) <= self.threshold
    }

    fn params(&self) -> Params {
        Params::new()
            .with_string("Key", self.key.clone())
            .with_float("Threshold", self.threshold)
    }
}
