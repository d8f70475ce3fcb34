//! Capability traits implemented by concrete node kinds.
//!
//! The scheduler owns control flow; user code plugs in through three traits:
//! [`Action`] (leaf work), [`Condition`] (boolean predicate) and
//! [`Decorator`] (single-child gate and result transform). Every hook receives
//! a [`TickContext`] giving access to the tree's blackboard and owner.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::{Blackboard, NodeId, NodeStatus, Params};

pub(crate) type OwnerRef = Weak<dyn Any + Send + Sync>;

/// Per-tick view of the tree handed to node hooks.
pub struct TickContext<'a> {
    blackboard: &'a mut Blackboard,
    active: &'a mut Vec<NodeId>,
    owner: Option<&'a OwnerRef>,
    tree_name: &'a str,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(
        blackboard: &'a mut Blackboard,
        active: &'a mut Vec<NodeId>,
        owner: Option<&'a OwnerRef>,
        tree_name: &'a str,
    ) -> Self {
        Self {
            blackboard,
            active,
            owner,
            tree_name,
        }
    }

    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        self.blackboard
    }

    /// The domain object driving this tree, if one was set and is still alive
    /// and has type `T`.
    pub fn owner<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.owner?.upgrade()?.downcast::<T>().ok()
    }

    pub fn tree_name(&self) -> &str {
        self.tree_name
    }

    pub(crate) fn is_values_changed(&self) -> bool {
        self.blackboard.is_values_changed()
    }

    pub(crate) fn activate(&mut self, id: NodeId) {
        self.active.push(id);
    }

    pub(crate) fn deactivate(&mut self, id: NodeId) {
        self.active.retain(|active| *active != id);
    }
}

/// Leaf behavior performing domain work.
///
/// `update` is called on every tick of an activation episode. Returning
/// `Running` keeps the episode open; every episode ends in exactly one call to
/// either `on_finished` or `on_abort`.
pub trait Action: Send {
    fn on_start(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Performs one step of work. The default succeeds immediately.
    fn update(&mut self, _ctx: &mut TickContext<'_>) -> NodeStatus {
        NodeStatus::Success
    }

    fn on_finished(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Called instead of `on_finished` when a running action is interrupted.
    /// Release anything acquired in `on_start` here.
    fn on_abort(&mut self, _ctx: &mut TickContext<'_>) {}

    fn params(&self) -> Params {
        Params::new()
    }
}

/// Boolean predicate attached to a composite or action.
///
/// A condition never stays running: each evaluation is a complete
/// `on_start` / `check` / `on_finished` episode.
pub trait Condition: Send {
    fn on_start(&mut self, _ctx: &mut TickContext<'_>) {}

    fn check(&mut self, ctx: &mut TickContext<'_>) -> bool;

    fn on_finished(&mut self, _ctx: &mut TickContext<'_>) {}

    fn params(&self) -> Params {
        Params::new()
    }
}

/// Single-child modifier.
pub trait Decorator: Send {
    fn on_start(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Asked before the child starts a new episode. `false` fails the
    /// decorator without touching the child.
    fn can_execute(&mut self, _ctx: &mut TickContext<'_>) -> bool {
        true
    }

    /// Receives the child's terminal status and returns the status to report.
    fn on_finished_result(&mut self, status: NodeStatus, _ctx: &mut TickContext<'_>) -> NodeStatus {
        status
    }

    fn on_finished(&mut self, _ctx: &mut TickContext<'_>) {}

    fn on_abort(&mut self, _ctx: &mut TickContext<'_>) {}

    fn params(&self) -> Params {
        Params::new()
    }
}

impl<A: Action + ?Sized> Action for Box<A> {
    #[inline]
    fn on_start(&mut self, ctx: &mut TickContext<'_>) {
        (**self).on_start(ctx)
    }

    #[inline]
    fn update(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        (**self).update(ctx)
    }

    #[inline]
    fn on_finished(&mut self, ctx: &mut TickContext<'_>) {
        (**self).on_finished(ctx)
    }

    #[inline]
    fn on_abort(&mut self, ctx: &mut TickContext<'_>) {
        (**self).on_abort(ctx)
    }

    fn params(&self) -> Params {
        (**self).params()
    }
}
