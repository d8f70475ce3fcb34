//! Runtime node and the tick protocol.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──gate ok──▶ Running ──Success/Failure──▶ on_finished ──▶ Idle
//!   │                  │
//!   └──gate refused    └──ancestor abort──▶ on_abort ──▶ Idle (Failure)
//! ```
//!
//! A node's start hook runs once per activation episode, and every episode
//! ends in exactly one finish or abort. A node that finished is eligible for a
//! fresh activation on its next tick.

use tracing::{debug, trace};

use crate::behavior::{Action, Decorator, TickContext};
use crate::composite::Composite;
use crate::condition::{self, ConditionNode};
use crate::{CompositeKind, NodeId, NodeStatus, NodeType, Params, decorator};

pub(crate) enum Kind {
    Root {
        child: Option<Box<Node>>,
    },
    Composite(Composite),
    Action(Box<dyn Action>),
    Decorator {
        decorator: Box<dyn Decorator>,
        child: Option<Box<Node>>,
    },
}

/// A node owned by a [`BehaviorTree`](crate::BehaviorTree).
///
/// Nodes own their children and attached conditions exclusively. The parent
/// link is a plain id, never an owning reference.
pub struct Node {
    id: NodeId,
    name: String,
    class: Option<String>,
    parent: Option<NodeId>,
    started: bool,
    status: NodeStatus,
    conditions: Vec<ConditionNode>,
    kind: Kind,
}

impl Node {
    fn with_kind(id: NodeId, name: impl Into<String>, kind: Kind) -> Self {
        Self {
            id,
            name: name.into(),
            class: None,
            parent: None,
            started: false,
            status: NodeStatus::Failure,
            conditions: Vec::new(),
            kind,
        }
    }

    pub(crate) fn root(id: NodeId) -> Self {
        Self::with_kind(id, "Root", Kind::Root { child: None })
    }

    pub(crate) fn composite(id: NodeId, name: impl Into<String>, kind: CompositeKind) -> Self {
        Self::with_kind(id, name, Kind::Composite(Composite::new(kind)))
    }

    pub(crate) fn action(id: NodeId, name: impl Into<String>, action: Box<dyn Action>) -> Self {
        Self::with_kind(id, name, Kind::Action(action))
    }

    pub(crate) fn decorator(
        id: NodeId,
        name: impl Into<String>,
        decorator: Box<dyn Decorator>,
    ) -> Self {
        Self::with_kind(
            id,
            name,
            Kind::Decorator {
                decorator,
                child: None,
            },
        )
    }

    pub(crate) fn set_class(&mut self, class: Option<String>) {
        self.class = class;
    }

    /// Attaches `child` and returns whatever it displaced.
    ///
    /// Roots and decorators hold a single child, so a second attach replaces
    /// (and returns) the first. Actions take no children and hand `child`
    /// straight back.
    pub(crate) fn attach_child(&mut self, mut child: Node) -> Option<Node> {
        child.parent = Some(self.id);
        match &mut self.kind {
            Kind::Composite(composite) => {
                composite.children.push(child);
                None
            }
            Kind::Root { child: slot } | Kind::Decorator { child: slot, .. } => {
                slot.replace(Box::new(child)).map(|old| *old)
            }
            Kind::Action(_) => Some(child),
        }
    }

    pub(crate) fn add_condition(&mut self, mut condition: ConditionNode) {
        condition.set_parent(self.id);
        self.conditions.push(condition);
    }

    // ===== read access =====

    /// Builder-assigned id, unique within the tree.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry class the node was built from, when it came from a registry.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Id of the owning node. `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Status reported by the most recent tick or abort.
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Whether an activation episode is open (start ran, no finish/abort yet).
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Coarse classification of the node's behavior.
    pub fn node_type(&self) -> NodeType {
        match self.kind {
            Kind::Root { .. } => NodeType::Root,
            Kind::Composite(_) => NodeType::Composite,
            Kind::Action(_) => NodeType::Action,
            Kind::Decorator { .. } => NodeType::Decorator,
        }
    }

    /// Sequence or selector, for composites only.
    pub fn composite_kind(&self) -> Option<CompositeKind> {
        match &self.kind {
            Kind::Composite(composite) => Some(composite.kind),
            _ => None,
        }
    }

    /// Child currently being resumed by a composite.
    pub fn current_child_index(&self) -> Option<usize> {
        match &self.kind {
            Kind::Composite(composite) => Some(composite.current),
            _ => None,
        }
    }

    /// Owned children in tick order. Roots and decorators hold at most one.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            Kind::Root { child } | Kind::Decorator { child, .. } => {
                child.as_deref().map(std::slice::from_ref).unwrap_or(&[])
            }
            Kind::Composite(composite) => &composite.children,
            Kind::Action(_) => &[],
        }
    }

    /// Attached conditions in evaluation order.
    pub fn conditions(&self) -> &[ConditionNode] {
        &self.conditions
    }

    /// Parameters reported by the wrapped action or decorator.
    pub fn params(&self) -> Params {
        match &self.kind {
            Kind::Action(action) => action.params(),
            Kind::Decorator { decorator, .. } => decorator.params(),
            Kind::Root { .. } | Kind::Composite(_) => Params::new(),
        }
    }

    /// Depth-first search of this subtree.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub(crate) fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children_mut()
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    fn children_mut(&mut self) -> &mut [Node] {
        match &mut self.kind {
            Kind::Root { child } | Kind::Decorator { child, .. } => child
                .as_deref_mut()
                .map(std::slice::from_mut)
                .unwrap_or(&mut []),
            Kind::Composite(composite) => &mut composite.children,
            Kind::Action(_) => &mut [],
        }
    }

    /// Conditions guarding this branch as seen by a parent selector.
    ///
    /// Decorators carry no conditions of their own, so the lookup passes
    /// through them to the node they wrap.
    pub(crate) fn guard_conditions_mut(&mut self) -> &mut [ConditionNode] {
        match &mut self.kind {
            Kind::Decorator {
                child: Some(child), ..
            } => child.guard_conditions_mut(),
            _ => &mut self.conditions,
        }
    }

    // ===== tick protocol =====

    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        let resumed = self.started;
        if !resumed {
            if !condition::gate(&mut self.conditions, ctx) {
                trace!("{} `{}` refused by its conditions", self.id, self.name);
                self.status = NodeStatus::Failure;
                return self.status;
            }
            self.started = true;
            self.on_start(ctx);
        }

        let status = self.update(resumed, ctx);
        self.status = status;
        // An abort inside update already closed the episode.
        if status.is_terminal() && self.started {
            self.on_finished(ctx);
        }
        status
    }

    fn on_start(&mut self, ctx: &mut TickContext<'_>) {
        trace!("{} `{}` started", self.id, self.name);
        ctx.activate(self.id);
        match &mut self.kind {
            Kind::Action(action) => action.on_start(ctx),
            Kind::Decorator { decorator, .. } => decorator.on_start(ctx),
            Kind::Root { .. } | Kind::Composite(_) => {}
        }
    }

    fn update(&mut self, resumed: bool, ctx: &mut TickContext<'_>) -> NodeStatus {
        if resumed && !condition::self_mode_allows(&mut self.conditions, ctx) {
            debug!(
                "{} `{}` lost a self-priority condition, aborting branch",
                self.id, self.name
            );
            self.abort(ctx);
            return NodeStatus::Failure;
        }

        match &mut self.kind {
            // At most one child tick per call: a child that resolves is not
            // restarted until the next external tick.
            Kind::Root { child } => match child {
                Some(child) => child.tick(ctx),
                None => NodeStatus::Failure,
            },
            Kind::Composite(composite) => composite.update(resumed, ctx),
            Kind::Action(action) => action.update(ctx),
            Kind::Decorator { decorator, child } => {
                decorator::update(decorator.as_mut(), child.as_deref_mut(), ctx)
            }
        }
    }

    fn on_finished(&mut self, ctx: &mut TickContext<'_>) {
        match &mut self.kind {
            Kind::Composite(composite) => composite.reset(),
            Kind::Action(action) => action.on_finished(ctx),
            Kind::Decorator { decorator, .. } => decorator.on_finished(ctx),
            Kind::Root { .. } => {}
        }
        ctx.deactivate(self.id);
        self.started = false;
        trace!("{} `{}` finished with {}", self.id, self.name, self.status);
    }

    /// Interrupts a running episode, children first.
    ///
    /// A node that is not started is left untouched.
    pub(crate) fn abort(&mut self, ctx: &mut TickContext<'_>) {
        if !self.started {
            return;
        }
        match &mut self.kind {
            Kind::Root { child } => {
                if let Some(child) = child {
                    child.abort(ctx);
                }
            }
            Kind::Composite(composite) => composite.abort(ctx),
            Kind::Action(action) => action.on_abort(ctx),
            Kind::Decorator { decorator, child } => {
                if let Some(child) = child {
                    child.abort(ctx);
                }
                decorator.on_abort(ctx);
            }
        }
        ctx.deactivate(self.id);
        self.started = false;
        self.status = NodeStatus::Failure;
        debug!("{} `{}` aborted", self.id, self.name);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.node_type())
            .field("status", &self.status)
            .field("started", &self.started)
            .field("conditions", &self.conditions)
            .field("children", &self.children())
            .finish()
    }
}
