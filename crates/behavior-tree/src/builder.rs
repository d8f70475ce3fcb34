//! Fluent tree construction.
//!
//! The builder is a small state machine: it waits for `root()`, then keeps a
//! stack of open scopes (the root and every composite not yet closed with
//! `end()`), and seals once the root scope itself is closed. Misuse that the
//! fluent shape cannot rule out is reported as a [`BuildError`].
//!
//! ```text
//! AwaitingRoot ──root()──▶ Open[scopes] ──end() of root──▶ Sealed
//! ```
//!
//! Conditions decorate the most recently created node, not the current
//! scope. A decorator is staged and becomes the parent of the next composite
//! or action.

use tracing::warn;

use crate::behavior::{Action, Condition, Decorator};
use crate::condition::ConditionNode;
use crate::error::{BuildError, Result};
use crate::node::Node;
use crate::{BehaviorTree, Blackboard, CompositeKind, NodeId, NodeType, PriorityType};

/// An open composite (or the root), plus the staged decorator that will wrap
/// it once it closes.
struct Scope {
    node: Node,
    wrapper: Option<Node>,
}

enum Stage {
    AwaitingRoot,
    Open(Vec<Scope>),
    Sealed(Node),
}

/// Builds a [`BehaviorTree`] in declaration order.
///
/// # Example
///
/// ```
/// use behavior_tree::{BehaviorTreeBuilder, Inverter, SetFlag, Blackboard};
///
/// let tree = BehaviorTreeBuilder::new("Guard")
///     .blackboard(Blackboard::default().with_bool("Alert", false))
///     .root()?
///     .selector("Main")?
///     .decorator("Not", Inverter)?
///     .action("Raise", SetFlag::new("Alert", true))?
///     .end()?
///     .build()?;
/// assert_eq!(tree.name(), "Guard");
/// # Ok::<(), behavior_tree::BuildError>(())
/// ```
pub struct BehaviorTreeBuilder {
    name: String,
    blackboard: Option<Blackboard>,
    stage: Stage,
    pending: Option<Node>,
    last_created: Option<NodeId>,
    next_id: u64,
}

impl BehaviorTreeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blackboard: None,
            stage: Stage::AwaitingRoot,
            pending: None,
            last_created: None,
            next_id: 1,
        }
    }

    /// Blackboard handed to the tree. A default one is created otherwise.
    #[must_use]
    pub fn blackboard(mut self, blackboard: Blackboard) -> Self {
        self.blackboard = Some(blackboard);
        self
    }

    pub fn root(mut self) -> Result<Self> {
        if !matches!(self.stage, Stage::AwaitingRoot) {
            return Err(BuildError::RootAlreadyDefined);
        }
        let id = self.allocate_id();
        self.stage = Stage::Open(vec![Scope {
            node: Node::root(id),
            wrapper: None,
        }]);
        self.last_created = Some(id);
        Ok(self)
    }

    pub fn sequence(self, name: impl Into<String>) -> Result<Self> {
        self.composite(name, CompositeKind::Sequence)
    }

    pub fn selector(self, name: impl Into<String>) -> Result<Self> {
        self.composite(name, CompositeKind::Selector)
    }

    /// Opens a composite scope; close it with [`end`](Self::end).
    pub fn composite(self, name: impl Into<String>, kind: CompositeKind) -> Result<Self> {
        self.open_composite(name.into(), kind, None)
    }

    pub fn action(self, name: impl Into<String>, action: impl Action + 'static) -> Result<Self> {
        self.attach_action(name.into(), Box::new(action), None)
    }

    pub fn condition(
        self,
        priority: PriorityType,
        name: impl Into<String>,
        condition: impl Condition + 'static,
    ) -> Result<Self> {
        self.attach_condition(priority, name.into(), Box::new(condition), None)
    }

    pub fn decorator(
        self,
        name: impl Into<String>,
        decorator: impl Decorator + 'static,
    ) -> Result<Self> {
        self.stage_decorator(name.into(), Box::new(decorator), None)
    }

    /// Closes the innermost open scope.
    pub fn end(mut self) -> Result<Self> {
        if let Some(pending) = &self.pending {
            return Err(BuildError::DanglingDecorator {
                name: pending.name().to_owned(),
            });
        }
        let Stage::Open(scopes) = &mut self.stage else {
            return Err(BuildError::UnbalancedEnd);
        };
        let Some(Scope { node, wrapper }) = scopes.pop() else {
            return Err(BuildError::UnbalancedEnd);
        };
        let finished = wrap(wrapper, node);
        match scopes.last_mut() {
            Some(parent) => attach_to(&mut parent.node, finished),
            None => self.stage = Stage::Sealed(finished),
        }
        Ok(self)
    }

    /// Finishes the tree. The root scope may be left open; any other open
    /// scope is an error.
    pub fn build(self) -> Result<BehaviorTree> {
        if let Some(pending) = self.pending {
            return Err(BuildError::DanglingDecorator {
                name: pending.name().to_owned(),
            });
        }
        let root = match self.stage {
            Stage::AwaitingRoot => return Err(BuildError::MissingRoot),
            Stage::Sealed(root) => root,
            Stage::Open(mut scopes) => {
                if scopes.len() > 1 {
                    let name = scopes
                        .last()
                        .map(|scope| scope.node.name().to_owned())
                        .unwrap_or_default();
                    return Err(BuildError::UnclosedScope { name });
                }
                match scopes.pop() {
                    Some(scope) => scope.node,
                    None => return Err(BuildError::MissingRoot),
                }
            }
        };
        Ok(BehaviorTree::new(
            self.name,
            Some(root),
            self.blackboard.unwrap_or_default(),
        ))
    }

    // ===== class-aware entry points used by the document loader =====

    pub(crate) fn open_composite(
        mut self,
        name: String,
        kind: CompositeKind,
        class: Option<String>,
    ) -> Result<Self> {
        self.top_scope(&name)?;
        let id = self.allocate_id();
        let mut node = Node::composite(id, name, kind);
        node.set_class(class);
        let wrapper = self.pending.take();
        self.last_created = Some(id);
        if let Stage::Open(scopes) = &mut self.stage {
            scopes.push(Scope { node, wrapper });
        }
        Ok(self)
    }

    pub(crate) fn attach_action(
        mut self,
        name: String,
        action: Box<dyn Action>,
        class: Option<String>,
    ) -> Result<Self> {
        self.top_scope(&name)?;
        let id = self.allocate_id();
        let mut node = Node::action(id, name, action);
        node.set_class(class);
        let node = wrap(self.pending.take(), node);
        self.last_created = Some(id);
        let top = self.top_scope(node.name())?;
        attach_to(&mut top.node, node);
        Ok(self)
    }

    pub(crate) fn attach_condition(
        mut self,
        priority: PriorityType,
        name: String,
        condition: Box<dyn Condition>,
        class: Option<String>,
    ) -> Result<Self> {
        let Some(target) = self.last_created else {
            return Err(BuildError::NoNodeForCondition { name });
        };
        let id = self.allocate_id();
        let mut node = ConditionNode::new(id, name, priority, condition);
        node.set_class(class);

        let Some(host) = self.find_created_mut(target) else {
            return Err(BuildError::NoNodeForCondition {
                name: node.name().to_owned(),
            });
        };
        if host.node_type() == NodeType::Root {
            return Err(BuildError::ConditionOnRoot {
                name: node.name().to_owned(),
            });
        }
        host.add_condition(node);
        Ok(self)
    }

    pub(crate) fn stage_decorator(
        mut self,
        name: String,
        decorator: Box<dyn Decorator>,
        class: Option<String>,
    ) -> Result<Self> {
        self.top_scope(&name)?;
        if let Some(pending) = &self.pending {
            return Err(BuildError::DecoratorAlreadyPending {
                pending: pending.name().to_owned(),
                name,
            });
        }
        let id = self.allocate_id();
        let mut node = Node::decorator(id, name, decorator);
        node.set_class(class);
        self.pending = Some(node);
        Ok(self)
    }

    /// Drops a staged decorator whose child could not be created.
    pub(crate) fn discard_pending(&mut self) -> Option<String> {
        self.pending.take().map(|node| node.name().to_owned())
    }

    // ===== internals =====

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn top_scope(&mut self, name: &str) -> Result<&mut Scope> {
        match &mut self.stage {
            Stage::Open(scopes) => scopes.last_mut(),
            Stage::AwaitingRoot | Stage::Sealed(_) => None,
        }
        .ok_or_else(|| BuildError::NoOpenScope {
            name: name.to_owned(),
        })
    }

    fn find_created_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match &mut self.stage {
            Stage::AwaitingRoot => None,
            Stage::Open(scopes) => scopes
                .iter_mut()
                .rev()
                .find_map(|scope| scope.node.find_mut(id)),
            Stage::Sealed(root) => root.find_mut(id),
        }
    }
}

fn wrap(wrapper: Option<Node>, node: Node) -> Node {
    match wrapper {
        Some(mut decorator) => {
            attach_to(&mut decorator, node);
            decorator
        }
        None => node,
    }
}

fn attach_to(parent: &mut Node, child: Node) {
    if let Some(displaced) = parent.attach_child(child) {
        warn!(
            "`{}` holds a single child, `{}` was replaced",
            parent.name(),
            displaced.name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Recorder, Script};
    use crate::{Inverter, NodeStatus};

    #[test]
    fn ids_follow_creation_order() {
        let recorder = Recorder::default();
        let tree = BehaviorTreeBuilder::new("ids")
            .root()
            .unwrap()
            .selector("Main")
            .unwrap()
            .decorator("Not", Inverter)
            .unwrap()
            .action("A", recorder.action("A", Script::succeed()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();

        let root = tree.root().unwrap();
        assert_eq!(root.id(), NodeId(1));
        let main = &root.children()[0];
        assert_eq!(main.id(), NodeId(2));
        let not = &main.children()[0];
        assert_eq!((not.id(), not.node_type()), (NodeId(3), NodeType::Decorator));
        let a = &not.children()[0];
        assert_eq!(a.id(), NodeId(4));
        assert_eq!(a.parent(), Some(NodeId(3)));
    }

    #[test]
    fn condition_attaches_to_last_created_node() {
        let recorder = Recorder::default();
        let tree = BehaviorTreeBuilder::new("conditions")
            .root()
            .unwrap()
            .selector("Main")
            .unwrap()
            .sequence("Attack")
            .unwrap()
            .condition(PriorityType::LowerPriority, "InRange", recorder.flag("InRange", "Near"))
            .unwrap()
            .action("Swing", recorder.action("Swing", Script::succeed()))
            .unwrap()
            .end()
            .unwrap()
            // After end() the last created node is still `Swing`.
            .condition(PriorityType::None, "Stamina", recorder.flag("Stamina", "Rested"))
            .unwrap()
            .build()
            .unwrap();

        let attack = &tree.root().unwrap().children()[0].children()[0];
        assert_eq!(attack.conditions().len(), 1);
        assert_eq!(attack.conditions()[0].name(), "InRange");
        assert_eq!(attack.conditions()[0].parent(), Some(attack.id()));
        let swing = &attack.children()[0];
        assert_eq!(swing.conditions()[0].name(), "Stamina");
    }

    #[test]
    fn decorator_wraps_next_composite() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("wrapped")
            .root()
            .unwrap()
            .decorator("Not", Inverter)
            .unwrap()
            .sequence("Main")
            .unwrap()
            .action("A", recorder.action("A", Script::succeed()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();

        let not = &tree.root().unwrap().children()[0];
        assert_eq!(not.name(), "Not");
        assert_eq!(not.children()[0].name(), "Main");

        tree.start_tree();
        assert_eq!(tree.tick_tree(), Some(NodeStatus::Failure));
    }

    #[test]
    fn second_root_child_replaces_first() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("replace")
            .root()
            .unwrap()
            .action("First", recorder.action("First", Script::succeed()))
            .unwrap()
            .action("Second", recorder.action("Second", Script::succeed()))
            .unwrap()
            .build()
            .unwrap();

        let root = tree.root().unwrap();
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].name(), "Second");

        tree.start_tree();
        tree.tick_tree();
        assert_eq!(recorder.count("First:update"), 0);
    }

    #[test]
    fn misuse_is_reported() {
        let recorder = Recorder::default();

        assert_eq!(
            BehaviorTreeBuilder::new("t").build().unwrap_err(),
            BuildError::MissingRoot
        );
        assert_eq!(
            BehaviorTreeBuilder::new("t").root().unwrap().root().err(),
            Some(BuildError::RootAlreadyDefined)
        );
        assert!(matches!(
            BehaviorTreeBuilder::new("t").sequence("Main").err(),
            Some(BuildError::NoOpenScope { name }) if name == "Main"
        ));
        assert!(matches!(
            BehaviorTreeBuilder::new("t")
                .root()
                .unwrap()
                .condition(PriorityType::None, "C", recorder.flag("C", "k"))
                .err(),
            Some(BuildError::ConditionOnRoot { .. })
        ));
        assert!(matches!(
            BehaviorTreeBuilder::new("t")
                .root()
                .unwrap()
                .decorator("One", Inverter)
                .unwrap()
                .decorator("Two", Inverter)
                .err(),
            Some(BuildError::DecoratorAlreadyPending { pending, name }) if pending == "One" && name == "Two"
        ));
        assert!(matches!(
            BehaviorTreeBuilder::new("t")
                .root()
                .unwrap()
                .decorator("Lonely", Inverter)
                .unwrap()
                .build()
                .err(),
            Some(BuildError::DanglingDecorator { name }) if name == "Lonely"
        ));
        assert!(matches!(
            BehaviorTreeBuilder::new("t").root().unwrap().end().unwrap().end().err(),
            Some(BuildError::UnbalancedEnd)
        ));
        assert!(matches!(
            BehaviorTreeBuilder::new("t")
                .root()
                .unwrap()
                .sequence("Open")
                .unwrap()
                .build()
                .err(),
            Some(BuildError::UnclosedScope { name }) if name == "Open"
        ));
    }

    #[test]
    fn sealed_tree_rejects_new_nodes() {
        let recorder = Recorder::default();
        let result = BehaviorTreeBuilder::new("sealed")
            .root()
            .unwrap()
            .end()
            .unwrap()
            .action("Late", recorder.action("Late", Script::succeed()));
        assert!(matches!(result.err(), Some(BuildError::NoOpenScope { .. })));
    }

    #[test]
    fn blackboard_defaults_when_not_supplied() {
        let tree = BehaviorTreeBuilder::new("bb").root().unwrap().build().unwrap();
        assert_eq!(tree.blackboard().name(), "DefaultBlackboard");
    }
}
