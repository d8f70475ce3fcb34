//! The behavior tree handle driven by a host once per frame.

use std::any::Any;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::behavior::{OwnerRef, TickContext};
use crate::node::Node;
use crate::{Blackboard, NodeId, NodeStatus};

/// A built tree: root node, blackboard and run state.
///
/// The tree exclusively owns its nodes and blackboard. The owner is a
/// non-owning back-reference to whatever domain object drives the tree.
pub struct BehaviorTree {
    name: String,
    root: Option<Node>,
    blackboard: Blackboard,
    running: bool,
    active: Vec<NodeId>,
    owner: Option<OwnerRef>,
}

impl BehaviorTree {
    pub(crate) fn new(name: impl Into<String>, root: Option<Node>, blackboard: Blackboard) -> Self {
        Self {
            name: name.into(),
            root,
            blackboard,
            running: false,
            active: Vec::new(),
            owner: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start_tree(&mut self) {
        self.running = true;
        debug!("tree `{}` started", self.name);
    }

    /// Ticks the root once.
    ///
    /// Returns `None` when the tree is not running or has no root. The
    /// blackboard's changed flag is cleared after every tick.
    pub fn tick_tree(&mut self) -> Option<NodeStatus> {
        if !self.running {
            return None;
        }
        let root = self.root.as_mut()?;
        let mut ctx = TickContext::new(
            &mut self.blackboard,
            &mut self.active,
            self.owner.as_ref(),
            &self.name,
        );
        let status = root.tick(&mut ctx);
        self.blackboard.clear_values_changed_flag();
        Some(status)
    }

    /// Aborts every running node and stops ticking. No-op when not running.
    pub fn stop_tree(&mut self) {
        if !self.running {
            return;
        }
        if let Some(root) = self.root.as_mut() {
            let mut ctx = TickContext::new(
                &mut self.blackboard,
                &mut self.active,
                self.owner.as_ref(),
                &self.name,
            );
            root.abort(&mut ctx);
        }
        self.running = false;
        debug!("tree `{}` stopped", self.name);
    }

    /// Records `owner` without keeping it alive.
    pub fn set_owner<T: Any + Send + Sync>(&mut self, owner: &Arc<T>) {
        let owner: Arc<dyn Any + Send + Sync> = owner.clone();
        self.owner = Some(Arc::downgrade(&owner));
    }

    pub fn clear_owner(&mut self) {
        self.owner = None;
    }

    /// The owner, if set, still alive and of type `T`.
    pub fn owner<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.owner.as_ref().and_then(Weak::upgrade)?.downcast::<T>().ok()
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.root.as_ref()?.find(id)
    }

    /// Ids of nodes with an open episode, in activation order.
    pub fn active_nodes(&self) -> &[NodeId] {
        &self.active
    }

    /// Names of the active nodes, root first.
    pub fn active_path(&self) -> Vec<&str> {
        self.active
            .iter()
            .filter_map(|id| self.find_node(*id).map(Node::name))
            .collect()
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }
}

impl std::fmt::Debug for BehaviorTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTree")
            .field("name", &self.name)
            .field("running", &self.running)
            .field("active", &self.active)
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Recorder, Script};
    use crate::BehaviorTreeBuilder;

    fn running_tree(recorder: &Recorder) -> BehaviorTree {
        BehaviorTreeBuilder::new("patrol")
            .root()
            .unwrap()
            .sequence("Main")
            .unwrap()
            .action("Walk", recorder.action("Walk", Script::running()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn tick_requires_start() {
        let recorder = Recorder::default();
        let mut tree = running_tree(&recorder);
        assert_eq!(tree.tick_tree(), None);
        assert!(recorder.events().is_empty());

        tree.start_tree();
        assert_eq!(tree.tick_tree(), Some(NodeStatus::Running));
    }

    #[test]
    fn empty_tree_ticks_to_none() {
        let mut tree = BehaviorTree::new("empty", None, Blackboard::default());
        tree.start_tree();
        assert_eq!(tree.tick_tree(), None);
    }

    #[test]
    fn active_path_follows_running_branch() {
        let recorder = Recorder::default();
        let mut tree = running_tree(&recorder);
        tree.start_tree();
        tree.tick_tree();

        assert_eq!(tree.active_path(), ["Root", "Main", "Walk"]);
        assert_eq!(tree.active_nodes(), [NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn stop_aborts_running_nodes_once() {
        let recorder = Recorder::default();
        let mut tree = running_tree(&recorder);
        tree.start_tree();
        tree.tick_tree();

        tree.stop_tree();
        tree.stop_tree();
        assert_eq!(recorder.count("Walk:abort"), 1);
        assert!(tree.active_nodes().is_empty());
        assert!(!tree.is_running());
        assert_eq!(tree.tick_tree(), None);
    }

    #[test]
    fn tick_clears_changed_flag() {
        let recorder = Recorder::default();
        let mut tree = running_tree(&recorder);
        tree.blackboard_mut().create_int("Hp", 3);
        tree.start_tree();

        tree.blackboard_mut().set_int("Hp", 2).unwrap();
        assert!(tree.blackboard().is_values_changed());
        tree.tick_tree();
        assert!(!tree.blackboard().is_values_changed());
    }

    #[test]
    fn owner_is_not_kept_alive() {
        let recorder = Recorder::default();
        let mut tree = running_tree(&recorder);
        let owner = Arc::new(String::from("goblin"));
        tree.set_owner(&owner);

        assert_eq!(tree.owner::<String>().as_deref().map(String::as_str), Some("goblin"));
        assert!(tree.owner::<u32>().is_none());

        drop(owner);
        assert!(tree.owner::<String>().is_none());
    }
}
