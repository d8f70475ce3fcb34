//! Composite behavior nodes.
//!
//! Composite nodes control the execution flow of multiple children. Both
//! kinds walk their children left to right and remember where they stopped,
//! so a child that reports `Running` is resumed (not restarted) next tick.

use tracing::debug;

use crate::behavior::TickContext;
use crate::condition;
use crate::node::Node;
use crate::{CompositeKind, NodeStatus};

pub(crate) struct Composite {
    pub(crate) kind: CompositeKind,
    pub(crate) children: Vec<Node>,
    pub(crate) current: usize,
}

impl Composite {
    pub(crate) fn new(kind: CompositeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            current: 0,
        }
    }

    pub(crate) fn update(&mut self, resumed: bool, ctx: &mut TickContext<'_>) -> NodeStatus {
        match self.kind {
            CompositeKind::Sequence => self.update_sequence(ctx),
            CompositeKind::Selector => {
                if resumed {
                    self.preempt_lower_priority(ctx);
                }
                self.update_selector(ctx)
            }
        }
    }

    /// # Semantics
    ///
    /// - `Failure` from a child stops the sequence, which fails and rewinds to
    ///   the first child
    /// - `Success` moves on to the next child within the same tick
    /// - `Success` from every child succeeds and rewinds
    ///
    /// Short-circuited logical AND.
    fn update_sequence(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        while let Some(child) = self.children.get_mut(self.current) {
            match child.tick(ctx) {
                NodeStatus::Running => return NodeStatus::Running,
                NodeStatus::Failure => {
                    self.current = 0;
                    return NodeStatus::Failure;
                }
                NodeStatus::Success => self.current += 1,
            }
        }
        self.current = 0;
        NodeStatus::Success
    }

    /// # Semantics
    ///
    /// - `Success` from a child stops the selector, which succeeds and rewinds
    /// - `Failure` moves on to the next child within the same tick
    /// - `Failure` from every child fails and rewinds
    ///
    /// Short-circuited logical OR.
    fn update_selector(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        while let Some(child) = self.children.get_mut(self.current) {
            match child.tick(ctx) {
                NodeStatus::Running => return NodeStatus::Running,
                NodeStatus::Success => {
                    self.current = 0;
                    return NodeStatus::Success;
                }
                NodeStatus::Failure => self.current += 1,
            }
        }
        self.current = 0;
        NodeStatus::Failure
    }

    /// Jumps back to a higher-priority child whose guard just became true,
    /// aborting the child that was running.
    fn preempt_lower_priority(&mut self, ctx: &mut TickContext<'_>) {
        let Some(index) = condition::lower_priority_preemption(&mut self.children, self.current, ctx)
        else {
            return;
        };
        if let Some(running) = self.children.get_mut(self.current) {
            debug!(
                "preempting `{}` in favour of child {}",
                running.name(),
                index
            );
            running.abort(ctx);
        }
        self.current = index;
    }

    pub(crate) fn abort(&mut self, ctx: &mut TickContext<'_>) {
        if let Some(child) = self.children.get_mut(self.current) {
            child.abort(ctx);
        }
        self.current = 0;
    }

    pub(crate) fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{Recorder, Script, tick_n};
    use crate::{BehaviorTreeBuilder, NodeStatus, PriorityType};

    #[test]
    fn sequence_runs_children_in_order() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("seq")
            .root()
            .unwrap()
            .sequence("Main")
            .unwrap()
            .action("A", recorder.action("A", Script::succeed()))
            .unwrap()
            .action("B", recorder.action("B", Script::succeed()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Success));
        assert_eq!(
            recorder.events(),
            ["A:start", "A:update", "A:finish", "B:start", "B:update", "B:finish"]
        );
    }

    #[test]
    fn sequence_failure_rewinds_to_first_child() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("seq")
            .root()
            .unwrap()
            .sequence("Main")
            .unwrap()
            .action("A", recorder.action("A", Script::succeed()))
            .unwrap()
            .action("B", recorder.action("B", Script::fail()))
            .unwrap()
            .action("C", recorder.action("C", Script::succeed()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Failure));
        assert_eq!(recorder.count("C:update"), 0);

        recorder.clear();
        assert_eq!(tree.tick_tree(), Some(NodeStatus::Failure));
        assert_eq!(recorder.events()[0], "A:start");
    }

    #[test]
    fn selector_falls_through_failures_in_one_tick() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("sel")
            .root()
            .unwrap()
            .selector("Choose")
            .unwrap()
            .action("A", recorder.action("A", Script::fail()))
            .unwrap()
            .action("B", recorder.action("B", Script::succeed()))
            .unwrap()
            .action("C", recorder.action("C", Script::succeed()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Success));
        assert_eq!(recorder.count("A:update"), 1);
        assert_eq!(recorder.count("B:update"), 1);
        assert_eq!(recorder.count("C:update"), 0);
    }

    #[test]
    fn selector_fails_when_all_fail() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("sel")
            .root()
            .unwrap()
            .selector("Choose")
            .unwrap()
            .action("A", recorder.action("A", Script::fail()))
            .unwrap()
            .action("B", recorder.action("B", Script::fail()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Failure));
        let selector = &tree.root().unwrap().children()[0];
        assert_eq!(selector.current_child_index(), Some(0));
    }

    #[test]
    fn running_child_is_resumed_not_restarted() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("resume")
            .root()
            .unwrap()
            .sequence("Main")
            .unwrap()
            .action("A", recorder.action("A", Script::succeed()))
            .unwrap()
            .action("B", recorder.action("B", Script::running_then(2, NodeStatus::Success)))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        assert_eq!(tick_n(&mut tree, 2), vec![NodeStatus::Running; 2]);
        assert_eq!(recorder.count("A:update"), 1);
        assert_eq!(recorder.count("B:start"), 1);

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Success));
        assert_eq!(recorder.count("A:update"), 1);
        assert_eq!(recorder.count("B:start"), 1);
        assert_eq!(recorder.count("B:finish"), 1);
    }

    #[test]
    fn self_condition_aborts_running_composite() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("guarded")
            .blackboard(crate::Blackboard::default().with_bool("Alert", true))
            .root()
            .unwrap()
            .sequence("Patrol")
            .unwrap()
            .condition(PriorityType::SelfBranch, "Alerted", recorder.flag("Alerted", "Alert"))
            .unwrap()
            .action("Walk", recorder.action("Walk", Script::running()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Running));
        tree.blackboard_mut().set_bool("Alert", false).unwrap();

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Failure));
        assert_eq!(recorder.count("Walk:abort"), 1);
        assert_eq!(recorder.count("Walk:update"), 1);
        assert!(tree.active_nodes().is_empty());
    }

    #[test]
    fn cached_conditions_are_not_reticked_on_clean_frames() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTreeBuilder::new("cache")
            .blackboard(crate::Blackboard::default().with_bool("Alert", true))
            .root()
            .unwrap()
            .sequence("Patrol")
            .unwrap()
            .condition(PriorityType::SelfBranch, "Alerted", recorder.flag("Alerted", "Alert"))
            .unwrap()
            .action("Walk", recorder.action("Walk", Script::running()))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        tick_n(&mut tree, 4);
        // Only the activation gate evaluated it.
        assert_eq!(recorder.count("Alerted:check"), 1);
    }
}
