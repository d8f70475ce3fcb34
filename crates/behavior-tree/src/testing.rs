//! Scripted nodes that log their lifecycle, shared by unit tests.

use std::sync::{Arc, Mutex};

use crate::behavior::{Action, Condition, TickContext};
use crate::decorator::Clock;
use crate::{BehaviorTree, NodeStatus};

/// Shared event log. Every scripted node records `"<name>:<hook>"`.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn record(&self, name: &str, hook: &str) {
        self.log.lock().unwrap().push(format!("{name}:{hook}"));
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, event: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub(crate) fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    pub(crate) fn action(&self, name: &str, script: Script) -> RecordedAction {
        RecordedAction {
            name: name.to_owned(),
            recorder: self.clone(),
            script,
            remaining: 0,
        }
    }

    /// Condition reading a bool key, logging `"<name>:check"`.
    pub(crate) fn flag(&self, name: &str, key: &str) -> RecordedFlag {
        RecordedFlag {
            name: name.to_owned(),
            key: key.to_owned(),
            recorder: self.clone(),
        }
    }
}

/// How a [`RecordedAction`] behaves during one episode.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Script {
    /// `None` keeps running forever.
    running_ticks: Option<usize>,
    outcome: NodeStatus,
}

impl Script {
    pub(crate) fn succeed() -> Self {
        Self::running_then(0, NodeStatus::Success)
    }

    pub(crate) fn fail() -> Self {
        Self::running_then(0, NodeStatus::Failure)
    }

    pub(crate) fn running() -> Self {
        Self {
            running_ticks: None,
            outcome: NodeStatus::Running,
        }
    }

    pub(crate) fn running_then(ticks: usize, outcome: NodeStatus) -> Self {
        Self {
            running_ticks: Some(ticks),
            outcome,
        }
    }
}

pub(crate) struct RecordedAction {
    name: String,
    recorder: Recorder,
    script: Script,
    remaining: usize,
}

impl Action for RecordedAction {
    fn on_start(&mut self, _ctx: &mut TickContext<'_>) {
        self.recorder.record(&self.name, "start");
        self.remaining = self.script.running_ticks.unwrap_or(0);
    }

    fn update(&mut self, _ctx: &mut TickContext<'_>) -> NodeStatus {
        self.recorder.record(&self.name, "update");
        if self.script.running_ticks.is_none() {
            return NodeStatus::Running;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            return NodeStatus::Running;
        }
        self.script.outcome
    }

    fn on_finished(&mut self, _ctx: &mut TickContext<'_>) {
        self.recorder.record(&self.name, "finish");
    }

    fn on_abort(&mut self, _ctx: &mut TickContext<'_>) {
        self.recorder.record(&self.name, "abort");
    }
}

pub(crate) struct RecordedFlag {
    name: String,
    key: String,
    recorder: Recorder,
}

impl Condition for RecordedFlag {
    fn check(&mut self, ctx: &mut TickContext<'_>) -> bool {
        self.recorder.record(&self.name, "check");
        ctx.blackboard().bool_value(&self.key)
    }
}

/// Hand-driven clock for cooldown tests.
#[derive(Clone, Default)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub(crate) fn advance(&self, secs: f64) {
        *self.now.lock().unwrap() += secs;
    }
}

impl Clock for ManualClock {
    fn seconds(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}

pub(crate) fn tick_n(tree: &mut BehaviorTree, n: usize) -> Vec<NodeStatus> {
    (0..n)
        .map(|_| tree.tick_tree().expect("tree is running"))
        .collect()
}
