//! Built-in leaf actions.

use tracing::warn;

use crate::behavior::{Action, TickContext};
use crate::{NodeStatus, Params};

/// Writes a bool blackboard key and succeeds.
///
/// Fails when the key was never created on the tree's blackboard.
#[derive(Debug, Clone)]
pub struct SetFlag {
    key: String,
    value: bool,
}

impl SetFlag {
    pub fn new(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Reads `Key` and `Value` (default `true`).
    pub fn from_params(params: &Params) -> Self {
        Self::new(params.blackboard_key("Key"), params.bool_or("Value", true))
    }
}

impl Action for SetFlag {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        match ctx.blackboard_mut().set_bool(&self.key, self.value) {
            Ok(()) => NodeStatus::Success,
            Err(err) => {
                warn!("{} ({})", err, ctx.tree_name());
                NodeStatus::Failure
            }
        }
    }

    fn params(&self) -> Params {
        Params::new()
            .with_string("Key", self.key.clone())
            .with_bool("Value", self.value)
    }
}

/// Reports `Running` for a fixed number of ticks, then succeeds.
#[derive(Debug, Clone)]
pub struct Wait {
    ticks: u32,
    elapsed: u32,
}

impl Wait {
    pub fn new(ticks: u32) -> Self {
        Self { ticks, elapsed: 0 }
    }

    /// Reads `Ticks` (default `1`). Negative values wait zero ticks.
    pub fn from_params(params: &Params) -> Self {
        Self::new(u32::try_from(params.int_or("Ticks", 1)).unwrap_or(0))
    }
}

impl Action for Wait {
    fn on_start(&mut self, _ctx: &mut TickContext<'_>) {
        self.elapsed = 0;
    }

    fn update(&mut self, _ctx: &mut TickContext<'_>) -> NodeStatus {
        if self.elapsed < self.ticks {
            self.elapsed += 1;
            NodeStatus::Running
        } else {
            NodeStatus::Success
        }
    }

    fn params(&self) -> Params {
        Params::new().with_int("Ticks", i32::try_from(self.ticks).unwrap_or(i32::MAX))
    }
}
