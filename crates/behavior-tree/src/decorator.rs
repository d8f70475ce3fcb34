//! Decorator behavior nodes.
//!
//! Decorators wrap a single child and either gate whether it may start a new
//! episode or rewrite its terminal result. This module provides the
//! scheduling step shared by every decorator plus the built-in kinds:
//! [`Inverter`] (NOT logic), [`AlwaysSucceed`] (error suppression),
//! [`ForceResult`] (fixed outcome) and [`Cooldown`] (rate limiting).

use std::time::Instant;

use tracing::debug;

use crate::behavior::{Decorator, TickContext};
use crate::node::Node;
use crate::{NodeStatus, Params};

pub(crate) fn update(
    decorator: &mut dyn Decorator,
    child: Option<&mut Node>,
    ctx: &mut TickContext<'_>,
) -> NodeStatus {
    let Some(child) = child else {
        return NodeStatus::Failure;
    };
    if !child.is_started() && !decorator.can_execute(ctx) {
        return NodeStatus::Failure;
    }
    let status = child.tick(ctx);
    if status.is_terminal() {
        decorator.on_finished_result(status, ctx)
    } else {
        status
    }
}

/// Inverts the terminal result of its child.
///
/// - `Success` becomes `Failure`
/// - `Failure` becomes `Success`
/// - `Running` passes through
#[derive(Debug, Clone, Copy, Default)]
pub struct Inverter;

impl Decorator for Inverter {
    fn on_finished_result(&mut self, status: NodeStatus, _ctx: &mut TickContext<'_>) -> NodeStatus {
        status.invert()
    }
}

/// Reports `Success` whatever the child's terminal result.
///
/// This is useful for:
/// - Optional behaviors that shouldn't cause a sequence to fail
/// - Logging/debugging nodes that observe state without affecting control flow
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSucceed;

impl Decorator for AlwaysSucceed {
    fn on_finished_result(&mut self, _status: NodeStatus, _ctx: &mut TickContext<'_>) -> NodeStatus {
        NodeStatus::Success
    }
}

/// Replaces the child's terminal result with a fixed status.
#[derive(Debug, Clone, Copy)]
pub struct ForceResult {
    result: NodeStatus,
}

impl ForceResult {
    pub fn new(result: NodeStatus) -> Self {
        Self { result }
    }

    /// Reads `NewResult` as one of `"Success"`, `"Failure"`, `"Running"`.
    pub fn from_params(params: &Params) -> Self {
        let result = match params.string_or("NewResult", "Success").as_str() {
            "Failure" => NodeStatus::Failure,
            "Running" => NodeStatus::Running,
            _ => NodeStatus::Success,
        };
        Self::new(result)
    }
}

impl Decorator for ForceResult {
    fn on_finished_result(&mut self, _status: NodeStatus, _ctx: &mut TickContext<'_>) -> NodeStatus {
        self.result
    }

    fn params(&self) -> Params {
        Params::new().with_string("NewResult", self.result.to_string())
    }
}

/// Seconds elapsed on some monotonic clock.
pub trait Clock: Send {
    fn seconds(&self) -> f64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Refuses to start its child again until `cooldown` seconds have passed
/// since the child last finished.
pub struct Cooldown {
    cooldown: f64,
    last_finished: Option<f64>,
    clock: Box<dyn Clock>,
}

impl Cooldown {
    pub fn new(cooldown_secs: f64) -> Self {
        Self::with_clock(cooldown_secs, MonotonicClock::default())
    }

    pub fn with_clock(cooldown_secs: f64, clock: impl Clock + 'static) -> Self {
        Self {
            cooldown: cooldown_secs,
            last_finished: None,
            clock: Box::new(clock),
        }
    }

    /// Reads `CooldownTime` in seconds (default `5.0`).
    pub fn from_params(params: &Params) -> Self {
        Self::new(f64::from(params.float_or("CooldownTime", 5.0)))
    }
}

impl Decorator for Cooldown {
    fn can_execute(&mut self, _ctx: &mut TickContext<'_>) -> bool {
        let Some(last) = self.last_finished else {
            return true;
        };
        let elapsed = self.clock.seconds() - last;
        if elapsed <= self.cooldown {
            debug!("cooldown active, {:.2}s remaining", self.cooldown - elapsed);
            return false;
        }
        true
    }

    fn on_finished_result(&mut self, status: NodeStatus, _ctx: &mut TickContext<'_>) -> NodeStatus {
        self.last_finished = Some(self.clock.seconds());
        status
    }

    fn params(&self) -> Params {
        Params::new().with_float("CooldownTime", self.cooldown as f32)
    }
}
