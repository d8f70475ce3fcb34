//! Reactive behavior tree runtime for frame-driven games.
//!
//! Trees are built once, then ticked by the host every frame. A tick never
//! blocks: long-running work reports [`NodeStatus::Running`] and is resumed
//! on the next frame.
//!
//! - **Reactive conditions**: [`PriorityType`] decides whether a condition
//!   aborts its own branch or preempts lower-priority work
//! - **Change-driven re-evaluation**: reactive conditions are only re-ticked
//!   on frames where the [`Blackboard`] was written
//! - **Data-driven trees**: [`NodeRegistry`] and [`TreeDocument`] rebuild a
//!   tree from JSON
//!
//! # Architecture
//!
//! - [`Action`], [`Condition`], [`Decorator`]: capability traits for user nodes
//! - [`BehaviorTreeBuilder`]: fluent construction with checked misuse
//! - [`BehaviorTree`]: owns the nodes and blackboard, driven by `tick_tree`
//! - [`Forest`]: host-owned set of trees ticked together
//! - Built-in nodes: [`Inverter`], [`AlwaysSucceed`], [`ForceResult`],
//!   [`Cooldown`], [`BlackboardFlag`], [`FloatAtMost`], [`SetFlag`], [`Wait`]

pub mod action;
pub mod behavior;
pub mod blackboard;
pub mod builder;
pub mod composite;
pub mod condition;
pub mod decorator;
#[cfg(feature = "serde")]
pub mod document;
pub mod error;
pub mod forest;
pub mod node;
pub mod params;
pub mod registry;
pub mod status;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{SetFlag, Wait};
pub use behavior::{Action, Condition, Decorator, TickContext};
pub use blackboard::Blackboard;
pub use builder::BehaviorTreeBuilder;
pub use condition::{BlackboardFlag, ConditionNode, FloatAtMost};
pub use decorator::{AlwaysSucceed, Clock, Cooldown, ForceResult, Inverter, MonotonicClock};
#[cfg(feature = "serde")]
pub use document::{
    BlackboardDocument, ConditionDocument, MissingClassPolicy, NodeDocument, TreeDocument,
};
pub use error::{BlackboardError, BuildError, LoadError, RegistryError, ValueKind};
pub use forest::{Forest, TreeId};
pub use node::Node;
pub use params::{ParamValue, Params};
pub use registry::NodeRegistry;
pub use status::{CompositeKind, NodeId, NodeStatus, NodeType, PriorityType};
pub use tree::BehaviorTree;
