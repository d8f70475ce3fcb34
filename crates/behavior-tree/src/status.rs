//! Status, priority and type tags shared by every node.

use core::fmt;

/// The result of ticking a node.
///
/// # Frame-based Semantics
///
/// A tick never blocks. Work that spans several frames reports `Running`
/// and is ticked again on the next frame without being restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeStatus {
    /// The node completed successfully.
    Success,

    /// The node failed, was refused by its gate, or was aborted.
    Failure,

    /// The node needs more ticks to finish.
    Running,
}

impl NodeStatus {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, NodeStatus::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, NodeStatus::Failure)
    }

    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, NodeStatus::Running)
    }

    /// Returns `true` for `Success` and `Failure`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    /// Swaps `Success` and `Failure`. `Running` is left untouched.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            NodeStatus::Success => NodeStatus::Failure,
            NodeStatus::Failure => NodeStatus::Success,
            NodeStatus::Running => NodeStatus::Running,
        }
    }

    pub(crate) fn from_bool(value: bool) -> Self {
        if value {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        }
    }
}

/// Controls when a condition may interrupt running work.
///
/// - `None`: checked once by the pre-start gate, never re-evaluated reactively
/// - `SelfBranch`: a failure aborts the node the condition is attached to
/// - `LowerPriority`: a success preempts a running sibling to the right
/// - `Both`: combines the two
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PriorityType {
    #[default]
    None,
    #[strum(serialize = "Self")]
    #[cfg_attr(feature = "serde", serde(rename = "Self"))]
    SelfBranch,
    LowerPriority,
    Both,
}

impl PriorityType {
    /// Whether a failed evaluation aborts the guarded node.
    #[inline]
    pub fn aborts_self(self) -> bool {
        matches!(self, PriorityType::SelfBranch | PriorityType::Both)
    }

    /// Whether a successful evaluation may preempt lower-priority siblings.
    #[inline]
    pub fn aborts_lower_priority(self) -> bool {
        matches!(self, PriorityType::LowerPriority | PriorityType::Both)
    }

    /// Whether the condition is ever re-evaluated while its node runs.
    #[inline]
    pub fn is_reactive(self) -> bool {
        !matches!(self, PriorityType::None)
    }
}

/// Coarse node classification exposed to editors and serializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    Root,
    Composite,
    Action,
    Condition,
    Decorator,
}

/// The two control-flow composites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompositeKind {
    /// AND semantics: stops at the first failing child.
    Sequence,
    /// OR semantics: stops at the first succeeding child.
    Selector,
}

/// Builder-assigned node identifier.
///
/// Ids are unique within a tree and follow creation order, not tree position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
