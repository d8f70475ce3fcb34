//! Error types surfaced by the builder, blackboard, registry and loader.
//!
//! Scheduling outcomes are never errors: a failing node reports
//! [`NodeStatus::Failure`](crate::NodeStatus::Failure). These types cover
//! construction and data problems only.

use thiserror::Error;

/// Value families stored by a [`Blackboard`](crate::Blackboard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
}

/// Errors returned by blackboard writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    /// The key was never created for this value kind, so nothing was written.
    #[error("no {kind} value named `{key}` exists on the blackboard")]
    UnknownKey { kind: ValueKind, key: String },
}

/// Builder misuse detected while assembling a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("root node already defined")]
    RootAlreadyDefined,

    #[error("tree has no root node")]
    MissingRoot,

    #[error("no open scope to attach `{name}` to")]
    NoOpenScope { name: String },

    #[error("condition `{name}` has no preceding node to attach to")]
    NoNodeForCondition { name: String },

    #[error("condition `{name}` cannot guard the root node")]
    ConditionOnRoot { name: String },

    #[error("decorator `{pending}` is still waiting for a child when `{name}` was declared")]
    DecoratorAlreadyPending { pending: String, name: String },

    #[error("decorator `{name}` was never given a child")]
    DanglingDecorator { name: String },

    #[error("end() called without a matching open scope")]
    UnbalancedEnd,

    #[error("scope `{name}` was never closed with end()")]
    UnclosedScope { name: String },
}

/// Registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no {category} class registered as `{class}`")]
    NotFound {
        category: &'static str,
        class: String,
    },
}

/// Errors raised while loading or saving tree documents.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
