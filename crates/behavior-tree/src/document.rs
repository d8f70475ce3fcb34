//! JSON tree documents.
//!
//! A [`TreeDocument`] is the data form of a tree: structure, registry class
//! names, per-node [`Params`] and initial blackboard values. Documents are
//! turned back into runnable trees through a [`NodeRegistry`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::builder::BehaviorTreeBuilder;
use crate::condition::ConditionNode;
use crate::error::{LoadError, RegistryError};
use crate::node::Node;
use crate::registry::NodeRegistry;
use crate::{BehaviorTree, Blackboard, CompositeKind, NodeType, Params, PriorityType};

/// What to do when a document names a class the registry does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingClassPolicy {
    /// Log a warning and leave the node out.
    #[default]
    Skip,
    /// Fail the whole load.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub name: String,
    #[serde(default)]
    pub blackboard: BlackboardDocument,
    /// The node under the implicit root, if any.
    #[serde(default)]
    pub body: Option<NodeDocument>,
}

/// Blackboard class plus the values layered on top of a fresh instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackboardDocument {
    pub class: String,
    pub bools: BTreeMap<String, bool>,
    pub ints: BTreeMap<String, i32>,
    pub floats: BTreeMap<String, f32>,
    pub strings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeDocument {
    Composite {
        name: String,
        kind: CompositeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        conditions: Vec<ConditionDocument>,
        #[serde(default)]
        children: Vec<NodeDocument>,
    },
    Action {
        name: String,
        class: String,
        #[serde(default, skip_serializing_if = "Params::is_empty")]
        params: Params,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        conditions: Vec<ConditionDocument>,
    },
    Decorator {
        name: String,
        class: String,
        #[serde(default, skip_serializing_if = "Params::is_empty")]
        params: Params,
        #[serde(default)]
        child: Option<Box<NodeDocument>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDocument {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub priority: PriorityType,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

impl TreeDocument {
    /// Captures the structure and current blackboard values of `tree`.
    ///
    /// Nodes built without a registry class are recorded under their name.
    pub fn from_tree(tree: &BehaviorTree) -> Self {
        let body = tree
            .root()
            .and_then(|root| root.children().first())
            .map(NodeDocument::from_node);
        Self {
            name: tree.name().to_owned(),
            blackboard: BlackboardDocument::from_blackboard(tree.blackboard()),
            body,
        }
    }

    pub fn instantiate(
        &self,
        registry: &NodeRegistry,
        policy: MissingClassPolicy,
    ) -> Result<BehaviorTree, LoadError> {
        let blackboard = self.blackboard.instantiate(registry);
        let mut builder = BehaviorTreeBuilder::new(&self.name)
            .blackboard(blackboard)
            .root()?;
        if let Some(body) = &self.body {
            let loader = Loader { registry, policy };
            builder = loader.node(builder, body)?.0;
        }
        let tree = builder.build()?;
        debug!("instantiated tree `{}`", tree.name());
        Ok(tree)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl BlackboardDocument {
    fn from_blackboard(blackboard: &Blackboard) -> Self {
        fn sorted<V: Clone>(values: &std::collections::HashMap<String, V>) -> BTreeMap<String, V> {
            values.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        }
        Self {
            class: blackboard.name().to_owned(),
            bools: sorted(blackboard.bool_values()),
            ints: sorted(blackboard.int_values()),
            floats: sorted(blackboard.float_values()),
            strings: sorted(blackboard.string_values()),
        }
    }

    /// A registered class is instantiated through its factory; any other
    /// class name becomes an empty blackboard of that name.
    fn instantiate(&self, registry: &NodeRegistry) -> Blackboard {
        let mut blackboard = if self.class.is_empty() {
            Blackboard::default()
        } else {
            registry
                .create_blackboard(&self.class)
                .unwrap_or_else(|_| Blackboard::new(self.class.clone()))
        };
        for (key, value) in &self.bools {
            blackboard.create_bool(key.clone(), *value);
        }
        for (key, value) in &self.ints {
            blackboard.create_int(key.clone(), *value);
        }
        for (key, value) in &self.floats {
            blackboard.create_float(key.clone(), *value);
        }
        for (key, value) in &self.strings {
            blackboard.create_string(key.clone(), value.clone());
        }
        blackboard
    }
}

impl NodeDocument {
    fn from_node(node: &Node) -> Self {
        let name = node.name().to_owned();
        let class = node.class().unwrap_or(node.name()).to_owned();
        let conditions = node
            .conditions()
            .iter()
            .map(ConditionDocument::from_condition)
            .collect();
        match node.node_type() {
            NodeType::Decorator => NodeDocument::Decorator {
                name,
                class,
                params: node.params(),
                child: node
                    .children()
                    .first()
                    .map(|child| Box::new(NodeDocument::from_node(child))),
            },
            NodeType::Action => NodeDocument::Action {
                name,
                class,
                params: node.params(),
                conditions,
            },
            // Roots never nest, so anything else is a composite.
            NodeType::Composite | NodeType::Root | NodeType::Condition => {
                NodeDocument::Composite {
                    name,
                    kind: node.composite_kind().unwrap_or(CompositeKind::Sequence),
                    class: node.class().map(str::to_owned),
                    conditions,
                    children: node.children().iter().map(NodeDocument::from_node).collect(),
                }
            }
        }
    }
}

impl ConditionDocument {
    fn from_condition(condition: &ConditionNode) -> Self {
        Self {
            name: condition.name().to_owned(),
            class: condition.class().unwrap_or(condition.name()).to_owned(),
            priority: condition.priority(),
            params: condition.params(),
        }
    }
}

struct Loader<'a> {
    registry: &'a NodeRegistry,
    policy: MissingClassPolicy,
}

impl Loader<'_> {
    /// Adds `doc` under the builder's current scope. The flag reports whether
    /// a node was actually attached.
    fn node(
        &self,
        builder: BehaviorTreeBuilder,
        doc: &NodeDocument,
    ) -> Result<(BehaviorTreeBuilder, bool), LoadError> {
        match doc {
            NodeDocument::Composite {
                name,
                kind,
                class,
                conditions,
                children,
            } => {
                let builder = builder.open_composite(name.clone(), *kind, class.clone())?;
                // Conditions belong to the composite, so attach them before
                // any child becomes the most recently created node.
                let mut builder = self.conditions(builder, conditions)?;
                for child in children {
                    builder = self.node(builder, child)?.0;
                }
                Ok((builder.end()?, true))
            }
            NodeDocument::Action {
                name,
                class,
                params,
                conditions,
            } => {
                let Some(action) = self.resolve(self.registry.create_action(class, params))? else {
                    return Ok((builder, false));
                };
                let builder = builder.attach_action(name.clone(), action, Some(class.clone()))?;
                Ok((self.conditions(builder, conditions)?, true))
            }
            NodeDocument::Decorator {
                name,
                class,
                params,
                child,
            } => {
                let Some(decorator) =
                    self.resolve(self.registry.create_decorator(class, params))?
                else {
                    return match child {
                        Some(child) => self.node(builder, child),
                        None => Ok((builder, false)),
                    };
                };
                let Some(child) = child else {
                    warn!("decorator `{}` has no child, skipped", name);
                    return Ok((builder, false));
                };
                let builder = builder.stage_decorator(name.clone(), decorator, Some(class.clone()))?;
                let (mut builder, attached) = self.node(builder, child)?;
                if !attached {
                    if let Some(name) = builder.discard_pending() {
                        warn!("decorator `{}` lost its child, skipped", name);
                    }
                }
                Ok((builder, attached))
            }
        }
    }

    fn conditions(
        &self,
        mut builder: BehaviorTreeBuilder,
        docs: &[ConditionDocument],
    ) -> Result<BehaviorTreeBuilder, LoadError> {
        for doc in docs {
            let created = self.registry.create_condition(&doc.class, &doc.params);
            if let Some(condition) = self.resolve(created)? {
                builder = builder.attach_condition(
                    doc.priority,
                    doc.name.clone(),
                    condition,
                    Some(doc.class.clone()),
                )?;
            }
        }
        Ok(builder)
    }

    fn resolve<T>(&self, created: Result<T, RegistryError>) -> Result<Option<T>, LoadError> {
        match created {
            Ok(value) => Ok(Some(value)),
            Err(err) => match self.policy {
                MissingClassPolicy::Skip => {
                    warn!("{}, node skipped", err);
                    Ok(None)
                }
                MissingClassPolicy::Abort => Err(err.into()),
            },
        }
    }
}
