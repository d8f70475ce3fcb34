use behavior_tree::{
    Action, BehaviorTreeBuilder, Blackboard, FloatAtMost, MissingClassPolicy, NodeRegistry,
    NodeStatus, Params, PriorityType, TickContext, TreeDocument,
};

/// Runs until the distance key drops to `Reach`.
struct Approach {
    reach: f32,
}

impl Approach {
    fn from_params(params: &Params) -> Self {
        Self {
            reach: params.float_or("Reach", 0.0),
        }
    }
}

impl Action for Approach {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        if ctx.blackboard().float_value("Distance") <= self.reach {
            NodeStatus::Success
        } else {
            NodeStatus::Running
        }
    }

    fn params(&self) -> Params {
        Params::new().with_float("Reach", self.reach)
    }
}

fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::with_builtins();
    registry.register_action("Approach", Approach::from_params);
    registry.register_blackboard("Enemy", || {
        Blackboard::new("Enemy")
            .with_float("Distance", 0.0)
            .with_bool("Attacked", false)
    });
    registry
}

const ENEMY: &str = r#"{
  "name": "Enemy",
  "blackboard": { "class": "Enemy", "floats": { "Distance": 3.0 } },
  "body": {
    "type": "Composite",
    "name": "Main",
    "kind": "Selector",
    "children": [
      {
        "type": "Action",
        "name": "Strike",
        "class": "SetFlag",
        "params": { "Key": "Attacked", "Value": true },
        "conditions": [
          {
            "name": "InRange",
            "class": "FloatAtMost",
            "priority": "LowerPriority",
            "params": { "Key": "Distance", "Threshold": 1.0 }
          }
        ]
      },
      {
        "type": "Action",
        "name": "Close in",
        "class": "Approach",
        "params": { "Reach": 0.5 }
      }
    ]
  }
}"#;

#[test]
fn enemy_document_runs_until_attack() {
    let doc = TreeDocument::from_json(ENEMY).unwrap();
    let mut tree = doc.instantiate(&registry(), MissingClassPolicy::Abort).unwrap();
    tree.start_tree();

    assert_eq!(tree.tick_tree(), Some(NodeStatus::Running));
    tree.blackboard_mut().set_float("Distance", 2.0).unwrap();
    assert_eq!(tree.tick_tree(), Some(NodeStatus::Running));
    assert!(!tree.blackboard().bool_value("Attacked"));

    // Entering range preempts the approach within the same tick.
    tree.blackboard_mut().set_float("Distance", 1.0).unwrap();
    assert_eq!(tree.tick_tree(), Some(NodeStatus::Success));
    assert!(tree.blackboard().bool_value("Attacked"));

    let strike = &tree.root().unwrap().children()[0].children()[0];
    assert_eq!(strike.class(), Some("SetFlag"));
    assert_eq!(strike.conditions()[0].priority(), PriorityType::LowerPriority);
}

#[test]
fn saved_document_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("enemy.json");

    let original = TreeDocument::from_json(ENEMY).unwrap();
    let tree = original.instantiate(&registry(), MissingClassPolicy::Abort).unwrap();
    TreeDocument::from_tree(&tree).save(&path).unwrap();

    let reloaded = TreeDocument::load(&path).unwrap();
    assert_eq!(reloaded.body, original.body);
    assert_eq!(reloaded.blackboard.class, "Enemy");
    assert_eq!(reloaded.blackboard.floats.get("Distance"), Some(&3.0));
    assert_eq!(reloaded.blackboard.bools.get("Attacked"), Some(&false));

    let mut rebuilt = reloaded.instantiate(&registry(), MissingClassPolicy::Abort).unwrap();
    rebuilt.start_tree();
    assert_eq!(rebuilt.tick_tree(), Some(NodeStatus::Running));
    rebuilt.blackboard_mut().set_float("Distance", 0.5).unwrap();
    assert_eq!(rebuilt.tick_tree(), Some(NodeStatus::Success));
}

#[test]
fn programmatic_tree_records_names_as_classes() {
    let tree = BehaviorTreeBuilder::new("Sentry")
        .root()
        .unwrap()
        .sequence("Main")
        .unwrap()
        .condition(PriorityType::SelfBranch, "FloatAtMost", FloatAtMost::new("Distance", 4.0))
        .unwrap()
        .end()
        .unwrap()
        .build()
        .unwrap();

    let json = TreeDocument::from_tree(&tree).to_json().unwrap();
    assert!(json.contains("\"priority\": \"Self\""));
    assert!(json.contains("\"class\": \"FloatAtMost\""));

    let rebuilt = TreeDocument::from_json(&json)
        .unwrap()
        .instantiate(&registry(), MissingClassPolicy::Abort)
        .unwrap();
    let main = &rebuilt.root().unwrap().children()[0];
    assert_eq!(main.conditions()[0].params().float_or("Threshold", 0.0), 4.0);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TreeDocument::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, behavior_tree::LoadError::Io(_)));
}
