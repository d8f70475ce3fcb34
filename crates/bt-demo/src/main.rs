//! Behavior tree demo binary.
//!
//! Composition root that wires a node registry, spawns a few melee enemies
//! into a [`Forest`] and drives it frame by frame.
//!
//! # Examples
//!
//! ```bash
//! # Built-in melee tree, 30 frames
//! BT_DEMO_FRAMES=30 cargo run -p bt-demo
//!
//! # Tree loaded from a document
//! BT_DEMO_TREE=crates/bt-demo/trees/melee.json RUST_LOG=behavior_tree=debug cargo run -p bt-demo
//! ```
mod config;
mod nodes;

use std::sync::Arc;

use anyhow::{Context, Result};
use behavior_tree::{BehaviorTree, Forest, MissingClassPolicy, NodeRegistry, TreeDocument};

use config::DemoConfig;
use nodes::{DISTANCE, Enemy, FrameClock, STAMINA};

const ENEMY_COUNT: usize = 2;
const FRAME_SECS: f64 = 0.25;
const STAMINA_REGEN: f32 = 5.0;
const STAMINA_MAX: f32 = 50.0;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = DemoConfig::from_env();
    let clock = FrameClock::new(FRAME_SECS);

    let mut registry = NodeRegistry::with_builtins();
    nodes::register(&mut registry, &clock);

    let mut forest = Forest::new();
    let mut enemies = Vec::with_capacity(ENEMY_COUNT);
    let mut ids = Vec::with_capacity(ENEMY_COUNT);

    for index in 0..ENEMY_COUNT {
        let mut tree = spawn_tree(&config, &registry, &clock)?;
        let distance = config.start_distance * (index + 1) as f32;
        tree.blackboard_mut().create_float(DISTANCE, distance);

        let enemy = Arc::new(Enemy {
            name: format!("Enemy {}", index + 1),
        });
        tree.set_owner(&enemy);
        enemies.push(enemy);

        let id = match &config.tree {
            Some(path) => forest.add_with_source(tree, path),
            None => forest.add(tree),
        };
        ids.push(id);
    }

    tracing::info!(
        "Simulating {} frames for {} trees",
        config.frames,
        forest.len()
    );
    forest.root_start();

    for frame in 1..=config.frames {
        clock.advance();
        forest.root_tick();

        for &id in &ids {
            let Some(tree) = forest.get_mut(id) else {
                continue;
            };
            regenerate_stamina(tree)?;
            tracing::info!(
                "frame {:>3} {}: distance {:.1}, path {:?}",
                frame,
                tree.name(),
                tree.blackboard().float_value(DISTANCE),
                tree.active_path()
            );
        }
    }

    forest.root_clear();
    drop(enemies);
    Ok(())
}

fn spawn_tree(
    config: &DemoConfig,
    registry: &NodeRegistry,
    clock: &FrameClock,
) -> Result<BehaviorTree> {
    match &config.tree {
        Some(path) => {
            let document = TreeDocument::load(path)
                .with_context(|| format!("failed to read tree document {}", path.display()))?;
            Ok(document.instantiate(registry, MissingClassPolicy::Skip)?)
        }
        None => Ok(nodes::melee_tree("MeleeEnemy", config.approach_step, clock)?),
    }
}

/// Host-side write between ticks, so reactive guards see a changed frame.
fn regenerate_stamina(tree: &mut BehaviorTree) -> Result<()> {
    let blackboard = tree.blackboard_mut();
    if !blackboard.has_float(STAMINA) {
        return Ok(());
    }
    let stamina = (blackboard.float_value(STAMINA) + STAMINA_REGEN).min(STAMINA_MAX);
    blackboard.set_float(STAMINA, stamina)?;
    Ok(())
}
