//! Demo configuration loaded from the environment.
use std::env;
use std::path::PathBuf;

/// Settings for one demo run.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    /// Frames to simulate before tearing the forest down.
    pub frames: u32,
    /// Distance between the first enemy and the player at spawn.
    pub start_distance: f32,
    /// Distance an enemy covers per frame while moving.
    pub approach_step: f32,
    /// Tree document to load instead of the built-in melee tree.
    pub tree: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 20,
            start_distance: 6.0,
            approach_step: 1.0,
            tree: None,
        }
    }
}

impl DemoConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `BT_DEMO_FRAMES`
    /// - `BT_DEMO_START_DISTANCE` / `BT_DEMO_APPROACH_STEP`
    /// - `BT_DEMO_TREE`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(frames) = read_env::<u32>("BT_DEMO_FRAMES") {
            config.frames = frames;
        }

        if let Some(distance) = read_env::<f32>("BT_DEMO_START_DISTANCE") {
            config.start_distance = distance.max(0.0);
        }

        if let Some(step) = read_env::<f32>("BT_DEMO_APPROACH_STEP") {
            config.approach_step = step.max(0.1);
        }

        config.tree = read_env::<PathBuf>("BT_DEMO_TREE");

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
