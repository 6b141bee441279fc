//! Fixtures shared by the scenario tests.

use std::time::Duration;

use archer_client::{anim::Clip, Archer, Game};
use archer_shared::{
    config::GameConfig,
    render::{AnimationBackend, NullScene},
    resources::{AssetLoader, LoadedModel},
};
use async_trait::async_trait;

/// One presented frame at 50 Hz; divides the default delays exactly.
pub const FRAME: Duration = Duration::from_millis(20);

pub type TestGame = Game<NullScene, Archer<RecordingAnimator>>;

/// Animator that remembers every clip start.
#[derive(Debug, Default)]
pub struct RecordingAnimator {
    pub starts: Vec<(String, bool)>,
}

impl RecordingAnimator {
    pub fn count(&self, clip: Clip) -> usize {
        self.starts.iter().filter(|(name, _)| name == clip.name()).count()
    }

    pub fn last(&self) -> Option<(&str, bool)> {
        self.starts.last().map(|(name, looping)| (name.as_str(), *looping))
    }
}

impl AnimationBackend for RecordingAnimator {
    fn start_clip(&mut self, clip: &str, looping: bool) {
        self.starts.push((clip.to_string(), looping));
    }
}

/// A model that ships every clip.
pub fn full_model() -> LoadedModel {
    LoadedModel {
        name: "archer".into(),
        mesh_path: "assets/archer.glb".into(),
        clips: Clip::ALL.iter().map(|c| c.name().to_string()).collect(),
    }
}

/// Resolves immediately with a fixed model.
pub struct StaticLoader(pub LoadedModel);

#[async_trait]
impl AssetLoader for StaticLoader {
    async fn load_model(&self) -> anyhow::Result<LoadedModel> {
        Ok(self.0.clone())
    }
}

/// Never produces a model.
pub struct FailingLoader;

#[async_trait]
impl AssetLoader for FailingLoader {
    async fn load_model(&self) -> anyhow::Result<LoadedModel> {
        anyhow::bail!("model file not found in any asset directory")
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub fn new_game() -> TestGame {
    let cfg = GameConfig::default();
    let archer = Archer::new(&cfg, RecordingAnimator::default());
    Game::new(cfg, NullScene, archer)
}

/// A game whose model has already finished loading.
pub fn loaded_game() -> TestGame {
    let mut game = new_game();
    game.finish_asset_load(Ok(full_model()));
    game
}

pub fn run(game: &mut TestGame, frames: u32) {
    for _ in 0..frames {
        game.tick(FRAME);
    }
}
