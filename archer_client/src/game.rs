//! Game loop and bootstrap.
//!
//! The game owns:
//! - The scene backend (whatever engine presents the frame)
//! - One input tracker and one player character, created once
//! - The queue of host input events, applied at the start of each tick
//! - The in-flight model load and the resources it produced
//! - The developer console

use std::time::Duration;

use anyhow::{bail, Context};
use archer_shared::{
    config::GameConfig,
    console::{Console, CvarFlags, CvarValue},
    event::{EventBus, InputEvent, PointerButton},
    render::SceneBackend,
    resources::{AssetLoadState, AssetLoader, Handle, LoadedModel, ResourceManager},
};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::{character::Character, input::InputTracker};

/// Lifecycle of the character model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// No load has been started.
    NotRequested,
    Loading,
    Ready,
    /// The load failed; the placeholder stays for the rest of the session.
    Failed,
}

/// Frame loop around one player character.
pub struct Game<S, C> {
    pub cfg: GameConfig,
    pub console: Console,

    scene: S,
    input: InputTracker,
    character: C,
    events: EventBus,

    resources: ResourceManager,
    model: Option<Handle<LoadedModel>>,
    pending_load: Option<oneshot::Receiver<anyhow::Result<LoadedModel>>>,
    asset_status: AssetStatus,

    frame: u64,
    quit_requested: bool,
}

impl<S: SceneBackend, C: Character> Game<S, C> {
    pub fn new(cfg: GameConfig, mut scene: S, character: C) -> Self {
        let mut console = Console::new();
        Self::register_cvars(&mut console, &cfg);

        scene.set_placeholder_visible(true);
        scene.set_character_position(character.transform());
        info!(normal_speed = cfg.normal_speed, aim_speed = cfg.aim_speed, "Game created");

        Self {
            cfg,
            console,
            scene,
            input: InputTracker::new(),
            character,
            events: EventBus::default(),
            resources: ResourceManager::default(),
            model: None,
            pending_load: None,
            asset_status: AssetStatus::NotRequested,
            frame: 0,
            quit_requested: false,
        }
    }

    fn register_cvars(console: &mut Console, cfg: &GameConfig) {
        console.register_cvar(
            "g_normal_speed",
            CvarValue::Float(f64::from(cfg.normal_speed)),
            "Ground distance per frame while standing",
            CvarFlags::ARCHIVE | CvarFlags::READ_ONLY,
        );
        console.register_cvar(
            "g_aim_speed",
            CvarValue::Float(f64::from(cfg.aim_speed)),
            "Ground distance per frame while aiming",
            CvarFlags::ARCHIVE | CvarFlags::READ_ONLY,
        );
        console.register_cvar(
            "g_model",
            CvarValue::String(String::new()),
            "Loaded character model",
            CvarFlags::READ_ONLY,
        );
        console.register_cvar(
            "cl_showpos",
            CvarValue::Bool(false),
            "Log the character position every frame",
            CvarFlags::NONE,
        );
    }

    pub fn character(&self) -> &C {
        &self.character
    }

    pub fn input(&self) -> &InputTracker {
        &self.input
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn asset_status(&self) -> AssetStatus {
        self.asset_status
    }

    /// The loaded model, once the load has finished.
    pub fn model(&self) -> Option<std::sync::Arc<LoadedModel>> {
        self.model.as_ref().and_then(|h| self.resources.get(h))
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Queues a host input event for the next tick.
    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Starts loading the character model in the background.
    ///
    /// Must be called from within a tokio runtime. The result is picked up by
    /// a later `tick`.
    pub fn start_asset_load<L: AssetLoader + 'static>(&mut self, loader: L) {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = loader.load_model().await;
            // The game may have been dropped meanwhile.
            let _ = tx.send(result);
        });
        self.pending_load = Some(rx);
        self.asset_status = AssetStatus::Loading;
        info!("Asset load started");
    }

    /// Applies the outcome of a model load.
    pub fn finish_asset_load(&mut self, result: anyhow::Result<LoadedModel>) {
        match result {
            Ok(model) => {
                info!(model = %model.name, mesh = %model.mesh_path.display(), clips = model.clips.len(), "Character model ready");
                let ready = AssetLoadState::from_model(&model);
                self.console.publish("g_model", CvarValue::String(model.name.clone()));
                self.model = Some(self.resources.insert(model));
                self.asset_status = AssetStatus::Ready;
                self.scene.set_placeholder_visible(false);
                self.character.on_assets_ready(ready);
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Asset load failed; keeping placeholder");
                self.asset_status = AssetStatus::Failed;
            }
        }
    }

    fn poll_assets(&mut self) {
        let Some(rx) = self.pending_load.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.pending_load = None;
                self.finish_asset_load(result);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => {
                self.pending_load = None;
                self.finish_asset_load(Err(anyhow::anyhow!("asset load task ended without a result")));
            }
        }
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown(PointerButton::Secondary) => {
                self.character.on_secondary_action();
            }
            InputEvent::PointerDown(button) => {
                debug!(?button, "Pointer button has no binding");
            }
            other => self.input.apply(&other),
        }
    }

    /// Advances one presented frame.
    pub fn tick(&mut self, dt: Duration) {
        for event in self.events.drain::<InputEvent>() {
            self.handle_input(event);
        }

        self.poll_assets();
        self.character.update(&self.input, dt);

        let position = self.character.transform();
        self.scene.begin_frame();
        self.scene.set_character_position(position);
        self.scene.end_frame();
        self.frame += 1;

        if self.console.get_cvar("cl_showpos").is_some_and(|v| v.as_bool()) {
            info!(frame = self.frame, x = position.x, y = position.y, z = position.z, "Position");
        }
    }

    fn status(&self) -> Vec<String> {
        let pos = self.character.transform();
        let clip = self
            .character
            .current_clip()
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        vec![
            format!("Frame: {}", self.frame),
            format!("Position: ({:.3}, {:.3}, {:.3})", pos.x, pos.y, pos.z),
            format!("Aiming: {}", self.character.is_aiming()),
            format!("Clip: {}", clip),
            format!("Assets: {:?}", self.asset_status),
            format!("Held keys: {}", self.input.held_keys().join(" ")),
        ]
    }

    /// Executes a console line.
    ///
    /// Input commands are queued exactly like host events and take effect on
    /// the next tick.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = tokens.first() else {
            return Ok(Vec::new());
        };

        match cmd {
            "press" => {
                let key = tokens.get(1).context("usage: press <key>")?;
                self.push_event(InputEvent::KeyDown((*key).to_string()));
                Ok(Vec::new())
            }
            "release" => match tokens.get(1) {
                Some(&"all") => {
                    self.push_event(InputEvent::FocusLost);
                    Ok(Vec::new())
                }
                Some(key) => {
                    self.push_event(InputEvent::KeyUp((*key).to_string()));
                    Ok(Vec::new())
                }
                None => bail!("usage: release <key|all>"),
            },
            "click" => {
                let name = tokens.get(1).copied().unwrap_or("secondary");
                let Some(button) = PointerButton::parse(name) else {
                    bail!("unknown pointer button: {}", name);
                };
                self.push_event(InputEvent::PointerDown(button));
                Ok(Vec::new())
            }
            "status" => Ok(self.status()),
            "help" => {
                let mut out = vec![
                    "Game commands: press <key>, release <key|all>, click [button], status, quit".to_string(),
                ];
                out.push(format!("Console commands: {}", self.console.command_names().join(", ")));
                Ok(out)
            }
            "quit" | "exit" => {
                self.quit_requested = true;
                Ok(vec!["Quitting".to_string()])
            }
            _ => self.console.exec(line),
        }
    }
}
