//! Configuration system.
//!
//! Loads game configuration from JSON strings/files. Every field has a
//! default, so a config file only needs the values it overrides.

use std::{path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Root configuration for the game client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    /// Ground distance covered per frame while not aiming.
    #[serde(default = "default_normal_speed")]
    pub normal_speed: f32,
    /// Ground distance covered per frame while aiming. Must stay below `normal_speed`.
    #[serde(default = "default_aim_speed")]
    pub aim_speed: f32,
    /// Delay between the `draw` one-shot and the looping aim clip.
    #[serde(default = "default_draw_delay_ms")]
    pub draw_delay_ms: u64,
    /// Delay between the `aim-recoil` one-shot and the looping idle clip.
    #[serde(default = "default_recoil_delay_ms")]
    pub recoil_delay_ms: u64,
    /// Target presentation rate of the headless runner.
    #[serde(default = "default_frame_hz")]
    pub frame_hz: u32,
    /// Directories searched, in order, for the model descriptor.
    #[serde(default = "default_asset_dirs")]
    pub asset_dirs: Vec<String>,
    /// File name of the model descriptor inside an asset directory.
    #[serde(default = "default_model_file")]
    pub model_file: String,
}

fn default_normal_speed() -> f32 {
    0.1
}

fn default_aim_speed() -> f32 {
    0.05
}

fn default_draw_delay_ms() -> u64 {
    1000
}

fn default_recoil_delay_ms() -> u64 {
    500
}

fn default_frame_hz() -> u32 {
    60
}

fn default_asset_dirs() -> Vec<String> {
    vec!["assets".to_string(), "public/assets".to_string()]
}

fn default_model_file() -> String {
    "archer.model.json".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            normal_speed: default_normal_speed(),
            aim_speed: default_aim_speed(),
            draw_delay_ms: default_draw_delay_ms(),
            recoil_delay_ms: default_recoil_delay_ms(),
            frame_hz: default_frame_hz(),
            asset_dirs: default_asset_dirs(),
            model_file: default_model_file(),
        }
    }
}

impl GameConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads, parses and validates a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = Self::from_json_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the invariants the controller relies on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.aim_speed > 0.0) {
            bail!("aim_speed must be positive, got {}", self.aim_speed);
        }
        if !(self.aim_speed < self.normal_speed) {
            bail!(
                "aim_speed ({}) must be below normal_speed ({})",
                self.aim_speed,
                self.normal_speed
            );
        }
        if self.frame_hz == 0 {
            bail!("frame_hz must be non-zero");
        }
        Ok(())
    }

    pub fn draw_delay(&self) -> Duration {
        Duration::from_millis(self.draw_delay_ms)
    }

    pub fn recoil_delay(&self) -> Duration {
        Duration::from_millis(self.recoil_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_hz.max(1)))
    }
}
