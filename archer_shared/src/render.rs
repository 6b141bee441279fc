//! Scene and animation abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! The engine that owns the scene graph, meshes and skeletal playback sits
//! behind these traits; the game only tells it where the character is and
//! which clip to start.

use tracing::{debug, info};

use crate::math::Vec3;

/// A minimal scene API.
pub trait SceneBackend: Send {
    fn begin_frame(&mut self);
    fn set_character_position(&mut self, position: Vec3);
    /// Shows or hides the stand-in shape drawn until the model is ready.
    fn set_placeholder_visible(&mut self, visible: bool);
    fn end_frame(&mut self);
}

/// Skeletal clip playback, keyed by clip name.
pub trait AnimationBackend: Send {
    fn start_clip(&mut self, clip: &str, looping: bool);
}

/// A no-op scene useful for headless tests.
#[derive(Default)]
pub struct NullScene;

impl SceneBackend for NullScene {
    fn begin_frame(&mut self) {}
    fn set_character_position(&mut self, _position: Vec3) {}
    fn set_placeholder_visible(&mut self, _visible: bool) {}
    fn end_frame(&mut self) {}
}

/// A no-op animator.
#[derive(Default)]
pub struct NullAnimator;

impl AnimationBackend for NullAnimator {
    fn start_clip(&mut self, _clip: &str, _looping: bool) {}
}

/// Headless scene that reports what a real engine would draw.
#[derive(Default)]
pub struct LogScene {
    frames: u64,
    position: Vec3,
}

impl LogScene {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl SceneBackend for LogScene {
    fn begin_frame(&mut self) {}

    fn set_character_position(&mut self, position: Vec3) {
        if position != self.position {
            debug!(x = position.x, y = position.y, z = position.z, "Character moved");
        }
        self.position = position;
    }

    fn set_placeholder_visible(&mut self, visible: bool) {
        info!(visible, "Placeholder visibility");
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}

/// Headless animator that logs clip starts.
#[derive(Default)]
pub struct LogAnimator;

impl AnimationBackend for LogAnimator {
    fn start_clip(&mut self, clip: &str, looping: bool) {
        info!(clip, looping, "Clip started");
    }
}
