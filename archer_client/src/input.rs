//! Input handling.
//!
//! The host delivers key presses and releases as they happen; the tracker
//! keeps the latest pressed/released flag per key and derives the movement
//! direction on demand. Key names are lowercased when written, so `W` and
//! `w` are the same key.

use std::collections::HashMap;

use archer_shared::{event::InputEvent, math::Vec2};

pub const KEY_FORWARD: &str = "w";
pub const KEY_BACK: &str = "s";
pub const KEY_LEFT: &str = "a";
pub const KEY_RIGHT: &str = "d";

/// Pressed/released state for every key seen so far.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    keys: HashMap<String, bool>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: &str) {
        self.keys.insert(key.to_lowercase(), true);
    }

    pub fn release(&mut self, key: &str) {
        self.keys.insert(key.to_lowercase(), false);
    }

    /// Releases every key, e.g. when the host loses focus.
    pub fn clear(&mut self) {
        self.keys.values_mut().for_each(|down| *down = false);
    }

    /// Applies a keyboard event. Pointer events are not key state and are ignored.
    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.press(key),
            InputEvent::KeyUp(key) => self.release(key),
            InputEvent::FocusLost => self.clear(),
            InputEvent::PointerDown(_) => {}
        }
    }

    /// Keys never seen read as released.
    pub fn is_key_down(&self, key: &str) -> bool {
        self.keys.get(&key.to_lowercase()).copied().unwrap_or(false)
    }

    /// Unit ground direction from WASD, or zero when nothing (or only
    /// opposing pairs) is held.
    pub fn movement_direction(&self) -> Vec2 {
        let axis = |pos: &str, neg: &str| {
            i8::from(self.is_key_down(pos)) - i8::from(self.is_key_down(neg))
        };
        let raw = Vec2::new(
            f32::from(axis(KEY_RIGHT, KEY_LEFT)),
            f32::from(axis(KEY_FORWARD, KEY_BACK)),
        );
        raw.normalize_or_zero()
    }

    /// Keys currently held, sorted. Used by the status command.
    pub fn held_keys(&self) -> Vec<&str> {
        let mut held: Vec<&str> = self
            .keys
            .iter()
            .filter(|(_, down)| **down)
            .map(|(k, _)| k.as_str())
            .collect();
        held.sort_unstable();
        held
    }
}
