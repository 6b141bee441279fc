//! Animation clips and playback bookkeeping.
//!
//! `select_clip` is the per-frame decision table; `ClipPlayer` sits in front
//! of the engine's animator and makes clip starts idempotent and gated on
//! asset readiness.

use archer_shared::{math::Vec2, render::AnimationBackend, resources::AssetLoadState};
use tracing::debug;

/// The archer's pre-authored clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Idle,
    Draw,
    AimOverdraw,
    AimRecoil,
    AimWalkForward,
    AimWalkBack,
    AimWalkLeft,
    AimWalkRight,
}

impl Clip {
    pub const ALL: [Clip; 8] = [
        Clip::Idle,
        Clip::Draw,
        Clip::AimOverdraw,
        Clip::AimRecoil,
        Clip::AimWalkForward,
        Clip::AimWalkBack,
        Clip::AimWalkLeft,
        Clip::AimWalkRight,
    ];

    /// Asset-side name of the clip.
    pub fn name(self) -> &'static str {
        match self {
            Clip::Idle => "idle",
            Clip::Draw => "draw",
            Clip::AimOverdraw => "aim-overdraw",
            Clip::AimRecoil => "aim-recoil",
            Clip::AimWalkForward => "aim-walk-forward",
            Clip::AimWalkBack => "aim-walk-back",
            Clip::AimWalkLeft => "aim-walk-left",
            Clip::AimWalkRight => "aim-walk-right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// `draw` and `aim-recoil` play once; everything else loops.
    pub fn looping(self) -> bool {
        !matches!(self, Clip::Draw | Clip::AimRecoil)
    }
}

impl std::fmt::Display for Clip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Clip the character should be showing this frame, if any.
///
/// While aiming the axes are checked forward, back, left, right, and the
/// first non-zero one wins. Walking without aiming has no clip of its own,
/// so `None` is returned and whatever is playing stays.
pub fn select_clip(aiming: bool, dir: Vec2) -> Option<Clip> {
    if aiming {
        let clip = if dir.z > 0.0 {
            Clip::AimWalkForward
        } else if dir.z < 0.0 {
            Clip::AimWalkBack
        } else if dir.x < 0.0 {
            Clip::AimWalkLeft
        } else if dir.x > 0.0 {
            Clip::AimWalkRight
        } else {
            Clip::AimOverdraw
        };
        Some(clip)
    } else if dir.is_zero() {
        Some(Clip::Idle)
    } else {
        None
    }
}

/// Front for the engine animator.
pub struct ClipPlayer<A> {
    backend: A,
    assets: AssetLoadState,
    current: Option<Clip>,
}

impl<A: AnimationBackend> ClipPlayer<A> {
    pub fn new(backend: A) -> Self {
        Self {
            backend,
            assets: AssetLoadState::pending(),
            current: None,
        }
    }

    pub fn set_assets(&mut self, assets: AssetLoadState) {
        self.assets.absorb(assets);
    }

    pub fn assets(&self) -> &AssetLoadState {
        &self.assets
    }

    pub fn is_ready(&self) -> bool {
        self.assets.is_ready()
    }

    pub fn current(&self) -> Option<Clip> {
        self.current
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    /// Starts `clip` unless it is already playing, the assets are not ready,
    /// or the model lacks it. Returns whether the engine was told to start.
    pub fn play(&mut self, clip: Clip) -> bool {
        if !self.assets.is_ready() {
            return false;
        }
        if self.current == Some(clip) {
            return false;
        }
        if !self.assets.has_clip(clip.name()) {
            debug!(clip = clip.name(), "Model has no such clip");
            return false;
        }
        debug!(clip = clip.name(), from = ?self.current, "Switching clip");
        self.backend.start_clip(clip.name(), clip.looping());
        self.current = Some(clip);
        true
    }
}
