//! `archer_shared`
//!
//! Shared libraries used by the client and its tests.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (math, config, events, scene, assets).
//! - Traits at the engine seams so everything runs headless.
//! - No `unsafe`.

pub mod config;
pub mod console;
pub mod event;
pub mod math;
pub mod render;
pub mod resources;
