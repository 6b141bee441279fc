//! `archer_client`
//!
//! Client-side systems:
//! - Input tracking (key state and movement direction)
//! - The archer character: movement, stance toggling, clip selection
//! - Deferred clip transitions on the character clock
//! - The frame loop that wires input, assets and the scene together

pub mod anim;
pub mod character;
pub mod game;
pub mod input;
pub mod timers;

pub use character::{Archer, Character};
pub use game::Game;
