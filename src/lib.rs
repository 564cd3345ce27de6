//! Arena Raid - top-down arena shooter simulation core
//!
//! Core modules:
//! - `sim`: Fixed-step gameplay simulation (entities, combat, NPC AI, waves)
//! - `settings`: Immutable game configuration, loaded once at startup
//! - `highscores`: Score table contract and a JSON-file-backed leaderboard
//!
//! Rendering, input devices and UI screens live outside this crate. The host
//! feeds a [`sim::TickInput`] and a [`sim::TickTime`] into [`sim::tick`] once per
//! frame and pulls drawables and visual effects back out.

pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use highscores::{HighScores, ScoreEntry, ScoreStore};
pub use settings::{ChasePolicy, Settings};

use glam::Vec2;

/// Game configuration constants that are not worth exposing as settings
pub mod consts {
    /// Nominal frame step (60 Hz, the rate the default tuning assumes)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Frame step in whole milliseconds, for hosts that advance a fake clock
    pub const SIM_DT_MS: u64 = 16;

    /// Default facing for anything that has not moved yet (screen "down")
    pub const DEFAULT_FACING: glam::Vec2 = glam::Vec2::new(0.0, 1.0);

    /// Distance under which an NPC counts as having reached its waypoint
    pub const WAYPOINT_REACHED: f32 = 6.0;

    /// Slack added to the body-contact melee range of an unarmed NPC
    pub const UNARMED_REACH_SLACK: f32 = 5.0;

    /// Shortest cooldown a weapon can have, whatever its fire rate says
    pub const MIN_COOLDOWN_MS: u64 = 1;
}

/// Normalize a direction, falling back to `fallback` for a zero vector
#[inline]
pub fn direction_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let n = v.normalize_or_zero();
    if n == Vec2::ZERO { fallback } else { n }
}

/// Movement axis (-1/0/1 per axis) to a unit direction, or zero when idle
#[inline]
pub fn axis_to_direction(x: i8, y: i8) -> Vec2 {
    Vec2::new(x.signum() as f32, y.signum() as f32).normalize_or_zero()
}

/// True when the x component dominates the direction (ties go to y)
#[inline]
pub fn is_horizontal(dir: Vec2) -> bool {
    dir.x.abs() > dir.y.abs()
}
