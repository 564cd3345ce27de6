//! Game settings
//!
//! One immutable [`Settings`] value is built at startup (defaults, or a JSON
//! file) and handed to every component that needs tuning numbers. Nothing
//! reads configuration from global state.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What a chasing NPC does once the player leaves its detection radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChasePolicy {
    /// Once aggroed, chase until one side dies
    #[default]
    Sticky,
    /// Drop back to patrol the moment the player is out of detection range
    Revert,
}

impl ChasePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChasePolicy::Sticky => "sticky",
            ChasePolicy::Revert => "revert",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sticky" => Some(ChasePolicy::Sticky),
            "revert" | "reset" => Some(ChasePolicy::Revert),
            _ => None,
        }
    }
}

/// Tiled world: a grid of equally sized rooms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub room_width: f32,
    pub room_height: f32,
    pub room_cols: u32,
    pub room_rows: u32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            room_width: 1280.0,
            room_height: 720.0,
            room_cols: 3,
            room_rows: 3,
        }
    }
}

impl WorldSettings {
    pub fn width(&self) -> f32 {
        self.room_width * self.room_cols as f32
    }

    pub fn height(&self) -> f32 {
        self.room_height * self.room_rows as f32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub radius: f32,
    /// Pixels per second
    pub speed: f32,
    pub health: i32,
    /// Spawn point (center of the first room by default)
    pub start: Vec2,
    /// Weapon key equipped on spawn
    pub starting_weapon: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            radius: 15.0,
            speed: 240.0,
            health: 100,
            start: Vec2::new(640.0, 360.0),
            starting_weapon: "pistol".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcSettings {
    pub size: Vec2,
    /// Base speed in pixels per second
    pub speed: f32,
    pub health: i32,
    pub detection_radius: f32,
    /// Patrol waypoints, relative to the spawn point
    pub patrol_offsets: Vec<Vec2>,
    /// Pause at a reached waypoint, uniform in [min, max] milliseconds
    pub patrol_pause_ms: (u64, u64),
    /// Patrol speed multiplier range, rolled every patrol step
    pub patrol_speed_jitter: (f32, f32),
    pub chase_policy: ChasePolicy,
    /// Probability that a dying NPC drops a health pack
    pub drop_chance: f64,
    /// Weapon key every NPC carries
    pub weapon: String,
}

impl Default for NpcSettings {
    fn default() -> Self {
        Self {
            size: Vec2::new(30.0, 30.0),
            speed: 120.0,
            health: 50,
            detection_radius: 150.0,
            patrol_offsets: vec![
                Vec2::ZERO,
                Vec2::new(150.0, 60.0),
                Vec2::new(300.0, -80.0),
                Vec2::new(80.0, 170.0),
            ],
            patrol_pause_ms: (600, 1800),
            patrol_speed_jitter: (0.9, 1.12),
            chase_policy: ChasePolicy::Sticky,
            drop_chance: 0.25,
            weapon: "knife".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    pub size: Vec2,
    /// Distance after which a bullet is discarded
    pub max_range: f32,
    /// Gap between the wielder's body edge and a fresh projectile
    pub spawn_offset: f32,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            size: Vec2::new(10.0, 5.0),
            max_range: 300.0,
            spawn_offset: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeSettings {
    /// Hit-box short side as a multiple of the wielder's body radius
    pub thickness_factor: f32,
    pub visual_ms: u64,
}

impl Default for MeleeSettings {
    fn default() -> Self {
        Self {
            thickness_factor: 1.5,
            visual_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenadeSettings {
    pub fuse_ms: u64,
    pub explosion_radius: f32,
    pub damage: i32,
    /// Pixels per second
    pub throw_speed: f32,
    /// A grenade comes to rest after covering this distance
    pub max_throw_distance: f32,
    pub visual_ms: u64,
}

impl Default for GrenadeSettings {
    fn default() -> Self {
        Self {
            fuse_ms: 3000,
            // 5% of the average screen dimension
            explosion_radius: 50.0,
            damage: 75,
            throw_speed: 420.0,
            max_throw_distance: 320.0,
            visual_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    /// Delay before the very first wave
    pub initial_delay_ms: u64,
    /// Rest between the last kill of a wave and the next wave
    pub rest_ms: u64,
    /// Sizes of waves 1 and 2; every later wave is the sum of the previous two
    pub fib_seeds: (u32, u32),
    pub min_spawn_distance: f32,
    pub spawn_attempts: u32,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            rest_ms: 3000,
            fib_seeds: (8, 13),
            min_spawn_distance: 150.0,
            spawn_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupSettings {
    pub size: Vec2,
    pub heal: i32,
    /// Drop one health pack somewhere in the world when a wave starts
    pub pack_per_wave: bool,
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            size: Vec2::new(20.0, 20.0),
            heal: 25,
            pack_per_wave: true,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WorldSettings,
    pub player: PlayerSettings,
    pub npc: NpcSettings,
    pub projectile: ProjectileSettings,
    pub melee: MeleeSettings,
    pub grenade: GrenadeSettings,
    pub wave: WaveSettings,
    pub pickup: PickupSettings,
}

impl Settings {
    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
