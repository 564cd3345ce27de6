//! Shared entity data: identity, placement and health
//!
//! Players, NPCs and projectiles each embed a [`Body`]. Health only moves
//! through [`Body::take_damage`] and [`Body::heal`], which keep it inside
//! `[0, max_health]` and flip `alive` exactly once.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;

/// Stable identity of a simulated entity (never reused within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The role groups an entity can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Player,
    Npc,
    Projectile,
}

/// What a damage application did to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was already dead
    Ignored,
    Wounded { remaining: i32 },
    /// This hit brought health to zero
    Killed,
}

/// Position, footprint and health of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: EntityId,
    /// World-space center
    pub pos: Vec2,
    pub size: Vec2,
    health: i32,
    max_health: i32,
    alive: bool,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, size: Vec2, max_health: i32) -> Self {
        let max_health = max_health.max(1);
        Self {
            id,
            pos,
            size,
            health: max_health,
            max_health,
            alive: true,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn health_fraction(&self) -> f32 {
        self.health as f32 / self.max_health as f32
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Reduce health; negative amounts count as zero
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }
        self.health = (self.health - amount.max(0)).clamp(0, self.max_health);
        if self.health == 0 {
            self.alive = false;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Wounded {
                remaining: self.health,
            }
        }
    }

    /// Restore health up to the maximum; returns the amount actually restored
    pub fn heal(&mut self, amount: i32) -> i32 {
        if !self.alive {
            return 0;
        }
        let before = self.health;
        self.health = (self.health + amount.max(0)).min(self.max_health);
        self.health - before
    }

    /// Remove without damage (expiry, consumed projectiles)
    pub fn despawn(&mut self) {
        self.alive = false;
    }

    /// Snap the body inside `bounds`
    pub fn clamp_into(&mut self, bounds: &Aabb) {
        self.pos = self.aabb().clamped_into(bounds).center;
    }
}

/// Anything that can receive damage through the combat funnel
pub trait Combatant {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
    fn role(&self) -> Role;

    /// Reaction to a landed hit, called after health has been reduced
    fn on_damaged(&mut self) {}
}
