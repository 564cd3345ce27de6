//! Projectiles and grenades
//!
//! A bullet flies straight until it hits an NPC, leaves the world or runs out
//! of range. A grenade is a projectile carrying a [`GrenadeCharge`]: it flies
//! until its throw distance is spent, rests, and explodes on fuse or on first
//! NPC contact. The explosion itself is resolved by the entity manager, which
//! owns the NPC set.

use glam::Vec2;

use super::entity::{Body, Combatant, EntityId, Role};
use super::geometry::Aabb;
use super::tick::TickTime;
use super::weapon::{GrenadeStats, RangedStats};
use crate::consts::DEFAULT_FACING;
use crate::direction_or;
use crate::settings::ProjectileSettings;

/// Explosive state of a grenade
#[derive(Debug, Clone, PartialEq)]
pub struct GrenadeCharge {
    pub fuse_ms: u64,
    pub armed_at_ms: u64,
    pub explosion_radius: f32,
    pub explosion_damage: i32,
    /// Who threw it
    pub owner: EntityId,
    /// Set once the throw distance is used up
    pub resting: bool,
    detonated: bool,
}

impl GrenadeCharge {
    pub fn fuse_elapsed(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.armed_at_ms) >= self.fuse_ms
    }

    pub fn is_detonated(&self) -> bool {
        self.detonated
    }

    /// Flip the detonated flag; true only for the first caller
    pub fn detonate(&mut self) -> bool {
        if self.detonated {
            return false;
        }
        self.detonated = true;
        true
    }
}

/// Result of one flight step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    Flying,
    /// Out of range or out of the world; remove without effect
    Expired,
    /// Grenade fuse ran out this tick
    FuseElapsed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub body: Body,
    /// Unit travel direction
    pub dir: Vec2,
    /// Pixels per second
    pub speed: f32,
    pub damage: i32,
    pub origin: Vec2,
    pub max_range: f32,
    pub color: [u8; 3],
    pub grenade: Option<GrenadeCharge>,
}

impl Projectile {
    pub fn bullet(
        id: EntityId,
        pos: Vec2,
        dir: Vec2,
        damage: i32,
        stats: &RangedStats,
        settings: &ProjectileSettings,
    ) -> Self {
        Self {
            body: Body::new(id, pos, settings.size, 1),
            dir: direction_or(dir, -DEFAULT_FACING),
            speed: stats.speed,
            damage,
            origin: pos,
            max_range: settings.max_range,
            color: stats.color,
            grenade: None,
        }
    }

    pub fn grenade(
        id: EntityId,
        pos: Vec2,
        dir: Vec2,
        stats: &GrenadeStats,
        owner: EntityId,
        now_ms: u64,
        settings: &ProjectileSettings,
    ) -> Self {
        Self {
            body: Body::new(id, pos, settings.size, 1),
            dir: direction_or(dir, -DEFAULT_FACING),
            speed: stats.speed,
            damage: stats.explosion_damage,
            origin: pos,
            max_range: stats.max_throw_distance,
            color: stats.color,
            grenade: Some(GrenadeCharge {
                fuse_ms: stats.fuse_ms,
                armed_at_ms: now_ms,
                explosion_radius: stats.explosion_radius,
                explosion_damage: stats.explosion_damage,
                owner,
                resting: false,
                detonated: false,
            }),
        }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    pub fn is_grenade(&self) -> bool {
        self.grenade.is_some()
    }

    pub fn travelled(&self) -> f32 {
        self.body.pos.distance(self.origin)
    }

    /// Move one step and report whether the projectile is still in play
    pub fn advance(&mut self, time: TickTime, world: &Aabb) -> Flight {
        match self.grenade.as_mut() {
            None => {
                self.body.pos += self.dir * self.speed * time.dt;
                let travelled = self.body.pos.distance(self.origin);
                if !world.overlaps(&self.body.aabb()) || travelled > self.max_range {
                    Flight::Expired
                } else {
                    Flight::Flying
                }
            }
            Some(charge) => {
                if charge.is_detonated() {
                    return Flight::Expired;
                }
                if !charge.resting {
                    let next = self.body.pos + self.dir * self.speed * time.dt;
                    if next.distance(self.origin) >= self.max_range {
                        self.body.pos = self.origin + self.dir * self.max_range;
                        charge.resting = true;
                    } else {
                        self.body.pos = next;
                    }
                    if !world.contains_point(self.body.pos) {
                        charge.resting = true;
                    }
                    self.body.pos = self.body.aabb().clamped_into(world).center;
                }
                if charge.fuse_elapsed(time.now_ms) {
                    Flight::FuseElapsed
                } else {
                    Flight::Flying
                }
            }
        }
    }
}

impl Combatant for Projectile {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn role(&self) -> Role {
        Role::Projectile
    }
}
