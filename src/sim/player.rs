//! The player entity

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use super::entity::{Body, Combatant, EntityId, Role};
use super::geometry::Aabb;
use super::weapon::{Weapon, WeaponKey};
use crate::axis_to_direction;
use crate::consts::DEFAULT_FACING;
use crate::settings::Settings;

/// Kill tally shared between the player and the death-event subscriber
#[derive(Debug, Clone, Default)]
pub struct KillCounter(Rc<Cell<u32>>);

impl KillCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.set(self.0.get().saturating_add(1));
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub radius: f32,
    /// Unit facing direction, "down" until the player first moves
    pub facing: Vec2,
    /// Pixels per second
    pub speed: f32,
    pub weapon: Option<Weapon>,
    kills: KillCounter,
}

impl Player {
    pub fn new(id: EntityId, settings: &Settings, kills: KillCounter) -> Self {
        let p = &settings.player;
        let mut player = Self {
            body: Body::new(id, p.start, Vec2::splat(p.radius * 2.0), p.health),
            radius: p.radius,
            facing: DEFAULT_FACING,
            speed: p.speed,
            weapon: None,
            kills,
        };
        player.equip(&p.starting_weapon, settings);
        player
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    pub fn kills(&self) -> u32 {
        self.kills.get()
    }

    pub fn increment_kills(&self) {
        self.kills.increment();
    }

    pub fn kill_counter(&self) -> KillCounter {
        self.kills.clone()
    }

    /// Turn toward the movement axis without moving (no-op when idle)
    pub fn face(&mut self, axis_x: i8, axis_y: i8) {
        let dir = axis_to_direction(axis_x, axis_y);
        if dir != Vec2::ZERO {
            self.facing = dir;
        }
    }

    /// Move along the input axis and keep the body inside the world
    pub fn apply_movement(&mut self, axis_x: i8, axis_y: i8, dt: f32, bounds: &Aabb) {
        let dir = axis_to_direction(axis_x, axis_y);
        if dir != Vec2::ZERO {
            self.facing = dir;
            self.body.pos += dir * self.speed * dt;
        }
        self.body.clamp_into(bounds);
    }

    /// Equip a catalog weapon by name.
    ///
    /// An unknown name keeps the current weapon; a player left with no weapon
    /// at all gets the pistol.
    pub fn equip(&mut self, name: &str, settings: &Settings) -> bool {
        match WeaponKey::from_name(name) {
            Some(key) => {
                self.equip_key(key, settings);
                true
            }
            None => {
                log::warn!("Unknown weapon key {name:?}; keeping current weapon");
                if self.weapon.is_none() {
                    log::warn!("Player has no weapon, defaulting to pistol");
                    self.equip_key(WeaponKey::Pistol, settings);
                }
                false
            }
        }
    }

    pub fn equip_key(&mut self, key: WeaponKey, settings: &Settings) {
        let weapon = Weapon::from_key(key, &settings.grenade);
        log::info!("Player equipped {}", weapon.name);
        self.weapon = Some(weapon);
    }

    /// Equip by number-row slot; unknown slots are ignored
    pub fn equip_slot(&mut self, slot: u8, settings: &Settings) -> bool {
        match WeaponKey::from_slot(slot) {
            Some(key) => {
                self.equip_key(key, settings);
                true
            }
            None => {
                log::warn!("No weapon bound to slot {slot}");
                false
            }
        }
    }
}

impl Combatant for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn role(&self) -> Role {
        Role::Player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapon::WeaponKind;

    fn bounds() -> Aabb {
        Aabb::from_min_size(Vec2::ZERO, Vec2::new(200.0, 200.0))
    }

    fn player() -> Player {
        Player::new(EntityId(1), &Settings::default(), KillCounter::new())
    }

    #[test]
    fn test_new_player_defaults() {
        let p = player();
        assert_eq!(p.facing, Vec2::new(0.0, 1.0));
        assert_eq!(p.kills(), 0);
        assert_eq!(p.body.health(), 100);
        assert_eq!(p.weapon.as_ref().map(|w| w.kind()), Some(WeaponKind::Ranged));
    }

    #[test]
    fn test_movement_updates_facing_and_clamps() {
        let mut p = player();
        p.body.pos = Vec2::new(100.0, 100.0);
        p.apply_movement(-1, 0, 1.0, &bounds());
        assert_eq!(p.facing, Vec2::new(-1.0, 0.0));
        assert_eq!(p.body.pos.x, 15.0);

        p.apply_movement(0, 0, 1.0, &bounds());
        assert_eq!(p.facing, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_unknown_weapon_keeps_current() {
        let settings = Settings::default();
        let mut p = player();
        p.equip_slot(2, &settings);
        assert!(!p.equip("bazooka", &settings));
        assert_eq!(p.weapon.as_ref().unwrap().name, "Knife");
    }

    #[test]
    fn test_unknown_starting_weapon_falls_back_to_pistol() {
        let mut settings = Settings::default();
        settings.player.starting_weapon = "bazooka".to_string();
        let p = Player::new(EntityId(1), &settings, KillCounter::new());
        assert_eq!(p.weapon.as_ref().unwrap().name, "Pistol");
    }

    #[test]
    fn test_kill_counter_is_shared() {
        let counter = KillCounter::new();
        let p = Player::new(EntityId(1), &Settings::default(), counter.clone());
        counter.increment();
        p.increment_kills();
        assert_eq!(p.kills(), 2);
    }
}
