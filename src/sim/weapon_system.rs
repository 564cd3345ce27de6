//! Weapon use: cooldowns and per-kind dispatch
//!
//! [`WeaponSystem::use_weapon`] is the only way anything fires, throws or
//! swings. Cooldowns are tracked per wielder and per weapon kind, so swapping
//! from a pistol to a knife does not inherit the pistol's clock.

use std::collections::HashMap;

use glam::Vec2;

use super::combat::CombatCtx;
use super::entity::{EntityId, Role};
use super::entity_manager::{EntityManager, Spawn};
use super::geometry::Aabb;
use super::projectile::Projectile;
use super::weapon::{Weapon, WeaponKind, WeaponPayload};
use crate::consts::DEFAULT_FACING;
use crate::settings::{MeleeSettings, ProjectileSettings, Settings};
use crate::{direction_or, is_horizontal};

/// What the weapon system needs to know about whoever pulls the trigger
#[derive(Debug, Clone)]
struct Wielder {
    role: Role,
    pos: Vec2,
    facing: Vec2,
    radius: f32,
    weapon: Option<Weapon>,
}

#[derive(Debug, Clone)]
pub struct WeaponSystem {
    last_use: HashMap<(EntityId, WeaponKind), u64>,
    projectile: ProjectileSettings,
    melee: MeleeSettings,
}

impl WeaponSystem {
    pub fn new(settings: &Settings) -> Self {
        Self {
            last_use: HashMap::new(),
            projectile: settings.projectile.clone(),
            melee: settings.melee.clone(),
        }
    }

    fn wielder(id: EntityId, entities: &EntityManager) -> Option<Wielder> {
        match entities.role_of(id)? {
            Role::Player => entities.players().iter().find(|p| p.id() == id && p.body.is_alive()).map(|p| Wielder {
                role: Role::Player,
                pos: p.body.pos,
                facing: p.facing,
                radius: p.radius,
                weapon: p.weapon.clone(),
            }),
            Role::Npc => entities.npc(id).filter(|n| n.body.is_alive()).map(|n| Wielder {
                role: Role::Npc,
                pos: n.body.pos,
                facing: n.facing,
                radius: n.radius(),
                weapon: n.weapon.clone(),
            }),
            Role::Projectile => None,
        }
    }

    /// Try to use the wielder's equipped weapon at `now_ms`.
    ///
    /// Returns false, with no effect, when the wielder is unknown or dead, has
    /// no weapon, or is still cooling down. `target_hint` restricts an NPC
    /// melee swing to that player.
    pub fn use_weapon(
        &mut self,
        wielder_id: EntityId,
        target_hint: Option<EntityId>,
        entities: &mut EntityManager,
        ctx: &mut CombatCtx<'_>,
        now_ms: u64,
    ) -> bool {
        let Some(wielder) = Self::wielder(wielder_id, entities) else {
            log::error!("Weapon use requested for {wielder_id}, which is not a live player or NPC");
            return false;
        };
        let Some(weapon) = wielder.weapon.as_ref() else {
            return false;
        };
        if self.cooldown_remaining(wielder_id, weapon, now_ms) > 0 {
            return false;
        }
        self.last_use.insert((wielder_id, weapon.kind()), now_ms);

        let facing = direction_or(wielder.facing, DEFAULT_FACING);
        let muzzle = wielder.pos + facing * (wielder.radius + self.projectile.spawn_offset);
        match weapon.payload {
            WeaponPayload::Ranged(stats) => {
                let id = entities.next_id();
                let bullet = Projectile::bullet(id, muzzle, facing, weapon.damage, &stats, &self.projectile);
                log::debug!("{wielder_id} fired {} -> projectile {id}", weapon.name);
                entities.add(Spawn::Projectile(bullet));
            }
            WeaponPayload::Grenade(stats) => {
                let id = entities.next_id();
                let grenade = Projectile::grenade(id, muzzle, facing, &stats, wielder_id, now_ms, &self.projectile);
                log::debug!("{wielder_id} threw grenade {id}");
                entities.add(Spawn::Projectile(grenade));
            }
            WeaponPayload::Melee(stats) => {
                let hit_box = melee_hitbox(
                    wielder.pos,
                    facing,
                    wielder.radius,
                    stats.range,
                    self.melee.thickness_factor,
                );
                let thickness = wielder.radius * self.melee.thickness_factor;
                ctx.effects
                    .create_attack_visual(hit_box.center, stats.range, thickness, facing);
                match wielder.role {
                    Role::Player => {
                        let hits = entities.melee_vs_npcs(&hit_box, weapon.damage, wielder_id, ctx);
                        log::debug!("{wielder_id} swung {}, {hits} NPC(s) hit", weapon.name);
                    }
                    _ => {
                        entities.melee_vs_player(&hit_box, weapon.damage, wielder_id, target_hint, ctx);
                    }
                }
            }
        }
        true
    }

    /// Milliseconds until `wielder` may use a weapon of this kind again
    pub fn cooldown_remaining(&self, wielder: EntityId, weapon: &Weapon, now_ms: u64) -> u64 {
        match self.last_use.get(&(wielder, weapon.kind())) {
            Some(&last) => weapon.cooldown_ms().saturating_sub(now_ms.saturating_sub(last)),
            None => 0,
        }
    }

    /// Drop the cooldown clocks of an entity that left the game
    pub fn forget(&mut self, wielder: EntityId) {
        self.last_use.retain(|(id, _), _| *id != wielder);
    }

    pub fn reset(&mut self) {
        self.last_use.clear();
    }
}

/// Axis-aligned melee hit-box in front of a wielder.
///
/// The box is `range` long along whichever axis dominates `facing` and
/// `radius * thickness_factor` wide across it. Diagonal swings snap to an
/// axis; the box is never rotated.
pub fn melee_hitbox(center: Vec2, facing: Vec2, radius: f32, range: f32, thickness_factor: f32) -> Aabb {
    let dir = direction_or(facing, DEFAULT_FACING);
    let thickness = radius * thickness_factor;
    let size = if is_horizontal(dir) {
        Vec2::new(range, thickness)
    } else {
        Vec2::new(thickness, range)
    };
    Aabb::from_center(center + dir * (radius + range * 0.5), size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::combat::CombatManager;
    use crate::sim::effects::{EffectQueue, VisualKind};
    use crate::sim::events::EventManager;
    use crate::sim::npc::Npc;
    use crate::sim::player::{KillCounter, Player};
    use crate::sim::weapon::WeaponKey;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Fixture {
        settings: Settings,
        entities: EntityManager,
        weapons: WeaponSystem,
        combat: CombatManager,
        events: EventManager,
        effects: EffectQueue,
        rng: Pcg32,
        player: EntityId,
    }

    impl Fixture {
        fn new() -> Self {
            let settings = Settings::default();
            let mut entities = EntityManager::new();
            let player = entities.next_id();
            entities.add(Spawn::Player(Player::new(player, &settings, KillCounter::new())));
            Self {
                weapons: WeaponSystem::new(&settings),
                combat: CombatManager::new(0.0),
                events: EventManager::new(),
                effects: EffectQueue::new(&settings),
                rng: Pcg32::seed_from_u64(5),
                settings,
                entities,
                player,
            }
        }

        fn fire(&mut self, who: EntityId, now_ms: u64) -> bool {
            let mut ctx = CombatCtx {
                combat: &mut self.combat,
                events: &mut self.events,
                effects: &mut self.effects,
                rng: &mut self.rng,
            };
            self.weapons.use_weapon(who, None, &mut self.entities, &mut ctx, now_ms)
        }

        fn add_npc(&mut self, pos: Vec2) -> EntityId {
            let id = self.entities.next_id();
            let bounds = Aabb::from_min_size(Vec2::ZERO, Vec2::splat(5000.0));
            self.entities
                .add(Spawn::Npc(Npc::new(id, pos, &self.settings, &bounds)));
            id
        }

        fn equip(&mut self, key: WeaponKey) {
            let settings = self.settings.clone();
            if let Some(p) = self.entities.player_mut() {
                p.equip_key(key, &settings);
            }
        }
    }

    #[test]
    fn test_cooldown_blocks_until_fire_rate_elapsed() {
        let mut fx = Fixture::new();
        let player = fx.player;
        assert!(fx.fire(player, 1000));
        assert!(!fx.fire(player, 1125));
        assert!(fx.fire(player, 1250));
        assert_eq!(fx.entities.projectiles().len(), 2);
    }

    #[test]
    fn test_cooldown_is_per_weapon_kind() {
        let mut fx = Fixture::new();
        let player = fx.player;
        assert!(fx.fire(player, 1000));
        fx.equip(WeaponKey::Knife);
        assert!(fx.fire(player, 1010));
        fx.equip(WeaponKey::Pistol);
        assert!(!fx.fire(player, 1020));
    }

    #[test]
    fn test_bullet_spawns_at_wielder_edge() {
        let mut fx = Fixture::new();
        let player = fx.player;
        fx.fire(player, 0);
        let start = fx.settings.player.start;
        let bullet = &fx.entities.projectiles()[0];
        assert_eq!(bullet.body.pos, start + Vec2::new(0.0, 20.0));
        assert_eq!(bullet.dir, Vec2::new(0.0, 1.0));
        assert_eq!(bullet.damage, 10);
    }

    #[test]
    fn test_grenade_is_owned_by_thrower() {
        let mut fx = Fixture::new();
        let player = fx.player;
        fx.equip(WeaponKey::GrenadeLauncher);
        assert!(fx.fire(player, 0));
        let grenade = fx.entities.projectiles()[0].grenade.clone().unwrap();
        assert_eq!(grenade.owner, player);
        assert!(!fx.fire(player, 1999));
        assert!(fx.fire(player, 2000));
    }

    #[test]
    fn test_player_knife_hits_npcs_in_front() {
        let mut fx = Fixture::new();
        let player = fx.player;
        let start = fx.settings.player.start;
        let in_front = fx.add_npc(start + Vec2::new(0.0, 40.0));
        let behind = fx.add_npc(start + Vec2::new(0.0, -40.0));
        fx.equip(WeaponKey::Knife);

        assert!(fx.fire(player, 0));
        assert_eq!(fx.entities.npc(in_front).unwrap().body.health(), 35);
        assert_eq!(fx.entities.npc(behind).unwrap().body.health(), 50);
        assert!(matches!(fx.effects.visuals()[0].kind, VisualKind::Attack { .. }));
    }

    #[test]
    fn test_npc_knife_hits_player() {
        let mut fx = Fixture::new();
        let start = fx.settings.player.start;
        let npc = fx.add_npc(start + Vec2::new(-30.0, 0.0));
        fx.entities.npc_mut(npc).unwrap().facing = Vec2::X;

        assert!(fx.fire(npc, 0));
        assert_eq!(fx.entities.player().unwrap().body.health(), 85);
        assert!(!fx.fire(npc, 100));
    }

    #[test]
    fn test_unarmed_or_unknown_wielder_cannot_fire() {
        let mut fx = Fixture::new();
        let player = fx.player;
        fx.entities.player_mut().unwrap().weapon = None;
        assert!(!fx.fire(player, 0));
        assert!(!fx.fire(EntityId(4242), 0));
    }

    #[test]
    fn test_forget_clears_cooldown() {
        let mut fx = Fixture::new();
        let player = fx.player;
        fx.fire(player, 0);
        let pistol = fx.entities.player().unwrap().weapon.clone().unwrap();
        assert_eq!(fx.weapons.cooldown_remaining(player, &pistol, 100), 150);
        fx.weapons.forget(player);
        assert_eq!(fx.weapons.cooldown_remaining(player, &pistol, 100), 0);
    }

    #[test]
    fn test_melee_hitbox_orientation() {
        let right = melee_hitbox(Vec2::ZERO, Vec2::X, 15.0, 50.0, 1.5);
        assert_eq!(right.center, Vec2::new(40.0, 0.0));
        assert_eq!(right.size(), Vec2::new(50.0, 22.5));

        let up = melee_hitbox(Vec2::ZERO, Vec2::new(0.0, -1.0), 15.0, 50.0, 1.5);
        assert_eq!(up.center, Vec2::new(0.0, -40.0));
        assert_eq!(up.size(), Vec2::new(22.5, 50.0));

        // A perfect diagonal snaps to the vertical axis
        let diag = melee_hitbox(Vec2::ZERO, Vec2::new(1.0, 1.0), 15.0, 50.0, 1.5);
        assert_eq!(diag.size(), Vec2::new(22.5, 50.0));
    }
}
