//! The set of live entities, partitioned by role
//!
//! Each role keeps its own insertion-ordered list so systems iterate only the
//! group they care about. An id index spans all roles. Collision passes mark
//! entities dead instead of removing them mid-iteration; [`EntityManager::reap_dead`]
//! sweeps them out at the end of the tick.

use std::collections::BTreeMap;

use super::combat::{CombatCtx, DamageCause, DamageSource};
use super::entity::{EntityId, Role};
use super::geometry::Aabb;
use super::npc::Npc;
use super::player::Player;
use super::projectile::{Flight, Projectile};
use super::tick::TickTime;

/// An entity ready to be inserted, tagged with its role
#[derive(Debug, Clone)]
pub enum Spawn {
    Player(Player),
    Npc(Npc),
    Projectile(Projectile),
}

impl Spawn {
    pub fn id(&self) -> EntityId {
        match self {
            Spawn::Player(p) => p.id(),
            Spawn::Npc(n) => n.id(),
            Spawn::Projectile(p) => p.id(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Spawn::Player(_) => Role::Player,
            Spawn::Npc(_) => Role::Npc,
            Spawn::Projectile(_) => Role::Projectile,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityManager {
    players: Vec<Player>,
    npcs: Vec<Npc>,
    projectiles: Vec<Projectile>,
    index: BTreeMap<EntityId, Role>,
    next_id: u32,
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            npcs: Vec::new(),
            projectiles: Vec::new(),
            index: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate a fresh id; ids are never reused within a session
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an entity into the id index and its role list.
    ///
    /// An id that is already present is logged and the entity dropped.
    pub fn add(&mut self, spawn: Spawn) -> bool {
        let id = spawn.id();
        if let Some(existing) = self.index.get(&id) {
            log::warn!("Entity {id} already registered as {existing:?}; ignoring add");
            return false;
        }
        self.index.insert(id, spawn.role());
        match spawn {
            Spawn::Player(p) => self.players.push(p),
            Spawn::Npc(n) => self.npcs.push(n),
            Spawn::Projectile(p) => self.projectiles.push(p),
        }
        true
    }

    /// Remove an entity from every set; removing an unknown id is a no-op
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(role) = self.index.remove(&id) else {
            return false;
        };
        match role {
            Role::Player => self.players.retain(|p| p.id() != id),
            Role::Npc => self.npcs.retain(|n| n.id() != id),
            Role::Projectile => self.projectiles.retain(|p| p.id() != id),
        }
        true
    }

    pub fn role_of(&self, id: EntityId) -> Option<Role> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Every registered id, ascending
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.index.keys().copied()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The first registered player
    pub fn player(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.players.first_mut()
    }

    pub fn player_by_id_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn npcs_mut(&mut self) -> &mut [Npc] {
        &mut self.npcs
    }

    pub fn npc(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id() == id)
    }

    pub fn npc_mut(&mut self, id: EntityId) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.id() == id)
    }

    pub fn live_npc_count(&self) -> usize {
        self.npcs.iter().filter(|n| n.body.is_alive()).count()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id() == id)
    }

    /// Drop every entity; the id counter keeps running
    pub fn clear(&mut self) {
        self.players.clear();
        self.npcs.clear();
        self.projectiles.clear();
        self.index.clear();
    }

    /// Remove every dead or despawned entity; returns the removed ids
    pub fn reap_dead(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.players.retain(|p| keep_or_record(p.body.is_alive(), p.id(), &mut removed));
        self.npcs.retain(|n| keep_or_record(n.body.is_alive(), n.id(), &mut removed));
        self.projectiles
            .retain(|p| keep_or_record(p.body.is_alive(), p.id(), &mut removed));
        for id in &removed {
            self.index.remove(id);
        }
        removed
    }

    /// Move every projectile one step; expired ones are despawned and
    /// grenades whose fuse ran out explode
    pub fn update_projectiles(&mut self, time: TickTime, world: &Aabb, ctx: &mut CombatCtx<'_>) {
        for i in 0..self.projectiles.len() {
            if !self.projectiles[i].body.is_alive() {
                continue;
            }
            match self.projectiles[i].advance(time, world) {
                Flight::Flying => {}
                Flight::Expired => self.projectiles[i].body.despawn(),
                Flight::FuseElapsed => {
                    let id = self.projectiles[i].id();
                    self.detonate_grenade(id, ctx);
                }
            }
        }
    }

    /// Resolve projectile contacts with NPCs.
    ///
    /// A bullet damages the first overlapping NPC in insertion order and is
    /// consumed. A grenade explodes on contact instead.
    pub fn collide_projectiles_vs_npcs(&mut self, ctx: &mut CombatCtx<'_>) {
        for i in 0..self.projectiles.len() {
            let projectile = &self.projectiles[i];
            if !projectile.body.is_alive() {
                continue;
            }
            let hit_box = projectile.body.aabb();
            let Some(target) = self
                .npcs
                .iter()
                .position(|n| n.body.is_alive() && n.body.aabb().overlaps(&hit_box))
            else {
                continue;
            };

            if projectile.is_grenade() {
                let id = projectile.id();
                self.detonate_grenade(id, ctx);
                continue;
            }

            let damage = projectile.damage;
            log::debug!("Projectile {} hit NPC {}", projectile.id(), self.npcs[target].id());
            ctx.damage(
                &mut self.npcs[target],
                damage,
                DamageSource {
                    attacker: None,
                    cause: DamageCause::Projectile,
                },
            );
            self.projectiles[i].body.despawn();
        }
    }

    /// Explode a grenade, damaging every live NPC within its radius.
    ///
    /// Returns the number of NPCs hit. A grenade that already exploded, or an
    /// id that is not a grenade, does nothing.
    pub fn detonate_grenade(&mut self, id: EntityId, ctx: &mut CombatCtx<'_>) -> usize {
        let Some(projectile) = self.projectiles.iter_mut().find(|p| p.id() == id) else {
            log::warn!("Detonation requested for unknown projectile {id}");
            return 0;
        };
        let center = projectile.body.pos;
        let Some(charge) = projectile.grenade.as_mut() else {
            log::warn!("Projectile {id} is not a grenade");
            return 0;
        };
        if !charge.detonate() {
            return 0;
        }
        let (radius, damage, owner) = (charge.explosion_radius, charge.explosion_damage, charge.owner);
        projectile.body.despawn();

        ctx.effects.create_explosion_visual(center, radius);
        let source = DamageSource::new(owner, DamageCause::Explosion);
        let mut hits = 0;
        for npc in self.npcs.iter_mut() {
            if npc.body.is_alive() && npc.body.pos.distance(center) <= radius {
                ctx.damage(npc, damage, source);
                hits += 1;
            }
        }
        log::debug!("Grenade {id} exploded at ({:.0}, {:.0}), {hits} NPC(s) hit", center.x, center.y);
        hits
    }

    /// Damage every live NPC overlapping `attack_box`; returns how many were hit
    pub fn melee_vs_npcs(&mut self, attack_box: &Aabb, damage: i32, attacker: EntityId, ctx: &mut CombatCtx<'_>) -> usize {
        let source = DamageSource::new(attacker, DamageCause::Melee);
        let mut hits = 0;
        for npc in self.npcs.iter_mut() {
            if npc.id() != attacker && npc.body.is_alive() && npc.body.aabb().overlaps(attack_box) {
                ctx.damage(npc, damage, source);
                hits += 1;
            }
        }
        hits
    }

    /// Damage a live player overlapping `attack_box`, restricted to `only`
    /// when given; returns whether anyone was hit
    pub fn melee_vs_player(
        &mut self,
        attack_box: &Aabb,
        damage: i32,
        attacker: EntityId,
        only: Option<EntityId>,
        ctx: &mut CombatCtx<'_>,
    ) -> bool {
        let Some(player) = self.players.iter_mut().find(|p| {
            only.is_none_or(|id| id == p.id()) && p.body.is_alive() && p.body.aabb().overlaps(attack_box)
        }) else {
            return false;
        };
        ctx.damage(player, damage, DamageSource::new(attacker, DamageCause::Melee));
        true
    }
}

fn keep_or_record(alive: bool, id: EntityId, removed: &mut Vec<EntityId>) -> bool {
    if !alive {
        removed.push(id);
    }
    alive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ProjectileSettings, Settings};
    use crate::sim::combat::CombatManager;
    use crate::sim::effects::{EffectQueue, VisualKind};
    use crate::sim::events::{EventKind, EventManager};
    use crate::sim::player::KillCounter;
    use crate::sim::weapon::{RangedStats, Weapon, WeaponKey, WeaponPayload};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixture {
        combat: CombatManager,
        events: EventManager,
        effects: EffectQueue,
        rng: Pcg32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                combat: CombatManager::new(0.0),
                events: EventManager::new(),
                effects: EffectQueue::new(&Settings::default()),
                rng: Pcg32::seed_from_u64(11),
            }
        }

        fn ctx(&mut self) -> CombatCtx<'_> {
            CombatCtx {
                combat: &mut self.combat,
                events: &mut self.events,
                effects: &mut self.effects,
                rng: &mut self.rng,
            }
        }

        fn count_deaths(&mut self) -> Rc<Cell<u32>> {
            let count = Rc::new(Cell::new(0));
            let c = count.clone();
            self.events.subscribe(EventKind::NpcDied, move |_| {
                c.set(c.get() + 1);
                Ok(())
            });
            count
        }
    }

    fn world() -> Aabb {
        Aabb::from_min_size(Vec2::ZERO, Vec2::splat(1000.0))
    }

    fn add_npc(em: &mut EntityManager, pos: Vec2) -> EntityId {
        let id = em.next_id();
        em.add(Spawn::Npc(Npc::new(id, pos, &Settings::default(), &world())));
        id
    }

    fn add_bullet(em: &mut EntityManager, pos: Vec2, damage: i32) -> EntityId {
        let id = em.next_id();
        let stats = RangedStats {
            speed: 720.0,
            color: [128, 128, 128],
        };
        em.add(Spawn::Projectile(Projectile::bullet(
            id,
            pos,
            Vec2::X,
            damage,
            &stats,
            &ProjectileSettings::default(),
        )));
        id
    }

    fn add_grenade(em: &mut EntityManager, pos: Vec2) -> EntityId {
        let id = em.next_id();
        let settings = Settings::default();
        let WeaponPayload::Grenade(stats) = Weapon::from_key(WeaponKey::GrenadeLauncher, &settings.grenade).payload
        else {
            unreachable!()
        };
        em.add(Spawn::Projectile(Projectile::grenade(
            id,
            pos,
            Vec2::X,
            &stats,
            EntityId(999),
            0,
            &settings.projectile,
        )));
        id
    }

    #[test]
    fn test_add_and_remove_are_idempotent() {
        let mut em = EntityManager::new();
        let npc = add_npc(&mut em, Vec2::splat(100.0));
        assert_eq!(em.role_of(npc), Some(Role::Npc));

        let dup = Npc::new(npc, Vec2::ZERO, &Settings::default(), &world());
        assert!(!em.add(Spawn::Npc(dup)));
        assert_eq!(em.npcs().len(), 1);

        assert!(em.remove(npc));
        assert!(!em.remove(npc));
        assert!(em.is_empty());
        assert!(em.npcs().is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut em = EntityManager::new();
        let a = em.next_id();
        em.clear();
        let b = em.next_id();
        assert!(b > a);
    }

    #[test]
    fn test_bullet_hits_first_npc_only() {
        let mut fx = Fixture::new();
        let mut em = EntityManager::new();
        let first = add_npc(&mut em, Vec2::new(100.0, 100.0));
        let second = add_npc(&mut em, Vec2::new(104.0, 100.0));
        let bullet = add_bullet(&mut em, Vec2::new(102.0, 100.0), 10);

        em.collide_projectiles_vs_npcs(&mut fx.ctx());
        assert_eq!(em.npc(first).unwrap().body.health(), 40);
        assert_eq!(em.npc(second).unwrap().body.health(), 50);

        let removed = em.reap_dead();
        assert_eq!(removed, vec![bullet]);
        assert!(em.projectile(bullet).is_none());
    }

    #[test]
    fn test_projectile_kill_removes_npc_same_tick() {
        let mut fx = Fixture::new();
        let deaths = fx.count_deaths();
        let mut em = EntityManager::new();
        let npc = add_npc(&mut em, Vec2::new(100.0, 100.0));
        em.npc_mut(npc).unwrap().body.take_damage(45);
        add_bullet(&mut em, Vec2::new(100.0, 100.0), 10);

        em.collide_projectiles_vs_npcs(&mut fx.ctx());
        em.reap_dead();
        assert!(!em.contains(npc));
        assert_eq!(deaths.get(), 1);
    }

    #[test]
    fn test_grenade_explodes_once_and_skips_dead() {
        let mut fx = Fixture::new();
        let deaths = fx.count_deaths();
        let mut em = EntityManager::new();
        let near = add_npc(&mut em, Vec2::new(500.0, 500.0));
        let edge = add_npc(&mut em, Vec2::new(550.0, 500.0));
        let far = add_npc(&mut em, Vec2::new(600.0, 500.0));
        let dead = add_npc(&mut em, Vec2::new(510.0, 500.0));
        em.npc_mut(dead).unwrap().body.take_damage(100);
        let grenade = add_grenade(&mut em, Vec2::new(500.0, 500.0));

        assert_eq!(em.detonate_grenade(grenade, &mut fx.ctx()), 2);
        assert_eq!(em.detonate_grenade(grenade, &mut fx.ctx()), 0);

        assert!(!em.npc(near).unwrap().body.is_alive());
        assert!(!em.npc(edge).unwrap().body.is_alive());
        assert_eq!(em.npc(far).unwrap().body.health(), 50);
        assert_eq!(deaths.get(), 2);
        assert_eq!(fx.effects.visuals().len(), 1);
        assert!(matches!(fx.effects.visuals()[0].kind, VisualKind::Explosion { .. }));
        assert!(!em.projectile(grenade).unwrap().body.is_alive());
    }

    #[test]
    fn test_grenade_contact_triggers_explosion() {
        let mut fx = Fixture::new();
        let mut em = EntityManager::new();
        let npc = add_npc(&mut em, Vec2::new(300.0, 300.0));
        let grenade = add_grenade(&mut em, Vec2::new(290.0, 300.0));

        em.collide_projectiles_vs_npcs(&mut fx.ctx());
        assert!(em.projectile(grenade).unwrap().grenade.as_ref().unwrap().is_detonated());
        assert!(!em.npc(npc).unwrap().body.is_alive());
    }

    #[test]
    fn test_fuse_detonates_during_update() {
        let mut fx = Fixture::new();
        let mut em = EntityManager::new();
        let grenade = add_grenade(&mut em, Vec2::new(100.0, 100.0));
        let t = TickTime {
            now_ms: 3000,
            dt: 1.0 / 60.0,
        };
        em.update_projectiles(t, &world(), &mut fx.ctx());
        assert!(!em.projectile(grenade).unwrap().body.is_alive());
        assert_eq!(fx.effects.visuals().len(), 1);
    }

    #[test]
    fn test_melee_hits_every_overlapping_npc() {
        let mut fx = Fixture::new();
        let mut em = EntityManager::new();
        let a = add_npc(&mut em, Vec2::new(100.0, 100.0));
        let b = add_npc(&mut em, Vec2::new(100.0, 120.0));
        let c = add_npc(&mut em, Vec2::new(300.0, 100.0));
        let swing = Aabb::from_center(Vec2::new(100.0, 110.0), Vec2::new(50.0, 50.0));

        assert_eq!(em.melee_vs_npcs(&swing, 15, EntityId(1000), &mut fx.ctx()), 2);
        assert_eq!(em.npc(a).unwrap().body.health(), 35);
        assert_eq!(em.npc(b).unwrap().body.health(), 35);
        assert_eq!(em.npc(c).unwrap().body.health(), 50);
    }

    #[test]
    fn test_melee_vs_player_requires_overlap() {
        let mut fx = Fixture::new();
        let settings = Settings::default();
        let mut em = EntityManager::new();
        let id = em.next_id();
        em.add(Spawn::Player(Player::new(id, &settings, KillCounter::new())));
        let start = settings.player.start;

        let miss = Aabb::from_center(start + Vec2::new(200.0, 0.0), Vec2::splat(20.0));
        assert!(!em.melee_vs_player(&miss, 15, EntityId(50), None, &mut fx.ctx()));
        let hit = Aabb::from_center(start, Vec2::splat(20.0));
        assert!(!em.melee_vs_player(&hit, 15, EntityId(50), Some(EntityId(77)), &mut fx.ctx()));
        assert!(em.melee_vs_player(&hit, 15, EntityId(50), Some(id), &mut fx.ctx()));
        assert_eq!(em.player().unwrap().body.health(), 85);
    }
}
