//! Game session state
//!
//! [`GameState`] owns every subsystem of one play session and is the only
//! thing the host holds on to. It is advanced by [`super::tick::tick`] and
//! rebuilt in place by [`GameState::reset`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::combat::CombatManager;
use super::effects::{EffectQueue, Visual};
use super::entity::EntityId;
use super::entity_manager::{EntityManager, Spawn};
use super::events::{EventKind, EventManager, SubscriptionId};
use super::pickup::{Pickup, PickupKind};
use super::player::{KillCounter, Player};
use super::wave::{WaveManager, find_spawn_point};
use super::weapon_system::WeaponSystem;
use super::world::World;
use crate::settings::Settings;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Player died; the host collects a name and calls `reset`
    GameOver,
}

/// What a renderer should draw for an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisualHandle {
    Player { facing: Vec2 },
    Npc { chasing: bool, health_fraction: f32 },
    Bullet { color: [u8; 3] },
    Grenade { color: [u8; 3], resting: bool },
    Pickup(PickupKind),
}

/// Per-frame render record: where and what
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub id: EntityId,
    /// World-space center; the renderer applies its own camera offset
    pub pos: Vec2,
    pub size: Vec2,
    pub visual: VisualHandle,
}

#[derive(Debug)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub settings: Settings,
    pub world: World,
    pub entities: EntityManager,
    pub waves: WaveManager,
    pub weapons: WeaponSystem,
    pub combat: CombatManager,
    pub events: EventManager,
    pub effects: EffectQueue,
    pub pickups: Vec<Pickup>,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Clock of the most recent tick
    pub now_ms: u64,
    pub(crate) rng: Pcg32,
    player_id: EntityId,
    kills: KillCounter,
    kill_subscription: SubscriptionId,
}

impl GameState {
    /// Create a session with a fresh player and wave manager
    pub fn new(settings: Settings, seed: u64) -> Self {
        let mut entities = EntityManager::new();
        let mut events = EventManager::new();
        let kills = KillCounter::new();
        let player_id = entities.next_id();
        entities.add(Spawn::Player(Player::new(player_id, &settings, kills.clone())));
        let kill_subscription = subscribe_kills(&mut events, kills.clone());

        Self {
            seed,
            world: World::new(&settings.world),
            waves: WaveManager::new(&settings.wave),
            weapons: WeaponSystem::new(&settings),
            combat: CombatManager::new(settings.npc.drop_chance),
            effects: EffectQueue::new(&settings),
            pickups: Vec::new(),
            phase: GamePhase::Playing,
            time_ticks: 0,
            now_ms: 0,
            rng: Pcg32::seed_from_u64(seed),
            entities,
            events,
            settings,
            player_id,
            kills,
            kill_subscription,
        }
    }

    /// Throw away the session and start over with the same settings and seed.
    ///
    /// Host subscriptions on the event bus survive; the kill counter is
    /// rebound to the new player.
    pub fn reset(&mut self) {
        log::info!("Resetting session (seed {})", self.seed);
        self.entities.clear();
        self.pickups.clear();
        self.effects.clear();
        self.weapons.reset();
        self.combat.reset();
        self.waves.reset();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.phase = GamePhase::Playing;
        self.time_ticks = 0;
        self.now_ms = 0;

        self.events.unsubscribe(EventKind::NpcDied, self.kill_subscription);
        self.kills = KillCounter::new();
        self.kill_subscription = subscribe_kills(&mut self.events, self.kills.clone());

        self.player_id = self.entities.next_id();
        let player = Player::new(self.player_id, &self.settings, self.kills.clone());
        self.entities.add(Spawn::Player(player));
    }

    pub fn player_id(&self) -> EntityId {
        self.player_id
    }

    /// The live player, if it has not been removed
    pub fn player(&self) -> Option<&Player> {
        self.entities.player()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.entities.player_mut()
    }

    /// Level-triggered game-over check for the host loop
    pub fn is_player_dead(&self) -> bool {
        self.player().is_none_or(|p| !p.body.is_alive())
    }

    pub fn kills(&self) -> u32 {
        self.kills.get()
    }

    /// Score reported to the score store at game over
    pub fn final_score(&self) -> i64 {
        i64::from(self.kills())
    }

    /// Place a health pack at `pos`
    pub fn spawn_pickup(&mut self, pos: Vec2) -> EntityId {
        let id = self.entities.next_id();
        let bounds = *self.world.bounds();
        let mut pack = Pickup::health_pack(id, pos, &self.settings.pickup);
        pack.pos = pack.aabb().clamped_into(&bounds).center;
        self.pickups.push(pack);
        id
    }

    /// Place a health pack at a random point away from the player
    pub fn spawn_pickup_somewhere(&mut self) -> EntityId {
        let avoid = self.player().map(|p| p.body.pos);
        let pos = find_spawn_point(
            &mut self.rng,
            self.world.bounds(),
            self.settings.pickup.size,
            avoid,
            self.settings.wave.min_spawn_distance,
            self.settings.wave.spawn_attempts,
        );
        self.spawn_pickup(pos)
    }

    pub fn visuals(&self) -> &[Visual] {
        self.effects.visuals()
    }

    /// Everything a renderer needs this frame, back to front
    pub fn drawables(&self) -> Vec<Drawable> {
        let mut out = Vec::with_capacity(
            self.pickups.len() + self.entities.npcs().len() + self.entities.projectiles().len() + 1,
        );
        out.extend(self.pickups.iter().map(|p| Drawable {
            id: p.id,
            pos: p.pos,
            size: p.size,
            visual: VisualHandle::Pickup(p.kind),
        }));
        out.extend(self.entities.npcs().iter().map(|n| Drawable {
            id: n.id(),
            pos: n.body.pos,
            size: n.body.size,
            visual: VisualHandle::Npc {
                chasing: n.is_chasing(),
                health_fraction: n.body.health_fraction(),
            },
        }));
        out.extend(self.entities.players().iter().map(|p| Drawable {
            id: p.id(),
            pos: p.body.pos,
            size: p.body.size,
            visual: VisualHandle::Player { facing: p.facing },
        }));
        out.extend(self.entities.projectiles().iter().map(|p| Drawable {
            id: p.id(),
            pos: p.body.pos,
            size: p.body.size,
            visual: match &p.grenade {
                Some(charge) => VisualHandle::Grenade {
                    color: p.color,
                    resting: charge.resting,
                },
                None => VisualHandle::Bullet { color: p.color },
            },
        }));
        out
    }

    /// HUD line: weapon, health, kills, room and wave status
    pub fn hud_text(&self) -> String {
        let wave = self.waves.status_text(self.now_ms, self.entities.live_npc_count());
        match self.player() {
            Some(p) => {
                let weapon = p.weapon.as_ref().map_or("Unarmed", |w| w.name.as_str());
                let room = self.world.room_at(p.body.pos);
                format!(
                    "{weapon} | HP {}/{} | Kills {} | Room ({}, {}) | {wave}",
                    p.body.health(),
                    p.body.max_health(),
                    self.kills(),
                    room.col,
                    room.row,
                )
            }
            None => format!("GAME OVER | Kills {} | {wave}", self.kills()),
        }
    }
}

fn subscribe_kills(events: &mut EventManager, kills: KillCounter) -> SubscriptionId {
    events.subscribe(EventKind::NpcDied, move |_| {
        kills.increment();
        Ok(())
    })
}
