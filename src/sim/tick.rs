//! Per-frame simulation step
//!
//! Stage order within one tick:
//! 1. expire visuals, player equip / aim / weapon use
//! 2. player movement
//! 3. NPC AI: NPCs in reach swing from where they stand, the rest move;
//!    then separation and world clamp
//! 4. projectile flight and grenade fuses
//! 5. projectile/NPC collisions and pickup collection
//! 6. removal of dead entities and drop materialization
//! 7. game-over check, then wave progression
//!
//! Later stages see the removals of earlier ones.

use glam::Vec2;

use super::combat::CombatCtx;
use super::entity::EntityId;
use super::events::GameEvent;
use super::npc::{NpcAction, Target, separate};
use super::state::{GamePhase, GameState};
use super::wave::WaveUpdate;
use super::weapon::{WeaponKey, WeaponKind};
use crate::axis_to_direction;
use crate::consts::{SIM_DT, SIM_DT_MS};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement axis, each component -1, 0 or 1
    pub move_x: i8,
    pub move_y: i8,
    /// Use the equipped weapon (held key / click)
    pub use_weapon: bool,
    /// Number-row weapon slot pressed this tick
    pub equip_slot: Option<u8>,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode: the autopilot plays instead of the input
    pub idle_mode: bool,
}

/// Clock sample shared by every stage of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickTime {
    /// Monotonic milliseconds since session start
    pub now_ms: u64,
    /// Seconds since the previous tick
    pub dt: f32,
}

impl TickTime {
    pub fn new(now_ms: u64, dt: f32) -> Self {
        Self { now_ms, dt }
    }

    /// Time of the `n`th tick on the fixed 60 Hz clock
    pub fn fixed(n: u64) -> Self {
        Self {
            now_ms: n * SIM_DT_MS,
            dt: SIM_DT,
        }
    }
}

/// Advance the session by one step
pub fn tick(state: &mut GameState, input: &TickInput, time: TickTime) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;
    state.now_ms = time.now_ms;
    state.effects.begin_tick(time.now_ms);

    let input = if input.idle_mode { autopilot(state) } else { input.clone() };

    player_actions(state, &input, time);
    move_player(state, &input, time);
    update_npcs(state, time);
    update_projectiles(state, time);
    resolve_collisions(state);
    collect_pickups(state);
    cleanup(state);

    if state.is_player_dead() {
        log::info!("Game over after {} ticks, {} kills", state.time_ticks, state.kills());
        state.phase = GamePhase::GameOver;
        return;
    }
    update_waves(state, time);
}

fn player_actions(state: &mut GameState, input: &TickInput, time: TickTime) {
    let player_id = state.player_id();
    let GameState {
        settings,
        entities,
        weapons,
        combat,
        events,
        effects,
        rng,
        ..
    } = state;

    let Some(player) = entities.player_mut().filter(|p| p.body.is_alive()) else {
        return;
    };
    if let Some(slot) = input.equip_slot {
        player.equip_slot(slot, settings);
    }
    // Aim first so a shot fired while turning goes the new way
    player.face(input.move_x, input.move_y);

    if input.use_weapon {
        let mut ctx = CombatCtx {
            combat,
            events,
            effects,
            rng,
        };
        weapons.use_weapon(player_id, None, entities, &mut ctx, time.now_ms);
    }
}

fn move_player(state: &mut GameState, input: &TickInput, time: TickTime) {
    let bounds = *state.world.bounds();
    if let Some(player) = state.entities.player_mut().filter(|p| p.body.is_alive()) {
        player.apply_movement(input.move_x, input.move_y, time.dt, &bounds);
    }
}

fn update_npcs(state: &mut GameState, time: TickTime) {
    let player_id = state.player_id();
    let bounds = *state.world.bounds();
    let GameState {
        settings,
        entities,
        weapons,
        combat,
        events,
        effects,
        rng,
        ..
    } = state;

    let target = entities.player().filter(|p| p.body.is_alive()).map(|p| Target {
        pos: p.body.pos,
        size: p.body.size,
    });

    let mut attackers: Vec<EntityId> = Vec::new();
    for npc in entities.npcs_mut() {
        if !npc.body.is_alive() {
            continue;
        }
        if npc.think(target, time, settings.npc.chase_policy, &mut *rng) == NpcAction::Attack {
            attackers.push(npc.id());
        }
    }

    let mut ctx = CombatCtx {
        combat,
        events,
        effects,
        rng,
    };
    for id in attackers {
        weapons.use_weapon(id, Some(player_id), entities, &mut ctx, time.now_ms);
    }

    separate(entities.npcs_mut());
    for npc in entities.npcs_mut() {
        npc.body.clamp_into(&bounds);
    }
}

fn update_projectiles(state: &mut GameState, time: TickTime) {
    let bounds = *state.world.bounds();
    let GameState {
        entities,
        combat,
        events,
        effects,
        rng,
        ..
    } = state;
    let mut ctx = CombatCtx {
        combat,
        events,
        effects,
        rng,
    };
    entities.update_projectiles(time, &bounds, &mut ctx);
}

fn resolve_collisions(state: &mut GameState) {
    let GameState {
        entities,
        combat,
        events,
        effects,
        rng,
        ..
    } = state;
    let mut ctx = CombatCtx {
        combat,
        events,
        effects,
        rng,
    };
    entities.collide_projectiles_vs_npcs(&mut ctx);
}

fn collect_pickups(state: &mut GameState) {
    let GameState { entities, pickups, .. } = state;
    let Some(player) = entities.player_mut().filter(|p| p.body.is_alive()) else {
        return;
    };
    let player_box = player.body.aabb();
    pickups.retain(|pickup| {
        if pickup.aabb().overlaps(&player_box) {
            pickup.apply(player);
            false
        } else {
            true
        }
    });
}

fn cleanup(state: &mut GameState) {
    for id in state.entities.reap_dead() {
        state.weapons.forget(id);
    }
    for pos in state.combat.take_drops() {
        state.spawn_pickup(pos);
    }
}

fn update_waves(state: &mut GameState, time: TickTime) {
    let bounds = *state.world.bounds();
    let GameState {
        settings,
        entities,
        waves,
        rng,
        ..
    } = state;
    match waves.update(time.now_ms, entities, rng, settings, &bounds) {
        WaveUpdate::Idle => {}
        WaveUpdate::Started { wave, count } => {
            state.events.emit(&GameEvent::WaveStarted { wave, count });
            if state.settings.pickup.pack_per_wave {
                state.spawn_pickup_somewhere();
            }
        }
        WaveUpdate::Cleared { wave } => {
            state.events.emit(&GameEvent::WaveCleared { wave });
        }
    }
}

/// Distance under which the autopilot switches to the knife
const AUTOPILOT_KNIFE_RANGE: f32 = 45.0;
/// Below this health the autopilot goes for health packs first
const AUTOPILOT_LOW_HEALTH: f32 = 0.5;
/// NPCs within this distance of the nearest one make a grenade worthwhile
const AUTOPILOT_CLUSTER_RADIUS: f32 = 60.0;

/// Simple bot used by idle mode and the headless runner.
///
/// Walks toward the nearest NPC (or a health pack when hurt), shoots when
/// lined up, knifes at close range and lobs grenades into clusters.
pub fn autopilot(state: &GameState) -> TickInput {
    let Some(player) = state.player().filter(|p| p.body.is_alive()) else {
        return TickInput::default();
    };
    let pos = player.body.pos;
    let hurt = player.body.health_fraction() < AUTOPILOT_LOW_HEALTH;

    let nearest_pack = state
        .pickups
        .iter()
        .map(|p| p.pos)
        .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)));
    let nearest_npc = state
        .entities
        .npcs()
        .iter()
        .filter(|n| n.body.is_alive())
        .map(|n| n.body.pos)
        .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)));

    let mut input = TickInput::default();
    if let Some(pack) = nearest_pack.filter(|_| hurt) {
        (input.move_x, input.move_y) = axis_toward(pack - pos);
        return input;
    }
    let Some(enemy) = nearest_npc else {
        return input;
    };

    let to_enemy = enemy - pos;
    let distance = to_enemy.length();
    let cluster = state
        .entities
        .npcs()
        .iter()
        .filter(|n| n.body.is_alive() && n.body.pos.distance(enemy) <= AUTOPILOT_CLUSTER_RADIUS)
        .count();

    let wanted = if distance <= AUTOPILOT_KNIFE_RANGE {
        WeaponKey::Knife
    } else if cluster >= 3 && distance > 120.0 {
        WeaponKey::GrenadeLauncher
    } else {
        WeaponKey::Pistol
    };
    let current = player.weapon.as_ref().map(|w| w.kind());
    let wanted_kind = match wanted {
        WeaponKey::Pistol => WeaponKind::Ranged,
        WeaponKey::Knife => WeaponKind::Melee,
        WeaponKey::GrenadeLauncher => WeaponKind::Grenade,
    };
    if current != Some(wanted_kind) {
        input.equip_slot = WeaponKey::ALL
            .iter()
            .position(|k| *k == wanted)
            .map(|i| i as u8 + 1);
    }

    let (ax, ay) = axis_toward(to_enemy);
    if distance > AUTOPILOT_KNIFE_RANGE * 0.5 {
        (input.move_x, input.move_y) = (ax, ay);
    }
    let aim = axis_to_direction(ax, ay);
    input.use_weapon = distance <= AUTOPILOT_KNIFE_RANGE || (distance > 0.0 && aim.dot(to_enemy / distance) > 0.92);
    input
}

/// Snap a direction to one of eight movement axes
fn axis_toward(v: Vec2) -> (i8, i8) {
    let (ax, ay) = (v.x.abs(), v.y.abs());
    let sign = |c: f32| -> i8 { if c == 0.0 { 0 } else { c.signum() as i8 } };
    if ax > ay * 2.4 {
        (sign(v.x), 0)
    } else if ay > ax * 2.4 {
        (0, sign(v.y))
    } else {
        (sign(v.x), sign(v.y))
    }
}
