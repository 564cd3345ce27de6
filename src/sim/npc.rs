//! NPC behaviour: patrol / chase state machine
//!
//! An NPC starts in [`NpcState::Patrol`], wandering between waypoints around
//! its spawn point with short randomized pauses and a jittered pace. It
//! switches to [`NpcState::Chase`] when the player comes within its detection
//! radius or when it takes damage. What happens when the player then walks
//! out of range is decided by [`ChasePolicy`].

use glam::Vec2;
use rand::Rng;

use super::entity::{Body, Combatant, EntityId, Role};
use super::geometry::Aabb;
use super::tick::TickTime;
use super::weapon::{Weapon, WeaponKey, WeaponKind};
use crate::consts::{UNARMED_REACH_SLACK, WAYPOINT_REACHED};
use crate::is_horizontal;
use crate::settings::{ChasePolicy, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcState {
    Patrol,
    Chase,
}

/// What an NPC sees of the player this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub pos: Vec2,
    pub size: Vec2,
}

/// Decision produced by [`Npc::think`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcAction {
    Idle,
    /// In reach with a melee weapon; the weapon system decides if it lands
    Attack,
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub body: Body,
    pub facing: Vec2,
    /// Pixels per second before patrol jitter
    pub base_speed: f32,
    pub detection_radius: f32,
    pub waypoints: Vec<Vec2>,
    pub waypoint_index: usize,
    pub pause_until_ms: u64,
    pub state: NpcState,
    pub weapon: Option<Weapon>,
    /// Chasing because it was hit, not because it saw the player
    provoked: bool,
    pause_range_ms: (u64, u64),
    speed_jitter: (f32, f32),
}

impl Npc {
    pub fn new(id: EntityId, pos: Vec2, settings: &Settings, bounds: &Aabb) -> Self {
        let n = &settings.npc;
        let weapon = Weapon::from_name(&n.weapon, &settings.grenade).or_else(|| {
            log::warn!("Unknown NPC weapon {:?}, arming with a knife", n.weapon);
            Some(Weapon::from_key(WeaponKey::Knife, &settings.grenade))
        });

        let mut waypoints: Vec<Vec2> = n
            .patrol_offsets
            .iter()
            .map(|offset| Aabb::from_center(pos + *offset, n.size).clamped_into(bounds).center)
            .collect();
        if waypoints.is_empty() {
            waypoints.push(pos);
        }

        Self {
            body: Body::new(id, pos, n.size, n.health),
            facing: Vec2::X,
            base_speed: n.speed,
            detection_radius: n.detection_radius,
            waypoints,
            waypoint_index: 0,
            pause_until_ms: 0,
            state: NpcState::Patrol,
            weapon,
            provoked: false,
            pause_range_ms: n.patrol_pause_ms,
            speed_jitter: n.patrol_speed_jitter,
        }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    pub fn is_chasing(&self) -> bool {
        self.state == NpcState::Chase
    }

    /// Body radius used for hit-box and projectile spawn offsets
    pub fn radius(&self) -> f32 {
        self.body.size.x * 0.5
    }

    /// Distance at which the NPC tries to strike: weapon reach, or body contact
    pub fn attack_range(&self, target_size: Vec2) -> f32 {
        self.weapon
            .as_ref()
            .and_then(Weapon::melee_range)
            .unwrap_or(self.body.size.x * 0.5 + target_size.x * 0.5 + UNARMED_REACH_SLACK)
    }

    /// Force the chase state (being hit gives the attacker away).
    ///
    /// A provoked NPC keeps chasing under [`ChasePolicy::Revert`] until it has
    /// had the player within its detection radius at least once.
    pub fn provoke(&mut self) {
        if self.state == NpcState::Patrol {
            log::debug!("NPC {} provoked into chase", self.body.id);
            self.state = NpcState::Chase;
        }
        self.provoked = true;
    }

    pub fn is_provoked(&self) -> bool {
        self.provoked
    }

    /// Run one tick of AI: state transition, movement, attack decision
    pub fn think<R: Rng + ?Sized>(
        &mut self,
        target: Option<Target>,
        time: TickTime,
        policy: ChasePolicy,
        rng: &mut R,
    ) -> NpcAction {
        let Some(target) = target else {
            self.patrol(time, rng);
            return NpcAction::Idle;
        };

        let to_target = target.pos - self.body.pos;
        let distance = to_target.length();

        if distance <= self.detection_radius {
            self.provoked = false;
        }
        match self.state {
            NpcState::Patrol if distance <= self.detection_radius => {
                log::debug!("NPC {} spotted player at {distance:.0}px", self.body.id);
                self.state = NpcState::Chase;
            }
            NpcState::Chase
                if policy == ChasePolicy::Revert && !self.provoked && distance > self.detection_radius =>
            {
                log::debug!("NPC {} lost the player, back to patrol", self.body.id);
                self.state = NpcState::Patrol;
            }
            _ => {}
        }

        match self.state {
            NpcState::Patrol => {
                self.patrol(time, rng);
                NpcAction::Idle
            }
            NpcState::Chase => {
                if distance > 0.0 {
                    self.facing = to_target / distance;
                }
                // In reach: hold position and swing from where the reach was measured
                let has_melee = self.weapon.as_ref().map(Weapon::kind) == Some(WeaponKind::Melee);
                if has_melee && distance <= self.attack_range(target.size) {
                    return NpcAction::Attack;
                }
                if distance > 0.0 {
                    let step = (self.base_speed * time.dt).min(distance);
                    self.body.pos += self.facing * step;
                }
                NpcAction::Idle
            }
        }
    }

    fn patrol<R: Rng + ?Sized>(&mut self, time: TickTime, rng: &mut R) {
        if time.now_ms < self.pause_until_ms {
            return;
        }

        let waypoint = self.waypoints[self.waypoint_index.min(self.waypoints.len() - 1)];
        let to_waypoint = waypoint - self.body.pos;
        let distance = to_waypoint.length();

        if distance < WAYPOINT_REACHED {
            let (lo, hi) = self.pause_range_ms;
            let pause = if lo < hi { rng.random_range(lo..=hi) } else { lo };
            self.pause_until_ms = time.now_ms + pause;
            self.waypoint_index = self.pick_next_waypoint(rng);
            return;
        }

        let (lo, hi) = self.speed_jitter;
        let jitter = if lo < hi { rng.random_range(lo..=hi) } else { lo };
        let dir = to_waypoint / distance;
        // Never step past the waypoint
        let step = (self.base_speed * jitter * time.dt).min(distance);
        self.body.pos += dir * step;
        self.facing = dir;
    }

    /// A random waypoint other than the current one
    fn pick_next_waypoint<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let count = self.waypoints.len();
        if count <= 1 {
            return 0;
        }
        let pick = rng.random_range(0..count - 1);
        if pick >= self.waypoint_index { pick + 1 } else { pick }
    }
}

impl Combatant for Npc {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn role(&self) -> Role {
        Role::Npc
    }

    fn on_damaged(&mut self) {
        self.provoke();
    }
}

/// Push overlapping NPCs apart so they do not stack.
///
/// Each overlapping pair is separated along the axis where their centers are
/// furthest apart, each NPC taking half of the correction.
pub fn separate(npcs: &mut [Npc]) {
    for i in 0..npcs.len() {
        let (head, tail) = npcs.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            push_apart(a, b);
        }
    }
}

fn push_apart(a: &mut Npc, b: &mut Npc) {
    if !a.body.is_alive() || !b.body.is_alive() {
        return;
    }
    let (box_a, box_b) = (a.body.aabb(), b.body.aabb());
    if !box_a.overlaps(&box_b) {
        return;
    }

    let mut delta = a.body.pos - b.body.pos;
    if delta == Vec2::ZERO {
        delta = Vec2::ONE;
    }
    let depth = box_a.penetration(&box_b);
    if is_horizontal(delta) {
        let push = depth.x * 0.5 * delta.x.signum();
        a.body.pos.x += push;
        b.body.pos.x -= push;
    } else {
        let push = depth.y * 0.5 * delta.y.signum();
        a.body.pos.y += push;
        b.body.pos.y -= push;
    }
}
