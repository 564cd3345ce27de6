//! The damage funnel
//!
//! Every hit in the game, whether from a bullet, a knife or an explosion, goes
//! through [`CombatManager::apply_damage`]. Death handling, event emission
//! and drop rolls therefore happen in exactly one place, once per entity.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::effects::EffectsSink;
use super::entity::{Combatant, DamageOutcome, EntityId, Role};
use super::events::{EventManager, GameEvent};
use super::pickup::PickupKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCause {
    Projectile,
    Melee,
    Explosion,
}

/// Who dealt a hit and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageSource {
    pub attacker: Option<EntityId>,
    pub cause: DamageCause,
}

impl DamageSource {
    pub fn new(attacker: EntityId, cause: DamageCause) -> Self {
        Self {
            attacker: Some(attacker),
            cause,
        }
    }
}

/// Running totals for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatStats {
    pub hits: u64,
    pub kills: u64,
    pub damage_dealt: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CombatManager {
    drop_chance: f64,
    pending_drops: Vec<Vec2>,
    pub stats: CombatStats,
}

impl CombatManager {
    pub fn new(drop_chance: f64) -> Self {
        let drop_chance = if drop_chance.is_nan() { 0.0 } else { drop_chance.clamp(0.0, 1.0) };
        Self {
            drop_chance,
            pending_drops: Vec::new(),
            stats: CombatStats::default(),
        }
    }

    /// Apply `amount` damage to `target` and handle the consequences.
    ///
    /// Hits on an already dead target are ignored. A killed NPC emits
    /// `NPC_DIED` and may roll a health-pack drop; the player emits damage and
    /// death events.
    pub fn apply_damage<R: Rng + ?Sized>(
        &mut self,
        target: &mut dyn Combatant,
        amount: i32,
        source: DamageSource,
        events: &mut EventManager,
        rng: &mut R,
    ) -> DamageOutcome {
        let id = target.body().id;
        let outcome = target.body_mut().take_damage(amount);
        if outcome == DamageOutcome::Ignored {
            log::debug!("Ignoring {:?} hit on dead entity {id}", source.cause);
            return outcome;
        }
        target.on_damaged();

        self.stats.hits += 1;
        self.stats.damage_dealt += i64::from(amount.max(0));
        log::debug!("{id} took {amount} {:?} damage: {outcome:?}", source.cause);

        let pos = target.body().pos;
        match (target.role(), outcome) {
            (Role::Npc, DamageOutcome::Killed) => {
                self.stats.kills += 1;
                events.emit(&GameEvent::NpcDied {
                    npc: id,
                    pos,
                    killer: source.attacker,
                });
                if self.drop_chance > 0.0 && rng.random_bool(self.drop_chance) {
                    log::debug!("NPC {id} dropped a health pack");
                    self.pending_drops.push(pos);
                    events.emit(&GameEvent::PickupDropped {
                        pos,
                        kind: PickupKind::HealthPack,
                    });
                }
            }
            (Role::Player, DamageOutcome::Wounded { remaining }) => {
                events.emit(&GameEvent::PlayerDamaged {
                    player: id,
                    amount,
                    remaining,
                });
            }
            (Role::Player, DamageOutcome::Killed) => {
                log::info!("Player {id} died");
                events.emit(&GameEvent::PlayerDamaged {
                    player: id,
                    amount,
                    remaining: 0,
                });
                events.emit(&GameEvent::PlayerDied { player: id, pos });
            }
            _ => {}
        }
        outcome
    }

    /// Drop positions rolled since the last call
    pub fn take_drops(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.pending_drops)
    }

    pub fn reset(&mut self) {
        self.pending_drops.clear();
        self.stats = CombatStats::default();
    }
}

/// Everything a damage-dealing system needs, borrowed for one call
pub struct CombatCtx<'a> {
    pub combat: &'a mut CombatManager,
    pub events: &'a mut EventManager,
    pub effects: &'a mut dyn EffectsSink,
    pub rng: &'a mut Pcg32,
}

impl CombatCtx<'_> {
    pub fn damage(&mut self, target: &mut dyn Combatant, amount: i32, source: DamageSource) -> DamageOutcome {
        self.combat
            .apply_damage(target, amount, source, &mut *self.events, &mut *self.rng)
    }
}
