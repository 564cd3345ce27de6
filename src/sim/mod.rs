//! Gameplay simulation
//!
//! Everything that decides what happens in a session lives here:
//! - Single-threaded, one `tick` per frame
//! - One clock sample per tick, threaded through every stage
//! - One seeded RNG for all randomness
//! - No rendering, audio or input-device dependencies

pub mod combat;
pub mod effects;
pub mod entity;
pub mod entity_manager;
pub mod events;
pub mod geometry;
pub mod npc;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod wave;
pub mod weapon;
pub mod weapon_system;
pub mod world;

pub use combat::{CombatCtx, CombatManager, DamageCause, DamageSource};
pub use effects::{EffectQueue, EffectsSink, Visual, VisualKind};
pub use entity::{Body, Combatant, DamageOutcome, EntityId, Role};
pub use entity_manager::{EntityManager, Spawn};
pub use events::{EventKind, EventManager, GameEvent, SubscriptionId};
pub use geometry::Aabb;
pub use npc::{Npc, NpcAction, NpcState, Target};
pub use pickup::{Pickup, PickupKind};
pub use player::{KillCounter, Player};
pub use projectile::{Flight, GrenadeCharge, Projectile};
pub use state::{Drawable, GamePhase, GameState, VisualHandle};
pub use tick::{TickInput, TickTime, autopilot, tick};
pub use wave::{WaveManager, WavePhase, WaveUpdate, find_spawn_point, wave_size};
pub use weapon::{Weapon, WeaponKey, WeaponKind, WeaponPayload};
pub use weapon_system::{WeaponSystem, melee_hitbox};
pub use world::{Room, World};
