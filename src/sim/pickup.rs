//! Collectible items dropped into the world

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::geometry::Aabb;
use super::player::Player;
use crate::settings::PickupSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    HealthPack,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PickupKind,
    /// World-space center
    pub pos: Vec2,
    pub size: Vec2,
    pub value: i32,
}

impl Pickup {
    pub fn health_pack(id: EntityId, pos: Vec2, settings: &PickupSettings) -> Self {
        Self {
            id,
            kind: PickupKind::HealthPack,
            pos,
            size: settings.size,
            value: settings.heal,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    /// Apply the pickup to the player; returns the health actually restored.
    ///
    /// The pickup is consumed either way.
    pub fn apply(&self, player: &mut Player) -> i32 {
        match self.kind {
            PickupKind::HealthPack => {
                let healed = player.body.heal(self.value);
                log::debug!("Player picked up health pack {} (+{healed})", self.id);
                healed
            }
        }
    }
}
