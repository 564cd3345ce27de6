//! Weapon catalog
//!
//! A weapon is a common header (name, damage, fire rate) plus a payload that
//! carries only the stats its kind actually uses. Every entity owns its own
//! [`Weapon`] value, built from the catalog on equip.

use serde::{Deserialize, Serialize};

use crate::consts::MIN_COOLDOWN_MS;
use crate::settings::GrenadeSettings;

/// Weapon category, also half of the cooldown key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Ranged,
    Melee,
    Grenade,
}

/// Catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKey {
    Pistol,
    Knife,
    GrenadeLauncher,
}

impl WeaponKey {
    pub const ALL: [WeaponKey; 3] = [WeaponKey::Pistol, WeaponKey::Knife, WeaponKey::GrenadeLauncher];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKey::Pistol => "pistol",
            WeaponKey::Knife => "knife",
            WeaponKey::GrenadeLauncher => "grenade_launcher",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pistol" => Some(WeaponKey::Pistol),
            "knife" => Some(WeaponKey::Knife),
            "grenade_launcher" | "grenade" => Some(WeaponKey::GrenadeLauncher),
            _ => None,
        }
    }

    /// Equip slots 1..=3 as bound on the number row
    pub fn from_slot(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(WeaponKey::Pistol),
            2 => Some(WeaponKey::Knife),
            3 => Some(WeaponKey::GrenadeLauncher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedStats {
    /// Pixels per second
    pub speed: f32,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeleeStats {
    /// Length of the hit-box along the facing axis
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrenadeStats {
    pub speed: f32,
    pub color: [u8; 3],
    pub fuse_ms: u64,
    pub explosion_radius: f32,
    pub explosion_damage: i32,
    pub max_throw_distance: f32,
}

/// Kind-specific weapon stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeaponPayload {
    Ranged(RangedStats),
    Melee(MeleeStats),
    Grenade(GrenadeStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub damage: i32,
    /// Seconds between uses
    pub fire_rate: f32,
    pub payload: WeaponPayload,
}

impl Weapon {
    /// Build a fresh instance of a catalog entry
    pub fn from_key(key: WeaponKey, grenade: &GrenadeSettings) -> Self {
        match key {
            WeaponKey::Pistol => Self {
                name: "Pistol".to_string(),
                damage: 10,
                fire_rate: 0.25,
                payload: WeaponPayload::Ranged(RangedStats {
                    speed: 720.0,
                    color: [128, 128, 128],
                }),
            },
            WeaponKey::Knife => Self {
                name: "Knife".to_string(),
                damage: 15,
                fire_rate: 0.5,
                payload: WeaponPayload::Melee(MeleeStats { range: 50.0 }),
            },
            WeaponKey::GrenadeLauncher => Self {
                name: "Grenade Launcher".to_string(),
                damage: grenade.damage,
                fire_rate: 2.0,
                payload: WeaponPayload::Grenade(GrenadeStats {
                    speed: grenade.throw_speed,
                    color: [255, 165, 0],
                    fuse_ms: grenade.fuse_ms,
                    explosion_radius: grenade.explosion_radius,
                    explosion_damage: grenade.damage,
                    max_throw_distance: grenade.max_throw_distance,
                }),
            },
        }
    }

    /// Look up a weapon by catalog name
    pub fn from_name(name: &str, grenade: &GrenadeSettings) -> Option<Self> {
        WeaponKey::from_name(name).map(|key| Self::from_key(key, grenade))
    }

    pub fn kind(&self) -> WeaponKind {
        match self.payload {
            WeaponPayload::Ranged(_) => WeaponKind::Ranged,
            WeaponPayload::Melee(_) => WeaponKind::Melee,
            WeaponPayload::Grenade(_) => WeaponKind::Grenade,
        }
    }

    /// Minimum time between two uses, never zero
    pub fn cooldown_ms(&self) -> u64 {
        if self.fire_rate.is_finite() && self.fire_rate > 0.0 {
            ((self.fire_rate * 1000.0).round() as u64).max(MIN_COOLDOWN_MS)
        } else {
            MIN_COOLDOWN_MS
        }
    }

    pub fn melee_range(&self) -> Option<f32> {
        match self.payload {
            WeaponPayload::Melee(m) => Some(m.range),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_kinds() {
        let g = GrenadeSettings::default();
        assert_eq!(Weapon::from_key(WeaponKey::Pistol, &g).kind(), WeaponKind::Ranged);
        assert_eq!(Weapon::from_key(WeaponKey::Knife, &g).kind(), WeaponKind::Melee);
        assert_eq!(
            Weapon::from_key(WeaponKey::GrenadeLauncher, &g).kind(),
            WeaponKind::Grenade
        );
    }

    #[test]
    fn test_unknown_name_is_none() {
        let g = GrenadeSettings::default();
        assert!(Weapon::from_name("railgun", &g).is_none());
        assert_eq!(Weapon::from_name(" Knife ", &g).map(|w| w.damage), Some(15));
    }

    #[test]
    fn test_cooldown_never_zero() {
        let g = GrenadeSettings::default();
        let mut w = Weapon::from_key(WeaponKey::Pistol, &g);
        assert_eq!(w.cooldown_ms(), 250);
        w.fire_rate = 0.0;
        assert_eq!(w.cooldown_ms(), 1);
        w.fire_rate = -3.0;
        assert_eq!(w.cooldown_ms(), 1);
    }

    #[test]
    fn test_slots_and_names_round_trip() {
        for (slot, key) in (1u8..=3).zip(WeaponKey::ALL) {
            assert_eq!(WeaponKey::from_slot(slot), Some(key));
            assert_eq!(WeaponKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(WeaponKey::from_slot(4), None);
    }

    #[test]
    fn test_grenade_stats_follow_settings() {
        let g = GrenadeSettings {
            damage: 90,
            explosion_radius: 40.0,
            ..Default::default()
        };
        let w = Weapon::from_key(WeaponKey::GrenadeLauncher, &g);
        match w.payload {
            WeaponPayload::Grenade(stats) => {
                assert_eq!(stats.explosion_damage, 90);
                assert_eq!(stats.explosion_radius, 40.0);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
