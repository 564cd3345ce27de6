//! Transient visual effects
//!
//! The simulation only asks for effects through [`EffectsSink`]; it never reads
//! them back. [`EffectQueue`] is the default sink: it stamps each request with
//! the current tick time and keeps it until its lifetime runs out, so a
//! renderer can pull the live set once per frame.

use glam::Vec2;

use crate::settings::Settings;

/// Receiver of fire-and-forget visual requests
pub trait EffectsSink {
    fn create_attack_visual(&mut self, center: Vec2, length: f32, thickness: f32, direction: Vec2);
    fn create_explosion_visual(&mut self, center: Vec2, radius: f32);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisualKind {
    /// Melee swipe rectangle
    Attack {
        length: f32,
        thickness: f32,
        direction: Vec2,
    },
    Explosion {
        radius: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    pub center: Vec2,
    pub kind: VisualKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl Visual {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) >= self.duration_ms
    }

    /// 1.0 when fresh, 0.0 when about to vanish
    pub fn fade(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        let age = now_ms.saturating_sub(self.created_at_ms) as f32;
        (1.0 - age / self.duration_ms as f32).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    visuals: Vec<Visual>,
    now_ms: u64,
    attack_ms: u64,
    explosion_ms: u64,
}

impl EffectQueue {
    pub fn new(settings: &Settings) -> Self {
        Self {
            visuals: Vec::new(),
            now_ms: 0,
            attack_ms: settings.melee.visual_ms,
            explosion_ms: settings.grenade.visual_ms,
        }
    }

    /// Advance the queue clock and drop visuals whose time is up
    pub fn begin_tick(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.visuals.retain(|v| !v.is_expired(now_ms));
    }

    pub fn visuals(&self) -> &[Visual] {
        &self.visuals
    }

    pub fn clear(&mut self) {
        self.visuals.clear();
    }
}

impl EffectsSink for EffectQueue {
    fn create_attack_visual(&mut self, center: Vec2, length: f32, thickness: f32, direction: Vec2) {
        self.visuals.push(Visual {
            center,
            kind: VisualKind::Attack {
                length,
                thickness,
                direction,
            },
            created_at_ms: self.now_ms,
            duration_ms: self.attack_ms,
        });
    }

    fn create_explosion_visual(&mut self, center: Vec2, radius: f32) {
        self.visuals.push(Visual {
            center,
            kind: VisualKind::Explosion { radius },
            created_at_ms: self.now_ms,
            duration_ms: self.explosion_ms,
        });
    }
}
