//! Wave progression
//!
//! ```text
//! InitialDelay --(delay)--> Active --(no NPCs left)--> Resting
//!                              ^                          |
//!                              +--(rest over, no NPCs)----+
//! ```
//!
//! Wave sizes follow a Fibonacci progression from two seed sizes. Each wave
//! is spawned in a single burst at random points away from the player.

use glam::Vec2;
use rand::Rng;

use super::entity_manager::{EntityManager, Spawn};
use super::geometry::Aabb;
use super::npc::Npc;
use crate::settings::{Settings, WaveSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavePhase {
    /// Before the first wave; the clock starts on the first update
    InitialDelay { since_ms: Option<u64> },
    Active,
    Resting { since_ms: u64 },
}

/// What happened during one [`WaveManager::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveUpdate {
    Idle,
    Started { wave: u32, count: u32 },
    Cleared { wave: u32 },
}

#[derive(Debug, Clone)]
pub struct WaveManager {
    phase: WavePhase,
    wave: u32,
    settings: WaveSettings,
}

impl WaveManager {
    pub fn new(settings: &WaveSettings) -> Self {
        Self {
            phase: WavePhase::InitialDelay { since_ms: None },
            wave: 0,
            settings: settings.clone(),
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Number of the current (or last finished) wave, 0 before the first
    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn is_active(&self) -> bool {
        self.phase == WavePhase::Active
    }

    /// Advance the wave state machine, spawning the next wave when due
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        entities: &mut EntityManager,
        rng: &mut R,
        settings: &Settings,
        world: &Aabb,
    ) -> WaveUpdate {
        let npcs_left = entities.live_npc_count();
        match self.phase {
            WavePhase::InitialDelay { since_ms: None } => {
                self.phase = WavePhase::InitialDelay { since_ms: Some(now_ms) };
                if self.settings.initial_delay_ms == 0 {
                    return self.start_next_wave(entities, rng, settings, world);
                }
                WaveUpdate::Idle
            }
            WavePhase::InitialDelay { since_ms: Some(since) } => {
                if now_ms.saturating_sub(since) >= self.settings.initial_delay_ms {
                    self.start_next_wave(entities, rng, settings, world)
                } else {
                    WaveUpdate::Idle
                }
            }
            WavePhase::Active => {
                if npcs_left == 0 {
                    log::info!("Wave {} cleared", self.wave);
                    self.phase = WavePhase::Resting { since_ms: now_ms };
                    WaveUpdate::Cleared { wave: self.wave }
                } else {
                    WaveUpdate::Idle
                }
            }
            WavePhase::Resting { since_ms } => {
                if npcs_left == 0 && now_ms.saturating_sub(since_ms) >= self.settings.rest_ms {
                    self.start_next_wave(entities, rng, settings, world)
                } else {
                    WaveUpdate::Idle
                }
            }
        }
    }

    fn start_next_wave<R: Rng + ?Sized>(
        &mut self,
        entities: &mut EntityManager,
        rng: &mut R,
        settings: &Settings,
        world: &Aabb,
    ) -> WaveUpdate {
        self.wave += 1;
        let count = wave_size(self.settings.fib_seeds, self.wave);
        let avoid = entities.player().filter(|p| p.body.is_alive()).map(|p| p.body.pos);

        for _ in 0..count {
            let pos = find_spawn_point(
                rng,
                world,
                settings.npc.size,
                avoid,
                self.settings.min_spawn_distance,
                self.settings.spawn_attempts,
            );
            let id = entities.next_id();
            entities.add(Spawn::Npc(Npc::new(id, pos, settings, world)));
        }

        log::info!("Starting wave {} with {count} NPCs", self.wave);
        self.phase = WavePhase::Active;
        WaveUpdate::Started {
            wave: self.wave,
            count,
        }
    }

    /// One-line summary for the HUD
    pub fn status_text(&self, now_ms: u64, npcs_left: usize) -> String {
        let until_next = |since: Option<u64>, wait: u64| {
            let elapsed = since.map_or(0, |s| now_ms.saturating_sub(s));
            wait.saturating_sub(elapsed) as f32 / 1000.0
        };
        match self.phase {
            WavePhase::Active => format!("Wave: {} (Active - {npcs_left} left)", self.wave),
            WavePhase::Resting { since_ms } => format!(
                "Wave: {} (Resting - Next in {:.1}s)",
                self.wave,
                until_next(Some(since_ms), self.settings.rest_ms)
            ),
            WavePhase::InitialDelay { since_ms } => format!(
                "Wave: {} (Resting - Next in {:.1}s)",
                self.wave,
                until_next(since_ms, self.settings.initial_delay_ms)
            ),
        }
    }

    pub fn reset(&mut self) {
        self.phase = WavePhase::InitialDelay { since_ms: None };
        self.wave = 0;
    }
}

/// Number of NPCs in wave `n` (1-based): the seeds for waves 1 and 2, then the
/// sum of the two previous waves. Never less than one for a real wave.
pub fn wave_size(seeds: (u32, u32), n: u32) -> u32 {
    let (mut a, mut b) = seeds;
    match n {
        0 => 0,
        1 => a.max(1),
        2 => b.max(1),
        _ => {
            for _ in 2..n {
                let next = a.saturating_add(b);
                a = b;
                b = next;
            }
            b.max(1)
        }
    }
}

/// Pick a random spawn point for a body of size `footprint` inside `bounds`.
///
/// Samples up to `attempts` points, returning the first one farther than
/// `min_distance` from `avoid`. If none qualifies the last sample is used. A
/// world too small for the footprint spawns at its center.
pub fn find_spawn_point<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: &Aabb,
    footprint: Vec2,
    avoid: Option<Vec2>,
    min_distance: f32,
    attempts: u32,
) -> Vec2 {
    let lo = bounds.min() + footprint.abs() * 0.5;
    let hi = bounds.max() - footprint.abs() * 0.5;
    if lo.x > hi.x || lo.y > hi.y {
        log::warn!("World too small for a {}x{} spawn; using world center", footprint.x, footprint.y);
        return bounds.center;
    }

    let mut last = bounds.center;
    for _ in 0..attempts.max(1) {
        let candidate = Vec2::new(rng.random_range(lo.x..=hi.x), rng.random_range(lo.y..=hi.y));
        match avoid {
            Some(p) if candidate.distance(p) <= min_distance => last = candidate,
            _ => return candidate,
        }
    }
    log::debug!("No spawn point clear of the player after {attempts} attempts");
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::{KillCounter, Player};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn world() -> Aabb {
        Aabb::from_min_size(Vec2::ZERO, Vec2::new(1280.0, 720.0))
    }

    fn kill_all(entities: &mut EntityManager) {
        for npc in entities.npcs_mut() {
            npc.body.take_damage(i32::MAX);
        }
        entities.reap_dead();
    }

    #[test]
    fn test_wave_sizes() {
        assert_eq!(wave_size((8, 13), 0), 0);
        assert_eq!(wave_size((8, 13), 1), 8);
        assert_eq!(wave_size((8, 13), 2), 13);
        assert_eq!(wave_size((8, 13), 3), 21);
        assert_eq!(wave_size((8, 13), 4), 34);
        assert_eq!(wave_size((0, 0), 5), 1);
        assert_eq!(wave_size((u32::MAX, u32::MAX), 10), u32::MAX);
    }

    #[test]
    fn test_full_cycle() {
        let settings = Settings::default();
        let mut waves = WaveManager::new(&settings.wave);
        let mut entities = EntityManager::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let w = world();

        assert_eq!(waves.update(1000, &mut entities, &mut rng, &settings, &w), WaveUpdate::Idle);
        assert_eq!(waves.status_text(1200, 0), "Wave: 0 (Resting - Next in 0.3s)");
        assert_eq!(waves.update(1499, &mut entities, &mut rng, &settings, &w), WaveUpdate::Idle);
        assert_eq!(
            waves.update(1500, &mut entities, &mut rng, &settings, &w),
            WaveUpdate::Started { wave: 1, count: 8 }
        );
        assert_eq!(entities.npcs().len(), 8);
        assert_eq!(waves.status_text(1500, 8), "Wave: 1 (Active - 8 left)");

        kill_all(&mut entities);
        assert_eq!(
            waves.update(2000, &mut entities, &mut rng, &settings, &w),
            WaveUpdate::Cleared { wave: 1 }
        );
        assert_eq!(waves.status_text(3000, 0), "Wave: 1 (Resting - Next in 2.0s)");
        assert_eq!(waves.update(4999, &mut entities, &mut rng, &settings, &w), WaveUpdate::Idle);
        assert_eq!(
            waves.update(5000, &mut entities, &mut rng, &settings, &w),
            WaveUpdate::Started { wave: 2, count: 13 }
        );
    }

    #[test]
    fn test_no_new_wave_while_npcs_remain() {
        let settings = Settings::default();
        let mut waves = WaveManager::new(&settings.wave);
        let mut entities = EntityManager::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let w = world();

        waves.update(0, &mut entities, &mut rng, &settings, &w);
        waves.update(500, &mut entities, &mut rng, &settings, &w);
        assert!(waves.is_active());
        assert_eq!(waves.update(60_000, &mut entities, &mut rng, &settings, &w), WaveUpdate::Idle);
        assert_eq!(waves.wave(), 1);
    }

    #[test]
    fn test_spawns_keep_away_from_player() {
        let settings = Settings::default();
        let mut entities = EntityManager::new();
        let id = entities.next_id();
        entities.add(Spawn::Player(Player::new(id, &settings, KillCounter::new())));
        let mut waves = WaveManager::new(&settings.wave);
        let mut rng = Pcg32::seed_from_u64(21);
        let w = world();

        waves.update(0, &mut entities, &mut rng, &settings, &w);
        waves.update(500, &mut entities, &mut rng, &settings, &w);
        let start = settings.player.start;
        for npc in entities.npcs() {
            assert!(npc.body.pos.distance(start) > settings.wave.min_spawn_distance);
        }
    }

    #[test]
    fn test_degenerate_world_spawns_at_center() {
        let mut rng = Pcg32::seed_from_u64(1);
        let tiny = Aabb::from_min_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let p = find_spawn_point(&mut rng, &tiny, Vec2::splat(30.0), None, 150.0, 20);
        assert_eq!(p, Vec2::splat(5.0));
    }

    #[test]
    fn test_unreachable_distance_falls_back_to_last_sample() {
        let mut rng = Pcg32::seed_from_u64(1);
        let bounds = world();
        let p = find_spawn_point(&mut rng, &bounds, Vec2::splat(30.0), Some(bounds.center), 10_000.0, 5);
        assert!(Aabb::from_center(p, Vec2::splat(30.0)).is_inside(&bounds));
        assert_ne!(p, bounds.center);
    }

    proptest! {
        #[test]
        fn prop_spawn_point_inside_world(
            seed in any::<u64>(),
            w in 30.0f32..5000.0,
            h in 30.0f32..5000.0,
            px in 0.0f32..5000.0,
            py in 0.0f32..5000.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let bounds = Aabb::from_min_size(Vec2::ZERO, Vec2::new(w, h));
            let footprint = Vec2::splat(30.0);
            let p = find_spawn_point(&mut rng, &bounds, footprint, Some(Vec2::new(px, py)), 150.0, 20);
            prop_assert!(Aabb::from_center(p, footprint).is_inside(&bounds));
        }

        #[test]
        fn prop_wave_sizes_are_fibonacci(a in 1u32..50, b in 1u32..50, n in 3u32..20) {
            prop_assert_eq!(wave_size((a, b), n), wave_size((a, b), n - 1) + wave_size((a, b), n - 2));
        }
    }
}
