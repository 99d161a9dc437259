//! Hostile spawning and procedural flight behavior
//!
//! Hostiles appear on a fixed timer at the far plane and fly toward the
//! player along one of four movement patterns. Everything random about a
//! hostile is rolled once at spawn from the spawner's own seeded RNG.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::{EntityId, IdAllocator, RngState};
use crate::consts::{BOSS_HALF_EXTENTS, REGULAR_HALF_EXTENTS};
use crate::tuning::{Span, Tuning};

/// Hostile class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostileKind {
    Regular,
    Boss,
}

/// Procedural trajectory, fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Weave left/right
    SineX,
    /// Bob up/down
    SineY,
    /// Spiral around the spawn point
    Circular,
    /// No lateral motion
    Straight,
}

impl MovementPattern {
    pub fn from_index(index: u32) -> Self {
        match index % 4 {
            0 => MovementPattern::SineX,
            1 => MovementPattern::SineY,
            2 => MovementPattern::Circular,
            _ => MovementPattern::Straight,
        }
    }
}

/// An adversary craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostile {
    pub id: EntityId,
    pub kind: HostileKind,
    pub pos: Vec3,
    /// Forward speed toward the player (units/s)
    pub speed: f32,
    pub pattern: MovementPattern,
    /// Lateral displacement per unit of depth
    pub amplitude: f32,
    pub frequency: f32,
    /// Orbit center (spawn x/y)
    pub center: Vec2,
    /// Pattern clock, starts at a random phase
    pub clock: f32,
    /// Engine pulse clock (presentation only)
    pub pulse: f32,
    pub health: u32,
    pub max_health: u32,
    /// Depth this hostile spawned at
    pub spawn_depth: f32,
    /// Tinted by a recent hit
    pub flashing: bool,
}

impl Hostile {
    pub fn is_boss(&self) -> bool {
        self.kind == HostileKind::Boss
    }

    /// Remaining health in [0, 1] (boss health bar)
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }

    /// Register one projectile hit. Returns true when this destroys the hostile.
    pub fn take_hit(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.health == 0
    }

    pub fn half_extents(&self) -> Vec3 {
        match self.kind {
            HostileKind::Regular => REGULAR_HALF_EXTENTS,
            HostileKind::Boss => BOSS_HALF_EXTENTS,
        }
    }

    /// World-space bounding box
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.half_extents())
    }

    /// Move forward and apply the movement pattern
    pub fn advance(&mut self, dt: f32, clock_rate: f32, pulse_rate: f32) {
        self.pos.z += self.speed * dt;
        self.clock += clock_rate * dt;
        self.pulse += pulse_rate * dt;

        // Weave amplitude shrinks as the hostile closes on the player plane
        let reach = self.amplitude * self.pos.z.abs();
        let phase = self.clock * self.frequency;
        match self.pattern {
            MovementPattern::SineX => {
                self.pos.x = self.center.x + phase.sin() * reach;
            }
            MovementPattern::SineY => {
                self.pos.y = self.center.y + phase.sin() * reach;
            }
            MovementPattern::Circular => {
                self.pos.x = self.center.x + phase.sin() * reach;
                self.pos.y = self.center.y + phase.cos() * reach;
            }
            MovementPattern::Straight => {}
        }
    }

    /// Engine glow intensity; bosses pulse harder
    pub fn pulse_intensity(&self) -> f32 {
        match self.kind {
            HostileKind::Regular => 0.5 + self.pulse.sin() * 0.2,
            HostileKind::Boss => 0.7 + self.pulse.sin() * 0.3,
        }
    }

    /// Engine trail opacity, fading out over the last stretch of the approach
    pub fn trail_opacity(&self) -> f32 {
        let travelled = self.pos.z - self.spawn_depth;
        let fade = ((travelled - 30.0) / 10.0).clamp(0.0, 1.0);
        0.6 * (1.0 - fade)
    }
}

/// Spawn parameters lifted out of [`Tuning`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SpawnProfile {
    interval_ms: f64,
    boss_chance: f64,
    half_width: f32,
    half_height: f32,
    depth: f32,
    regular_speed: Span,
    boss_speed: Span,
    amplitude: Span,
    frequency: Span,
    phase: Span,
    clock_rate: f32,
    pulse_rate: f32,
    boss_hit_points: u32,
    breach_depth: f32,
}

impl From<&Tuning> for SpawnProfile {
    fn from(t: &Tuning) -> Self {
        Self {
            interval_ms: t.spawn_interval_ms.max(1.0),
            boss_chance: t.boss_chance.clamp(0.0, 1.0),
            half_width: t.spawn_half_width,
            half_height: t.spawn_half_height,
            depth: t.spawn_depth,
            regular_speed: t.regular_speed,
            boss_speed: t.boss_speed,
            amplitude: t.pattern_amplitude,
            frequency: t.pattern_frequency,
            phase: t.pattern_phase,
            clock_rate: t.pattern_clock_rate,
            pulse_rate: t.pulse_clock_rate,
            boss_hit_points: t.boss_hit_points.max(1),
            breach_depth: t.breach_depth,
        }
    }
}

/// Owns the live hostiles and the timer that produces them
#[derive(Debug, Clone)]
pub struct HostileSpawner {
    profile: SpawnProfile,
    rng: Pcg32,
    /// Elapsed time the next spawn is due at (always a multiple of the interval)
    next_spawn_ms: f64,
    pub hostiles: Vec<Hostile>,
}

impl HostileSpawner {
    /// RNG stream reserved for spawning
    pub const RNG_STREAM: u64 = 1;

    pub fn new(tuning: &Tuning, rng: &RngState) -> Self {
        Self {
            profile: SpawnProfile::from(tuning),
            rng: rng.to_rng(Self::RNG_STREAM),
            next_spawn_ms: 0.0,
            hostiles: Vec::new(),
        }
    }

    /// Spawn a hostile if the interval has elapsed. At most one per call;
    /// a long stall skips the missed slots instead of bursting.
    pub fn try_spawn(&mut self, elapsed_ms: f64, ids: &mut IdAllocator) -> Option<&Hostile> {
        if elapsed_ms < self.next_spawn_ms {
            return None;
        }
        let interval = self.profile.interval_ms;
        self.next_spawn_ms = ((elapsed_ms / interval).floor() + 1.0) * interval;

        let hostile = self.roll_hostile(ids.allocate());
        log::debug!(
            "Spawned {:?} #{} ({:?}) at ({:.1}, {:.1})",
            hostile.kind,
            hostile.id,
            hostile.pattern,
            hostile.pos.x,
            hostile.pos.y
        );
        self.hostiles.push(hostile);
        self.hostiles.last()
    }

    fn roll_hostile(&mut self, id: EntityId) -> Hostile {
        let p = &self.profile;
        let rng = &mut self.rng;

        let kind = if rng.random_bool(p.boss_chance) {
            HostileKind::Boss
        } else {
            HostileKind::Regular
        };

        let x = (rng.random::<f32>() - 0.5) * 2.0 * p.half_width;
        let y = (rng.random::<f32>() - 0.5) * 2.0 * p.half_height;

        let pattern = MovementPattern::from_index(rng.random_range(0..4));
        let amplitude = p.amplitude.lerp(rng.random());
        let frequency = p.frequency.lerp(rng.random());
        let clock = p.phase.lerp(rng.random());

        let (speed, health) = match kind {
            HostileKind::Regular => (p.regular_speed.lerp(rng.random()), 1),
            HostileKind::Boss => (p.boss_speed.lerp(rng.random()), p.boss_hit_points),
        };

        Hostile {
            id,
            kind,
            pos: Vec3::new(x, y, p.depth),
            speed,
            pattern,
            amplitude,
            frequency,
            center: Vec2::new(x, y),
            clock,
            pulse: 0.0,
            health,
            max_health: health,
            spawn_depth: p.depth,
            flashing: false,
        }
    }

    /// Advance one hostile by `dt` seconds
    pub fn advance(&self, hostile: &mut Hostile, dt: f32) {
        hostile.advance(dt, self.profile.clock_rate, self.profile.pulse_rate);
    }

    /// Advance every live hostile
    pub fn advance_all(&mut self, dt: f32) {
        let (clock_rate, pulse_rate) = (self.profile.clock_rate, self.profile.pulse_rate);
        for hostile in &mut self.hostiles {
            hostile.advance(dt, clock_rate, pulse_rate);
        }
    }

    /// Has this hostile crossed the player's plane?
    pub fn cull_if_breached(&self, hostile: &Hostile) -> bool {
        hostile.pos.z > self.profile.breach_depth
    }

    pub fn get(&self, id: EntityId) -> Option<&Hostile> {
        self.hostiles.iter().find(|h| h.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Hostile> {
        self.hostiles.iter_mut().find(|h| h.id == id)
    }

    /// (id, health fraction) of every live boss
    pub fn boss_health(&self) -> Vec<(EntityId, f32)> {
        self.hostiles
            .iter()
            .filter(|h| h.is_boss())
            .map(|h| (h.id, h.health_fraction()))
            .collect()
    }

    /// Drop all hostiles and restart the timer from `elapsed_ms`
    pub fn reset(&mut self, elapsed_ms: f64) -> Vec<Hostile> {
        self.next_spawn_ms = elapsed_ms;
        std::mem::take(&mut self.hostiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawner(seed: u64) -> HostileSpawner {
        HostileSpawner::new(&Tuning::default(), &RngState::new(seed))
    }

    #[test]
    fn test_spawns_on_interval_multiples() {
        let mut s = spawner(1);
        let mut ids = IdAllocator::default();
        let mut spawn_times = Vec::new();

        // 60 Hz for a little over 5 seconds
        for tick in 0..=310 {
            let elapsed = tick as f64 * 1000.0 / 60.0;
            if s.try_spawn(elapsed, &mut ids).is_some() {
                spawn_times.push(elapsed);
            }
        }

        assert_eq!(spawn_times.len(), 6);
        for (k, t) in spawn_times.iter().enumerate() {
            let slot = k as f64 * 1000.0;
            // First tick at or after each multiple of the interval
            assert!(*t >= slot && *t < slot + 1000.0 / 60.0, "spawn {} at {}", k, t);
        }
    }

    #[test]
    fn test_long_stall_spawns_once() {
        let mut s = spawner(2);
        let mut ids = IdAllocator::default();
        assert!(s.try_spawn(0.0, &mut ids).is_some());
        // Three intervals missed in one tick: still only one spawn
        assert!(s.try_spawn(3500.0, &mut ids).is_some());
        assert!(s.try_spawn(3600.0, &mut ids).is_none());
        assert!(s.try_spawn(4000.0, &mut ids).is_some());
        assert_eq!(s.hostiles.len(), 3);
    }

    #[test]
    fn test_boss_fraction_converges() {
        let mut s = spawner(0xB055);
        let mut ids = IdAllocator::default();
        let n = 20_000;
        let mut bosses = 0;
        for k in 0..n {
            let h = s.try_spawn(k as f64 * 1000.0, &mut ids).unwrap();
            if h.is_boss() {
                bosses += 1;
            }
        }
        let fraction = bosses as f64 / n as f64;
        assert!((fraction - 0.15).abs() < 0.015, "boss fraction {}", fraction);
    }

    #[test]
    fn test_spawn_rolls_within_ranges() {
        let t = Tuning::default();
        let mut s = spawner(3);
        let mut ids = IdAllocator::default();
        for k in 0..500 {
            let h = s.try_spawn(k as f64 * 1000.0, &mut ids).unwrap().clone();
            assert!(h.pos.x.abs() <= t.spawn_half_width);
            assert!(h.pos.y.abs() <= t.spawn_half_height);
            assert_eq!(h.pos.z, t.spawn_depth);
            assert_eq!(h.center, Vec2::new(h.pos.x, h.pos.y));
            assert!(t.pattern_amplitude.contains(h.amplitude));
            assert!(t.pattern_frequency.contains(h.frequency));
            match h.kind {
                HostileKind::Regular => {
                    assert!(t.regular_speed.contains(h.speed));
                    assert_eq!(h.health, 1);
                }
                HostileKind::Boss => {
                    assert!(t.boss_speed.contains(h.speed));
                    assert_eq!(h.health, 5);
                    assert_eq!(h.max_health, 5);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_hostiles() {
        let (mut a, mut b) = (spawner(42), spawner(42));
        let (mut ia, mut ib) = (IdAllocator::default(), IdAllocator::default());
        for k in 0..50 {
            let ha = a.try_spawn(k as f64 * 1000.0, &mut ia).unwrap().clone();
            let hb = b.try_spawn(k as f64 * 1000.0, &mut ib).unwrap().clone();
            assert_eq!(ha.pos, hb.pos);
            assert_eq!(ha.pattern, hb.pattern);
            assert_eq!(ha.kind, hb.kind);
        }
    }

    fn hostile(pattern: MovementPattern) -> Hostile {
        Hostile {
            id: 1,
            kind: HostileKind::Regular,
            pos: Vec3::new(2.0, 1.0, -40.0),
            speed: 12.0,
            pattern,
            amplitude: 0.1,
            frequency: 0.03,
            center: Vec2::new(2.0, 1.0),
            clock: 10.0,
            pulse: 0.0,
            health: 1,
            max_health: 1,
            spawn_depth: -40.0,
            flashing: false,
        }
    }

    #[test]
    fn test_patterns_displace_expected_axes() {
        let s = spawner(4);
        let dt = 0.5;

        let mut straight = hostile(MovementPattern::Straight);
        s.advance(&mut straight, dt);
        assert_eq!((straight.pos.x, straight.pos.y), (2.0, 1.0));
        assert_eq!(straight.pos.z, -34.0);

        let mut sine_x = hostile(MovementPattern::SineX);
        s.advance(&mut sine_x, dt);
        assert_ne!(sine_x.pos.x, 2.0);
        assert_eq!(sine_x.pos.y, 1.0);

        let mut sine_y = hostile(MovementPattern::SineY);
        s.advance(&mut sine_y, dt);
        assert_eq!(sine_y.pos.x, 2.0);
        assert_ne!(sine_y.pos.y, 1.0);

        let mut circular = hostile(MovementPattern::Circular);
        s.advance(&mut circular, dt);
        let offset = Vec2::new(circular.pos.x, circular.pos.y) - circular.center;
        // Radius is amplitude * |z|
        assert!((offset.length() - 0.1 * 34.0).abs() < 1e-3);
    }

    #[test]
    fn test_pattern_parameters_never_change() {
        let s = spawner(5);
        let mut h = hostile(MovementPattern::Circular);
        let before = (h.amplitude, h.frequency, h.center, h.pattern, h.speed);
        for _ in 0..120 {
            s.advance(&mut h, 1.0 / 60.0);
        }
        assert_eq!(before, (h.amplitude, h.frequency, h.center, h.pattern, h.speed));
    }

    #[test]
    fn test_breach_plane() {
        let s = spawner(6);
        let mut h = hostile(MovementPattern::Straight);
        h.pos.z = 1.9;
        assert!(!s.cull_if_breached(&h));
        h.pos.z = 2.1;
        assert!(s.cull_if_breached(&h));
    }

    #[test]
    fn test_presentation_values() {
        let mut h = hostile(MovementPattern::Straight);
        assert!((h.trail_opacity() - 0.6).abs() < 1e-6);
        h.pos.z = -5.0; // travelled 35
        assert!((h.trail_opacity() - 0.3).abs() < 1e-5);
        assert!((h.pulse_intensity() - 0.5).abs() < 1e-6);

        h.kind = HostileKind::Boss;
        h.health = 3;
        h.max_health = 5;
        assert!((h.health_fraction() - 0.6).abs() < 1e-6);
        assert!((h.pulse_intensity() - 0.7).abs() < 1e-6);
    }
}
