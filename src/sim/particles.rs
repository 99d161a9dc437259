//! Particle effect engine
//!
//! Every effect is a group of particles, each tagged with a behavior kind
//! that selects its decay law. Particles age by `dt` and are dropped the
//! same tick their lifetime reaches zero; an effect is finished once its
//! last particle is gone.
//!
//! Rates were authored per 60 Hz frame. Velocities and linear growth are
//! stored per second, multiplicative factors go through [`per_frame`].

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::RngState;
use crate::consts::REFERENCE_FPS;
use crate::{per_frame, random_unit_vector, rgb};

/// Fraction of the initial lifetime treated as zero
const LIFETIME_EPSILON: f32 = 1.0e-4;

/// Identifies one live effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectHandle(pub u32);

/// What an effect looks like, for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectStyle {
    /// Generic burst (breach, player death)
    Explosion,
    /// Half-size burst where a bolt struck a boss
    HitSpark,
    /// Composite ship destruction
    Destruction { boss: bool },
    MuzzleFlash,
    LaserTrail,
}

/// Emissive glow on hot debris, cooling over the piece's life
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glow {
    pub intensity: f32,
    /// How quickly the intensity cools (0.3..1.0)
    pub fade_rate: f32,
    /// Current emissive color, orange-red shifting to dark red
    pub emissive: Vec3,
}

/// Per-particle behavior, one decay law each
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Expanding ring, always faces the viewer
    Shockwave { expansion_rate: f32 },
    /// Bright initial flash
    Flash { fade_speed: f32 },
    /// Orange fireball core
    Core,
    /// Tumbling hull fragment
    Debris {
        /// Angular velocity (rad/s), damped every tick
        spin: Vec3,
        /// Accumulated rotation
        rotation: Vec3,
        glow: Option<Glow>,
    },
    Flame {
        flicker_speed: f32,
        flicker_intensity: f32,
    },
    Smoke { grow_rate: f32 },
    /// Plain fade, opacity = lifetime * fade
    Generic { fade: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub pos: Vec3,
    /// Units per second
    pub vel: Vec3,
    /// Seconds remaining
    pub lifetime: f32,
    pub initial_lifetime: f32,
    /// Base geometry extent
    pub size: f32,
    /// Scale applied on top of `size`, grows or shrinks by kind
    pub scale: Vec3,
    pub opacity: f32,
    pub color: Vec3,
    pub kind: ParticleKind,
}

impl Particle {
    /// Must be re-oriented toward the camera every frame
    pub fn faces_viewer(&self) -> bool {
        matches!(self.kind, ParticleKind::Shockwave { .. })
    }

    /// Lifetime has run out, allowing for the drift of summing `dt` steps
    fn expired(&self) -> bool {
        self.lifetime <= self.initial_lifetime * LIFETIME_EPSILON
    }

    /// Age and apply this particle's decay law
    fn decay(&mut self, dt: f32, clock_ms: f64) {
        self.pos += self.vel * dt;
        self.lifetime -= dt;

        let life = self.lifetime;
        let Particle {
            vel,
            scale,
            opacity,
            color,
            kind,
            ..
        } = self;

        match kind {
            ParticleKind::Shockwave { expansion_rate } => {
                scale.x += *expansion_rate * dt;
                scale.y += *expansion_rate * dt;
                *opacity = life * 1.5;
            }
            ParticleKind::Flash { fade_speed } => {
                *opacity = life * *fade_speed;
                *scale *= per_frame(1.05, dt);
            }
            ParticleKind::Core => {
                *opacity = life * 2.5;
                *scale *= per_frame(1.03, dt);
            }
            ParticleKind::Debris {
                spin,
                rotation,
                glow,
            } => {
                *opacity = life;
                *rotation += *spin * dt;
                *spin *= per_frame(0.98, dt);
                *vel *= per_frame(0.97, dt);

                if let Some(glow) = glow {
                    glow.intensity *= per_frame(1.0 - 0.01 * glow.fade_rate, dt);
                    let cool = (1.0 - life / 0.7).max(0.0);
                    glow.emissive = Vec3::new(
                        1.0,
                        (0.34 - cool * 0.34).max(0.1),
                        (0.1 - cool * 0.1).max(0.0),
                    );
                }
            }
            ParticleKind::Flame {
                flicker_speed,
                flicker_intensity,
            } => {
                let flicker = ((clock_ms * *flicker_speed as f64).sin() as f32) * *flicker_intensity;
                *opacity = (life + flicker).clamp(0.1, 1.0);
                // Swell while fresh, then burn down
                let growth = if life > 0.3 { 1.01 } else { 0.98 };
                *scale *= per_frame(growth, dt);
                *vel *= per_frame(0.99, dt);
            }
            ParticleKind::Smoke { grow_rate } => {
                *opacity = life * 0.3;
                *scale *= per_frame(*grow_rate, dt);
                let darken = 1.0 - life / 2.2;
                *color = Vec3::splat((0.6 - darken * 0.4).max(0.1));
                vel.y *= per_frame(0.99, dt);
            }
            ParticleKind::Generic { fade } => {
                *opacity = life * *fade;
            }
        }

        self.opacity = self.opacity.clamp(0.0, 1.0);
    }
}

/// A named group of particles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleEffect {
    pub handle: EffectHandle,
    pub style: EffectStyle,
    pub origin: Vec3,
    pub particles: Vec<Particle>,
}

impl ParticleEffect {
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of live particles whose kind matches
    pub fn count(&self, pred: impl Fn(&ParticleKind) -> bool) -> usize {
        self.particles.iter().filter(|p| pred(&p.kind)).count()
    }
}

/// What one `advance_all` call removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleReport {
    /// (effect, particle id) for every particle that expired
    pub removed: Vec<(EffectHandle, u32)>,
    /// Effects whose last particle expired
    pub finished: Vec<EffectHandle>,
}

const DEBRIS_COLORS: [u32; 5] = [0x444444, 0x666666, 0x888888, 0x222222, 0x553311];
const FLAME_COLORS: [u32; 5] = [0xff4400, 0xff2200, 0xffaa00, 0xffdd00, 0xffff99];

/// Size-dependent knobs for a destruction burst
struct Blast {
    count: usize,
    expansion_rate: f32,
    flash_size: f32,
    core_size: f32,
    debris_share: f32,
    flame_share: f32,
    debris_spread: f32,
    debris_size: f32,
    flame_spread: f32,
    flame_size: f32,
    smoke_spread: f32,
    smoke_size: f32,
}

impl Blast {
    fn new(is_boss: bool) -> Self {
        if is_boss {
            Self {
                count: 350,
                expansion_rate: 0.25,
                flash_size: 1.0,
                core_size: 0.9,
                debris_share: 0.4,
                flame_share: 0.8,
                debris_spread: 0.7,
                debris_size: 0.2,
                flame_spread: 0.5,
                flame_size: 0.15,
                smoke_spread: 0.8,
                smoke_size: 0.5,
            }
        } else {
            Self {
                count: 200,
                expansion_rate: 0.15,
                flash_size: 0.6,
                core_size: 0.5,
                debris_share: 0.35,
                flame_share: 0.75,
                debris_spread: 0.3,
                debris_size: 0.15,
                flame_spread: 0.25,
                flame_size: 0.07,
                smoke_spread: 0.4,
                smoke_size: 0.3,
            }
        }
    }
}

/// Owns all live effects and the RNG that shapes them
#[derive(Debug, Clone)]
pub struct ParticleEngine {
    rng: Pcg32,
    effects: Vec<ParticleEffect>,
    next_handle: u32,
    next_particle: u32,
    /// Simulated milliseconds, drives flame flicker
    clock_ms: f64,
    /// Live particle cap; spawns past it are dropped
    max_particles: usize,
    live: usize,
}

impl ParticleEngine {
    /// RNG stream reserved for effects
    pub const RNG_STREAM: u64 = 2;

    pub fn new(rng: &RngState, max_particles: usize) -> Self {
        Self {
            rng: rng.to_rng(Self::RNG_STREAM),
            effects: Vec::new(),
            next_handle: 1,
            next_particle: 1,
            clock_ms: 0.0,
            max_particles,
            live: 0,
        }
    }

    pub fn set_budget(&mut self, max_particles: usize) {
        self.max_particles = max_particles;
    }

    pub fn budget(&self) -> usize {
        self.max_particles
    }

    pub fn live_particles(&self) -> usize {
        self.live
    }

    pub fn effects(&self) -> &[ParticleEffect] {
        &self.effects
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&ParticleEffect> {
        self.effects.iter().find(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Spawn an effect by style
    pub fn spawn(&mut self, style: EffectStyle, pos: Vec3) -> EffectHandle {
        match style {
            EffectStyle::Explosion => self.spawn_explosion(pos),
            EffectStyle::HitSpark => self.spawn_hit_effect(pos),
            EffectStyle::Destruction { boss } => self.spawn_destruction_effect(pos, boss),
            EffectStyle::MuzzleFlash => self.spawn_muzzle_flash(pos),
            EffectStyle::LaserTrail => self.spawn_laser_trail(pos),
        }
    }

    /// 100 white sparks flying out in random directions
    pub fn spawn_explosion(&mut self, pos: Vec3) -> EffectHandle {
        self.burst(EffectStyle::Explosion, pos, 1.0)
    }

    /// Half-scale burst for a non-fatal boss hit
    pub fn spawn_hit_effect(&mut self, pos: Vec3) -> EffectHandle {
        self.burst(EffectStyle::HitSpark, pos, 0.5)
    }

    fn burst(&mut self, style: EffectStyle, pos: Vec3, scale: f32) -> EffectHandle {
        let mut particles = Vec::new();
        for _ in 0..100 {
            let speed = 0.1 + self.rng.random::<f32>() * 0.2;
            let vel = random_unit_vector(&mut self.rng) * speed * REFERENCE_FPS;
            particles.push(self.particle(
                pos,
                vel,
                0.5,
                0.05,
                rgb(0xffffff),
                1.0,
                ParticleKind::Generic { fade: 1.0 },
            ));
        }
        for p in &mut particles {
            p.scale = Vec3::splat(scale);
        }
        self.register(style, pos, particles)
    }

    /// Composite destruction: shockwave, flash and core, then a weighted mix
    /// of debris, flame and smoke
    pub fn spawn_destruction_effect(&mut self, pos: Vec3, is_boss: bool) -> EffectHandle {
        let b = Blast::new(is_boss);
        let mut particles = Vec::with_capacity(b.count + 3);

        particles.push(self.particle(
            pos,
            Vec3::ZERO,
            0.6,
            0.5,
            rgb(0xffdd88),
            0.9,
            ParticleKind::Shockwave {
                expansion_rate: b.expansion_rate * REFERENCE_FPS,
            },
        ));
        particles.push(self.particle(
            pos,
            Vec3::ZERO,
            0.15,
            b.flash_size,
            rgb(0xffffff),
            0.9,
            ParticleKind::Flash { fade_speed: 6.0 },
        ));
        particles.push(self.particle(pos, Vec3::ZERO, 0.3, b.core_size, rgb(0xff6600), 0.8, ParticleKind::Core));

        for _ in 0..b.count {
            let roll: f32 = self.rng.random();
            let p = if roll < b.debris_share {
                self.debris(pos, &b)
            } else if roll < b.flame_share {
                self.flame(pos, &b)
            } else {
                self.smoke(pos, &b)
            };
            particles.push(p);
        }

        self.register(EffectStyle::Destruction { boss: is_boss }, pos, particles)
    }

    fn jitter(&mut self, spread: f32) -> Vec3 {
        Vec3::new(
            (self.rng.random::<f32>() - 0.5) * spread,
            (self.rng.random::<f32>() - 0.5) * spread,
            (self.rng.random::<f32>() - 0.5) * spread,
        )
    }

    fn debris(&mut self, center: Vec3, b: &Blast) -> Particle {
        let size = 0.05 + self.rng.random::<f32>() * b.debris_size;
        let color = rgb(DEBRIS_COLORS[self.rng.random_range(0..DEBRIS_COLORS.len())]);
        let glow = if self.rng.random_bool(0.3) {
            Some(Glow {
                intensity: 0.5 + self.rng.random::<f32>() * 0.5,
                fade_rate: 0.3 + self.rng.random::<f32>() * 0.7,
                emissive: rgb(0xff2200),
            })
        } else {
            None
        };

        let offset = self.jitter(b.debris_spread);
        // Ejected straight out from the blast center
        let speed = 0.15 + self.rng.random::<f32>() * 0.4;
        let vel = offset.normalize_or_zero() * speed * REFERENCE_FPS;
        let spin = self.jitter(0.3) * REFERENCE_FPS;
        let lifetime = 0.7 + self.rng.random::<f32>();

        self.particle(
            center + offset,
            vel,
            lifetime,
            size,
            color,
            1.0,
            ParticleKind::Debris {
                spin,
                rotation: Vec3::ZERO,
                glow,
            },
        )
    }

    fn flame(&mut self, center: Vec3, b: &Blast) -> Particle {
        let size = 0.02 + self.rng.random::<f32>() * b.flame_size;
        let color = rgb(FLAME_COLORS[self.rng.random_range(0..FLAME_COLORS.len())]);
        let opacity = 0.7 + self.rng.random::<f32>() * 0.3;
        let offset = self.jitter(b.flame_spread);

        let speed = 0.05 + self.rng.random::<f32>() * 0.2;
        let lift = 0.2 + self.rng.random::<f32>() * 0.4;
        let vel = self.rising(speed, lift);

        let flicker_speed = 0.1 + self.rng.random::<f32>() * 0.2;
        let flicker_intensity = 0.1 + self.rng.random::<f32>() * 0.3;
        let lifetime = 0.05 + self.rng.random::<f32>() * 0.15;

        self.particle(
            center + offset,
            vel,
            lifetime,
            size,
            color,
            opacity,
            ParticleKind::Flame {
                flicker_speed,
                flicker_intensity,
            },
        )
    }

    fn smoke(&mut self, center: Vec3, b: &Blast) -> Particle {
        let size = 0.15 + self.rng.random::<f32>() * b.smoke_size;
        let color = if self.rng.random_bool(0.3) {
            rgb(0x999999)
        } else {
            rgb(0x666666)
        };
        let opacity = 0.4 + self.rng.random::<f32>() * 0.3;
        let offset = self.jitter(b.smoke_spread);

        let speed = 0.02 + self.rng.random::<f32>() * 0.1;
        let lift = 0.3 + self.rng.random::<f32>() * 0.5;
        let vel = self.rising(speed, lift);

        let lifetime = 0.3 + self.rng.random::<f32>() * 0.4;
        let grow_rate = 1.01 + self.rng.random::<f32>() * 0.01;

        self.particle(
            center + offset,
            vel,
            lifetime,
            size,
            color,
            opacity,
            ParticleKind::Smoke { grow_rate },
        )
    }

    /// Loose lateral drift with an upward bias, per second
    fn rising(&mut self, speed: f32, lift: f32) -> Vec3 {
        Vec3::new(
            (self.rng.random::<f32>() - 0.5) * speed,
            (self.rng.random::<f32>() + lift) * speed,
            (self.rng.random::<f32>() - 0.5) * speed,
        ) * REFERENCE_FPS
    }

    /// Yellow flash at a wing muzzle, gone in ten frames
    pub fn spawn_muzzle_flash(&mut self, pos: Vec3) -> EffectHandle {
        let p = self.particle(
            pos,
            Vec3::ZERO,
            10.0 / REFERENCE_FPS,
            0.1,
            rgb(0xffff00),
            1.0,
            ParticleKind::Generic { fade: 6.0 },
        );
        self.register(EffectStyle::MuzzleFlash, pos, vec![p])
    }

    /// Thin green streak behind a fresh bolt, gone in four frames
    pub fn spawn_laser_trail(&mut self, pos: Vec3) -> EffectHandle {
        let p = self.particle(
            pos,
            Vec3::ZERO,
            4.0 / REFERENCE_FPS,
            0.3,
            rgb(0x00ff00),
            0.8,
            ParticleKind::Generic { fade: 12.0 },
        );
        self.register(EffectStyle::LaserTrail, pos, vec![p])
    }

    #[allow(clippy::too_many_arguments)]
    fn particle(
        &mut self,
        pos: Vec3,
        vel: Vec3,
        lifetime: f32,
        size: f32,
        color: Vec3,
        opacity: f32,
        kind: ParticleKind,
    ) -> Particle {
        let id = self.next_particle;
        self.next_particle = self.next_particle.wrapping_add(1);
        Particle {
            id,
            pos,
            vel,
            lifetime,
            initial_lifetime: lifetime,
            size,
            scale: Vec3::ONE,
            opacity,
            color,
            kind,
        }
    }

    /// Store a new effect, keeping only as many particles as the budget allows
    fn register(&mut self, style: EffectStyle, origin: Vec3, mut particles: Vec<Particle>) -> EffectHandle {
        let room = self.max_particles.saturating_sub(self.live);
        if particles.len() > room {
            log::debug!(
                "Particle budget reached: {:?} trimmed from {} to {}",
                style,
                particles.len(),
                room
            );
            particles.truncate(room);
        }
        self.live += particles.len();

        let handle = EffectHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.effects.push(ParticleEffect {
            handle,
            style,
            origin,
            particles,
        });
        handle
    }

    /// Advance every effect by `dt` seconds
    pub fn advance_all(&mut self, dt: f32) -> ParticleReport {
        self.clock_ms += dt as f64 * 1000.0;
        let clock_ms = self.clock_ms;
        let mut report = ParticleReport::default();

        for effect in &mut self.effects {
            let handle = effect.handle;
            effect.particles.retain_mut(|p| {
                p.decay(dt, clock_ms);
                if p.expired() {
                    report.removed.push((handle, p.id));
                    false
                } else {
                    true
                }
            });
        }
        self.live = self.live.saturating_sub(report.removed.len());

        self.effects.retain(|e| {
            if e.is_empty() {
                report.finished.push(e.handle);
                false
            } else {
                true
            }
        });

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn engine() -> ParticleEngine {
        ParticleEngine::new(&RngState::new(99), 6000)
    }

    fn is_debris(k: &ParticleKind) -> bool {
        matches!(k, ParticleKind::Debris { .. })
    }

    fn is_flame(k: &ParticleKind) -> bool {
        matches!(k, ParticleKind::Flame { .. })
    }

    fn is_smoke(k: &ParticleKind) -> bool {
        matches!(k, ParticleKind::Smoke { .. })
    }

    #[test]
    fn test_lifetime_reaching_zero_removes_once() {
        let mut fx = engine();
        let h = fx.spawn_explosion(Vec3::ZERO);
        assert_eq!(fx.get(h).map(|e| e.len()), Some(100));

        let first = fx.advance_all(0.25);
        assert!(first.removed.is_empty());
        assert!(first.finished.is_empty());

        let second = fx.advance_all(0.25);
        assert_eq!(second.removed.len(), 100);
        assert_eq!(second.finished, vec![h]);
        assert!(fx.is_empty());
        assert_eq!(fx.live_particles(), 0);

        // Nothing left to report
        let third = fx.advance_all(0.25);
        assert_eq!(third, ParticleReport::default());
    }

    #[test]
    fn test_fixed_lifetimes_expire_on_their_tick() {
        let mut fx = engine();
        fx.spawn_destruction_effect(Vec3::ZERO, false);
        fx.spawn_explosion(Vec3::ZERO);

        // Flash 0.15 s, core 0.3 s, shockwave 0.6 s, explosion 0.5 s
        let mut due: Vec<(u32, u32)> = fx
            .effects()
            .iter()
            .flat_map(|e| e.particles.iter())
            .filter(|p| {
                matches!(
                    p.kind,
                    ParticleKind::Flash { .. }
                        | ParticleKind::Core
                        | ParticleKind::Shockwave { .. }
                        | ParticleKind::Generic { .. }
                )
            })
            .map(|p| (p.id, (p.initial_lifetime * 60.0).round() as u32))
            .collect();
        assert_eq!(due.len(), 103);

        let mut removed_at = Vec::new();
        for step in 1..=40u32 {
            for (_, id) in fx.advance_all(SIM_DT).removed {
                removed_at.push((id, step));
            }
        }
        removed_at.retain(|(id, _)| due.iter().any(|(d, _)| d == id));
        due.sort_unstable();
        removed_at.sort_unstable();
        assert_eq!(removed_at, due);
    }

    #[test]
    fn test_removed_ids_are_unique() {
        let mut fx = engine();
        fx.spawn_destruction_effect(Vec3::ZERO, true);
        let mut ids = Vec::new();
        for _ in 0..200 {
            ids.extend(fx.advance_all(1.0 / 60.0).removed.into_iter().map(|(_, id)| id));
        }
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(total, 353);
    }

    #[test]
    fn test_destruction_composition() {
        let mut fx = engine();
        let regular = fx.spawn_destruction_effect(Vec3::ZERO, false);
        let boss = fx.spawn_destruction_effect(Vec3::ZERO, true);

        let e = fx.get(regular).unwrap();
        assert_eq!(e.len(), 203);
        assert_eq!(e.count(|k| matches!(k, ParticleKind::Shockwave { .. })), 1);
        assert_eq!(e.count(|k| matches!(k, ParticleKind::Flash { .. })), 1);
        assert_eq!(e.count(|k| matches!(k, ParticleKind::Core)), 1);
        let debris = e.count(is_debris);
        let flames = e.count(is_flame);
        let smoke = e.count(is_smoke);
        assert_eq!(debris + flames + smoke, 200);
        // ~35% debris, ~40% flame, ~25% smoke
        assert!((40..=100).contains(&debris), "debris {}", debris);
        assert!((50..=110).contains(&flames), "flames {}", flames);
        assert!((25..=80).contains(&smoke), "smoke {}", smoke);

        let b = fx.get(boss).unwrap();
        assert_eq!(b.len(), 353);
        assert_eq!(b.style, EffectStyle::Destruction { boss: true });
    }

    #[test]
    fn test_effect_finishes_only_when_every_kind_is_gone() {
        let mut fx = engine();
        let h = fx.spawn_destruction_effect(Vec3::new(0.0, 0.0, -10.0), false);

        // Flash (0.15 s), core (0.3 s), flames (<= 0.2 s) are gone after 0.35 s
        for _ in 0..21 {
            assert!(fx.advance_all(1.0 / 60.0).finished.is_empty());
        }
        let e = fx.get(h).unwrap();
        assert_eq!(e.count(|k| matches!(k, ParticleKind::Flash { .. })), 0);
        assert_eq!(e.count(|k| matches!(k, ParticleKind::Core)), 0);
        assert_eq!(e.count(is_flame), 0);
        assert_eq!(e.count(|k| matches!(k, ParticleKind::Shockwave { .. })), 1);
        assert!(e.count(is_debris) > 0);

        // Debris lives up to 1.7 s
        let mut finished_at = None;
        for step in 0..120 {
            if fx.advance_all(1.0 / 60.0).finished.contains(&h) {
                finished_at = Some(step);
                break;
            }
        }
        assert!(finished_at.is_some());
        assert!(fx.get(h).is_none());
    }

    #[test]
    fn test_decay_laws() {
        let mut fx = engine();
        let h = fx.spawn_destruction_effect(Vec3::ZERO, false);
        let before = fx.get(h).unwrap().particles.clone();
        fx.advance_all(1.0 / 60.0);
        let after = &fx.get(h).unwrap().particles;

        let shock = after.iter().find(|p| p.faces_viewer()).unwrap();
        assert!((shock.scale.x - 1.15).abs() < 1e-4);
        assert_eq!(shock.scale.z, 1.0);
        assert!((shock.opacity - shock.lifetime * 1.5).abs() < 1e-6);

        let flash = after
            .iter()
            .find(|p| matches!(p.kind, ParticleKind::Flash { .. }))
            .unwrap();
        assert!((flash.scale.x - 1.05).abs() < 1e-4);

        let core = after.iter().find(|p| matches!(p.kind, ParticleKind::Core)).unwrap();
        assert!((core.scale.x - 1.03).abs() < 1e-4);

        for p in after.iter().filter(|p| is_debris(&p.kind)) {
            let old = before.iter().find(|o| o.id == p.id).unwrap();
            // Drag
            assert!((p.vel.length() - old.vel.length() * 0.97).abs() < 1e-3);
            assert!(p.opacity <= 1.0);
        }

        for p in after.iter().filter(|p| is_smoke(&p.kind)) {
            let old = before.iter().find(|o| o.id == p.id).unwrap();
            assert!(p.scale.x > 1.0);
            assert!((p.vel.x - old.vel.x).abs() < 1e-6);
            assert!(p.vel.y < old.vel.y);
            assert!((p.opacity - p.lifetime * 0.3).abs() < 1e-6);
        }

        for p in after {
            assert!(p.lifetime < p.initial_lifetime);
        }
    }

    #[test]
    fn test_hit_effect_is_half_scale() {
        let mut fx = engine();
        let h = fx.spawn_hit_effect(Vec3::ZERO);
        let e = fx.get(h).unwrap();
        assert_eq!(e.style, EffectStyle::HitSpark);
        assert!(e.particles.iter().all(|p| p.scale == Vec3::splat(0.5)));
        assert!(e.particles.iter().all(|p| p.lifetime == 0.5));
    }

    #[test]
    fn test_muzzle_flash_and_trail_are_brief() {
        let mut fx = engine();
        let flash = fx.spawn_muzzle_flash(Vec3::ZERO);
        let trail = fx.spawn_laser_trail(Vec3::ZERO);

        let mut finished = Vec::new();
        for _ in 0..11 {
            finished.extend(fx.advance_all(1.0 / 60.0).finished);
        }
        assert_eq!(finished, vec![trail, flash]);
    }

    #[test]
    fn test_budget_trims_effects() {
        let mut fx = ParticleEngine::new(&RngState::new(1), 150);
        let a = fx.spawn_explosion(Vec3::ZERO);
        let b = fx.spawn_explosion(Vec3::ZERO);
        assert_eq!(fx.get(a).unwrap().len(), 100);
        assert_eq!(fx.get(b).unwrap().len(), 50);
        assert_eq!(fx.live_particles(), 150);

        // Over budget: an empty effect that finishes on the next advance
        let c = fx.spawn_explosion(Vec3::ZERO);
        assert!(fx.get(c).unwrap().is_empty());
        assert!(fx.advance_all(0.1).finished.contains(&c));
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = engine();
        let mut b = engine();
        let ha = a.spawn_destruction_effect(Vec3::ONE, true);
        let hb = b.spawn_destruction_effect(Vec3::ONE, true);
        assert_eq!(a.get(ha).unwrap().particles, b.get(hb).unwrap().particles);
    }
}
