//! Starfighter - A third-person arcade space combat game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, weapons, collisions, effects, game state)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences (quality, audio)
//! - `audio`: Sound cue vocabulary and a sink that tolerates unloaded assets

pub mod audio;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use audio::{AudioManager, SoundCue, SoundEffect};
pub use settings::{QualityPreset, Settings};
pub use tuning::{AmbientEffects, Tuning};

use glam::Vec3;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (one tick per rendered frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Frame rate the per-frame decay factors were authored against
    pub const REFERENCE_FPS: f32 = 60.0;

    /// Flight envelope the player craft is clamped to
    pub const ENVELOPE_MIN_X: f32 = -15.0;
    pub const ENVELOPE_MAX_X: f32 = 15.0;
    pub const ENVELOPE_MIN_Y: f32 = -8.0;
    pub const ENVELOPE_MAX_Y: f32 = 8.0;

    /// Player sits on this depth plane
    pub const PLAYER_PLANE_Z: f32 = 0.0;

    /// Wing hardpoints projectiles leave from (relative to the player)
    pub const WING_OFFSETS: [Vec3; 2] = [Vec3::new(-1.0, 0.6, 0.0), Vec3::new(1.0, 0.6, 0.0)];

    /// Bounding half-extents (cockpit + wing span, boss includes its health bar)
    pub const REGULAR_HALF_EXTENTS: Vec3 = Vec3::new(1.55, 0.4, 0.5);
    pub const BOSS_HALF_EXTENTS: Vec3 = Vec3::new(4.65, 1.2, 1.5);
    /// Laser bolt: thin cylinder laid along the z axis
    pub const PROJECTILE_HALF_EXTENTS: Vec3 = Vec3::new(0.1, 0.1, 2.75);
}

/// Convert a packed 0xRRGGBB color to linear-ish 0..1 components
#[inline]
pub fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Random unit direction from uniform spherical angles (clusters slightly at the poles)
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    let angle = rng.random::<f32>() * std::f32::consts::TAU;
    let phi = rng.random::<f32>() * std::f32::consts::PI;
    Vec3::new(phi.sin() * angle.cos(), phi.sin() * angle.sin(), phi.cos())
}

/// Clamp a position to the player's flight envelope (z untouched)
#[inline]
pub fn clamp_to_envelope(pos: Vec3) -> Vec3 {
    use consts::*;
    Vec3::new(
        pos.x.clamp(ENVELOPE_MIN_X, ENVELOPE_MAX_X),
        pos.y.clamp(ENVELOPE_MIN_Y, ENVELOPE_MAX_Y),
        pos.z,
    )
}

/// Scale a per-frame multiplicative factor to an arbitrary timestep.
///
/// Decay constants are expressed "per 60 Hz frame"; this keeps them
/// frame-rate independent: `per_frame(0.97, SIM_DT) == 0.97`.
#[inline]
pub fn per_frame(factor: f32, dt: f32) -> f32 {
    factor.powf(dt * consts::REFERENCE_FPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_rgb_unpacks_channels() {
        let c = rgb(0xff6600);
        assert!((c.x - 1.0).abs() < 1e-6);
        assert!((c.y - 0.4).abs() < 1e-6);
        assert_eq!(c.z, 0.0);
    }

    #[test]
    fn test_random_unit_vector_is_normalized() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_clamp_to_envelope() {
        let p = clamp_to_envelope(Vec3::new(20.0, -9.0, 3.0));
        assert_eq!(p, Vec3::new(15.0, -8.0, 3.0));
    }

    #[test]
    fn test_per_frame_matches_reference_rate() {
        assert!((per_frame(0.97, consts::SIM_DT) - 0.97).abs() < 1e-5);
        assert!((per_frame(0.97, consts::SIM_DT * 2.0) - 0.97 * 0.97).abs() < 1e-5);
    }
}
