//! Data-driven game balance
//!
//! Every gameplay constant lives here so runs can be re-tuned from a JSON
//! file without touching the simulation. Speeds are in world units per
//! second, times in milliseconds unless the field name says otherwise.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Whether particle effects keep decaying outside of `Playing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AmbientEffects {
    /// Explosions finish animating while paused, idle, or after game over
    #[default]
    AlwaysAnimate,
    /// Effects are frozen along with the rest of the simulation
    FreezeWhenInactive,
}

/// Inclusive-exclusive range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Map a unit sample in [0, 1) onto the span
    #[inline]
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Balance values for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Spawning ===
    /// Milliseconds between hostile spawns
    pub spawn_interval_ms: f64,
    /// Probability a spawn is a boss
    pub boss_chance: f64,
    /// Lateral spawn band is x in [-half, half]
    pub spawn_half_width: f32,
    /// Vertical spawn band is y in [-half, half]
    pub spawn_half_height: f32,
    /// Far-plane depth hostiles appear at
    pub spawn_depth: f32,
    pub regular_speed: Span,
    pub boss_speed: Span,
    /// Lateral displacement per unit of depth magnitude
    pub pattern_amplitude: Span,
    pub pattern_frequency: Span,
    /// Initial pattern clock phase range
    pub pattern_phase: Span,
    /// Pattern clock advance per second
    pub pattern_clock_rate: f32,
    /// Pulse clock advance per second (presentation only)
    pub pulse_clock_rate: f32,
    pub boss_hit_points: u32,

    // === Player ===
    pub player_speed: f32,
    pub player_start: [f32; 3],
    pub max_health: u32,
    /// Hostiles past this depth have breached the player's plane
    pub breach_depth: f32,

    // === Weapons ===
    /// Minimum milliseconds between fire actions
    pub fire_interval_ms: f64,
    pub projectile_speed: f32,
    /// Projectiles are removed once their depth is below this bound
    pub projectile_max_depth: f32,

    // === Scoring / damage ===
    pub regular_score: u64,
    pub boss_score: u64,
    pub regular_breach_damage: u32,
    pub boss_breach_damage: u32,

    // === Presentation ===
    /// How long a boss stays flashed after a hit
    pub hit_flash_ms: f64,
    pub ambient_effects: AmbientEffects,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 1000.0,
            boss_chance: 0.15,
            spawn_half_width: 8.0,
            spawn_half_height: 4.0,
            spawn_depth: -40.0,
            // 0.15-0.3 and 0.1-0.2 units per 60 Hz frame
            regular_speed: Span::new(9.0, 18.0),
            boss_speed: Span::new(6.0, 12.0),
            pattern_amplitude: Span::new(0.05, 0.15),
            pattern_frequency: Span::new(0.02, 0.05),
            pattern_phase: Span::new(0.0, 100.0),
            pattern_clock_rate: 3.0,
            pulse_clock_rate: 6.0,
            boss_hit_points: 5,

            player_speed: 18.0,
            player_start: [0.0, -2.0, 0.0],
            max_health: 1000,
            breach_depth: 2.0,

            fire_interval_ms: 125.0,
            projectile_speed: 60.0,
            projectile_max_depth: -20.0,

            regular_score: 16487,
            boss_score: 97482,
            regular_breach_damage: 50,
            boss_breach_damage: 200,

            hit_flash_ms: 100.0,
            ambient_effects: AmbientEffects::AlwaysAnimate,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON (missing fields fall back to defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load tuning from a file, falling back to defaults on any problem
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Invalid tuning file {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read tuning file {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
