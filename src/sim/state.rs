//! Game state and core simulation types
//!
//! Owns every subsystem plus the session counters. Lifecycle commands
//! (`start`, `toggle_pause`, `restart`) live here; the per-tick loop is in
//! [`super::tick`].

use glam::Vec3;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{EntityKind, RemovalReason, SimEvent};
use super::hostile::{Hostile, HostileSpawner};
use super::particles::{EffectStyle, ParticleEngine};
use super::projectile::{Projectile, ProjectileSystem};
use super::schedule::Schedule;
use super::session::Session;
use crate::clamp_to_envelope;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Id shared by hostiles and projectiles
pub type EntityId = u32;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, nothing spawns
    #[default]
    Idle,
    /// Active gameplay
    Playing,
    /// Session frozen, resumes into Playing
    Paused,
    /// Health ran out; waits for restart
    GameOver,
}

/// Monotonic entity id source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: EntityId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// RNG seed; each subsystem draws from its own stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self, stream: u64) -> Pcg32 {
        Pcg32::new(self.seed, stream)
    }
}

/// The player's ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerCraft {
    pub pos: Vec3,
    /// Hidden after being blown up at game over
    pub visible: bool,
}

impl PlayerCraft {
    pub fn new(pos: Vec3) -> Self {
        Self {
            pos: clamp_to_envelope(pos),
            visible: true,
        }
    }

    /// Move by an intent in [-1, 1] per axis, staying inside the flight envelope
    pub fn steer(&mut self, move_x: f32, move_y: f32, speed: f32, dt: f32) {
        let intent = Vec3::new(move_x.clamp(-1.0, 1.0), move_y.clamp(-1.0, 1.0), 0.0);
        self.pos = clamp_to_envelope(self.pos + intent * speed * dt);
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub(crate) phase: GamePhase,
    pub(crate) session: Session,
    pub player: PlayerCraft,
    pub spawner: HostileSpawner,
    pub weapons: ProjectileSystem,
    pub effects: ParticleEngine,
    pub schedule: Schedule,
    pub ids: IdAllocator,
    /// Simulated milliseconds of Playing time in this session
    pub session_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Session time of the last fire action
    pub last_shot_ms: Option<f64>,
    /// Events raised by commands, flushed by the next tick
    pending: Vec<SimEvent>,
}

impl GameState {
    /// Create a new game state with the given seed and default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let rng = RngState::new(seed);
        Self {
            seed,
            phase: GamePhase::Idle,
            session: Session::new(tuning.max_health),
            player: PlayerCraft::new(Vec3::from(tuning.player_start)),
            spawner: HostileSpawner::new(&tuning, &rng),
            weapons: ProjectileSystem::new(&tuning),
            effects: ParticleEngine::new(&rng, Settings::default().max_particles()),
            schedule: Schedule::new(),
            ids: IdAllocator::default(),
            session_ms: 0.0,
            time_ticks: 0,
            last_shot_ms: None,
            pending: Vec::new(),
            tuning,
        }
    }

    /// Pick up host preferences the simulation cares about
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.effects.set_budget(settings.max_particles());
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.session.score()
    }

    pub fn health(&self) -> u32 {
        self.session.health()
    }

    pub fn max_health(&self) -> u32 {
        self.session.max_health()
    }

    /// Hostiles shot down this session
    pub fn destroyed(&self) -> u32 {
        self.session.destroyed()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn hostiles(&self) -> &[Hostile] {
        &self.spawner.hostiles
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.weapons.projectiles
    }

    /// (id, fraction) for every live boss, for health bars
    pub fn boss_health(&self) -> Vec<(EntityId, f32)> {
        self.spawner.boss_health()
    }

    /// Idle -> Playing
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        log::info!("Session started (seed {})", self.seed);
        self.set_phase(GamePhase::Playing);
        true
    }

    /// Playing <-> Paused
    pub fn toggle_pause(&mut self) -> bool {
        let next = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            _ => return false,
        };
        log::info!(
            "{} at {:.1}s",
            if next == GamePhase::Paused { "Paused" } else { "Resumed" },
            self.session_ms / 1000.0
        );
        self.set_phase(next);
        true
    }

    /// GameOver -> Playing with a fresh session
    pub fn restart(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            return false;
        }
        log::info!(
            "Restarting (previous score {}, destroyed {})",
            self.session.score(),
            self.session.destroyed()
        );

        self.session.reset();
        for hostile in self.spawner.reset(0.0) {
            self.pending.push(SimEvent::Removed {
                id: hostile.id,
                kind: EntityKind::Hostile(hostile.kind),
                reason: RemovalReason::Reset,
            });
        }
        for bolt in self.weapons.clear() {
            self.pending.push(SimEvent::Removed {
                id: bolt.id,
                kind: EntityKind::Projectile,
                reason: RemovalReason::Reset,
            });
        }
        self.schedule.clear();
        self.session_ms = 0.0;
        self.last_shot_ms = None;

        self.player = PlayerCraft::new(Vec3::from(self.tuning.player_start));
        self.pending.push(SimEvent::PlayerRestored { pos: self.player.pos });

        self.set_phase(GamePhase::Playing);
        true
    }

    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from != to {
            self.phase = to;
            self.pending.push(SimEvent::PhaseChanged { from, to });
        }
    }

    /// Queue an event for the next tick's output
    pub(crate) fn raise(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Spawn a particle effect and describe it as an event
    pub fn spawn_effect(&mut self, style: EffectStyle, pos: Vec3) -> SimEvent {
        let handle = self.effects.spawn(style, pos);
        let particles = self.effects.get(handle).map_or(0, |e| e.len());
        SimEvent::EffectSpawned {
            handle,
            style,
            pos,
            particles,
        }
    }
}
