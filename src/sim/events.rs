//! Events emitted by the simulation for rendering, audio and UI feedback.
//!
//! The host drains these once per tick; the simulation never talks to a
//! scene graph or a sound device directly.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::hostile::HostileKind;
use super::particles::{EffectHandle, EffectStyle};
use super::state::{EntityId, GamePhase};
use crate::audio::SoundCue;

/// Kind of simulated entity an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Hostile(HostileKind),
    Projectile,
}

/// Why an entity left the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Shot down, or a projectile spent on a hit
    Destroyed,
    /// Hostile crossed the player's plane
    Breached,
    /// Projectile travelled past its range
    OutOfRange,
    /// Cleared by a restart
    Reset,
}

/// Something the presentation layer should react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    Spawned {
        id: EntityId,
        kind: EntityKind,
        pos: Vec3,
    },
    Removed {
        id: EntityId,
        kind: EntityKind,
        reason: RemovalReason,
    },
    /// Bolt landed on a boss; `health_left` is 0 on the killing blow
    Hit {
        id: EntityId,
        pos: Vec3,
        health_left: u32,
    },
    Destroyed {
        id: EntityId,
        boss: bool,
        pos: Vec3,
        score: u64,
    },
    Breached {
        id: EntityId,
        boss: bool,
        pos: Vec3,
        damage: u32,
    },
    /// Tint a hostile white until the matching `FlashEnded`
    FlashStarted { id: EntityId },
    FlashEnded { id: EntityId },
    EffectSpawned {
        handle: EffectHandle,
        style: EffectStyle,
        pos: Vec3,
        particles: usize,
    },
    /// Remove one particle from the scene (emitted exactly once per particle)
    ParticleRemoved { handle: EffectHandle, particle: u32 },
    EffectFinished { handle: EffectHandle },
    Sound(SoundCue),
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// Player craft blown up: hide its mesh
    PlayerDestroyed { pos: Vec3 },
    /// Player craft visible again (restart)
    PlayerRestored { pos: Vec3 },
}

/// Everything a single tick produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickOutput {
    pub events: Vec<SimEvent>,
    /// Points awarded this tick
    pub score_delta: u64,
    /// Health change this tick (never positive during play)
    pub health_delta: i64,
    /// Phase after the tick
    pub phase: GamePhase,
}

impl TickOutput {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Count events matching a predicate (handy for hosts and tests)
    pub fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}
