//! Session counters: score, health and kills
//!
//! The only place these values change. Health is clamped to `[0, max]`,
//! score only ever grows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    score: u64,
    health: u32,
    max_health: u32,
    destroyed: u32,
}

impl Session {
    pub fn new(max_health: u32) -> Self {
        Self {
            score: 0,
            health: max_health,
            max_health,
            destroyed: 0,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Remaining health in [0, 1] for the HUD bar
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }

    pub fn destroyed(&self) -> u32 {
        self.destroyed
    }

    pub fn is_depleted(&self) -> bool {
        self.health == 0
    }

    /// Credit a kill
    pub fn award_kill(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
        self.destroyed = self.destroyed.saturating_add(1);
    }

    /// Apply damage, returning how much health was actually lost
    pub fn damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        lost
    }

    /// Back to a fresh session
    pub fn reset(&mut self) {
        *self = Self::new(self.max_health);
    }
}
