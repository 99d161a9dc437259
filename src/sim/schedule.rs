//! Timed one-shot actions on the simulation clock
//!
//! Replaces wall-clock timers (e.g. "un-flash this ship in 100 ms") so tests
//! can step time deterministically.

use serde::{Deserialize, Serialize};

use super::state::EntityId;

/// Deferred action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheduled {
    /// Restore a hostile's normal colors after a hit flash
    EndFlash(EntityId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pending {
    due_ms: f64,
    action: Scheduled,
}

/// Pending actions ordered by insertion; due ones drain in due-time order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    pending: Vec<Pending>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(&mut self, due_ms: f64, action: Scheduled) {
        self.pending.push(Pending { due_ms, action });
    }

    /// Remove and return every action due at or before `now_ms`
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<Scheduled> {
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.due_ms <= now_ms {
                due.push(p.clone());
                false
            } else {
                true
            }
        });
        // Stable sort keeps insertion order for equal due times
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|p| p.action).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
