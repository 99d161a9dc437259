//! Collision detection and resolution
//!
//! Coarse and discrete: axis-aligned boxes tested once per tick with no
//! swept test, so a bolt moving further than a hostile's depth in one tick
//! can pass through it. That approximation is accepted.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::hostile::{Hostile, HostileKind, HostileSpawner};
use super::projectile::Projectile;
use super::state::EntityId;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Overlap test; touching faces count as overlapping
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Outcome of one overlap or breach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionEvent {
    /// A boss absorbed a bolt. The killing bolt reports this too, followed
    /// by `Destroyed` for the same bolt
    BossHit {
        hostile: EntityId,
        projectile: EntityId,
        /// Bolt position at impact
        at: Vec3,
        health_left: u32,
    },
    /// A bolt finished a hostile
    Destroyed {
        hostile: EntityId,
        projectile: EntityId,
        kind: HostileKind,
        /// Hostile position at destruction
        pos: Vec3,
    },
    /// A hostile crossed the player's plane
    Breached {
        hostile: EntityId,
        kind: HostileKind,
        pos: Vec3,
    },
}

/// Resolve bolts against hostiles.
///
/// Newest bolt first, and for each bolt newest hostile first. A bolt is
/// spent on the first hostile it overlaps, so it can damage at most one
/// hostile per call. Spent bolts and destroyed hostiles are removed.
pub fn resolve(projectiles: &mut Vec<Projectile>, hostiles: &mut Vec<Hostile>) -> Vec<CollisionEvent> {
    let mut events = Vec::new();

    for i in (0..projectiles.len()).rev() {
        let bolt_box = projectiles[i].bounds();

        let Some(j) = (0..hostiles.len())
            .rev()
            .find(|&j| bolt_box.intersects(&hostiles[j].bounds()))
        else {
            continue;
        };

        let bolt = projectiles.remove(i);
        let hostile = &mut hostiles[j];
        let destroyed = hostile.take_hit();
        if hostile.kind == HostileKind::Boss {
            events.push(CollisionEvent::BossHit {
                hostile: hostile.id,
                projectile: bolt.id,
                at: bolt.pos,
                health_left: hostile.health,
            });
        }
        if destroyed {
            events.push(CollisionEvent::Destroyed {
                hostile: hostile.id,
                projectile: bolt.id,
                kind: hostile.kind,
                pos: hostile.pos,
            });
            hostiles.remove(j);
        }
    }

    events
}

/// Remove every hostile past the player's plane, newest first.
///
/// Run after [`resolve`], so a hostile shot down this tick is already gone
/// and can never also count as a breach.
pub fn resolve_breaches(spawner: &mut HostileSpawner) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    for i in (0..spawner.hostiles.len()).rev() {
        if spawner.cull_if_breached(&spawner.hostiles[i]) {
            let hostile = spawner.hostiles.remove(i);
            events.push(CollisionEvent::Breached {
                hostile: hostile.id,
                kind: hostile.kind,
                pos: hostile.pos,
            });
        }
    }
    events
}
