//! Player weapon: twin wing lasers
//!
//! Fire-rate limiting is the caller's job; this system only spawns bolts,
//! moves them and drops the ones that fly out of range.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::{EntityId, IdAllocator};
use crate::consts::{PROJECTILE_HALF_EXTENTS, WING_OFFSETS};
use crate::tuning::Tuning;

/// A laser bolt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec3,
    /// Constant for the bolt's whole life
    pub vel: Vec3,
    /// Session time it was fired at
    pub spawned_ms: f64,
}

impl Projectile {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, PROJECTILE_HALF_EXTENTS)
    }
}

/// Owns every live projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSystem {
    pub projectiles: Vec<Projectile>,
    speed: f32,
    /// Bolts with depth below this are gone
    max_depth: f32,
}

impl ProjectileSystem {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            projectiles: Vec::new(),
            speed: tuning.projectile_speed,
            max_depth: tuning.projectile_max_depth,
        }
    }

    /// Fire one bolt from each wing. `on_muzzle` runs once per wing with the
    /// bolt's starting position (muzzle flash / trail cue).
    pub fn fire(
        &mut self,
        origin: Vec3,
        now_ms: f64,
        ids: &mut IdAllocator,
        mut on_muzzle: impl FnMut(Vec3),
    ) -> Vec<Projectile> {
        let vel = Vec3::new(0.0, 0.0, -self.speed);
        let fired: Vec<Projectile> = WING_OFFSETS
            .iter()
            .map(|offset| {
                let pos = origin + *offset;
                on_muzzle(pos);
                Projectile {
                    id: ids.allocate(),
                    pos,
                    vel,
                    spawned_ms: now_ms,
                }
            })
            .collect();
        self.projectiles.extend(fired.iter().cloned());
        fired
    }

    /// Move all bolts; returns the ones that left range
    pub fn advance(&mut self, dt: f32) -> Vec<Projectile> {
        for p in &mut self.projectiles {
            p.pos += p.vel * dt;
        }
        let max_depth = self.max_depth;
        let (spent, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.projectiles)
            .into_iter()
            .partition(|p| p.pos.z < max_depth);
        self.projectiles = live;
        spent
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Drop every bolt (restart)
    pub fn clear(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.projectiles)
    }
}
