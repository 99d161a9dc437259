//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (one stream per subsystem)
//! - Timed actions run off the simulation clock, never wall time
//! - No rendering, audio or platform dependencies; hosts consume [`SimEvent`]s

pub mod collision;
pub mod events;
pub mod hostile;
pub mod particles;
pub mod projectile;
pub mod schedule;
pub mod session;
pub mod state;
pub mod tick;

pub use collision::{Aabb, CollisionEvent};
pub use events::{EntityKind, RemovalReason, SimEvent, TickOutput};
pub use hostile::{Hostile, HostileKind, HostileSpawner, MovementPattern};
pub use particles::{EffectHandle, EffectStyle, ParticleEngine, ParticleKind};
pub use projectile::{Projectile, ProjectileSystem};
pub use schedule::{Schedule, Scheduled};
pub use session::Session;
pub use state::{EntityId, GamePhase, GameState, PlayerCraft, RngState};
pub use tick::{TickInput, tick};
