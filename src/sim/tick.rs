//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec3;

use super::collision::{self, CollisionEvent};
use super::events::{EntityKind, RemovalReason, SimEvent, TickOutput};
use super::hostile::HostileKind;
use super::particles::EffectStyle;
use super::schedule::Scheduled;
use super::state::{EntityId, GamePhase, GameState};
use crate::audio::{SoundCue, SoundEffect};
use crate::tuning::AmbientEffects;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal move intent in [-1, 1]
    pub move_x: f32,
    /// Vertical move intent in [-1, 1]
    pub move_y: f32,
    /// Fire held
    pub fire: bool,
    /// Pause toggle (edge)
    pub pause: bool,
    /// Start from the start screen
    pub start: bool,
    /// Restart after game over
    pub restart: bool,
    /// Attract mode - AI flies the ship
    pub autopilot: bool,
}

const LASER: SoundCue = SoundCue::new(SoundEffect::Laser, 0.1);
const GAME_OVER: SoundCue = SoundCue::new(SoundEffect::GameOver, 0.2);

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> TickOutput {
    if input.start {
        state.start();
    }
    if input.pause {
        state.toggle_pause();
    }
    if input.restart {
        state.restart();
    }

    let mut out = TickOutput {
        events: state.take_pending(),
        ..Default::default()
    };
    let score_before = state.score();
    let health_before = state.health();

    let playing = state.phase() == GamePhase::Playing;
    if playing {
        let input = if input.autopilot {
            autopilot(state, input)
        } else {
            input.clone()
        };
        step_world(state, &input, dt, &mut out);
    }

    if playing || state.tuning.ambient_effects == AmbientEffects::AlwaysAnimate {
        advance_effects(state, dt, &mut out);
    }

    if playing {
        if state.session.is_depleted() {
            game_over(state);
        }
        state.session_ms += dt as f64 * 1000.0;
    }

    state.time_ticks += 1;
    out.events.extend(state.take_pending());
    out.score_delta = state.score().saturating_sub(score_before);
    out.health_delta = state.health() as i64 - health_before as i64;
    out.phase = state.phase();
    out
}

/// Spawner, weapons, collisions and breaches for one Playing tick
fn step_world(state: &mut GameState, input: &TickInput, dt: f32, out: &mut TickOutput) {
    let now = state.session_ms;

    for action in state.schedule.drain_due(now) {
        match action {
            Scheduled::EndFlash(id) => {
                // Gone already: nothing to revert
                if let Some(hostile) = state.spawner.get_mut(id) {
                    hostile.flashing = false;
                    out.push(SimEvent::FlashEnded { id });
                }
            }
        }
    }

    state
        .player
        .steer(input.move_x, input.move_y, state.tuning.player_speed, dt);

    // Hostiles
    if let Some(hostile) = state.spawner.try_spawn(now, &mut state.ids) {
        out.push(SimEvent::Spawned {
            id: hostile.id,
            kind: EntityKind::Hostile(hostile.kind),
            pos: hostile.pos,
        });
    }
    state.spawner.advance_all(dt);

    // Weapons
    let ready = state
        .last_shot_ms
        .is_none_or(|last| now - last > state.tuning.fire_interval_ms);
    if input.fire && ready {
        fire(state, now, out);
    }
    for bolt in state.weapons.advance(dt) {
        out.push(SimEvent::Removed {
            id: bolt.id,
            kind: EntityKind::Projectile,
            reason: RemovalReason::OutOfRange,
        });
    }

    // Bolts against hostiles, then anything that slipped past
    let hits = collision::resolve(&mut state.weapons.projectiles, &mut state.spawner.hostiles);
    for event in hits {
        apply_collision(state, event, now, out);
    }
    for event in collision::resolve_breaches(&mut state.spawner) {
        apply_collision(state, event, now, out);
    }
}

fn fire(state: &mut GameState, now: f64, out: &mut TickOutput) {
    let mut muzzles = Vec::with_capacity(2);
    let fired = state
        .weapons
        .fire(state.player.pos, now, &mut state.ids, |pos| muzzles.push(pos));
    state.last_shot_ms = Some(now);

    for bolt in fired {
        out.push(SimEvent::Spawned {
            id: bolt.id,
            kind: EntityKind::Projectile,
            pos: bolt.pos,
        });
    }
    for pos in muzzles {
        let flash = state.spawn_effect(EffectStyle::MuzzleFlash, pos);
        out.push(flash);
        let trail = state.spawn_effect(EffectStyle::LaserTrail, pos);
        out.push(trail);
    }
    out.push(SimEvent::Sound(LASER));
}

fn apply_collision(state: &mut GameState, event: CollisionEvent, now: f64, out: &mut TickOutput) {
    match event {
        CollisionEvent::BossHit {
            hostile,
            projectile,
            at,
            health_left,
        } => {
            out.push(spent_bolt(projectile));
            out.push(SimEvent::Hit {
                id: hostile,
                pos: at,
                health_left,
            });
            let spark = state.spawn_effect(EffectStyle::HitSpark, at);
            out.push(spark);
            out.push(SimEvent::Sound(SoundCue::new(SoundEffect::Explosion, 0.15)));
            out.push(SimEvent::FlashStarted { id: hostile });

            // A killed boss is already gone, so there is nothing to revert
            if let Some(boss) = state.spawner.get_mut(hostile) {
                boss.flashing = true;
                state
                    .schedule
                    .at(now + state.tuning.hit_flash_ms, Scheduled::EndFlash(hostile));
            }
        }
        CollisionEvent::Destroyed {
            hostile,
            projectile,
            kind,
            pos,
        } => {
            let boss = kind == HostileKind::Boss;
            // A boss's bolt went out with its BossHit
            if !boss {
                out.push(spent_bolt(projectile));
            }
            let (score, volume) = if boss {
                (state.tuning.boss_score, 0.5)
            } else {
                (state.tuning.regular_score, 0.3)
            };
            state.session.award_kill(score);
            log::debug!("Destroyed {:?} #{} (+{})", kind, hostile, score);

            out.push(SimEvent::Destroyed {
                id: hostile,
                boss,
                pos,
                score,
            });
            let blast = state.spawn_effect(EffectStyle::Destruction { boss }, pos);
            out.push(blast);
            out.push(SimEvent::Sound(SoundCue::new(SoundEffect::Explosion, volume)));
            out.push(SimEvent::Removed {
                id: hostile,
                kind: EntityKind::Hostile(kind),
                reason: RemovalReason::Destroyed,
            });
        }
        CollisionEvent::Breached { hostile, kind, pos } => {
            let boss = kind == HostileKind::Boss;
            let (amount, volume) = if boss {
                (state.tuning.boss_breach_damage, 0.3)
            } else {
                (state.tuning.regular_breach_damage, 0.2)
            };
            let damage = state.session.damage(amount);
            log::debug!(
                "{:?} #{} breached: -{} health ({} left)",
                kind,
                hostile,
                damage,
                state.session.health()
            );

            out.push(SimEvent::Breached {
                id: hostile,
                boss,
                pos,
                damage,
            });
            let burst = state.spawn_effect(EffectStyle::Explosion, pos);
            out.push(burst);
            out.push(SimEvent::Sound(SoundCue::new(SoundEffect::Flyby, volume)));
            out.push(SimEvent::Removed {
                id: hostile,
                kind: EntityKind::Hostile(kind),
                reason: RemovalReason::Breached,
            });
        }
    }
}

fn spent_bolt(id: EntityId) -> SimEvent {
    SimEvent::Removed {
        id,
        kind: EntityKind::Projectile,
        reason: RemovalReason::Destroyed,
    }
}

fn advance_effects(state: &mut GameState, dt: f32, out: &mut TickOutput) {
    let report = state.effects.advance_all(dt);
    for (handle, particle) in report.removed {
        out.push(SimEvent::ParticleRemoved { handle, particle });
    }
    for handle in report.finished {
        out.push(SimEvent::EffectFinished { handle });
    }
}

/// Health ran out: blow up the player and end the session
fn game_over(state: &mut GameState) {
    log::info!(
        "Game over: score {}, destroyed {}, {:.1}s",
        state.score(),
        state.destroyed(),
        state.session_ms / 1000.0
    );
    state.player.visible = false;
    let pos = state.player.pos;
    state.raise(SimEvent::PlayerDestroyed { pos });
    let burst = state.spawn_effect(EffectStyle::Explosion, pos);
    state.raise(burst);
    state.raise(SimEvent::Sound(GAME_OVER));
    state.set_phase(GamePhase::GameOver);
}

/// Attract-mode pilot: chase the nearest hostile and keep firing
fn autopilot(state: &GameState, input: &TickInput) -> TickInput {
    let target = state
        .spawner
        .hostiles
        .iter()
        .max_by(|a, b| a.pos.z.total_cmp(&b.pos.z));

    let Some(target) = target else {
        return TickInput {
            move_x: 0.0,
            move_y: 0.0,
            fire: false,
            ..input.clone()
        };
    };

    // Line the wing guns up under the target
    let aim = Vec3::new(target.pos.x, target.pos.y - 0.6, 0.0) - state.player.pos;
    TickInput {
        move_x: (aim.x * 0.5).clamp(-1.0, 1.0),
        move_y: (aim.y * 0.5).clamp(-1.0, 1.0),
        fire: true,
        ..input.clone()
    }
}
