//! Starfighter headless runner
//!
//! Plays an attract-mode session on autopilot: drives the fixed 60 Hz
//! simulation from an uneven frame clock, routes sound cues through the
//! audio manager and logs a summary. `RUST_LOG=debug` shows every spawn,
//! kill and breach.
//!
//! Usage: `starfighter [seed] [tuning.json] [settings.json]`

use std::path::Path;

use starfighter::audio::{AudioBackend, AudioManager, MusicTrack, SoundEffect};
use starfighter::consts::{MAX_SUBSTEPS, SIM_DT};
use starfighter::settings::Settings;
use starfighter::sim::{GamePhase, GameState, SimEvent, TickInput, tick};
use starfighter::tuning::Tuning;

const DEFAULT_SEED: u64 = 0x5eed_cafe;
/// Hard stop for sessions the autopilot never loses
const MAX_FRAMES: u64 = 60 * 600;
/// Frames before the (pretend) sound assets finish loading
const ASSET_LOAD_FRAMES: u64 = 45;

/// Backend that only logs what would have been played
struct LogBackend;

impl AudioBackend for LogBackend {
    fn play(&mut self, effect: SoundEffect, gain: f32) {
        log::trace!("sfx {:?} @ {:.2}", effect, gain);
    }

    fn start_music(&mut self, track: MusicTrack, gain: f32) {
        log::debug!("music {:?} @ {:.2}", track, gain);
    }

    fn stop_music(&mut self, track: MusicTrack) {
        log::debug!("music {:?} stopped", track);
    }
}

/// Runner instance holding all state
struct Game {
    state: GameState,
    audio: AudioManager,
    accumulator: f32,
    input: TickInput,
    restarts_left: u32,
    // Totals across sessions
    ticks: u64,
    sounds_played: usize,
    events: usize,
    best_score: u64,
}

impl Game {
    fn new(seed: u64, tuning: Tuning, settings: &Settings) -> Self {
        let mut state = GameState::with_tuning(seed, tuning);
        state.apply_settings(settings);
        let mut audio = AudioManager::new(Some(Box::new(LogBackend)));
        audio.apply_settings(settings);

        Self {
            state,
            audio,
            accumulator: 0.0,
            input: TickInput {
                start: true,
                autopilot: true,
                ..Default::default()
            },
            restarts_left: 1,
            ticks: 0,
            sounds_played: 0,
            events: 0,
            best_score: 0,
        }
    }

    /// Run simulation ticks for one rendered frame
    fn update(&mut self, frame_dt: f32) {
        let dt = frame_dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let out = tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.ticks += 1;

            // Clear one-shot inputs after processing
            self.input.start = false;
            self.input.pause = false;
            self.input.restart = false;

            self.events += out.events.len();
            self.sounds_played += self.audio.handle_events(&out.events);
            self.best_score = self.best_score.max(self.state.score());

            if out
                .events
                .iter()
                .any(|e| matches!(e, SimEvent::PhaseChanged { to: GamePhase::GameOver, .. }))
                && self.restarts_left > 0
            {
                self.restarts_left -= 1;
                self.input.restart = true;
            }
        }

        // Drop backlog we refused to simulate
        if substeps == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
            log::warn!("Frame overran {} substeps, dropping {:.3}s", MAX_SUBSTEPS, self.accumulator);
            self.accumulator = 0.0;
        }
    }

    /// Stand-in for the renderer: the per-hostile values a scene would draw
    fn log_scene(&self) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        let bars = self.state.boss_health();
        for h in self.state.hostiles() {
            let bar = bars.iter().find(|(id, _)| *id == h.id).map(|(_, f)| *f);
            log::trace!(
                "{:?} #{} at {:.1?}: glow {:.2}, trail {:.2}, bar {:?}",
                h.kind,
                h.id,
                h.pos.to_array(),
                h.pulse_intensity(),
                h.trail_opacity(),
                bar
            );
        }
    }

    fn finished(&self) -> bool {
        self.state.phase() == GamePhase::GameOver && !self.input.restart
    }
}

/// Uneven frame pacing: mostly 60 Hz, some 144 Hz and 30 Hz frames, and a
/// long hitch every ten seconds
fn frame_time(frame: u64) -> f32 {
    if frame > 0 && frame % 600 == 0 {
        0.25
    } else {
        match frame % 7 {
            0 | 3 => 1.0 / 144.0,
            5 => 1.0 / 30.0,
            _ => 1.0 / 60.0,
        }
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            log::warn!("Seed '{}' is not a number, using default", arg);
            DEFAULT_SEED
        }),
        None => DEFAULT_SEED,
    };
    let tuning = match args.next() {
        Some(path) => Tuning::load_or_default(Path::new(&path)),
        None => Tuning::default(),
    };
    let settings = match args.next() {
        Some(path) => Settings::load(Path::new(&path)),
        None => Settings::default(),
    };

    log::info!("Starfighter (headless) starting, seed {}", seed);
    let mut game = Game::new(seed, tuning, &settings);

    let mut frame = 0;
    while frame < MAX_FRAMES && !game.finished() {
        if frame == ASSET_LOAD_FRAMES {
            for effect in SoundEffect::ALL {
                game.audio.mark_loaded(effect);
            }
            log::info!("Audio assets loaded");
        }
        game.update(frame_time(frame));
        if frame % 120 == 0 {
            game.log_scene();
        }
        frame += 1;
    }

    let state = &game.state;
    log::info!(
        "Done after {} frames / {} ticks: best score {}, last session score {} ({} destroyed, health {}/{}, {:.0}%)",
        frame,
        game.ticks,
        game.best_score,
        state.score(),
        state.destroyed(),
        state.health(),
        state.max_health(),
        state.session().health_fraction() * 100.0
    );
    log::info!(
        "{} events, {} sounds played, {} live effects ({} particles)",
        game.events,
        game.sounds_played,
        state.effects.len(),
        state.effects.live_particles()
    );
}
