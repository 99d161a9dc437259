//! Audio cue routing
//!
//! The simulation only emits [`SoundCue`]s; an [`AudioManager`] turns them
//! into backend calls. Assets load asynchronously on the host side, so any
//! cue whose asset is not ready yet is dropped silently - the gameplay event
//! it came from has already been recorded.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::{GamePhase, SimEvent};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Wing lasers fired
    Laser,
    /// Hostile hit or destroyed (volume carries severity)
    Explosion,
    /// Hostile slipped past the player
    Flyby,
    /// Session ended
    GameOver,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 4] = [
        SoundEffect::Laser,
        SoundEffect::Explosion,
        SoundEffect::Flyby,
        SoundEffect::GameOver,
    ];

    fn index(self) -> usize {
        match self {
            SoundEffect::Laser => 0,
            SoundEffect::Explosion => 1,
            SoundEffect::Flyby => 2,
            SoundEffect::GameOver => 3,
        }
    }
}

/// Looping music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTrack {
    /// Start screen
    Intro,
    /// In-game
    Background,
}

/// A request to play one sound at a relative volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub effect: SoundEffect,
    pub volume: f32,
}

impl SoundCue {
    pub const fn new(effect: SoundEffect, volume: f32) -> Self {
        Self { effect, volume }
    }
}

/// Host-provided playback (Web Audio, kira, a test recorder...)
pub trait AudioBackend {
    fn play(&mut self, effect: SoundEffect, gain: f32);
    fn start_music(&mut self, track: MusicTrack, gain: f32);
    fn stop_music(&mut self, track: MusicTrack);
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    loaded: [bool; SoundEffect::ALL.len()],
    /// Missing-asset warning already logged
    warned: [bool; SoundEffect::ALL.len()],
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    paused_volume: f32,
    /// Current multiplier (lowered while paused)
    volume_multiplier: f32,
    muted: bool,
    music: Option<MusicTrack>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioManager {
    pub fn new(backend: Option<Box<dyn AudioBackend>>) -> Self {
        if backend.is_none() {
            log::warn!("No audio backend - audio disabled");
        }
        let defaults = Settings::default();
        Self {
            backend,
            loaded: [false; SoundEffect::ALL.len()],
            warned: [false; SoundEffect::ALL.len()],
            master_volume: defaults.master_volume,
            sfx_volume: defaults.sfx_volume,
            music_volume: defaults.music_volume,
            paused_volume: defaults.paused_volume,
            volume_multiplier: 1.0,
            muted: defaults.muted,
            music: None,
        }
    }

    /// Apply volume/mute preferences
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.master_volume = settings.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = settings.music_volume.clamp(0.0, 1.0);
        self.paused_volume = settings.paused_volume.clamp(0.0, 1.0);
        self.muted = settings.muted;
    }

    /// Host reports that an asset finished loading
    pub fn mark_loaded(&mut self, effect: SoundEffect) {
        self.loaded[effect.index()] = true;
    }

    pub fn is_loaded(&self, effect: SoundEffect) -> bool {
        self.loaded[effect.index()]
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Currently playing music track
    pub fn music(&self) -> Option<MusicTrack> {
        self.music
    }

    /// Play a cue. Returns the gain used, or `None` if the cue was skipped.
    pub fn play(&mut self, cue: SoundCue) -> Option<f32> {
        if self.muted {
            return None;
        }
        if !self.is_loaded(cue.effect) {
            let warned = &mut self.warned[cue.effect.index()];
            if !*warned {
                log::warn!("Sound {:?} not loaded yet, skipping", cue.effect);
                *warned = true;
            }
            return None;
        }
        let gain = cue.volume * self.sfx_volume * self.master_volume * self.volume_multiplier;
        let backend = self.backend.as_mut()?;
        backend.play(cue.effect, gain);
        Some(gain)
    }

    /// Switch the looping track (no-op if it's already playing)
    pub fn play_music(&mut self, track: MusicTrack) {
        if self.music == Some(track) {
            return;
        }
        self.stop_music();
        let gain = self.music_volume * self.master_volume;
        if let Some(backend) = self.backend.as_mut() {
            if !self.muted {
                backend.start_music(track, gain);
            }
        }
        self.music = Some(track);
    }

    pub fn stop_music(&mut self) {
        if let Some(track) = self.music.take() {
            if let Some(backend) = self.backend.as_mut() {
                backend.stop_music(track);
            }
        }
    }

    /// Route a tick's events: sound cues and music changes on phase transitions.
    /// Returns the number of cues actually played.
    pub fn handle_events(&mut self, events: &[SimEvent]) -> usize {
        let mut played = 0;
        for event in events {
            match event {
                SimEvent::Sound(cue) => {
                    if self.play(*cue).is_some() {
                        played += 1;
                    }
                }
                SimEvent::PhaseChanged { to, .. } => self.on_phase(*to),
                _ => {}
            }
        }
        played
    }

    fn on_phase(&mut self, phase: GamePhase) {
        match phase {
            GamePhase::Idle => {
                self.volume_multiplier = 1.0;
                self.play_music(MusicTrack::Intro);
            }
            GamePhase::Playing => {
                self.volume_multiplier = 1.0;
                self.play_music(MusicTrack::Background);
            }
            GamePhase::Paused => self.volume_multiplier = self.paused_volume,
            GamePhase::GameOver => {
                self.volume_multiplier = 1.0;
                self.stop_music();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        played: Vec<(SoundEffect, f32)>,
        music: Vec<String>,
    }

    struct Recorder(Rc<RefCell<Log>>);

    impl AudioBackend for Recorder {
        fn play(&mut self, effect: SoundEffect, gain: f32) {
            self.0.borrow_mut().played.push((effect, gain));
        }
        fn start_music(&mut self, track: MusicTrack, _gain: f32) {
            self.0.borrow_mut().music.push(format!("start {:?}", track));
        }
        fn stop_music(&mut self, track: MusicTrack) {
            self.0.borrow_mut().music.push(format!("stop {:?}", track));
        }
    }

    fn manager() -> (AudioManager, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let manager = AudioManager::new(Some(Box::new(Recorder(log.clone()))));
        (manager, log)
    }

    #[test]
    fn test_unloaded_asset_is_skipped() {
        let (mut audio, log) = manager();
        assert_eq!(audio.play(SoundCue::new(SoundEffect::Laser, 0.1)), None);
        audio.mark_loaded(SoundEffect::Laser);
        assert!(audio.play(SoundCue::new(SoundEffect::Laser, 0.1)).is_some());
        assert_eq!(log.borrow().played.len(), 1);
    }

    #[test]
    fn test_no_backend_degrades() {
        let mut audio = AudioManager::default();
        audio.mark_loaded(SoundEffect::Explosion);
        assert_eq!(audio.play(SoundCue::new(SoundEffect::Explosion, 0.5)), None);
        audio.play_music(MusicTrack::Background);
        assert_eq!(audio.music(), Some(MusicTrack::Background));
    }

    #[test]
    fn test_pause_lowers_volume() {
        let (mut audio, log) = manager();
        audio.mark_loaded(SoundEffect::Explosion);
        let cue = SoundCue::new(SoundEffect::Explosion, 1.0);
        let events = [
            SimEvent::PhaseChanged { from: GamePhase::Playing, to: GamePhase::Paused },
            SimEvent::Sound(cue),
        ];
        assert_eq!(audio.handle_events(&events), 1);
        let (_, gain) = log.borrow().played[0];
        assert!((gain - 0.8 * 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_music_follows_phase() {
        let (mut audio, log) = manager();
        audio.handle_events(&[
            SimEvent::PhaseChanged { from: GamePhase::Idle, to: GamePhase::Playing },
            SimEvent::PhaseChanged { from: GamePhase::Playing, to: GamePhase::GameOver },
        ]);
        assert_eq!(log.borrow().music, vec!["start Background", "stop Background"]);
        assert_eq!(audio.music(), None);
    }

    #[test]
    fn test_muted_plays_nothing() {
        let (mut audio, log) = manager();
        audio.mark_loaded(SoundEffect::Flyby);
        audio.set_muted(true);
        assert_eq!(audio.play(SoundCue::new(SoundEffect::Flyby, 0.2)), None);
        assert!(log.borrow().played.is_empty());
    }
}
