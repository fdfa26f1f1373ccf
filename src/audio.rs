//! Audio adapter
//!
//! Maps simulation events to procedurally described sound cues. The core
//! never touches an audio API: the host drains the queued cues each frame
//! and synthesizes them from their `Tone` descriptions.

use crate::settings::Settings;
use crate::sim::state::{GameEvent, PowerUpKind, WeaponKind};
use crate::sim::tick::EventSink;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player fired a light weapon
    Shoot,
    /// Player fired a beam or area weapon
    HeavyShot,
    EnemyHit,
    Explosion,
    /// Pickup collected
    PickupCollect,
    /// Coin collected
    Coin,
    /// Player took a hit
    PlayerHurt,
    BossWarning,
    BossPhase,
    LevelUp,
    Victory,
    GameOver,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    Noise,
}

/// Procedural description of a sound: a frequency sweep under a decaying
/// gain envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Waveform,
    pub freq_start: f32,
    pub freq_end: f32,
    pub duration: f32,
    /// Peak gain before the master/sfx volume is applied
    pub gain: f32,
}

impl SoundEffect {
    /// Sound for an event
    pub fn for_event(event: &GameEvent) -> Self {
        match event {
            GameEvent::Shoot { weapon } => match weapon {
                WeaponKind::Laser | WeaponKind::Emp | WeaponKind::BlackHole => {
                    SoundEffect::HeavyShot
                }
                _ => SoundEffect::Shoot,
            },
            GameEvent::Explosion { .. } => SoundEffect::Explosion,
            GameEvent::EnemyHit { .. } => SoundEffect::EnemyHit,
            GameEvent::PowerUp {
                kind: PowerUpKind::Coin,
            } => SoundEffect::Coin,
            GameEvent::PowerUp { .. } => SoundEffect::PickupCollect,
            GameEvent::PlayerHit { .. } => SoundEffect::PlayerHurt,
            GameEvent::BossSpawned => SoundEffect::BossWarning,
            GameEvent::BossPhase { .. } => SoundEffect::BossPhase,
            GameEvent::LevelUp { .. } => SoundEffect::LevelUp,
            GameEvent::Victory => SoundEffect::Victory,
            GameEvent::GameOver => SoundEffect::GameOver,
        }
    }

    pub fn tone(&self) -> Tone {
        let tone = |wave: Waveform, freq_start: f32, freq_end: f32, duration: f32, gain: f32| Tone {
            wave,
            freq_start,
            freq_end,
            duration,
            gain,
        };
        match self {
            SoundEffect::Shoot => tone(Waveform::Square, 880.0, 440.0, 0.08, 0.2),
            SoundEffect::HeavyShot => tone(Waveform::Sawtooth, 220.0, 110.0, 0.3, 0.3),
            SoundEffect::EnemyHit => tone(Waveform::Triangle, 300.0, 200.0, 0.06, 0.3),
            SoundEffect::Explosion => tone(Waveform::Noise, 120.0, 40.0, 0.4, 0.6),
            SoundEffect::PickupCollect => tone(Waveform::Sine, 600.0, 1200.0, 0.2, 0.4),
            SoundEffect::Coin => tone(Waveform::Sine, 1200.0, 1800.0, 0.1, 0.3),
            SoundEffect::PlayerHurt => tone(Waveform::Square, 150.0, 60.0, 0.25, 0.5),
            SoundEffect::BossWarning => tone(Waveform::Sawtooth, 80.0, 160.0, 1.0, 0.5),
            SoundEffect::BossPhase => tone(Waveform::Sawtooth, 160.0, 80.0, 0.6, 0.5),
            SoundEffect::LevelUp => tone(Waveform::Triangle, 400.0, 800.0, 0.5, 0.4),
            SoundEffect::Victory => tone(Waveform::Triangle, 500.0, 1000.0, 1.2, 0.5),
            SoundEffect::GameOver => tone(Waveform::Sine, 400.0, 200.0, 1.0, 0.5),
        }
    }
}

/// A sound ready to play at its final volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub effect: SoundEffect,
    pub volume: f32,
}

/// Audio manager for the game
#[derive(Debug, Clone)]
pub struct AudioManager {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    queue: Vec<Cue>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            queue: Vec::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = Self::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);
        audio
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Queue a sound effect (dropped while silent)
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.queue.push(Cue {
            effect,
            volume: vol * effect.tone().gain,
        });
    }

    /// Take every cue queued since the last drain
    pub fn drain(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.queue)
    }
}

impl EventSink for AudioManager {
    fn on_event(&mut self, event: &GameEvent) {
        self.play(SoundEffect::for_event(event));
    }
}
