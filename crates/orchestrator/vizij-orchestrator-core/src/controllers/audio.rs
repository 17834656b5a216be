//! Playback timing for the managed audio track.
//!
//! One cycle lasts `duration` seconds (audio length plus delay unless
//! synchronization stretched it). Within a cycle the track is silent for
//! `delay` seconds, then plays through `[delay, delay + audio_duration)`.

use serde::{Deserialize, Serialize};

use crate::config::AudioParams;
use crate::objects::AudioTrack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioState {
    Idle,
    Delayed,
    Playing,
}

/// Transitions taken by one [`AudioController::control`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStep {
    pub stopped: bool,
    pub started: bool,
}

#[derive(Debug)]
pub struct AudioController {
    pub(crate) track: AudioTrack,
    delay: f32,
    audio_duration: f32,
    duration: f32,
    elapsed: f32,
    current: f32,
}

impl AudioController {
    pub fn new(track: AudioTrack, params: &AudioParams) -> Self {
        let audio_duration = track.buffer_duration();
        let delay = params.delay.max(0.0);
        Self {
            track,
            delay,
            audio_duration,
            duration: audio_duration + delay,
            elapsed: 0.0,
            current: 0.0,
        }
    }

    pub fn track(&self) -> &AudioTrack {
        &self.track
    }

    /// Length of one cycle.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Cycle length before any synchronization: audio plus delay.
    pub fn authored_duration(&self) -> f32 {
        self.audio_duration + self.delay
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration;
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Total time controlled so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Position within the current cycle (wrapped lazily while not playing).
    pub fn current_time(&self) -> f32 {
        self.current
    }

    pub fn state(&self) -> AudioState {
        if self.track.is_playing() {
            AudioState::Playing
        } else if self.current < self.delay {
            AudioState::Delayed
        } else {
            AudioState::Idle
        }
    }

    /// Advance the clock by `delta`; a non-finite delta is ignored.
    pub fn control(&mut self, delta: f32) -> AudioStep {
        if !delta.is_finite() {
            log::warn!("audio '{}': ignoring non-finite delta {delta}", self.track.name);
            return AudioStep::default();
        }
        self.elapsed += delta;
        self.current += delta;
        let mut step = AudioStep::default();
        if self.should_stop() {
            self.track.stop();
            step.stopped = true;
        }
        if self.should_start() {
            self.track.play();
            step.started = true;
        }
        step
    }

    fn should_stop(&self) -> bool {
        self.track.is_playing() && self.current >= self.duration
    }

    fn should_start(&mut self) -> bool {
        if self.track.is_playing() || self.duration <= 0.0 {
            return false;
        }
        if self.current >= self.duration {
            self.current %= self.duration;
        }
        self.current >= self.delay && self.current - self.delay < self.audio_duration
    }
}
