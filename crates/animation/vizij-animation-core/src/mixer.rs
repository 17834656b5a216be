//! Mixer: owns playing actions, advances their time and blends their samples.
//!
//! Time math per loop mode:
//! - Once: time clamps to [0, duration]; a single `Finished` event fires at the end.
//! - Loop: time wraps by whole durations; each wrap reports a `Loop` event with the
//!   number of wraps this tick.
//! - PingPong: time runs over [0, 2*duration) and is reflected for sampling; every
//!   bounce counts as a loop.

use serde::{Deserialize, Serialize};

use crate::accumulate::Accumulator;
use crate::binding::{AnimationTarget, BindingSet};
use crate::data::Clip;
use crate::ids::{ActionId, IdAllocator};
use crate::outputs::MixerEvent;
use crate::sampling::sample_track;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
    PingPong,
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let m = fmod(t, 2.0 * span);
    if m <= span {
        m
    } else {
        2.0 * span - m
    }
}

/// One clip being played by a mixer.
#[derive(Debug)]
pub struct Action {
    id: ActionId,
    clip: Clip,
    /// Clip duration at the time the action started; synchronization rewrites
    /// `clip.duration` but never this value.
    authored_duration: f32,
    time: f32,
    pub weight: f32,
    pub time_scale: f32,
    pub mode: LoopMode,
    pub enabled: bool,
    loop_count: u32,
    finished: bool,
    bindings: BindingSet,
}

impl Action {
    fn new(id: ActionId, clip: Clip) -> Self {
        Self {
            id,
            authored_duration: clip.duration,
            clip,
            time: 0.0,
            weight: 1.0,
            time_scale: 1.0,
            mode: LoopMode::Loop,
            enabled: true,
            loop_count: 0,
            finished: false,
            bindings: BindingSet::default(),
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    /// Current loop length (possibly stretched by synchronization).
    pub fn duration(&self) -> f32 {
        self.clip.duration
    }

    pub fn authored_duration(&self) -> f32 {
        self.authored_duration
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.clip.duration = duration.max(0.0);
    }

    /// Local time as advanced (ping-pong time is not yet reflected).
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Jump to `time` and clear the finished latch.
    pub fn seek(&mut self, time: f32) {
        self.time = time.max(0.0);
        self.finished = false;
    }

    /// Time at which tracks are sampled.
    pub fn sample_time(&self) -> f32 {
        match self.mode {
            LoopMode::PingPong => ping_pong(self.time, self.clip.duration),
            LoopMode::Once | LoopMode::Loop => self.time,
        }
    }

    fn step_time(&mut self, dt: f32, events: &mut Vec<MixerEvent>) {
        let duration = self.clip.duration;
        let prev = self.time;
        self.time += dt * self.time_scale;
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        match self.mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    if !self.finished {
                        self.finished = true;
                        events.push(MixerEvent::Finished {
                            action: self.id,
                            clip: self.clip.name.clone(),
                        });
                    }
                } else if self.time < 0.0 {
                    self.time = 0.0;
                }
            }
            LoopMode::Loop => {
                if self.time >= duration || self.time < 0.0 {
                    let loops = (self.time / duration).floor();
                    self.time -= duration * loops;
                    self.push_loop(loops as i32, events);
                }
            }
            LoopMode::PingPong => {
                let delta = (self.time / duration).floor() - (prev / duration).floor();
                self.time = fmod(self.time, 2.0 * duration);
                if delta != 0.0 {
                    self.push_loop(delta as i32, events);
                }
            }
        }
    }

    fn push_loop(&mut self, loop_delta: i32, events: &mut Vec<MixerEvent>) {
        if loop_delta == 0 {
            return;
        }
        self.loop_count = self.loop_count.saturating_add(loop_delta.unsigned_abs());
        events.push(MixerEvent::Loop {
            action: self.id,
            clip: self.clip.name.clone(),
            loop_delta,
            affects_bones: self.clip.affects_bones(),
        });
    }
}

/// Plays clips onto a single [`AnimationTarget`].
#[derive(Debug, Default)]
pub struct Mixer {
    ids: IdAllocator,
    actions: Vec<Action>,
    accum: Accumulator,
    events: Vec<MixerEvent>,
    time: f32,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `clip` in loop mode and return its action id.
    pub fn play(&mut self, clip: Clip) -> ActionId {
        let id = self.ids.alloc_action();
        log::trace!("mixer: play '{}' as {:?} ({}s)", clip.name, id, clip.duration);
        self.actions.push(Action::new(id, clip));
        id
    }

    /// Remove an action, returning its clip.
    pub fn stop(&mut self, id: ActionId) -> Option<Clip> {
        let pos = self.actions.iter().position(|a| a.id == id)?;
        Some(self.actions.remove(pos).clip)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> impl Iterator<Item = &mut Action> {
        self.actions.iter_mut()
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.id == id)
    }

    /// Total time advanced since creation.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance all enabled actions by `dt` seconds and write the blended pose into
    /// `target`. Returns the events raised during this tick.
    pub fn advance<T: AnimationTarget + ?Sized>(&mut self, dt: f32, target: &mut T) -> &[MixerEvent] {
        self.events.clear();
        self.time += dt;

        for action in self.actions.iter_mut().filter(|a| a.enabled) {
            action.step_time(dt, &mut self.events);
        }

        self.accum.clear();
        for action in self.actions.iter_mut() {
            if !action.enabled || action.weight <= 0.0 {
                continue;
            }
            action.bindings.ensure(&action.clip, &*target);
            let t = action.sample_time();
            for (track, handle) in action.clip.tracks.iter().zip(action.bindings.handles()) {
                let Some(handle) = handle else { continue };
                if let Some(value) = sample_track(track, t) {
                    self.accum.add(*handle, &value, action.weight);
                }
            }
        }
        self.accum.apply(target);

        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_reflects() {
        assert_eq!(ping_pong(0.5, 2.0), 0.5);
        assert_eq!(ping_pong(3.0, 2.0), 1.0);
        assert_eq!(ping_pong(4.5, 2.0), 0.5);
    }

    #[test]
    fn fmod_is_positive() {
        assert_eq!(fmod(-1.0, 3.0), 2.0);
        assert_eq!(fmod(7.0, 3.0), 1.0);
        assert_eq!(fmod(1.0, 0.0), 0.0);
    }
}
