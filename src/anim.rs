//! Data-driven UI animation
//!
//! A [`Sequence`] is a set of channel tracks (scale, fade, colour, rotation) sharing one
//! set of [`TweenParams`]. [`AnimationStates`] maps a finite state enum to the
//! sequence played when the element enters that state. Playback is stepped
//! by the frame tick; nothing here touches a renderer, the resulting [`Pose`]
//! is what a renderer would read.

use std::collections::HashMap;
use std::hash::Hash;

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Easing curves used by the authored animation params
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ease {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    OutBack,
}

impl Ease {
    /// Map normalized time in [0, 1] through the curve
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InQuad => t * t,
            Ease::OutQuad => t * (2.0 - t),
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Ease::OutBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                let u = t - 1.0;
                1.0 + C3 * u * u * u + C1 * u * u
            }
        }
    }
}

/// Timing shared by all tracks of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TweenParams {
    pub duration: f32,
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub ease: Ease,
}

impl TweenParams {
    pub fn new(duration: f32, delay: f32, ease: Ease) -> Self {
        Self {
            duration,
            delay,
            ease,
        }
    }
}

impl Default for TweenParams {
    fn default() -> Self {
        Self::new(0.2, 0.0, Ease::OutQuad)
    }
}

/// Visual properties an animation can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Scale,
    Fade,
    Color,
    /// Degrees around the view axis
    Rotation,
}

/// Current animated values of one element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub scale: f32,
    pub alpha: f32,
    pub color: Vec4,
    #[serde(default)]
    pub rotation: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            scale: 1.0,
            alpha: 1.0,
            color: Vec4::ONE,
            rotation: 0.0,
        }
    }
}

impl Pose {
    fn get(&self, channel: Channel) -> Vec4 {
        match channel {
            Channel::Scale => Vec4::splat(self.scale),
            Channel::Fade => Vec4::splat(self.alpha),
            Channel::Color => self.color,
            Channel::Rotation => Vec4::splat(self.rotation),
        }
    }

    fn set(&mut self, channel: Channel, value: Vec4) {
        match channel {
            Channel::Scale => self.scale = value.x,
            Channel::Fade => self.alpha = value.x,
            Channel::Color => self.color = value,
            Channel::Rotation => self.rotation = value.x,
        }
    }
}

/// One channel animated from a start value to a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub channel: Channel,
    /// Start value; `None` starts from whatever the pose holds on restart
    pub from: Option<Vec4>,
    pub to: Vec4,
    /// Play forward then back (doubles the track length)
    pub yoyo: bool,
    resolved_from: Vec4,
}

impl Track {
    pub fn new(channel: Channel, from: Option<Vec4>, to: Vec4) -> Self {
        Self {
            channel,
            from,
            to,
            yoyo: false,
            resolved_from: from.unwrap_or(to),
        }
    }

    pub fn scale(to: f32) -> Self {
        Self::new(Channel::Scale, None, Vec4::splat(to))
    }

    pub fn fade(from: f32, to: f32) -> Self {
        Self::new(Channel::Fade, Some(Vec4::splat(from)), Vec4::splat(to))
    }

    pub fn color(to: Vec4) -> Self {
        Self::new(Channel::Color, None, to)
    }

    /// Spin from `from` to `to` degrees
    pub fn rotation(from: f32, to: f32) -> Self {
        Self::new(Channel::Rotation, Some(Vec4::splat(from)), Vec4::splat(to))
    }

    pub fn starting_at(mut self, from: Vec4) -> Self {
        self.from = Some(from);
        self.resolved_from = from;
        self
    }

    pub fn yoyo(mut self) -> Self {
        self.yoyo = true;
        self
    }
}

/// A group of tracks played together
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    tracks: Vec<Track>,
    params: TweenParams,
    /// Seconds since restart, negative while the delay runs
    elapsed: f32,
    playing: bool,
}

impl Sequence {
    pub fn new(params: TweenParams) -> Self {
        Self {
            tracks: Vec::new(),
            params,
            elapsed: -params.delay,
            playing: false,
        }
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn params(&self) -> TweenParams {
        self.params
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Total length including yoyo legs, excluding the delay
    pub fn length(&self) -> f32 {
        let legs = if self.tracks.iter().any(|t| t.yoyo) { 2.0 } else { 1.0 };
        self.params.duration * legs
    }

    /// Start from the beginning, capturing unset start values from `pose`
    pub fn restart(&mut self, pose: &Pose) {
        for track in &mut self.tracks {
            track.resolved_from = track.from.unwrap_or_else(|| pose.get(track.channel));
        }
        self.elapsed = -self.params.delay;
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Continue a paused sequence from where it stopped
    pub fn resume(&mut self) {
        self.playing = true;
    }

    /// Back to the start without playing; the pose returns to start values
    pub fn rewind(&mut self, pose: &mut Pose) {
        self.elapsed = -self.params.delay;
        self.playing = false;
        for track in &self.tracks {
            pose.set(track.channel, track.resolved_from);
        }
    }

    /// Advance and write into `pose`. Returns `true` on the tick it finishes.
    pub fn tick(&mut self, dt: f32, pose: &mut Pose) -> bool {
        if !self.playing {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed < 0.0 {
            return false;
        }

        let duration = self.params.duration.max(f32::EPSILON);
        let finished = self.elapsed >= self.length();
        for track in &self.tracks {
            let mut t = (self.elapsed / duration).min(if track.yoyo { 2.0 } else { 1.0 });
            if track.yoyo && t > 1.0 {
                t = 2.0 - t;
            }
            let k = self.params.ease.apply(t.min(1.0));
            pose.set(track.channel, track.resolved_from.lerp(track.to, k));
        }

        if finished {
            self.playing = false;
        }
        finished
    }
}

/// State → sequence table for one UI element
#[derive(Debug, Clone)]
pub struct AnimationStates<S> {
    sequences: HashMap<S, Sequence>,
    current: S,
    first_run: bool,
    pose: Pose,
}

impl<S: Copy + Eq + Hash> AnimationStates<S> {
    pub fn builder(default_state: S) -> AnimationStatesBuilder<S> {
        AnimationStatesBuilder {
            default_state,
            sequences: HashMap::new(),
            pose: Pose::default(),
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn is_animating(&self) -> bool {
        self.sequences
            .get(&self.current)
            .is_some_and(Sequence::is_playing)
    }

    /// Enter `state`, restarting its sequence.
    ///
    /// Re-entering the current state is ignored after the first play. States
    /// without a sequence are ignored entirely.
    pub fn play(&mut self, state: S) {
        if self.current == state && !self.first_run {
            return;
        }
        if let Some(current) = self.sequences.get_mut(&self.current) {
            current.pause();
        }
        if let Some(next) = self.sequences.get_mut(&state) {
            next.restart(&self.pose);
            self.current = state;
            self.first_run = false;
        }
    }

    pub fn tick(&mut self, dt: f32) -> bool {
        match self.sequences.get_mut(&self.current) {
            Some(seq) => seq.tick(dt, &mut self.pose),
            None => false,
        }
    }

    /// Element hidden: every sequence rewound and paused
    pub fn disable(&mut self) {
        for seq in self.sequences.values_mut() {
            seq.rewind(&mut self.pose);
        }
    }
}

pub struct AnimationStatesBuilder<S> {
    default_state: S,
    sequences: HashMap<S, Sequence>,
    pose: Pose,
}

impl<S: Copy + Eq + Hash> AnimationStatesBuilder<S> {
    pub fn state(mut self, state: S, sequence: Sequence) -> Self {
        self.sequences.insert(state, sequence);
        self
    }

    pub fn pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn build(self) -> AnimationStates<S> {
        AnimationStates {
            sequences: self.sequences,
            current: self.default_state,
            first_run: true,
            pose: self.pose,
        }
    }
}
