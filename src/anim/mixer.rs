//! Animation action blending.
//!
//! Owns the four prepared actions and performs timed cross-fades between
//! them. Outside a fade exactly one action holds full weight; during a fade
//! the outgoing and incoming weights always sum to one, so an interrupted
//! fade hands its remaining weight to the new outgoing action instead of
//! leaving three partially-weighted actions behind.

use serde::{Deserialize, Serialize};

use crate::anim::clip::{Clip, Pose};

/// Minimum playback rate; keeps slow-walk feet from freezing entirely.
const MIN_RATE: f32 = 0.05;

/// Weights below this are treated as silent.
const WEIGHT_EPSILON: f32 = 1e-4;

/// The four locomotion actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionLabel {
    Idle,
    Talk,
    Walk,
    Run,
}

impl ActionLabel {
    pub const ALL: [ActionLabel; 4] = [
        ActionLabel::Idle,
        ActionLabel::Talk,
        ActionLabel::Walk,
        ActionLabel::Run,
    ];

    fn index(self) -> usize {
        match self {
            ActionLabel::Idle => 0,
            ActionLabel::Talk => 1,
            ActionLabel::Walk => 2,
            ActionLabel::Run => 3,
        }
    }

    /// Whether this action translates the avatar.
    pub fn is_moving(self) -> bool {
        matches!(self, ActionLabel::Walk | ActionLabel::Run)
    }
}

impl std::fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionLabel::Idle => write!(f, "idle"),
            ActionLabel::Talk => write!(f, "talk"),
            ActionLabel::Walk => write!(f, "walk"),
            ActionLabel::Run => write!(f, "run"),
        }
    }
}

/// One prepared, playable animation bound to the avatar skeleton.
#[derive(Debug, Clone)]
struct Action {
    clip: Clip,
    weight: f32,
    time: f32,
    rate: f32,
}

impl Action {
    fn new(clip: Clip, weight: f32) -> Self {
        Self {
            clip,
            weight,
            time: 0.0,
            rate: 1.0,
        }
    }

    fn advance(&mut self, dt: f32) {
        if self.clip.duration > 0.0 {
            self.time = (self.time + dt * self.rate) % self.clip.duration;
        }
    }
}

/// An in-flight cross-fade between two actions.
#[derive(Debug, Clone, Copy)]
struct CrossFade {
    from: ActionLabel,
    to: ActionLabel,
    elapsed: f32,
    duration: f32,
    from_start: f32,
}

/// The prepared action set with one active selector.
#[derive(Debug, Clone)]
pub struct ActionSet {
    actions: [Action; 4],
    active: ActionLabel,
    fade: Option<CrossFade>,
}

impl ActionSet {
    /// Bind the four clips. Starts at full idle weight.
    pub fn new(idle: Clip, talk: Clip, walk: Clip, run: Clip) -> Self {
        Self {
            actions: [
                Action::new(idle, 1.0),
                Action::new(talk, 0.0),
                Action::new(walk, 0.0),
                Action::new(run, 0.0),
            ],
            active: ActionLabel::Idle,
            fade: None,
        }
    }

    /// The label currently active or being faded toward.
    pub fn active(&self) -> ActionLabel {
        self.active
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn weight(&self, label: ActionLabel) -> f32 {
        self.actions[label.index()].weight
    }

    /// Labels with non-silent weight, with their weights.
    pub fn weights(&self) -> impl Iterator<Item = (ActionLabel, f32)> + '_ {
        ActionLabel::ALL
            .into_iter()
            .map(|label| (label, self.weight(label)))
            .filter(|(_, w)| *w > WEIGHT_EPSILON)
    }

    /// Scale an action's playback rate (foot cadence vs. translation speed).
    pub fn set_rate(&mut self, label: ActionLabel, rate: f32) {
        self.actions[label.index()].rate = rate.max(MIN_RATE);
    }

    /// Begin a cross-fade toward `target` over `duration` seconds. A fade in
    /// flight is interrupted: its remaining weight transfers to its target,
    /// which becomes the outgoing side of the new fade.
    pub fn transition_to(&mut self, target: ActionLabel, duration: f32) {
        if target == self.active {
            return;
        }

        if let Some(fade) = self.fade.take() {
            let residual = self.actions[fade.from.index()].weight;
            self.actions[fade.from.index()].weight = 0.0;
            self.actions[fade.to.index()].weight += residual;
        }

        let from = self.active;
        let from_start = self.actions[from.index()].weight;

        // Incoming action restarts from its first frame
        self.actions[target.index()].time = 0.0;

        self.fade = Some(CrossFade {
            from,
            to: target,
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
            from_start,
        });
        self.active = target;
    }

    /// Advance playback times and the in-flight fade.
    pub fn update(&mut self, dt: f32) {
        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            let progress = (fade.elapsed / fade.duration).clamp(0.0, 1.0);
            let from_weight = fade.from_start * (1.0 - progress);
            self.actions[fade.from.index()].weight = from_weight;
            self.actions[fade.to.index()].weight = 1.0 - from_weight;
            if progress >= 1.0 {
                self.fade = None;
            }
        }

        for action in &mut self.actions {
            if action.weight > WEIGHT_EPSILON {
                action.advance(dt);
            }
        }
    }

    /// Sample the weight-blended pose of all audible actions.
    pub fn sample_pose(&self) -> Pose {
        let mut result = Pose::new();
        let mut accumulated = 0.0f32;

        for (label, weight) in self.weights() {
            let action = &self.actions[label.index()];
            let pose = action.clip.sample(action.time);
            if accumulated <= 0.0 {
                result = pose;
            } else {
                let t = weight / (accumulated + weight);
                for (bone, transform) in pose {
                    let entry = result.entry(bone).or_default();
                    *entry = entry.blend(&transform, t);
                }
            }
            accumulated += weight;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::clip::{Track, TrackData};
    use glam::Quat;

    fn clip(name: &str, half_turn: bool) -> Clip {
        let end = if half_turn {
            Quat::from_rotation_y(std::f32::consts::PI * 0.5)
        } else {
            Quat::IDENTITY
        };
        Clip::from_tracks(
            name,
            vec![Track::new(
                "Spine",
                vec![0.0, 1.0],
                TrackData::Rotation(vec![Quat::IDENTITY, end]),
            )],
        )
    }

    fn set() -> ActionSet {
        ActionSet::new(
            clip("idle", false),
            clip("talk", false),
            clip("walk", true),
            clip("run", true),
        )
    }

    fn nonzero_weights(set: &ActionSet) -> Vec<(ActionLabel, f32)> {
        set.weights().collect()
    }

    #[test]
    fn test_starts_at_full_idle() {
        let set = set();
        assert_eq!(set.active(), ActionLabel::Idle);
        assert_eq!(nonzero_weights(&set), vec![(ActionLabel::Idle, 1.0)]);
    }

    #[test]
    fn test_fade_holds_two_weights_summing_to_one() {
        let mut set = set();
        set.transition_to(ActionLabel::Walk, 0.2);
        set.update(0.1);

        let weights = nonzero_weights(&set);
        assert_eq!(weights.len(), 2, "exactly two actions during a fade");
        let sum: f32 = weights.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-5, "weights must sum to 1, got {sum}");
        assert!((set.weight(ActionLabel::Walk) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_fade_completes_to_single_full_weight() {
        let mut set = set();
        set.transition_to(ActionLabel::Walk, 0.15);
        set.update(0.2);

        assert!(!set.is_fading());
        assert_eq!(nonzero_weights(&set), vec![(ActionLabel::Walk, 1.0)]);
    }

    #[test]
    fn test_interrupting_fade_transfers_weight() {
        let mut set = set();
        set.transition_to(ActionLabel::Walk, 0.2);
        set.update(0.1);
        // Halfway through idle→walk, redirect to run
        set.transition_to(ActionLabel::Run, 0.2);

        assert_eq!(set.weight(ActionLabel::Idle), 0.0, "interrupted source silenced");
        assert!((set.weight(ActionLabel::Walk) - 1.0).abs() < 1e-5);

        set.update(0.1);
        let weights = nonzero_weights(&set);
        assert_eq!(weights.len(), 2, "still at most two partial weights");
        let sum: f32 = weights.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-5);

        set.update(0.2);
        assert_eq!(nonzero_weights(&set), vec![(ActionLabel::Run, 1.0)]);
    }

    #[test]
    fn test_transition_to_active_label_is_noop() {
        let mut set = set();
        set.transition_to(ActionLabel::Idle, 0.3);
        assert!(!set.is_fading());
    }

    #[test]
    fn test_incoming_action_restarts() {
        let mut set = set();
        set.transition_to(ActionLabel::Walk, 0.1);
        set.update(0.2);
        let t_first = set.actions[ActionLabel::Walk.index()].time;
        assert!(t_first > 0.0);

        set.transition_to(ActionLabel::Idle, 0.1);
        set.update(0.2);
        set.transition_to(ActionLabel::Walk, 0.1);
        assert_eq!(set.actions[ActionLabel::Walk.index()].time, 0.0);
    }

    #[test]
    fn test_rate_scales_playback() {
        let mut set = set();
        set.transition_to(ActionLabel::Walk, 0.01);
        set.update(0.02);
        set.set_rate(ActionLabel::Walk, 2.0);
        let before = set.actions[ActionLabel::Walk.index()].time;
        set.update(0.1);
        let after = set.actions[ActionLabel::Walk.index()].time;
        assert!((after - before - 0.2).abs() < 1e-5, "2x rate doubles playback");
    }

    #[test]
    fn test_playback_wraps_at_clip_end() {
        let mut set = set();
        set.update(1.25);
        let t = set.actions[ActionLabel::Idle.index()].time;
        assert!((t - 0.25).abs() < 1e-5, "time should wrap, got {t}");
    }

    #[test]
    fn test_sample_pose_blends_midway() {
        let mut set = set();
        set.transition_to(ActionLabel::Walk, 0.2);
        set.update(0.1);

        // idle holds identity at t=0.1; walk at its t=0.1 is a small turn.
        // The mid-fade blend must land strictly between both.
        let pose = set.sample_pose();
        let spine = pose.get("Spine").expect("spine sampled");
        let angle = spine.rotation.unwrap().angle_between(Quat::IDENTITY);
        assert!(angle > 0.0, "blend should lean toward walk");
        let walk_angle = std::f32::consts::PI * 0.5 * 0.1;
        assert!(angle < walk_angle, "blend should not reach full walk");
    }
}
