//! Keyframe tracks and animation clips.
//!
//! A clip is a set of tracks, each animating one transform channel of one
//! named bone. Sampling interpolates linearly between keyframes (spherical
//! interpolation for rotations) and clamps at both ends.

use glam::{Quat, Vec3};
use std::collections::HashMap;

/// Which transform channel a track animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackProperty {
    Translation,
    Rotation,
    Scale,
}

/// Keyframe values for one track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackData {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl TrackData {
    pub fn len(&self) -> usize {
        match self {
            TrackData::Translation(v) | TrackData::Scale(v) => v.len(),
            TrackData::Rotation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn property(&self) -> TrackProperty {
        match self {
            TrackData::Translation(_) => TrackProperty::Translation,
            TrackData::Rotation(_) => TrackProperty::Rotation,
            TrackData::Scale(_) => TrackProperty::Scale,
        }
    }
}

/// A keyframe track targeting one bone's transform channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Name of the bone this track animates
    pub bone: String,
    /// Keyframe times in seconds, ascending
    pub times: Vec<f32>,
    /// Keyframe values, one per time
    pub data: TrackData,
}

impl Track {
    pub fn new(bone: impl Into<String>, times: Vec<f32>, data: TrackData) -> Self {
        debug_assert_eq!(times.len(), data.len(), "keyframe times/values mismatch");
        Self {
            bone: bone.into(),
            times,
            data,
        }
    }

    pub fn property(&self) -> TrackProperty {
        self.data.property()
    }

    /// Last keyframe time, or zero for an empty track.
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Locate the keyframe segment containing `t` and the interpolation
    /// fraction within it. Clamps outside the keyframe range.
    fn segment(&self, t: f32) -> (usize, usize, f32) {
        let n = self.times.len();
        if t <= self.times[0] {
            return (0, 0, 0.0);
        }
        if t >= self.times[n - 1] {
            return (n - 1, n - 1, 0.0);
        }
        // First index with time > t; the segment is [hi-1, hi]
        let hi = self.times.partition_point(|&kt| kt <= t);
        let lo = hi - 1;
        let span = self.times[hi] - self.times[lo];
        let frac = if span > 0.0 {
            (t - self.times[lo]) / span
        } else {
            0.0
        };
        (lo, hi, frac)
    }

    /// Sample the track at time `t` into the bone's transform slot.
    pub fn sample_into(&self, t: f32, out: &mut BoneTransform) {
        if self.times.is_empty() {
            return;
        }
        let (lo, hi, frac) = self.segment(t);
        match &self.data {
            TrackData::Translation(v) => {
                out.translation = Some(v[lo].lerp(v[hi], frac));
            }
            TrackData::Rotation(v) => {
                out.rotation = Some(v[lo].slerp(v[hi], frac));
            }
            TrackData::Scale(v) => {
                out.scale = Some(v[lo].lerp(v[hi], frac));
            }
        }
    }
}

/// Sampled local transform of one bone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoneTransform {
    pub translation: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
}

impl BoneTransform {
    /// Blend toward `other` by `t`. Channels present on only one side are
    /// taken as-is; rotations use spherical interpolation.
    pub fn blend(&self, other: &BoneTransform, t: f32) -> BoneTransform {
        BoneTransform {
            translation: blend_vec(self.translation, other.translation, t),
            rotation: match (self.rotation, other.rotation) {
                (Some(a), Some(b)) => Some(a.slerp(b, t)),
                (a, b) => b.or(a),
            },
            scale: blend_vec(self.scale, other.scale, t),
        }
    }
}

fn blend_vec(a: Option<Vec3>, b: Option<Vec3>, t: f32) -> Option<Vec3> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.lerp(b, t)),
        (a, b) => b.or(a),
    }
}

/// A sampled skeletal pose: bone name → local transform.
pub type Pose = HashMap<String, BoneTransform>;

/// A named animation clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl Clip {
    /// Build a clip from tracks; duration is the latest keyframe time.
    pub fn from_tracks(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(Track::end_time)
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Sample every track at time `t`, merging into `pose`.
    pub fn sample_into(&self, t: f32, pose: &mut Pose) {
        for track in &self.tracks {
            let entry = pose.entry(track.bone.clone()).or_default();
            track.sample_into(t, entry);
        }
    }

    /// Sample the whole clip into a fresh pose.
    pub fn sample(&self, t: f32) -> Pose {
        let mut pose = Pose::with_capacity(self.tracks.len());
        self.sample_into(t, &mut pose);
        pose
    }
}
