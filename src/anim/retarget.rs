//! Clip retargeting between differently-named skeletons.
//!
//! Animation vendors prefix bone names (`mixamorigSpine`, `Armature_Spine`)
//! while avatar exporters use the bare names. Retargeting renames each track
//! to the avatar's bone through a declared [`BoneMap`]; the name heuristic
//! lives only in [`BoneMap::by_convention`], so an operator can replace it
//! wholesale with explicit entries from config.

use std::collections::{HashMap, HashSet};

use crate::anim::clip::{Clip, Track, TrackProperty};
use crate::avatar::model::Skeleton;
use crate::error::AnimError;

/// Vendor prefixes stripped during conventional name matching.
const VENDOR_PREFIXES: &[&str] = &["mixamorig", "armature_"];

/// Declared mapping from source bone names to destination bone names.
#[derive(Debug, Clone, Default)]
pub struct BoneMap {
    /// Explicit source → destination entries; always consulted first
    explicit: HashMap<String, String>,
    /// Destination names that match a source name verbatim
    exact: HashSet<String>,
    /// Normalized destination name → destination name
    normalized: HashMap<String, String>,
}

impl BoneMap {
    /// Derive a mapping table from the destination skeleton by convention:
    /// a source bone maps to a destination bone with the same name, or with
    /// the same name after vendor-prefix stripping and case-folding.
    pub fn by_convention(skeleton: &Skeleton) -> Self {
        let mut exact = HashSet::new();
        let mut normalized = HashMap::new();
        for bone in &skeleton.bones {
            exact.insert(bone.clone());
            normalized.insert(normalize(bone), bone.clone());
        }
        Self {
            explicit: HashMap::new(),
            exact,
            normalized,
        }
    }

    /// Layer explicit entries over the table. Entries win over convention.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        self.explicit
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Resolve a source bone name to a destination bone name.
    pub fn resolve<'a>(&'a self, source: &'a str) -> Option<&'a str> {
        if let Some(dest) = self.explicit.get(source) {
            return Some(dest);
        }
        if self.exact.contains(source) {
            return Some(source);
        }
        self.normalized.get(&normalize(source)).map(String::as_str)
    }
}

/// Case-fold and strip known vendor prefixes.
fn normalize(name: &str) -> String {
    let lower = name.to_lowercase();
    for prefix in VENDOR_PREFIXES {
        if let Some(stripped) = lower.strip_prefix(prefix) {
            return stripped.to_string();
        }
    }
    lower
}

/// Bones whose translation carries root motion. Their world position is
/// driven by the locomotion controller, not by the source clip.
fn carries_root_motion(bone: &str) -> bool {
    let lower = bone.to_lowercase();
    lower.contains("hips") || lower.contains("root")
}

/// Rename each track of `clip` onto the destination skeleton through `map`.
///
/// Translation tracks on root/hip bones are always dropped; tracks with no
/// mapping entry are dropped. The result keeps the source clip's name,
/// duration and keyframe times. An empty result is an error so callers can
/// fall back to the rest pose instead of binding an inert clip.
pub fn retarget_clip(clip: &Clip, map: &BoneMap) -> Result<Clip, AnimError> {
    let mut tracks = Vec::with_capacity(clip.tracks.len());

    for track in &clip.tracks {
        if track.property() == TrackProperty::Translation && carries_root_motion(&track.bone) {
            continue;
        }

        if let Some(dest) = map.resolve(&track.bone) {
            tracks.push(Track::new(dest, track.times.clone(), track.data.clone()));
        }
    }

    if tracks.is_empty() {
        return Err(AnimError::NoTracksMatched {
            clip: clip.name.clone(),
        });
    }

    Ok(Clip {
        name: clip.name.clone(),
        duration: clip.duration,
        tracks,
    })
}
