//! Avatar model and animation loading (glTF/GLB).
//!
//! Extracts the skinned skeleton's bone names, the morph-target name lists
//! of each mesh, and keyframe clips from animation files. Only the data the
//! frame loop needs survives loading; geometry stays with the renderer on
//! the client side.

use glam::{Quat, Vec3};
use std::path::Path;

use crate::anim::clip::{Clip, Track, TrackData};
use crate::error::ModelError;

/// Ordered, named bones of a skinned model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<String>,
}

impl Skeleton {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bones: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bones.iter().any(|b| b == name)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// A mesh that carries morph targets, by name.
#[derive(Debug, Clone)]
pub struct MorphMeshDesc {
    /// Mesh name as authored
    pub mesh: String,
    /// Morph target names, in influence-slot order
    pub targets: Vec<String>,
}

/// Loaded avatar model metadata.
#[derive(Debug, Clone)]
pub struct AvatarModel {
    pub skeleton: Skeleton,
    pub morph_meshes: Vec<MorphMeshDesc>,
}

impl AvatarModel {
    /// Load skeleton and morph metadata from a GLB/glTF file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let (document, _buffers, _images) = gltf::import(path.as_ref())
            .map_err(|e| ModelError::Load(format!("{}: {}", path.as_ref().display(), e)))?;

        let skeleton = skeleton_from_document(&document)?;

        let morph_meshes = document
            .meshes()
            .filter_map(|mesh| {
                let targets = morph_target_names(&mesh);
                if targets.is_empty() {
                    return None;
                }
                Some(MorphMeshDesc {
                    mesh: mesh.name().unwrap_or("unnamed").to_string(),
                    targets,
                })
            })
            .collect();

        Ok(Self {
            skeleton,
            morph_meshes,
        })
    }
}

fn skeleton_from_document(document: &gltf::Document) -> Result<Skeleton, ModelError> {
    let skin = document.skins().next().ok_or(ModelError::MissingSkeleton)?;
    let bones = skin
        .joints()
        .enumerate()
        .map(|(i, joint)| {
            joint
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("joint_{i}"))
        })
        .collect();
    Ok(Skeleton { bones })
}

/// Read morph target names from the mesh extras `targetNames` array, the way
/// most exporters record them. Falls back to positional names.
fn morph_target_names(mesh: &gltf::Mesh) -> Vec<String> {
    let count = mesh
        .primitives()
        .next()
        .map(|p| p.morph_targets().count())
        .unwrap_or(0);
    if count == 0 {
        return Vec::new();
    }

    if let Some(raw) = mesh.extras().as_ref() {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw.get()) {
            if let Some(names) = value.get("targetNames").and_then(|v| v.as_array()) {
                let parsed: Vec<String> = names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect();
                if parsed.len() == count {
                    return parsed;
                }
            }
        }
    }

    fallback_target_names(count)
}

fn fallback_target_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("morph_{i}")).collect()
}

/// Load the first animation of a glTF file as a clip named `name`.
pub fn load_clip<P: AsRef<Path>>(path: P, name: &str) -> Result<Clip, ModelError> {
    let (document, buffers, _images) = gltf::import(path.as_ref())
        .map_err(|e| ModelError::Load(format!("{}: {}", path.as_ref().display(), e)))?;

    let animation = document
        .animations()
        .next()
        .ok_or_else(|| ModelError::MissingAnimation(path.as_ref().display().to_string()))?;

    Ok(clip_from_animation(&animation, &buffers, name))
}

fn clip_from_animation(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Clip {
    use gltf::animation::util::ReadOutputs;

    let mut tracks = Vec::new();

    for channel in animation.channels() {
        let Some(bone) = channel.target().node().name().map(str::to_string) else {
            continue;
        };

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        if times.is_empty() {
            continue;
        }

        let interpolation = channel.sampler().interpolation();
        // Step samplers are sampled as linear; the visual difference is
        // negligible at clip frame rates.
        let data = match reader.read_outputs() {
            Some(ReadOutputs::Translations(it)) => TrackData::Translation(keyframe_values(
                it.map(Vec3::from).collect(),
                interpolation,
                times.len(),
            )),
            Some(ReadOutputs::Rotations(rotations)) => TrackData::Rotation(keyframe_values(
                rotations
                    .into_f32()
                    .map(|q| Quat::from_array(q).normalize())
                    .collect(),
                interpolation,
                times.len(),
            )),
            Some(ReadOutputs::Scales(it)) => TrackData::Scale(keyframe_values(
                it.map(Vec3::from).collect(),
                interpolation,
                times.len(),
            )),
            // Morph-weight channels are driven live by the lip-sync path
            _ => continue,
        };

        if data.len() != times.len() {
            tracing::warn!(
                "Skipping malformed channel for '{}' in '{}': {} keys, {} values",
                bone,
                name,
                times.len(),
                data.len()
            );
            continue;
        }

        tracks.push(Track::new(bone, times, data));
    }

    Clip::from_tracks(name, tracks)
}

/// Cubic-spline samplers store in-tangent/value/out-tangent triples per
/// keyframe; keep only the value element.
fn keyframe_values<T>(
    values: Vec<T>,
    interpolation: gltf::animation::Interpolation,
    key_count: usize,
) -> Vec<T> {
    if interpolation == gltf::animation::Interpolation::CubicSpline {
        values
            .into_iter()
            .skip(1)
            .step_by(3)
            .take(key_count)
            .collect()
    } else {
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_from_names() {
        let skeleton = Skeleton::from_names(["Hips", "Spine", "Head"]);
        assert_eq!(skeleton.len(), 3);
        assert!(skeleton.contains("Spine"));
        assert!(!skeleton.contains("Tail"));
    }

    #[test]
    fn test_fallback_target_names() {
        assert_eq!(fallback_target_names(2), vec!["morph_0", "morph_1"]);
        assert!(fallback_target_names(0).is_empty());
    }

    #[test]
    fn test_cubic_spline_keeps_value_element() {
        // in-tangent, value, out-tangent per key
        let raw = vec![0, 1, 2, 10, 11, 12];
        let picked = keyframe_values(raw, gltf::animation::Interpolation::CubicSpline, 2);
        assert_eq!(picked, vec![1, 11]);
    }

    #[test]
    fn test_linear_values_pass_through() {
        let raw = vec![1, 2, 3];
        let picked = keyframe_values(raw.clone(), gltf::animation::Interpolation::Linear, 3);
        assert_eq!(picked, raw);
    }

    #[test]
    fn test_load_model() {
        // Exercised only when the default asset is present
        let path = "assets/models/host.glb";
        if !std::path::Path::new(path).exists() {
            return;
        }
        let model = AvatarModel::load(path).unwrap();
        assert!(!model.skeleton.is_empty(), "model should have bones");
    }
}
