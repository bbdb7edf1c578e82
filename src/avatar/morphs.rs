//! Morph-target influence slots.
//!
//! Holds the influence weights of one mesh's morph targets and knows which
//! slot is the conventional "mouth open" shape, whatever the exporter
//! called it.

use std::collections::HashMap;

use crate::avatar::model::MorphMeshDesc;

/// Names exporters commonly use for the mouth-open shape, case-folded.
const MOUTH_ALIASES: &[&str] = &["mouthopen", "jawopen", "viseme_aa", "fcl_mth_a", "aa"];

/// Morph influence weights for one mesh.
#[derive(Debug, Clone)]
pub struct MorphTargets {
    mesh: String,
    name_to_index: HashMap<String, usize>,
    weights: Vec<f32>,
    mouth_open: Option<usize>,
}

impl MorphTargets {
    /// Build from a mesh's morph target names. `mouth_morph` is looked up
    /// first; the common aliases are the fallback.
    pub fn new(mesh: &str, target_names: &[String], mouth_morph: &str) -> Self {
        let mut name_to_index = HashMap::with_capacity(target_names.len());
        for (i, name) in target_names.iter().enumerate() {
            name_to_index.insert(name.clone(), i);
        }

        let mouth_open = find_mouth_slot(target_names, mouth_morph);

        Self {
            mesh: mesh.to_string(),
            name_to_index,
            weights: vec![0.0; target_names.len()],
            mouth_open,
        }
    }

    pub fn from_desc(desc: &MorphMeshDesc, mouth_morph: &str) -> Self {
        Self::new(&desc.mesh, &desc.targets, mouth_morph)
    }

    pub fn mesh(&self) -> &str {
        &self.mesh
    }

    pub fn has_mouth(&self) -> bool {
        self.mouth_open.is_some()
    }

    /// Write the mouth-openness influence, clamped to [0, 1]. A mesh with
    /// no mouth slot ignores the write.
    pub fn set_mouth_open(&mut self, value: f32) {
        if let Some(idx) = self.mouth_open {
            self.weights[idx] = value.clamp(0.0, 1.0);
        }
    }

    pub fn mouth_open(&self) -> f32 {
        self.mouth_open.map(|idx| self.weights[idx]).unwrap_or(0.0)
    }

    /// Set a named influence. Returns false when the target does not exist.
    pub fn set(&mut self, name: &str, value: f32) -> bool {
        match self.name_to_index.get(name) {
            Some(&idx) => {
                self.weights[idx] = value.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

fn find_mouth_slot(target_names: &[String], mouth_morph: &str) -> Option<usize> {
    // Configured name first, exact then case-insensitive
    if let Some(idx) = target_names.iter().position(|n| n == mouth_morph) {
        return Some(idx);
    }
    let wanted = mouth_morph.to_lowercase();
    if let Some(idx) = target_names
        .iter()
        .position(|n| n.to_lowercase() == wanted)
    {
        return Some(idx);
    }

    target_names
        .iter()
        .position(|n| MOUTH_ALIASES.contains(&n.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_configured_name_found() {
        let mut morphs = MorphTargets::new(
            "Head",
            &names(&["browUp", "mouthOpen", "eyesClosed"]),
            "mouthOpen",
        );
        assert!(morphs.has_mouth());
        morphs.set_mouth_open(0.7);
        assert_eq!(morphs.weights()[1], 0.7);
    }

    #[test]
    fn test_alias_fallback() {
        let morphs = MorphTargets::new("Face", &names(&["smile", "jawOpen"]), "mouthOpen");
        assert!(morphs.has_mouth(), "jawOpen should satisfy the mouth slot");
    }

    #[test]
    fn test_missing_mouth_is_inert() {
        let mut morphs = MorphTargets::new("Hair", &names(&["windSway"]), "mouthOpen");
        assert!(!morphs.has_mouth());
        morphs.set_mouth_open(1.0);
        assert_eq!(morphs.mouth_open(), 0.0);
        assert_eq!(morphs.weights(), &[0.0]);
    }

    #[test]
    fn test_mouth_value_clamped() {
        let mut morphs = MorphTargets::new("Head", &names(&["mouthOpen"]), "mouthOpen");
        morphs.set_mouth_open(3.0);
        assert_eq!(morphs.mouth_open(), 1.0);
        morphs.set_mouth_open(-1.0);
        assert_eq!(morphs.mouth_open(), 0.0);
    }

    #[test]
    fn test_set_by_name() {
        let mut morphs = MorphTargets::new("Head", &names(&["browUp"]), "mouthOpen");
        assert!(morphs.set("browUp", 0.4));
        assert!(!morphs.set("nose", 0.4));
        assert_eq!(morphs.weights(), &[0.4]);
    }
}
