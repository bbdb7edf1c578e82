//! Per-frame avatar state snapshot.
//!
//! Built wholesale by the frame loop each tick and broadcast to every
//! viewer over SSE; a plain data carrier with no behavior of its own.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::anim::mixer::ActionLabel;

/// Camera pose accompanying the avatar state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: [0.0, 1.73, -1.31],
            target: [0.0, 1.23, 0.0],
        }
    }
}

/// Blend weight of one audible action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionWeight {
    pub action: ActionLabel,
    pub weight: f32,
}

/// One frame of avatar state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarState {
    /// World position of the avatar's root
    pub position: [f32; 3],
    /// Yaw in radians; zero faces +Z
    pub yaw: f32,
    /// Current scalar locomotion speed
    pub speed: f32,
    /// The active (or fade-target) action
    pub action: ActionLabel,
    /// Weights of every audible action; they sum to one
    pub weights: Vec<ActionWeight>,
    /// Mouth-openness morph influence in [0, 1]
    pub mouth_open: f32,
    /// Whether speech audio is currently playing
    pub is_speaking: bool,
    pub camera: CameraPose,
    /// Sampled local bone rotations (x, y, z, w), keyed by bone name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub bone_rotations: HashMap<String, [f32; 4]>,
}

impl Default for AvatarState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            yaw: 0.0,
            speed: 0.0,
            action: ActionLabel::Idle,
            weights: vec![ActionWeight {
                action: ActionLabel::Idle,
                weight: 1.0,
            }],
            mouth_open: 0.0,
            is_speaking: false,
            camera: CameraPose::default(),
            bone_rotations: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_full_idle() {
        let state = AvatarState::default();
        assert_eq!(state.action, ActionLabel::Idle);
        assert_eq!(state.weights.len(), 1);
        assert_eq!(state.weights[0].weight, 1.0);
        assert!(!state.is_speaking);
    }

    #[test]
    fn test_action_serializes_lowercase() {
        let json = serde_json::to_value(AvatarState::default()).unwrap();
        assert_eq!(json["action"], "idle");
        assert_eq!(json["weights"][0]["action"], "idle");
    }

    #[test]
    fn test_empty_pose_omitted_from_json() {
        let json = serde_json::to_value(AvatarState::default()).unwrap();
        assert!(json.get("bone_rotations").is_none());
    }

    #[test]
    fn test_round_trip() {
        let mut state = AvatarState::default();
        state.bone_rotations
            .insert("Head".to_string(), [0.0, 0.0, 0.0, 1.0]);
        state.mouth_open = 0.4;

        let json = serde_json::to_string(&state).unwrap();
        let back: AvatarState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
