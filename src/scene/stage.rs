//! The per-frame avatar stage.
//!
//! Owns every animated part — locomotion, action set, lip-sync, camera,
//! morph targets — and advances them once per tick, producing the
//! [`AvatarState`] snapshot that goes out to viewers. The frame loop is the
//! only caller, which keeps a single writer on all pose state.

use glam::Vec2;
use tracing::warn;

use crate::anim::clip::Clip;
use crate::anim::lipsync::LipSyncDriver;
use crate::anim::locomotion::LocomotionController;
use crate::anim::mixer::{ActionLabel, ActionSet};
use crate::anim::retarget::{retarget_clip, BoneMap};
use crate::audio::analyser::BIN_COUNT;
use crate::avatar::model::{load_clip, AvatarModel};
use crate::avatar::morphs::MorphTargets;
use crate::avatar::state::{ActionWeight, AvatarState, CameraPose};
use crate::config::Config;
use crate::error::Foyer3dError;
use crate::input::InputState;
use crate::scene::camera::CameraRig;

pub struct Stage {
    locomotion: LocomotionController,
    actions: ActionSet,
    lipsync: LipSyncDriver,
    camera: CameraRig,
    head: Option<MorphTargets>,
    teeth: Option<MorphTargets>,
}

impl Stage {
    /// Assemble a stage from prepared parts.
    pub fn new(
        actions: ActionSet,
        head: Option<MorphTargets>,
        teeth: Option<MorphTargets>,
        cfg: &Config,
    ) -> Self {
        Self {
            locomotion: LocomotionController::new(cfg.locomotion.clone()),
            actions,
            lipsync: LipSyncDriver::new(cfg.lipsync.clone()),
            camera: CameraRig::new(cfg.camera.clone()),
            head,
            teeth,
        }
    }

    /// Load the avatar model and animation files, retarget every clip onto
    /// the avatar skeleton, and assemble the stage.
    pub fn from_config(cfg: &Config) -> Result<Self, Foyer3dError> {
        let model = AvatarModel::load(&cfg.avatar.model_path)?;
        let map = BoneMap::by_convention(&model.skeleton).with_overrides(&cfg.avatar.bone_map);

        let paths = &cfg.avatar.animations;
        let idle = prepare_clip(&paths.idle, "idle", &map)?;
        let walk = prepare_clip(&paths.walk, "walk", &map)?;
        let run = prepare_clip(&paths.run, "run", &map)?;
        let talk = prepare_clip(&paths.talk, "talk", &map)?;
        let actions = ActionSet::new(idle, talk, walk, run);

        let head = find_morphs(&model, &cfg.avatar.head_mesh, &cfg.avatar.mouth_morph);
        if head.is_none() {
            warn!(
                "Head mesh '{}' not found or has no morph targets; lip-sync will be inert",
                cfg.avatar.head_mesh
            );
        }
        let teeth = cfg
            .avatar
            .teeth_mesh
            .as_deref()
            .and_then(|name| find_morphs(&model, name, &cfg.avatar.mouth_morph));

        Ok(Self::new(actions, head, teeth, cfg))
    }

    /// Re-apply tunable parameters after a config change. Loaded assets
    /// are untouched.
    pub fn apply_tuning(&mut self, cfg: &Config) {
        self.locomotion.set_tuning(cfg.locomotion.clone());
        self.lipsync.set_tuning(cfg.lipsync.clone());
        self.camera.set_tuning(cfg.camera.clone());
    }

    /// Advance one frame and produce the broadcast snapshot.
    pub fn advance(
        &mut self,
        dt: f32,
        input: &InputState,
        orbit_delta: Vec2,
        zoom_delta: f32,
        speaking: bool,
        bins: Option<[u8; BIN_COUNT]>,
    ) -> AvatarState {
        let azimuth = self.camera.away_azimuth(self.locomotion.position());
        let label = self.locomotion.update(dt, input, azimuth, speaking);

        if label != self.actions.active() {
            self.actions
                .transition_to(label, self.locomotion.fade_duration(label));
        }
        if label.is_moving() {
            self.actions
                .set_rate(label, self.locomotion.cadence_rate(label));
        }
        self.actions.update(dt);
        let pose = self.actions.sample_pose();

        let mouth = self.lipsync.update(bins.as_ref().map(|b| b.as_slice()));
        if let Some(head) = &mut self.head {
            head.set_mouth_open(mouth);
        }
        if let Some(teeth) = &mut self.teeth {
            teeth.set_mouth_open(mouth);
        }

        self.camera.update(
            dt,
            self.locomotion.position(),
            self.locomotion.yaw(),
            input.exploration_enabled,
            orbit_delta,
            zoom_delta,
        );

        AvatarState {
            position: self.locomotion.position().to_array(),
            yaw: self.locomotion.yaw(),
            speed: self.locomotion.speed(),
            action: self.actions.active(),
            weights: self
                .actions
                .weights()
                .map(|(action, weight)| ActionWeight { action, weight })
                .collect(),
            mouth_open: mouth,
            is_speaking: speaking,
            camera: CameraPose {
                position: self.camera.position().to_array(),
                target: self.camera.target().to_array(),
            },
            bone_rotations: pose
                .iter()
                .filter_map(|(bone, t)| {
                    t.rotation.map(|q| (bone.clone(), q.to_array()))
                })
                .collect(),
        }
    }
}

/// Load and retarget one animation file. A clip whose tracks all fail to
/// match degrades to the rest pose with a warning instead of killing the
/// service.
fn prepare_clip(
    path: &std::path::Path,
    label: &str,
    map: &BoneMap,
) -> Result<Clip, Foyer3dError> {
    let source = load_clip(path, label)?;
    match retarget_clip(&source, map) {
        Ok(clip) => Ok(clip),
        Err(e) => {
            warn!("{e}; '{label}' will hold the rest pose");
            Ok(Clip::from_tracks(label, Vec::new()))
        }
    }
}

fn find_morphs(model: &AvatarModel, mesh: &str, mouth_morph: &str) -> Option<MorphTargets> {
    model
        .morph_meshes
        .iter()
        .find(|desc| desc.mesh == mesh)
        .map(|desc| MorphTargets::from_desc(desc, mouth_morph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::clip::{Track, TrackData};
    use glam::Quat;

    fn clip(name: &str) -> Clip {
        Clip::from_tracks(
            name,
            vec![Track::new(
                "Spine",
                vec![0.0, 1.0],
                TrackData::Rotation(vec![
                    Quat::IDENTITY,
                    Quat::from_rotation_y(0.5),
                ]),
            )],
        )
    }

    fn stage() -> Stage {
        let cfg = Config::default();
        let actions = ActionSet::new(clip("idle"), clip("talk"), clip("walk"), clip("run"));
        let head = Some(MorphTargets::new(
            "Wolf3D_Head",
            &["mouthOpen".to_string()],
            "mouthOpen",
        ));
        Stage::new(actions, head, None, &cfg)
    }

    fn run_frames(
        stage: &mut Stage,
        input: &InputState,
        speaking: bool,
        bins: Option<[u8; BIN_COUNT]>,
        frames: usize,
    ) -> AvatarState {
        let dt = 1.0 / 60.0;
        let mut state = stage.advance(dt, input, Vec2::ZERO, 0.0, speaking, bins);
        for _ in 1..frames {
            state = stage.advance(dt, input, Vec2::ZERO, 0.0, speaking, bins);
        }
        state
    }

    #[test]
    fn test_idle_at_rest() {
        let mut stage = stage();
        let state = run_frames(&mut stage, &InputState::default(), false, None, 30);
        assert_eq!(state.action, ActionLabel::Idle);
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.mouth_open, 0.0);
    }

    #[test]
    fn test_forward_input_walks() {
        let mut stage = stage();
        let input = InputState {
            forward: true,
            ..Default::default()
        };
        let state = run_frames(&mut stage, &input, false, None, 120);
        assert_eq!(state.action, ActionLabel::Walk);
        assert!(state.speed > 1.0, "speed should ramp up, got {}", state.speed);
        let moved = glam::Vec3::from(state.position).length();
        assert!(moved > 0.5, "avatar should travel, moved {moved}");
    }

    #[test]
    fn test_weights_always_sum_to_one() {
        let mut stage = stage();
        let input = InputState {
            forward: true,
            ..Default::default()
        };
        let standing = InputState::default();
        let dt = 1.0 / 60.0;
        for frame in 0..120 {
            // Flip between walking and standing to keep fades in flight
            let active = if (frame / 20) % 2 == 0 { &input } else { &standing };
            let state = stage.advance(dt, active, Vec2::ZERO, 0.0, false, None);
            let sum: f32 = state.weights.iter().map(|w| w.weight).sum();
            assert!(
                (sum - 1.0).abs() < 1e-4,
                "weights must sum to 1 at frame {frame}, got {sum}"
            );
            assert!(state.weights.len() <= 2, "at most two audible actions");
        }
    }

    #[test]
    fn test_speaking_selects_talk_and_opens_mouth() {
        let mut stage = stage();
        let bins = [200u8; BIN_COUNT];
        let state = run_frames(&mut stage, &InputState::default(), true, Some(bins), 60);
        assert_eq!(state.action, ActionLabel::Talk);
        assert!(state.is_speaking);
        assert!(state.mouth_open > 0.5, "mouth should open, got {}", state.mouth_open);
    }

    #[test]
    fn test_mouth_closes_after_speech() {
        let mut stage = stage();
        let bins = [200u8; BIN_COUNT];
        run_frames(&mut stage, &InputState::default(), true, Some(bins), 60);
        let state = run_frames(&mut stage, &InputState::default(), false, None, 90);
        assert_eq!(state.mouth_open, 0.0, "mouth should fully close");
        assert_eq!(state.action, ActionLabel::Idle);
    }

    #[test]
    fn test_snapshot_carries_pose_and_camera() {
        let mut stage = stage();
        let state = run_frames(&mut stage, &InputState::default(), false, None, 5);
        assert!(
            state.bone_rotations.contains_key("Spine"),
            "sampled pose should reach the snapshot"
        );
        assert!(state.camera.position[2] != 0.0, "camera pose should be live");
    }

    #[test]
    fn test_apply_tuning_keeps_running() {
        let mut stage = stage();
        let mut cfg = Config::default();
        cfg.locomotion.walk_speed = 2.5;
        cfg.locomotion.run_speed = 5.0;
        stage.apply_tuning(&cfg);

        let input = InputState {
            forward: true,
            ..Default::default()
        };
        let state = run_frames(&mut stage, &input, false, None, 180);
        assert!(
            state.speed > 2.0,
            "new walk speed should take effect, got {}",
            state.speed
        );
    }
}
