//! Camera-relative locomotion.
//!
//! Decides which animation action should be active each frame and
//! integrates the avatar's position, yaw and scalar speed. Forward always
//! means "away from the camera": the input direction is rotated by the
//! camera azimuth before it becomes a heading.

use glam::{Quat, Vec3};

use crate::anim::mixer::ActionLabel;
use crate::anim::smooth_factor;
use crate::config::LocomotionConfig;
use crate::input::InputState;

#[derive(Debug, Clone)]
pub struct LocomotionController {
    position: Vec3,
    yaw: f32,
    speed: f32,
    cfg: LocomotionConfig,
}

impl LocomotionController {
    pub fn new(cfg: LocomotionConfig) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            speed: 0.0,
            cfg,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Yaw in radians; zero faces +Z, the forward vector is (sin, 0, cos).
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Replace tuning parameters without disturbing the pose.
    pub fn set_tuning(&mut self, cfg: LocomotionConfig) {
        self.cfg = cfg;
    }

    /// Which action should be active given this frame's inputs.
    pub fn target_action(&self, input: &InputState, speaking: bool) -> ActionLabel {
        let moving = input.movement_enabled && input.direction(self.cfg.dead_zone).is_some();
        if moving {
            if input.run {
                ActionLabel::Run
            } else {
                ActionLabel::Walk
            }
        } else if speaking {
            ActionLabel::Talk
        } else {
            ActionLabel::Idle
        }
    }

    /// Cross-fade duration for a transition into `target`: short into
    /// walk/run for input responsiveness, longer into idle/talk.
    pub fn fade_duration(&self, target: ActionLabel) -> f32 {
        if target.is_moving() {
            self.cfg.fade_move
        } else {
            self.cfg.fade_rest
        }
    }

    /// Integrate one frame. Returns the action that should be active.
    pub fn update(
        &mut self,
        dt: f32,
        input: &InputState,
        camera_azimuth: f32,
        speaking: bool,
    ) -> ActionLabel {
        let label = self.target_action(input, speaking);

        let target_speed = match label {
            ActionLabel::Walk => self.cfg.walk_speed,
            ActionLabel::Run => self.cfg.run_speed,
            _ => 0.0,
        };
        self.speed += (target_speed - self.speed) * smooth_factor(self.cfg.speed_halflife, dt);
        if self.speed.abs() < 1e-4 {
            self.speed = 0.0;
        }

        if label.is_moving() {
            if let Some(dir) = input.direction(self.cfg.dead_zone) {
                let heading = camera_azimuth - dir.x.atan2(dir.y);
                let current = Quat::from_rotation_y(self.yaw);
                let target = Quat::from_rotation_y(heading);
                let blended = current.slerp(target, smooth_factor(self.cfg.turn_halflife, dt));
                self.yaw = yaw_of(blended);
            }
        }

        let forward = Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos());
        self.position += forward * self.speed * dt;

        label
    }

    /// Playback rate that matches foot cadence to translation speed.
    pub fn cadence_rate(&self, label: ActionLabel) -> f32 {
        match label {
            ActionLabel::Walk => self.speed / self.cfg.walk_speed,
            ActionLabel::Run => self.speed / self.cfg.run_speed,
            _ => 1.0,
        }
    }
}

/// Extract the Y-axis rotation of a yaw-only quaternion.
fn yaw_of(q: Quat) -> f32 {
    let (yaw, _, _) = q.to_euler(glam::EulerRot::YXZ);
    yaw
}
