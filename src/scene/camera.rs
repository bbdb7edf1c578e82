//! Camera rig.
//!
//! Chat mode keeps the camera at a fixed avatar-local offset, eased toward
//! every frame. Exploration mode gives orbit and zoom to the user within
//! configured bounds while the look-at point keeps tracking the avatar's
//! torso. The rig also reports the azimuth the locomotion controller needs
//! for camera-relative headings.

use glam::{Quat, Vec2, Vec3};

use crate::anim::smooth_factor;
use crate::config::CameraConfig;

#[derive(Debug, Clone)]
pub struct CameraRig {
    position: Vec3,
    target: Vec3,
    /// Orbit state, kept in sync with the actual pose so switching into
    /// exploration continues from where the camera is
    azimuth: f32,
    polar: f32,
    distance: f32,
    cfg: CameraConfig,
}

impl CameraRig {
    pub fn new(cfg: CameraConfig) -> Self {
        let position = Vec3::from(cfg.offset);
        let target = Vec3::from(cfg.look_offset);
        let mut rig = Self {
            position,
            target,
            azimuth: 0.0,
            polar: cfg.max_polar,
            distance: cfg.min_distance,
            cfg,
        };
        rig.sync_orbit_from_pose();
        rig
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_tuning(&mut self, cfg: CameraConfig) {
        self.cfg = cfg;
    }

    /// Azimuth of "away from the camera" as seen from the avatar.
    pub fn away_azimuth(&self, avatar_pos: Vec3) -> f32 {
        let d = avatar_pos - self.position;
        d.x.atan2(d.z)
    }

    /// Advance one frame.
    pub fn update(
        &mut self,
        dt: f32,
        avatar_pos: Vec3,
        avatar_yaw: f32,
        exploration: bool,
        orbit_delta: Vec2,
        zoom_delta: f32,
    ) {
        if exploration {
            self.update_orbit(dt, avatar_pos, orbit_delta, zoom_delta);
        } else {
            self.update_follow(dt, avatar_pos, avatar_yaw);
        }
    }

    fn update_follow(&mut self, dt: f32, avatar_pos: Vec3, avatar_yaw: f32) {
        let rot = Quat::from_rotation_y(avatar_yaw);
        let desired_pos = avatar_pos + rot * Vec3::from(self.cfg.offset);
        let desired_target = avatar_pos + rot * Vec3::from(self.cfg.look_offset);

        let t = smooth_factor(self.cfg.follow_halflife, dt);
        self.position = self.position.lerp(desired_pos, t);
        self.target = self.target.lerp(desired_target, t);

        self.sync_orbit_from_pose();
    }

    fn update_orbit(&mut self, dt: f32, avatar_pos: Vec3, orbit_delta: Vec2, zoom_delta: f32) {
        self.azimuth += orbit_delta.x * self.cfg.orbit_sensitivity;
        self.polar = (self.polar + orbit_delta.y * self.cfg.orbit_sensitivity)
            .clamp(self.cfg.min_polar, self.cfg.max_polar);
        self.distance = (self.distance + zoom_delta * self.cfg.zoom_sensitivity)
            .clamp(self.cfg.min_distance, self.cfg.max_distance);

        let desired_target = avatar_pos + Vec3::Y * self.cfg.torso_height;
        let t = smooth_factor(self.cfg.follow_halflife, dt);
        self.target = self.target.lerp(desired_target, t);

        self.position = self.target + spherical_offset(self.azimuth, self.polar, self.distance);
    }

    fn sync_orbit_from_pose(&mut self) {
        let rel = self.position - self.target;
        let distance = rel.length();
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance.clamp(self.cfg.min_distance, self.cfg.max_distance);
        self.polar = (rel.y / distance)
            .clamp(-1.0, 1.0)
            .acos()
            .clamp(self.cfg.min_polar, self.cfg.max_polar);
        self.azimuth = rel.x.atan2(rel.z);
    }
}

/// Offset from the look-at point for the given spherical coordinates.
/// Polar is measured from straight up, so π/2 is eye level.
fn spherical_offset(azimuth: f32, polar: f32, distance: f32) -> Vec3 {
    let horizontal = polar.sin() * distance;
    Vec3::new(
        azimuth.sin() * horizontal,
        polar.cos() * distance,
        azimuth.cos() * horizontal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn rig() -> CameraRig {
        CameraRig::new(CameraConfig::default())
    }

    fn settle(rig: &mut CameraRig, avatar: Vec3, yaw: f32, frames: usize) {
        let dt = 1.0 / 60.0;
        for _ in 0..frames {
            rig.update(dt, avatar, yaw, false, Vec2::ZERO, 0.0);
        }
    }

    #[test]
    fn test_follow_converges_to_offset_pose() {
        let mut rig = rig();
        let avatar = Vec3::new(3.0, 0.0, -2.0);
        settle(&mut rig, avatar, 0.0, 300);

        let expected = avatar + Vec3::from(CameraConfig::default().offset);
        assert!(
            rig.position().distance(expected) < 0.01,
            "camera should settle at the configured offset"
        );
        let expected_target = avatar + Vec3::from(CameraConfig::default().look_offset);
        assert!(rig.target().distance(expected_target) < 0.01);
    }

    #[test]
    fn test_follow_rotates_with_avatar_yaw() {
        let mut rig = rig();
        settle(&mut rig, Vec3::ZERO, FRAC_PI_2, 300);

        let offset = Vec3::from(CameraConfig::default().offset);
        let expected = Quat::from_rotation_y(FRAC_PI_2) * offset;
        assert!(
            rig.position().distance(expected) < 0.01,
            "offset should rotate with the avatar, got {:?}",
            rig.position()
        );
    }

    #[test]
    fn test_follow_eases_rather_than_snaps() {
        let mut rig = rig();
        let start = rig.position();
        rig.update(1.0 / 60.0, Vec3::new(10.0, 0.0, 0.0), 0.0, false, Vec2::ZERO, 0.0);
        let moved = rig.position().distance(start);
        let full = start.distance(Vec3::new(10.0, 0.0, 0.0) + Vec3::from(CameraConfig::default().offset));
        assert!(moved > 0.0 && moved < full * 0.5, "one frame must not snap");
    }

    #[test]
    fn test_away_azimuth_points_away_from_camera() {
        let mut rig = rig();
        // Force a known pose: camera straight at +Z of the avatar
        rig.position = Vec3::new(0.0, 1.5, 4.0);
        let azimuth = rig.away_azimuth(Vec3::ZERO);
        assert!((azimuth.abs() - PI).abs() < 1e-5, "away from +Z camera is -Z");
    }

    #[test]
    fn test_orbit_polar_and_distance_clamped() {
        let mut rig = rig();
        let cfg = CameraConfig::default();
        let dt = 1.0 / 60.0;

        // Drag far past the bounds
        for _ in 0..300 {
            rig.update(dt, Vec3::ZERO, 0.0, true, Vec2::new(0.0, 1000.0), 1000.0);
        }
        assert!(rig.polar <= cfg.max_polar + 1e-5);
        assert!(
            (rig.position() - rig.target()).length() <= cfg.max_distance + 1e-3,
            "zoom must clamp at max distance"
        );

        for _ in 0..300 {
            rig.update(dt, Vec3::ZERO, 0.0, true, Vec2::new(0.0, -1000.0), -1000.0);
        }
        assert!(rig.polar >= cfg.min_polar - 1e-5);
        assert!((rig.position() - rig.target()).length() >= cfg.min_distance - 1e-3);
    }

    #[test]
    fn test_orbit_keeps_distance_while_circling() {
        let mut rig = rig();
        let dt = 1.0 / 60.0;
        rig.update(dt, Vec3::ZERO, 0.0, true, Vec2::ZERO, 0.0);
        let d0 = (rig.position() - rig.target()).length();

        for _ in 0..120 {
            rig.update(dt, Vec3::ZERO, 0.0, true, Vec2::new(40.0, 0.0), 0.0);
        }
        let d1 = (rig.position() - rig.target()).length();
        assert!((d0 - d1).abs() < 1e-3, "orbiting must not change distance");
    }

    #[test]
    fn test_orbit_target_tracks_torso() {
        let mut rig = rig();
        let avatar = Vec3::new(-2.0, 0.0, 5.0);
        let dt = 1.0 / 60.0;
        for _ in 0..300 {
            rig.update(dt, avatar, 0.0, true, Vec2::ZERO, 0.0);
        }
        let expected = avatar + Vec3::Y * CameraConfig::default().torso_height;
        assert!(
            rig.target().distance(expected) < 0.01,
            "look-at should follow the torso, got {:?}",
            rig.target()
        );
    }
}
