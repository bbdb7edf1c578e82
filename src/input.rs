//! Client input snapshot.
//!
//! Written by the `/api/input` handler, read by the frame loop. Camera
//! deltas accumulate between frames and are drained once per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Run modifier (shift on keyboards)
    pub run: bool,
    /// Analog joystick vector, x right / y forward, each in [-1, 1]
    pub joystick: [f32; 2],
    /// Whether movement input drives the avatar at all
    pub movement_enabled: bool,
    /// Free-orbit camera mode
    pub exploration_enabled: bool,
    /// Accumulated pointer orbit delta since the last frame
    pub orbit_delta: [f32; 2],
    /// Accumulated wheel/pinch delta since the last frame
    pub zoom_delta: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            run: false,
            joystick: [0.0, 0.0],
            movement_enabled: true,
            exploration_enabled: false,
            orbit_delta: [0.0, 0.0],
            zoom_delta: 0.0,
        }
    }
}

impl InputState {
    /// Combined key and joystick direction, if beyond the dead zone.
    /// x is strafe-right, y is forward (away from the camera). Normalized.
    pub fn direction(&self, dead_zone: f32) -> Option<Vec2> {
        let mut dir = Vec2::new(self.joystick[0], self.joystick[1]);
        if self.forward {
            dir.y += 1.0;
        }
        if self.backward {
            dir.y -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }

        if dir.length() <= dead_zone {
            None
        } else {
            Some(dir.normalize())
        }
    }

    /// Drain the accumulated orbit/zoom deltas.
    pub fn take_camera_deltas(&mut self) -> (Vec2, f32) {
        let orbit = Vec2::from(self.orbit_delta);
        let zoom = self.zoom_delta;
        self.orbit_delta = [0.0, 0.0];
        self.zoom_delta = 0.0;
        (orbit, zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_respects_dead_zone() {
        let input = InputState {
            joystick: [0.05, 0.05],
            ..Default::default()
        };
        assert!(input.direction(0.15).is_none(), "tiny drift must be ignored");
    }

    #[test]
    fn test_keys_combine_and_normalize() {
        let input = InputState {
            forward: true,
            right: true,
            ..Default::default()
        };
        let dir = input.direction(0.15).unwrap();
        assert!((dir.length() - 1.0).abs() < 1e-5, "direction is unit length");
        assert!(dir.x > 0.0 && dir.y > 0.0);
    }

    #[test]
    fn test_opposed_keys_cancel() {
        let input = InputState {
            forward: true,
            backward: true,
            ..Default::default()
        };
        assert!(input.direction(0.15).is_none());
    }

    #[test]
    fn test_take_camera_deltas_drains() {
        let mut input = InputState {
            orbit_delta: [3.0, -1.0],
            zoom_delta: 0.5,
            ..Default::default()
        };
        let (orbit, zoom) = input.take_camera_deltas();
        assert_eq!(orbit, Vec2::new(3.0, -1.0));
        assert_eq!(zoom, 0.5);
        let (orbit, zoom) = input.take_camera_deltas();
        assert_eq!(orbit, Vec2::ZERO);
        assert_eq!(zoom, 0.0);
    }
}
