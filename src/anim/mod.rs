//! The avatar animation core.
//!
//! Clip sampling, retargeting onto the avatar skeleton, action cross-fade
//! blending, camera-relative locomotion, and audio-driven lip-sync. All of
//! it runs inside the frame loop; nothing here blocks.

pub mod clip;
pub mod lipsync;
pub mod locomotion;
pub mod mixer;
pub mod retarget;

pub use clip::{Clip, Pose, Track};
pub use lipsync::LipSyncDriver;
pub use locomotion::LocomotionController;
pub use mixer::{ActionLabel, ActionSet};
pub use retarget::{retarget_clip, BoneMap};

/// Fraction of the remaining distance covered in `dt` seconds for a
/// smoothing with the given halflife. Frame-rate independent.
pub(crate) fn smooth_factor(halflife: f32, dt: f32) -> f32 {
    1.0 - (-dt / halflife.max(1e-5)).exp2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_factor_halves_at_halflife() {
        let t = smooth_factor(0.1, 0.1);
        assert!((t - 0.5).abs() < 1e-5, "one halflife covers half the gap");
    }

    #[test]
    fn test_smooth_factor_is_frame_rate_independent() {
        // Two 1/120 steps must equal one 1/60 step
        let one = smooth_factor(0.08, 1.0 / 60.0);
        let half = smooth_factor(0.08, 1.0 / 120.0);
        let two_halves = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((one - two_halves).abs() < 1e-5);
    }
}
