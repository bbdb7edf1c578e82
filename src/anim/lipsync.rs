//! Audio-driven mouth animation.
//!
//! Turns the analyser's frequency bins into a single mouth-openness scalar:
//! average the low band, normalize, gain, gate, clamp, smooth. Speech energy
//! concentrates in the low/mid bins, which is all the mouth needs to track.

use crate::config::LipsyncConfig;

/// Values this close to zero snap shut.
const SILENCE_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone)]
pub struct LipSyncDriver {
    value: f32,
    cfg: LipsyncConfig,
}

impl LipSyncDriver {
    pub fn new(cfg: LipsyncConfig) -> Self {
        Self { value: 0.0, cfg }
    }

    /// Current smoothed mouth-openness in [0, 1].
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Replace tuning parameters without resetting the signal.
    pub fn set_tuning(&mut self, cfg: LipsyncConfig) {
        self.cfg = cfg;
    }

    /// Advance one frame. `bins` holds byte-valued frequency bins while
    /// audio plays; `None` relaxes the mouth toward closed at the slower
    /// release rate instead of snapping shut.
    pub fn update(&mut self, bins: Option<&[u8]>) -> f32 {
        match bins {
            Some(bins) if !bins.is_empty() => {
                let n = self.cfg.band_bins.min(bins.len());
                let avg =
                    bins[..n].iter().map(|&b| b as f32).sum::<f32>() / (n as f32 * 255.0);

                let mut target = avg * self.cfg.gain;
                if target < self.cfg.gate {
                    target = 0.0;
                }
                let target = target.clamp(0.0, 1.0);

                self.value += (target - self.value) * self.cfg.attack;
            }
            _ => {
                self.value += (0.0 - self.value) * self.cfg.release;
            }
        }

        if self.value < SILENCE_EPSILON {
            self.value = 0.0;
        }
        self.value = self.value.clamp(0.0, 1.0);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> LipSyncDriver {
        LipSyncDriver::new(LipsyncConfig::default())
    }

    #[test]
    fn test_silent_bins_stay_closed() {
        let mut drv = driver();
        let bins = [0u8; 128];
        for _ in 0..30 {
            assert_eq!(drv.update(Some(&bins)), 0.0, "gate must hold at zero");
        }
    }

    #[test]
    fn test_low_noise_below_gate_stays_closed() {
        let mut drv = driver();
        // band average 8/255 * 1.6 ≈ 0.05, under the 0.08 gate
        let bins = [8u8; 128];
        for _ in 0..30 {
            drv.update(Some(&bins));
        }
        assert_eq!(drv.value(), 0.0);
    }

    #[test]
    fn test_speech_opens_mouth_within_bounds() {
        let mut drv = driver();
        let bins = [180u8; 128];
        let mut v = 0.0;
        for _ in 0..30 {
            v = drv.update(Some(&bins));
            assert!((0.0..=1.0).contains(&v), "value must stay in [0,1]");
        }
        assert!(v > 0.5, "sustained speech energy should open the mouth, got {v}");
    }

    #[test]
    fn test_overdriven_gain_clamps_to_one() {
        let mut cfg = LipsyncConfig::default();
        cfg.gain = 50.0;
        let mut drv = LipSyncDriver::new(cfg);
        let bins = [255u8; 128];
        for _ in 0..60 {
            let v = drv.update(Some(&bins));
            assert!(v <= 1.0);
        }
        assert!((drv.value() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_attack_moves_halfway_per_frame() {
        let mut drv = driver();
        // band average 255/255 * 1.6 clamps to 1.0; attack is 0.5
        let bins = [255u8; 128];
        let v = drv.update(Some(&bins));
        assert!((v - 0.5).abs() < 1e-5, "first frame lands halfway, got {v}");
    }

    #[test]
    fn test_relaxes_to_zero_after_playback() {
        let mut drv = driver();
        let bins = [200u8; 128];
        for _ in 0..30 {
            drv.update(Some(&bins));
        }
        assert!(drv.value() > 0.5);

        let mut frames = 0;
        while drv.value() > 0.0 {
            drv.update(None);
            frames += 1;
            assert!(frames < 120, "mouth must close within a bounded frame count");
        }
        assert_eq!(drv.value(), 0.0);
    }

    #[test]
    fn test_release_is_slower_than_attack() {
        let cfg = LipsyncConfig::default();
        assert!(cfg.release < cfg.attack, "closing should be gentler than opening");
    }
}
