//! Frequency-domain analysis of the playing audio.
//!
//! Mirrors a Web Audio analyser node: 256-sample windows, Hann weighting,
//! magnitudes in decibels mapped onto byte-valued bins. The playback worker
//! loads the decoded mono samples once; readers resolve the current window
//! from wall-clock playback position, so sampling never blocks the frame
//! loop on the audio thread.

use std::f32::consts::PI;
use std::sync::Mutex;
use std::time::Instant;

/// Analysis window length in samples.
pub const FFT_SIZE: usize = 256;
/// Number of frequency bins exposed per window.
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Decibel range mapped onto the 0..=255 byte bins.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

#[derive(Debug, Default)]
struct AnalyserBuffer {
    /// Decoded mono samples of the playing source
    samples: Vec<f32>,
    sample_rate: u32,
    /// Playback start; `None` while idle
    started: Option<Instant>,
}

/// Shared frequency analyser over the currently playing audio.
#[derive(Debug, Default)]
pub struct FrequencyAnalyser {
    inner: Mutex<AnalyserBuffer>,
}

impl FrequencyAnalyser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a new source and start its playback clock.
    pub(crate) fn begin(&self, samples: Vec<f32>, sample_rate: u32) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.samples = samples;
        inner.sample_rate = sample_rate.max(1);
        inner.started = Some(Instant::now());
    }

    /// Mark playback over; bins become `None` until the next source.
    pub(crate) fn stop(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.started = None;
        inner.samples.clear();
    }

    /// Byte-valued frequency bins for the window at the current playback
    /// position, or `None` when nothing is playing.
    pub fn frequency_bins(&self) -> Option<[u8; BIN_COUNT]> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let started = inner.started?;
        let position = (started.elapsed().as_secs_f32() * inner.sample_rate as f32) as usize;
        if position >= inner.samples.len() {
            return None;
        }
        Some(spectrum_bytes(&window_at(&inner.samples, position)))
    }
}

/// The `FFT_SIZE` samples ending at `position`, zero-padded at the front.
fn window_at(samples: &[f32], position: usize) -> [f32; FFT_SIZE] {
    let mut window = [0.0f32; FFT_SIZE];
    let end = (position + 1).min(samples.len());
    let start = end.saturating_sub(FFT_SIZE);
    let chunk = &samples[start..end];
    window[FFT_SIZE - chunk.len()..].copy_from_slice(chunk);
    window
}

/// Hann-windowed magnitude spectrum mapped onto bytes.
fn spectrum_bytes(window: &[f32; FFT_SIZE]) -> [u8; BIN_COUNT] {
    let mut re = [0.0f32; FFT_SIZE];
    let mut im = [0.0f32; FFT_SIZE];
    for (i, &s) in window.iter().enumerate() {
        let hann = 0.5 * (1.0 - (2.0 * PI * i as f32 / (FFT_SIZE - 1) as f32).cos());
        re[i] = s * hann;
    }

    fft_in_place(&mut re, &mut im);

    let mut bins = [0u8; BIN_COUNT];
    for (k, bin) in bins.iter_mut().enumerate() {
        let magnitude = (re[k] * re[k] + im[k] * im[k]).sqrt();
        // Hann halves the coherent gain; 4/N restores unit amplitude to ~1.0
        let normalized = magnitude * 4.0 / FFT_SIZE as f32;
        let db = if normalized > 0.0 {
            20.0 * normalized.log10()
        } else {
            MIN_DB
        };
        let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB);
        *bin = (scaled.clamp(0.0, 1.0) * 255.0) as u8;
    }
    bins
}

/// Iterative radix-2 Cooley-Tukey FFT.
fn fft_in_place(re: &mut [f32; FFT_SIZE], im: &mut [f32; FFT_SIZE]) {
    let n = FFT_SIZE;

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f32;
        let (step_r, step_i) = (angle.cos(), angle.sin());
        for start in (0..n).step_by(len) {
            let (mut wr, mut wi) = (1.0f32, 0.0f32);
            let half = len / 2;
            for k in 0..half {
                let (er, ei) = (re[start + k], im[start + k]);
                let (or_, oi) = (
                    re[start + k + half] * wr - im[start + k + half] * wi,
                    re[start + k + half] * wi + im[start + k + half] * wr,
                );
                re[start + k] = er + or_;
                im[start + k] = ei + oi;
                re[start + k + half] = er - or_;
                im[start + k + half] = ei - oi;
                let next_r = wr * step_r - wi * step_i;
                wi = wr * step_i + wi * step_r;
                wr = next_r;
            }
        }
        len <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_window(bin: usize, amplitude: f32) -> [f32; FFT_SIZE] {
        let mut window = [0.0f32; FFT_SIZE];
        for (i, s) in window.iter_mut().enumerate() {
            *s = amplitude * (2.0 * PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin();
        }
        window
    }

    #[test]
    fn test_silence_yields_zero_bins() {
        let bins = spectrum_bytes(&[0.0; FFT_SIZE]);
        assert!(bins.iter().all(|&b| b == 0), "silence must map to zero bytes");
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let bins = spectrum_bytes(&sine_window(10, 0.8));
        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(k, _)| k)
            .unwrap();
        assert!(
            (9..=11).contains(&peak),
            "0.8 amplitude sine at bin 10 should peak nearby, got bin {peak}"
        );
        assert!(bins[peak] > 200, "strong tone should be near full scale");
    }

    #[test]
    fn test_energy_concentrates_near_tone() {
        let bins = spectrum_bytes(&sine_window(8, 0.8));
        let far_energy: u32 = bins[40..].iter().map(|&b| b as u32).sum();
        let near_energy: u32 = bins[4..13].iter().map(|&b| b as u32).sum();
        assert!(
            near_energy > far_energy,
            "energy should concentrate near the tone ({near_energy} vs {far_energy})"
        );
    }

    #[test]
    fn test_window_at_pads_the_front() {
        let samples = vec![1.0f32; 10];
        let window = window_at(&samples, 5);
        assert_eq!(window[FFT_SIZE - 1], 1.0);
        assert_eq!(window[0], 0.0, "short history is zero-padded");
    }

    #[test]
    fn test_bins_none_until_begun_and_after_stop() {
        let analyser = FrequencyAnalyser::new();
        assert!(analyser.frequency_bins().is_none(), "idle analyser yields None");

        // One second of audio: the position right after begin() is inside it
        analyser.begin(vec![0.1f32; 48_000], 48_000);
        assert!(analyser.frequency_bins().is_some());

        analyser.stop();
        assert!(analyser.frequency_bins().is_none());
    }

    #[test]
    fn test_bins_none_past_end_of_samples() {
        let analyser = FrequencyAnalyser::new();
        // Zero-length source: any elapsed position is past the end
        analyser.begin(Vec::new(), 48_000);
        assert!(analyser.frequency_bins().is_none());
    }
}
