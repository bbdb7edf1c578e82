//! Audio playback and analysis.
//!
//! One output channel for synthesized speech plus the frequency analyser
//! that drives lip-sync.

pub mod analyser;
pub mod playback;

pub use analyser::{FrequencyAnalyser, BIN_COUNT, FFT_SIZE};
pub use playback::SpeechChannel;
