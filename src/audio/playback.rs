//! Speech playback channel.
//!
//! Wraps a single audio output. The output device is claimed lazily on the
//! first playback request, a new request supersedes whatever is playing (no
//! queueing), and the `playing` flag is true exactly while audio is
//! audible. The rodio output stream is not `Send`, so a dedicated worker
//! thread owns it and takes commands over a channel, the same shape as a
//! capture thread.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::audio::analyser::{FrequencyAnalyser, BIN_COUNT};
use crate::error::AudioError;

/// Decoded audio ready for the worker.
#[derive(Debug)]
struct DecodedAudio {
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

enum Command {
    Play(DecodedAudio),
    Stop,
}

/// The speech playback and analysis channel.
#[derive(Debug)]
pub struct SpeechChannel {
    worker: Mutex<Option<Sender<Command>>>,
    analyser: Arc<FrequencyAnalyser>,
    playing: Arc<AtomicBool>,
}

impl Default for SpeechChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechChannel {
    pub fn new() -> Self {
        Self {
            worker: Mutex::new(None),
            analyser: Arc::new(FrequencyAnalyser::new()),
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True exactly while audio is playing.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Frequency bins of the playing audio, or `None` when idle.
    pub fn frequency_bins(&self) -> Option<[u8; BIN_COUNT]> {
        if !self.is_playing() {
            return None;
        }
        self.analyser.frequency_bins()
    }

    /// Decode `bytes` and play them, replacing any current source.
    pub fn play(&self, bytes: Vec<u8>) -> Result<(), AudioError> {
        let decoded = decode(bytes)?;
        let tx = self.ensure_worker()?;
        tx.send(Command::Play(decoded))
            .map_err(|_| AudioError::WorkerGone)
    }

    /// Stop playback immediately.
    pub fn stop(&self) {
        let guard = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(Command::Stop);
        }
    }

    /// Spawn the playback worker on first use. Some platforms only allow
    /// claiming the output device from a live session, so this must not
    /// happen at service startup.
    fn ensure_worker(&self) -> Result<Sender<Command>, AudioError> {
        let mut guard = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (cmd_tx, cmd_rx) = bounded::<Command>(4);
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);
        let analyser = Arc::clone(&self.analyser);
        let playing = Arc::clone(&self.playing);

        thread::Builder::new()
            .name("speech-playback".to_string())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                tracing::debug!("Speech playback thread started");
                let mut sink: Option<Sink> = None;

                loop {
                    match cmd_rx.recv_timeout(Duration::from_millis(50)) {
                        Ok(Command::Play(audio)) => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            analyser.begin(
                                mono_mix(&audio.samples, audio.channels),
                                audio.sample_rate,
                            );
                            let new_sink = Sink::connect_new(stream.mixer());
                            new_sink.append(SamplesBuffer::new(
                                audio.channels,
                                audio.sample_rate,
                                audio.samples,
                            ));
                            playing.store(true, Ordering::Relaxed);
                            sink = Some(new_sink);
                        }
                        Ok(Command::Stop) => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            playing.store(false, Ordering::Relaxed);
                            analyser.stop();
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            let done = sink.as_ref().map_or(false, |s| s.empty());
                            if done {
                                sink = None;
                                playing.store(false, Ordering::Relaxed);
                                analyser.stop();
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            playing.store(false, Ordering::Relaxed);
                            analyser.stop();
                            break;
                        }
                    }
                }

                tracing::debug!("Speech playback thread stopping");
            })
            .map_err(|e| AudioError::OutputOpen(format!("Failed to spawn worker: {e}")))?;

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => {
                *guard = Some(cmd_tx.clone());
                Ok(cmd_tx)
            }
            Ok(Err(e)) => Err(AudioError::OutputOpen(e)),
            Err(_) => Err(AudioError::OutputOpen(
                "Timed out waiting for audio output".to_string(),
            )),
        }
    }
}

/// Decode an audio payload into interleaved f32 samples.
fn decode(bytes: Vec<u8>) -> Result<DecodedAudio, AudioError> {
    let source =
        Decoder::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;
    let channels = source.channels();
    let sample_rate = source.sample_rate();
    let samples: Vec<f32> = source.collect();

    if samples.is_empty() {
        return Err(AudioError::Decode("payload contains no samples".to_string()));
    }

    Ok(DecodedAudio {
        channels,
        sample_rate,
        samples,
    })
}

/// Average interleaved channels down to mono for analysis.
fn mono_mix(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
