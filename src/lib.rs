//! foyer3d - Interactive 3D Portfolio Avatar Service
//!
//! A headless service that drives a rigged portfolio avatar:
//! - Per-frame locomotion with cross-faded idle/walk/run/talk actions
//! - Animation retargeting from vendor-named skeletons onto the avatar
//! - Lip-sync morph influences from the playing speech audio
//! - A follow/orbit camera rig
//! - HTTP proxies for a hosted LLM/TTS API and an SSE state stream
//!   consumed by the browser client that renders the scene

pub mod anim;
pub mod audio;
pub mod avatar;
pub mod chat;
pub mod config;
pub mod error;
pub mod input;
pub mod scene;
pub mod web;

pub use config::Config;
pub use error::{Foyer3dError, Result};

use std::sync::Arc;
use tokio::sync::{broadcast, Notify, RwLock};

use audio::SpeechChannel;
use avatar::AvatarState;
use glam::Vec2;
use input::InputState;

/// Application state shared across all components.
///
/// Writer discipline: the frame loop owns `avatar_state`, web handlers own
/// `input` and `config`, and the playback worker owns the speech channel's
/// playing flag. The input camera deltas are an accumulator: handlers add,
/// the frame loop drains once per tick.
#[derive(Debug)]
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// Latest avatar state snapshot
    pub avatar_state: RwLock<AvatarState>,
    /// Channel for avatar state updates
    pub state_tx: broadcast::Sender<AvatarState>,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
    /// Client input snapshot
    pub input: RwLock<InputState>,
    /// Speech playback and analysis channel
    pub speech: SpeechChannel,
    /// Shared HTTP client for the upstream API
    pub http: reqwest::Client,
    /// Config changed signal
    pub config_changed: Notify,
}

impl AppState {
    /// Create a new application state with the given configuration
    pub fn new(config: Config) -> Arc<Self> {
        let (state_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            config: RwLock::new(config),
            avatar_state: RwLock::new(AvatarState::default()),
            state_tx,
            shutdown_tx,
            input: RwLock::new(InputState::default()),
            speech: SpeechChannel::new(),
            http: reqwest::Client::new(),
            config_changed: Notify::new(),
        })
    }

    /// Update the avatar state and broadcast the change
    pub async fn update_avatar_state(&self, state: AvatarState) {
        let mut current = self.avatar_state.write().await;
        *current = state.clone();
        let _ = self.state_tx.send(state);
    }

    /// Get the current avatar state
    pub async fn get_avatar_state(&self) -> AvatarState {
        self.avatar_state.read().await.clone()
    }

    /// Snapshot the input state and drain its accumulated camera deltas
    pub async fn take_input(&self) -> (InputState, Vec2, f32) {
        let mut input = self.input.write().await;
        let (orbit, zoom) = input.take_camera_deltas();
        (input.clone(), orbit, zoom)
    }

    /// Subscribe to avatar state changes
    pub fn subscribe_state(&self) -> broadcast::Receiver<AvatarState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Signal that config has changed
    pub fn signal_config_changed(&self) {
        self.config_changed.notify_waiters();
    }

    /// Wait for config change signal
    pub async fn wait_config_changed(&self) {
        self.config_changed.notified().await;
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
