//! Configuration parsing and management for foyer3d

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Foyer3dError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub frame: FrameConfig,
    pub avatar: AvatarConfig,
    pub locomotion: LocomotionConfig,
    pub lipsync: LipsyncConfig,
    pub camera: CameraConfig,
    pub chat: ChatConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Foyer3dError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, Foyer3dError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, Foyer3dError> {
        // Try config paths in order
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Foyer3dError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.port".to_string(),
                message: "Port must be greater than 0".to_string(),
            }
            .into());
        }

        if self.frame.rate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "frame.rate".to_string(),
                message: "Frame rate must be greater than 0".to_string(),
            }
            .into());
        }

        if self.locomotion.run_speed < self.locomotion.walk_speed {
            return Err(ConfigError::InvalidValue {
                field: "locomotion.run_speed".to_string(),
                message: "Run speed must be at least walk speed".to_string(),
            }
            .into());
        }

        if !(0.0..1.0).contains(&self.locomotion.dead_zone) {
            return Err(ConfigError::InvalidValue {
                field: "locomotion.dead_zone".to_string(),
                message: "Dead zone must be in [0.0, 1.0)".to_string(),
            }
            .into());
        }

        if self.lipsync.band_bins == 0 || self.lipsync.band_bins > 128 {
            return Err(ConfigError::InvalidValue {
                field: "lipsync.band_bins".to_string(),
                message: "Band must cover between 1 and 128 bins".to_string(),
            }
            .into());
        }

        for (field, value) in [
            ("lipsync.gate", self.lipsync.gate),
            ("lipsync.attack", self.lipsync.attack),
            ("lipsync.release", self.lipsync.release),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Value must be between 0.0 and 1.0".to_string(),
                }
                .into());
            }
        }

        if self.camera.min_polar > self.camera.max_polar {
            return Err(ConfigError::InvalidValue {
                field: "camera.min_polar".to_string(),
                message: "min_polar must not exceed max_polar".to_string(),
            }
            .into());
        }

        if self.camera.min_distance > self.camera.max_distance {
            return Err(ConfigError::InvalidValue {
                field: "camera.min_distance".to_string(),
                message: "min_distance must not exceed max_distance".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Enable HTTP server
    pub enabled: bool,
    /// HTTP server host
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Directory served under /static (the browser viewer)
    pub static_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Target tick rate in Hz
    pub rate: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { rate: 60.0 }
    }
}

/// Avatar model and animation assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Path to the avatar GLB model
    pub model_path: PathBuf,
    /// Animation clip files, one per action
    pub animations: AnimationPaths,
    /// Explicit source-bone → avatar-bone overrides, applied on top of the
    /// conventional name mapping derived from the skeleton
    pub bone_map: HashMap<String, String>,
    /// Morph target name driven by the lip-sync signal
    pub mouth_morph: String,
    /// Mesh carrying the facial morph targets
    pub head_mesh: String,
    /// Optional secondary mesh that mirrors the mouth morph
    pub teeth_mesh: Option<String>,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/models/host.glb"),
            animations: AnimationPaths::default(),
            bone_map: HashMap::new(),
            mouth_morph: "mouthOpen".to_string(),
            head_mesh: "Wolf3D_Head".to_string(),
            teeth_mesh: Some("Wolf3D_Teeth".to_string()),
        }
    }
}

/// One animation file per locomotion action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationPaths {
    pub idle: PathBuf,
    pub walk: PathBuf,
    pub run: PathBuf,
    pub talk: PathBuf,
}

impl Default for AnimationPaths {
    fn default() -> Self {
        Self {
            idle: PathBuf::from("assets/animations/idle.glb"),
            walk: PathBuf::from("assets/animations/walk.glb"),
            run: PathBuf::from("assets/animations/run.glb"),
            talk: PathBuf::from("assets/animations/talk.glb"),
        }
    }
}

/// Locomotion tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Walk speed in units per second
    pub walk_speed: f32,
    /// Run speed in units per second
    pub run_speed: f32,
    /// Joystick magnitude below which input is ignored
    pub dead_zone: f32,
    /// Halflife of the speed smoothing, seconds
    pub speed_halflife: f32,
    /// Halflife of the turn smoothing, seconds
    pub turn_halflife: f32,
    /// Cross-fade duration into walk/run, seconds
    pub fade_move: f32,
    /// Cross-fade duration into idle/talk, seconds
    pub fade_rest: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 1.6,
            run_speed: 3.2,
            dead_zone: 0.15,
            speed_halflife: 0.12,
            turn_halflife: 0.08,
            fade_move: 0.15,
            fade_rest: 0.3,
        }
    }
}

/// Lip-sync tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipsyncConfig {
    /// Number of low-frequency bins averaged into the mouth signal
    pub band_bins: usize,
    /// Gain applied to the normalized band average
    pub gain: f32,
    /// Noise gate: values below this clamp to zero
    pub gate: f32,
    /// Per-frame blend factor while audio plays
    pub attack: f32,
    /// Per-frame blend factor while relaxing to closed
    pub release: f32,
}

impl Default for LipsyncConfig {
    fn default() -> Self {
        Self {
            band_bins: 32,
            gain: 1.6,
            gate: 0.08,
            attack: 0.5,
            release: 0.2,
        }
    }
}

/// Camera rig tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera offset from the avatar in its local frame (chat mode)
    pub offset: [f32; 3],
    /// Look-at offset from the avatar in its local frame (chat mode)
    pub look_offset: [f32; 3],
    /// Halflife of the follow smoothing, seconds
    pub follow_halflife: f32,
    /// Orbit bounds (exploration mode)
    #[serde(default = "default_min_polar")]
    pub min_polar: f32,
    #[serde(default = "default_max_polar")]
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians of orbit per unit of pointer delta
    pub orbit_sensitivity: f32,
    /// Distance units per unit of wheel/pinch delta
    pub zoom_sensitivity: f32,
    /// Height of the orbit look-at point above the avatar's feet
    pub torso_height: f32,
}

fn default_min_polar() -> f32 {
    PI / 4.0
}

fn default_max_polar() -> f32 {
    PI / 2.0
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: [0.0, 1.73, -1.31],
            look_offset: [-0.06, 1.23, 0.09],
            follow_halflife: 0.15,
            min_polar: default_min_polar(),
            max_polar: default_max_polar(),
            min_distance: 1.0,
            max_distance: 6.0,
            orbit_sensitivity: 0.005,
            zoom_sensitivity: 0.25,
            torso_height: 1.23,
        }
    }
}

/// Upstream LLM/TTS API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Chat-completion model
    pub model: String,
    /// Speech-synthesis model
    pub tts_model: String,
    /// Default synthesis voice
    pub voice: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            tts_model: "canopylabs/orpheus-v1-english".to_string(),
            voice: "daniel".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("foyer3d");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/foyer3d");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/foyer3d");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("foyer3d");
        }
    }

    PathBuf::from(".")
}
