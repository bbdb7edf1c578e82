//! Error types for foyer3d

use thiserror::Error;

/// Main error type for foyer3d
#[derive(Error, Debug)]
pub enum Foyer3dError {
    #[error("Animation error: {0}")]
    Anim(#[from] AnimError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Web server error: {0}")]
    Web(#[from] WebError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Animation and retargeting errors
#[derive(Error, Debug)]
pub enum AnimError {
    #[error("No tracks matched while retargeting clip '{clip}'")]
    NoTracksMatched { clip: String },
}

/// Audio playback errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio output: {0}")]
    OutputOpen(String),

    #[error("Failed to decode audio payload: {0}")]
    Decode(String),

    #[error("Playback worker is no longer running")]
    WorkerGone,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Avatar model loading errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to load model file: {0}")]
    Load(String),

    #[error("Model has no skinned skeleton")]
    MissingSkeleton,

    #[error("Animation file '{0}' contains no animations")]
    MissingAnimation(String),
}

/// Upstream LLM/TTS errors
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("API key environment variable '{0}' is not set")]
    MissingApiKey(String),

    #[error("LLM request failed: {0}")]
    LlmRequest(String),

    #[error("TTS synthesis failed: {0}")]
    TtsSynthesis(String),

    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
}

/// Web server errors
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),
}

/// Result type alias for foyer3d operations
pub type Result<T> = std::result::Result<T, Foyer3dError>;
