//! REST API endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::chat::{ChatClient, ChatMessage};
use crate::web::sse;
use crate::AppState;

/// API response wrapper for the service's own endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        })
    }

    pub fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            error: None,
        })
    }
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub action: String,
    pub is_speaking: bool,
    pub audio_playing: bool,
    pub version: String,
}

/// Get current status
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let avatar = state.get_avatar_state().await;

    ApiResponse::success(StatusResponse {
        action: avatar.action.to_string(),
        is_speaking: avatar.is_speaking,
        audio_playing: state.speech.is_playing(),
        version: crate::VERSION.to_string(),
    })
}

/// Get the latest avatar state snapshot
pub async fn get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.get_avatar_state().await)
}

/// Get current configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.config.read().await;
    Json(config.clone())
}

/// Update configuration
#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub walk_speed: Option<f32>,
    #[serde(default)]
    pub run_speed: Option<f32>,
    #[serde(default)]
    pub lipsync_gain: Option<f32>,
    #[serde(default)]
    pub lipsync_gate: Option<f32>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    let mut config = state.config.write().await;
    let mut updated = config.clone();

    if let Some(speed) = update.walk_speed {
        updated.locomotion.walk_speed = speed;
    }
    if let Some(speed) = update.run_speed {
        updated.locomotion.run_speed = speed;
    }
    if let Some(gain) = update.lipsync_gain {
        updated.lipsync.gain = gain;
    }
    if let Some(gate) = update.lipsync_gate {
        updated.lipsync.gate = gate;
    }
    if let Some(voice) = update.voice {
        updated.chat.voice = voice;
    }
    if let Some(model) = update.model {
        updated.chat.model = model;
    }

    // Reject the whole update rather than leaving a half-applied config
    if let Err(e) = updated.validate() {
        return ApiResponse::error(&e.to_string());
    }
    *config = updated;
    drop(config);

    state.signal_config_changed();
    ApiResponse::<()>::ok()
}

/// Partial input update from the browser client
#[derive(Debug, Deserialize)]
pub struct InputUpdate {
    #[serde(default)]
    pub forward: Option<bool>,
    #[serde(default)]
    pub backward: Option<bool>,
    #[serde(default)]
    pub left: Option<bool>,
    #[serde(default)]
    pub right: Option<bool>,
    #[serde(default)]
    pub run: Option<bool>,
    #[serde(default)]
    pub joystick: Option<[f32; 2]>,
    #[serde(default)]
    pub movement_enabled: Option<bool>,
    #[serde(default)]
    pub exploration_enabled: Option<bool>,
    #[serde(default)]
    pub orbit_delta: Option<[f32; 2]>,
    #[serde(default)]
    pub zoom_delta: Option<f32>,
}

pub async fn update_input(
    State(state): State<Arc<AppState>>,
    Json(update): Json<InputUpdate>,
) -> impl IntoResponse {
    let mut input = state.input.write().await;

    if let Some(v) = update.forward {
        input.forward = v;
    }
    if let Some(v) = update.backward {
        input.backward = v;
    }
    if let Some(v) = update.left {
        input.left = v;
    }
    if let Some(v) = update.right {
        input.right = v;
    }
    if let Some(v) = update.run {
        input.run = v;
    }
    if let Some(v) = update.joystick {
        input.joystick = v;
    }
    if let Some(v) = update.movement_enabled {
        input.movement_enabled = v;
    }
    if let Some(v) = update.exploration_enabled {
        input.exploration_enabled = v;
    }
    // Deltas accumulate until the frame loop drains them
    if let Some(d) = update.orbit_delta {
        input.orbit_delta[0] += d[0];
        input.orbit_delta[1] += d[1];
    }
    if let Some(z) = update.zoom_delta {
        input.zoom_delta += z;
    }

    ApiResponse::<()>::ok()
}

/// Chat completion proxy request
#[derive(Debug, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<ChatMessage>,
}

/// Forward a conversation to the hosted LLM. Responds `{text}` on success,
/// `{error}` with 500 on upstream failure.
pub async fn post_llm(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LlmRequest>,
) -> Response {
    let chat_config = state.config.read().await.chat.clone();
    let client = ChatClient::new(&state.http, &chat_config);

    match client.complete(&request.messages).await {
        Ok(text) => Json(serde_json::json!({ "text": text })).into_response(),
        Err(e) => {
            tracing::error!("LLM request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Speech synthesis proxy request
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

/// Forward text to the hosted TTS API and return the raw audio bytes.
pub async fn post_tts(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TtsRequest>,
) -> Response {
    if request.text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Text is required" })),
        )
            .into_response();
    }

    let chat_config = state.config.read().await.chat.clone();
    let client = ChatClient::new(&state.http, &chat_config);

    match client.synthesize(&request.text, request.voice.as_deref()).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "audio/wav")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("TTS request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Synthesize speech and play it through the avatar's speech channel. The
/// viewer observes the result through `is_speaking`/`mouth_open` on the
/// state stream.
pub async fn post_speak(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TtsRequest>,
) -> Response {
    if request.text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Text is required" })),
        )
            .into_response();
    }

    let chat_config = state.config.read().await.chat.clone();
    let client = ChatClient::new(&state.http, &chat_config);

    let bytes = match client.synthesize(&request.text, request.voice.as_deref()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("TTS request failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    match state.speech.play(bytes) {
        Ok(()) => ApiResponse::<()>::ok().into_response(),
        Err(e) => {
            tracing::error!("Playback failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// SSE stream endpoint
pub async fn state_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse::create_state_stream(state)
}
