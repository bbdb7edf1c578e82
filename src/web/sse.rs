//! Server-Sent Events for real-time state updates

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::avatar::AvatarState;
use crate::AppState;

/// Create an SSE stream of avatar state snapshots
pub fn create_state_stream(
    app_state: Arc<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.subscribe_state();

    // Convert broadcast receiver to a stream
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(state) => Some(Ok(state_to_event(&state))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert one avatar state snapshot to an SSE event
fn state_to_event(state: &AvatarState) -> Event {
    let data = serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string());
    Event::default().event("state").data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_carries_full_snapshot() {
        let state = AvatarState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["action"], "idle");
        assert!(json["camera"]["position"].is_array());
    }
}
