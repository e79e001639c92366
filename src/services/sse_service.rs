//! Plumbing between the in-process broadcast hubs and the HTTP SSE
//! responses, including the single-host token handshake.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::{
    dto::sse::{HostHandshake, ServerEvent},
    error::ServiceError,
    state::{SharedState, SseHub},
};

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Subscribe to the host-only SSE stream, claiming the single host token.
pub async fn subscribe_host(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let token = claim_host_token(state).await?;
    let receiver = state.host_sse().subscribe();
    Ok((receiver, token))
}

/// SSE response for a public subscriber.
pub fn public_sse_stream(
    receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_response(event_stream(receiver))
}

/// SSE response for the host subscriber.
///
/// The returned stream owns the host slot: when axum drops it on
/// disconnect, the token is released and the next host connection can
/// claim it.
pub fn host_sse_stream(
    state: SharedState,
    receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let slot = HostSlot { state };
    let stream = event_stream(receiver).map(move |event| {
        let _held = &slot;
        event
    });
    sse_response(stream)
}

/// Releases the host token once the response stream is dropped.
///
/// Axum drops the stream whenever the client goes away, so tying the
/// release to `Drop` frees the slot even when the connection dies
/// mid-write rather than closing cleanly.
struct HostSlot {
    state: SharedState,
}

impl Drop for HostSlot {
    fn drop(&mut self) {
        let state = self.state.clone();
        tokio::spawn(async move {
            state.host_token().lock().await.take();
            tracing::info!("host SSE stream disconnected; token released");
        });
    }
}

/// Adapt a broadcast receiver into SSE events.
///
/// A lagged receiver skips the missed events and stays subscribed; the
/// next full-snapshot rebroadcast catches it up.
fn event_stream(
    receiver: broadcast::Receiver<ServerEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(receiver).filter_map(|payload| async move {
        let payload = payload.ok()?;
        let mut event = Event::default().data(payload.data);
        if let Some(name) = payload.event {
            event = event.event(name);
        }
        Some(Ok(event))
    })
}

fn sse_response<S>(stream: S) -> Sse<KeepAliveStream<S>>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Reserve the host token for a new stream, failing when another
/// connection already holds it.
async fn claim_host_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.host_token().lock().await;
    if guard.is_some() {
        return Err(ServiceError::Unauthorized(
            "another host SSE stream is already active".into(),
        ));
    }
    let token = Uuid::new_v4().simple().to_string();
    *guard = Some(token.clone());
    Ok(token)
}

/// Announce the freshly issued token on the host stream.
pub fn broadcast_host_handshake(hub: &SseHub, token: &str) {
    if let Ok(event) = ServerEvent::json(
        Some("host_token".to_string()),
        &HostHandshake {
            token: token.to_string(),
        },
    ) {
        hub.broadcast(event);
    }
}

/// Send a human-readable info message onto the public SSE stream.
pub fn broadcast_public_info(hub: &SseHub, message: &str) {
    hub.broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::test_state;

    #[tokio::test]
    async fn host_token_is_exclusive_until_released() {
        let (state, _store) = test_state().await;

        let (_receiver, token) = subscribe_host(&state).await.unwrap();
        assert!(!token.is_empty());

        let err = subscribe_host(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        // Releasing the slot lets the next connection claim a new token.
        state.host_token().lock().await.take();
        let (_receiver, second) = subscribe_host(&state).await.unwrap();
        assert_ne!(token, second);
    }
}
