// HTTP request handlers
use crate::domain::channel::{ChannelId, UnknownChannel};
use crate::infrastructure::json_mapper::{
    ChannelView, FrameView, StatsView, channel_to_view, stats_to_view,
};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Snapshot of every channel, in catalogue order
pub async fn list_channels(State(state): State<Arc<AppState>>) -> Json<Vec<ChannelView>> {
    let store = state.store.read().await;
    Json(store.iter().map(channel_to_view).collect())
}

/// Single channel; identifiers outside the fixed set are rejected here
pub async fn get_channel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChannelView>, (StatusCode, String)> {
    let channel_id: ChannelId = id
        .parse()
        .map_err(|e: UnknownChannel| (StatusCode::NOT_FOUND, e.to_string()))?;

    let store = state.store.read().await;
    Ok(Json(channel_to_view(store.get(channel_id))))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsView> {
    let stats = state.store.read().await.stats();
    Json(stats_to_view(stats))
}

fn frame_event(
    message: Result<FrameView, BroadcastStreamRecvError>,
) -> Option<Result<Event, Infallible>> {
    match message {
        Ok(view) => match Event::default().event("frame").json_data(&view) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!("Failed to encode frame event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("Update stream lagged, skipped {} frames", skipped);
            None
        }
    }
}

/// Live stream of accepted frames as Server-Sent Events, closed on shutdown
pub async fn stream_updates(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut shutdown = state.shutdown.clone();
    let closed = async move {
        let _ = shutdown.wait_for(|stop| *stop).await;
    };

    let stream = BroadcastStream::new(state.updates.subscribe())
        .filter_map(|message| async move { frame_event(message) })
        .take_until(closed);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Accept one raw frame from an HTTP-speaking transport
pub async fn submit_frame(State(state): State<Arc<AppState>>, body: String) -> StatusCode {
    match state.frames.try_send(body) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(TrySendError::Full(_)) => {
            tracing::warn!("Ingest queue full, rejecting frame");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(TrySendError::Closed(_)) => {
            tracing::error!("Ingest queue closed, rejecting frame");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::channel_store::ChannelStore;
    use crate::application::ingest_service::{FrameReceiver, frame_queue};
    use crate::domain::channel::Status;
    use crate::infrastructure::broadcast_sink::BroadcastSink;

    fn test_state(depth: usize) -> (Arc<AppState>, FrameReceiver) {
        let (frames, rx) = frame_queue(depth);
        let (_shutdown_tx, shutdown) = tokio::sync::watch::channel(false);
        let state = Arc::new(AppState {
            store: ChannelStore::shared(),
            frames,
            updates: BroadcastSink::new(4),
            shutdown,
        });
        (state, rx)
    }

    #[tokio::test]
    async fn test_list_channels_returns_all_nine() {
        let (state, _rx) = test_state(1);
        let Json(channels) = list_channels(State(state)).await;
        assert_eq!(channels.len(), 9);
        assert_eq!(channels[4].id, "surface-temperature");
    }

    #[tokio::test]
    async fn test_get_channel() {
        let (state, _rx) = test_state(1);
        state.store.write().await.get_mut(ChannelId::Gas).status = Status::Warning;

        let Json(view) = get_channel(Path("gas".to_string()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(view.status, "warning");

        let err = get_channel(Path("smoke".to_string()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats() {
        let (state, _rx) = test_state(1);
        state.store.write().await.get_mut(ChannelId::Co).status = Status::Critical;
        let Json(stats) = get_stats(State(state)).await;
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.active_alerts, 1);
        assert_eq!(stats.online, 9);
    }

    #[tokio::test]
    async fn test_submit_frame_queues_body() {
        let (state, mut rx) = test_state(1);

        let body = "0xAA0x55".to_string();
        let status = submit_frame(State(state.clone()), body).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(rx.recv().await.as_deref(), Some("0xAA0x55"));
    }

    #[tokio::test]
    async fn test_submit_frame_rejects_when_full() {
        let (state, _rx) = test_state(1);
        let first = submit_frame(State(state.clone()), "a".to_string()).await;
        let second = submit_frame(State(state), "b".to_string()).await;
        assert_eq!(first, StatusCode::ACCEPTED);
        assert_eq!(second, StatusCode::SERVICE_UNAVAILABLE);
    }
}
