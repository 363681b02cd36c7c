// Broadcast sink - fans accepted frames out to live subscribers
use crate::application::update_sink::{FrameEvent, UpdateSink};
use crate::infrastructure::json_mapper::{FrameView, event_to_view};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<FrameView>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FrameView> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl UpdateSink for BroadcastSink {
    async fn publish(&self, event: &FrameEvent) -> anyhow::Result<()> {
        let view = event_to_view(event, Utc::now());
        match self.tx.send(view) {
            Ok(receivers) => tracing::debug!("Frame delivered to {} subscribers", receivers),
            // No dashboard connected; nothing to deliver.
            Err(_) => tracing::debug!("Frame dropped, no subscribers"),
        }
        Ok(())
    }
}
