// Ingest service - single writer between the transport and the channel store
use crate::application::alert_throttle::AlertThrottle;
use crate::application::channel_store::SharedStore;
use crate::application::pipeline::FramePipeline;
use crate::application::update_sink::{FrameEvent, UpdateSink};
use crate::domain::frame::FrameError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Queue carrying raw frame text from any transport into the worker.
pub type FrameSender = mpsc::Sender<String>;
pub type FrameReceiver = mpsc::Receiver<String>;

pub fn frame_queue(depth: usize) -> (FrameSender, FrameReceiver) {
    mpsc::channel(depth)
}

pub struct IngestService {
    store: SharedStore,
    pipeline: FramePipeline,
    throttle: AlertThrottle,
    sink: Arc<dyn UpdateSink>,
}

impl IngestService {
    pub fn new(store: SharedStore, sink: Arc<dyn UpdateSink>, alert_cooldown: Duration) -> Self {
        Self {
            store,
            pipeline: FramePipeline::new(),
            throttle: AlertThrottle::new(alert_cooldown),
            sink,
        }
    }

    pub async fn handle_frame(&mut self, raw: &str) -> Result<FrameEvent, FrameError> {
        let now = Instant::now();

        let report = {
            let mut store = self.store.write().await;
            self.pipeline.process(&mut store, raw, now)
        };

        let report = match report {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Dropping frame: {}", e);
                return Err(e);
            }
        };

        let alerts = self.throttle.check_all(&report.updates, now);
        for alert in &alerts {
            tracing::warn!("{}", alert.message());
        }

        let event = FrameEvent { report, alerts };
        if let Err(e) = self.sink.publish(&event).await {
            tracing::error!("Failed to publish frame updates: {}", e);
        }

        Ok(event)
    }

    /// Drain the queue until every sender is gone.
    pub async fn run(mut self, mut rx: FrameReceiver) {
        tracing::info!("Ingest worker started");
        while let Some(raw) = rx.recv().await {
            let _ = self.handle_frame(&raw).await;
        }
        tracing::info!("Ingest worker stopped");
    }
}
