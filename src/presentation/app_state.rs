// Application state for HTTP handlers
use crate::application::channel_store::SharedStore;
use crate::application::ingest_service::FrameSender;
use crate::infrastructure::broadcast_sink::BroadcastSink;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub frames: FrameSender,
    pub updates: BroadcastSink,
    pub shutdown: watch::Receiver<bool>,
}
