// Application layer - Channel state, frame processing and the ingest worker
pub mod alert_throttle;
pub mod channel_store;
pub mod ingest_service;
pub mod pipeline;
pub mod state_engine;
pub mod update_sink;
