// Outbound port for accepted frames (dashboard adapter, persistence)
use crate::application::alert_throttle::CriticalAlert;
use crate::application::pipeline::IngestReport;
use async_trait::async_trait;

/// One accepted frame together with the alerts it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    pub report: IngestReport,
    pub alerts: Vec<CriticalAlert>,
}

#[async_trait]
pub trait UpdateSink: Send + Sync {
    /// Deliver one frame's updates. Failures are reported, never retried.
    async fn publish(&self, event: &FrameEvent) -> anyhow::Result<()>;
}
