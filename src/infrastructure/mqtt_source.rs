// MQTT frame source - subscribes to the sensor topic and feeds the ingest queue
use crate::application::ingest_service::FrameSender;
use crate::infrastructure::config::MqttSettings;
use bytes::Bytes;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::watch;

/// Exponential reconnect delay, doubled per failure and capped.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Frame payloads are ASCII text; anything else is dropped.
pub fn payload_to_frame(payload: &Bytes) -> Option<String> {
    match std::str::from_utf8(payload) {
        Ok(text) => Some(text.to_string()),
        Err(e) => {
            tracing::warn!(
                "Dropping non-UTF-8 payload ({} bytes): {}",
                payload.len(),
                e
            );
            None
        }
    }
}

/// Outcome of handing one frame to the ingest queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forward {
    Queued,
    Shutdown,
    Closed,
}

/// Queue a frame, waiting for room unless shutdown is signalled first.
pub async fn forward_frame(
    frames: &FrameSender,
    frame: String,
    shutdown: &mut watch::Receiver<bool>,
) -> Forward {
    tokio::select! {
        _ = shutdown.changed() => Forward::Shutdown,
        sent = frames.send(frame) => match sent {
            Ok(()) => Forward::Queued,
            Err(_) => Forward::Closed,
        },
    }
}

pub struct MqttFrameSource {
    settings: MqttSettings,
    frames: FrameSender,
}

impl MqttFrameSource {
    pub fn new(settings: MqttSettings, frames: FrameSender) -> Self {
        Self { settings, frames }
    }

    /// Poll the broker until `shutdown` flips or the ingest queue closes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut options = MqttOptions::new(
            self.settings.client_id.clone(),
            self.settings.host.clone(),
            self.settings.port,
        );
        options.set_keep_alive(Duration::from_secs(self.settings.keep_alive_secs));
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let mut backoff = Backoff::new(
            Duration::from_millis(self.settings.backoff_initial_ms),
            Duration::from_millis(self.settings.backoff_max_ms),
        );

        tracing::info!(
            "Connecting to MQTT broker {}:{} (topic {})",
            self.settings.host,
            self.settings.port,
            self.settings.topic
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!("Connected to MQTT broker");
                        backoff.reset();
                        // Clean sessions drop subscriptions, so subscribe on every connect.
                        let topic = self.settings.topic.as_str();
                        if let Err(e) = client.try_subscribe(topic, QoS::AtMostOnce) {
                            tracing::error!("Failed to subscribe to {}: {}", topic, e);
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let Some(frame) = payload_to_frame(&publish.payload) else {
                            continue;
                        };
                        match forward_frame(&self.frames, frame, &mut shutdown).await {
                            Forward::Queued => {}
                            Forward::Shutdown => break,
                            Forward::Closed => {
                                tracing::warn!("Ingest queue closed, stopping MQTT source");
                                break;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let delay = backoff.next_delay();
                        tracing::warn!("MQTT connection error: {}; retrying in {:?}", e, delay);
                        tokio::select! {
                            _ = shutdown.changed() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                },
            }
        }

        if let Err(e) = client.try_disconnect() {
            tracing::debug!("MQTT disconnect: {}", e);
        }
        tracing::info!("MQTT source stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(Duration::from_millis(500), Duration::from_secs(3));
        let delays: Vec<u128> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 3000, 3000]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_max_never_below_initial() {
        let mut backoff = Backoff::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_payload_to_frame() {
        assert_eq!(
            payload_to_frame(&Bytes::from_static(b"0xAA0x55")),
            Some("0xAA0x55".to_string())
        );
        assert_eq!(payload_to_frame(&Bytes::from_static(&[0xFF, 0xFE])), None);
    }

    #[tokio::test]
    async fn test_forward_frame_queues() {
        let (tx, mut rx) = crate::application::ingest_service::frame_queue(1);
        let (_shutdown_tx, mut shutdown) = watch::channel(false);

        let outcome = forward_frame(&tx, "0xAA0x55".to_string(), &mut shutdown).await;
        assert_eq!(outcome, Forward::Queued);
        assert_eq!(rx.recv().await.as_deref(), Some("0xAA0x55"));
    }

    #[tokio::test]
    async fn test_forward_frame_full_queue_yields_to_shutdown() {
        let (tx, _rx) = crate::application::ingest_service::frame_queue(1);
        let (shutdown_tx, mut shutdown) = watch::channel(false);
        tx.send("first".to_string()).await.unwrap();

        shutdown_tx.send(true).unwrap();
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            forward_frame(&tx, "second".to_string(), &mut shutdown),
        )
        .await;
        assert_eq!(outcome, Ok(Forward::Shutdown));
    }

    #[tokio::test]
    async fn test_forward_frame_closed_queue() {
        let (tx, rx) = crate::application::ingest_service::frame_queue(1);
        let (_shutdown_tx, mut shutdown) = watch::channel(false);
        drop(rx);

        let outcome = forward_frame(&tx, "frame".to_string(), &mut shutdown).await;
        assert_eq!(outcome, Forward::Closed);
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let (tx, _rx) = crate::application::ingest_service::frame_queue(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let settings = MqttSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            backoff_initial_ms: 10,
            backoff_max_ms: 10,
            ..MqttSettings::default()
        };

        let handle = tokio::spawn(MqttFrameSource::new(settings, tx).run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
