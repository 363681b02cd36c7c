// Main entry point - Dependency injection and server setup
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fire_telemetry::application::channel_store::ChannelStore;
use fire_telemetry::application::ingest_service::{IngestService, frame_queue};
use fire_telemetry::infrastructure::broadcast_sink::BroadcastSink;
use fire_telemetry::infrastructure::config::load_app_config;
use fire_telemetry::infrastructure::mqtt_source::MqttFrameSource;
use fire_telemetry::presentation::app_state::AppState;
use fire_telemetry::presentation::handlers::{
    get_channel, get_stats, health_check, list_channels, stream_updates, submit_frame,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Channel state and outbound fan-out
    let store = ChannelStore::shared();
    let sink = BroadcastSink::new(config.ingest.broadcast_capacity);

    // Single-writer ingest worker
    let (frames, frame_rx) = frame_queue(config.ingest.queue_depth);
    let service = IngestService::new(
        store.clone(),
        Arc::new(sink.clone()),
        config.alerts.cooldown(),
    );
    let worker = tokio::spawn(service.run(frame_rx));

    // Shutdown signal shared by the transport, the SSE streams and the server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    // Transport
    let mqtt = if config.mqtt.enabled {
        let source = MqttFrameSource::new(config.mqtt.clone(), frames.clone());
        Some(tokio::spawn(source.run(shutdown_rx.clone())))
    } else {
        tracing::info!("MQTT source disabled; frames accepted on POST /frames only");
        None
    };

    // Create application state
    let state = Arc::new(AppState {
        store,
        frames,
        updates: sink,
        shutdown: shutdown_rx.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/channels", get(list_channels))
        .route("/channels/:id", get(get_channel))
        .route("/stats", get(get_stats))
        .route("/updates", get(stream_updates))
        .route("/frames", post(submit_frame))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting fire-telemetry service on {}", addr);

    let mut server_shutdown = shutdown_rx;
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    // Every frame sender is gone once the transport stops; the worker drains and exits.
    if let Some(mqtt) = mqtt {
        mqtt.await??;
    }
    worker.await?;

    Ok(())
}
