use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub mqtt: MqttSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub alerts: AlertSettings,
    #[serde(default)]
    pub ingest: IngestSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MqttSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 1883,
            topic: "aicofire".to_string(),
            client_id: "fire_telemetry".to_string(),
            keep_alive_secs: 60,
            backoff_initial_ms: 1_000,
            backoff_max_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertSettings {
    pub cooldown_secs: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self { cooldown_secs: 30 }
    }
}

impl AlertSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestSettings {
    pub queue_depth: usize,
    pub broadcast_capacity: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            queue_depth: 64,
            broadcast_capacity: 128,
        }
    }
}

/// Load `config/fire.*` (optional) with `FIRE_<SECTION>__<KEY>` environment overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_from(
        config::File::with_name("config/fire").required(false),
        fire_environment(),
    )
}

fn fire_environment() -> config::Environment {
    config::Environment::with_prefix("FIRE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_from<S>(file: S, environment: config::Environment) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?;

    Ok(settings.try_deserialize()?)
}
