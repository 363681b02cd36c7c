// Infrastructure layer - External dependencies and adapters
pub mod broadcast_sink;
pub mod config;
pub mod json_mapper;
pub mod mqtt_source;
