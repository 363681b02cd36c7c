// Fire sensor telemetry: frame decoding, anomaly masks and per-channel alarm state
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
