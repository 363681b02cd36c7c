// Presentation layer - HTTP surface for the dashboard adapter
pub mod app_state;
pub mod handlers;
