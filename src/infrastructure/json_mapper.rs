// Mapper to convert domain models to JSON views
use crate::application::alert_throttle::CriticalAlert;
use crate::application::channel_store::SystemStats;
use crate::application::update_sink::FrameEvent;
use crate::domain::channel::{Channel, ChannelUpdate, Trend};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendView {
    pub direction: &'static str,
    pub magnitude: f32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChannelView {
    pub id: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub value: f32,
    pub status: &'static str,
    pub trend: TrendView,
    pub min: f32,
    pub max: f32,
    pub warning_threshold: f32,
    pub critical_threshold: f32,
    pub gauge: f32,
    pub history: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpdateView {
    pub channel: &'static str,
    pub value: f32,
    pub status: &'static str,
    pub trend: TrendView,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlertView {
    pub channel: &'static str,
    pub value: f32,
    pub threshold: f32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FrameView {
    pub received_at: DateTime<Utc>,
    pub mask: String,
    pub mask_severity: &'static str,
    pub field_errors: usize,
    pub updates: Vec<UpdateView>,
    pub alerts: Vec<AlertView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsView {
    pub critical: usize,
    pub warning: usize,
    pub normal: usize,
    pub active_alerts: usize,
    pub online: usize,
}

fn trend_to_view(trend: &Trend, unit: &str) -> TrendView {
    TrendView {
        direction: trend.direction.as_str(),
        magnitude: trend.magnitude,
        label: trend.label(unit),
    }
}

pub fn channel_to_view(channel: &Channel) -> ChannelView {
    let spec = channel.spec();
    ChannelView {
        id: channel.id.as_str(),
        name: spec.name,
        unit: spec.unit,
        value: channel.value,
        status: channel.status.as_str(),
        trend: trend_to_view(&channel.trend, spec.unit),
        min: spec.min,
        max: spec.max,
        warning_threshold: spec.warning_threshold,
        critical_threshold: spec.critical_threshold,
        gauge: spec.range_fraction(channel.value),
        history: channel.history.iter().copied().collect(),
    }
}

pub fn update_to_view(update: &ChannelUpdate) -> UpdateView {
    UpdateView {
        channel: update.channel_id.as_str(),
        value: update.value,
        status: update.status.as_str(),
        trend: trend_to_view(&update.trend, update.channel_id.spec().unit),
    }
}

fn alert_to_view(alert: &CriticalAlert) -> AlertView {
    AlertView {
        channel: alert.channel_id.as_str(),
        value: alert.value,
        threshold: alert.threshold,
        message: alert.message(),
    }
}

pub fn event_to_view(event: &FrameEvent, received_at: DateTime<Utc>) -> FrameView {
    FrameView {
        received_at,
        mask: event.report.mask.bit_string(),
        mask_severity: event.report.mask.severity().as_str(),
        field_errors: event.report.field_errors,
        updates: event.report.updates.iter().map(update_to_view).collect(),
        alerts: event.alerts.iter().map(alert_to_view).collect(),
    }
}

pub fn stats_to_view(stats: SystemStats) -> StatsView {
    StatsView {
        critical: stats.critical,
        warning: stats.warning,
        normal: stats.normal,
        active_alerts: stats.active_alerts,
        online: stats.online,
    }
}
