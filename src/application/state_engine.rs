// Channel state engine - hysteretic status, bounded history and trend
use crate::application::channel_store::ChannelStore;
use crate::domain::channel::{
    ChannelId, ChannelUpdate, HISTORY_CAPACITY, HYSTERESIS_BUFFER, Status, Trend, TrendDirection,
};
use std::collections::VecDeque;
use std::time::Instant;

/// History length from which the trend is recomputed.
pub const TREND_MIN_HISTORY: usize = 10;

const TREND_WINDOW: usize = 5;
const TREND_STABLE_BAND: f32 = 0.5;

/// Threshold transition from `current` for a new reading.
pub fn next_status(current: Status, value: f32, warning: f32, critical: f32) -> Status {
    match current {
        Status::Normal => {
            if value >= critical {
                Status::Critical
            } else if value >= warning {
                Status::Warning
            } else {
                Status::Normal
            }
        }
        Status::Warning => {
            if value >= critical {
                Status::Critical
            } else if value < warning - HYSTERESIS_BUFFER {
                Status::Normal
            } else {
                Status::Warning
            }
        }
        Status::Critical => {
            if value < critical - HYSTERESIS_BUFFER {
                if value >= warning {
                    Status::Warning
                } else {
                    Status::Normal
                }
            } else {
                Status::Critical
            }
        }
    }
}

/// Append to the history, evicting the oldest entry at capacity.
pub fn push_history(history: &mut VecDeque<f32>, value: f32) {
    history.push_back(value);
    while history.len() > HISTORY_CAPACITY {
        history.pop_front();
    }
}

/// Compare the mean of the last five readings with the five before them.
/// `None` while fewer than ten readings are available.
pub fn compute_trend(history: &VecDeque<f32>) -> Option<Trend> {
    let len = history.len();
    if len < TREND_MIN_HISTORY {
        return None;
    }

    let mean = |range: std::ops::Range<usize>| -> f32 {
        range.map(|i| history[i]).sum::<f32>() / TREND_WINDOW as f32
    };
    let recent = mean(len - TREND_WINDOW..len);
    let older = mean(len - 2 * TREND_WINDOW..len - TREND_WINDOW);
    let diff = recent - older;

    let trend = if diff.abs() < TREND_STABLE_BAND {
        Trend::stable()
    } else if diff > 0.0 {
        Trend {
            direction: TrendDirection::Up,
            magnitude: diff.abs(),
        }
    } else {
        Trend {
            direction: TrendDirection::Down,
            magnitude: diff.abs(),
        }
    };

    Some(trend)
}

/// Apply one accepted reading to a channel.
///
/// Status follows the threshold table first; an anomaly flag then forces
/// `critical` for this update, and the next reading evaluates hysteresis
/// from there.
pub fn apply_reading(
    store: &mut ChannelStore,
    channel_id: ChannelId,
    value: f32,
    anomalous: bool,
    now: Instant,
) -> ChannelUpdate {
    let channel = store.get_mut(channel_id);
    let spec = channel.spec();

    if !spec.contains(value) {
        tracing::debug!(
            "{} reading {} outside display range [{}, {}]",
            channel_id,
            value,
            spec.min,
            spec.max
        );
    }

    let mut status = next_status(
        channel.status,
        value,
        spec.warning_threshold,
        spec.critical_threshold,
    );
    if anomalous {
        status = Status::Critical;
    }

    if status != channel.status {
        tracing::info!(
            "{} status {} -> {} at {}{}",
            channel_id,
            channel.status.as_str(),
            status.as_str(),
            value,
            spec.unit
        );
    }

    channel.value = value;
    channel.status = status;
    channel.last_update = Some(now);

    push_history(&mut channel.history, value);
    if let Some(trend) = compute_trend(&channel.history) {
        channel.trend = trend;
    }

    ChannelUpdate {
        channel_id,
        value,
        status: channel.status,
        trend: channel.trend,
    }
}
