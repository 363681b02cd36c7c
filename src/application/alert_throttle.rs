// Critical alert throttle - at most one alert per channel per cooldown window
use crate::domain::channel::{ChannelId, ChannelUpdate, Status};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct CriticalAlert {
    pub channel_id: ChannelId,
    pub value: f32,
    pub threshold: f32,
}

impl CriticalAlert {
    pub fn message(&self) -> String {
        let spec = self.channel_id.spec();
        format!(
            "CRITICAL LEVEL: {} {:.2}{} (Threshold: {}{})",
            spec.name, self.value, spec.unit, self.threshold, spec.unit
        )
    }
}

#[derive(Debug)]
pub struct AlertThrottle {
    cooldown: Duration,
    last_fired: HashMap<ChannelId, Instant>,
}

impl AlertThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    pub fn check(&mut self, update: &ChannelUpdate, now: Instant) -> Option<CriticalAlert> {
        if update.status != Status::Critical {
            return None;
        }

        if let Some(last) = self.last_fired.get(&update.channel_id) {
            if now.saturating_duration_since(*last) <= self.cooldown {
                return None;
            }
        }

        self.last_fired.insert(update.channel_id, now);
        Some(CriticalAlert {
            channel_id: update.channel_id,
            value: update.value,
            threshold: update.channel_id.spec().critical_threshold,
        })
    }

    pub fn check_all(&mut self, updates: &[ChannelUpdate], now: Instant) -> Vec<CriticalAlert> {
        updates
            .iter()
            .filter_map(|update| self.check(update, now))
            .collect()
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::channel::Trend;

    fn update(channel_id: ChannelId, value: f32, status: Status) -> ChannelUpdate {
        ChannelUpdate {
            channel_id,
            value,
            status,
            trend: Trend::stable(),
        }
    }

    #[test]
    fn test_only_critical_updates_alert() {
        let mut throttle = AlertThrottle::default();
        let now = Instant::now();
        let warning = update(ChannelId::Co, 30.0, Status::Warning);
        assert!(throttle.check(&warning, now).is_none());

        let critical = update(ChannelId::Co, 60.0, Status::Critical);
        let alert = throttle.check(&critical, now).unwrap();
        assert_eq!(alert.threshold, 50.0);
        assert_eq!(
            alert.message(),
            "CRITICAL LEVEL: CO 60.00ppm (Threshold: 50ppm)"
        );
    }

    #[test]
    fn test_cooldown_suppresses_repeats() {
        let mut throttle = AlertThrottle::new(Duration::from_secs(30));
        let start = Instant::now();
        let critical = update(ChannelId::Temperature, 50.0, Status::Critical);

        let after = |secs| start + Duration::from_secs(secs);

        assert!(throttle.check(&critical, start).is_some());
        assert!(throttle.check(&critical, after(10)).is_none());
        // exactly one cooldown later is still inside the window
        assert!(throttle.check(&critical, after(30)).is_none());
        assert!(throttle.check(&critical, after(31)).is_some());
    }

    #[test]
    fn test_channels_are_throttled_independently() {
        let mut throttle = AlertThrottle::default();
        let now = Instant::now();
        let alerts = throttle.check_all(
            &[
                update(ChannelId::Temperature, 50.0, Status::Critical),
                update(ChannelId::Gas, 600.0, Status::Critical),
                update(ChannelId::Humidity, 10.0, Status::Normal),
            ],
            now,
        );
        assert_eq!(alerts.len(), 2);

        let repeat = throttle.check(&update(ChannelId::Gas, 600.0, Status::Critical), now);
        assert!(repeat.is_none());
    }
}
