// Channel domain model
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

/// Number of most recent readings kept per channel.
pub const HISTORY_CAPACITY: usize = 50;

/// Margin below a threshold a reading must fall before a lower status resumes.
pub const HYSTERESIS_BUFFER: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelId {
    Temperature,
    Humidity,
    AirQuality,
    Gas,
    SurfaceTemperature,
    Tvoc,
    Eco2,
    No2,
    Co,
}

impl ChannelId {
    /// Catalogue order, as the dashboard lists the channels.
    pub const ALL: [ChannelId; 9] = [
        ChannelId::Temperature,
        ChannelId::Humidity,
        ChannelId::AirQuality,
        ChannelId::Gas,
        ChannelId::SurfaceTemperature,
        ChannelId::Tvoc,
        ChannelId::Eco2,
        ChannelId::No2,
        ChannelId::Co,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::Temperature => "temperature",
            ChannelId::Humidity => "humidity",
            ChannelId::AirQuality => "air-quality",
            ChannelId::Gas => "gas",
            ChannelId::SurfaceTemperature => "surface-temperature",
            ChannelId::Tvoc => "tvoc",
            ChannelId::Eco2 => "eco2",
            ChannelId::No2 => "no2",
            ChannelId::Co => "co",
        }
    }

    pub fn spec(&self) -> &'static ChannelSpec {
        match self {
            ChannelId::Temperature => &TEMPERATURE,
            ChannelId::Humidity => &HUMIDITY,
            ChannelId::AirQuality => &AIR_QUALITY,
            ChannelId::Gas => &GAS,
            ChannelId::SurfaceTemperature => &SURFACE_TEMPERATURE,
            ChannelId::Tvoc => &TVOC,
            ChannelId::Eco2 => &ECO2,
            ChannelId::No2 => &NO2,
            ChannelId::Co => &CO,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown channel identifier: {0}")]
pub struct UnknownChannel(pub String);

impl FromStr for ChannelId {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

/// Static description of a monitored quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f32,
    pub max: f32,
    pub warning_threshold: f32,
    pub critical_threshold: f32,
}

impl ChannelSpec {
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Gauge position of `value` inside `[min, max]`, clamped to `0.0..=1.0`.
    pub fn range_fraction(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

static TEMPERATURE: ChannelSpec = ChannelSpec {
    name: "Temperature",
    unit: "°C",
    min: 15.0,
    max: 60.0,
    warning_threshold: 35.0,
    critical_threshold: 45.0,
};

static HUMIDITY: ChannelSpec = ChannelSpec {
    name: "Humidity",
    unit: "%",
    min: 20.0,
    max: 85.0,
    warning_threshold: 30.0,
    critical_threshold: 80.0,
};

static AIR_QUALITY: ChannelSpec = ChannelSpec {
    name: "Air Quality",
    unit: "AQI",
    min: 0.0,
    max: 200.0,
    warning_threshold: 50.0,
    critical_threshold: 100.0,
};

static GAS: ChannelSpec = ChannelSpec {
    name: "Gas Detection",
    unit: "ppm",
    min: 50.0,
    max: 800.0,
    warning_threshold: 300.0,
    critical_threshold: 500.0,
};

static SURFACE_TEMPERATURE: ChannelSpec = ChannelSpec {
    name: "Surface Temp",
    unit: "°C",
    min: 18.0,
    max: 90.0,
    warning_threshold: 60.0,
    critical_threshold: 80.0,
};

static TVOC: ChannelSpec = ChannelSpec {
    name: "TVOC",
    unit: "ppb",
    min: 0.0,
    max: 2000.0,
    warning_threshold: 660.0,
    critical_threshold: 2200.0,
};

static ECO2: ChannelSpec = ChannelSpec {
    name: "eCO2",
    unit: "ppm",
    min: 400.0,
    max: 5000.0,
    warning_threshold: 1000.0,
    critical_threshold: 2000.0,
};

static NO2: ChannelSpec = ChannelSpec {
    name: "NO2",
    unit: "ppb",
    min: 0.0,
    max: 200.0,
    warning_threshold: 50.0,
    critical_threshold: 100.0,
};

static CO: ChannelSpec = ChannelSpec {
    name: "CO",
    unit: "ppm",
    min: 0.0,
    max: 100.0,
    warning_threshold: 25.0,
    critical_threshold: 50.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Status {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trend {
    pub direction: TrendDirection,
    pub magnitude: f32,
}

impl Trend {
    pub fn stable() -> Self {
        Self::default()
    }

    /// Short text for the trend badge, e.g. `+1.2°C` or `Stable`.
    pub fn label(&self, unit: &str) -> String {
        match self.direction {
            TrendDirection::Stable => "Stable".to_string(),
            TrendDirection::Up => format!("+{:.1}{}", self.magnitude, unit),
            TrendDirection::Down => format!("-{:.1}{}", self.magnitude, unit),
        }
    }
}

/// Live state of one channel. Mutated only by the state engine.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub value: f32,
    pub status: Status,
    pub trend: Trend,
    pub history: VecDeque<f32>,
    pub last_update: Option<Instant>,
}

impl Channel {
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            value: 0.0,
            status: Status::Normal,
            trend: Trend::stable(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            last_update: None,
        }
    }

    pub fn spec(&self) -> &'static ChannelSpec {
        self.id.spec()
    }
}

/// Result of applying one reading, handed to the dashboard adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelUpdate {
    pub channel_id: ChannelId,
    pub value: f32,
    pub status: Status,
    pub trend: Trend,
}
