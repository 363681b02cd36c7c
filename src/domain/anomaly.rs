// Anomaly mask decoding
//
// Upstream firmware has sent the mask field as a raw byte, as a raw 32-bit
// integer and as an IEEE-754 encoded small integer, with no version flag.
// Decoding goes through a single strategy so a future encoding can be added
// without touching the channel mapping.
use super::channel::{ChannelId, Status};
use super::field::{FieldDecodeError, clean_hex, parse_u32_bits};
use thiserror::Error;

/// Bit order of the mask, least-significant first. Surface temperature has no bit.
pub const MASK_CHANNELS: [ChannelId; 8] = [
    ChannelId::Temperature,
    ChannelId::Humidity,
    ChannelId::Gas,
    ChannelId::AirQuality,
    ChannelId::No2,
    ChannelId::Co,
    ChannelId::Tvoc,
    ChannelId::Eco2,
];

/// Number of set bits from which a mask is summarised as critical.
const CRITICAL_BIT_COUNT: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskDecodeError {
    #[error(transparent)]
    Field(#[from] FieldDecodeError),
    #[error("mask token {0:?} decodes to NaN")]
    NotANumber(String),
}

/// Reduces a mask token to its 8-bit warning value.
pub trait MaskDecodeStrategy: Send + Sync {
    fn version(&self) -> u8;

    fn warning_value(&self, token: &str) -> Result<u8, MaskDecodeError>;
}

/// Current-generation decoding: short tokens are a raw byte, anything longer
/// is an `f32` bit pattern rounded to the nearest integer and clamped to a byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatRoundingStrategy;

impl MaskDecodeStrategy for FloatRoundingStrategy {
    fn version(&self) -> u8 {
        2
    }

    fn warning_value(&self, token: &str) -> Result<u8, MaskDecodeError> {
        if clean_hex(token).len() <= 2 {
            let bits = parse_u32_bits(token)?;
            // At most two hex digits, always fits.
            return Ok(bits as u8);
        }

        let value = f32::from_bits(parse_u32_bits(token)?);
        if value.is_nan() {
            return Err(MaskDecodeError::NotANumber(token.to_string()));
        }
        Ok(value.round().clamp(0.0, 255.0) as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnomalyMask(pub u8);

impl AnomalyMask {
    pub fn contains(&self, channel: ChannelId) -> bool {
        MASK_CHANNELS
            .iter()
            .position(|c| *c == channel)
            .is_some_and(|bit| self.0 & (1 << bit) != 0)
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        MASK_CHANNELS
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.0 & (1 << bit) != 0)
            .map(|(_, channel)| *channel)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Eight-character binary rendering, most-significant bit first.
    pub fn bit_string(&self) -> String {
        format!("{:08b}", self.0)
    }

    /// Frame-level summary used when listing stored readings.
    pub fn severity(&self) -> Status {
        match self.0.count_ones() {
            0 => Status::Normal,
            n if n >= CRITICAL_BIT_COUNT => Status::Critical,
            _ => Status::Warning,
        }
    }
}

pub struct AnomalyMaskDecoder<S = FloatRoundingStrategy> {
    strategy: S,
}

impl AnomalyMaskDecoder<FloatRoundingStrategy> {
    pub fn new() -> Self {
        Self {
            strategy: FloatRoundingStrategy,
        }
    }
}

impl Default for AnomalyMaskDecoder<FloatRoundingStrategy> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MaskDecodeStrategy> AnomalyMaskDecoder<S> {
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy_version(&self) -> u8 {
        self.strategy.version()
    }

    /// `mask_field2` is reserved and accepted as-is. A malformed `mask_field1`
    /// flags nothing.
    pub fn decode(&self, _mask_field2: &str, mask_field1: &str) -> AnomalyMask {
        match self.strategy.warning_value(mask_field1) {
            Ok(value) => AnomalyMask(value),
            Err(e) => {
                tracing::warn!("Anomaly mask decode failed, treating as 0: {}", e);
                AnomalyMask::default()
            }
        }
    }
}

pub fn decode_anomaly_mask(mask_field2: &str, mask_field1: &str) -> Vec<ChannelId> {
    AnomalyMaskDecoder::new()
        .decode(mask_field2, mask_field1)
        .channels()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bit_flags_temperature() {
        let flagged = decode_anomaly_mask("0x00", "0x01");
        assert_eq!(flagged, vec![ChannelId::Temperature]);
    }

    #[test]
    fn test_full_byte_flags_all_but_surface_temperature() {
        let flagged = decode_anomaly_mask("0x00", "0xFF");
        assert_eq!(flagged, MASK_CHANNELS.to_vec());
        assert!(!flagged.contains(&ChannelId::SurfaceTemperature));
    }

    #[test]
    fn test_zero_flags_nothing() {
        assert!(decode_anomaly_mask("0x00", "0x00").is_empty());
        assert!(decode_anomaly_mask("0x00000000", "0x00000000").is_empty());
    }

    #[test]
    fn test_wide_token_is_float_encoded() {
        // 1.0, 3.0, 255.0
        let flagged = decode_anomaly_mask("0x0", "0x3F800000");
        assert_eq!(flagged, vec![ChannelId::Temperature]);
        assert_eq!(
            decode_anomaly_mask("0x0", "0x40400000"),
            vec![ChannelId::Temperature, ChannelId::Humidity]
        );
        assert_eq!(decode_anomaly_mask("0x0", "0x437F0000").len(), 8);
    }

    #[test]
    fn test_float_rounding_and_clamping() {
        let strategy = FloatRoundingStrategy;
        // 2.5 rounds away from zero
        assert_eq!(strategy.warning_value("0x40200000"), Ok(3));
        // 1000.0
        assert_eq!(strategy.warning_value("0x447A0000"), Ok(255));
        // -4.0
        assert_eq!(strategy.warning_value("0xC0800000"), Ok(0));
        // +inf
        assert_eq!(strategy.warning_value("0x7F800000"), Ok(255));
        // raw 32-bit small integers are tiny denormals and round to zero
        assert_eq!(strategy.warning_value("0x00000010"), Ok(0));
    }

    #[test]
    fn test_reserved_field_is_ignored() {
        let decoder = AnomalyMaskDecoder::new();
        assert_eq!(decoder.decode("0xZZZZ", "0x05"), AnomalyMask(0b101));
        assert_eq!(decoder.strategy_version(), 2);
    }

    #[test]
    fn test_malformed_mask_degrades_to_zero() {
        let decoder = AnomalyMaskDecoder::new();
        assert!(decoder.decode("0x00", "0xG1").is_empty());
        assert!(decoder.decode("0x00", "0x").is_empty());
        assert!(decoder.decode("0x00", "0x7FC00000").is_empty());
        assert!(matches!(
            FloatRoundingStrategy.warning_value("0x7FC00000"),
            Err(MaskDecodeError::NotANumber(_))
        ));
    }

    #[test]
    fn test_mask_helpers() {
        let mask = AnomalyMask(0b0000_0101);
        assert!(mask.contains(ChannelId::Temperature));
        assert!(mask.contains(ChannelId::Gas));
        assert!(!mask.contains(ChannelId::Humidity));
        assert!(!AnomalyMask(0xFF).contains(ChannelId::SurfaceTemperature));
        assert_eq!(mask.bit_string(), "00000101");
    }

    #[test]
    fn test_severity_summary() {
        assert_eq!(AnomalyMask(0).severity(), Status::Normal);
        assert_eq!(AnomalyMask(0b0000_0011).severity(), Status::Warning);
        assert_eq!(AnomalyMask(0b0000_1111).severity(), Status::Critical);
        assert_eq!(AnomalyMask(0b1010_1010).severity(), Status::Critical);
    }

    struct RawByteStrategy;

    impl MaskDecodeStrategy for RawByteStrategy {
        fn version(&self) -> u8 {
            1
        }

        fn warning_value(&self, token: &str) -> Result<u8, MaskDecodeError> {
            Ok((parse_u32_bits(token)? & 0xFF) as u8)
        }
    }

    #[test]
    fn test_custom_strategy_plugs_in() {
        let decoder = AnomalyMaskDecoder::with_strategy(RawByteStrategy);
        assert_eq!(decoder.strategy_version(), 1);
        let mask = decoder.decode("0x0", "0x00000080");
        assert_eq!(mask.channels(), vec![ChannelId::Eco2]);
    }
}
