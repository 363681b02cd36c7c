// Field interpretation: raw 4-byte tokens to typed readings
use super::channel::ChannelId;
use super::frame::Frame;
use thiserror::Error;

/// Channels fed by interior fields 0..8, in wire order.
pub const MEASUREMENT_CHANNELS: [ChannelId; 8] = [
    ChannelId::Temperature,
    ChannelId::Humidity,
    ChannelId::Gas,
    ChannelId::AirQuality,
    ChannelId::No2,
    ChannelId::Co,
    ChannelId::Tvoc,
    ChannelId::Eco2,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldDecodeError {
    #[error("token {0:?} has no hex digits")]
    Empty(String),
    #[error("token {0:?} is not a 32-bit hex value")]
    InvalidHex(String),
    #[error("token {0:?} decodes to a non-finite float")]
    NonFinite(String),
}

/// Strip a leading `0x`/`0X`.
pub fn clean_hex(token: &str) -> &str {
    token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token)
}

/// Parse up to eight hex digits as the low-order bits of a `u32`.
pub fn parse_u32_bits(token: &str) -> Result<u32, FieldDecodeError> {
    let digits = clean_hex(token);
    if digits.is_empty() {
        return Err(FieldDecodeError::Empty(token.to_string()));
    }
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FieldDecodeError::InvalidHex(token.to_string()));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|_| FieldDecodeError::InvalidHex(token.to_string()))
}

/// Bit-cast a hex token to `f32`. The result may be NaN or infinite.
pub fn try_hex_to_f32(token: &str) -> Result<f32, FieldDecodeError> {
    parse_u32_bits(token).map(f32::from_bits)
}

/// Lenient variant: an unparsable token yields `0.0` and a warning.
pub fn hex_to_f32(token: &str) -> f32 {
    match try_hex_to_f32(token) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Field decode failed, substituting 0.0: {}", e);
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub index: usize,
    pub error: FieldDecodeError,
}

/// Typed content of one frame before it touches channel state.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFields {
    pub readings: [(ChannelId, f32); 8],
    pub mask_field2: String,
    pub mask_field1: String,
    pub issues: Vec<FieldIssue>,
}

pub fn interpret_fields(frame: &Frame) -> DecodedFields {
    let mut issues = Vec::new();

    let readings = std::array::from_fn(|index| {
        let channel = MEASUREMENT_CHANNELS[index];
        let token = &frame.fields[index];
        let value = match try_hex_to_f32(token) {
            Ok(value) if value.is_finite() => value,
            Ok(_) => {
                issues.push(FieldIssue {
                    index,
                    error: FieldDecodeError::NonFinite(token.clone()),
                });
                0.0
            }
            Err(error) => {
                issues.push(FieldIssue { index, error });
                0.0
            }
        };
        (channel, value)
    });

    for issue in &issues {
        tracing::warn!(
            "Field {} ({}) substituted with 0.0: {}",
            issue.index,
            MEASUREMENT_CHANNELS[issue.index],
            issue.error
        );
    }

    DecodedFields {
        readings,
        mask_field2: frame.mask_field2().to_string(),
        mask_field1: frame.mask_field1().to_string(),
        issues,
    }
}
