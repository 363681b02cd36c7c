// Wire frame model and decoder
use thiserror::Error;

pub const START_MARKER: &str = "0xAA";
pub const END_MARKER: &str = "0x55";

/// Interior fields: eight measurements followed by mask field 2 and mask field 1.
pub const FIELD_COUNT: usize = 10;

const TOKEN_PREFIX: &str = "0x";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has {0} tokens, need at least start, one field and end")]
    TooShort(usize),
    #[error("frame does not start with 0xAA")]
    BadStartMarker,
    #[error("frame does not end with 0x55")]
    BadEndMarker,
    #[error("frame has {0} interior fields, expected 10")]
    IncompleteFields(usize),
}

/// One telemetry message with its markers validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub start_marker: String,
    pub end_marker: String,
    pub fields: [String; FIELD_COUNT],
}

impl Frame {
    pub fn measurement_tokens(&self) -> &[String] {
        &self.fields[..8]
    }

    pub fn mask_field2(&self) -> &str {
        &self.fields[8]
    }

    pub fn mask_field1(&self) -> &str {
        &self.fields[9]
    }

    /// Rejoin markers and fields into wire text.
    pub fn to_wire(&self) -> String {
        let mut out = String::with_capacity(2 + FIELD_COUNT * 10 + 4);
        out.push_str(&self.start_marker);
        for field in &self.fields {
            out.push_str(field);
        }
        out.push_str(&self.end_marker);
        out
    }
}

/// Split wire text on the `0x` delimiter and re-prefix every fragment.
pub fn tokenize(raw: &str) -> Vec<String> {
    raw.trim()
        .split(TOKEN_PREFIX)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| format!("{}{}", TOKEN_PREFIX, fragment))
        .collect()
}

pub fn decode_frame(raw: &str) -> Result<Frame, FrameError> {
    let tokens = tokenize(raw);

    if tokens.len() < 3 {
        return Err(FrameError::TooShort(tokens.len()));
    }

    let first = &tokens[0];
    let last = &tokens[tokens.len() - 1];
    let interior = &tokens[1..tokens.len() - 1];

    if !first.eq_ignore_ascii_case(START_MARKER) {
        return Err(FrameError::BadStartMarker);
    }
    if !last.eq_ignore_ascii_case(END_MARKER) {
        return Err(FrameError::BadEndMarker);
    }
    if interior.len() < FIELD_COUNT {
        return Err(FrameError::IncompleteFields(interior.len()));
    }

    // Tokens past the tenth are padding from newer firmware.
    let fields: [String; FIELD_COUNT] = std::array::from_fn(|i| interior[i].clone());

    Ok(Frame {
        start_marker: first.clone(),
        end_marker: last.clone(),
        fields,
    })
}
