// Frame pipeline - raw text in, channel updates out
use crate::application::channel_store::ChannelStore;
use crate::application::state_engine::apply_reading;
use crate::domain::anomaly::{AnomalyMask, AnomalyMaskDecoder};
use crate::domain::channel::ChannelUpdate;
use crate::domain::field::interpret_fields;
use crate::domain::frame::{FrameError, decode_frame};
use std::time::Instant;

/// Everything an accepted frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub updates: Vec<ChannelUpdate>,
    pub mask: AnomalyMask,
    pub field_errors: usize,
}

pub struct FramePipeline {
    mask_decoder: AnomalyMaskDecoder,
}

impl FramePipeline {
    pub fn new() -> Self {
        Self {
            mask_decoder: AnomalyMaskDecoder::new(),
        }
    }

    pub fn process(
        &self,
        store: &mut ChannelStore,
        raw: &str,
        now: Instant,
    ) -> Result<IngestReport, FrameError> {
        let frame = decode_frame(raw)?;
        let fields = interpret_fields(&frame);
        let mask = self
            .mask_decoder
            .decode(&fields.mask_field2, &fields.mask_field1);

        let updates = fields
            .readings
            .iter()
            .map(|(channel_id, value)| {
                apply_reading(store, *channel_id, *value, mask.contains(*channel_id), now)
            })
            .collect();

        tracing::debug!(
            "Frame accepted: mask={} ({} field errors)",
            mask.bit_string(),
            fields.issues.len()
        );

        Ok(IngestReport {
            updates,
            mask,
            field_errors: fields.issues.len(),
        })
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new()
    }
}

pub fn process_frame(
    store: &mut ChannelStore,
    raw: &str,
    now: Instant,
) -> Result<IngestReport, FrameError> {
    FramePipeline::new().process(store, raw, now)
}
