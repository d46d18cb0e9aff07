//! Classification of per-slot fetch outcomes.
//!
//! One fetch against one slot settles as a payload, an empty answer, or an
//! error. Classification turns that into a typed decision and never fails:
//! every outcome resolves to a usable slot value or an explicit
//! retry-candidate marker.

use chansync_types::{ChannelSlot, CommandError, FieldDefaults, RawChannelPayload, SlotIndex};

/// The typed decision for one per-slot fetch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotDecision {
    /// A payload arrived and normalized into a slot record. The empty
    /// answer ("no channel configured here") lands here too, as the
    /// default record - it is a legitimate outcome, not a retry.
    Accepted(ChannelSlot),
    /// A transient failure; eligible for another round while the retry
    /// budget lasts.
    Retry(SlotIndex),
    /// A permanent failure; the slot default-fills and the run continues.
    Failed(ChannelSlot),
}

impl SlotDecision {
    /// The slot value this decision settled on, if it settled.
    pub fn slot(&self) -> Option<&ChannelSlot> {
        match self {
            Self::Accepted(slot) | Self::Failed(slot) => Some(slot),
            Self::Retry(_) => None,
        }
    }

    /// The retry-candidate index, if this outcome is worth re-asking.
    pub fn retry_index(&self) -> Option<SlotIndex> {
        match self {
            Self::Retry(index) => Some(*index),
            _ => None,
        }
    }
}

/// Classify one fetch outcome for the given slot.
///
/// `Ok(Some(payload))` normalizes and is accepted. `Ok(None)` is the
/// device's way of saying "nothing configured at this index" and is
/// accepted as the default record. Transient errors become retry
/// candidates; everything else default-fills as a permanent failure.
pub fn classify(
    index: SlotIndex,
    outcome: Result<Option<RawChannelPayload>, CommandError>,
    defaults: FieldDefaults,
) -> SlotDecision {
    match outcome {
        Ok(Some(payload)) => SlotDecision::Accepted(ChannelSlot::from_raw(index, &payload, defaults)),
        Ok(None) => SlotDecision::Accepted(ChannelSlot::default_for(index)),
        Err(error) if error.is_transient() => SlotDecision::Retry(index),
        Err(_) => SlotDecision::Failed(ChannelSlot::default_for(index)),
    }
}
