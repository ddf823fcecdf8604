//! Staff availability slots: validation, overlap detection and derived totals.

pub mod slot;
pub mod store;

pub use slot::{parse_day, AvailabilitySlot, SlotId, SlotSelector};
pub use store::{
    add_slot, busiest_day, remove_existing_slot, remove_slot, summarize, total_hours,
    total_minutes, AvailabilitySnapshot, AvailabilitySummary,
};

/// Slot validation failures, raised locally before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("malformed slot: {reason}")]
    Malformed { reason: String },
    #[error("slot {candidate} overlaps existing slot {conflicting}")]
    Overlap {
        candidate: Box<AvailabilitySlot>,
        conflicting: Box<AvailabilitySlot>,
    },
    #[error("no availability matches {0}")]
    NotFound(SlotSelector),
}

impl SlotError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        SlotError::Malformed {
            reason: reason.into(),
        }
    }
}
