//! Pairs adoption requests with concrete meeting times and checks them against staff availability.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use serde::Serialize;

use super::availability::AvailabilitySlot;
use super::requests::lifecycle::parse_meeting_time_with;
use super::requests::{AdoptionPatch, AdoptionRequest, LifecycleError, RequestLifecycle, Transition};

/// Whether any availability slot covers a proposed meeting.
///
/// Coverage is advisory: an uncovered meeting is still proposed and the
/// caller decides whether to override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "coverage", rename_all = "snake_case")]
pub enum AvailabilityCoverage {
    Covered { slot: AvailabilitySlot },
    Uncovered { warning: String },
}

impl AvailabilityCoverage {
    pub fn is_covered(&self) -> bool {
        matches!(self, AvailabilityCoverage::Covered { .. })
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            AvailabilityCoverage::Covered { .. } => None,
            AvailabilityCoverage::Uncovered { warning } => Some(warning.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetingProposal {
    pub transition: Transition<AdoptionRequest, AdoptionPatch>,
    pub coverage: AvailabilityCoverage,
}

#[derive(Debug, Clone, Copy)]
pub struct MeetingScheduler {
    lifecycle: RequestLifecycle,
    offset: FixedOffset,
}

impl Default for MeetingScheduler {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl MeetingScheduler {
    /// `offset` is the shelter's local offset; slot days and times are read in it.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            lifecycle: RequestLifecycle::new(),
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Parse a candidate meeting time; naive input is read in the shelter's offset.
    pub fn parse_candidate(&self, raw: &str) -> Result<DateTime<Utc>, LifecycleError> {
        let offset = self.offset;
        parse_meeting_time_with(raw, move |naive: NaiveDateTime| {
            match offset.from_local_datetime(&naive) {
                LocalResult::Single(local) | LocalResult::Ambiguous(local, _) => {
                    local.with_timezone(&Utc)
                }
                LocalResult::None => naive.and_utc(),
            }
        })
    }

    pub fn coverage(
        &self,
        at: DateTime<Utc>,
        availability: &[AvailabilitySlot],
    ) -> AvailabilityCoverage {
        let local = at.with_timezone(&self.offset);
        let (date, time) = (local.date_naive(), local.time());

        match availability.iter().find(|slot| slot.covers(date, time)) {
            Some(slot) => AvailabilityCoverage::Covered { slot: slot.clone() },
            None => AvailabilityCoverage::Uncovered {
                warning: format!(
                    "no availability covers {}",
                    local.format("%A %Y-%m-%d %H:%M")
                ),
            },
        }
    }

    /// Validate the candidate and compute the `meeting` transition.
    pub fn propose_meeting(
        &self,
        request: &AdoptionRequest,
        candidate: &str,
        availability: &[AvailabilitySlot],
        now: DateTime<Utc>,
    ) -> Result<MeetingProposal, LifecycleError> {
        let at = self.parse_candidate(candidate)?;
        let transition = self.lifecycle.request_meeting_at(request, at, now)?;
        let coverage = self.coverage(at, availability);

        Ok(MeetingProposal {
            transition,
            coverage,
        })
    }
}
