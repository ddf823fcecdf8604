use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AdoptionRequest, FosterRequest, MeetingInfo, MeetingStatus};
use super::status::{AdoptionStatus, FosterStatus, RequestKind};

/// Result of asking the lifecycle to move a request.
///
/// `Unchanged` means the request already holds the target status; the backend
/// owns the authoritative state, so repeating a decision is reported rather than
/// treated as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<R, P> {
    Applied { request: R, patch: P },
    Unchanged { request: R },
}

impl<R, P> Transition<R, P> {
    pub fn request(&self) -> &R {
        match self {
            Transition::Applied { request, .. } | Transition::Unchanged { request } => request,
        }
    }

    pub fn into_request(self) -> R {
        match self {
            Transition::Applied { request, .. } | Transition::Unchanged { request } => request,
        }
    }

    pub fn patch(&self) -> Option<&P> {
        match self {
            Transition::Applied { patch, .. } => Some(patch),
            Transition::Unchanged { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// Body of `PATCH /adoptions/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionPatch {
    pub status: AdoptionStatus,
    #[serde(rename = "meetingDate", default, skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<DateTime<Utc>>,
}

/// Owner-side actions on a foster request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FosterAction {
    Approve,
    Reject,
    StartDiscussion,
    ScheduleMeeting,
}

impl FosterAction {
    pub const fn target(self) -> FosterStatus {
        match self {
            FosterAction::Approve => FosterStatus::Approved,
            FosterAction::Reject => FosterStatus::Rejected,
            FosterAction::StartDiscussion => FosterStatus::InDiscussion,
            FosterAction::ScheduleMeeting => FosterStatus::MeetingScheduled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingTimeProblem {
    Unparseable,
    NotInFuture,
}

impl fmt::Display for MeetingTimeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingTimeProblem::Unparseable => f.write_str("expected an ISO timestamp or YYYY-MM-DDTHH:MM"),
            MeetingTimeProblem::NotInFuture => f.write_str("meeting must be scheduled in the future"),
        }
    }
}

/// Validation errors raised before any mutation reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot move {kind} request from {from} to {to}")]
    InvalidTransition {
        kind: RequestKind,
        from: &'static str,
        to: &'static str,
    },
    #[error("invalid meeting time '{raw}': {problem}")]
    InvalidMeetingTime {
        raw: String,
        problem: MeetingTimeProblem,
    },
}

const NAIVE_MEETING_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parse a meeting timestamp without judging whether it is in the future.
///
/// Offsets in RFC 3339 input are honored; naive input is read as UTC.
pub fn parse_meeting_time(raw: &str) -> Result<DateTime<Utc>, LifecycleError> {
    parse_meeting_time_with(raw, |naive| naive.and_utc())
}

pub(crate) fn parse_meeting_time_with<F>(raw: &str, localize: F) -> Result<DateTime<Utc>, LifecycleError>
where
    F: Fn(NaiveDateTime) -> DateTime<Utc>,
{
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_MEETING_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(localize)
        .ok_or_else(|| LifecycleError::InvalidMeetingTime {
            raw: raw.to_string(),
            problem: MeetingTimeProblem::Unparseable,
        })
}

/// Stateless rules engine for staff, admin and owner decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLifecycle;

impl RequestLifecycle {
    pub fn new() -> Self {
        Self
    }

    pub fn approve(
        &self,
        request: &AdoptionRequest,
    ) -> Result<Transition<AdoptionRequest, AdoptionPatch>, LifecycleError> {
        advance_adoption(request, AdoptionStatus::Approved)
    }

    pub fn ignore(
        &self,
        request: &AdoptionRequest,
    ) -> Result<Transition<AdoptionRequest, AdoptionPatch>, LifecycleError> {
        advance_adoption(request, AdoptionStatus::Ignored)
    }

    pub fn reject(
        &self,
        request: &AdoptionRequest,
    ) -> Result<Transition<AdoptionRequest, AdoptionPatch>, LifecycleError> {
        advance_adoption(request, AdoptionStatus::Rejected)
    }

    pub fn finalize(
        &self,
        request: &AdoptionRequest,
    ) -> Result<Transition<AdoptionRequest, AdoptionPatch>, LifecycleError> {
        advance_adoption(request, AdoptionStatus::Finalized)
    }

    /// Move an approved request into `meeting`, attaching the proposed date.
    pub fn request_meeting(
        &self,
        request: &AdoptionRequest,
        raw_meeting_time: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition<AdoptionRequest, AdoptionPatch>, LifecycleError> {
        let at = parse_meeting_time(raw_meeting_time)?;
        self.request_meeting_at(request, at, now)
    }

    pub fn request_meeting_at(
        &self,
        request: &AdoptionRequest,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Transition<AdoptionRequest, AdoptionPatch>, LifecycleError> {
        if !request.status.can_transition_to(AdoptionStatus::Meeting) {
            return Err(invalid_adoption(request.status, AdoptionStatus::Meeting));
        }

        if at <= now {
            return Err(LifecycleError::InvalidMeetingTime {
                raw: at.to_rfc3339(),
                problem: MeetingTimeProblem::NotInFuture,
            });
        }

        if request.status == AdoptionStatus::Meeting && request.meeting_date() == Some(at) {
            return Ok(Transition::Unchanged {
                request: request.clone(),
            });
        }

        let previous = request.meeting.clone().unwrap_or_default();
        let mut updated = request.clone();
        updated.status = AdoptionStatus::Meeting;
        updated.meeting = Some(MeetingInfo {
            date: Some(at),
            confirmed: false,
            status: Some(MeetingStatus::Scheduled),
            ..previous
        });

        Ok(Transition::Applied {
            request: updated,
            patch: AdoptionPatch {
                status: AdoptionStatus::Meeting,
                meeting_date: Some(at),
            },
        })
    }

    pub fn approve_foster(
        &self,
        request: &FosterRequest,
    ) -> Result<Transition<FosterRequest, FosterAction>, LifecycleError> {
        advance_foster(request, FosterAction::Approve)
    }

    pub fn reject_foster(
        &self,
        request: &FosterRequest,
    ) -> Result<Transition<FosterRequest, FosterAction>, LifecycleError> {
        advance_foster(request, FosterAction::Reject)
    }

    pub fn start_foster_discussion(
        &self,
        request: &FosterRequest,
    ) -> Result<Transition<FosterRequest, FosterAction>, LifecycleError> {
        advance_foster(request, FosterAction::StartDiscussion)
    }

    pub fn schedule_foster_meeting(
        &self,
        request: &FosterRequest,
    ) -> Result<Transition<FosterRequest, FosterAction>, LifecycleError> {
        advance_foster(request, FosterAction::ScheduleMeeting)
    }

    pub fn apply_foster(
        &self,
        request: &FosterRequest,
        action: FosterAction,
    ) -> Result<Transition<FosterRequest, FosterAction>, LifecycleError> {
        advance_foster(request, action)
    }
}

fn advance_adoption(
    request: &AdoptionRequest,
    target: AdoptionStatus,
) -> Result<Transition<AdoptionRequest, AdoptionPatch>, LifecycleError> {
    if request.status == target {
        return Ok(Transition::Unchanged {
            request: request.clone(),
        });
    }

    if !request.status.can_transition_to(target) {
        return Err(invalid_adoption(request.status, target));
    }

    let mut updated = request.clone();
    updated.status = target;

    Ok(Transition::Applied {
        request: updated,
        patch: AdoptionPatch {
            status: target,
            meeting_date: None,
        },
    })
}

fn advance_foster(
    request: &FosterRequest,
    action: FosterAction,
) -> Result<Transition<FosterRequest, FosterAction>, LifecycleError> {
    let target = action.target();
    if request.status == target {
        return Ok(Transition::Unchanged {
            request: request.clone(),
        });
    }

    if !request.status.can_transition_to(target) {
        return Err(LifecycleError::InvalidTransition {
            kind: RequestKind::Foster,
            from: request.status.as_str(),
            to: target.as_str(),
        });
    }

    let mut updated = request.clone();
    updated.status = target;

    Ok(Transition::Applied {
        request: updated,
        patch: action,
    })
}

fn invalid_adoption(from: AdoptionStatus, to: AdoptionStatus) -> LifecycleError {
    LifecycleError::InvalidTransition {
        kind: RequestKind::Adoption,
        from: from.as_str(),
        to: to.as_str(),
    }
}
