use std::fmt;

use serde::{Deserialize, Serialize};

/// Which request vocabulary a status string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Adoption,
    Foster,
}

impl RequestKind {
    pub const fn label(self) -> &'static str {
        match self {
            RequestKind::Adoption => "adoption",
            RequestKind::Foster => "foster",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of an adoption request as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionStatus {
    Pending,
    Approved,
    Ignored,
    Rejected,
    OnHold,
    Meeting,
    Finalized,
    Chat,
    AgreementSent,
    AgreementSigned,
    PaymentPending,
    PaymentCompleted,
    PaymentFailed,
}

impl AdoptionStatus {
    pub const ALL: [Self; 13] = [
        Self::Pending,
        Self::Approved,
        Self::Ignored,
        Self::Rejected,
        Self::OnHold,
        Self::Meeting,
        Self::Finalized,
        Self::Chat,
        Self::AgreementSent,
        Self::AgreementSigned,
        Self::PaymentPending,
        Self::PaymentCompleted,
        Self::PaymentFailed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Ignored => "ignored",
            Self::Rejected => "rejected",
            Self::OnHold => "on_hold",
            Self::Meeting => "meeting",
            Self::Finalized => "finalized",
            Self::Chat => "chat",
            Self::AgreementSent => "agreement_sent",
            Self::AgreementSigned => "agreement_signed",
            Self::PaymentPending => "payment_pending",
            Self::PaymentCompleted => "payment_completed",
            Self::PaymentFailed => "payment_failed",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Ignored => "Ignored",
            Self::Rejected => "Rejected",
            Self::OnHold => "On Hold",
            Self::Meeting => "Meeting",
            Self::Finalized => "Finalized",
            Self::Chat => "Chat",
            Self::AgreementSent => "Agreement Sent",
            Self::AgreementSigned => "Agreement Signed",
            Self::PaymentPending => "Payment Pending",
            Self::PaymentCompleted => "Payment Completed",
            Self::PaymentFailed => "Payment Failed",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Finalized | Self::Ignored | Self::Rejected | Self::PaymentFailed
        )
    }

    /// Statuses a staff or admin decision may move this status to.
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Ignored, Self::Rejected],
            Self::Approved => &[Self::Meeting],
            Self::Meeting => &[Self::Meeting, Self::Finalized],
            _ => &[],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl fmt::Display for AdoptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a foster request against a personal listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FosterStatus {
    Pending,
    InDiscussion,
    Approved,
    Rejected,
    MeetingScheduled,
}

impl FosterStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::InDiscussion,
        Self::Approved,
        Self::Rejected,
        Self::MeetingScheduled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InDiscussion => "in_discussion",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::MeetingScheduled => "meeting_scheduled",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending Review",
            Self::InDiscussion => "In Discussion",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::MeetingScheduled => "Meeting Scheduled",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Requests the listing owner still has to act on.
    pub const fn needs_review(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::InDiscussion | Self::MeetingScheduled
        )
    }

    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InDiscussion, Self::Approved, Self::Rejected],
            Self::InDiscussion => &[Self::Approved, Self::Rejected, Self::MeetingScheduled],
            _ => &[],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl fmt::Display for FosterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory transition check over raw wire statuses.
///
/// Unknown status strings never match, so callers can feed backend values
/// straight through without validating them first.
pub fn can_transition(kind: RequestKind, from: &str, to: &str) -> bool {
    match kind {
        RequestKind::Adoption => match (AdoptionStatus::from_wire(from), AdoptionStatus::from_wire(to)) {
            (Some(from), Some(to)) => from.can_transition_to(to),
            _ => false,
        },
        RequestKind::Foster => match (FosterStatus::from_wire(from), FosterStatus::from_wire(to)) {
            (Some(from), Some(to)) => from.can_transition_to(to),
            _ => false,
        },
    }
}
