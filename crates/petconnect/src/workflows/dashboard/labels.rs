use std::borrow::Cow;

use serde::Serialize;

use crate::workflows::requests::{AdoptionStatus, FosterStatus};

/// Which lookup table a raw status string is read against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDomain {
    Adoption,
    Foster,
    Listing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Yellow,
    Blue,
    Indigo,
    Green,
    Emerald,
    Red,
    Purple,
    Orange,
    Slate,
    Gray,
}

impl BadgeColor {
    pub const fn label(self) -> &'static str {
        match self {
            BadgeColor::Yellow => "yellow",
            BadgeColor::Blue => "blue",
            BadgeColor::Indigo => "indigo",
            BadgeColor::Green => "green",
            BadgeColor::Emerald => "emerald",
            BadgeColor::Red => "red",
            BadgeColor::Purple => "purple",
            BadgeColor::Orange => "orange",
            BadgeColor::Slate => "slate",
            BadgeColor::Gray => "gray",
        }
    }
}

pub const fn adoption_badge(status: AdoptionStatus) -> BadgeColor {
    match status {
        AdoptionStatus::Pending => BadgeColor::Yellow,
        AdoptionStatus::Approved => BadgeColor::Blue,
        AdoptionStatus::Meeting => BadgeColor::Indigo,
        AdoptionStatus::Finalized | AdoptionStatus::PaymentCompleted => BadgeColor::Green,
        AdoptionStatus::Ignored | AdoptionStatus::Rejected | AdoptionStatus::PaymentFailed => {
            BadgeColor::Red
        }
        AdoptionStatus::OnHold => BadgeColor::Slate,
        AdoptionStatus::Chat => BadgeColor::Purple,
        AdoptionStatus::AgreementSent | AdoptionStatus::AgreementSigned => BadgeColor::Emerald,
        AdoptionStatus::PaymentPending => BadgeColor::Orange,
    }
}

pub const fn foster_badge(status: FosterStatus) -> BadgeColor {
    match status {
        FosterStatus::Pending => BadgeColor::Yellow,
        FosterStatus::InDiscussion => BadgeColor::Blue,
        FosterStatus::Approved => BadgeColor::Green,
        FosterStatus::Rejected => BadgeColor::Red,
        FosterStatus::MeetingScheduled => BadgeColor::Purple,
    }
}

fn listing_entry(raw: &str) -> Option<(&'static str, BadgeColor)> {
    match raw {
        "available_fostering" | "available" => Some(("Available", BadgeColor::Green)),
        "pending_foster" | "pending" => Some(("Pending Review", BadgeColor::Yellow)),
        "fostered" => Some(("Fostered", BadgeColor::Blue)),
        "in treatment" | "in_treatment" => Some(("In Treatment", BadgeColor::Orange)),
        "adopted" => Some(("Adopted", BadgeColor::Emerald)),
        "unavailable" => Some(("Unavailable", BadgeColor::Gray)),
        _ => None,
    }
}

/// Human label for a raw status; unknown values are shown as-is.
pub fn status_label(domain: StatusDomain, raw: &str) -> Cow<'_, str> {
    let normalized = raw.trim().to_ascii_lowercase();
    let known = match domain {
        StatusDomain::Adoption => AdoptionStatus::from_wire(&normalized).map(AdoptionStatus::label),
        StatusDomain::Foster => FosterStatus::from_wire(&normalized).map(FosterStatus::label),
        StatusDomain::Listing => listing_entry(&normalized).map(|(label, _)| label),
    };

    match known {
        Some(label) => Cow::Borrowed(label),
        None if domain == StatusDomain::Listing && !raw.trim().is_empty() => {
            Cow::Owned(raw.trim().replace('_', " "))
        }
        None if raw.trim().is_empty() => Cow::Borrowed("Unknown"),
        None => Cow::Borrowed(raw),
    }
}

/// Badge color for a raw status; unknown values fall back to gray.
pub fn status_badge(domain: StatusDomain, raw: &str) -> BadgeColor {
    let normalized = raw.trim().to_ascii_lowercase();
    let known = match domain {
        StatusDomain::Adoption => AdoptionStatus::from_wire(&normalized).map(adoption_badge),
        StatusDomain::Foster => FosterStatus::from_wire(&normalized).map(foster_badge),
        StatusDomain::Listing => listing_entry(&normalized).map(|(_, color)| color),
    };
    known.unwrap_or(BadgeColor::Gray)
}

/// Label plus color, ready to serialize next to a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub status: String,
    pub label: String,
    pub color: BadgeColor,
}

impl StatusBadge {
    pub fn new(domain: StatusDomain, raw: &str) -> Self {
        Self {
            status: raw.to_string(),
            label: status_label(domain, raw).into_owned(),
            color: status_badge(domain, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_use_lookup_tables() {
        assert_eq!(status_label(StatusDomain::Foster, "in_discussion"), "In Discussion");
        assert_eq!(status_badge(StatusDomain::Foster, "meeting_scheduled"), BadgeColor::Purple);
        assert_eq!(status_badge(StatusDomain::Adoption, "ignored"), BadgeColor::Red);
        assert_eq!(status_label(StatusDomain::Adoption, "agreement_sent"), "Agreement Sent");
        assert_eq!(status_label(StatusDomain::Listing, "available_fostering"), "Available");
    }

    #[test]
    fn unknown_statuses_fall_back_to_gray() {
        assert_eq!(status_badge(StatusDomain::Adoption, "archived"), BadgeColor::Gray);
        assert_eq!(status_label(StatusDomain::Adoption, "archived"), "archived");
        assert_eq!(status_badge(StatusDomain::Listing, "on_loan"), BadgeColor::Gray);
        assert_eq!(status_label(StatusDomain::Listing, "on_loan"), "on loan");
        assert_eq!(status_label(StatusDomain::Foster, " "), "Unknown");
    }

    #[test]
    fn shelter_statuses_are_case_insensitive() {
        let badge = StatusBadge::new(StatusDomain::Listing, "In Treatment");
        assert_eq!(badge.label, "In Treatment");
        assert_eq!(badge.color, BadgeColor::Orange);
    }
}
