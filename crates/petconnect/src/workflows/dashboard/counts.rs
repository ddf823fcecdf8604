use serde::{Deserialize, Serialize};

use crate::workflows::domain::UserId;
use crate::workflows::listings::Listing;
use crate::workflows::requests::{AdoptionRequest, AdoptionStatus, FosterRequest, FosterStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub needs_review: usize,
}

/// Ignored requests are closed without a decision, so they count as rejected.
pub fn adoption_counts(requests: &[AdoptionRequest]) -> RequestCounts {
    requests
        .iter()
        .fold(RequestCounts::default(), |mut counts, request| {
            counts.total += 1;
            match request.status {
                AdoptionStatus::Pending => {
                    counts.pending += 1;
                    counts.needs_review += 1;
                }
                AdoptionStatus::Approved => counts.approved += 1,
                AdoptionStatus::Rejected | AdoptionStatus::Ignored => counts.rejected += 1,
                _ => {}
            }
            counts
        })
}

pub fn foster_counts(requests: &[FosterRequest]) -> RequestCounts {
    requests
        .iter()
        .fold(RequestCounts::default(), |mut counts, request| {
            counts.total += 1;
            match request.status {
                FosterStatus::Pending => counts.pending += 1,
                FosterStatus::Approved => counts.approved += 1,
                FosterStatus::Rejected => counts.rejected += 1,
                FosterStatus::InDiscussion | FosterStatus::MeetingScheduled => {}
            }
            if request.status.needs_review() {
                counts.needs_review += 1;
            }
            counts
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FosterTab {
    /// Everything still awaiting the owner, discussions and meetings included.
    #[default]
    Pending,
    Approved,
    Rejected,
    All,
}

impl FosterTab {
    pub fn includes(self, status: FosterStatus) -> bool {
        match self {
            FosterTab::Pending => status.needs_review(),
            FosterTab::Approved => status == FosterStatus::Approved,
            FosterTab::Rejected => status == FosterStatus::Rejected,
            FosterTab::All => true,
        }
    }

    pub fn filter<'a>(self, requests: &'a [FosterRequest]) -> Vec<&'a FosterRequest> {
        requests
            .iter()
            .filter(|request| self.includes(request.status))
            .collect()
    }
}

/// Shelter pets first, then personal listings not posted by `viewer`.
pub fn browse_listings<'a>(
    shelter: &'a [Listing],
    personal: &'a [Listing],
    viewer: Option<&UserId>,
) -> Vec<&'a Listing> {
    let foreign = personal.iter().filter(move |listing| {
        match (listing.poster.owner_id(), viewer) {
            (Some(owner), Some(viewer)) => owner != viewer,
            _ => true,
        }
    });
    shelter.iter().chain(foreign).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub total: usize,
    pub available: usize,
    pub pending_requests: usize,
    pub currently_fostered: usize,
}

pub fn listing_stats(listings: &[Listing]) -> ListingStats {
    listings
        .iter()
        .fold(ListingStats::default(), |mut stats, listing| {
            stats.total += 1;
            match listing.status_key().as_str() {
                "available_fostering" => stats.available += 1,
                "fostered" => stats.currently_fostered += 1,
                _ => {}
            }
            stats.pending_requests += listing.pending_foster_requests();
            stats
        })
}

pub fn listings_with_pending_requests(listings: &[Listing]) -> Vec<&Listing> {
    listings
        .iter()
        .filter(|listing| listing.pending_foster_requests() > 0)
        .collect()
}

/// Headline status shown on the adopter dashboard.
pub fn adopter_display_status(override_status: Option<&str>, requests: &[AdoptionRequest]) -> String {
    if let Some(status) = override_status.map(str::trim).filter(|status| !status.is_empty()) {
        return status.to_string();
    }

    let any = |status: AdoptionStatus| requests.iter().any(|request| request.status == status);
    let label = if any(AdoptionStatus::Approved) {
        "Approved \u{2014} next steps"
    } else if any(AdoptionStatus::Meeting) {
        "Meeting scheduled"
    } else if !requests.is_empty() {
        "In progress"
    } else {
        "Active"
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::domain::{PetId, UserRef};
    use crate::workflows::listings::{OrganizationRef, Poster};

    fn foster(id: &str, status: FosterStatus) -> FosterRequest {
        FosterRequest::new(id, status)
    }

    fn listing(id: &str, poster: Poster, status: &str) -> Listing {
        Listing {
            id: PetId(id.to_string()),
            name: Some(format!("pet {id}")),
            breed: None,
            age: None,
            gender: None,
            status: Some(status.to_string()),
            images: Vec::new(),
            poster,
            trainer: None,
            vet: None,
            foster_requests: Vec::new(),
        }
    }

    fn owned_by(owner: &str) -> Poster {
        Poster::Owner(UserRef::Id(UserId(owner.to_string())))
    }

    #[test]
    fn needs_review_counts_open_foster_requests_only() {
        let statuses = [
            FosterStatus::Pending,
            FosterStatus::InDiscussion,
            FosterStatus::MeetingScheduled,
            FosterStatus::Approved,
            FosterStatus::Rejected,
            FosterStatus::Pending,
        ];
        let requests: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(idx, status)| foster(&format!("f-{idx}"), *status))
            .collect();

        let counts = foster_counts(&requests);
        assert_eq!(counts.total, 6);
        assert_eq!(counts.needs_review, 4);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.rejected, 1);
    }

    #[test]
    fn needs_review_never_includes_closed_statuses() {
        let closed = vec![
            foster("a", FosterStatus::Approved),
            foster("b", FosterStatus::Rejected),
        ];
        assert_eq!(foster_counts(&closed).needs_review, 0);

        let adoptions = vec![
            AdoptionRequest::new("1", AdoptionStatus::Approved),
            AdoptionRequest::new("2", AdoptionStatus::Finalized),
            AdoptionRequest::new("3", AdoptionStatus::Rejected),
            AdoptionRequest::new("4", AdoptionStatus::Ignored),
            AdoptionRequest::new("5", AdoptionStatus::Pending),
        ];
        let counts = adoption_counts(&adoptions);
        assert_eq!(counts.needs_review, 1);
        assert_eq!(counts.rejected, 2);
        assert_eq!(counts.approved, 1);
    }

    #[test]
    fn pending_tab_groups_everything_awaiting_the_owner() {
        let requests = vec![
            foster("a", FosterStatus::Pending),
            foster("b", FosterStatus::Approved),
            foster("c", FosterStatus::MeetingScheduled),
        ];
        let pending: Vec<_> = FosterTab::Pending
            .filter(&requests)
            .into_iter()
            .map(|request| request.id.0.as_str())
            .collect();
        assert_eq!(pending, vec!["a", "c"]);
        assert_eq!(FosterTab::All.filter(&requests).len(), 3);
        assert_eq!(FosterTab::Approved.filter(&requests).len(), 1);
    }

    #[test]
    fn browse_hides_the_viewers_own_listings() {
        let shelter = vec![listing(
            "s-1",
            Poster::Organization(OrganizationRef::Id("org-1".into())),
            "Available",
        )];
        let personal = vec![
            listing("p-1", owned_by("me"), "available_fostering"),
            listing("p-2", owned_by("neighbour"), "available_fostering"),
        ];
        let viewer = UserId("me".into());

        let ids: Vec<_> = browse_listings(&shelter, &personal, Some(&viewer))
            .into_iter()
            .map(|listing| listing.id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["s-1", "p-2"]);
        assert_eq!(browse_listings(&shelter, &personal, None).len(), 3);
    }

    #[test]
    fn listing_stats_tally_statuses_and_pending_requests() {
        let mut with_requests = listing("p-1", owned_by("me"), "available_fostering");
        with_requests.foster_requests = vec![
            foster("a", FosterStatus::Pending),
            foster("b", FosterStatus::Pending),
            foster("c", FosterStatus::Rejected),
        ];
        let listings = vec![
            with_requests,
            listing("p-2", owned_by("me"), "fostered"),
            listing("p-3", owned_by("me"), "Available_Fostering"),
        ];

        let stats = listing_stats(&listings);
        assert_eq!(
            stats,
            ListingStats {
                total: 3,
                available: 2,
                pending_requests: 2,
                currently_fostered: 1,
            }
        );
        assert_eq!(listings_with_pending_requests(&listings).len(), 1);
    }

    #[test]
    fn adopter_status_prefers_override_then_progress() {
        let approved = vec![
            AdoptionRequest::new("1", AdoptionStatus::Meeting),
            AdoptionRequest::new("2", AdoptionStatus::Approved),
        ];
        assert_eq!(adopter_display_status(Some("Verified"), &approved), "Verified");
        assert_eq!(adopter_display_status(Some("  "), &approved), "Approved \u{2014} next steps");
        assert_eq!(
            adopter_display_status(None, &approved[..1]),
            "Meeting scheduled"
        );
        assert_eq!(
            adopter_display_status(None, &[AdoptionRequest::new("3", AdoptionStatus::Pending)]),
            "In progress"
        );
        assert_eq!(adopter_display_status(None, &[]), "Active");
    }
}
