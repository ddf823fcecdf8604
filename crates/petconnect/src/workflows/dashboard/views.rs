use chrono::{DateTime, Utc};
use serde::Serialize;

use super::counts::{
    adopter_display_status, adoption_counts, browse_listings, foster_counts, listing_stats,
    FosterTab, ListingStats, RequestCounts,
};
use super::labels::{StatusBadge, StatusDomain};
use crate::workflows::availability::{AvailabilitySlot, AvailabilitySnapshot, AvailabilitySummary};
use crate::workflows::domain::{PetId, RequestId, UserProfile, UserRole};
use crate::workflows::listings::{primary_image, Listing};
use crate::workflows::requests::{AdoptionRequest, FosterRequest, PetRef};

#[derive(Debug, Clone, Serialize)]
pub struct AdoptionRequestView {
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<PetId>,
    pub pet_name: String,
    pub pet_image: String,
    pub adopter_name: String,
    pub status: StatusBadge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<DateTime<Utc>>,
    pub meeting_confirmed: bool,
}

impl AdoptionRequestView {
    pub fn from_request(request: &AdoptionRequest) -> Self {
        let pet_image = match &request.pet {
            Some(PetRef::Summary(summary)) => primary_image(&summary.images),
            _ => primary_image(&[]),
        };

        Self {
            id: request.id.clone(),
            pet_id: request.pet.as_ref().map(|pet| pet.id().clone()),
            pet_name: request
                .pet
                .as_ref()
                .and_then(PetRef::name)
                .unwrap_or("Pet")
                .to_string(),
            pet_image: pet_image.to_string(),
            adopter_name: request
                .adopter
                .as_ref()
                .and_then(|adopter| adopter.name())
                .unwrap_or("Unknown adopter")
                .to_string(),
            status: StatusBadge::new(StatusDomain::Adoption, request.status.as_str()),
            meeting_date: request.meeting_date(),
            meeting_confirmed: request.meeting.as_ref().is_some_and(|meeting| meeting.confirmed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FosterRequestView {
    pub id: RequestId,
    pub pet_id: PetId,
    pub pet_name: String,
    pub requester_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: StatusBadge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_thread: Option<String>,
}

impl FosterRequestView {
    pub fn from_request(listing: &Listing, request: &FosterRequest) -> Self {
        Self {
            id: request.id.clone(),
            pet_id: listing.id.clone(),
            pet_name: listing.display_name().to_string(),
            requester_name: request
                .user
                .as_ref()
                .and_then(|user| user.name())
                .unwrap_or("Unknown user")
                .to_string(),
            message: request.message.clone(),
            status: StatusBadge::new(StatusDomain::Foster, request.status.as_str()),
            submitted_at: request.submitted_at,
            chat_thread: request.chat_thread.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingCard {
    pub id: PetId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    pub image: String,
    pub status: StatusBadge,
    pub personal: bool,
    pub pending_requests: usize,
}

impl ListingCard {
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            id: listing.id.clone(),
            name: listing.display_name().to_string(),
            breed: listing.breed.clone(),
            image: listing.primary_image().to_string(),
            status: StatusBadge::new(
                StatusDomain::Listing,
                listing.status.as_deref().unwrap_or_default(),
            ),
            personal: listing.poster.is_personal(),
            pending_requests: listing.pending_foster_requests(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityView {
    pub slots: Vec<AvailabilitySlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub summary: AvailabilitySummary,
}

impl AvailabilityView {
    pub fn from_snapshot(snapshot: &AvailabilitySnapshot) -> Self {
        Self {
            slots: snapshot.slots.clone(),
            revision: snapshot.revision.clone(),
            summary: snapshot.summary(),
        }
    }
}

/// Everything the staff dashboard renders, recomputed from the fetched collections.
#[derive(Debug, Clone, Serialize)]
pub struct StaffDashboard {
    pub staff_name: String,
    pub role: UserRole,
    pub role_label: &'static str,
    pub request_counts: RequestCounts,
    pub requests: Vec<AdoptionRequestView>,
    pub pets: Vec<ListingCard>,
    pub availability: AvailabilityView,
}

impl StaffDashboard {
    pub fn project(
        staff: &UserProfile,
        requests: &[AdoptionRequest],
        pets: &[Listing],
        availability: &AvailabilitySnapshot,
    ) -> Self {
        Self {
            staff_name: staff.name.clone().unwrap_or_else(|| staff.email.clone()),
            role: staff.role,
            role_label: staff.role.label(),
            request_counts: adoption_counts(requests),
            requests: requests.iter().map(AdoptionRequestView::from_request).collect(),
            pets: pets.iter().map(ListingCard::from_listing).collect(),
            availability: AvailabilityView::from_snapshot(availability),
        }
    }
}

/// Collections the adopter dashboard is projected from.
#[derive(Debug, Clone, Copy)]
pub struct AdopterSources<'a> {
    pub requests: &'a [AdoptionRequest],
    pub shelter_pets: &'a [Listing],
    pub personal_listings: &'a [Listing],
    pub my_listings: &'a [Listing],
}

#[derive(Debug, Clone, Serialize)]
pub struct AdopterDashboard {
    pub display_name: String,
    pub display_status: String,
    pub profile_incomplete: bool,
    pub request_counts: RequestCounts,
    pub requests: Vec<AdoptionRequestView>,
    pub browse: Vec<ListingCard>,
    pub my_listings: Vec<ListingCard>,
    pub listing_stats: ListingStats,
    pub foster_tab: FosterTab,
    pub foster_counts: RequestCounts,
    pub foster_requests: Vec<FosterRequestView>,
}

impl AdopterDashboard {
    pub fn project(adopter: &UserProfile, sources: AdopterSources<'_>, tab: FosterTab) -> Self {
        let received: Vec<FosterRequest> = sources
            .my_listings
            .iter()
            .flat_map(|listing| listing.foster_requests.iter().cloned())
            .collect();

        let foster_requests = sources
            .my_listings
            .iter()
            .flat_map(|listing| {
                listing
                    .foster_requests
                    .iter()
                    .filter(move |request| tab.includes(request.status))
                    .map(move |request| FosterRequestView::from_request(listing, request))
            })
            .collect();

        Self {
            display_name: adopter.name.clone().unwrap_or_else(|| adopter.email.clone()),
            display_status: adopter_display_status(
                adopter.adoption_status.as_deref(),
                sources.requests,
            ),
            profile_incomplete: adopter.is_incomplete(),
            request_counts: adoption_counts(sources.requests),
            requests: sources
                .requests
                .iter()
                .map(AdoptionRequestView::from_request)
                .collect(),
            browse: browse_listings(
                sources.shelter_pets,
                sources.personal_listings,
                Some(&adopter.id),
            )
            .into_iter()
            .map(ListingCard::from_listing)
            .collect(),
            my_listings: sources.my_listings.iter().map(ListingCard::from_listing).collect(),
            listing_stats: listing_stats(sources.my_listings),
            foster_tab: tab,
            foster_counts: foster_counts(&received),
            foster_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::domain::{UserId, UserRef, UserSummary};
    use crate::workflows::listings::{ImageRef, OrganizationRef, Poster, PLACEHOLDER_IMAGE};
    use crate::workflows::requests::{AdoptionStatus, FosterStatus, PetSummary};
    use chrono::{NaiveTime, Weekday};

    fn profile(id: &str, role: UserRole) -> UserProfile {
        UserProfile {
            id: UserId(id.to_string()),
            email: format!("{id}@example.org"),
            role,
            name: Some(format!("User {id}")),
            location: Some("Springfield".to_string()),
            adoption_status: None,
        }
    }

    fn listing(id: &str, poster: Poster) -> Listing {
        Listing {
            id: PetId(id.to_string()),
            name: Some(format!("Pet {id}")),
            breed: Some("Beagle".to_string()),
            age: Some(2.0),
            gender: None,
            status: Some("available_fostering".to_string()),
            images: vec![ImageRef::Url(format!("/img/{id}.jpg"))],
            poster,
            trainer: None,
            vet: None,
            foster_requests: Vec::new(),
        }
    }

    #[test]
    fn staff_dashboard_projects_requests_and_availability() {
        let staff = profile("staff-1", UserRole::Staff);
        let mut request = AdoptionRequest::new("req-1", AdoptionStatus::Pending);
        request.pet = Some(PetRef::Summary(PetSummary {
            id: PetId("pet-1".into()),
            name: Some("Biscuit".into()),
            breed: None,
            status: None,
            images: Vec::new(),
        }));
        request.adopter = Some(UserRef::Summary(UserSummary {
            id: Some(UserId("u-1".into())),
            name: Some("Dana".into()),
            email: None,
            location: None,
        }));
        let pets = vec![listing(
            "pet-1",
            Poster::Organization(OrganizationRef::Id("org".into())),
        )];
        let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("valid");
        let noon = NaiveTime::from_hms_opt(12, 0, 0).expect("valid");
        let availability = AvailabilitySnapshot::new(
            vec![AvailabilitySlot::weekly(Weekday::Wed, nine, noon)],
            Some("rev-1".into()),
        );

        let dashboard = StaffDashboard::project(&staff, &[request], &pets, &availability);
        assert_eq!(dashboard.request_counts.needs_review, 1);
        assert_eq!(dashboard.requests[0].pet_name, "Biscuit");
        assert_eq!(dashboard.requests[0].adopter_name, "Dana");
        assert_eq!(dashboard.requests[0].pet_image, PLACEHOLDER_IMAGE);
        assert_eq!(dashboard.requests[0].status.label, "Pending");
        assert_eq!(dashboard.availability.summary.total_minutes, 180);
        assert_eq!(dashboard.pets[0].image, "/img/pet-1.jpg");
    }

    #[test]
    fn adopter_dashboard_filters_foster_requests_by_tab() {
        let adopter = profile("me", UserRole::Adopter);
        let mut mine = listing("p-1", Poster::Owner(UserRef::Id(UserId("me".into()))));
        mine.foster_requests = vec![
            FosterRequest::new("f-1", FosterStatus::Pending),
            FosterRequest::new("f-2", FosterStatus::Approved),
            FosterRequest::new("f-3", FosterStatus::InDiscussion),
        ];
        let my_listings = vec![mine.clone()];
        let personal = vec![
            mine,
            listing("p-2", Poster::Owner(UserRef::Id(UserId("other".into())))),
        ];
        let requests = vec![AdoptionRequest::new("req-1", AdoptionStatus::Meeting)];

        let dashboard = AdopterDashboard::project(
            &adopter,
            AdopterSources {
                requests: &requests,
                shelter_pets: &[],
                personal_listings: &personal,
                my_listings: &my_listings,
            },
            FosterTab::Pending,
        );

        assert_eq!(dashboard.display_status, "Meeting scheduled");
        assert_eq!(dashboard.browse.len(), 1);
        assert_eq!(dashboard.browse[0].id, PetId("p-2".into()));
        assert_eq!(dashboard.foster_counts.needs_review, 2);
        let shown: Vec<_> = dashboard
            .foster_requests
            .iter()
            .map(|view| view.id.0.as_str())
            .collect();
        assert_eq!(shown, vec!["f-1", "f-3"]);
        assert_eq!(dashboard.listing_stats.pending_requests, 1);
        assert!(!dashboard.profile_incomplete);
    }
}
