use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, NaiveTime, TimeZone, Utc, Weekday};
use serde_json::Value;

use crate::backend::{MemoryBackend, Session};
use crate::workflows::availability::AvailabilitySlot;
use crate::workflows::domain::{PetId, UserId, UserProfile, UserRef, UserRole, UserSummary};
use crate::workflows::listings::{ImageRef, Listing, OrganizationRef, Poster};
use crate::workflows::requests::{AdoptionRequest, AdoptionStatus, FosterRequest, FosterStatus, PetRef, PetSummary};
use crate::workflows::scheduling::MeetingScheduler;
use crate::workflows::coordination::{application_router, CoordinationService};

pub(super) const STAFF_TOKEN: &str = "staff-token";
pub(super) const ADOPTER_TOKEN: &str = "adopter-token";
pub(super) const OWNER_TOKEN: &str = "owner-token";

/// Saturday 2025-11-01 08:00 UTC.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 1, 8, 0, 0)
        .single()
        .expect("valid now")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn profile(id: &str, role: UserRole) -> UserProfile {
    UserProfile {
        id: UserId(id.to_string()),
        email: format!("{id}@petconnect.test"),
        role,
        name: Some(format!("{} {id}", role.label())),
        location: Some("Austin".to_string()),
        adoption_status: None,
    }
}

pub(super) fn adoption(id: &str, status: AdoptionStatus, adopter: &str) -> AdoptionRequest {
    let mut request = AdoptionRequest::new(id, status);
    request.pet = Some(PetRef::Summary(PetSummary {
        id: PetId(format!("pet-{id}")),
        name: Some("Biscuit".to_string()),
        breed: Some("Beagle".to_string()),
        status: Some("Available".to_string()),
        images: Vec::new(),
    }));
    request.adopter = Some(UserRef::Summary(UserSummary {
        id: Some(UserId(adopter.to_string())),
        name: Some("Dana".to_string()),
        email: None,
        location: None,
    }));
    request
}

pub(super) fn shelter_pet(id: &str) -> Listing {
    Listing {
        id: PetId(id.to_string()),
        name: Some("Mochi".to_string()),
        breed: Some("Tabby".to_string()),
        age: Some(3.0),
        gender: Some("female".to_string()),
        status: Some("Available".to_string()),
        images: vec![ImageRef::Object {
            url: Some(format!("/img/{id}.jpg")),
            is_primary: true,
        }],
        poster: Poster::Organization(OrganizationRef::Id("org-1".to_string())),
        trainer: None,
        vet: None,
        foster_requests: Vec::new(),
    }
}

pub(super) fn personal_listing(id: &str, owner: &str, requests: Vec<FosterRequest>) -> Listing {
    Listing {
        id: PetId(id.to_string()),
        name: Some("Pepper".to_string()),
        breed: None,
        age: None,
        gender: None,
        status: Some("available_fostering".to_string()),
        images: Vec::new(),
        poster: Poster::Owner(UserRef::Id(UserId(owner.to_string()))),
        trainer: None,
        vet: None,
        foster_requests: requests,
    }
}

pub(super) fn staff_slots() -> Vec<AvailabilitySlot> {
    vec![AvailabilitySlot::weekly(Weekday::Mon, time(9, 0), time(17, 0)).with_id("slot-mon")]
}

pub(super) fn seeded_backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_user(STAFF_TOKEN, profile("staff-1", UserRole::Staff))
        .with_user(ADOPTER_TOKEN, profile("adopter-1", UserRole::Adopter))
        .with_user(OWNER_TOKEN, profile("owner-1", UserRole::Adopter))
        .with_adoption_request(adoption("req-pending", AdoptionStatus::Pending, "adopter-1"))
        .with_adoption_request(adoption("req-approved", AdoptionStatus::Approved, "adopter-1"))
        .with_adoption_request(adoption("req-other", AdoptionStatus::Pending, "adopter-2"))
        .with_shelter_pet(shelter_pet("pet-shelter"))
        .with_personal_listing(personal_listing(
            "pet-owned",
            "owner-1",
            vec![
                FosterRequest::new("foster-pending", FosterStatus::Pending),
                FosterRequest::new("foster-talking", FosterStatus::InDiscussion),
            ],
        ))
        .with_personal_listing(personal_listing("pet-adopters", "adopter-1", Vec::new()))
        .with_availability(UserId("staff-1".to_string()), staff_slots())
}

pub(super) fn build_service() -> (Arc<CoordinationService<MemoryBackend>>, Arc<MemoryBackend>) {
    let backend = Arc::new(seeded_backend());
    let service = CoordinationService::new(backend.clone(), MeetingScheduler::default()).with_clock(now);
    (Arc::new(service), backend)
}

pub(super) fn router_with_service(
    service: Arc<CoordinationService<MemoryBackend>>,
) -> axum::Router {
    application_router(service)
}

pub(super) async fn session_for(
    service: &CoordinationService<MemoryBackend>,
    token: &str,
) -> Session {
    service
        .open_session(token, &tokio_util::sync::CancellationToken::new())
        .await
        .expect("session opens")
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
