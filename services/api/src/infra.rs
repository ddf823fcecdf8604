use chrono::{FixedOffset, NaiveTime, Weekday};
use metrics_exporter_prometheus::PrometheusHandle;
use petconnect::backend::MemoryBackend;
use petconnect::workflows::availability::AvailabilitySlot;
use petconnect::workflows::listings::{OrganizationRef, Poster};
use petconnect::workflows::requests::{
    AdoptionRequest, AdoptionStatus, FosterRequest, FosterStatus, PetRef, PetSummary,
};
use petconnect::workflows::{Listing, PetId, UserId, UserProfile, UserRole};
use petconnect::workflows::domain::{UserRef, UserSummary};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_STAFF_TOKEN: &str = "demo-staff";
pub(crate) const DEMO_ADOPTER_TOKEN: &str = "demo-adopter";
pub(crate) const DEMO_OWNER_TOKEN: &str = "demo-owner";

/// Parse a weekly slot written as `Monday 09:00-17:00`.
pub(crate) fn parse_slot(raw: &str) -> Result<AvailabilitySlot, String> {
    let (day, window) = raw
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("expected '<day> HH:MM-HH:MM', got '{raw}'"))?;
    let (start, end) = window
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("expected a HH:MM-HH:MM window in '{raw}'"))?;

    AvailabilitySlot::parse(day, start.trim(), end.trim()).map_err(|err| err.to_string())
}

pub(crate) fn parse_offset(raw: &str) -> Result<FixedOffset, String> {
    let minutes: i32 = raw
        .trim()
        .parse()
        .map_err(|err| format!("'{raw}' is not a number of minutes ({err})"))?;
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| format!("utc offset of {minutes} minutes is out of range"))
}

fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn demo_profile(id: &str, role: UserRole, name: &str) -> UserProfile {
    UserProfile {
        id: UserId(id.to_string()),
        email: format!("{id}@petconnect.demo"),
        role,
        name: Some(name.to_string()),
        location: Some("Portland".to_string()),
        adoption_status: None,
    }
}

fn demo_adoption(id: &str, pet: &str, pet_name: &str, adopter: &str, status: AdoptionStatus) -> AdoptionRequest {
    let mut request = AdoptionRequest::new(id, status);
    request.pet = Some(PetRef::Summary(PetSummary {
        id: PetId(pet.to_string()),
        name: Some(pet_name.to_string()),
        breed: None,
        status: Some("Available".to_string()),
        images: Vec::new(),
    }));
    request.adopter = Some(UserRef::Summary(UserSummary {
        id: Some(UserId(adopter.to_string())),
        name: Some("Riley Adopter".to_string()),
        email: None,
        location: None,
    }));
    request
}

fn demo_listing(id: &str, name: &str, poster: Poster, status: &str) -> Listing {
    Listing {
        id: PetId(id.to_string()),
        name: Some(name.to_string()),
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

/// In-memory backend seeded with one shelter, one adopter and one personal pet owner.
pub(crate) fn demo_backend() -> MemoryBackend {
    let shelter = Poster::Organization(OrganizationRef::Id("org-demo".to_string()));
    let owner = Poster::Owner(UserRef::Id(UserId("owner-demo".to_string())));

    let mut pepper = demo_listing("pet-pepper", "Pepper", owner, "available_fostering");
    let mut interested = FosterRequest::new("foster-1", FosterStatus::Pending);
    interested.message = Some("We have a fenced yard and work from home.".to_string());
    pepper.foster_requests = vec![
        interested,
        FosterRequest::new("foster-2", FosterStatus::Pending),
    ];

    MemoryBackend::new()
        .with_user(DEMO_STAFF_TOKEN, demo_profile("staff-demo", UserRole::Staff, "Sam Staff"))
        .with_user(DEMO_ADOPTER_TOKEN, demo_profile("adopter-demo", UserRole::Adopter, "Riley Adopter"))
        .with_user(DEMO_OWNER_TOKEN, demo_profile("owner-demo", UserRole::Adopter, "Olive Owner"))
        .with_adoption_request(demo_adoption("adoption-1", "pet-biscuit", "Biscuit", "adopter-demo", AdoptionStatus::Pending))
        .with_adoption_request(demo_adoption("adoption-2", "pet-mochi", "Mochi", "adopter-demo", AdoptionStatus::Pending))
        .with_shelter_pet(demo_listing("pet-biscuit", "Biscuit", shelter.clone(), "Available"))
        .with_shelter_pet(demo_listing("pet-mochi", "Mochi", shelter, "In Treatment"))
        .with_personal_listing(pepper)
        .with_availability(
            UserId("staff-demo".to_string()),
            vec![
                AvailabilitySlot::weekly(Weekday::Mon, clock(9, 0), clock(12, 0)),
                AvailabilitySlot::weekly(Weekday::Wed, clock(13, 0), clock(17, 0)),
            ],
        )
}
