use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{NaiveTime, TimeZone, Utc, Weekday};
use petconnect::backend::{BackendError, MemoryBackend};
use petconnect::workflows::coordination::AdoptionDecision;
use petconnect::workflows::listings::{OrganizationRef, Poster};
use petconnect::workflows::requests::{AdoptionStatus, FosterAction, FosterRequest, FosterStatus};
use petconnect::workflows::{
    application_router, AdoptionRequest, AvailabilitySlot, CoordinationService, FosterTab,
    Listing, MeetingScheduler, PetId, RequestId, ServiceError, SlotSelector, UserId, UserProfile,
    UserRole,
};
use petconnect::workflows::domain::UserRef;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const STAFF: &str = "staff-token";
const OWNER: &str = "owner-token";

fn clock(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time")
}

fn profile(id: &str, role: UserRole) -> UserProfile {
    UserProfile {
        id: UserId(id.to_string()),
        email: format!("{id}@example.org"),
        role,
        name: Some(id.to_string()),
        location: Some("Denver".to_string()),
        adoption_status: None,
    }
}

fn listing(id: &str, poster: Poster, requests: Vec<FosterRequest>) -> Listing {
    Listing {
        id: PetId(id.to_string()),
        name: Some(format!("pet {id}")),
        breed: None,
        age: None,
        gender: None,
        status: Some("available_fostering".to_string()),
        images: Vec::new(),
        poster,
        trainer: None,
        vet: None,
        foster_requests: requests,
    }
}

fn backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_user(STAFF, profile("staff-1", UserRole::Staff))
        .with_user(OWNER, profile("owner-1", UserRole::Adopter))
        .with_adoption_request(AdoptionRequest::new("adoption-1", AdoptionStatus::Pending))
        .with_adoption_request(AdoptionRequest::new("adoption-2", AdoptionStatus::Approved))
        .with_shelter_pet(listing(
            "pet-shelter",
            Poster::Organization(OrganizationRef::Id("org-1".to_string())),
            Vec::new(),
        ))
        .with_personal_listing(listing(
            "pet-owned",
            Poster::Owner(UserRef::Id(UserId("owner-1".to_string()))),
            vec![
                FosterRequest::new("foster-1", FosterStatus::Pending),
                FosterRequest::new("foster-2", FosterStatus::InDiscussion),
            ],
        ))
        .with_availability(
            UserId("staff-1".to_string()),
            vec![AvailabilitySlot::weekly(Weekday::Mon, clock(9), clock(17))],
        )
}

fn service(backend: Arc<MemoryBackend>) -> CoordinationService<MemoryBackend> {
    CoordinationService::new(backend, MeetingScheduler::default()).with_clock(|| {
        Utc.with_ymd_and_hms(2025, 11, 1, 8, 0, 0)
            .single()
            .expect("valid now")
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn staff_approve_then_propose_a_covered_meeting() {
    let backend = Arc::new(backend());
    let service = service(backend.clone());
    let cancel = CancellationToken::new();
    let staff = service.open_session(STAFF, &cancel).await.expect("session");
    let id = RequestId("adoption-1".to_string());

    let approved = service
        .decide_adoption_by_id(&staff, &id, &AdoptionDecision::Approve, &cancel)
        .await
        .expect("approval sent");
    assert!(approved.applied);

    let meeting = service
        .propose_meeting(&staff, &id, "2025-11-03T10:00", &cancel)
        .await
        .expect("meeting proposed");
    assert!(meeting.coverage.is_covered());
    assert_eq!(
        backend.adoption_request(&id).map(|request| request.status),
        Some(AdoptionStatus::Meeting)
    );

    let late = service
        .propose_meeting(&staff, &id, "2025-11-03T18:00", &cancel)
        .await
        .expect("uncovered meetings still go out");
    assert!(late.coverage.warning().is_some());

    assert_eq!(
        backend.mutations(),
        vec![
            "PATCH /adoptions/adoption-1/status approved".to_string(),
            "PATCH /adoptions/adoption-1/status meeting".to_string(),
            "PATCH /adoptions/adoption-1/status meeting".to_string(),
        ]
    );
}

#[tokio::test]
async fn stale_availability_edits_are_refused() {
    let backend = Arc::new(backend());
    let service = service(backend.clone());
    let cancel = CancellationToken::new();
    let staff = service.open_session(STAFF, &cancel).await.expect("session");

    let added = service
        .add_availability(
            &staff,
            AvailabilitySlot::weekly(Weekday::Tue, clock(9), clock(12)),
            &cancel,
        )
        .await
        .expect("slot added");
    assert_eq!(added.slots.len(), 2);
    assert_eq!(added.revision.as_deref(), Some("rev-2"));

    let overlap = service
        .add_availability(
            &staff,
            AvailabilitySlot::weekly(Weekday::Tue, clock(11), clock(13)),
            &cancel,
        )
        .await
        .expect_err("overlap refused locally");
    assert!(matches!(overlap, ServiceError::Availability(_)));

    let removed = service
        .remove_availability(
            &staff,
            SlotSelector::Window {
                day: Weekday::Mon,
                start_time: clock(9),
                end_time: clock(17),
                date: None,
            },
            &cancel,
        )
        .await
        .expect("slot removed");
    assert_eq!(removed.slots.len(), 1);
    assert_eq!(removed.slots[0].day, Weekday::Tue);

    backend.fail_next(BackendError::Conflict("availability changed".to_string()));
    let err = service
        .availability(&staff, &cancel)
        .await
        .expect_err("conflict surfaces");
    assert!(matches!(err, ServiceError::Backend(BackendError::Conflict(_))));
}

#[tokio::test]
async fn owner_decides_foster_requests_and_sees_them_on_the_dashboard() {
    let backend = Arc::new(backend());
    let service = service(backend.clone());
    let cancel = CancellationToken::new();
    let owner = service.open_session(OWNER, &cancel).await.expect("session");
    let pet = PetId("pet-owned".to_string());

    let discussion = service
        .decide_foster(
            &owner,
            &pet,
            &RequestId("foster-1".to_string()),
            FosterAction::StartDiscussion,
            &cancel,
        )
        .await
        .expect("discussion started");
    assert_eq!(discussion.request.chat_thread.as_deref(), Some("thread-foster-1"));

    service
        .decide_foster(
            &owner,
            &pet,
            &RequestId("foster-2".to_string()),
            FosterAction::Approve,
            &cancel,
        )
        .await
        .expect("approved");

    let dashboard = service
        .adopter_dashboard(&owner, FosterTab::Pending, &cancel)
        .await
        .expect("dashboard");
    assert_eq!(dashboard.foster_counts.total, 2);
    assert_eq!(dashboard.foster_counts.needs_review, 1);
    assert_eq!(dashboard.foster_requests.len(), 1);
    assert!(dashboard.browse.iter().all(|card| card.id != pet));
    assert_eq!(dashboard.my_listings.len(), 1);
}

#[tokio::test]
async fn router_reports_invalid_decisions_as_unprocessable() {
    let service = Arc::new(service(Arc::new(backend())));
    let app = application_router(service);

    let response = app
        .oneshot(
            Request::post("/api/v1/adoptions/adoption-2/decision")
                .header("x-auth-token", STAFF)
                .header("content-type", "application/json")
                .body(Body::from(json!({ "decision": "reject" }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("approved")));
}
