use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::service::{AdoptionDecision, CoordinationService, ServiceError};
use crate::backend::http::AUTH_HEADER;
use crate::backend::{BackendError, PetConnectBackend, Session};
use crate::workflows::availability::slot::{clock_time, slot_date};
use crate::workflows::availability::{parse_day, AvailabilitySlot, SlotError, SlotId, SlotSelector};
use crate::workflows::dashboard::FosterTab;
use crate::workflows::domain::{PetId, RequestId};
use crate::workflows::requests::FosterAction;

/// Router exposing the dashboards and every staff/owner decision.
pub fn application_router<B>(service: Arc<CoordinationService<B>>) -> Router
where
    B: PetConnectBackend + 'static,
{
    Router::new()
        .route("/api/v1/staff/dashboard", get(staff_dashboard_handler::<B>))
        .route("/api/v1/adopter/dashboard", get(adopter_dashboard_handler::<B>))
        .route(
            "/api/v1/adoptions/:request_id/decision",
            post(adoption_decision_handler::<B>),
        )
        .route(
            "/api/v1/adoptions/:request_id/meeting-proposal",
            post(meeting_proposal_handler::<B>),
        )
        .route(
            "/api/v1/listings/:pet_id/foster-requests/:request_id/decision",
            post(foster_decision_handler::<B>),
        )
        .route("/api/v1/pets/:pet_id/status", patch(pet_status_handler::<B>))
        .route(
            "/api/v1/staff/availability",
            get(availability_handler::<B>)
                .post(add_availability_handler::<B>)
                .delete(remove_availability_handler::<B>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardQuery {
    #[serde(default)]
    tab: FosterTab,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeetingProposalBody {
    meeting_date: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FosterDecisionBody {
    action: FosterAction,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PetStatusBody {
    status: String,
}

/// `?id=` or the full `?day=&startTime=&endTime=` window (plus `&date=` for a dated
/// slot); a bare day is refused.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SlotQuery {
    id: Option<String>,
    day: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    date: Option<String>,
}

impl SlotQuery {
    fn selector(self) -> Result<SlotSelector, SlotError> {
        if let Some(id) = self.id.filter(|id| !id.trim().is_empty()) {
            return Ok(SlotSelector::Id(SlotId(id)));
        }

        let date = match self.date.filter(|date| !date.trim().is_empty()) {
            Some(raw) => Some(slot_date::parse(&raw).map_err(SlotError::malformed)?),
            None => None,
        };

        match (self.day, self.start_time, self.end_time) {
            (Some(day), Some(start), Some(end)) => Ok(SlotSelector::Window {
                day: parse_day(&day)?,
                start_time: clock_time::parse(&start).map_err(SlotError::malformed)?,
                end_time: clock_time::parse(&end).map_err(SlotError::malformed)?,
                date,
            }),
            _ => Err(SlotError::malformed(
                "delete needs an id or the full day, startTime and endTime",
            )),
        }
    }
}

/// Token from the request plus a cancellation token that fires if the handler is dropped.
async fn open<B>(
    service: &CoordinationService<B>,
    headers: &HeaderMap,
    cancel: &CancellationToken,
) -> Result<Session, ServiceError>
where
    B: PetConnectBackend + 'static,
{
    let token = headers
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    service.open_session(token, cancel).await
}

pub(crate) async fn staff_dashboard_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    headers: HeaderMap,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        service.staff_dashboard(&session, &cancel).await
    }
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn adopter_dashboard_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        service.adopter_dashboard(&session, query.tab, &cancel).await
    }
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn adoption_decision_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    Json(decision): Json<AdoptionDecision>,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let id = RequestId(request_id);
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        service
            .decide_adoption_by_id(&session, &id, &decision, &cancel)
            .await
    }
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn meeting_proposal_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<MeetingProposalBody>,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let id = RequestId(request_id);
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        service
            .propose_meeting(&session, &id, &body.meeting_date, &cancel)
            .await
    }
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn foster_decision_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    Path((pet_id, request_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<FosterDecisionBody>,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let (pet, request) = (PetId(pet_id), RequestId(request_id));
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        service
            .decide_foster(&session, &pet, &request, body.action, &cancel)
            .await
    }
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn pet_status_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    Path(pet_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<PetStatusBody>,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let pet = PetId(pet_id);
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        service
            .update_pet_status(&session, &pet, &body.status, &cancel)
            .await
    }
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn availability_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    headers: HeaderMap,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        let snapshot = service.availability(&session, &cancel).await?;
        Ok::<_, ServiceError>(json!({
            "slots": snapshot.slots,
            "revision": snapshot.revision,
            "summary": snapshot.summary(),
        }))
    }
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn add_availability_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    headers: HeaderMap,
    Json(slot): Json<AvailabilitySlot>,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let result = async {
        let session = open(&service, &headers, &cancel).await?;
        service.add_availability(&session, slot, &cancel).await
    }
    .await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn remove_availability_handler<B>(
    State(service): State<Arc<CoordinationService<B>>>,
    headers: HeaderMap,
    Query(query): Query<SlotQuery>,
) -> Response
where
    B: PetConnectBackend + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let result = async {
        let selector = query.selector()?;
        let session = open(&service, &headers, &cancel).await?;
        service.remove_availability(&session, selector, &cancel).await
    }
    .await;
    respond(StatusCode::OK, result)
}

fn respond<T: serde::Serialize>(success: StatusCode, result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(body) => (success, Json(body)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Lifecycle(_) | ServiceError::MissingField(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::Availability(SlotError::Malformed { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Availability(SlotError::Overlap { .. }) => StatusCode::CONFLICT,
        ServiceError::Availability(SlotError::NotFound(_)) => StatusCode::NOT_FOUND,
        ServiceError::UnknownRequest { .. } => StatusCode::NOT_FOUND,
        ServiceError::MissingToken => StatusCode::UNAUTHORIZED,
        ServiceError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Backend(backend) => match backend {
            BackendError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BackendError::Forbidden(_) => StatusCode::FORBIDDEN,
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            BackendError::Conflict(_) => StatusCode::CONFLICT,
            BackendError::Rejected { status, .. } if (400..500).contains(status) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BackendError::Rejected { .. } | BackendError::Transport(_) | BackendError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        },
    }
}

pub(crate) fn error_response(error: &ServiceError) -> Response {
    let status = status_for(error);
    let mut payload = json!({ "error": error.to_string() });

    match error {
        ServiceError::Availability(SlotError::Overlap { conflicting, .. }) => {
            payload["conflicting"] = json!(conflicting);
        }
        ServiceError::MissingToken => payload["login_required"] = json!(true),
        ServiceError::Backend(backend) if backend.requires_login() => {
            payload["login_required"] = json!(true);
        }
        _ => {}
    }

    (status, Json(payload)).into_response()
}
