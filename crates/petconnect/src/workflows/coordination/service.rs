use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{
    AvailabilityEdit, BackendError, PetConnectBackend, PetScope, RequestScope, Session, SlotChange,
};
use crate::workflows::availability::{self, AvailabilitySlot, AvailabilitySnapshot, SlotError, SlotSelector};
use crate::workflows::dashboard::{AdopterDashboard, AdopterSources, FosterTab, StaffDashboard};
use crate::workflows::domain::{PetId, RequestId, UserProfile};
use crate::workflows::listings::Listing;
use crate::workflows::requests::{
    AdoptionPatch, AdoptionRequest, FosterAction, FosterRequest, LifecycleError, RequestKind,
    RequestLifecycle, Transition,
};
use crate::workflows::scheduling::{AvailabilityCoverage, MeetingScheduler};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Staff decision on an adoption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdoptionDecision {
    Approve,
    Ignore,
    Reject,
    RequestMeeting { meeting_date: String },
    Finalize,
}

/// Result of a decision: the request as the backend now holds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionOutcome<R> {
    pub request: R,
    /// `false` when the request already had the target status and nothing was sent.
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingOutcome {
    pub request: AdoptionRequest,
    pub applied: bool,
    pub coverage: AvailabilityCoverage,
}

/// Coordinates local validation with backend mutations for one signed-in user at a time.
pub struct CoordinationService<B> {
    backend: Arc<B>,
    lifecycle: RequestLifecycle,
    scheduler: MeetingScheduler,
    clock: Clock,
}

impl<B> CoordinationService<B>
where
    B: PetConnectBackend + 'static,
{
    pub fn new(backend: Arc<B>, scheduler: MeetingScheduler) -> Self {
        Self {
            backend,
            lifecycle: RequestLifecycle::new(),
            scheduler,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn scheduler(&self) -> &MeetingScheduler {
        &self.scheduler
    }

    /// Resolve a raw token into a session carrying the signed-in user.
    pub async fn open_session(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Session, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::MissingToken);
        }

        let session = Session::new(token);
        let user = guarded(cancel, "current_user", self.backend.current_user(&session)).await?;
        Ok(session.with_user(user))
    }

    pub async fn decide_adoption(
        &self,
        session: &Session,
        request: &AdoptionRequest,
        decision: &AdoptionDecision,
        cancel: &CancellationToken,
    ) -> Result<DecisionOutcome<AdoptionRequest>, ServiceError> {
        let transition = match decision {
            AdoptionDecision::Approve => self.lifecycle.approve(request)?,
            AdoptionDecision::Ignore => self.lifecycle.ignore(request)?,
            AdoptionDecision::Reject => self.lifecycle.reject(request)?,
            AdoptionDecision::Finalize => self.lifecycle.finalize(request)?,
            AdoptionDecision::RequestMeeting { meeting_date } => {
                let at = self.scheduler.parse_candidate(meeting_date)?;
                self.lifecycle.request_meeting_at(request, at, (self.clock)())?
            }
        };

        self.submit_adoption(session, transition, cancel).await
    }

    /// Look the request up in the staff queue, then decide it.
    pub async fn decide_adoption_by_id(
        &self,
        session: &Session,
        id: &RequestId,
        decision: &AdoptionDecision,
        cancel: &CancellationToken,
    ) -> Result<DecisionOutcome<AdoptionRequest>, ServiceError> {
        let request = self.staff_request(session, id, cancel).await?;
        self.decide_adoption(session, &request, decision, cancel).await
    }

    /// Propose a meeting, checking the candidate time against the reviewer's availability.
    ///
    /// Uncovered times are logged and returned as a warning; the meeting is still sent.
    pub async fn propose_meeting(
        &self,
        session: &Session,
        id: &RequestId,
        candidate: &str,
        cancel: &CancellationToken,
    ) -> Result<MeetingOutcome, ServiceError> {
        let (requests, snapshot) = guarded(cancel, "propose_meeting", async {
            tokio::try_join!(
                self.backend.adoption_requests(session, RequestScope::Staff),
                self.backend.availability(session),
            )
        })
        .await?;

        let request = find_adoption(requests, id)?;
        let proposal =
            self.scheduler
                .propose_meeting(&request, candidate, &snapshot.slots, (self.clock)())?;
        if let Some(warning) = proposal.coverage.warning() {
            warn!(request = %id, warning, "meeting proposed outside availability");
        }

        let outcome = self.submit_adoption(session, proposal.transition, cancel).await?;
        Ok(MeetingOutcome {
            request: outcome.request,
            applied: outcome.applied,
            coverage: proposal.coverage,
        })
    }

    /// Apply an owner's decision to a foster request on one of their listings.
    pub async fn decide_foster(
        &self,
        session: &Session,
        pet: &PetId,
        request_id: &RequestId,
        action: FosterAction,
        cancel: &CancellationToken,
    ) -> Result<DecisionOutcome<FosterRequest>, ServiceError> {
        let listings = guarded(cancel, "my_listings", self.backend.pets(session, PetScope::MyListings)).await?;
        let request = listings
            .iter()
            .find(|listing| &listing.id == pet)
            .and_then(|listing| {
                listing
                    .foster_requests
                    .iter()
                    .find(|request| &request.id == request_id)
            })
            .cloned()
            .ok_or_else(|| ServiceError::UnknownRequest {
                kind: RequestKind::Foster,
                id: request_id.clone(),
            })?;

        match self.lifecycle.apply_foster(&request, action)? {
            Transition::Unchanged { request } => {
                debug!(request = %request.id, status = %request.status, "foster request already in target status");
                Ok(DecisionOutcome {
                    request,
                    applied: false,
                })
            }
            Transition::Applied { mut request, patch } => {
                let receipt = guarded(
                    cancel,
                    "apply_foster_action",
                    self.backend.apply_foster_action(session, pet, request_id, patch),
                )
                .await?;
                if receipt.chat_thread.is_some() {
                    request.chat_thread = receipt.chat_thread;
                }
                info!(request = %request.id, pet = %pet, status = %request.status, "foster request updated");
                Ok(DecisionOutcome {
                    request,
                    applied: true,
                })
            }
        }
    }

    pub async fn availability(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<AvailabilitySnapshot, ServiceError> {
        guarded(cancel, "availability", self.backend.availability(session)).await
    }

    /// Validate and add a slot against the current list, then submit it with the revision it was checked against.
    pub async fn add_availability(
        &self,
        session: &Session,
        slot: AvailabilitySlot,
        cancel: &CancellationToken,
    ) -> Result<AvailabilitySnapshot, ServiceError> {
        slot.validate()?;

        let current = self.availability(session, cancel).await?;
        let resulting = availability::add_slot(&current.slots, slot.clone())?;
        let edit = AvailabilityEdit {
            base_revision: current.revision,
            change: SlotChange::Add(slot),
            resulting,
        };

        let saved = guarded(cancel, "add_availability", self.backend.edit_availability(session, &edit)).await?;
        info!(slots = saved.slots.len(), revision = ?saved.revision, "availability slot added");
        Ok(saved)
    }

    pub async fn remove_availability(
        &self,
        session: &Session,
        selector: SlotSelector,
        cancel: &CancellationToken,
    ) -> Result<AvailabilitySnapshot, ServiceError> {
        let current = self.availability(session, cancel).await?;
        let resulting = availability::remove_existing_slot(&current.slots, &selector)?;
        let edit = AvailabilityEdit {
            base_revision: current.revision,
            change: SlotChange::Remove(selector),
            resulting,
        };

        let saved = guarded(cancel, "remove_availability", self.backend.edit_availability(session, &edit)).await?;
        info!(slots = saved.slots.len(), revision = ?saved.revision, "availability slot removed");
        Ok(saved)
    }

    pub async fn update_pet_status(
        &self,
        session: &Session,
        pet: &PetId,
        status: &str,
        cancel: &CancellationToken,
    ) -> Result<Listing, ServiceError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(ServiceError::MissingField("status"));
        }
        let listing = guarded(cancel, "update_pet_status", self.backend.update_pet_status(session, pet, status)).await?;
        info!(pet = %pet, status, "pet status updated");
        Ok(listing)
    }

    pub async fn staff_dashboard(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<StaffDashboard, ServiceError> {
        let staff = self.signed_in_user(session, cancel).await?;
        let (requests, pets, snapshot) = guarded(cancel, "staff_dashboard", async {
            tokio::try_join!(
                self.backend.adoption_requests(session, RequestScope::Staff),
                self.backend.pets(session, PetScope::Organization),
                self.backend.availability(session),
            )
        })
        .await?;

        Ok(StaffDashboard::project(&staff, &requests, &pets, &snapshot))
    }

    pub async fn adopter_dashboard(
        &self,
        session: &Session,
        tab: FosterTab,
        cancel: &CancellationToken,
    ) -> Result<AdopterDashboard, ServiceError> {
        let adopter = self.signed_in_user(session, cancel).await?;
        let (requests, shelter_pets, personal_listings, my_listings) =
            guarded(cancel, "adopter_dashboard", async {
                tokio::try_join!(
                    self.backend.adoption_requests(session, RequestScope::Mine),
                    self.backend.pets(session, PetScope::Shelter),
                    self.backend.pets(session, PetScope::Personal),
                    self.backend.pets(session, PetScope::MyListings),
                )
            })
            .await?;

        let sources = AdopterSources {
            requests: &requests,
            shelter_pets: &shelter_pets,
            personal_listings: &personal_listings,
            my_listings: &my_listings,
        };
        Ok(AdopterDashboard::project(&adopter, sources, tab))
    }

    async fn signed_in_user(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<UserProfile, ServiceError> {
        match session.user() {
            Some(user) => Ok(user.clone()),
            None => guarded(cancel, "current_user", self.backend.current_user(session)).await,
        }
    }

    async fn staff_request(
        &self,
        session: &Session,
        id: &RequestId,
        cancel: &CancellationToken,
    ) -> Result<AdoptionRequest, ServiceError> {
        let requests = guarded(
            cancel,
            "adoption_requests",
            self.backend.adoption_requests(session, RequestScope::Staff),
        )
        .await?;
        find_adoption(requests, id)
    }

    async fn submit_adoption(
        &self,
        session: &Session,
        transition: Transition<AdoptionRequest, AdoptionPatch>,
        cancel: &CancellationToken,
    ) -> Result<DecisionOutcome<AdoptionRequest>, ServiceError> {
        match transition {
            Transition::Unchanged { request } => {
                debug!(request = %request.id, status = %request.status, "adoption request already in target status");
                Ok(DecisionOutcome {
                    request,
                    applied: false,
                })
            }
            Transition::Applied { request, patch } => {
                let saved = guarded(
                    cancel,
                    "update_adoption_status",
                    self.backend.update_adoption_status(session, &request.id, &patch),
                )
                .await?;
                info!(request = %saved.id, status = %saved.status, "adoption request updated");
                Ok(DecisionOutcome {
                    request: saved,
                    applied: true,
                })
            }
        }
    }
}

fn find_adoption(requests: Vec<AdoptionRequest>, id: &RequestId) -> Result<AdoptionRequest, ServiceError> {
    requests
        .into_iter()
        .find(|request| &request.id == id)
        .ok_or_else(|| ServiceError::UnknownRequest {
            kind: RequestKind::Adoption,
            id: id.clone(),
        })
}

/// Race a backend call against `cancel`; a cancelled call yields no result.
async fn guarded<T, F>(
    cancel: &CancellationToken,
    operation: &'static str,
    call: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    if cancel.is_cancelled() {
        return Err(ServiceError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(operation, "cancelled while waiting on backend");
            Err(ServiceError::Cancelled)
        }
        result = call => result.map_err(|err| {
            warn!(operation, error = %err, "backend call failed");
            ServiceError::Backend(err)
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Availability(#[from] SlotError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("operation cancelled before the backend answered")]
    Cancelled,
    #[error("no {kind} request {id}")]
    UnknownRequest { kind: RequestKind, id: RequestId },
    #[error("missing x-auth-token header")]
    MissingToken,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}
