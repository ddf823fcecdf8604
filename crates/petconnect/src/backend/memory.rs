use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{
    AvailabilityEdit, BackendError, FosterActionReceipt, PetConnectBackend, PetScope,
    RequestScope, Session, SlotChange,
};
use crate::workflows::availability::{self, AvailabilitySnapshot, SlotId};
use crate::workflows::domain::{PetId, RequestId, UserId, UserProfile};
use crate::workflows::listings::Listing;
use crate::workflows::requests::{
    AdoptionPatch, AdoptionRequest, FosterAction, MeetingInfo, MeetingStatus,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, UserProfile>,
    adoption_requests: Vec<AdoptionRequest>,
    shelter_pets: Vec<Listing>,
    personal_listings: Vec<Listing>,
    availability: HashMap<UserId, StoredAvailability>,
    mutations: Vec<String>,
    fail_next: Option<BackendError>,
    next_slot: u64,
}

#[derive(Debug, Default)]
struct StoredAvailability {
    slots: Vec<availability::AvailabilitySlot>,
    revision: u64,
}

impl StoredAvailability {
    fn snapshot(&self) -> AvailabilitySnapshot {
        AvailabilitySnapshot::new(self.slots.clone(), Some(format!("rev-{}", self.revision)))
    }
}

/// In-process backend with the same contract as the REST one, revision checks included.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Transport("memory backend lock poisoned".to_string()))
    }

    fn with_state(self, apply: impl FnOnce(&mut MemoryState)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            apply(&mut state);
        }
        self
    }

    pub fn with_user(self, token: impl Into<String>, user: UserProfile) -> Self {
        let token = token.into();
        self.with_state(|state| {
            state.users.insert(token, user);
        })
    }

    pub fn with_adoption_request(self, request: AdoptionRequest) -> Self {
        self.with_state(|state| state.adoption_requests.push(request))
    }

    pub fn with_shelter_pet(self, pet: Listing) -> Self {
        self.with_state(|state| state.shelter_pets.push(pet))
    }

    pub fn with_personal_listing(self, listing: Listing) -> Self {
        self.with_state(|state| state.personal_listings.push(listing))
    }

    pub fn with_availability(
        self,
        staff: UserId,
        slots: Vec<availability::AvailabilitySlot>,
    ) -> Self {
        self.with_state(|state| {
            state
                .availability
                .insert(staff, StoredAvailability { slots, revision: 1 });
        })
    }

    /// Make the next backend call fail with `error`.
    pub fn fail_next(&self, error: BackendError) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next = Some(error);
        }
    }

    /// Mutations received so far, as `"METHOD target"` lines.
    pub fn mutations(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.mutations.clone())
            .unwrap_or_default()
    }

    pub fn adoption_request(&self, id: &RequestId) -> Option<AdoptionRequest> {
        let state = self.state.lock().ok()?;
        state
            .adoption_requests
            .iter()
            .find(|request| &request.id == id)
            .cloned()
    }

    /// Bump a staff member's revision as if another editor had saved.
    pub fn touch_availability(&self, staff: &UserId) {
        if let Ok(mut state) = self.state.lock() {
            state.availability.entry(staff.clone()).or_default().revision += 1;
        }
    }

    fn authorize(&self, session: &Session) -> Result<(MutexGuard<'_, MemoryState>, UserProfile), BackendError> {
        let mut state = self.lock()?;
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        let user = state
            .users
            .get(session.token())
            .cloned()
            .ok_or_else(|| BackendError::Unauthorized("Token is not valid".to_string()))?;
        Ok((state, user))
    }
}

fn require_staff(user: &UserProfile) -> Result<(), BackendError> {
    if user.role.reviews_adoptions() {
        Ok(())
    } else {
        Err(BackendError::Forbidden(format!(
            "{} accounts cannot manage adoptions",
            user.role.label()
        )))
    }
}

fn owned_by(listing: &Listing, user: &UserId) -> bool {
    listing.poster.owner_id() == Some(user)
}

#[async_trait]
impl PetConnectBackend for MemoryBackend {
    async fn current_user(&self, session: &Session) -> Result<UserProfile, BackendError> {
        let (_state, user) = self.authorize(session)?;
        Ok(user)
    }

    async fn adoption_requests(
        &self,
        session: &Session,
        scope: RequestScope,
    ) -> Result<Vec<AdoptionRequest>, BackendError> {
        let (state, user) = self.authorize(session)?;
        match scope {
            RequestScope::Staff => {
                require_staff(&user)?;
                Ok(state.adoption_requests.clone())
            }
            RequestScope::Mine => Ok(state
                .adoption_requests
                .iter()
                .filter(|request| {
                    request.adopter.as_ref().and_then(|adopter| adopter.id()) == Some(&user.id)
                })
                .cloned()
                .collect()),
        }
    }

    async fn update_adoption_status(
        &self,
        session: &Session,
        id: &RequestId,
        patch: &AdoptionPatch,
    ) -> Result<AdoptionRequest, BackendError> {
        let (mut state, user) = self.authorize(session)?;
        require_staff(&user)?;

        state
            .mutations
            .push(format!("PATCH /adoptions/{id}/status {}", patch.status));
        let request = state
            .adoption_requests
            .iter_mut()
            .find(|request| &request.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("adoption request {id}")))?;

        request.status = patch.status;
        if let Some(date) = patch.meeting_date {
            let previous = request.meeting.take().unwrap_or_default();
            request.meeting = Some(MeetingInfo {
                date: Some(date),
                confirmed: false,
                status: Some(MeetingStatus::Scheduled),
                ..previous
            });
        }
        Ok(request.clone())
    }

    async fn pets(&self, session: &Session, scope: PetScope) -> Result<Vec<Listing>, BackendError> {
        let (state, user) = self.authorize(session)?;
        let pets = match scope {
            PetScope::Organization => {
                require_staff(&user)?;
                state.shelter_pets.clone()
            }
            PetScope::Shelter => state.shelter_pets.clone(),
            PetScope::Personal => state.personal_listings.clone(),
            PetScope::MyListings => state
                .personal_listings
                .iter()
                .filter(|listing| owned_by(listing, &user.id))
                .cloned()
                .collect(),
        };
        Ok(pets)
    }

    async fn update_pet_status(
        &self,
        session: &Session,
        pet: &PetId,
        status: &str,
    ) -> Result<Listing, BackendError> {
        let (mut state, user) = self.authorize(session)?;
        state.mutations.push(format!("PATCH /pets/{pet}/status {status}"));

        let state = &mut *state;
        let listing = state
            .shelter_pets
            .iter_mut()
            .chain(state.personal_listings.iter_mut())
            .find(|listing| &listing.id == pet)
            .ok_or_else(|| BackendError::NotFound(format!("pet {pet}")))?;

        if !user.role.reviews_adoptions() && !owned_by(listing, &user.id) {
            return Err(BackendError::Forbidden(format!("pet {pet} belongs to someone else")));
        }
        listing.status = Some(status.to_string());
        Ok(listing.clone())
    }

    async fn apply_foster_action(
        &self,
        session: &Session,
        pet: &PetId,
        request: &RequestId,
        action: FosterAction,
    ) -> Result<FosterActionReceipt, BackendError> {
        let (mut state, user) = self.authorize(session)?;
        state
            .mutations
            .push(format!("FOSTER {pet}/{request} {}", action.target()));

        let listing = state
            .personal_listings
            .iter_mut()
            .find(|listing| &listing.id == pet)
            .ok_or_else(|| BackendError::NotFound(format!("listing {pet}")))?;
        if !owned_by(listing, &user.id) {
            return Err(BackendError::Forbidden(format!(
                "only the owner of {pet} can decide foster requests"
            )));
        }

        let foster = listing
            .foster_requests
            .iter_mut()
            .find(|candidate| &candidate.id == request)
            .ok_or_else(|| BackendError::NotFound(format!("foster request {request}")))?;
        foster.status = action.target();
        if action == FosterAction::StartDiscussion && foster.chat_thread.is_none() {
            foster.chat_thread = Some(format!("thread-{request}"));
        }

        Ok(FosterActionReceipt {
            chat_thread: foster.chat_thread.clone(),
        })
    }

    async fn availability(&self, session: &Session) -> Result<AvailabilitySnapshot, BackendError> {
        let (mut state, user) = self.authorize(session)?;
        require_staff(&user)?;
        Ok(state.availability.entry(user.id).or_default().snapshot())
    }

    async fn edit_availability(
        &self,
        session: &Session,
        edit: &AvailabilityEdit,
    ) -> Result<AvailabilitySnapshot, BackendError> {
        let (mut state, user) = self.authorize(session)?;
        require_staff(&user)?;

        let state = &mut *state;
        let stored = state.availability.entry(user.id).or_default();
        let current = format!("rev-{}", stored.revision);
        if let Some(base) = &edit.base_revision {
            if base != &current {
                return Err(BackendError::Conflict(format!(
                    "availability changed since {base} (now {current})"
                )));
            }
        }

        let slots = match &edit.change {
            SlotChange::Add(slot) => {
                let mut slot = slot.clone();
                if slot.id.is_none() {
                    state.next_slot += 1;
                    slot.id = Some(SlotId(format!("slot-{}", state.next_slot)));
                }
                availability::add_slot(&stored.slots, slot)
                    .map_err(|err| BackendError::Conflict(err.to_string()))?
            }
            SlotChange::Remove(selector) => availability::remove_slot(&stored.slots, selector),
        };

        state.mutations.push(match &edit.change {
            SlotChange::Add(slot) => format!("POST availability {slot}"),
            SlotChange::Remove(selector) => format!("DELETE availability {selector}"),
        });
        stored.slots = slots;
        stored.revision += 1;
        Ok(stored.snapshot())
    }
}
