//! Boundary to the PetConnect REST backend.
//!
//! The backend owns every entity; this module only reads collections and
//! submits mutations on behalf of an explicitly passed [`Session`].

pub mod http;
pub mod memory;
pub mod normalize;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::availability::{AvailabilitySlot, AvailabilitySnapshot, SlotSelector};
use crate::workflows::domain::{PetId, RequestId, UserProfile};
use crate::workflows::listings::Listing;
use crate::workflows::requests::{AdoptionPatch, AdoptionRequest, FosterAction};

pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// Auth token plus the user it belongs to, handed to every backend call.
#[derive(Clone)]
pub struct Session {
    token: String,
    user: Option<UserProfile>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.user = Some(user);
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user.as_ref().map(|user| &user.id))
            .finish()
    }
}

/// Whose adoption requests to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Every request against the staff member's organization.
    Staff,
    /// Requests submitted by the signed-in adopter.
    Mine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetScope {
    Organization,
    Shelter,
    Personal,
    MyListings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FosterActionReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_thread: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotChange {
    Add(AvailabilitySlot),
    Remove(SlotSelector),
}

/// One incremental availability change, checked against the revision it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityEdit {
    pub base_revision: Option<String>,
    pub change: SlotChange,
    /// Slot list after applying `change` locally.
    pub resulting: Vec<AvailabilitySlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("session is missing or expired: {0}")]
    Unauthorized(String),
    #[error("not allowed: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflicting update: {0}")]
    Conflict(String),
    #[error("backend rejected the call ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("unexpected backend payload: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 | 412 => Self::Conflict(message),
            _ => Self::Rejected { status, message },
        }
    }

    /// The only failure with a recovery path: send the user back to sign in.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[async_trait]
pub trait PetConnectBackend: Send + Sync {
    async fn current_user(&self, session: &Session) -> Result<UserProfile, BackendError>;

    async fn adoption_requests(
        &self,
        session: &Session,
        scope: RequestScope,
    ) -> Result<Vec<AdoptionRequest>, BackendError>;

    async fn update_adoption_status(
        &self,
        session: &Session,
        id: &RequestId,
        patch: &AdoptionPatch,
    ) -> Result<AdoptionRequest, BackendError>;

    async fn pets(&self, session: &Session, scope: PetScope) -> Result<Vec<Listing>, BackendError>;

    async fn update_pet_status(
        &self,
        session: &Session,
        pet: &PetId,
        status: &str,
    ) -> Result<Listing, BackendError>;

    async fn apply_foster_action(
        &self,
        session: &Session,
        pet: &PetId,
        request: &RequestId,
        action: FosterAction,
    ) -> Result<FosterActionReceipt, BackendError>;

    async fn availability(&self, session: &Session) -> Result<AvailabilitySnapshot, BackendError>;

    /// Submit one change; a stale `base_revision` fails with [`BackendError::Conflict`].
    async fn edit_availability(
        &self,
        session: &Session,
        edit: &AvailabilityEdit,
    ) -> Result<AvailabilitySnapshot, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_debug_hides_token() {
        let session = Session::new("secret-token");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert!(BackendError::from_status(401, "expired").requires_login());
        assert!(matches!(BackendError::from_status(409, "stale"), BackendError::Conflict(_)));
        assert!(matches!(
            BackendError::from_status(500, "boom"),
            BackendError::Rejected { status: 500, .. }
        ));
        assert!(!BackendError::from_status(403, "nope").requires_login());
    }
}
