use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::normalize;
use super::{
    AvailabilityEdit, BackendError, FosterActionReceipt, PetConnectBackend, PetScope,
    RequestScope, Session, SlotChange,
};
use crate::config::BackendConfig;
use crate::workflows::availability::AvailabilitySnapshot;
use crate::workflows::domain::{PetId, RequestId, UserProfile};
use crate::workflows::listings::Listing;
use crate::workflows::requests::{AdoptionPatch, AdoptionRequest, FosterAction};

/// Header the backend reads the session token from.
pub const AUTH_HEADER: &str = "x-auth-token";

/// [`PetConnectBackend`] over the backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BackendError::Transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, BackendError> {
        let mut request = self
            .client
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .header(AUTH_HEADER, session.token());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        debug!(%method, path, status = %status, "backend response received");

        if !status.is_success() {
            let message =
                normalize::error_message(&text, status.canonical_reason().unwrap_or("request failed"));
            warn!(%method, path, status = %status, message = %message, "backend call failed");
            return Err(BackendError::from_status(status.as_u16(), message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|err| BackendError::Decode(err.to_string()))
    }

    async fn get(&self, session: &Session, path: &str) -> Result<Value, BackendError> {
        self.call(session, Method::GET, path, &[], None).await
    }

    /// Try each `(path, body)` in turn, moving on only while the backend answers 404.
    async fn call_first_found(
        &self,
        session: &Session,
        method: Method,
        candidates: Vec<(String, Option<Value>)>,
    ) -> Result<Value, BackendError> {
        let mut last = BackendError::NotFound("no endpoint to try".to_string());
        for (path, body) in candidates {
            match self.call(session, method.clone(), &path, &[], body).await {
                Err(BackendError::NotFound(message)) => {
                    debug!(%method, path, "endpoint missing, trying next route");
                    last = BackendError::NotFound(message);
                }
                other => return other,
            }
        }
        Err(last)
    }
}

fn pets_path(scope: PetScope) -> &'static str {
    match scope {
        PetScope::Organization => "/pets/organization",
        PetScope::Shelter => "/pets",
        PetScope::Personal => "/pet-files/listings",
        PetScope::MyListings => "/pet-files/my-listings/detailed",
    }
}

fn chat_thread(value: &Value) -> Option<String> {
    let lookup = |value: &Value| {
        ["chatThreadId", "chatId", "chatThread", "threadId"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .or_else(|| {
                value
                    .get("thread")
                    .or_else(|| value.get("chat"))
                    .and_then(|thread| thread.get("_id").or_else(|| thread.get("id")))
                    .and_then(Value::as_str)
            })
            .map(str::to_string)
    };
    lookup(value).or_else(|| value.get("data").and_then(lookup))
}

#[async_trait]
impl PetConnectBackend for HttpBackend {
    async fn current_user(&self, session: &Session) -> Result<UserProfile, BackendError> {
        normalize::entity(self.get(session, "/auth/me").await?)
    }

    async fn adoption_requests(
        &self,
        session: &Session,
        scope: RequestScope,
    ) -> Result<Vec<AdoptionRequest>, BackendError> {
        let path = match scope {
            RequestScope::Staff => "/adoptions/requests",
            RequestScope::Mine => "/adoptions/my-requests",
        };
        normalize::collection(self.get(session, path).await?)
    }

    async fn update_adoption_status(
        &self,
        session: &Session,
        id: &RequestId,
        patch: &AdoptionPatch,
    ) -> Result<AdoptionRequest, BackendError> {
        let body = serde_json::to_value(patch).map_err(|err| BackendError::Decode(err.to_string()))?;
        let path = format!("/adoptions/{id}/status");
        normalize::entity(self.call(session, Method::PATCH, &path, &[], Some(body)).await?)
    }

    async fn pets(&self, session: &Session, scope: PetScope) -> Result<Vec<Listing>, BackendError> {
        normalize::collection(self.get(session, pets_path(scope)).await?)
    }

    async fn update_pet_status(
        &self,
        session: &Session,
        pet: &PetId,
        status: &str,
    ) -> Result<Listing, BackendError> {
        let path = format!("/pets/{pet}/status");
        let body = json!({ "status": status });
        normalize::entity(self.call(session, Method::PATCH, &path, &[], Some(body)).await?)
    }

    async fn apply_foster_action(
        &self,
        session: &Session,
        pet: &PetId,
        request: &RequestId,
        action: FosterAction,
    ) -> Result<FosterActionReceipt, BackendError> {
        let response = match action {
            FosterAction::Approve | FosterAction::Reject => {
                let verb = if action == FosterAction::Approve { "approve" } else { "reject" };
                let body = json!({ "action": verb });
                let candidates = vec![
                    (format!("/pets/{pet}/foster-requests/{request}"), Some(body.clone())),
                    (format!("/pet-files/{pet}/foster-requests/{request}"), Some(body)),
                    (
                        format!("/foster-requests/{request}"),
                        Some(json!({ "status": action.target().as_str() })),
                    ),
                ];
                self.call_first_found(session, Method::PATCH, candidates).await?
            }
            FosterAction::StartDiscussion => {
                let candidates = vec![
                    (format!("/pet-files/{pet}/foster-requests/{request}/start-chat"), None),
                    (format!("/pets/{pet}/foster-requests/{request}/start-chat"), None),
                ];
                self.call_first_found(session, Method::POST, candidates).await?
            }
            FosterAction::ScheduleMeeting => {
                let path = format!("/pets/{pet}/foster-requests/{request}");
                let body = json!({ "status": action.target().as_str() });
                self.call(session, Method::PATCH, &path, &[], Some(body)).await?
            }
        };

        Ok(FosterActionReceipt {
            chat_thread: chat_thread(&response),
        })
    }

    async fn availability(&self, session: &Session) -> Result<AvailabilitySnapshot, BackendError> {
        normalize::availability_snapshot(self.get(session, "/auth/staff/availability").await?)
    }

    async fn edit_availability(
        &self,
        session: &Session,
        edit: &AvailabilityEdit,
    ) -> Result<AvailabilitySnapshot, BackendError> {
        let path = "/auth/staff/availability";
        let response = match &edit.change {
            SlotChange::Add(_) => {
                let body = json!({ "slots": edit.resulting, "revision": edit.base_revision });
                self.call(session, Method::POST, path, &[], Some(body)).await?
            }
            SlotChange::Remove(selector) => {
                let mut query = selector.query_pairs();
                if let Some(revision) = &edit.base_revision {
                    query.push(("revision", revision.clone()));
                }
                self.call(session, Method::DELETE, path, &query, None).await?
            }
        };

        match normalize::availability_snapshot(response) {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                debug!(error = %err, "availability write returned no slot list; keeping local result");
                Ok(AvailabilitySnapshot::new(edit.resulting.clone(), None))
            }
        }
    }
}
