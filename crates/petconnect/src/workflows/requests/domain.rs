use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{AdoptionStatus, FosterStatus};
use crate::workflows::domain::{PetId, RequestId, UserRef};
use crate::workflows::listings::{deserialize_images, ImageRef};

/// Minimal pet snapshot embedded in adoption requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: PetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_images")]
    pub images: Vec<ImageRef>,
}

/// The pet an adoption request targets, populated or bare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PetRef {
    Id(PetId),
    Summary(PetSummary),
}

impl PetRef {
    pub fn id(&self) -> &PetId {
        match self {
            PetRef::Id(id) => id,
            PetRef::Summary(summary) => &summary.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PetRef::Id(_) => None,
            PetRef::Summary(summary) => summary.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingKind {
    #[serde(rename = "virtual")]
    Virtual,
    #[serde(rename = "in-person")]
    InPerson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    Completed,
}

/// Meeting attached to an adoption request once staff propose a date.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MeetingKind>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MeetingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// A formal application to permanently adopt a shelter pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionRequest {
    #[serde(rename = "_id", alias = "id")]
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet: Option<PetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adopter: Option<UserRef>,
    pub status: AdoptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<MeetingInfo>,
}

impl AdoptionRequest {
    pub fn new(id: impl Into<String>, status: AdoptionStatus) -> Self {
        Self {
            id: RequestId(id.into()),
            pet: None,
            adopter: None,
            status,
            meeting: None,
        }
    }

    pub fn meeting_date(&self) -> Option<DateTime<Utc>> {
        self.meeting.as_ref().and_then(|meeting| meeting.date)
    }
}

/// An application to temporarily house a personally listed pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FosterRequest {
    #[serde(rename = "_id", alias = "id")]
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet: Option<PetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: FosterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_thread: Option<String>,
}

impl FosterRequest {
    pub fn new(id: impl Into<String>, status: FosterStatus) -> Self {
        Self {
            id: RequestId(id.into()),
            pet: None,
            user: None,
            message: None,
            status,
            submitted_at: None,
            chat_thread: None,
        }
    }
}
