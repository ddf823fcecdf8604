//! Identifiers and people shared by every workflow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend identifier of an adoption or foster request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Backend identifier of a pet, shelter-listed or personal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PetId(pub String);

/// Backend identifier of a platform user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Adopter,
    Vet,
    Staff,
    Trainer,
    Admin,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Adopter => "adopter",
            UserRole::Vet => "vet",
            UserRole::Staff => "staff",
            UserRole::Trainer => "trainer",
            UserRole::Admin => "admin",
        }
    }

    /// Roles allowed to decide on shelter adoption requests.
    pub const fn reviews_adoptions(self) -> bool {
        matches!(self, UserRole::Staff | UserRole::Admin)
    }
}

/// Snapshot of the signed-in user as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub adoption_status: Option<String>,
}

impl UserProfile {
    /// Profiles missing a name or location must finish setup first.
    pub fn is_incomplete(&self) -> bool {
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        blank(&self.name) || blank(&self.location)
    }
}

/// A user reference that the backend either populates or leaves as a bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(UserId),
    Summary(UserSummary),
}

impl UserRef {
    pub fn id(&self) -> Option<&UserId> {
        match self {
            UserRef::Id(id) => Some(id),
            UserRef::Summary(summary) => summary.id.as_ref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            UserRef::Id(_) => None,
            UserRef::Summary(summary) => summary.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ref_accepts_bare_and_populated_shapes() {
        let bare: UserRef = serde_json::from_str("\"u-1\"").expect("bare id");
        assert_eq!(bare.id(), Some(&UserId("u-1".to_string())));

        let populated: UserRef =
            serde_json::from_str(r#"{"_id":"u-2","name":"Rin","email":"rin@example.org"}"#)
                .expect("populated user");
        assert_eq!(populated.id(), Some(&UserId("u-2".to_string())));
        assert_eq!(populated.name(), Some("Rin"));
    }

    #[test]
    fn profile_is_incomplete_without_location() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"_id":"u-1","email":"a@example.org","role":"adopter","name":"Ada","location":"  "}"#,
        )
        .expect("profile");
        assert!(profile.is_incomplete());
        assert!(!profile.role.reviews_adoptions());
    }
}
