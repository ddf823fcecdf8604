//! Pet listings posted either by a shelter organization or by an individual owner.

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{PetId, UserId, UserRef};
use super::requests::domain::FosterRequest;

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

/// Image entries arrive either as plain URLs or as `{url, isPrimary}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
        #[serde(rename = "isPrimary", default)]
        is_primary: bool,
    },
}

impl ImageRef {
    pub fn url(&self) -> Option<&str> {
        let url = match self {
            ImageRef::Url(url) => Some(url.as_str()),
            ImageRef::Object { url, .. } => url.as_deref(),
        };
        url.filter(|url| !url.is_empty())
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, ImageRef::Object { is_primary: true, .. })
    }
}

/// Pick the image a card should show: the flagged primary, then any URL, then the placeholder.
pub fn primary_image(images: &[ImageRef]) -> &str {
    images
        .iter()
        .find(|image| image.is_primary() && image.url().is_some())
        .or_else(|| images.iter().find(|image| image.url().is_some()))
        .and_then(ImageRef::url)
        .unwrap_or(PLACEHOLDER_IMAGE)
}

pub(crate) fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<ImageRef>>>::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().into_iter().flatten().collect())
}

pub(crate) fn deserialize_nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrganizationRef {
    Id(String),
    Summary {
        #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

/// Who posted a listing. Exactly one of organization or personal owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poster {
    Organization(OrganizationRef),
    Owner(UserRef),
}

impl Poster {
    pub fn owner_id(&self) -> Option<&UserId> {
        match self {
            Poster::Owner(owner) => owner.id(),
            Poster::Organization(_) => None,
        }
    }

    pub fn is_personal(&self) -> bool {
        matches!(self, Poster::Owner(_))
    }
}

/// A pet listing with its poster and, for personal listings, the foster requests against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ListingWire", into = "ListingWire")]
pub struct Listing {
    pub id: PetId,
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<f32>,
    pub gender: Option<String>,
    pub status: Option<String>,
    pub images: Vec<ImageRef>,
    pub poster: Poster,
    pub trainer: Option<UserRef>,
    pub vet: Option<UserRef>,
    pub foster_requests: Vec<FosterRequest>,
}

impl Listing {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Pet")
    }

    pub fn status_key(&self) -> String {
        self.status
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    pub fn primary_image(&self) -> &str {
        primary_image(&self.images)
    }

    pub fn pending_foster_requests(&self) -> usize {
        self.foster_requests
            .iter()
            .filter(|request| request.status == super::requests::FosterStatus::Pending)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingWire {
    #[serde(rename = "_id", alias = "id")]
    id: PetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_images")]
    images: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    organization: Option<OrganizationRef>,
    #[serde(default, alias = "listedBy", skip_serializing_if = "Option::is_none")]
    owner: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trainer: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vet: Option<UserRef>,
    #[serde(default, deserialize_with = "deserialize_nullable_vec")]
    foster_requests: Vec<FosterRequest>,
}

impl TryFrom<ListingWire> for Listing {
    type Error = String;

    fn try_from(wire: ListingWire) -> Result<Self, Self::Error> {
        let poster = match (wire.organization, wire.owner) {
            (Some(organization), None) => Poster::Organization(organization),
            (None, Some(owner)) => Poster::Owner(owner),
            (Some(_), Some(_)) => {
                return Err(format!(
                    "listing {} names both an organization and a personal owner",
                    wire.id
                ))
            }
            (None, None) => return Err(format!("listing {} has no poster", wire.id)),
        };

        Ok(Listing {
            id: wire.id,
            name: wire.name,
            breed: wire.breed,
            age: wire.age,
            gender: wire.gender,
            status: wire.status,
            images: wire.images,
            poster,
            trainer: wire.trainer,
            vet: wire.vet,
            foster_requests: wire.foster_requests,
        })
    }
}

impl From<Listing> for ListingWire {
    fn from(listing: Listing) -> Self {
        let (organization, owner) = match listing.poster {
            Poster::Organization(organization) => (Some(organization), None),
            Poster::Owner(owner) => (None, Some(owner)),
        };

        ListingWire {
            id: listing.id,
            name: listing.name,
            breed: listing.breed,
            age: listing.age,
            gender: listing.gender,
            status: listing.status,
            images: listing.images,
            organization,
            owner,
            trainer: listing.trainer,
            vet: listing.vet,
            foster_requests: listing.foster_requests,
        }
    }
}
