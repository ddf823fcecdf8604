//! Adoption and foster request vocabulary plus the lifecycle rules that move them.

pub mod domain;
pub mod lifecycle;
pub mod status;

pub use domain::{
    AdoptionRequest, FosterRequest, MeetingInfo, MeetingKind, MeetingStatus, PetRef, PetSummary,
};
pub use lifecycle::{
    parse_meeting_time, AdoptionPatch, FosterAction, LifecycleError, MeetingTimeProblem,
    RequestLifecycle, Transition,
};
pub use status::{can_transition, AdoptionStatus, FosterStatus, RequestKind};
