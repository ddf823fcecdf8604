//! Staff and owner workflows over the backend: decisions, meetings, availability and dashboards.

pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use router::application_router;
pub use service::{
    AdoptionDecision, CoordinationService, DecisionOutcome, MeetingOutcome, ServiceError,
};
