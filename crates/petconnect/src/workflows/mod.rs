pub mod availability;
pub mod coordination;
pub mod dashboard;
pub mod domain;
pub mod listings;
pub mod requests;
pub mod scheduling;

pub use availability::{AvailabilitySlot, AvailabilitySnapshot, SlotError, SlotSelector};
pub use coordination::{application_router, CoordinationService, ServiceError};
pub use dashboard::{AdopterDashboard, FosterTab, StaffDashboard};
pub use domain::{PetId, RequestId, UserId, UserProfile, UserRole};
pub use listings::Listing;
pub use requests::{
    AdoptionRequest, AdoptionStatus, FosterRequest, FosterStatus, LifecycleError,
    RequestLifecycle, Transition,
};
pub use scheduling::{AvailabilityCoverage, MeetingScheduler};
