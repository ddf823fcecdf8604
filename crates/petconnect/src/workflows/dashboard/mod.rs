//! Read-only projections behind the staff and adopter dashboards.
//!
//! Every projection is recomputed from the fetched collections; inputs are never mutated.

pub mod counts;
pub mod labels;
pub mod views;

pub use counts::{
    adopter_display_status, adoption_counts, browse_listings, foster_counts, listing_stats,
    listings_with_pending_requests, FosterTab, ListingStats, RequestCounts,
};
pub use labels::{status_badge, status_label, BadgeColor, StatusBadge, StatusDomain};
pub use views::{
    AdopterDashboard, AdopterSources, AdoptionRequestView, AvailabilityView, FosterRequestView,
    ListingCard, StaffDashboard,
};
