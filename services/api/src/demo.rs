use crate::infra::{
    demo_backend, parse_offset, parse_slot, DEMO_ADOPTER_TOKEN, DEMO_OWNER_TOKEN,
    DEMO_STAFF_TOKEN,
};
use chrono::{Datelike, Duration, FixedOffset, Utc};
use clap::Args;
use petconnect::backend::MemoryBackend;
use petconnect::error::AppError;
use petconnect::workflows::availability::slot::weekday_name;
use petconnect::workflows::availability::{self, AvailabilitySlot, AvailabilitySummary};
use petconnect::workflows::coordination::AdoptionDecision;
use petconnect::workflows::dashboard::views::{AdopterDashboard, StaffDashboard};
use petconnect::workflows::requests::FosterAction;
use petconnect::workflows::{
    CoordinationService, FosterTab, MeetingScheduler, PetId, RequestId, ServiceError,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub(crate) struct AvailabilityCheckArgs {
    /// Existing weekly slot, e.g. "Monday 09:00-12:00" (repeatable)
    #[arg(long = "slot", value_parser = parse_slot)]
    pub(crate) slots: Vec<AvailabilitySlot>,
    /// Slot to check against the existing ones
    #[arg(long, value_parser = parse_slot)]
    pub(crate) candidate: Option<AvailabilitySlot>,
    /// Meeting time to check for coverage (RFC 3339 or YYYY-MM-DDTHH:MM)
    #[arg(long)]
    pub(crate) meeting: Option<String>,
    /// Shelter offset from UTC in minutes, used to read slot days and times
    #[arg(long, default_value = "0", value_parser = parse_offset, allow_hyphen_values = true)]
    pub(crate) utc_offset_minutes: FixedOffset,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Meeting time to propose for the approved request (defaults to next Monday 10:00 UTC)
    #[arg(long)]
    pub(crate) meeting: Option<String>,
    /// Print the final dashboards as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_availability_check(args: AvailabilityCheckArgs) -> Result<(), AppError> {
    let AvailabilityCheckArgs {
        slots,
        candidate,
        meeting,
        utc_offset_minutes,
    } = args;

    let mut existing = Vec::with_capacity(slots.len());
    for slot in slots {
        existing = availability::add_slot(&existing, slot).map_err(ServiceError::from)?;
    }

    println!("{}", summary_line(&availability::summarize(&existing)));

    if let Some(candidate) = candidate {
        match availability::add_slot(&existing, candidate.clone()) {
            Ok(_) => println!("- {candidate} fits ({} min)", candidate.duration_minutes()),
            Err(err) => println!("- {candidate} rejected: {err}"),
        }
    }

    if let Some(meeting) = meeting {
        let scheduler = MeetingScheduler::new(utc_offset_minutes);
        let at = scheduler.parse_candidate(&meeting).map_err(ServiceError::from)?;
        let coverage = scheduler.coverage(at, &existing);
        match coverage.warning() {
            None => println!("- meeting at {at} is covered"),
            Some(warning) => println!("- meeting at {at}: {warning}"),
        }
    }

    Ok(())
}

fn summary_line(summary: &AvailabilitySummary) -> String {
    format!(
        "Availability: {} slots | {:.1} hours per week | busiest day {}",
        summary.slot_count,
        summary.total_hours,
        summary.busiest_day.map(weekday_name::full).unwrap_or("-")
    )
}

#[derive(Serialize)]
struct DemoDashboards {
    staff: StaffDashboard,
    adopter: AdopterDashboard,
    owner: AdopterDashboard,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let backend = Arc::new(demo_backend());
    let service = CoordinationService::new(backend.clone(), MeetingScheduler::default());
    let cancel = CancellationToken::new();

    let staff = service.open_session(DEMO_STAFF_TOKEN, &cancel).await?;
    let owner = service.open_session(DEMO_OWNER_TOKEN, &cancel).await?;
    let adopter = service.open_session(DEMO_ADOPTER_TOKEN, &cancel).await?;

    println!("PetConnect coordination demo");
    let before = service.staff_dashboard(&staff, &cancel).await?;
    println!(
        "- {} ({}) sees {} requests, {} awaiting review",
        before.staff_name,
        before.role_label,
        before.request_counts.total,
        before.request_counts.needs_review
    );

    println!("\nAdoption decisions");
    let approved = service
        .decide_adoption_by_id(
            &staff,
            &RequestId("adoption-1".to_string()),
            &AdoptionDecision::Approve,
            &cancel,
        )
        .await?;
    println!("- {} -> {}", approved.request.id, approved.request.status);

    let meeting = args.meeting.unwrap_or_else(next_monday_morning);
    match service
        .propose_meeting(&staff, &approved.request.id, &meeting, &cancel)
        .await
    {
        Ok(outcome) => {
            println!("- {} -> {} at {meeting}", outcome.request.id, outcome.request.status);
            if let Some(warning) = outcome.coverage.warning() {
                println!("  warning: {warning}");
            }
        }
        Err(err) => println!("- meeting not proposed: {err}"),
    }

    let ignored = service
        .decide_adoption_by_id(
            &staff,
            &RequestId("adoption-2".to_string()),
            &AdoptionDecision::Ignore,
            &cancel,
        )
        .await?;
    println!("- {} -> {}", ignored.request.id, ignored.request.status);

    println!("\nAvailability edits");
    for raw in ["Friday 10:00-12:00", "Monday 11:00-13:00"] {
        let slot = parse_slot(raw).map_err(AppError::Input)?;
        match service.add_availability(&staff, slot, &cancel).await {
            Ok(snapshot) => println!(
                "- added {raw}: {} slots at revision {}",
                snapshot.slots.len(),
                snapshot.revision.as_deref().unwrap_or("-")
            ),
            Err(err) => println!("- refused {raw}: {err}"),
        }
    }

    println!("\nFoster decisions");
    let pet = PetId("pet-pepper".to_string());
    for (request, action) in [
        ("foster-1", FosterAction::StartDiscussion),
        ("foster-1", FosterAction::Approve),
        ("foster-2", FosterAction::Reject),
    ] {
        let outcome = service
            .decide_foster(&owner, &pet, &RequestId(request.to_string()), action, &cancel)
            .await?;
        let thread = outcome
            .request
            .chat_thread
            .as_deref()
            .map(|thread| format!(" (chat {thread})"))
            .unwrap_or_default();
        println!("- {} -> {}{thread}", outcome.request.id, outcome.request.status);
    }

    let dashboards = DemoDashboards {
        staff: service.staff_dashboard(&staff, &cancel).await?,
        adopter: service
            .adopter_dashboard(&adopter, FosterTab::default(), &cancel)
            .await?,
        owner: service.adopter_dashboard(&owner, FosterTab::All, &cancel).await?,
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&dashboards)
            .map_err(|err| AppError::Input(format!("failed to render dashboards: {err}")))?;
        println!("{rendered}");
        return Ok(());
    }

    render_dashboards(&dashboards);
    render_mutations(&backend);
    Ok(())
}

fn next_monday_morning() -> String {
    let today = Utc::now().date_naive();
    let ahead = 7 - i64::from(today.weekday().num_days_from_monday());
    let monday = today + Duration::days(ahead);
    format!("{}T10:00", monday.format("%Y-%m-%d"))
}

fn render_dashboards(dashboards: &DemoDashboards) {
    let DemoDashboards {
        staff,
        adopter,
        owner,
    } = dashboards;

    println!("\nStaff dashboard");
    println!(
        "- {} total | {} pending | {} approved | {} rejected",
        staff.request_counts.total,
        staff.request_counts.pending,
        staff.request_counts.approved,
        staff.request_counts.rejected
    );
    for request in &staff.requests {
        println!(
            "  - {} {} [{}]",
            request.pet_name, request.adopter_name, request.status.label
        );
    }
    println!(
        "- availability: {} slots, {:.1} hours",
        staff.availability.summary.slot_count, staff.availability.summary.total_hours
    );

    println!("\nAdopter dashboard ({})", adopter.display_name);
    println!("- status: {}", adopter.display_status);
    println!("- {} pets to browse", adopter.browse.len());
    for card in &adopter.browse {
        println!("  - {} [{}]", card.name, card.status.label);
    }

    println!("\nOwner dashboard ({})", owner.display_name);
    println!(
        "- {} listings | {} available | {} pending requests",
        owner.listing_stats.total,
        owner.listing_stats.available,
        owner.listing_stats.pending_requests
    );
    for request in &owner.foster_requests {
        println!(
            "  - {} for {} [{}]",
            request.id, request.pet_name, request.status.label
        );
    }
}

fn render_mutations(backend: &MemoryBackend) {
    println!("\nBackend calls");
    for line in backend.mutations() {
        println!("- {line}");
    }
}
