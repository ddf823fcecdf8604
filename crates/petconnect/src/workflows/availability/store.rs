use std::collections::HashMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::slot::{weekday_name, AvailabilitySlot, SlotSelector};
use super::SlotError;

/// Slot list as last read from the backend, stamped with the revision it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    pub slots: Vec<AvailabilitySlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl AvailabilitySnapshot {
    pub fn new(slots: Vec<AvailabilitySlot>, revision: Option<String>) -> Self {
        Self { slots, revision }
    }

    pub fn summary(&self) -> AvailabilitySummary {
        summarize(&self.slots)
    }
}

/// Append `candidate` after validating it and checking it against same-day slots.
pub fn add_slot(
    existing: &[AvailabilitySlot],
    candidate: AvailabilitySlot,
) -> Result<Vec<AvailabilitySlot>, SlotError> {
    candidate.validate()?;

    if let Some(conflicting) = existing.iter().find(|slot| candidate.overlaps(slot)) {
        return Err(SlotError::Overlap {
            candidate: Box::new(candidate),
            conflicting: Box::new(conflicting.clone()),
        });
    }

    let mut slots = existing.to_vec();
    slots.push(candidate);
    Ok(slots)
}

/// Drop every slot matching `selector`, keeping the remaining order.
pub fn remove_slot(existing: &[AvailabilitySlot], selector: &SlotSelector) -> Vec<AvailabilitySlot> {
    existing
        .iter()
        .filter(|slot| !slot.matches(selector))
        .cloned()
        .collect()
}

/// Like [`remove_slot`] but reports a selector that matched nothing.
pub fn remove_existing_slot(
    existing: &[AvailabilitySlot],
    selector: &SlotSelector,
) -> Result<Vec<AvailabilitySlot>, SlotError> {
    let remaining = remove_slot(existing, selector);
    if remaining.len() == existing.len() {
        return Err(SlotError::NotFound(selector.clone()));
    }
    Ok(remaining)
}

pub fn total_minutes(slots: &[AvailabilitySlot]) -> i64 {
    slots.iter().map(AvailabilitySlot::duration_minutes).sum()
}

pub fn total_hours(slots: &[AvailabilitySlot]) -> f64 {
    total_minutes(slots) as f64 / 60.0
}

/// Day with the most slots; ties go to the earlier weekday, Monday first.
pub fn busiest_day(slots: &[AvailabilitySlot]) -> Option<Weekday> {
    let mut counts: HashMap<Weekday, usize> = HashMap::new();
    for slot in slots {
        *counts.entry(slot.day).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(left_day, left), (right_day, right)| {
            left.cmp(right).then_with(|| {
                right_day
                    .num_days_from_monday()
                    .cmp(&left_day.num_days_from_monday())
            })
        })
        .map(|(day, _)| day)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilitySummary {
    pub slot_count: usize,
    pub total_minutes: i64,
    pub total_hours: f64,
    #[serde(serialize_with = "weekday_name::option::serialize")]
    pub busiest_day: Option<Weekday>,
}

pub fn summarize(slots: &[AvailabilitySlot]) -> AvailabilitySummary {
    AvailabilitySummary {
        slot_count: slots.len(),
        total_minutes: total_minutes(slots),
        total_hours: total_hours(slots),
        busiest_day: busiest_day(slots),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn slot(day: Weekday, start: &str, end: &str) -> AvailabilitySlot {
        let parse = |raw: &str| NaiveTime::parse_from_str(raw, "%H:%M").expect("valid time");
        AvailabilitySlot::weekly(day, parse(start), parse(end))
    }

    #[test]
    fn overlapping_candidate_names_existing_slot() {
        let existing = vec![slot(Weekday::Mon, "09:00", "17:00")];
        let err = add_slot(&existing, slot(Weekday::Mon, "10:00", "11:00")).expect_err("overlap");
        match err {
            SlotError::Overlap { conflicting, .. } => {
                assert_eq!(*conflicting, existing[0]);
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn overlap_rule_matches_interval_test() {
        let times = ["08:00", "09:00", "10:00", "11:00", "12:00"];
        for (i, a_start) in times.iter().enumerate() {
            for a_end in &times[i + 1..] {
                for (j, b_start) in times.iter().enumerate() {
                    for b_end in &times[j + 1..] {
                        let a = slot(Weekday::Thu, a_start, a_end);
                        let b = slot(Weekday::Thu, b_start, b_end);
                        let expected_overlap =
                            a.start_time < b.end_time && b.start_time < a.end_time;
                        let result = add_slot(std::slice::from_ref(&a), b.clone());
                        assert_eq!(
                            result.is_err(),
                            expected_overlap,
                            "a={a} b={b}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn different_days_never_conflict() {
        let existing = vec![slot(Weekday::Mon, "09:00", "17:00")];
        let slots = add_slot(&existing, slot(Weekday::Tue, "09:00", "17:00")).expect("no overlap");
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn malformed_slot_is_rejected_before_overlap_check() {
        let existing = vec![slot(Weekday::Mon, "09:00", "17:00")];
        let err = add_slot(&existing, slot(Weekday::Mon, "11:00", "10:00")).expect_err("malformed");
        assert!(matches!(err, SlotError::Malformed { .. }));
    }

    #[test]
    fn add_then_remove_restores_original_order() {
        let original = vec![
            slot(Weekday::Mon, "09:00", "10:00"),
            slot(Weekday::Wed, "13:00", "15:00"),
        ];
        let candidate = slot(Weekday::Mon, "10:00", "11:00");
        let added = add_slot(&original, candidate.clone()).expect("added");
        assert_eq!(added.last(), Some(&candidate));

        let restored = remove_slot(&added, &SlotSelector::for_slot(&candidate));
        assert_eq!(restored, original);
    }

    #[test]
    fn window_removal_only_drops_the_exact_window() {
        let slots = vec![
            slot(Weekday::Fri, "09:00", "10:00"),
            slot(Weekday::Fri, "14:00", "16:00"),
        ];
        let remaining = remove_slot(&slots, &SlotSelector::for_slot(&slots[1]));
        assert_eq!(remaining, vec![slots[0].clone()]);

        let missing = SlotSelector::for_slot(&slot(Weekday::Sat, "09:00", "10:00"));
        assert!(matches!(
            remove_existing_slot(&slots, &missing),
            Err(SlotError::NotFound(_))
        ));
    }

    #[test]
    fn removing_a_dated_window_keeps_other_dates() {
        let parse = |raw: &str| NaiveTime::parse_from_str(raw, "%H:%M").expect("valid time");
        let on = |day: u32| {
            let date = chrono::NaiveDate::from_ymd_opt(2025, 11, day).expect("valid date");
            AvailabilitySlot::on_date(date, parse("09:00"), parse("10:00"))
        };
        let original = vec![on(3)];
        let candidate = on(10);

        let added = add_slot(&original, candidate.clone()).expect("different dates do not collide");
        assert_eq!(added.len(), 2);

        let restored = remove_slot(&added, &SlotSelector::for_slot(&candidate));
        assert_eq!(restored, original);

        let weekly = slot(Weekday::Mon, "09:00", "10:00");
        assert_eq!(remove_slot(&added, &SlotSelector::for_slot(&weekly)), added);
    }

    #[test]
    fn summary_reduces_slot_list() {
        let slots = vec![
            slot(Weekday::Tue, "09:00", "10:30"),
            slot(Weekday::Mon, "09:00", "10:00"),
            slot(Weekday::Tue, "13:00", "14:00"),
            slot(Weekday::Mon, "15:00", "15:30"),
        ];
        let summary = summarize(&slots);
        assert_eq!(summary.slot_count, 4);
        assert_eq!(summary.total_minutes, 240);
        assert!((summary.total_hours - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.busiest_day, Some(Weekday::Mon));

        let empty = summarize(&[]);
        assert_eq!(empty.busiest_day, None);
        assert_eq!(empty.total_minutes, 0);
    }
}
