use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::SlotError;

/// Backend identifier of a stored availability slot, when the backend returns one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub String);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A staff member's declared window for meetings, weekly or on a concrete date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SlotId>,
    #[serde(with = "weekday_name")]
    pub day: Weekday,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    #[serde(default, with = "slot_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl AvailabilitySlot {
    pub fn weekly(day: Weekday, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: None,
            day,
            start_time,
            end_time,
            date: None,
        }
    }

    pub fn on_date(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: None,
            day: date.weekday(),
            start_time,
            end_time,
            date: Some(date),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(SlotId(id.into()));
        self
    }

    /// Build a weekly slot from form input such as `("Monday", "09:00", "17:00")`.
    pub fn parse(day: &str, start_time: &str, end_time: &str) -> Result<Self, SlotError> {
        let day = parse_day(day)?;
        let start_time = clock_time::parse(start_time).map_err(SlotError::malformed)?;
        let end_time = clock_time::parse(end_time).map_err(SlotError::malformed)?;
        Ok(Self::weekly(day, start_time, end_time))
    }

    pub fn validate(&self) -> Result<(), SlotError> {
        if self.start_time >= self.end_time {
            return Err(SlotError::malformed(format!(
                "start {} must precede end {}",
                self.start_time.format(clock_time::FORMAT),
                self.end_time.format(clock_time::FORMAT)
            )));
        }

        if let Some(date) = self.date {
            if date.weekday() != self.day {
                return Err(SlotError::malformed(format!(
                    "{date} is a {}, not a {}",
                    weekday_name::full(date.weekday()),
                    weekday_name::full(self.day)
                )));
            }
        }

        Ok(())
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes().max(0)
    }

    /// Dated slots only collide with the same date; weekly slots recur on their day.
    pub fn shares_day_with(&self, other: &AvailabilitySlot) -> bool {
        match (self.date, other.date) {
            (Some(left), Some(right)) => left == right,
            _ => self.day == other.day,
        }
    }

    /// Half-open interval overlap on the same day or date.
    pub fn overlaps(&self, other: &AvailabilitySlot) -> bool {
        self.shares_day_with(other)
            && self.start_time < other.end_time
            && self.end_time > other.start_time
    }

    /// Whether a meeting starting at `date`/`time` falls inside this window.
    pub fn covers(&self, date: NaiveDate, time: NaiveTime) -> bool {
        let day_matches = match self.date {
            Some(slot_date) => slot_date == date,
            None => self.day == date.weekday(),
        };
        day_matches && self.start_time <= time && time < self.end_time
    }

    pub fn matches(&self, selector: &SlotSelector) -> bool {
        match selector {
            SlotSelector::Id(id) => self.id.as_ref() == Some(id),
            SlotSelector::Window {
                day,
                start_time,
                end_time,
                date,
            } => {
                self.day == *day
                    && self.start_time == *start_time
                    && self.end_time == *end_time
                    && self.date == *date
            }
        }
    }
}

impl fmt::Display for AvailabilitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            weekday_name::full(self.day),
            self.start_time.format(clock_time::FORMAT),
            self.end_time.format(clock_time::FORMAT)
        )?;
        if let Some(date) = self.date {
            write!(f, " on {date}")?;
        }
        Ok(())
    }
}

/// How a caller names the slot to delete.
///
/// A window names a dated slot only together with its date, and a weekly
/// slot only without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSelector {
    Id(SlotId),
    Window {
        day: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
        date: Option<NaiveDate>,
    },
}

impl SlotSelector {
    /// Prefer the backend id; fall back to the full window when none was returned.
    pub fn for_slot(slot: &AvailabilitySlot) -> Self {
        match &slot.id {
            Some(id) => SlotSelector::Id(id.clone()),
            None => SlotSelector::Window {
                day: slot.day,
                start_time: slot.start_time,
                end_time: slot.end_time,
                date: slot.date,
            },
        }
    }

    /// Query pairs for `DELETE /auth/staff/availability`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            SlotSelector::Id(id) => vec![("id", id.0.clone())],
            SlotSelector::Window {
                day,
                start_time,
                end_time,
                date,
            } => {
                let mut pairs = vec![
                    ("day", weekday_name::full(*day).to_string()),
                    ("startTime", start_time.format(clock_time::FORMAT).to_string()),
                    ("endTime", end_time.format(clock_time::FORMAT).to_string()),
                ];
                if let Some(date) = date {
                    pairs.push(("date", date.format(slot_date::FORMAT).to_string()));
                }
                pairs
            }
        }
    }
}

impl fmt::Display for SlotSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSelector::Id(id) => write!(f, "slot {id}"),
            SlotSelector::Window {
                day,
                start_time,
                end_time,
                date,
            } => {
                write!(
                    f,
                    "{} {}-{}",
                    weekday_name::full(*day),
                    start_time.format(clock_time::FORMAT),
                    end_time.format(clock_time::FORMAT)
                )?;
                if let Some(date) = date {
                    write!(f, " on {date}")?;
                }
                Ok(())
            }
        }
    }
}

pub fn parse_day(raw: &str) -> Result<Weekday, SlotError> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| SlotError::malformed(format!("'{raw}' is not a day of the week")))
}

/// `HH:mm` wire format for slot boundaries.
pub(crate) mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        let trimmed = raw.trim();
        NaiveTime::parse_from_str(trimmed, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| format!("'{raw}' is not a HH:mm time"))
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Full English day names (`"Monday"`), as the scheduling form sends them.
pub mod weekday_name {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const fn full(day: Weekday) -> &'static str {
        match day {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    pub fn serialize<S>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(full(*day))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Weekday, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse::<Weekday>()
            .map_err(|_| serde::de::Error::custom(format!("'{raw}' is not a day of the week")))
    }

    pub mod option {
        use chrono::Weekday;
        use serde::Serializer;

        pub fn serialize<S>(day: &Option<Weekday>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match day {
                Some(day) => serializer.serialize_some(super::full(*day)),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Optional concrete date; accepts bare dates and full ISO timestamps.
pub(crate) mod slot_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    /// `YYYY-MM-DD`, or the date part of an ISO timestamp.
    pub fn parse(raw: &str) -> Result<NaiveDate, String> {
        let value = raw.trim();
        let date_part = value.get(..10).unwrap_or(value);
        NaiveDate::parse_from_str(date_part, FORMAT).map_err(|_| format!("'{value}' is not a date"))
    }

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.collect_str(&date.format(FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse(value).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(raw: &str) -> NaiveTime {
        clock_time::parse(raw).expect("valid time")
    }

    #[test]
    fn decodes_form_shape() {
        let slot: AvailabilitySlot = serde_json::from_str(
            r#"{"day":"Monday","startTime":"09:00","endTime":"17:00","date":"2025-11-03T00:00:00.000Z"}"#,
        )
        .expect("slot decodes");
        assert_eq!(slot.day, Weekday::Mon);
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2025, 11, 3));
        assert!(slot.validate().is_ok());

        let encoded = serde_json::to_value(&slot).expect("encode");
        assert_eq!(encoded["startTime"], "09:00");
        assert_eq!(encoded["day"], "Monday");
        assert_eq!(encoded["date"], "2025-11-03");
    }

    #[test]
    fn rejects_inverted_and_empty_windows() {
        let inverted = AvailabilitySlot::weekly(Weekday::Tue, time("12:00"), time("09:00"));
        assert!(matches!(inverted.validate(), Err(SlotError::Malformed { .. })));

        let empty = AvailabilitySlot::weekly(Weekday::Tue, time("09:00"), time("09:00"));
        assert!(empty.validate().is_err());
    }

    #[test]
    fn rejects_date_on_wrong_weekday() {
        let mut slot = AvailabilitySlot::on_date(
            NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid"),
            time("09:00"),
            time("10:00"),
        );
        slot.day = Weekday::Fri;
        let err = slot.validate().expect_err("mismatched date");
        assert!(err.to_string().contains("not a Friday"));
    }

    #[test]
    fn adjacent_windows_do_not_overlap() {
        let morning = AvailabilitySlot::weekly(Weekday::Mon, time("09:00"), time("12:00"));
        let afternoon = AvailabilitySlot::weekly(Weekday::Mon, time("12:00"), time("15:00"));
        assert!(!morning.overlaps(&afternoon));
        assert!(!afternoon.overlaps(&morning));
    }

    #[test]
    fn dated_slots_only_collide_on_the_same_date() {
        let first = AvailabilitySlot::on_date(
            NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid"),
            time("09:00"),
            time("12:00"),
        );
        let next_week = AvailabilitySlot::on_date(
            NaiveDate::from_ymd_opt(2025, 11, 10).expect("valid"),
            time("10:00"),
            time("11:00"),
        );
        let weekly = AvailabilitySlot::weekly(Weekday::Mon, time("11:00"), time("13:00"));
        assert!(!first.overlaps(&next_week));
        assert!(first.overlaps(&weekly));
    }

    #[test]
    fn parse_rejects_bad_form_input() {
        assert!(AvailabilitySlot::parse("Funday", "09:00", "10:00").is_err());
        assert!(AvailabilitySlot::parse("Monday", "9am", "10:00").is_err());
        let slot = AvailabilitySlot::parse("friday", "08:30", "09:15").expect("parses");
        assert_eq!(slot.duration_minutes(), 45);
        assert_eq!(slot.to_string(), "Friday 08:30-09:15");
    }

    #[test]
    fn selector_prefers_id_and_falls_back_to_window() {
        let anonymous = AvailabilitySlot::weekly(Weekday::Wed, time("09:00"), time("10:00"));
        let selector = SlotSelector::for_slot(&anonymous);
        assert_eq!(
            selector.query_pairs(),
            vec![
                ("day", "Wednesday".to_string()),
                ("startTime", "09:00".to_string()),
                ("endTime", "10:00".to_string()),
            ]
        );

        let stored = anonymous.clone().with_id("slot-1");
        assert_eq!(
            SlotSelector::for_slot(&stored),
            SlotSelector::Id(SlotId("slot-1".to_string()))
        );
        assert!(!stored.matches(&SlotSelector::Id(SlotId("slot-2".to_string()))));
    }

    #[test]
    fn dated_selector_carries_its_date() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 10).expect("valid");
        let dated = AvailabilitySlot::on_date(date, time("09:00"), time("10:00"));
        let selector = SlotSelector::for_slot(&dated);

        assert_eq!(
            selector.query_pairs().last(),
            Some(&("date", "2025-11-10".to_string()))
        );
        assert_eq!(selector.to_string(), "Monday 09:00-10:00 on 2025-11-10");
        assert!(dated.matches(&selector));

        let earlier = AvailabilitySlot::on_date(
            NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid"),
            time("09:00"),
            time("10:00"),
        );
        assert!(!earlier.matches(&selector));
        assert_eq!(slot_date::parse("2025-11-10T00:00:00.000Z"), Ok(date));
    }
}
