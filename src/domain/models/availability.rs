use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub const DEFAULT_SLOT_DURATION_MIN: i64 = 30;
pub const DEFAULT_OPEN_TIME: &str = "09:00";
pub const DEFAULT_CLOSE_TIME: &str = "17:00";

/// Key used for a weekday in the stored `businessHours` map.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn parse_weekday(raw: &str) -> Result<Weekday, AppError> {
    raw.trim().parse::<Weekday>()
        .map_err(|_| AppError::Validation(format!("Unknown weekday '{}'", raw)))
}

/// Wall-clock `HH:MM`, no timezone.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| AppError::MalformedTimeValue(format!("'{}' is not a HH:MM time", raw)))
}

pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub weekday: Weekday,
    pub enabled: bool,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

impl DayHours {
    /// Fallback for a weekday with no usable stored entry.
    pub fn closed(weekday: Weekday) -> Self {
        Self {
            weekday,
            enabled: false,
            open_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedDate {
    pub date: NaiveDate,
    pub reason: String,
}

/// A bookable start time on a concrete calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl TimeSlot {
    /// Layout of the stored `timeSlot` string, e.g. `2025-12-08 10:00 AM`.
    pub const STORAGE_FORMAT: &'static str = "%Y-%m-%d %I:%M %p";

    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn clock_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    pub fn display_label(&self) -> String {
        self.time.format("%I:%M %p").to_string()
    }

    pub fn to_storage_string(&self) -> String {
        self.starts_at().format(Self::STORAGE_FORMAT).to_string()
    }

    /// Parses the stored compound form. Anything after the period marker is ignored.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(AppError::MalformedTimeValue(format!("'{}' is not a 'YYYY-MM-DD h:mm AM' slot", raw)));
        }

        let joined = format!("{} {} {}", parts[0], parts[1], parts[2]);
        let dt = NaiveDateTime::parse_from_str(&joined, Self::STORAGE_FORMAT)
            .map_err(|_| AppError::MalformedTimeValue(format!("'{}' is not a 'YYYY-MM-DD h:mm AM' slot", raw)))?;

        Ok(Self { date: dt.date(), time: dt.time() })
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage_string())
    }
}

// ── Stored document shape (`settings/availability`) ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayHoursEntry {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_open_time")]
    pub start_time: String,
    #[serde(default = "default_close_time")]
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockedDateEntry {
    #[serde(default = "default_block_reason")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDocument {
    #[serde(default)]
    pub business_hours: BTreeMap<String, DayHoursEntry>,
    #[serde(default)]
    pub blocked_dates: BTreeMap<String, BlockedDateEntry>,
    #[serde(default)]
    pub slot_duration: Option<i64>,
}

fn default_open_time() -> String {
    DEFAULT_OPEN_TIME.to_string()
}

fn default_close_time() -> String {
    DEFAULT_CLOSE_TIME.to_string()
}

fn default_block_reason() -> String {
    "Blocked".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_slot_parse_and_format() {
        let slot = TimeSlot::parse("2025-12-08 10:00 AM").unwrap();
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2025, 12, 8).unwrap());
        assert_eq!(slot.clock_label(), "10:00");
        assert_eq!(slot.to_storage_string(), "2025-12-08 10:00 AM");

        let afternoon = TimeSlot::parse("2025-12-08 2:30 PM").unwrap();
        assert_eq!(afternoon.clock_label(), "14:30");
        assert_eq!(afternoon.display_label(), "02:30 PM");

        let trailing = TimeSlot::parse("2025-12-08 09:00 AM (walk-in)").unwrap();
        assert_eq!(trailing.clock_label(), "09:00");
    }

    #[test]
    fn test_time_slot_rejects_garbage() {
        assert!(matches!(TimeSlot::parse("tomorrow"), Err(AppError::MalformedTimeValue(_))));
        assert!(matches!(TimeSlot::parse("2025-12-08 10:00"), Err(AppError::MalformedTimeValue(_))));
        assert!(matches!(TimeSlot::parse("2025-13-08 10:00 AM"), Err(AppError::MalformedTimeValue(_))));
        assert!(matches!(TimeSlot::parse("2025-12-08 25:00 PM"), Err(AppError::MalformedTimeValue(_))));
    }

    #[test]
    fn test_clock_time_and_weekday_parsing() {
        assert_eq!(parse_clock_time("08:30").unwrap(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(matches!(parse_clock_time("8h30"), Err(AppError::MalformedTimeValue(_))));
        assert_eq!(parse_weekday("saturday").unwrap(), Weekday::Sat);
        assert_eq!(parse_weekday("Monday").unwrap(), Weekday::Mon);
        assert!(parse_weekday("Someday").is_err());
    }

    #[test]
    fn test_document_tolerates_extra_fields() {
        let raw = r#"{
            "businessHours": { "Saturday": { "enabled": true, "startTime": "08:00", "endTime": "18:00", "slotDuration": 30 } },
            "blockedDates": { "2025-12-25": {} },
            "slotDuration": 45,
            "owner": "someone else"
        }"#;
        let doc: AvailabilityDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.slot_duration, Some(45));
        assert!(doc.business_hours["Saturday"].enabled);
        assert_eq!(doc.blocked_dates["2025-12-25"].reason, "Blocked");
    }
}
