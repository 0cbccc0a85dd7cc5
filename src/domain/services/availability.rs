use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::models::availability::{
    parse_calendar_date, parse_clock_time, parse_weekday, weekday_name, AvailabilityDocument,
    BlockedDate, BlockedDateEntry, DayHours, DayHoursEntry, TimeSlot, DEFAULT_SLOT_DURATION_MIN, WEEKDAYS,
};
use crate::domain::ports::AvailabilityRepository;
use crate::domain::services::live_sync::{spawn_refresh_loop, ListenerHandle};
use crate::error::AppError;

const MINUTES_PER_DAY: i64 = 1440;

/// Weekly opening hours, slot length and blocked days for one tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityModel {
    days: [DayHours; 7],
    slot_duration_min: i64,
    blocked: BTreeMap<NaiveDate, String>,
}

impl Default for AvailabilityModel {
    fn default() -> Self {
        Self {
            days: WEEKDAYS.map(DayHours::closed),
            slot_duration_min: DEFAULT_SLOT_DURATION_MIN,
            blocked: BTreeMap::new(),
        }
    }
}

impl AvailabilityModel {
    /// Builds a model from the stored document.
    ///
    /// Entries that fail to parse are skipped and returned so the caller can log them; the
    /// affected weekday falls back to closed.
    pub fn from_document(doc: &AvailabilityDocument) -> (Self, Vec<AppError>) {
        let mut model = Self::default();
        let mut rejected = Vec::new();

        for (key, entry) in &doc.business_hours {
            let parsed = parse_weekday(key).and_then(|weekday| {
                let open_time = parse_clock_time(&entry.start_time)?;
                let close_time = parse_clock_time(&entry.end_time)?;
                Ok(DayHours { weekday, enabled: entry.enabled, open_time, close_time })
            });

            match parsed {
                Ok(hours) => model.days[day_index(hours.weekday)] = hours,
                Err(e) => rejected.push(e),
            }
        }

        for (key, entry) in &doc.blocked_dates {
            match parse_calendar_date(key) {
                Ok(date) => {
                    model.blocked.insert(date, entry.reason.clone());
                }
                Err(e) => rejected.push(e),
            }
        }

        if let Some(duration) = doc.slot_duration {
            model.slot_duration_min = duration;
        }

        (model, rejected)
    }

    pub fn to_document(&self) -> AvailabilityDocument {
        let business_hours = self.days.iter()
            .map(|hours| {
                let entry = DayHoursEntry {
                    enabled: hours.enabled,
                    start_time: hours.open_time.format("%H:%M").to_string(),
                    end_time: hours.close_time.format("%H:%M").to_string(),
                };
                (weekday_name(hours.weekday).to_string(), entry)
            })
            .collect();

        let blocked_dates = self.blocked.iter()
            .map(|(date, reason)| (date.format("%Y-%m-%d").to_string(), BlockedDateEntry { reason: reason.clone() }))
            .collect();

        AvailabilityDocument {
            business_hours,
            blocked_dates,
            slot_duration: Some(self.slot_duration_min),
        }
    }

    pub fn day(&self, weekday: Weekday) -> &DayHours {
        &self.days[day_index(weekday)]
    }

    pub fn days(&self) -> &[DayHours; 7] {
        &self.days
    }

    pub fn slot_duration_min(&self) -> i64 {
        self.slot_duration_min
    }

    pub fn blocked_dates(&self) -> Vec<BlockedDate> {
        self.blocked.iter()
            .map(|(date, reason)| BlockedDate { date: *date, reason: reason.clone() })
            .collect()
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.contains_key(&date)
    }

    /// Times are `HH:MM`; an unparseable value leaves the day untouched.
    pub fn set_day_hours(&mut self, weekday: Weekday, enabled: bool, open: &str, close: &str) -> Result<(), AppError> {
        let open_time = parse_clock_time(open)?;
        let close_time = parse_clock_time(close)?;
        self.days[day_index(weekday)] = DayHours { weekday, enabled, open_time, close_time };
        Ok(())
    }

    pub fn set_slot_duration(&mut self, minutes: i64) -> Result<(), AppError> {
        if minutes <= 0 {
            return Err(AppError::InvalidConfiguration(format!(
                "Slot duration must be a positive number of minutes, got {}",
                minutes
            )));
        }
        self.slot_duration_min = minutes;
        Ok(())
    }

    /// Re-blocking a date replaces its reason.
    pub fn add_blocked_date(&mut self, date: NaiveDate, reason: Option<String>) {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "Blocked".to_string());
        self.blocked.insert(date, reason);
    }

    pub fn remove_blocked_date(&mut self, date: NaiveDate) -> bool {
        self.blocked.remove(&date).is_some()
    }

    /// Start times offered on `date`, ascending, from open to close inclusive.
    pub fn compute_slots(&self, date: NaiveDate) -> Result<Vec<TimeSlot>, AppError> {
        let duration_min = self.slot_duration_min;
        if duration_min <= 0 {
            return Err(AppError::InvalidConfiguration(format!(
                "Slot duration must be a positive number of minutes, got {}",
                duration_min
            )));
        }

        if self.is_blocked(date) {
            return Ok(Vec::new());
        }

        let hours = self.day(date.weekday());
        if !hours.enabled || hours.open_time > hours.close_time {
            return Ok(Vec::new());
        }

        let open_idx = minute_of_day(hours.open_time);
        let close_idx = minute_of_day(hours.close_time);

        let mut slots = Vec::new();
        let mut cursor = open_idx;
        while cursor <= close_idx && cursor < MINUTES_PER_DAY {
            let hour = (cursor / 60) as u32;
            let minute = (cursor % 60) as u32;
            if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
                slots.push(TimeSlot::new(date, time));
            }
            cursor = cursor.saturating_add(duration_min);
        }

        Ok(slots)
    }
}

fn model_from(doc: Option<AvailabilityDocument>) -> AvailabilityModel {
    match doc {
        Some(doc) => {
            let (model, rejected) = AvailabilityModel::from_document(&doc);
            for e in &rejected {
                warn!("Skipping stored availability entry: {}", e);
            }
            model
        }
        None => {
            info!("No stored availability; using defaults");
            AvailabilityModel::default()
        }
    }
}

fn day_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

fn minute_of_day(time: NaiveTime) -> i64 {
    (time.hour() * 60 + time.minute()) as i64
}

/// Live availability for the active tenant, kept in step with the stored document.
pub struct AvailabilityService {
    repo: Arc<dyn AvailabilityRepository>,
    model: RwLock<AvailabilityModel>,
    unsaved: AtomicBool,
}

impl AvailabilityService {
    pub fn new(repo: Arc<dyn AvailabilityRepository>) -> Self {
        Self {
            repo,
            model: RwLock::new(AvailabilityModel::default()),
            unsaved: AtomicBool::new(false),
        }
    }

    /// Loads the stored document and starts following its changes.
    pub async fn start(self: &Arc<Self>) -> Result<ListenerHandle, AppError> {
        let events = self.repo.subscribe();
        self.reload().await?;

        let service = Arc::clone(self);
        Ok(spawn_refresh_loop("availability", events, move || {
            let service = Arc::clone(&service);
            async move { service.refresh_from_store().await }
        }))
    }

    /// Replaces the in-memory model with the stored document, discarding unsaved edits.
    pub async fn reload(&self) -> Result<(), AppError> {
        let model = model_from(self.repo.load().await?);
        *self.model.write().await = model;
        self.unsaved.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Follows the stored document unless the operator has pending edits.
    pub(crate) async fn refresh_from_store(&self) {
        if self.unsaved.load(Ordering::SeqCst) {
            debug!("Availability has unsaved edits; skipping remote refresh");
            return;
        }

        let loaded = match self.repo.load().await {
            Ok(doc) => model_from(doc),
            Err(e) => {
                warn!("Availability refresh failed: {}", e);
                return;
            }
        };

        // Edits set the flag under the write lock, so this check cannot miss one.
        let mut model = self.model.write().await;
        if self.unsaved.load(Ordering::SeqCst) {
            debug!("Availability edited during refresh; keeping local edits");
            return;
        }
        *model = loaded;
    }

    pub async fn snapshot(&self) -> AvailabilityModel {
        self.model.read().await.clone()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved.load(Ordering::SeqCst)
    }

    /// Applies an edit to the in-memory model. Nothing is written until `save`.
    pub async fn edit<R>(&self, f: impl FnOnce(&mut AvailabilityModel) -> Result<R, AppError>) -> Result<R, AppError> {
        let mut model = self.model.write().await;
        let result = f(&mut *model)?;
        self.unsaved.store(true, Ordering::SeqCst);
        Ok(result)
    }

    pub async fn set_day_hours(&self, weekday: Weekday, enabled: bool, open: &str, close: &str) -> Result<(), AppError> {
        self.edit(|model| model.set_day_hours(weekday, enabled, open, close)).await
    }

    pub async fn set_slot_duration(&self, minutes: i64) -> Result<(), AppError> {
        self.edit(|model| model.set_slot_duration(minutes)).await
    }

    pub async fn add_blocked_date(&self, date: NaiveDate, reason: Option<String>) -> Result<(), AppError> {
        self.edit(|model| {
            model.add_blocked_date(date, reason);
            Ok(())
        }).await
    }

    pub async fn remove_blocked_date(&self, date: NaiveDate) -> Result<bool, AppError> {
        self.edit(|model| Ok(model.remove_blocked_date(date))).await
    }

    pub async fn compute_slots(&self, date: NaiveDate) -> Result<Vec<TimeSlot>, AppError> {
        self.model.read().await.compute_slots(date)
    }

    /// Persists hours, blocked dates and slot length in one merge write.
    pub async fn save(&self) -> Result<(), AppError> {
        // Held until the flag is cleared so an edit cannot slip in between write and reset.
        let model = self.model.read().await;
        let doc = model.to_document();
        self.repo.save(&doc).await?;
        self.unsaved.store(false, Ordering::SeqCst);
        drop(model);
        info!(slot_duration = ?doc.slot_duration, "Availability saved");
        Ok(())
    }
}
