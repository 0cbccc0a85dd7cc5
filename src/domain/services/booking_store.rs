use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::domain::models::booking::{Booking, BookingPatch, NewBooking, PaymentStatus, ScheduledBooking};
use crate::domain::ports::BookingRepository;
use crate::domain::services::live_sync::{spawn_refresh_loop, ListenerHandle};
use crate::error::AppError;

/// Point-in-time view of every booking whose slot parsed, ordered by start time.
#[derive(Debug, Clone, Default)]
pub struct BookingSnapshot {
    pub bookings: Arc<Vec<ScheduledBooking>>,
    /// Ids of stored records left out because their time slot is malformed.
    pub rejected: Arc<Vec<String>>,
}

impl BookingSnapshot {
    pub fn from_records(records: Vec<Booking>) -> Self {
        let mut bookings = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for booking in records {
            let id = booking.id.clone();
            match ScheduledBooking::from_booking(booking) {
                Ok(scheduled) => bookings.push(scheduled),
                Err(e) => {
                    error!(booking_id = %id, "Data-quality defect, booking excluded: {}", e);
                    rejected.push(id);
                }
            }
        }

        bookings.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.booking.id.cmp(&b.booking.id)));

        Self {
            bookings: Arc::new(bookings),
            rejected: Arc::new(rejected),
        }
    }

    pub fn all(&self) -> Vec<&ScheduledBooking> {
        self.bookings.iter().collect()
    }

    /// Starting at or after `now`, soonest first.
    pub fn upcoming(&self, now: NaiveDateTime) -> Vec<&ScheduledBooking> {
        self.bookings.iter().filter(|b| b.starts_at >= now).collect()
    }

    /// Started before `now`, most recent first.
    pub fn past(&self, now: NaiveDateTime) -> Vec<&ScheduledBooking> {
        self.bookings.iter().rev().filter(|b| b.starts_at < now).collect()
    }

    pub fn pending_payments(&self, now: NaiveDateTime) -> Vec<&ScheduledBooking> {
        self.past(now)
            .into_iter()
            .filter(|b| b.booking.payment_status == PaymentStatus::Pending)
            .collect()
    }

    pub fn completed_payments(&self) -> Vec<&ScheduledBooking> {
        self.bookings.iter().rev()
            .filter(|b| b.booking.payment_status == PaymentStatus::Paid)
            .collect()
    }

    pub fn for_date(&self, date: NaiveDate) -> Vec<&ScheduledBooking> {
        self.bookings.iter().filter(|b| b.starts_at.date() == date).collect()
    }
}

/// Authoritative bookings for the active tenant, with a live snapshot.
pub struct BookingStore {
    repo: Arc<dyn BookingRepository>,
    tz: Tz,
    snapshot: watch::Sender<BookingSnapshot>,
}

impl BookingStore {
    pub fn new(repo: Arc<dyn BookingRepository>, tz: Tz) -> Self {
        let (snapshot, _) = watch::channel(BookingSnapshot::default());
        Self { repo, tz, snapshot }
    }

    /// Publishes the first snapshot and re-derives it after every store change.
    pub async fn start(self: &Arc<Self>) -> Result<ListenerHandle, AppError> {
        let events = self.repo.subscribe();
        self.refresh().await?;

        let store = Arc::clone(self);
        Ok(spawn_refresh_loop("bookings", events, move || {
            let store = Arc::clone(&store);
            async move {
                if let Err(e) = store.refresh().await {
                    warn!("Booking snapshot refresh failed: {}", e);
                }
            }
        }))
    }

    pub async fn refresh(&self) -> Result<(), AppError> {
        let records = self.repo.list().await?;
        self.snapshot.send_replace(BookingSnapshot::from_records(records));
        Ok(())
    }

    pub fn observe(&self) -> watch::Receiver<BookingSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> BookingSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Current wall-clock time in the tenant's timezone.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    pub async fn get(&self, id: &str) -> Result<Booking, AppError> {
        self.repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    pub async fn create(&self, params: NewBooking) -> Result<String, AppError> {
        if params.customer_name.trim().is_empty() {
            return Err(AppError::Validation("Customer name is required".to_string()));
        }

        let booking = Booking::new(params);
        let created = self.repo.create(&booking).await?;
        info!(booking_id = %created.id, time_slot = %created.time_slot, "Booking created");
        Ok(created.id)
    }

    /// Writes only the fields present in `patch`.
    pub async fn update(&self, id: &str, patch: BookingPatch) -> Result<(), AppError> {
        if let Some(name) = &patch.customer_name
            && name.trim().is_empty() {
            return Err(AppError::Validation("Customer name cannot be empty".to_string()));
        }

        if patch.is_empty() {
            self.get(id).await?;
            return Ok(());
        }

        self.repo.update(id, &patch).await?;
        info!(booking_id = %id, "Booking updated");
        Ok(())
    }

    /// Like `update`, but the write only lands while the booking is unpaid.
    pub async fn update_pending(&self, id: &str, patch: BookingPatch) -> Result<(), AppError> {
        self.repo.update_if_pending(id, &patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete(id).await?;
        info!(booking_id = %id, "Booking deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::availability::TimeSlot;

    fn booking_at(slot: &str, status: PaymentStatus) -> Booking {
        let mut booking = Booking::new(NewBooking {
            customer_name: "Ana Lopez".into(),
            customer_phone: "+34600111222".into(),
            slot: TimeSlot::parse("2025-01-01 09:00 AM").unwrap(),
            notes: String::new(),
            customer_ref: None,
        });
        booking.time_slot = slot.to_string();
        booking.payment_status = status;
        booking
    }

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_views_split_on_now() {
        let snapshot = BookingSnapshot::from_records(vec![
            booking_at("2025-12-08 2:00 PM", PaymentStatus::Pending),
            booking_at("2025-12-08 10:00 AM", PaymentStatus::Paid),
            booking_at("2025-12-07 4:30 PM", PaymentStatus::Pending),
            booking_at("2025-12-09 09:00 AM", PaymentStatus::Pending),
        ]);
        let now = at("2025-12-08 12:00");

        let upcoming: Vec<String> = snapshot.upcoming(now).iter().map(|b| b.booking.time_slot.clone()).collect();
        assert_eq!(upcoming, vec!["2025-12-08 2:00 PM", "2025-12-09 09:00 AM"]);

        let past: Vec<String> = snapshot.past(now).iter().map(|b| b.booking.time_slot.clone()).collect();
        assert_eq!(past, vec!["2025-12-08 10:00 AM", "2025-12-07 4:30 PM"]);

        let pending = snapshot.pending_payments(now);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].booking.time_slot, "2025-12-07 4:30 PM");

        assert_eq!(snapshot.completed_payments().len(), 1);
        assert_eq!(snapshot.for_date(NaiveDate::from_ymd_opt(2025, 12, 8).unwrap()).len(), 2);
    }

    #[test]
    fn test_booking_at_now_counts_as_upcoming() {
        let snapshot = BookingSnapshot::from_records(vec![booking_at("2025-12-08 12:00 PM", PaymentStatus::Pending)]);
        let now = at("2025-12-08 12:00");
        assert_eq!(snapshot.upcoming(now).len(), 1);
        assert!(snapshot.past(now).is_empty());
    }

    #[test]
    fn test_malformed_slots_are_rejected() {
        let bad = booking_at("someday 10ish", PaymentStatus::Pending);
        let bad_id = bad.id.clone();
        let snapshot = BookingSnapshot::from_records(vec![
            bad,
            booking_at("2025-12-08 10:00 AM", PaymentStatus::Pending),
        ]);

        assert_eq!(snapshot.bookings.len(), 1);
        assert_eq!(*snapshot.rejected, vec![bad_id]);
    }
}
