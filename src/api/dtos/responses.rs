use serde::Serialize;

use crate::domain::models::availability::{weekday_name, TimeSlot};
use crate::domain::models::booking::ScheduledBooking;
use crate::domain::services::availability::AvailabilityModel;
use crate::domain::services::session_manager::ActiveSession;

#[derive(Serialize)]
pub struct SessionResponse {
    pub tenant_id: String,
    pub display_name: String,
    pub timezone: String,
    pub live_sync: bool,
}

impl SessionResponse {
    pub fn from_session(session: &ActiveSession) -> Self {
        Self {
            tenant_id: session.tenant.tenant_id.clone(),
            display_name: session.tenant.display_name.clone(),
            timezone: session.connection.tz.name().to_string(),
            live_sync: session.is_live(),
        }
    }
}

#[derive(Serialize)]
pub struct DayHoursResponse {
    pub weekday: &'static str,
    pub enabled: bool,
    pub open_time: String,
    pub close_time: String,
}

#[derive(Serialize)]
pub struct BlockedDateResponse {
    pub date: String,
    pub reason: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub days: Vec<DayHoursResponse>,
    pub slot_duration_min: i64,
    pub blocked_dates: Vec<BlockedDateResponse>,
    pub unsaved_changes: bool,
}

impl AvailabilityResponse {
    pub fn new(model: &AvailabilityModel, unsaved_changes: bool) -> Self {
        Self {
            days: model.days().iter().map(|d| DayHoursResponse {
                weekday: weekday_name(d.weekday),
                enabled: d.enabled,
                open_time: d.open_time.format("%H:%M").to_string(),
                close_time: d.close_time.format("%H:%M").to_string(),
            }).collect(),
            slot_duration_min: model.slot_duration_min(),
            blocked_dates: model.blocked_dates().into_iter().map(|b| BlockedDateResponse {
                date: b.date.format("%Y-%m-%d").to_string(),
                reason: b.reason,
            }).collect(),
            unsaved_changes,
        }
    }
}

#[derive(Serialize)]
pub struct SlotResponse {
    pub time_slot: String,
    pub time: String,
    pub label: String,
}

impl From<&TimeSlot> for SlotResponse {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            time_slot: slot.to_storage_string(),
            time: slot.clock_label(),
            label: slot.display_label(),
        }
    }
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: String,
    pub slots: Vec<SlotResponse>,
}

#[derive(Serialize)]
pub struct BookingListResponse<'a> {
    pub bookings: Vec<&'a ScheduledBooking>,
    pub rejected_records: usize,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Serialize)]
pub struct PaymentConfirmedResponse {
    pub id: String,
    pub registered_with_mirror: bool,
}
