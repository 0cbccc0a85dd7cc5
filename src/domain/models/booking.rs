use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::FromRow;

use crate::domain::models::availability::TimeSlot;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

/// Where a booking sits in the payment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Unconfirmed,
    MethodChosen(PaymentMethod),
    Paid(PaymentMethod),
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub time_slot: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    pub mirror_registered: bool,
    pub customer_ref: Option<String>,
}

pub struct NewBooking {
    pub customer_name: String,
    pub customer_phone: String,
    pub slot: TimeSlot,
    pub notes: String,
    pub customer_ref: Option<String>,
}

impl Booking {
    pub fn new(params: NewBooking) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_name: params.customer_name,
            customer_phone: params.customer_phone,
            time_slot: params.slot.to_storage_string(),
            notes: params.notes,
            created_at: Utc::now(),
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            payment_confirmed_at: None,
            mirror_registered: false,
            customer_ref: params.customer_ref,
        }
    }

    pub fn slot(&self) -> Result<TimeSlot, AppError> {
        TimeSlot::parse(&self.time_slot)
    }

    pub fn payment_state(&self) -> PaymentState {
        match (self.payment_status, self.payment_method) {
            (PaymentStatus::Paid, Some(method)) => PaymentState::Paid(method),
            // Legacy rows marked paid with no method count as cash.
            (PaymentStatus::Paid, None) => PaymentState::Paid(PaymentMethod::Cash),
            (PaymentStatus::Pending, Some(method)) => PaymentState::MethodChosen(method),
            (PaymentStatus::Pending, None) => PaymentState::Unconfirmed,
        }
    }
}

/// Field-level patch; `None` leaves the stored value untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BookingPatch {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub time_slot: Option<TimeSlot>,
    pub notes: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    /// `Some(None)` clears the chosen method.
    pub payment_method: Option<Option<PaymentMethod>>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    pub mirror_registered: Option<bool>,
    pub customer_ref: Option<String>,
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        *self == BookingPatch::default()
    }
}

/// A booking whose time slot parsed cleanly.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub starts_at: NaiveDateTime,
}

impl ScheduledBooking {
    pub fn from_booking(booking: Booking) -> Result<Self, AppError> {
        let starts_at = booking.slot()?.starts_at();
        Ok(Self { booking, starts_at })
    }
}
