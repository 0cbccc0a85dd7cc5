use crate::domain::models::booking::PaymentMethod;
use crate::domain::models::client::ClientSort;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct DayHoursRequest {
    pub enabled: bool,
    /// `HH:MM`
    pub open_time: String,
    pub close_time: String,
}

#[derive(Deserialize)]
pub struct SlotDurationRequest {
    pub minutes: i64,
}

#[derive(Deserialize)]
pub struct BlockDateRequest {
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingView {
    #[default]
    All,
    Upcoming,
    Past,
    Pending,
    Completed,
}

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub view: Option<BookingView>,
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    /// `YYYY-MM-DD h:mm AM`
    pub time_slot: String,
    #[serde(default)]
    pub notes: String,
    pub customer_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub time_slot: Option<String>,
    pub notes: Option<String>,
    pub customer_ref: Option<String>,
}

/// `null` clears the chosen method.
#[derive(Deserialize)]
pub struct PaymentMethodRequest {
    pub method: Option<PaymentMethod>,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentRequest {
    pub method: PaymentMethod,
}

#[derive(Deserialize)]
pub struct ClientListQuery {
    pub search: Option<String>,
    pub sort: Option<ClientSort>,
}
