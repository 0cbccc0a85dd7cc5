use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::domain::models::booking::{BookingPatch, PaymentMethod, PaymentState, PaymentStatus};
use crate::domain::ports::{MirrorClient, PaymentSyncPayload};
use crate::domain::services::booking_store::BookingStore;
use crate::error::AppError;

/// Outcome of a confirmed payment.
pub struct PaymentConfirmation {
    pub registered_with_mirror: bool,
    /// Detached mirror sync; dropping the handle does not cancel it.
    pub sync_task: Option<JoinHandle<()>>,
}

pub struct PaymentReconciler {
    tenant_id: String,
    bookings: Arc<BookingStore>,
    mirror: Option<Arc<dyn MirrorClient>>,
    tz: Tz,
}

impl PaymentReconciler {
    pub fn new(tenant_id: String, bookings: Arc<BookingStore>, mirror: Option<Arc<dyn MirrorClient>>, tz: Tz) -> Self {
        Self { tenant_id, bookings, mirror, tz }
    }

    /// Records the operator's choice without marking the booking paid.
    pub async fn choose_method(&self, booking_id: &str, method: PaymentMethod) -> Result<(), AppError> {
        let booking = self.bookings.get(booking_id).await?;

        match booking.payment_state() {
            PaymentState::Paid(_) => Err(AppError::Conflict(format!("Booking {} is already paid", booking_id))),
            PaymentState::MethodChosen(current) if current == method => {
                debug!(booking_id = %booking_id, "Payment method unchanged");
                Ok(())
            }
            _ => {
                let patch = BookingPatch { payment_method: Some(Some(method)), ..Default::default() };
                self.bookings.update_pending(booking_id, patch).await?;
                info!(booking_id = %booking_id, method = method.as_str(), "Payment method chosen");
                Ok(())
            }
        }
    }

    pub async fn clear_method(&self, booking_id: &str) -> Result<(), AppError> {
        let booking = self.bookings.get(booking_id).await?;

        match booking.payment_state() {
            PaymentState::Paid(_) => Err(AppError::Conflict(format!("Booking {} is already paid", booking_id))),
            PaymentState::Unconfirmed => Ok(()),
            PaymentState::MethodChosen(_) => {
                let patch = BookingPatch { payment_method: Some(None), ..Default::default() };
                self.bookings.update_pending(booking_id, patch).await?;
                info!(booking_id = %booking_id, "Payment method cleared");
                Ok(())
            }
        }
    }

    /// Marks the booking paid. Mirror traffic is best-effort: registration failures are
    /// logged and the sync runs detached, so neither can fail the confirmation.
    /// Of two racing confirmations only the one whose write lands first syncs; the other gets `Conflict`.
    pub async fn confirm(&self, booking_id: &str, method: PaymentMethod) -> Result<PaymentConfirmation, AppError> {
        let booking = self.bookings.get(booking_id).await?;
        if let PaymentState::Paid(_) = booking.payment_state() {
            return Err(AppError::Conflict(format!("Booking {} is already paid", booking_id)));
        }

        let mut registered_now = false;
        if !booking.mirror_registered {
            match &self.mirror {
                Some(mirror) => match mirror.register_booking(booking_id).await {
                    Ok(()) => {
                        registered_now = true;
                        info!(booking_id = %booking_id, "Booking registered with mirror");
                    }
                    Err(e) => warn!(booking_id = %booking_id, "Mirror registration failed, continuing: {}", e),
                },
                None => debug!(tenant_id = %self.tenant_id, "No mirror configured; skipping registration"),
            }
        }

        let confirmed_at = Utc::now();
        let patch = BookingPatch {
            payment_status: Some(PaymentStatus::Paid),
            payment_method: Some(Some(method)),
            payment_confirmed_at: Some(confirmed_at),
            mirror_registered: registered_now.then_some(true),
            ..Default::default()
        };
        self.bookings.update_pending(booking_id, patch).await?;
        info!(booking_id = %booking_id, method = method.as_str(), "Payment confirmed");

        let sync_task = self.mirror.clone().map(|mirror| {
            let payload = PaymentSyncPayload {
                booking_id: booking_id.to_string(),
                payment_method: method,
                payment_date: mirror_payment_date(confirmed_at, self.tz),
                method_only: false,
            };
            let span = info_span!("mirror_sync", tenant_id = %self.tenant_id, booking_id = %booking_id);

            tokio::spawn(
                async move {
                    match mirror.sync_payment(&payload).await {
                        Ok(()) => info!("Payment synced to mirror"),
                        Err(e) => error!("Payment sync to mirror failed: {}", e),
                    }
                }
                .instrument(span),
            )
        });

        Ok(PaymentConfirmation {
            registered_with_mirror: booking.mirror_registered || registered_now,
            sync_task,
        })
    }

    /// Settles a past booking as cash without contacting the mirror. A paid booking is left as is.
    pub async fn remove_from_pending(&self, booking_id: &str) -> Result<(), AppError> {
        let booking = self.bookings.get(booking_id).await?;
        if let PaymentState::Paid(_) = booking.payment_state() {
            debug!(booking_id = %booking_id, "Booking already settled");
            return Ok(());
        }

        let patch = BookingPatch {
            payment_status: Some(PaymentStatus::Paid),
            payment_method: Some(Some(PaymentMethod::Cash)),
            payment_confirmed_at: Some(Utc::now()),
            ..Default::default()
        };
        match self.bookings.update_pending(booking_id, patch).await {
            Ok(()) => {
                info!(booking_id = %booking_id, "Booking removed from pending payments");
                Ok(())
            }
            Err(AppError::Conflict(_)) => {
                debug!(booking_id = %booking_id, "Booking settled concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Mirror date layout, e.g. `10 December 2025`, on the tenant's calendar.
pub fn mirror_payment_date(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%-d %B %Y").to_string()
}
