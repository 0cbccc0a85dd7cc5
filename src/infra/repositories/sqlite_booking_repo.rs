use crate::domain::{models::booking::{Booking, BookingPatch, PaymentStatus}, ports::{BookingRepository, StoreEvent}};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tokio::sync::broadcast;

const COLLECTION: &str = "bookings";

pub struct SqliteBookingRepo {
    pool: SqlitePool,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { pool, events }
    }

    /// One statement touching only the patched columns, so concurrent edits to other fields survive.
    /// With `pending_only` the row must still be unpaid when the statement runs.
    async fn apply_patch(&self, id: &str, patch: &BookingPatch, pending_only: bool) -> Result<u64, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE bookings SET ");
        let mut fields = qb.separated(", ");
        if let Some(v) = &patch.customer_name { fields.push("customer_name = ").push_bind_unseparated(v.clone()); }
        if let Some(v) = &patch.customer_phone { fields.push("customer_phone = ").push_bind_unseparated(v.clone()); }
        if let Some(v) = &patch.time_slot { fields.push("time_slot = ").push_bind_unseparated(v.to_storage_string()); }
        if let Some(v) = &patch.notes { fields.push("notes = ").push_bind_unseparated(v.clone()); }
        if let Some(v) = patch.payment_status { fields.push("payment_status = ").push_bind_unseparated(v); }
        if let Some(v) = patch.payment_method { fields.push("payment_method = ").push_bind_unseparated(v); }
        if let Some(v) = patch.payment_confirmed_at { fields.push("payment_confirmed_at = ").push_bind_unseparated(v); }
        if let Some(v) = patch.mirror_registered { fields.push("mirror_registered = ").push_bind_unseparated(v); }
        if let Some(v) = &patch.customer_ref { fields.push("customer_ref = ").push_bind_unseparated(v.clone()); }
        qb.push(" WHERE id = ").push_bind(id.to_string());
        if pending_only {
            qb.push(" AND payment_status = ").push_bind(PaymentStatus::Pending);
        }

        let result = qb.build().execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    fn notify(&self, id: &str) {
        // No subscribers is fine; the next subscriber re-reads everything anyway.
        let _ = self.events.send(StoreEvent { collection: COLLECTION, document_id: id.to_string() });
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, customer_name, customer_phone, time_slot, notes, created_at, payment_status, payment_method, payment_confirmed_at, mirror_registered, customer_ref)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.customer_name).bind(&booking.customer_phone).bind(&booking.time_slot)
            .bind(&booking.notes).bind(booking.created_at).bind(booking.payment_status).bind(booking.payment_method)
            .bind(booking.payment_confirmed_at).bind(booking.mirror_registered).bind(&booking.customer_ref)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        self.notify(&created.id);
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at ASC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, id: &str, patch: &BookingPatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return match self.find_by_id(id).await? {
                Some(_) => Ok(()),
                None => Err(AppError::NotFound("Booking not found".into())),
            };
        }

        if self.apply_patch(id, patch, false).await? == 0 { return Err(AppError::NotFound("Booking not found".into())); }

        self.notify(id);
        Ok(())
    }

    async fn update_if_pending(&self, id: &str, patch: &BookingPatch) -> Result<(), AppError> {
        if patch.is_empty() || self.apply_patch(id, patch, true).await? == 0 {
            return match self.find_by_id(id).await? {
                Some(existing) if existing.payment_status == PaymentStatus::Paid => {
                    Err(AppError::Conflict(format!("Booking {} is already paid", id)))
                }
                Some(_) => Ok(()),
                None => Err(AppError::NotFound("Booking not found".into())),
            };
        }

        self.notify(id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Booking not found".into())); }

        self.notify(id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
