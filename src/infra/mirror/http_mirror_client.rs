use std::time::Duration;

use crate::domain::models::tenant::MirrorEndpoints;
use crate::domain::ports::{MirrorClient, PaymentSyncPayload};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, error};

/// Talks to the spreadsheet-backed mirror. One attempt per call, bounded by the client timeout.
pub struct HttpMirrorClient {
    client: Client,
    endpoints: MirrorEndpoints,
}

impl HttpMirrorClient {
    pub fn new(endpoints: MirrorEndpoints, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Cannot build mirror HTTP client: {}", e)))?;
        Ok(Self { client, endpoints })
    }
}

async fn check_status(res: Response, call: &str) -> Result<(), AppError> {
    if !res.status().is_success() {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        let msg = format!("Mirror {} failed. Status: {}, Body: {}", call, status, text);
        error!("{}", msg);
        return Err(AppError::MirrorSync(msg));
    }
    Ok(())
}

#[async_trait]
impl MirrorClient for HttpMirrorClient {
    async fn register_booking(&self, booking_id: &str) -> Result<(), AppError> {
        let res = self.client.get(&self.endpoints.register_url)
            .query(&[("bookingId", booking_id)])
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Mirror register connection error: {}", e);
                error!("{}", msg);
                AppError::MirrorSync(msg)
            })?;

        check_status(res, "register").await?;
        debug!(booking_id = %booking_id, "Mirror register accepted");
        Ok(())
    }

    async fn sync_payment(&self, payload: &PaymentSyncPayload) -> Result<(), AppError> {
        let res = self.client.post(&self.endpoints.sync_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Mirror sync connection error: {}", e);
                error!("{}", msg);
                AppError::MirrorSync(msg)
            })?;

        check_status(res, "sync").await?;
        debug!(booking_id = %payload.booking_id, "Mirror sync accepted");
        Ok(())
    }
}
