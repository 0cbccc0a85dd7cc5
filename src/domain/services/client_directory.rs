use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::models::booking::ScheduledBooking;
use crate::domain::models::client::{Client, ClientSort, ClientStats};
use crate::domain::ports::ClientRepository;
use crate::domain::services::live_sync::{spawn_refresh_loop, ListenerHandle};
use crate::error::AppError;

const PHONE_MATCH_DIGITS: usize = 9;

pub struct ClientDirectory {
    repo: Arc<dyn ClientRepository>,
    snapshot: watch::Sender<Arc<Vec<Client>>>,
}

impl ClientDirectory {
    pub fn new(repo: Arc<dyn ClientRepository>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self { repo, snapshot }
    }

    pub async fn start(self: &Arc<Self>) -> Result<ListenerHandle, AppError> {
        let events = self.repo.subscribe();
        self.refresh().await?;

        let directory = Arc::clone(self);
        Ok(spawn_refresh_loop("users", events, move || {
            let directory = Arc::clone(&directory);
            async move {
                if let Err(e) = directory.refresh().await {
                    warn!("Client list refresh failed: {}", e);
                }
            }
        }))
    }

    pub async fn refresh(&self) -> Result<(), AppError> {
        let clients = self.repo.list().await?;
        self.snapshot.send_replace(Arc::new(clients));
        Ok(())
    }

    pub fn observe(&self) -> watch::Receiver<Arc<Vec<Client>>> {
        self.snapshot.subscribe()
    }

    pub fn clients(&self) -> Arc<Vec<Client>> {
        self.snapshot.borrow().clone()
    }

    pub fn find(&self, id: &str) -> Option<Client> {
        self.clients().iter().find(|c| c.id == id).cloned()
    }

    pub fn list(&self, search: Option<&str>, sort: ClientSort) -> Vec<Client> {
        filter_and_sort(&self.clients(), search, sort)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> ClientStats {
        client_stats(&self.clients(), now)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete(id).await?;
        info!(client_id = %id, "Client deleted");
        Ok(())
    }
}

/// Name matches ignore case; phone matches are plain substrings.
pub fn filter_and_sort(clients: &[Client], search: Option<&str>, sort: ClientSort) -> Vec<Client> {
    let needle = search.map(str::trim).filter(|s| !s.is_empty());

    let mut matched: Vec<Client> = match needle {
        Some(needle) => {
            let lowered = needle.to_lowercase();
            clients.iter()
                .filter(|c| c.name.to_lowercase().contains(&lowered) || c.phone.contains(needle))
                .cloned()
                .collect()
        }
        None => clients.to_vec(),
    };

    match sort {
        ClientSort::Recent => matched.sort_by(|a, b| b.first_seen_at.cmp(&a.first_seen_at)),
        ClientSort::Name => matched.sort_by_key(|c| c.name.to_lowercase()),
        ClientSort::Visits => matched.sort_by(|a, b| b.visit_count.cmp(&a.visit_count)),
    }

    matched
}

pub fn client_stats(clients: &[Client], now: DateTime<Utc>) -> ClientStats {
    let week_ago = now - Duration::days(7);
    ClientStats {
        total: clients.len(),
        new_this_week: clients.iter().filter(|c| c.first_seen_at >= week_ago).count(),
        total_visits: clients.iter().map(|c| c.visit_count).sum(),
    }
}

/// Bookings linked to `client` by explicit reference or by the tail of the phone number.
pub fn bookings_for<'a>(client: &Client, bookings: &[&'a ScheduledBooking]) -> Vec<&'a ScheduledBooking> {
    let suffix = phone_suffix(&client.phone);
    bookings.iter()
        .copied()
        .filter(|b| {
            b.booking.customer_ref.as_deref() == Some(client.id.as_str())
                || (!suffix.is_empty() && b.booking.customer_phone.contains(&suffix))
        })
        .collect()
}

fn phone_suffix(phone: &str) -> String {
    let chars: Vec<char> = phone.trim().chars().collect();
    let start = chars.len().saturating_sub(PHONE_MATCH_DIGITS);
    chars[start..].iter().collect()
}
