use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Read-side customer summary from the `users` collection.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub first_seen_at: DateTime<Utc>,
    pub visit_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientSort {
    #[default]
    Recent,
    Name,
    Visits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientStats {
    pub total: usize,
    pub new_this_week: usize,
    pub total_visits: i64,
}
