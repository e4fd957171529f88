//! Where attendance records come from.

mod store;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::BotError;
pub use store::JsonAttendanceStore;

/// One day a member was confirmed present at a raid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceRecord {
    pub date: DateTime<Utc>,
}

/// A source of attendance records.
///
/// Implementations may be temporarily unavailable, in which case they return
/// [BotError::AttendanceUnavailable].
#[async_trait]
pub trait AttendanceSource: std::fmt::Debug + Send + Sync {
    /// All records for the member with this display name.
    async fn attendance_for(&self, name: &str) -> Result<Vec<AttendanceRecord>, BotError>;
}
