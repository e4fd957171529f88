//! Attendance kept in a JSON file.
//!
//! The file maps display names to the timestamps they attended, e.g.
//! ```json
//! { "Ayla": ["2024-01-03T20:00:00Z", "2024-01-06T20:15:00Z"] }
//! ```
//! It is read on every lookup so external tooling can update it while the bot runs.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::instrument;

use super::AttendanceRecord;
use super::AttendanceSource;
use crate::BotError;

/// Reads attendance from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonAttendanceStore {
    path: PathBuf,
}

impl JsonAttendanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AttendanceSource for JsonAttendanceStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn attendance_for(&self, name: &str) -> Result<Vec<AttendanceRecord>, BotError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| BotError::AttendanceUnavailable {
                reason: format!("can't read {}: {e}", self.path.display()),
            })?;

        let mut all: HashMap<String, Vec<AttendanceRecord>> = serde_json::from_str(&content)
            .map_err(|e| BotError::AttendanceUnavailable {
                reason: format!("can't parse {}: {e}", self.path.display()),
            })?;

        let records = all.remove(name).unwrap_or_default();
        tracing::debug!("Found {} attendance records for {name}", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::TimeZone;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    use super::*;

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_records_for_member() {
        let file = temp_file(
            r#"{ "Ayla": ["2024-01-03T20:00:00Z", "2024-01-06T20:15:00Z"], "Bram": [] }"#,
        );
        let store = JsonAttendanceStore::new(file.path());

        let records = store.attendance_for("Ayla").await.unwrap();
        assert_eq!(
            records,
            vec![
                AttendanceRecord {
                    date: Utc.with_ymd_and_hms(2024, 1, 3, 20, 0, 0).unwrap()
                },
                AttendanceRecord {
                    date: Utc.with_ymd_and_hms(2024, 1, 6, 20, 15, 0).unwrap()
                },
            ]
        );
        assert!(store.attendance_for("Bram").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_member_has_no_records() {
        let file = temp_file(r#"{ "Ayla": ["2024-01-03T20:00:00Z"] }"#);
        let store = JsonAttendanceStore::new(file.path());

        assert!(store.attendance_for("Nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAttendanceStore::new(dir.path().join("attendance.json"));
        let result = store.attendance_for("Ayla").await;
        assert!(matches!(result, Err(BotError::AttendanceUnavailable { .. })));
    }

    #[tokio::test]
    async fn corrupt_file_is_unavailable() {
        let file = temp_file("{ not json");
        let store = JsonAttendanceStore::new(file.path());

        let result = store.attendance_for("Ayla").await;
        assert!(matches!(result, Err(BotError::AttendanceUnavailable { .. })));
    }
}
