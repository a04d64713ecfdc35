// libs/availability-cell/src/models.rs
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Timezones a doctor may publish availability in. Submissions outside this
/// set are rejected before anything is written.
pub const SUPPORTED_TIMEZONES: &[&str] = &[
    "UTC",
    "Africa/Cairo",
    "Africa/Lagos",
    "Africa/Nairobi",
    "Asia/Riyadh",
    "Asia/Dubai",
    "Europe/London",
    "Europe/Berlin",
    "Europe/Paris",
    "America/New_York",
    "America/Los_Angeles",
];

/// Largest number of windows accepted in one submission.
pub const MAX_WEEKLY_ENTRIES: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySlotEntry {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Full-week replacement request: the submitted set becomes the doctor's
/// entire availability, previous windows included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAvailabilityRequest {
    pub timezone: String,
    pub slots: Vec<WeeklySlotEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported timezone: {0}")]
    UnsupportedTimezone(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
