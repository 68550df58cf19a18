//! Backend timestamps
//!
//! The backend writes `datetime.utcnow().isoformat()`, i.e. a naive ISO-8601
//! string without offset, while newer rows carry a full RFC 3339 value. The raw
//! text is kept as received and parsed on demand so a malformed value never
//! rejects the record that carries it.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Creation time as sent by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse as RFC 3339, falling back to a naive date-time taken as UTC
    pub fn parsed(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    /// Age in hours relative to `now`; `+inf` when the value cannot be parsed
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        match self.parsed() {
            Some(at) => (now - at).num_milliseconds() as f64 / MILLIS_PER_HOUR,
            None => f64::INFINITY,
        }
    }

    /// Short relative description ("3分钟前"), or the calendar date past a week
    pub fn relative_to(&self, now: DateTime<Utc>) -> String {
        let Some(at) = self.parsed() else {
            return "未知时间".to_string();
        };
        let elapsed = now - at;
        let minutes = elapsed.num_minutes();
        let hours = elapsed.num_hours();
        let days = elapsed.num_days();

        if minutes < 1 {
            "刚刚".to_string()
        } else if minutes < 60 {
            format!("{minutes}分钟前")
        } else if hours < 24 {
            format!("{hours}小时前")
        } else if days < 7 {
            format!("{days}天前")
        } else {
            format!("{}/{}/{}", at.year(), at.month(), at.day())
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::from_datetime(at)
    }
}
