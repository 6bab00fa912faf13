//! US equity session classification in exchange time (America/New_York).

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};
use std::fmt;

const PRE_MARKET_START_MIN: u32 = 4 * 60;
const RTH_START_MIN: u32 = 9 * 60 + 30;
const RTH_END_MIN: u32 = 16 * 60;
const AFTER_HOURS_END_MIN: u32 = 20 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionType {
    /// Pre-market, 04:00-09:30 ET
    #[serde(rename = "PM")]
    PreMarket,
    /// Regular trading hours, 09:30-16:00 ET
    #[serde(rename = "RTH")]
    Regular,
    /// After-hours, 16:00-20:00 ET
    #[serde(rename = "AH")]
    AfterHours,
    Closed,
}

impl SessionType {
    pub fn is_regular(&self) -> bool {
        matches!(self, SessionType::Regular)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::PreMarket => write!(f, "PM"),
            SessionType::Regular => write!(f, "RTH"),
            SessionType::AfterHours => write!(f, "AH"),
            SessionType::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Classifies a UTC millisecond timestamp into its New York session.
/// Weekends are not special-cased; the caller decides what a bar on a
/// Saturday means.
pub fn classify_session(timestamp_ms: i64) -> SessionType {
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) else {
        return SessionType::Closed;
    };
    let et = utc.with_timezone(&New_York);
    let minutes = et.hour() * 60 + et.minute();

    if (PRE_MARKET_START_MIN..RTH_START_MIN).contains(&minutes) {
        SessionType::PreMarket
    } else if (RTH_START_MIN..RTH_END_MIN).contains(&minutes) {
        SessionType::Regular
    } else if (RTH_END_MIN..AFTER_HOURS_END_MIN).contains(&minutes) {
        SessionType::AfterHours
    } else {
        SessionType::Closed
    }
}
