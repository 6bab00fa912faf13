use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar interval of one series fed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5")]
    FiveMin,
    #[serde(rename = "10")]
    TenMin,
    #[serde(rename = "30")]
    ThirtyMin,
    #[serde(rename = "60")]
    OneHour,
    #[serde(rename = "240")]
    FourHour,
    #[serde(rename = "D")]
    OneDay,
    #[serde(rename = "W")]
    OneWeek,
    #[serde(rename = "M")]
    OneMonth,
}

impl Timeframe {
    /// Higher-timeframe blend members, slowest first
    pub const HTF: [Timeframe; 4] = [
        Timeframe::OneWeek,
        Timeframe::OneDay,
        Timeframe::FourHour,
        Timeframe::OneHour,
    ];

    /// Lower-timeframe blend members, slowest first
    pub const LTF: [Timeframe; 3] = [Timeframe::ThirtyMin, Timeframe::TenMin, Timeframe::FiveMin];

    /// Every timeframe that gets an indicator bundle
    pub const SCORED: [Timeframe; 7] = [
        Timeframe::OneWeek,
        Timeframe::OneDay,
        Timeframe::FourHour,
        Timeframe::OneHour,
        Timeframe::ThirtyMin,
        Timeframe::TenMin,
        Timeframe::FiveMin,
    ];

    /// Timeframes walked by the exhaustion sequence engine
    pub const EXHAUSTION: [Timeframe; 3] =
        [Timeframe::OneDay, Timeframe::OneWeek, Timeframe::OneMonth];

    /// Timeframes voting in the swing consensus and graded by entry quality
    pub const SWING: [Timeframe; 5] = [
        Timeframe::TenMin,
        Timeframe::ThirtyMin,
        Timeframe::OneHour,
        Timeframe::FourHour,
        Timeframe::OneDay,
    ];

    /// Nominal duration in minutes (calendar periods use trading approximations)
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::FiveMin => 5,
            Timeframe::TenMin => 10,
            Timeframe::ThirtyMin => 30,
            Timeframe::OneHour => 60,
            Timeframe::FourHour => 240,
            Timeframe::OneDay => 1440,
            Timeframe::OneWeek => 10080,
            Timeframe::OneMonth => 43200,
        }
    }

    /// Payload key, also used in CSV file names
    pub fn key(&self) -> &'static str {
        match self {
            Timeframe::FiveMin => "5",
            Timeframe::TenMin => "10",
            Timeframe::ThirtyMin => "30",
            Timeframe::OneHour => "60",
            Timeframe::FourHour => "240",
            Timeframe::OneDay => "D",
            Timeframe::OneWeek => "W",
            Timeframe::OneMonth => "M",
        }
    }

    /// Calendar timeframes are deduplicated by period rather than by timestamp
    pub fn is_calendar(&self) -> bool {
        matches!(
            self,
            Timeframe::OneDay | Timeframe::OneWeek | Timeframe::OneMonth
        )
    }

    pub fn is_intraday(&self) -> bool {
        !self.is_calendar()
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "5" | "5m" | "5min" => Ok(Timeframe::FiveMin),
            "10" | "10m" | "10min" => Ok(Timeframe::TenMin),
            "30" | "30m" | "30min" => Ok(Timeframe::ThirtyMin),
            "60" | "1h" | "1hour" => Ok(Timeframe::OneHour),
            "240" | "4h" | "4hour" => Ok(Timeframe::FourHour),
            "d" | "1d" | "1day" | "day" => Ok(Timeframe::OneDay),
            "w" | "1w" | "1week" | "week" => Ok(Timeframe::OneWeek),
            "m" | "1mo" | "1month" | "month" => Ok(Timeframe::OneMonth),
            _ => Err(anyhow!(
                "Invalid timeframe: '{}'. Valid options: 5, 10, 30, 60, 240, D, W, M",
                s
            )),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Timeframe::FiveMin => "5m",
            Timeframe::TenMin => "10m",
            Timeframe::ThirtyMin => "30m",
            Timeframe::OneHour => "1H",
            Timeframe::FourHour => "4H",
            Timeframe::OneDay => "D",
            Timeframe::OneWeek => "W",
            Timeframe::OneMonth => "M",
        };
        write!(f, "{}", label)
    }
}
