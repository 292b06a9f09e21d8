use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Milliseconds in one calendar day.
pub const DAY_MS: i64 = 86_400_000;

/// Relative lookback window for historical requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub const ALL: [Self; 11] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::TenYears,
        Self::YearToDate,
        Self::Max,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// Fixed lookback in days; `None` for the calendar-anchored periods.
    pub const fn lookback_days(self) -> Option<i64> {
        match self {
            Self::OneDay => Some(1),
            Self::FiveDays => Some(5),
            Self::OneMonth => Some(30),
            Self::ThreeMonths => Some(90),
            Self::SixMonths => Some(180),
            Self::OneYear => Some(365),
            Self::TwoYears => Some(2 * 365),
            Self::FiveYears => Some(5 * 365),
            Self::TenYears => Some(10 * 365),
            Self::YearToDate | Self::Max => None,
        }
    }

    /// Absolute start of the window ending at `now`.
    ///
    /// `ytd` anchors to January 1 (UTC) of `now`'s year and `max` to the Unix
    /// epoch; every other period subtracts its fixed millisecond span.
    pub fn start(self, now: OffsetDateTime) -> OffsetDateTime {
        let now = now.to_offset(UtcOffset::UTC);
        match self {
            Self::YearToDate => Date::from_ordinal_date(now.year(), 1)
                .map_or(OffsetDateTime::UNIX_EPOCH, |date| date.midnight().assume_utc()),
            Self::Max => OffsetDateTime::UNIX_EPOCH,
            other => {
                let days = other.lookback_days().unwrap_or(30);
                now - Duration::milliseconds(days * DAY_MS)
            }
        }
    }

    /// Resolves a raw label, treating anything unrecognized as `1mo`.
    pub fn start_for_label(label: &str, now: OffsetDateTime) -> OffsetDateTime {
        label
            .parse::<Self>()
            .unwrap_or(Self::OneMonth)
            .start(now)
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|period| period.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|period| period.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidPeriod {
                value: value.trim().to_owned(),
                valid: Self::valid_values(),
            })
    }
}
