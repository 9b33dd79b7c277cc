use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

/// Lifetime chosen for a paste at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    TenMinutes,
    OneHour,
    OneDay,
    #[default]
    Never,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown expiry option '{0}'")]
pub struct UnknownExpiry(pub String);

impl Expiry {
    pub fn duration(self) -> Option<Duration> {
        match self {
            Expiry::TenMinutes => Some(Duration::minutes(10)),
            Expiry::OneHour => Some(Duration::hours(1)),
            Expiry::OneDay => Some(Duration::days(1)),
            Expiry::Never => None,
        }
    }

    /// The moment a paste created at `created_at` stops being readable.
    pub fn expire_at(self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|d| created_at + d)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Expiry::TenMinutes => "10min",
            Expiry::OneHour => "1hour",
            Expiry::OneDay => "1day",
            Expiry::Never => "never",
        }
    }
}

impl FromStr for Expiry {
    type Err = UnknownExpiry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "10min" => Ok(Expiry::TenMinutes),
            "1hour" => Ok(Expiry::OneHour),
            "1day" => Ok(Expiry::OneDay),
            "never" => Ok(Expiry::Never),
            other => Err(UnknownExpiry(other.to_owned())),
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A paste is live while the current time is strictly before its expiry.
pub fn is_expired(expire_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expire_at, Some(expire_at) if now >= expire_at)
}
