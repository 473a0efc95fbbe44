//! Wire encodings for timestamps and durations.
//!
//! The Sysdig API exchanges timestamps as integer Unix milliseconds and some
//! durations as integer microseconds, in JSON bodies and query strings alike.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// A UTC timestamp encoded as Unix milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MilliTime(DateTime<Utc>);

impl MilliTime {
    /// Wrap a timestamp.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    /// The current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Timestamp for the given Unix milliseconds, if representable.
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Milliseconds since the Unix epoch.
    pub fn unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The wrapped timestamp.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for MilliTime {
    fn from(time: DateTime<Utc>) -> Self {
        Self(time)
    }
}

impl From<MilliTime> for DateTime<Utc> {
    fn from(time: MilliTime) -> Self {
        time.0
    }
}

impl fmt::Display for MilliTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Serialize for MilliTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.unix_millis())
    }
}

impl<'de> Deserialize<'de> for MilliTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Self::from_unix_millis(millis).ok_or_else(|| {
            serde::de::Error::custom(format!("timestamp out of range: {millis}ms"))
        })
    }
}

/// A duration encoded as integer microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MicroDuration(Duration);

impl MicroDuration {
    /// Wrap a duration.
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Whole microseconds, saturating at `u64::MAX`.
    pub fn as_micros(&self) -> u64 {
        u64::try_from(self.0.as_micros()).unwrap_or(u64::MAX)
    }

    /// The wrapped duration.
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for MicroDuration {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl Serialize for MicroDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.as_micros())
    }
}

impl<'de> Deserialize<'de> for MicroDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(|micros| Self(Duration::from_micros(micros)))
    }
}
