use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;

pub(crate) const MILLIS_PER_SECOND: i64 = 1_000;
pub(crate) const NANOS_PER_MILLI: i64 = 1_000_000;
pub(crate) const NANOS_PER_SECOND: i64 = 1_000_000_000;

// Every `CloudTimestamp` is checked against these bounds on construction, which keeps
// `to_datetime` inside chrono's representable range.
/// 0001-01-01T00:00:00Z
const MIN_SECONDS: i64 = -62_135_596_800;
/// 9999-12-31T23:59:59Z
const MAX_SECONDS: i64 = 253_402_300_799;
const MAX_NANOS: i32 = 999_999_999;

/// Millisecond-resolution point in time used inside the pipeline for ordering and
/// windowing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PipelineInstant(i64);

impl PipelineInstant {
    pub const EPOCH: PipelineInstant = PipelineInstant(0);

    pub const fn from_epoch_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn epoch_millis(&self) -> i64 {
        self.0
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Returns `None` when the instant lies outside the range chrono can represent.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for PipelineInstant {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

impl fmt::Display for PipelineInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Timestamp as stored by the cloud database: whole seconds since the epoch plus a
/// non-negative nanosecond offset, limited to years 0001 through 9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CloudTimestamp {
    seconds: i64,
    nanos: i32,
}

impl CloudTimestamp {
    pub const MIN: CloudTimestamp = CloudTimestamp {
        seconds: MIN_SECONDS,
        nanos: 0,
    };

    pub const MAX: CloudTimestamp = CloudTimestamp {
        seconds: MAX_SECONDS,
        nanos: MAX_NANOS,
    };

    pub fn from_seconds_and_nanos(seconds: i64, nanos: i32) -> Result<Self, InvalidInputError> {
        if !(0..=MAX_NANOS).contains(&nanos) {
            return Err(InvalidInputError::NanosOutOfRange { nanos });
        }
        if !(MIN_SECONDS..=MAX_SECONDS).contains(&seconds) {
            return Err(InvalidInputError::OutOfRange { seconds, nanos });
        }
        Ok(Self { seconds, nanos })
    }

    /// Builds a timestamp from a millisecond date value. The sub-second part is
    /// always the non-negative remainder, so `-1` maps to `(-1s, 999_000_000ns)`.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, InvalidInputError> {
        let seconds = millis.div_euclid(MILLIS_PER_SECOND);
        let nanos = (millis.rem_euclid(MILLIS_PER_SECOND) * NANOS_PER_MILLI) as i32;
        Self::from_seconds_and_nanos(seconds, nanos)
            .map_err(|_| InvalidInputError::InstantOutOfRange { millis })
    }

    /// Millisecond date value, truncating any sub-millisecond nanoseconds.
    pub fn to_epoch_millis(&self) -> i64 {
        self.seconds * MILLIS_PER_SECOND + i64::from(self.nanos) / NANOS_PER_MILLI
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Result<Self, InvalidInputError> {
        // chrono reports a leap second as nanos >= 1e9.
        let nanos = value.timestamp_subsec_nanos();
        if i64::from(nanos) >= NANOS_PER_SECOND {
            return Err(leap_second(value.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
        }
        Self::from_seconds_and_nanos(value.timestamp(), nanos as i32)
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
            .expect("years 0001..=9999 are within chrono's range")
    }

    pub fn from_proto(value: &prost_types::Timestamp) -> Result<Self, InvalidInputError> {
        Self::from_seconds_and_nanos(value.seconds, value.nanos)
    }

    pub fn to_proto(&self) -> prost_types::Timestamp {
        prost_types::Timestamp {
            seconds: self.seconds,
            nanos: self.nanos,
        }
    }
}

impl fmt::Display for CloudTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            &self
                .to_datetime()
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )
    }
}

impl FromStr for CloudTimestamp {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed =
            DateTime::parse_from_rfc3339(trimmed).map_err(|err| InvalidInputError::Parse {
                input: trimmed.to_string(),
                message: err.to_string(),
            })?;
        Self::from_datetime(parsed.with_timezone(&Utc)).map_err(|err| match err {
            InvalidInputError::Parse { message, .. } => InvalidInputError::Parse {
                input: trimmed.to_string(),
                message,
            },
            other => other,
        })
    }
}

fn leap_second(input: String) -> InvalidInputError {
    InvalidInputError::Parse {
        input,
        message: "leap seconds are not supported".to_string(),
    }
}

impl TryFrom<String> for CloudTimestamp {
    type Error = InvalidInputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CloudTimestamp> for String {
    fn from(value: CloudTimestamp) -> Self {
        value.to_string()
    }
}

impl TryFrom<prost_types::Timestamp> for CloudTimestamp {
    type Error = InvalidInputError;

    fn try_from(value: prost_types::Timestamp) -> Result<Self, Self::Error> {
        Self::from_proto(&value)
    }
}

impl From<CloudTimestamp> for prost_types::Timestamp {
    fn from(value: CloudTimestamp) -> Self {
        value.to_proto()
    }
}
