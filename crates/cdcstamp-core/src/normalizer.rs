use tracing::debug;

use crate::config::{NanosPolicy, NormalizerConfig};
use crate::error::InvalidInputError;
use crate::model::{
    CloudTimestamp, PipelineInstant, MILLIS_PER_SECOND, NANOS_PER_MILLI, NANOS_PER_SECOND,
};

/// Converts database and wire timestamps into pipeline instants and back.
///
/// Both paths into [`PipelineInstant`] truncate to millisecond resolution. The database
/// path goes through a millisecond date value while the wire path works on the raw
/// seconds/nanos pair, so the two are not expected to agree bit for bit on inputs
/// carrying sub-millisecond precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampNormalizer {
    nanos_policy: NanosPolicy,
}

impl TimestampNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            nanos_policy: config.nanos_policy,
        }
    }

    pub fn nanos_policy(&self) -> NanosPolicy {
        self.nanos_policy
    }

    pub fn cloud_to_instant(&self, timestamp: &CloudTimestamp) -> PipelineInstant {
        PipelineInstant::from_epoch_millis(timestamp.to_epoch_millis())
    }

    pub fn optional_cloud_to_instant(
        &self,
        timestamp: Option<&CloudTimestamp>,
    ) -> Result<PipelineInstant, InvalidInputError> {
        match timestamp {
            Some(timestamp) => Ok(self.cloud_to_instant(timestamp)),
            None => {
                debug!("database timestamp missing");
                Err(InvalidInputError::Missing)
            }
        }
    }

    /// `seconds * 1000 + floor(nanos / 1_000_000)`. Pre-epoch seconds are fine; the
    /// nanos field is handled according to the configured [`NanosPolicy`].
    pub fn wire_to_instant(
        &self,
        timestamp: &prost_types::Timestamp,
    ) -> Result<PipelineInstant, InvalidInputError> {
        let (seconds, nanos) = self.wire_parts(timestamp)?;
        let overflow = InvalidInputError::Overflow {
            seconds: timestamp.seconds,
            nanos: timestamp.nanos,
        };
        let millis = seconds
            .checked_mul(MILLIS_PER_SECOND)
            .and_then(|millis| millis.checked_add(i64::from(nanos) / NANOS_PER_MILLI))
            .ok_or_else(|| {
                debug!(
                    seconds = timestamp.seconds,
                    nanos = timestamp.nanos,
                    "wire timestamp overflows epoch millis"
                );
                overflow
            })?;
        Ok(PipelineInstant::from_epoch_millis(millis))
    }

    pub fn optional_wire_to_instant(
        &self,
        timestamp: Option<&prost_types::Timestamp>,
    ) -> Result<PipelineInstant, InvalidInputError> {
        match timestamp {
            Some(timestamp) => self.wire_to_instant(timestamp),
            None => {
                debug!("wire timestamp missing");
                Err(InvalidInputError::Missing)
            }
        }
    }

    pub fn instant_to_cloud(
        &self,
        instant: PipelineInstant,
    ) -> Result<CloudTimestamp, InvalidInputError> {
        CloudTimestamp::from_epoch_millis(instant.epoch_millis())
    }

    fn wire_parts(
        &self,
        timestamp: &prost_types::Timestamp,
    ) -> Result<(i64, i32), InvalidInputError> {
        let nanos = i64::from(timestamp.nanos);
        if (0..NANOS_PER_SECOND).contains(&nanos) {
            return Ok((timestamp.seconds, timestamp.nanos));
        }

        match self.nanos_policy {
            NanosPolicy::Reject => {
                debug!(
                    seconds = timestamp.seconds,
                    nanos = timestamp.nanos,
                    "rejecting wire timestamp with out-of-range nanos"
                );
                Err(InvalidInputError::NanosOutOfRange {
                    nanos: timestamp.nanos,
                })
            }
            NanosPolicy::Normalize => {
                let seconds = timestamp
                    .seconds
                    .checked_add(nanos.div_euclid(NANOS_PER_SECOND))
                    .ok_or(InvalidInputError::Overflow {
                        seconds: timestamp.seconds,
                        nanos: timestamp.nanos,
                    })?;
                let normalized_nanos = nanos.rem_euclid(NANOS_PER_SECOND) as i32;
                debug!(
                    seconds = timestamp.seconds,
                    nanos = timestamp.nanos,
                    normalized_seconds = seconds,
                    normalized_nanos,
                    "normalized wire timestamp nanos"
                );
                Ok((seconds, normalized_nanos))
            }
        }
    }
}

/// Anything the pipeline can turn into a [`PipelineInstant`].
pub trait ToInstant {
    fn to_instant_with(
        &self,
        normalizer: &TimestampNormalizer,
    ) -> Result<PipelineInstant, InvalidInputError>;
}

impl ToInstant for CloudTimestamp {
    fn to_instant_with(
        &self,
        normalizer: &TimestampNormalizer,
    ) -> Result<PipelineInstant, InvalidInputError> {
        Ok(normalizer.cloud_to_instant(self))
    }
}

impl ToInstant for prost_types::Timestamp {
    fn to_instant_with(
        &self,
        normalizer: &TimestampNormalizer,
    ) -> Result<PipelineInstant, InvalidInputError> {
        normalizer.wire_to_instant(self)
    }
}

// Optional protobuf message fields decode as `Option<Timestamp>`.
impl<T: ToInstant> ToInstant for Option<T> {
    fn to_instant_with(
        &self,
        normalizer: &TimestampNormalizer,
    ) -> Result<PipelineInstant, InvalidInputError> {
        match self {
            Some(value) => value.to_instant_with(normalizer),
            None => {
                debug!("optional timestamp missing");
                Err(InvalidInputError::Missing)
            }
        }
    }
}

/// Converts with the default (strict) normalizer.
pub fn to_instant<T: ToInstant + ?Sized>(
    value: &T,
) -> Result<PipelineInstant, InvalidInputError> {
    value.to_instant_with(&TimestampNormalizer::default())
}

pub fn to_cloud_timestamp(instant: PipelineInstant) -> Result<CloudTimestamp, InvalidInputError> {
    TimestampNormalizer::default().instant_to_cloud(instant)
}
