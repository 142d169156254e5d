pub mod config;
pub mod error;
pub mod model;
mod normalizer;

pub use config::{NanosPolicy, NormalizerConfig};
pub use error::{ConfigError, InvalidInputError};
pub use model::{CloudTimestamp, PipelineInstant};
pub use normalizer::{to_cloud_timestamp, to_instant, TimestampNormalizer, ToInstant};
