use thiserror::Error;

/// Raised when a timestamp handed to the normalizer cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    #[error("timestamp value is missing")]
    Missing,

    #[error("nanoseconds {nanos} outside [0, 999999999]")]
    NanosOutOfRange { nanos: i32 },

    #[error(
        "timestamp {seconds}s {nanos}ns outside [0001-01-01T00:00:00Z, 9999-12-31T23:59:59.999999999Z]"
    )]
    OutOfRange { seconds: i64, nanos: i32 },

    #[error("timestamp {seconds}s {nanos}ns overflows epoch milliseconds")]
    Overflow { seconds: i64, nanos: i32 },

    #[error("instant {millis}ms cannot be represented as a database timestamp")]
    InstantOutOfRange { millis: i64 },

    #[error("invalid timestamp '{input}': {message}")]
    Parse { input: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read normalizer config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse normalizer config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
