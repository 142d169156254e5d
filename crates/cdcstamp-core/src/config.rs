use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with a wire timestamp whose `nanos` field is outside `[0, 999_999_999]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanosPolicy {
    /// Fail with `InvalidInputError::NanosOutOfRange`.
    #[default]
    Reject,
    /// Carry whole seconds out of the nanos field before converting.
    Normalize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerConfig {
    pub nanos_policy: NanosPolicy,
}

impl NormalizerConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_config_defaults_to_reject() {
        let config = NormalizerConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config.nanos_policy, NanosPolicy::Reject);
    }

    #[test]
    fn parses_normalize_policy() {
        let config = NormalizerConfig::from_toml_str(r#"nanos_policy = "normalize""#)
            .expect("parse config");
        assert_eq!(config.nanos_policy, NanosPolicy::Normalize);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = NormalizerConfig::from_toml_str("rounding = \"half_up\"")
            .expect_err("unknown key should fail");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(NormalizerConfig::from_toml_str(r#"nanos_policy = "clamp""#).is_err());
    }

    #[test]
    fn loads_policy_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp config");
        writeln!(file, "nanos_policy = \"normalize\"").expect("write temp config");

        let config = NormalizerConfig::load(file.path()).expect("load config");
        assert_eq!(config.nanos_policy, NanosPolicy::Normalize);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = NormalizerConfig::load("/nonexistent/cdcstamp.toml")
            .expect_err("missing file should fail");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
