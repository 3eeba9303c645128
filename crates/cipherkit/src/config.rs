//! Per-session configuration.

use crate::error::CipherError;
use crate::primitive::MAX_TAG_LEN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default authentication tag length in bytes.
pub const DEFAULT_TAG_LEN: usize = 16;

/// Options applied when a session starts.
///
/// ```toml
/// padding = false
/// tag_len = 12
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// PKCS#7 padding for ECB/CBC. Ignored by stream and authenticated modes.
    pub padding: bool,
    /// Tag length returned by [`CipherSession::tag`](crate::CipherSession::tag)
    pub tag_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            padding: true,
            tag_len: DEFAULT_TAG_LEN,
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Config`] if the document is malformed or the
    /// values are out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self, CipherError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| CipherError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Config`] if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CipherError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| CipherError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, CipherError> {
        toml::to_string_pretty(self).map_err(|e| CipherError::Config(e.to_string()))
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidTagLength`] if `tag_len` is not in 1..=16.
    pub fn validate(&self) -> Result<(), CipherError> {
        if self.tag_len == 0 || self.tag_len > MAX_TAG_LEN {
            return Err(CipherError::InvalidTagLength(self.tag_len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert!(config.padding);
        assert_eq!(config.tag_len, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = SessionConfig::from_toml_str("tag_len = 12").unwrap();
        assert!(config.padding);
        assert_eq!(config.tag_len, 12);
    }

    #[test]
    fn test_out_of_range_tag_len() {
        assert!(matches!(
            SessionConfig::from_toml_str("tag_len = 17"),
            Err(CipherError::InvalidTagLength(17))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("tag_len = 0"),
            Err(CipherError::InvalidTagLength(0))
        ));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            SessionConfig::from_toml_str("padding = \"yes\""),
            Err(CipherError::Config(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SessionConfig {
            padding: false,
            tag_len: 8,
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "padding = false").unwrap();
        let config = SessionConfig::from_file(file.path()).unwrap();
        assert!(!config.padding);
        assert_eq!(config.tag_len, DEFAULT_TAG_LEN);

        assert!(matches!(
            SessionConfig::from_file("/nonexistent/cipherkit.toml"),
            Err(CipherError::Config(_))
        ));
    }
}
