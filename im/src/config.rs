//! ingestmap configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ingest::{DEFAULT_PREVIEW_LIMIT, DEFAULT_SNIPPET_LEN, PreviewOptions};
use crate::mapping::{Assembler, E164Normalizer, TransformEngine};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum assembled records shown by a preview
    #[serde(rename = "preview-limit")]
    pub preview_limit: usize,

    /// Maximum length of source snippets attached to errors
    #[serde(rename = "snippet-max-len")]
    pub snippet_max_len: usize,

    /// Phone normalization settings
    pub phone: PhoneConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            snippet_max_len: DEFAULT_SNIPPET_LEN,
            phone: PhoneConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        let code = &self.phone.default_country_code;
        if code.is_empty() || code.len() > 3 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(eyre::eyre!(
                "phone.default-country-code must be 1-3 digits, got '{}'",
                code
            ));
        }
        if !(4..=14).contains(&self.phone.national_number_length) {
            return Err(eyre::eyre!(
                "phone.national-number-length must be between 4 and 14, got {}",
                self.phone.national_number_length
            ));
        }
        if let Some(prefix) = &self.phone.trunk_prefix
            && (prefix.is_empty() || prefix.len() > 2 || !prefix.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(eyre::eyre!("phone.trunk-prefix must be 1-2 digits, got '{}'", prefix));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./ingestmap.yml
        let local_config = PathBuf::from("ingestmap.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/ingestmap/ingestmap.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ingestmap").join("ingestmap.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Transform engine using the configured phone normalizer
    pub fn transform_engine(&self) -> TransformEngine {
        let mut normalizer = E164Normalizer::new(
            self.phone.default_country_code.clone(),
            self.phone.national_number_length,
        );
        if let Some(prefix) = &self.phone.trunk_prefix {
            normalizer = normalizer.with_trunk_prefix(prefix.clone());
        }
        TransformEngine::new(Arc::new(normalizer))
    }

    pub fn assembler(&self) -> Assembler {
        Assembler::new(self.transform_engine())
    }

    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            limit: self.preview_limit,
            snippet_len: self.snippet_max_len,
        }
    }
}

/// Phone normalization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneConfig {
    /// Country code assumed for national numbers
    #[serde(rename = "default-country-code")]
    pub default_country_code: String,

    /// Digit count of a national number in the default country
    #[serde(rename = "national-number-length")]
    pub national_number_length: usize,

    /// Prefix dialed before national numbers, e.g. "0"; unset for NANP
    #[serde(rename = "trunk-prefix", skip_serializing_if = "Option::is_none")]
    pub trunk_prefix: Option<String>,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            default_country_code: "1".to_string(),
            national_number_length: 10,
            trunk_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldTransform;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.preview_limit, 10);
        assert_eq!(config.snippet_max_len, 200);
        assert_eq!(config.phone.default_country_code, "1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("preview-limit: 3\nphone:\n  default-country-code: \"44\"\n").unwrap();
        assert_eq!(config.preview_limit, 3);
        assert_eq!(config.snippet_max_len, 200);
        assert_eq!(config.phone.default_country_code, "44");
        assert_eq!(config.phone.national_number_length, 10);
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ingestmap.yml");
        fs::write(&path, "snippet-max-len: 64\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.snippet_max_len, 64);
        assert_eq!(config.preview_options().snippet_len, 64);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_phone_settings() {
        let mut config = Config::default();
        config.phone.default_country_code = "+1".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.phone.national_number_length = 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.phone.trunk_prefix = Some("O".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transform_engine_uses_phone_config() {
        let mut config = Config::default();
        config.phone.default_country_code = "44".to_string();

        let engine = config.transform_engine();
        assert_eq!(
            engine.apply(&json!("20 7946 0958"), Some(&FieldTransform::PhoneNormalize)),
            Some(json!("+442079460958"))
        );
    }

    #[test]
    fn test_trunk_prefix_from_yaml() {
        let config: Config = serde_yaml::from_str(
            "phone:\n  default-country-code: \"44\"\n  trunk-prefix: \"0\"\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let engine = config.transform_engine();
        for raw in ["020 7946 0958", "+44 20 7946 0958"] {
            assert_eq!(
                engine.apply(&json!(raw), Some(&FieldTransform::PhoneNormalize)),
                Some(json!("+442079460958"))
            );
        }
    }
}
