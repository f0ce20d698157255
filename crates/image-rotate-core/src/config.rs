//! Runtime configuration for the rotator.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::DecodeLimits;
use crate::encode::DEFAULT_QUALITY;
use crate::storage::CacheDirectories;
use crate::transform::InterpolationFilter;

pub const DEFAULT_TEMP_FILE_PREFIX: &str = "rotated_image_";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

const ENV_TEMP_FILE_PREFIX: &str = "IMAGE_ROTATE_TEMP_PREFIX";
const ENV_QUALITY: &str = "IMAGE_ROTATE_QUALITY";
const ENV_FILTER: &str = "IMAGE_ROTATE_FILTER";
const ENV_CACHE_DIR: &str = "IMAGE_ROTATE_CACHE_DIR";
const ENV_EXTERNAL_CACHE_DIR: &str = "IMAGE_ROTATE_EXTERNAL_CACHE_DIR";
const ENV_MAX_ALLOC_BYTES: &str = "IMAGE_ROTATE_MAX_ALLOC_BYTES";
const ENV_CONNECT_TIMEOUT_SECS: &str = "IMAGE_ROTATE_CONNECT_TIMEOUT_SECS";
const ENV_SWEEP_ON_START: &str = "IMAGE_ROTATE_SWEEP_ON_START";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Rotator settings.
///
/// `max_alloc_bytes` of `None` disables the allocation ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    pub temp_file_prefix: String,
    pub quality: u8,
    pub filter: InterpolationFilter,
    pub internal_cache_dir: Option<PathBuf>,
    pub external_cache_dir: Option<PathBuf>,
    pub max_alloc_bytes: Option<u64>,
    pub connect_timeout_secs: u64,
    pub sweep_on_start: bool,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            temp_file_prefix: DEFAULT_TEMP_FILE_PREFIX.to_string(),
            quality: DEFAULT_QUALITY,
            filter: InterpolationFilter::default(),
            internal_cache_dir: Some(env::temp_dir()),
            external_cache_dir: None,
            max_alloc_bytes: Some(DecodeLimits::DEFAULT_MAX_ALLOC),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            sweep_on_start: true,
        }
    }
}

impl RotateConfig {
    /// Defaults overridden by any `IMAGE_ROTATE_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RotateConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(prefix) = lookup(ENV_TEMP_FILE_PREFIX) {
            config.temp_file_prefix = prefix;
        }
        if let Some(value) = lookup(ENV_QUALITY) {
            config.quality = parse(ENV_QUALITY, &value)?;
        }
        if let Some(value) = lookup(ENV_FILTER) {
            config.filter = parse(ENV_FILTER, &value)?;
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            config.internal_cache_dir = non_empty(dir).map(PathBuf::from);
        }
        if let Some(dir) = lookup(ENV_EXTERNAL_CACHE_DIR) {
            config.external_cache_dir = non_empty(dir).map(PathBuf::from);
        }
        if let Some(value) = lookup(ENV_MAX_ALLOC_BYTES) {
            // 0 lifts the ceiling
            let bytes: u64 = parse(ENV_MAX_ALLOC_BYTES, &value)?;
            config.max_alloc_bytes = (bytes > 0).then_some(bytes);
        }
        if let Some(value) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            config.connect_timeout_secs = parse(ENV_CONNECT_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_SWEEP_ON_START) {
            config.sweep_on_start = parse_bool(ENV_SWEEP_ON_START, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.temp_file_prefix;
        if prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "temp_file_prefix",
                message: "must not be empty".to_string(),
            });
        }
        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                key: "temp_file_prefix",
                message: format!("must not contain path separators: {prefix:?}"),
            });
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::InvalidValue {
                key: "quality",
                message: format!("{} is outside 1..=100", self.quality),
            });
        }
        Ok(())
    }

    pub fn cache_directories(&self) -> CacheDirectories {
        CacheDirectories::new(
            self.internal_cache_dir.clone(),
            self.external_cache_dir.clone(),
        )
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits::new(self.max_alloc_bytes)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            message: format!("{value:?}: {e}"),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            message: format!("{value:?} is not a boolean"),
        }),
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<RotateConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RotateConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = RotateConfig::default();
        assert_eq!(config.temp_file_prefix, "rotated_image_");
        assert_eq!(config.quality, 90);
        assert_eq!(config.filter, InterpolationFilter::Bilinear);
        assert_eq!(config.internal_cache_dir, Some(env::temp_dir()));
        assert_eq!(config.external_cache_dir, None);
        assert_eq!(config.max_alloc_bytes, Some(512 * 1024 * 1024));
        assert!(config.sweep_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(from_vars(&[]).unwrap(), RotateConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = from_vars(&[
            ("IMAGE_ROTATE_TEMP_PREFIX", "turned_"),
            ("IMAGE_ROTATE_QUALITY", "75"),
            ("IMAGE_ROTATE_FILTER", "lanczos3"),
            ("IMAGE_ROTATE_CACHE_DIR", "/var/cache/rot"),
            ("IMAGE_ROTATE_EXTERNAL_CACHE_DIR", "/mnt/sd/cache"),
            ("IMAGE_ROTATE_MAX_ALLOC_BYTES", "0"),
            ("IMAGE_ROTATE_CONNECT_TIMEOUT_SECS", "5"),
            ("IMAGE_ROTATE_SWEEP_ON_START", "false"),
        ])
        .unwrap();

        assert_eq!(config.temp_file_prefix, "turned_");
        assert_eq!(config.quality, 75);
        assert_eq!(config.filter, InterpolationFilter::Lanczos3);
        assert_eq!(config.internal_cache_dir, Some(PathBuf::from("/var/cache/rot")));
        assert_eq!(config.external_cache_dir, Some(PathBuf::from("/mnt/sd/cache")));
        assert_eq!(config.max_alloc_bytes, None);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert!(!config.sweep_on_start);
    }

    #[test]
    fn test_blank_cache_dir_disables_root() {
        let config = from_vars(&[("IMAGE_ROTATE_CACHE_DIR", "")]).unwrap();
        assert_eq!(config.internal_cache_dir, None);
    }

    #[test]
    fn test_bad_values_name_the_variable() {
        let err = from_vars(&[("IMAGE_ROTATE_QUALITY", "high")]).unwrap_err();
        assert!(err.to_string().contains("IMAGE_ROTATE_QUALITY"));

        let err = from_vars(&[("IMAGE_ROTATE_SWEEP_ON_START", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("IMAGE_ROTATE_SWEEP_ON_START"));

        assert!(from_vars(&[("IMAGE_ROTATE_FILTER", "nearest")]).is_err());
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = RotateConfig::default();
        config.temp_file_prefix = String::new();
        assert!(config.validate().is_err());

        config.temp_file_prefix = "../escape_".to_string();
        assert!(config.validate().is_err());

        config.temp_file_prefix = "ok_".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_quality() {
        let mut config = RotateConfig::default();
        config.quality = 0;
        assert!(config.validate().is_err());
        config.quality = 101;
        assert!(config.validate().is_err());
        config.quality = 1;
        assert!(config.validate().is_ok());
        config.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_directories_and_limits() {
        let mut config = RotateConfig::default();
        config.internal_cache_dir = Some("/a".into());
        config.external_cache_dir = Some("/b".into());
        config.max_alloc_bytes = None;

        let dirs = config.cache_directories();
        assert_eq!(dirs.internal, Some(PathBuf::from("/a")));
        assert_eq!(dirs.external, Some(PathBuf::from("/b")));
        assert!(config.decode_limits().allows(u64::MAX));
    }
}
