//! Runtime configuration for the RSP HLE, stored as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::{log, LogCategory, LogLevel};

/// Default RDRAM size with the expansion pak inserted
pub const DEFAULT_RDRAM_SIZE: usize = 0x80_0000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid checksum key {0:?} (expected hex, e.g. \"0x1e24\")")]
    InvalidChecksum(String),
    #[error("RDRAM size {0:#x} is not a power of two")]
    InvalidRdramSize(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HleConfig {
    /// Hand audio tasks to an external audio plugin instead of emulating them
    #[serde(default)]
    pub forward_audio: bool,
    /// Hand graphics tasks to the external graphics plugin
    #[serde(default = "default_true")]
    pub forward_gfx: bool,
    /// Write diagnostic dumps for unrecognized ucodes
    #[serde(default = "default_true")]
    pub dumps_enabled: bool,
    /// Directory for diagnostic dumps
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
    /// RDRAM size in bytes (power of two)
    #[serde(default = "default_rdram_size")]
    pub rdram_size: usize,
    /// Extra ucode byte-sum checksums, hex sum -> dialect name
    #[serde(default)]
    pub extra_checksums: BTreeMap<String, String>,
    /// Global log level name (see `LogLevel::from_str`)
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_rdram_size() -> usize {
    DEFAULT_RDRAM_SIZE
}

impl Default for HleConfig {
    fn default() -> Self {
        Self {
            forward_audio: false,
            forward_gfx: true,
            dumps_enabled: true,
            dump_dir: default_dump_dir(),
            rdram_size: DEFAULT_RDRAM_SIZE,
            extra_checksums: BTreeMap::new(),
            log_level: None,
        }
    }
}

/// Parse a hex checksum key, with or without a `0x` prefix.
pub fn parse_checksum_key(key: &str) -> Result<u32, ConfigError> {
    let digits = key
        .strip_prefix("0x")
        .or_else(|| key.strip_prefix("0X"))
        .unwrap_or(key);
    u32::from_str_radix(digits, 16).map_err(|_| ConfigError::InvalidChecksum(key.to_string()))
}

impl HleConfig {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unparsable.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log(LogCategory::Task, LogLevel::Warn, || {
                        format!(
                            "Failed to parse {}: {}. Using defaults.",
                            path.display(),
                            e
                        )
                    });
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Strict variant of [`HleConfig::load`] for callers that want the error.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rdram_size.is_power_of_two() {
            return Err(ConfigError::InvalidRdramSize(self.rdram_size));
        }
        self.parsed_checksums().map(|_| ())
    }

    /// `extra_checksums` with the keys parsed as hex numbers.
    pub fn parsed_checksums(&self) -> Result<Vec<(u32, &str)>, ConfigError> {
        self.extra_checksums
            .iter()
            .map(|(key, dialect)| parse_checksum_key(key).map(|sum| (sum, dialect.as_str())))
            .collect()
    }

    /// The configured global log level, if it names a valid level
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref().and_then(LogLevel::from_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HleConfig::default();
        assert!(!config.forward_audio);
        assert!(config.forward_gfx);
        assert!(config.dumps_enabled);
        assert_eq!(config.rdram_size, 0x80_0000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: HleConfig = serde_json::from_str(r#"{"forward_audio": true}"#).unwrap();
        assert!(config.forward_audio);
        assert!(config.forward_gfx);
        assert_eq!(config.dump_dir, PathBuf::from("."));
    }

    #[test]
    fn test_parsed_checksums() {
        let mut config = HleConfig::default();
        config
            .extra_checksums
            .insert("0x1e24".to_string(), "audio".to_string());
        config
            .extra_checksums
            .insert("2caa6".to_string(), "nead_oot".to_string());

        let sums = config.parsed_checksums().unwrap();
        assert!(sums.contains(&(0x1e24, "audio")));
        assert!(sums.contains(&(0x2caa6, "nead_oot")));

        config
            .extra_checksums
            .insert("zz".to_string(), "audio".to_string());
        assert!(matches!(
            config.parsed_checksums(),
            Err(ConfigError::InvalidChecksum(_))
        ));
    }

    #[test]
    fn test_rdram_size_must_be_power_of_two() {
        let config = HleConfig {
            rdram_size: 0x60_0000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRdramSize(0x60_0000))
        ));
    }

    #[test]
    fn test_config_save_load() {
        let test_dir = std::env::temp_dir().join("hle_core_test_config");
        fs::create_dir_all(&test_dir).unwrap();
        let path = test_dir.join("rsp_hle.json");

        let config = HleConfig {
            forward_gfx: false,
            dump_dir: PathBuf::from("/tmp/dumps"),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = HleConfig::try_load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_level(), Some(LogLevel::Debug));

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(HleConfig::load(&path), HleConfig::default());

        fs::remove_dir_all(&test_dir).unwrap();
    }
}
