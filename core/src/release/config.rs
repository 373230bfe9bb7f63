//! src/release/config.rs
//! Runtime configuration for a packaging run.
//!
//! Notes:
//! - `ReleaseConfig` is what the packager consumes: paths, key size, raw key bytes,
//!   version and developer tag.
//! - `ConfigFile` is the JSON form on disk. Keys are written as `hex:...` or
//!   `text:...` and resolved against the configured key size.
//! - Policy: the chip key must stay the same for the lifetime of the product;
//!   bootloaders in the field only know that one. The platform key may rotate.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cipher::{parse_key, KeyError, KeySize};
use crate::constants::{DEFAULT_DESTINATION_FILE, DEFAULT_DEVELOPER, DEFAULT_SOURCE_FILE, DEVELOPER_TAG_LEN};
use crate::headers::FirmwareVersion;
use crate::utils::same_file;

#[derive(Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub key_size: KeySize,
    pub chip_key: Vec<u8>,
    pub platform_key: Vec<u8>,
    pub version: FirmwareVersion,
    pub developer: String,
}

impl ReleaseConfig {
    /// Config with default paths, version and developer; key size follows the chip key length.
    pub fn new(chip_key: Vec<u8>, platform_key: Vec<u8>) -> Self {
        let key_size = KeySize::from_key_len(chip_key.len()).unwrap_or_default();
        Self {
            source: PathBuf::from(DEFAULT_SOURCE_FILE),
            destination: PathBuf::from(DEFAULT_DESTINATION_FILE),
            key_size,
            chip_key,
            platform_key,
            version: FirmwareVersion::default(),
            developer: DEFAULT_DEVELOPER.to_string(),
        }
    }

    pub fn with_paths(mut self, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self.destination = destination.into();
        self
    }

    pub fn with_version(mut self, version: FirmwareVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_developer(mut self, developer: impl Into<String>) -> Self {
        self.developer = developer.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let need = self.key_size.key_len();
        for key in [&self.chip_key, &self.platform_key] {
            if key.len() != need {
                return Err(ConfigError::Key(KeyError::InvalidLength { expected: need, actual: key.len() }));
            }
        }

        if self.developer.len() > DEVELOPER_TAG_LEN {
            return Err(ConfigError::DeveloperTagTooLong { max: DEVELOPER_TAG_LEN, actual: self.developer.len() });
        }

        // File::create would truncate the firmware before it is read.
        if same_file(&self.source, &self.destination) {
            return Err(ConfigError::SamePath(self.source.clone()));
        }

        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.resolve()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&text)
    }
}

// Keys stay out of logs and panic messages.
impl fmt::Debug for ReleaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseConfig")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("key_size", &self.key_size)
            .field("chip_key", &"<redacted>")
            .field("platform_key", &"<redacted>")
            .field("version", &self.version)
            .field("developer", &self.developer)
            .finish()
    }
}

/// On-disk JSON form. Missing fields fall back to the legacy build defaults,
/// except the keys, which are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub key_size: KeySize,
    pub chip_key: Option<String>,
    pub platform_key: Option<String>,
    pub version: FirmwareVersion,
    pub developer: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE_FILE),
            destination: PathBuf::from(DEFAULT_DESTINATION_FILE),
            key_size: KeySize::default(),
            chip_key: None,
            platform_key: None,
            version: FirmwareVersion::default(),
            developer: DEFAULT_DEVELOPER.to_string(),
        }
    }
}

impl ConfigFile {
    pub fn resolve(self) -> Result<ReleaseConfig, ConfigError> {
        let chip = self.chip_key.ok_or(ConfigError::MissingKey("chip_key"))?;
        let platform = self.platform_key.ok_or(ConfigError::MissingKey("platform_key"))?;

        let config = ReleaseConfig {
            source: self.source,
            destination: self.destination,
            key_size: self.key_size,
            chip_key: parse_key(&chip, self.key_size)?,
            platform_key: parse_key(&platform, self.key_size)?,
            version: self.version,
            developer: self.developer,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Read { path: PathBuf, source: io::Error },

    /// JSON did not parse or had unknown fields.
    Parse(String),

    /// Required key entry is absent.
    MissingKey(&'static str),

    /// Key text or length problem.
    Key(KeyError),

    /// Developer tag does not fit the header field.
    DeveloperTagTooLong { max: usize, actual: usize },

    /// Source and destination are the same file.
    SamePath(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConfigError::*;
        match self {
            Read { path, source } => write!(f, "cannot read config {}: {}", path.display(), source),
            Parse(msg) => write!(f, "cannot parse config: {}", msg),
            MissingKey(name) => write!(f, "missing required key `{}`", name),
            Key(e) => write!(f, "{}", e),
            DeveloperTagTooLong { max, actual } =>
                write!(f, "developer tag too long: {} > {} bytes", actual, max),
            SamePath(p) => write!(f, "source and destination are the same file: {}", p.display()),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<KeyError> for ConfigError {
    fn from(e: KeyError) -> Self {
        ConfigError::Key(e)
    }
}
