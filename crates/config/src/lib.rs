//! MeshKey Configuration
//!
//! TOML-based configuration for the values a `meshkey_crypto::KeyManager`
//! is constructed with: the rotation/guard intervals, the initial security
//! policy flags, and (optionally) a provisioned master key and PSKc. This
//! crate only supplies the *initial* values handed to the key manager; all
//! runtime changes flow through the key manager's own setters.
//!
//! # Configuration Sources (Priority Order)
//!
//! 1. **Environment variables**: `MESHKEY_*` prefixed variables override all
//! 2. **Config file**: `meshkey.toml` in the current directory or
//!    `~/.config/meshkey/`
//! 3. **Defaults**: the Thread defaults from `spec.md` §3
//!
//! # Example meshkey.toml
//!
//! ```toml
//! [key_manager]
//! key_rotation_hours = 672
//! key_switch_guard_hours = 624
//! security_policy_flags = 0xff
//! # master_key = "00112233445566778899aabbccddeeff"  # 32 hex chars, 16 bytes
//! ```

use meshkey_core::Error as CoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Thread default: 28 days.
pub const DEFAULT_KEY_ROTATION_HOURS: u32 = 672;
/// Thread default guard window.
pub const DEFAULT_KEY_SWITCH_GUARD_HOURS: u32 = 624;
/// Thread default: all security-related behaviors enabled.
pub const DEFAULT_SECURITY_POLICY_FLAGS: u8 = 0xff;
/// Lower bound enforced by `SetKeyRotation` (`spec.md` §3, invariant 4).
pub const MIN_KEY_ROTATION_HOURS: u32 = 1;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Failed to read configuration file
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// `master_key`/`pskc` hex string was not exactly 32 hex characters
    #[error("invalid hex key material: {0}")]
    HexDecode(String),

    /// Environment variable parsing error
    #[error("failed to parse environment variables: {0}")]
    Env(#[from] envy::Error),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Configuration(e.to_string())
    }
}

/// Key-manager section of `meshkey.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyManagerConfig {
    /// Hours between automatic key-sequence advances.
    pub key_rotation_hours: u32,
    /// Minimum hours between successive manual +1 sequence advances.
    pub key_switch_guard_hours: u32,
    /// Initial `SecurityPolicyFlags` value.
    pub security_policy_flags: u8,
    /// Provisioned master key as 32 lowercase hex characters, if any.
    /// Absent means the well-known default master key is used, which is a
    /// pre-provisioning placeholder only (see `spec.md` §9) — `Config::load`
    /// logs a warning whenever this is unset.
    #[serde(rename = "master_key")]
    pub master_key_hex: Option<String>,
    /// Provisioned PSKc as 32 lowercase hex characters, if any.
    #[serde(rename = "pskc")]
    pub pskc_hex: Option<String>,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            key_rotation_hours: DEFAULT_KEY_ROTATION_HOURS,
            key_switch_guard_hours: DEFAULT_KEY_SWITCH_GUARD_HOURS,
            security_policy_flags: DEFAULT_SECURITY_POLICY_FLAGS,
            master_key_hex: None,
            pskc_hex: None,
        }
    }
}

/// Top-level MeshKey configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub key_manager: KeyManagerConfig,
}

impl Config {
    /// Load configuration with the following priority:
    /// 1. Environment variables (`MESHKEY_*`)
    /// 2. Config file (if found)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = Self::find_config_file() {
            config = Self::load_from_file(&path)?;
        }

        config = Self::apply_env_overrides(config);
        config.validate()?;

        if config.key_manager.master_key_hex.is_none() {
            tracing::warn!(
                "no master_key configured; falling back to the well-known default master key, \
                 which must not be used in production"
            );
        }

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `./meshkey.toml`, then `~/.config/meshkey/meshkey.toml`.
    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from("meshkey.toml");
        if local.exists() {
            return Some(local);
        }

        let user = dirs::home_dir()?.join(".config").join("meshkey").join("meshkey.toml");
        user.exists().then_some(user)
    }

    fn apply_env_overrides(mut config: Config) -> Self {
        if let Ok(v) = std::env::var("MESHKEY_KEY_ROTATION_HOURS") {
            if let Ok(hours) = v.parse() {
                config.key_manager.key_rotation_hours = hours;
            }
        }
        if let Ok(v) = std::env::var("MESHKEY_KEY_SWITCH_GUARD_HOURS") {
            if let Ok(hours) = v.parse() {
                config.key_manager.key_switch_guard_hours = hours;
            }
        }
        if let Ok(v) = std::env::var("MESHKEY_MASTER_KEY") {
            config.key_manager.master_key_hex = Some(v);
        }
        config
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.key_manager.key_rotation_hours < MIN_KEY_ROTATION_HOURS {
            return Err(ConfigError::Validation(format!(
                "key_manager.key_rotation_hours must be >= {MIN_KEY_ROTATION_HOURS}"
            )));
        }

        if let Some(hex) = &self.key_manager.master_key_hex {
            decode_key_hex(hex)?;
        }
        if let Some(hex) = &self.key_manager.pskc_hex {
            decode_key_hex(hex)?;
        }

        Ok(())
    }

    /// Save configuration to a file (used by provisioning tools).
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Validation(format!("failed to serialize config: {e}")))?;

        fs::write(path, toml_string).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Decode `master_key_hex`, or `None` if unset (caller should then use
    /// the well-known default master key).
    pub fn master_key(&self) -> Result<Option<[u8; 16]>, ConfigError> {
        self.key_manager.master_key_hex.as_deref().map(decode_key_hex).transpose()
    }

    /// Decode `pskc_hex`, if provisioned.
    pub fn pskc(&self) -> Result<Option<[u8; 16]>, ConfigError> {
        self.key_manager.pskc_hex.as_deref().map(decode_key_hex).transpose()
    }
}

fn decode_key_hex(hex: &str) -> Result<[u8; 16], ConfigError> {
    let bytes = hex::decode(hex).map_err(|e| ConfigError::HexDecode(e.to_string()))?;
    let array: [u8; 16] = bytes
        .try_into()
        .map_err(|_| ConfigError::HexDecode("expected exactly 16 bytes (32 hex characters)".into()))?;
    Ok(array)
}
