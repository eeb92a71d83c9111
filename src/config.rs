use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Default timezone statement dates are interpreted in.
fn default_timezone() -> String {
    "America/Toronto".to_string()
}

fn default_headless() -> bool {
    true
}

/// The `[pcmc]` section: sign-in credentials and the incremental cutoff.
///
/// Credentials left unset here are looked up in the environment
/// (`PCMC_PLUGIN_USERNAME`, `PCMC_PLUGIN_PASSWORD`,
/// `PCMC_PLUGIN_SECURITYANSWER`).
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmcConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub security_answer: Option<String>,

    /// Epoch milliseconds of the newest transaction already exported.
    /// Overrides the watermark persisted by the previous run.
    pub most_recent_transaction_date: Option<i64>,
}

impl fmt::Debug for PcmcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("PcmcConfig")
            .field("username", &redact(&self.username))
            .field("password", &redact(&self.password))
            .field("security_answer", &redact(&self.security_answer))
            .field(
                "most_recent_transaction_date",
                &self.most_recent_transaction_date,
            )
            .finish()
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run Chrome without a visible window.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Chrome/Chromium executable. Auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_executable: None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// IANA timezone statement dates are rendered in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub pcmc: PcmcConfig,

    #[serde(default)]
    pub browser: BrowserSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            timezone: default_timezone(),
            pcmc: PcmcConfig::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }

    pub fn resolve_timezone(&self) -> Result<Tz, ConfigurationError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigurationError::InvalidTimezone {
                value: self.timezone.clone(),
            })
    }
}

/// Loaded configuration with resolved paths and timezone.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved data directory path.
    pub data_dir: PathBuf,

    pub timezone: Tz,

    pub pcmc: PcmcConfig,

    pub browser: BrowserSettings,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./pcmc-scrape.toml` if it exists in current directory
/// 2. `~/.local/share/pcmc-scrape/pcmc-scrape.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("pcmc-scrape.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("pcmc-scrape").join("pcmc-scrape.toml");
    }

    local_config
}

impl ResolvedConfig {
    fn from_config(config: Config, config_dir: &Path) -> Result<Self> {
        let timezone = config.resolve_timezone()?;
        Ok(Self {
            data_dir: config.resolve_data_dir(config_dir),
            timezone,
            pcmc: config.pcmc,
            browser: config.browser,
        })
    }

    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        Self::from_config(config, config_dir)
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// Without a config file the data directory is the directory the config
    /// file would live in.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Self::from_config(Config::default(), config_dir)
    }
}
