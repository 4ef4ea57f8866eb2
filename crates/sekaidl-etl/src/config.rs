use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

/// Configuration for sekaidl.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (SEKAIDL_* prefix)
/// 3. Config file (~/.config/sekaidl/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the wiki. Relative links on its pages are resolved against it.
    ///
    /// Can be set via:
    /// - ENV: SEKAIDL_BASE_URL
    /// - Config: base_url = "https://..."
    pub base_url: String,

    /// Path of the song index page, relative to `base_url`.
    pub index_path: String,

    /// Output root. Deleted and recreated at the start of every run.
    ///
    /// Can be set via:
    /// - CLI: --output-dir /path/to/out
    /// - ENV: SEKAIDL_OUTPUT_DIR
    /// - Config: output_dir = "out"
    pub output_dir: PathBuf,

    /// Only songs added strictly before `today - cutoff_days` are kept.
    ///
    /// Can be set via:
    /// - CLI: --cutoff-days 60
    /// - ENV: SEKAIDL_CUTOFF_DAYS
    /// - Config: cutoff_days = 60
    pub cutoff_days: u32,

    /// Brand suffix stripped from page titles.
    pub title_suffix: String,

    /// Album tag written to every file.
    pub album: String,

    pub http: HttpConfig,
    pub transcoder: TranscoderConfig,
    pub logging: LoggingConfig,
}

/// Request identity and transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub referer: String,
    pub timeout_secs: u64,
    /// Retries for connection failures and timeouts. HTTP error statuses
    /// are never retried.
    pub retries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    /// ffmpeg executable, looked up on PATH when not absolute.
    pub program: PathBuf,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    pub level: String,
    pub coloured: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.sekaipedia.org".to_string(),
            index_path: "/wiki/List_of_songs".to_string(),
            output_dir: PathBuf::from("out"),
            cutoff_days: 60,
            title_suffix: " - Sekaipedia".to_string(),
            album: "Project SEKAI".to_string(),
            http: HttpConfig::default(),
            transcoder: TranscoderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            referer: "https://www.google.com".to_string(),
            timeout_secs: 30,
            retries: 3,
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            sample_rate: 44_100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            coloured: true,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/sekaidl/config.toml
    /// Reads environment variables with SEKAIDL_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("sekaidl");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Absolute URL of the song index page.
    pub fn index_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.index_path.trim_start_matches('/')
        )
    }
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/sekaidl/config.toml
/// - macOS: ~/Library/Application Support/sekaidl/config.toml
/// - Windows: %APPDATA%\sekaidl\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sekaidl")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# sekaidl Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (SEKAIDL_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Wiki root; relative links are resolved against it
base_url = "https://www.sekaipedia.org"
index_path = "/wiki/List_of_songs"

# Output root. WARNING: deleted and recreated on every run.
#
# Can also be set via:
# - CLI: sekaidl --output-dir /custom/out
# - Environment: SEKAIDL_OUTPUT_DIR=/custom/out
output_dir = "out"

# Keep songs whose "date added" is strictly older than this many days
cutoff_days = 60

title_suffix = " - Sekaipedia"
album = "Project SEKAI"

[http]
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36"
accept_language = "en-US,en;q=0.9"
referer = "https://www.google.com"
timeout_secs = 30
retries = 3

[transcoder]
program = "ffmpeg"
sample_rate = 44100

[logging]
level = "info"
coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
