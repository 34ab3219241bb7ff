//! Bootstrap configuration and root folder resolution
//!
//! Priority order for every setting that can come from more than one place:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: the binary logs a
//! warning and continues with compiled defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::markov::{CategorySet, DEFAULT_CATEGORIES};
use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "WXMC_ROOT_FOLDER";

/// Config file name looked up in the platform config directories
pub const CONFIG_FILE_NAME: &str = "wxmc.toml";

/// Database file created inside the root folder
pub const DATABASE_FILE_NAME: &str = "wxmc.db";

/// Longest accepted bearer token lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while the service runs; restart to pick up edits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder holding the database (optional, see [`RootFolderResolver`])
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CSV used for the default model instead of the bundled reference data
    #[serde(default)]
    pub default_dataset: Option<PathBuf>,

    /// Labels accepted in uploaded sequences
    #[serde(default = "default_allowed_categories")]
    pub allowed_categories: Vec<String>,

    /// Bearer token lifetime
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// Request body limit for uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn default_token_ttl_minutes() -> i64 {
    30
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_address: default_bind_address(),
            port: default_port(),
            default_dataset: None,
            allowed_categories: default_allowed_categories(),
            token_ttl_minutes: default_token_ttl_minutes(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_allowed_origins: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.category_set().to_vec().is_empty() {
            return Err(Error::Config(
                "allowed_categories must name at least one category".to_string(),
            ));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.token_ttl_minutes) {
            return Err(Error::Config(format!(
                "token_ttl_minutes must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_MINUTES, self.token_ttl_minutes
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }
        Ok(())
    }

    /// Allowed categories as a cleaner
    pub fn category_set(&self) -> CategorySet {
        CategorySet::new(&self.allowed_categories)
    }
}

/// Platform config file: `~/.config/wxmc/wxmc.toml`, then `/etc/wxmc/wxmc.toml`
pub fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("wxmc").join(CONFIG_FILE_NAME));
    let system_config = PathBuf::from("/etc/wxmc").join(CONFIG_FILE_NAME);

    user_config
        .into_iter()
        .chain(std::iter::once(system_config))
        .find(|p| p.exists())
}

/// OS-dependent compiled default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\wxmc
        dirs::data_local_dir()
            .map(|d| d.join("wxmc"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\wxmc"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/wxmc
        dirs::data_dir()
            .map(|d| d.join("wxmc"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/wxmc"))
    } else {
        // ~/.local/share/wxmc
        dirs::data_local_dir()
            .map(|d| d.join("wxmc"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/wxmc"))
    }
}

/// Resolves the root folder: CLI → environment → TOML → compiled default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Creates the root folder on first run and locates files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
