//! Configuration management for RW navigation.
//!
//! Parses `rw.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `toc.root_dir`
//! - `xref.maps`
//! - `xref.fallback_folders`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docset root directory.
    pub root_dir: Option<PathBuf>,
    /// Override restructure operations file.
    pub restructure: Option<PathBuf>,
    /// Replace the declared xref maps.
    pub xref_maps: Option<Vec<String>>,
    /// Override xref fetch timeout.
    pub timeout_secs: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "rw.toml";

/// Default xref fetch timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TOC configuration (paths are relative strings from TOML).
    toc: TocConfigRaw,
    /// Cross-reference configuration (paths are relative strings from TOML).
    xref: XRefConfigRaw,

    /// Resolved TOC configuration (set after loading).
    #[serde(skip)]
    pub toc_resolved: TocConfig,
    /// Resolved cross-reference configuration (set after loading).
    #[serde(skip)]
    pub xref_resolved: XRefConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw TOC configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TocConfigRaw {
    root_dir: Option<String>,
    restructure: Option<String>,
}

/// Resolved TOC configuration with absolute paths.
#[derive(Debug, Default)]
pub struct TocConfig {
    /// Docset root; TOC identities are relative to it.
    pub root_dir: PathBuf,
    /// File with ordered restructure operations.
    pub restructure: Option<PathBuf>,
}

/// Raw cross-reference configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct XRefConfigRaw {
    maps: Option<Vec<String>>,
    fallback_folders: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

/// Resolved cross-reference configuration.
#[derive(Debug)]
pub struct XRefConfig {
    /// Map locations in priority order, URLs or paths relative to `base_dir`.
    pub maps: Vec<String>,
    /// Directory relative map paths are resolved against.
    pub base_dir: PathBuf,
    /// Folders searched for relative map paths missing from `base_dir`.
    pub fallback_folders: Vec<PathBuf>,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for XRefConfig {
    fn default() -> Self {
        Self {
            maps: Vec::new(),
            base_dir: PathBuf::new(),
            fallback_folders: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl XRefConfig {
    /// HTTP timeout as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`xref.maps`").
        field: String,
        /// Error message (e.g., "${`XREF_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL-looking location to use the http:// or https:// scheme.
fn require_http_url_if_remote(location: &str, field: &str) -> Result<(), ConfigError> {
    if location.contains("://")
        && !location.starts_with("http://")
        && !location.starts_with("https://")
    {
        return Err(ConfigError::Validation(format!(
            "{field} entry {location:?} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `rw.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root_dir) = &settings.root_dir {
            self.toc_resolved.root_dir.clone_from(root_dir);
        }
        if let Some(restructure) = &settings.restructure {
            self.toc_resolved.restructure = Some(restructure.clone());
        }
        if let Some(maps) = &settings.xref_maps {
            self.xref_resolved.maps.clone_from(maps);
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            self.xref_resolved.timeout_secs = timeout_secs;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            toc: TocConfigRaw::default(),
            xref: XRefConfigRaw::default(),
            toc_resolved: TocConfig {
                root_dir: base.join("docs"),
                restructure: None,
            },
            xref_resolved: XRefConfig {
                base_dir: base.to_path_buf(),
                ..XRefConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_xref()
    }

    /// Validate cross-reference configuration.
    fn validate_xref(&self) -> Result<(), ConfigError> {
        if self.xref_resolved.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "xref.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        for location in &self.xref_resolved.maps {
            require_non_empty(location, "xref.maps")?;
            require_http_url_if_remote(location, "xref.maps")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref root_dir) = self.toc.root_dir {
            self.toc.root_dir = Some(expand::expand_env(root_dir, "toc.root_dir")?);
        }
        if let Some(ref mut maps) = self.xref.maps {
            for location in maps.iter_mut() {
                *location = expand::expand_env(location, "xref.maps")?;
            }
        }
        if let Some(ref mut folders) = self.xref.fallback_folders {
            for folder in folders.iter_mut() {
                *folder = expand::expand_env(folder, "xref.fallback_folders")?;
            }
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.toc_resolved = TocConfig {
            root_dir: config_dir.join(self.toc.root_dir.as_deref().unwrap_or("docs")),
            restructure: self.toc.restructure.as_deref().map(|p| config_dir.join(p)),
        };

        self.xref_resolved = XRefConfig {
            maps: self.xref.maps.clone().unwrap_or_default(),
            base_dir: config_dir.to_path_buf(),
            fallback_folders: self
                .xref
                .fallback_folders
                .iter()
                .flatten()
                .map(|d| config_dir.join(d))
                .collect(),
            timeout_secs: self.xref.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
    }
}
