//! Configuration management for servor.
//!
//! Settings are resolved in three layers:
//!
//! 1. Built-in defaults (serve `.` on port 8080, reload channel on 5000)
//! 2. An optional `servor.toml`, auto-discovered in the current directory
//!    or its parents
//! 3. Command-line overrides, applied via [`CliSettings`]
//!
//! Relative paths in a config file are resolved against the directory that
//! contains it. Defaults resolve against the current working directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override bind host.
    pub host: Option<String>,
    /// Override main (static file) port.
    pub port: Option<u16>,
    /// Override reload channel port.
    pub reload_port: Option<u16>,
    /// Override served root directory.
    pub root_dir: Option<PathBuf>,
    /// Override fallback document for route requests.
    pub fallback: Option<String>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
    /// Override watcher debounce window.
    pub debounce_ms: Option<u64>,
    /// Override browser launch flag.
    pub open_browser: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "servor.toml";

/// Default certificate file, relative to the base directory.
const DEFAULT_CERT_FILE: &str = "servor.crt";

/// Default private key file, relative to the base directory.
const DEFAULT_KEY_FILE: &str = "servor.key";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// TLS configuration (paths are relative strings from TOML).
    tls: TlsConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,
    /// Browser launch configuration.
    pub browser: BrowserConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Resolved TLS configuration (set after loading).
    #[serde(skip)]
    pub tls_resolved: TlsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address both listeners bind to.
    pub host: String,
    /// Main (static file) port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
        }
    }
}

/// Raw site configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    root: Option<String>,
    fallback: Option<String>,
}

/// Resolved site configuration.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory served and watched.
    pub root_dir: PathBuf,
    /// Document served for route requests, relative to `root_dir`.
    pub fallback: String,
}

/// Raw TLS configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TlsConfigRaw {
    cert: Option<String>,
    key: Option<String>,
}

/// Resolved TLS material locations.
#[derive(Debug, Default)]
pub struct TlsConfig {
    /// PEM certificate chain.
    pub cert_path: PathBuf,
    /// PEM private key.
    pub key_path: PathBuf,
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// Port of the reload event stream.
    pub port: u16,
    /// Quiet window before a burst of changes is broadcast (0 disables).
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 5000,
            debounce_ms: 0,
        }
    }
}

/// Browser launch configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Open the served page in the default browser on startup.
    pub open: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self { open: true }
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
}

/// Current working directory, or an empty (relative) path if it is gone.
fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_default()
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a port field to be non-zero.
fn require_port(port: u16, field: &str) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::Validation(format!("{field} cannot be 0")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `servor.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path, &working_dir())?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered, &working_dir())?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(reload_port) = settings.reload_port {
            self.live_reload.port = reload_port;
        }
        if let Some(root_dir) = &settings.root_dir {
            self.site_resolved.root_dir.clone_from(root_dir);
        }
        if let Some(fallback) = &settings.fallback {
            self.site_resolved.fallback.clone_from(fallback);
        }
        if let Some(live_reload_enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = live_reload_enabled;
        }
        if let Some(debounce_ms) = settings.debounce_ms {
            self.live_reload.debounce_ms = debounce_ms;
        }
        if let Some(open_browser) = settings.open_browser {
            self.browser.open = open_browser;
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
        Self::default_with_base(&working_dir())
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            site: SiteConfigRaw::default(),
            tls: TlsConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            browser: BrowserConfig::default(),
            site_resolved: SiteConfig {
                root_dir: base.to_path_buf(),
                fallback: "index.html".to_owned(),
            },
            tls_resolved: TlsConfig {
                cert_path: base.join(DEFAULT_CERT_FILE),
                key_path: base.join(DEFAULT_KEY_FILE),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    ///
    /// Paths set in the file resolve against the file's directory; omitted
    /// ones keep their defaults under `default_base`.
    fn load_from_file(path: &Path, default_base: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir, default_base);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        require_port(self.server.port, "server.port")?;
        require_non_empty(&self.site_resolved.fallback, "site.fallback")?;

        if self.live_reload.enabled {
            require_port(self.live_reload.port, "live_reload.port")?;
            if self.live_reload.port == self.server.port {
                return Err(ConfigError::Validation(format!(
                    "live_reload.port must differ from server.port ({})",
                    self.server.port
                )));
            }
        }

        Ok(())
    }

    /// Resolve configured paths against the config directory and defaults
    /// against `default_base`.
    fn resolve_paths(&mut self, config_dir: &Path, default_base: &Path) {
        let resolve = |path: Option<&str>, default: &str| match path {
            Some(path) => config_dir.join(path),
            None => default_base.join(default),
        };

        self.site_resolved = SiteConfig {
            root_dir: self
                .site
                .root
                .as_deref()
                .map_or_else(|| default_base.to_path_buf(), |root| config_dir.join(root)),
            fallback: self
                .site
                .fallback
                .clone()
                .unwrap_or_else(|| "index.html".to_owned()),
        };

        self.tls_resolved = TlsConfig {
            cert_path: resolve(self.tls.cert.as_deref(), DEFAULT_CERT_FILE),
            key_path: resolve(self.tls.key.as_deref(), DEFAULT_KEY_FILE),
        };
    }
}
