//! Configuration management for hotserve.
//!
//! Parses `hotserve.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `server.host` supports `${VAR}` and `${VAR:-default}` references.
//!
//! ## Example
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [site]
//! root = "public"
//! default_document = "index.html"
//!
//! [live_reload]
//! enabled = true
//! poll_interval_ms = 500
//! ```

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override base port.
    pub port: Option<u16>,
    /// Override served root directory.
    pub root: Option<PathBuf>,
    /// Override the document served for `/`.
    pub default_document: Option<String>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "hotserve.toml";

/// Upper bound for the poll interval.
const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
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
    /// Server host address.
    pub host: String,
    /// Base port. The server moves to the next port while binding fails.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

/// Raw site configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    root: Option<String>,
    default_document: Option<String>,
}

/// Resolved site configuration.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory tree that is served and watched.
    pub root: PathBuf,
    /// File name served for `/` when it exists in the root.
    pub default_document: String,
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// Delay between two freshness samples of one event stream.
    pub poll_interval_ms: u64,
}

impl LiveReloadConfig {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 500,
        }
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
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `hotserve.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the merged configuration is invalid.
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
        if let Some(root) = &settings.root {
            self.site_resolved.root.clone_from(root);
        }
        if let Some(default_document) = &settings.default_document {
            self.site_resolved
                .default_document
                .clone_from(default_document);
        }
        if let Some(live_reload_enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = live_reload_enabled;
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

    /// Create default config serving the current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config serving `base`.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            site: SiteConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            site_resolved: SiteConfig {
                root: base.to_path_buf(),
                default_document: "index.html".to_owned(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.server.host = expand::expand_env(&config.server.host, "server.host")?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Resolve the site root against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.site_resolved = SiteConfig {
            root: match self.site.root.as_deref() {
                Some(root) => config_dir.join(root),
                None => config_dir.to_path_buf(),
            },
            default_document: self
                .site
                .default_document
                .clone()
                .unwrap_or_else(|| "index.html".to_owned()),
        };
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_site()?;
        self.validate_live_reload()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 would let the OS pick, which defeats the printed base-port contract
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate site configuration.
    fn validate_site(&self) -> Result<(), ConfigError> {
        let document = &self.site_resolved.default_document;
        require_non_empty(document, "site.default_document")?;

        if document.contains(['/', '\\']) || document == "." || document == ".." {
            return Err(ConfigError::Validation(format!(
                "site.default_document must be a file name, got {document:?}"
            )));
        }

        Ok(())
    }

    /// Validate live reload configuration.
    fn validate_live_reload(&self) -> Result<(), ConfigError> {
        let interval = self.live_reload.poll_interval_ms;
        if interval == 0 {
            return Err(ConfigError::Validation(
                "live_reload.poll_interval_ms must be greater than 0".to_owned(),
            ));
        }
        if interval > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::Validation(format!(
                "live_reload.poll_interval_ms cannot exceed {MAX_POLL_INTERVAL_MS}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.site_resolved.root, PathBuf::from("/test"));
        assert_eq!(config.site_resolved.default_document, "index.html");
        assert!(config.live_reload.enabled);
        assert_eq!(
            config.live_reload.poll_interval(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert!(config.live_reload.enabled);
    }

    #[test]
    fn test_parse_server_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_live_reload_config() {
        let toml = r"
[live_reload]
enabled = false
poll_interval_ms = 250
";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.live_reload.enabled);
        assert_eq!(config.live_reload.poll_interval_ms, 250);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[site]
root = "public"
default_document = "punyu.html"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.site_resolved.root, PathBuf::from("/project/public"));
        assert_eq!(config.site_resolved.default_document, "punyu.html");
    }

    #[test]
    fn test_resolve_paths_defaults_to_config_dir() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.site_resolved.root, PathBuf::from("/project"));
        assert_eq!(config.site_resolved.default_document, "index.html");
    }

    #[test]
    fn test_apply_cli_settings_port() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            port: Some(9000),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1"); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_root_and_document() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            root: Some(PathBuf::from("/srv/site")),
            default_document: Some("home.html".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.site_resolved.root, PathBuf::from("/srv/site"));
        assert_eq!(config.site_resolved.default_document, "home.html");
    }

    #[test]
    fn test_apply_cli_settings_live_reload() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            live_reload_enabled: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert!(!config.live_reload.enabled);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.site_resolved.root, PathBuf::from("/test"));
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_validate_default_document_with_separator() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.site_resolved.default_document = "docs/index.html".to_owned();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("site.default_document"));
    }

    #[test]
    fn test_validate_poll_interval_bounds() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.live_reload.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config.live_reload.poll_interval_ms = MAX_POLL_INTERVAL_MS + 1;
        assert!(config.validate().is_err());

        config.live_reload.poll_interval_ms = MAX_POLL_INTERVAL_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/hotserve.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_explicit_file_with_overrides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[site]\nroot = \"www\"\n",
        )
        .unwrap();

        let overrides = CliSettings {
            live_reload_enabled: Some(false),
            ..Default::default()
        };
        let config = Config::load(Some(&path), Some(&overrides)).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.site_resolved.root, temp_dir.path().join("www"));
        assert!(!config.live_reload.enabled);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_rejects_invalid_override() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        let overrides = CliSettings {
            default_document: Some("../secret.html".to_owned()),
            ..Default::default()
        };
        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_expands_host() {
        // SAFETY: no other test reads or writes this variable
        unsafe {
            std::env::set_var("HOTSERVE_TEST_HOST", "0.0.0.0");
        }
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server]\nhost = \"${HOTSERVE_TEST_HOST}\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");

        unsafe {
            std::env::remove_var("HOTSERVE_TEST_HOST");
        }
    }
}
