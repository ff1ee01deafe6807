use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::fetch::DEFAULT_USER_AGENT;
use crate::page::Viewport;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "TRANSCRIPT_GRABBER_CONFIG";

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "transcript-grabber.toml";

/// Configuration for the transcript grabber
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound HTTP settings
    pub http: HttpConfig,

    /// Assumed viewport for snapshot pages
    pub viewport: ViewportConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent for caption and page requests
    pub user_agent: String,

    /// Request timeout (seconds)
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Tracing filter directive used when RUST_LOG is unset
    pub log_level: String,

    /// Emit the outcome as JSON instead of plain text
    pub json: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: 30,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            width: viewport.width,
            height: viewport.height,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "transcript_grabber=info,warn".to_string(),
            json: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            viewport: ViewportConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration: explicit path, then `TRANSCRIPT_GRABBER_CONFIG`, then
    /// `./transcript-grabber.toml`, then defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout == 0 {
            return Err(anyhow!("http.timeout must be greater than 0"));
        }

        if self.http.user_agent.trim().is_empty() {
            return Err(anyhow!("http.user_agent must not be empty"));
        }

        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(anyhow!(
                "viewport must have positive dimensions, got {}x{}",
                self.viewport.width,
                self.viewport.height
            ));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Transcript Grabber Configuration:\n\
            - Request Timeout: {}s\n\
            - Viewport: {}x{}\n\
            - JSON Output: {}\n\
            - Log Filter: {}",
            self.http.timeout,
            self.viewport.width,
            self.viewport.height,
            self.output.json,
            self.output.log_level
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.http.timeout = seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.http.user_agent = user_agent.into();
        self
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.config.viewport = ViewportConfig { width, height };
        self
    }

    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.config.output.log_level = log_level.into();
        self
    }

    pub fn json_output(mut self, enable: bool) -> Self {
        self.config.output.json = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.timeout, 30);
        assert_eq!(config.viewport(), Viewport::new(1280.0, 800.0));
        assert!(!config.output.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_timeout(5)
            .with_viewport(1920.0, 1080.0)
            .json_output(true)
            .build();

        assert_eq!(config.http.timeout, 5);
        assert_eq!(config.viewport.width, 1920.0);
        assert!(config.output.json);
    }

    #[test]
    fn test_config_validation() {
        assert!(ConfigBuilder::new().with_timeout(0).build().validate().is_err());
        assert!(ConfigBuilder::new().with_viewport(0.0, 600.0).build().validate().is_err());
        assert!(ConfigBuilder::new().with_user_agent("  ").build().validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\ntimeout = 10\n\n[output]\njson = true").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.http.timeout, 10);
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert!(config.output.json);
        assert_eq!(config.viewport.height, 800.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grabber.toml");

        let config = ConfigBuilder::new().with_log_level("debug").build();
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.output.log_level, "debug");
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\ntimeout = ").unwrap();
        assert!(Config::load_from(file.path()).is_err());
        assert!(Config::load_from(Path::new("/nonexistent/grabber.toml")).is_err());
    }
}
