//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.trello-reports.toml` files and the environment.

use crate::report::ExportLocale;
use crate::server::DEFAULT_CACHE_CONTROL;
use crate::source::{TrelloCredentials, DEFAULT_API_BASE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".trello-reports.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Trello API settings.
    #[serde(default)]
    pub trello: TrelloConfig,

    /// Proxy server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path. Empty means a generated name (exports)
    /// or stdout (summary and digest).
    #[serde(default)]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Trello REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrelloConfig {
    /// API root.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key. `TRELLO_KEY` takes precedence.
    #[serde(default)]
    pub key: String,

    /// API token. `TRELLO_TOKEN` takes precedence.
    #[serde(default)]
    pub token: String,
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            key: String::new(),
            token: String::new(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl TrelloConfig {
    /// Credentials, when both key and token are set.
    pub fn credentials(&self) -> Option<TrelloCredentials> {
        TrelloCredentials::from_parts(Some(self.key.clone()), Some(self.token.clone()))
    }
}

/// Board proxy server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Shared access token. Empty disables the check.
    /// `PUBLIC_DASHBOARD_TOKEN` takes precedence.
    #[serde(default)]
    pub access_token: String,

    /// `Cache-Control` sent with successful responses.
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            access_token: String::new(),
            cache_control: default_cache_control(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_cache_control() -> String {
    DEFAULT_CACHE_CONTROL.to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Custom report name used in headings and the digest title.
    #[serde(default)]
    pub title: String,

    /// Default digest recipient.
    #[serde(default)]
    pub manager_email: String,

    /// Proxy origin used in public mode, e.g. `https://reports.example.com`.
    #[serde(default)]
    pub proxy_url: String,

    /// CSV header language.
    #[serde(default)]
    pub export_locale: ExportLocale,

    /// Logo URL shown in the Markdown header.
    #[serde(default = "default_logo")]
    pub logo: String,

    /// Logo height in pixels.
    #[serde(default = "default_logo_size")]
    pub logo_size: u32,

    /// Maximum logo width in pixels.
    #[serde(default = "default_logo_max_width")]
    pub logo_max_width: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            manager_email: String::new(),
            proxy_url: String::new(),
            export_locale: ExportLocale::default(),
            logo: default_logo(),
            logo_size: default_logo_size(),
            logo_max_width: default_logo_max_width(),
        }
    }
}

fn default_logo() -> String {
    crate::params::DEFAULT_LOGO.to_string()
}

fn default_logo_size() -> u32 {
    crate::params::DEFAULT_LOGO_SIZE
}

fn default_logo_max_width() -> u32 {
    crate::params::DEFAULT_LOGO_MAX_WIDTH
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply environment overrides (`TRELLO_KEY`, `TRELLO_TOKEN`,
    /// `PUBLIC_DASHBOARD_TOKEN`).
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("TRELLO_KEY") {
            self.trello.key = key;
        }
        if let Some(token) = non_empty("TRELLO_TOKEN") {
            self.trello.token = token;
        }
        if let Some(access) = non_empty("PUBLIC_DASHBOARD_TOKEN") {
            self.server.access_token = access;
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        if args.verbose {
            self.general.verbose = true;
        }

        match args.command {
            Some(Command::Serve(ref serve)) => {
                if let Some(ref bind) = serve.bind {
                    self.server.bind = bind.clone();
                }
            }
            Some(Command::Report(ref report)) => {
                if let Some(ref output) = report.output {
                    self.general.output = output.display().to_string();
                }
                if let Some(ref name) = report.report_name {
                    self.report.title = name.clone();
                }
                if let Some(ref manager) = report.manager {
                    self.report.manager_email = manager.clone();
                }
                if let Some(ref proxy) = report.proxy_url {
                    self.report.proxy_url = proxy.clone();
                }
                if let Some(locale) = report.locale {
                    self.report.export_locale = locale.into();
                }
            }
            None => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
