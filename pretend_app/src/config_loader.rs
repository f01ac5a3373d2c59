use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use config::FileSourceFile;
use pretend_http::HttpClientConfig;
use pretend_http::PRETEND_BASE_URL;
use pretend_http::PretendClient;
use pretend_ratelimit::DEFAULT_CAPACITY;
use pretend_ratelimit::DEFAULT_WINDOW;
use serde::Deserialize;

/// Config file looked up in the working directory when no path is given
const DEFAULT_CONFIG_NAME: &str = "pretend";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub rate_limit: RateLimitSettings,
    pub http: HttpSettings,
    pub log: LogSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: PRETEND_BASE_URL.to_string(),
            rate_limit: RateLimitSettings::default(),
            http: HttpSettings::default(),
            log: LogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub capacity: u32,
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY, window_ms: DEFAULT_WINDOW.as_millis() as u64 }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpClientConfig::default();
        Self {
            connect_timeout_ms: defaults.connect_timeout.as_millis() as u64,
            request_timeout_ms: defaults.request_timeout.as_millis() as u64,
            pool_max_idle_per_host: defaults.pool_max_idle_per_host,
        }
    }
}

impl HttpSettings {
    pub fn to_http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub dir: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), dir: None }
    }
}

/// Load configuration from `path` (or an optional `pretend.toml`) overlaid with `PRETEND_*` variables
///
/// Nested keys use a double underscore, e.g. `PRETEND_RATE_LIMIT__CAPACITY=3`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_with_env(path, None)
}

/// Configuration the CLI runs with
#[derive(Debug)]
pub struct ResolvedConfig {
    pub config: AppConfig,
    /// Why the default config file was skipped, if it was
    pub skipped_file: Option<ConfigError>,
}

/// Resolve configuration for the CLI
///
/// An explicit `path` must load. A broken default `pretend.toml` is skipped and
/// the environment still applies; a bad `PRETEND_*` value is always an error.
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    resolve_with_env(path, DEFAULT_CONFIG_NAME, None)
}

type ConfigFile = File<FileSourceFile, FileFormat>;

fn config_file(path: Option<&Path>, default_name: &str) -> ConfigFile {
    match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(default_name).required(false),
    }
}

fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<AppConfig, ConfigError> {
    load_layers(Some(config_file(path, DEFAULT_CONFIG_NAME)), env)
}

fn load_layers(file: Option<ConfigFile>, env: Option<HashMap<String, String>>) -> Result<AppConfig, ConfigError> {
    // Values stay strings; serde parses numeric fields, so the API key is never reinterpreted
    let environment = Environment::with_prefix("PRETEND").prefix_separator("_").separator("__").source(env);

    let mut builder = Config::builder();
    if let Some(file) = file {
        builder = builder.add_source(file);
    }
    builder.add_source(environment).build()?.try_deserialize()
}

fn resolve_with_env(path: Option<&Path>, default_name: &str, env: Option<HashMap<String, String>>) -> anyhow::Result<ResolvedConfig> {
    if let Some(path) = path {
        let config = load_layers(Some(config_file(Some(path), default_name)), env)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        return Ok(ResolvedConfig { config, skipped_file: None });
    }

    match load_layers(Some(config_file(None, default_name)), env.clone()) {
        Ok(config) => Ok(ResolvedConfig { config, skipped_file: None }),
        Err(err) => {
            let config = load_layers(None, env).context("Failed to load config from PRETEND_* environment variables")?;
            Ok(ResolvedConfig { config, skipped_file: Some(err) })
        }
    }
}

/// Build a client from loaded configuration
pub fn build_client(config: &AppConfig) -> anyhow::Result<PretendClient> {
    let api_key = config.api_key.as_deref().context("No API key configured: set PRETEND_API_KEY or api_key in the config file")?;

    let client = PretendClient::builder()
        .api_key(api_key)
        .base_url(config.base_url.as_str())
        .rate_limit(config.rate_limit.capacity, config.rate_limit.window())
        .http_config(config.http.to_http_config())
        .build()?;

    Ok(client)
}
