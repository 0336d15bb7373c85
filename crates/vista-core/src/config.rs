//! Renderer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VistaConfig {
    /// SSR responder settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Prerender settings.
    #[serde(default)]
    pub prerender: PrerenderConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VistaConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content).map_err(|message| ConfigError::Parse {
                path: display,
                message,
            })
        } else {
            Self::from_toml_str(&content).map_err(|message| ConfigError::Parse {
                path: display,
                message,
            })
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn from_json_str(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Set the server configuration.
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set the prerender configuration.
    pub fn with_prerender(mut self, prerender: PrerenderConfig) -> Self {
        self.prerender = prerender;
        self
    }

    /// Set the logging configuration.
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

/// SSR responder settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Headers appended to every page response unless the page set them.
    #[serde(default)]
    pub default_headers: Vec<(String, String)>,
}

impl ServerConfig {
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

/// Prerender settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrerenderConfig {
    /// Maximum URLs rendered at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Allow parameterized pages without an enumeration hook (they are
    /// skipped with a warning).
    #[serde(default = "default_partial")]
    pub partial: bool,

    /// Page context keys written to the manifest.
    #[serde(default = "default_serialized_keys")]
    pub serialized_keys: Vec<String>,
}

fn default_concurrency() -> usize {
    8
}

fn default_partial() -> bool {
    true
}

fn default_serialized_keys() -> Vec<String> {
    ["urlOriginal", "routeParams", "pageId", "data", "pageProps", "title"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            partial: default_partial(),
            serialized_keys: default_serialized_keys(),
        }
    }
}

impl PrerenderConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn with_serialized_keys(mut self, keys: Vec<&str>) -> Self {
        self.serialized_keys = keys.into_iter().map(String::from).collect();
        self
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines (for production/log aggregation).
    #[default]
    Json,
    /// Compact human-readable lines (for development).
    Compact,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level directive, overridable with `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}
