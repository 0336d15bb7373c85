//! CLI execution context.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use star_wars::data::HttpMovieApi;
use star_wars::StarWars;
use vista_sdk::vista_core::VistaConfig;
use vista_sdk::vista_observability;
use vista_sdk::vista_pipeline::Renderer;

use crate::output::Output;

/// Config files looked up in the working directory when none is given.
const CONFIG_NAMES: [&str; 2] = ["vista.toml", "vista.json"];

/// Global options collected from the command line.
pub struct ContextOptions {
    pub config_path: Option<String>,
    pub api_base: Option<String>,
    pub verbose: bool,
}

/// Execution context for CLI commands.
pub struct Context {
    pub config: VistaConfig,
    pub output: Output,
    pub renderer: Arc<Renderer>,
}

impl Context {
    /// Load configuration, install logging and build the workload.
    pub fn load(options: ContextOptions, output: Output) -> Result<Self> {
        let mut config = match options.config_path.as_deref() {
            Some(path) => VistaConfig::load(path)?,
            None => Self::find_config()?.unwrap_or_default(),
        };
        if options.verbose {
            config.logging.level = "debug".to_string();
        }

        vista_observability::init(&config.logging).context("Failed to initialize logging")?;

        let mut api = HttpMovieApi::new().context("Failed to create HTTP client")?;
        if let Some(base) = options.api_base {
            output.debug(&format!("Using API base {}", base));
            api = api.with_base_url(base);
        }

        let renderer = StarWars::new(Arc::new(api))
            .with_serialized_keys(config.prerender.serialized_keys.clone())
            .renderer()
            .context("Failed to register pages")?;

        Ok(Self {
            config,
            output,
            renderer: Arc::new(renderer),
        })
    }

    fn find_config() -> Result<Option<VistaConfig>> {
        for name in CONFIG_NAMES {
            if Path::new(name).exists() {
                return Ok(Some(VistaConfig::load(name)?));
            }
        }
        Ok(None)
    }
}
