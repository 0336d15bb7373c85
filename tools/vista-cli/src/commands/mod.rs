//! CLI command implementations.

pub mod prerender;
pub mod render;
pub mod routes;

use std::path::PathBuf;

use clap::Args;

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// URL to render, e.g. `/star-wars/1`.
    pub url: String,

    /// Request header as `name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Print only status and headers.
    #[arg(long)]
    pub head: bool,
}

/// Arguments for the prerender command.
#[derive(Args)]
pub struct PrerenderArgs {
    /// Write the manifest here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Override the configured concurrency.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {}
