//! Vista CLI - Render and prerender the Star Wars workload.
//!
//! Commands:
//! - `vista render <url>` - Server-render one URL into memory and print it
//! - `vista prerender` - Prerender every enumerable URL and write the manifest
//! - `vista routes` - List routes in match precedence order

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{PrerenderArgs, RenderArgs, RoutesArgs};

/// Vista CLI - Render pages of the Star Wars workload
#[derive(Parser)]
#[command(name = "vista")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the Star Wars API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Server-render one URL
    Render(RenderArgs),

    /// Prerender all enumerable URLs
    Prerender(PrerenderArgs),

    /// List routes in precedence order
    Routes(RoutesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let options = context::ContextOptions {
        config_path: cli.config,
        api_base: cli.api_base,
        verbose: cli.verbose,
    };

    let result = match context::Context::load(options, output.clone()) {
        Ok(ctx) => match cli.command {
            Commands::Render(args) => commands::render::run(args, &ctx).await,
            Commands::Prerender(args) => commands::prerender::run(args, &ctx).await,
            Commands::Routes(args) => commands::routes::run(args, &ctx).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
