//! `vista prerender`.

use anyhow::{Context as _, Result};
use vista_sdk::vista_prerender::PrerenderEnumerator;

use super::PrerenderArgs;
use crate::context::Context;

pub async fn run(args: PrerenderArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.prerender.clone();
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }

    let spinner = ctx.output.spinner("Prerendering pages...");
    let result = PrerenderEnumerator::new(ctx.renderer.clone())
        .with_config(config)
        .run()
        .await;
    spinner.finish_and_clear();
    let manifest = result?;

    match args.out {
        Some(path) => {
            let json = manifest.to_json_pretty()?;
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ctx.output.success(&format!(
                "Prerendered {} pages to {}",
                manifest.len(),
                path.display()
            ));
            for url in manifest.urls() {
                ctx.output.debug(url);
            }
        }
        None => ctx.output.json(&manifest),
    }

    Ok(())
}
