//! Page hooks.

mod index;
mod movie;

pub use index::*;
pub use movie::*;

use serde::de::DeserializeOwned;
use vista_sdk::vista_core::{HookError, PageContext, RenderOutput};
use vista_sdk::vista_streaming::{HeadContent, Shell};

/// Decode the page's `data` into its typed form.
fn page_data<T: DeserializeOwned>(ctx: &PageContext) -> Result<T, HookError> {
    let data = ctx
        .data
        .clone()
        .ok_or_else(|| HookError::msg("page context has no data"))?;
    serde_json::from_value(data).map_err(|e| HookError::msg(format!("malformed page data: {e}")))
}

/// Wrap a page body in the document shell, embedding the projected context.
fn document(ctx: &PageContext, title: &str, body: &str, keys: &[String]) -> RenderOutput {
    let shell = Shell::new(HeadContent::new(title).with_meta("description", "Star Wars movies"))
        .with_page_context(ctx.project(keys));
    RenderOutput::Html(shell.render(body))
}
