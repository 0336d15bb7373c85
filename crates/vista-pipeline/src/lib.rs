//! Hook pipeline execution for the Vista page rendering orchestrator.
//!
//! This crate runs a resolved page's hooks in a fixed order:
//! - `HookPipeline` - Guard, data and render stages with failure containment
//! - `Renderer` - URL resolution plus pipeline, shared by SSR and prerendering
//! - `abort_response` - Responses for guard redirects and status aborts

mod abort;
mod pipeline;
mod renderer;
mod stage;

pub use abort::*;
pub use pipeline::*;
pub use renderer::*;
pub use stage::*;
