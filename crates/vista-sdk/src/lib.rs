//! Public SDK for the Vista page rendering orchestrator.
//!
//! This crate re-exports all orchestrator functionality:
//!
//! ```ignore
//! use vista_sdk::prelude::*;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl RenderHook for Hello {
//!     async fn render(&self, ctx: &PageContext) -> Result<RenderOutput, HookError> {
//!         Ok(RenderOutput::Html(format!("<h1>{}</h1>", ctx.url_pathname)))
//!     }
//! }
//!
//! let resolver = RouteResolver::from_pages([Page::new("hello", "/hello").with_render(Hello)])?;
//! let responder = SsrResponder::new(Arc::new(Renderer::new(resolver)));
//! let outcome = responder.handle(IncomingRequest::new("/hello"), &mut conn, next).await?;
//! ```

pub use vista_core;
pub use vista_data;
pub use vista_observability;
pub use vista_pipeline;
pub use vista_prerender;
pub use vista_router;
pub use vista_streaming;

pub use anyhow;
pub use async_trait::async_trait;

/// Prelude for convenient imports.
pub mod prelude {
    pub use std::sync::Arc;

    pub use async_trait::async_trait;
    pub use vista_core::*;
    pub use vista_data::*;
    pub use vista_observability::*;
    pub use vista_pipeline::*;
    pub use vista_prerender::*;
    pub use vista_router::*;
    pub use vista_streaming::*;
}
