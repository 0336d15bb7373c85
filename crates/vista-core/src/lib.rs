//! Core abstractions for the Vista page rendering orchestrator.
//!
//! This crate provides the fundamental types and traits:
//! - `PageContext` - Per-run data bag threaded through every hook
//! - `Page` and the hook traits - Capability-tagged page definitions
//! - `HttpResponse` / `Body` - Response model with streamable bodies
//! - `RenderError` - Error taxonomy shared by SSR and prerendering
//! - `VistaConfig` - Server, prerender and logging configuration
//! - `OnceWarning` - Process-wide fire-once diagnostics

mod config;
mod context;
mod diagnostics;
mod error;
mod lifecycle;
mod page;
mod response;

pub use config::*;
pub use context::*;
pub use diagnostics::*;
pub use error::*;
pub use lifecycle::*;
pub use page::*;
pub use response::*;
