//! SSR response streaming for the Vista page rendering orchestrator.
//!
//! This crate turns a rendered page into bytes on a host connection:
//! - `SsrResponder` - Resolve, run hooks, then respond or pass through
//! - `HostConnection` - The host's response handle (`MemoryConnection` in memory)
//! - `ResponseSink` - Head-first writer that flushes status and headers lazily
//! - `Shell` - HTML document shell with escaped page context

mod host;
mod responder;
mod shell;
mod sink;

pub use host::*;
pub use responder::*;
pub use shell::*;
pub use sink::*;
