//! Build-time prerendering for the Vista page rendering orchestrator.
//!
//! - `PrerenderEnumerator` - Collects every URL to prerender and renders each one
//! - `PrerenderManifest` - URL-ordered results, serializable for an external writer

mod enumerator;
mod manifest;

pub use enumerator::*;
pub use manifest::*;
