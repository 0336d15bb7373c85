//! Route resolution for the Vista page rendering orchestrator.
//!
//! Pages declare route patterns with static segments, `:param` segments
//! and an optional trailing catch-all:
//!
//! ```text
//! /star-wars            -> static
//! /star-wars/:movieId   -> one parameter
//! /docs/*path           -> catch-all, captured as `path`
//! ```
//!
//! When several patterns match a URL, the most specific wins:
//!
//! 1. no catch-all beats catch-all,
//! 2. fewer parameters beat more parameters,
//! 3. more static segments beat fewer,
//! 4. earlier registration beats later.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vista_router::RouteResolver;
//!
//! let resolver = RouteResolver::from_pages([movies_page, movie_page])?;
//! let matched = resolver.resolve("/star-wars/2")?;
//! assert_eq!(matched.route_params["movieId"], "2");
//! ```

mod pattern;
mod resolver;

pub use pattern::*;
pub use resolver::*;
