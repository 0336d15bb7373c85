//! Route pattern parsing and matching.

use std::cmp::Reverse;
use std::collections::HashSet;

use percent_encoding::percent_decode_str;
use vista_core::RouteParams;

/// Errors building a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("page '{0}' is registered twice")]
    DuplicatePage(String),
}

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text.
    Static(String),
    /// `:name`, matches exactly one segment.
    Param(String),
    /// `*name` (or bare `*`), matches one or more trailing segments.
    CatchAll(String),
}

/// Ordering key for route precedence. Smaller is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    catch_all: usize,
    params: usize,
    statics: Reverse<usize>,
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern such as `/star-wars/:movieId`.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let body = raw.trim_start_matches('/');
        let body = body.strip_suffix('/').unwrap_or(body);
        let mut segments = Vec::new();
        let mut names = HashSet::new();

        if !body.is_empty() {
            let parts: Vec<&str> = body.split('/').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.into_iter().enumerate() {
                let segment = if let Some(name) = part.strip_prefix(':') {
                    if name.is_empty() {
                        return Err(invalid("parameter name is empty"));
                    }
                    Segment::Param(name.to_string())
                } else if let Some(name) = part.strip_prefix('*') {
                    if i != last {
                        return Err(invalid("catch-all must be the last segment"));
                    }
                    let name = if name.is_empty() { "*" } else { name };
                    Segment::CatchAll(name.to_string())
                } else if part.is_empty() {
                    return Err(invalid("empty segment"));
                } else {
                    Segment::Static(part.to_string())
                };

                if let Segment::Param(name) | Segment::CatchAll(name) = &segment {
                    if !names.insert(name.clone()) {
                        return Err(invalid("duplicate parameter name"));
                    }
                }
                segments.push(segment);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern has no parameters at all.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }

    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count()
    }

    pub fn specificity(&self) -> Specificity {
        let catch_all = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::CatchAll(_)))
            .count();
        let statics = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count();
        Specificity {
            catch_all,
            params: self.param_count(),
            statics: Reverse(statics),
        }
    }

    /// Match a pathname (no query string). Returns the extracted,
    /// percent-decoded parameters.
    pub fn matches(&self, pathname: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = RouteParams::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(text) => {
                    let part = parts.get(i)?;
                    if decode(part) != *text {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.get(i)?;
                    params.insert(name.clone(), decode(part));
                }
                Segment::CatchAll(name) => {
                    if parts.len() <= i {
                        return None;
                    }
                    let rest: Vec<String> = parts[i..].iter().map(|p| decode(p)).collect();
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

fn decode(part: &str) -> String {
    percent_decode_str(part)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| part.to_string())
}
