//! Error taxonomy for rendering and prerendering.

use std::fmt;

use crate::page::HookStage;

/// Signal a hook raises to stop the pipeline with a response of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortSignal {
    /// Redirect to another URL.
    Redirect { url: String, permanent: bool },
    /// Respond with a status code and a short reason.
    Status { status_code: u16, reason: String },
}

impl fmt::Display for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirect { url, permanent } => {
                let kind = if *permanent { "permanent" } else { "temporary" };
                write!(f, "{} redirect to {}", kind, url)
            }
            Self::Status {
                status_code,
                reason,
            } => write!(f, "status {}: {}", status_code, reason),
        }
    }
}

/// Error returned (or panic raised) by a hook.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("aborted with {0}")]
    Abort(AbortSignal),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    #[error("hook panicked: {0}")]
    Panicked(String),
}

impl HookError {
    /// Abort with a temporary redirect.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Abort(AbortSignal::Redirect {
            url: url.into(),
            permanent: false,
        })
    }

    /// Abort with a permanent redirect.
    pub fn permanent_redirect(url: impl Into<String>) -> Self {
        Self::Abort(AbortSignal::Redirect {
            url: url.into(),
            permanent: true,
        })
    }

    /// Abort with a status code.
    pub fn status(status_code: u16, reason: impl Into<String>) -> Self {
        Self::Abort(AbortSignal::Status {
            status_code,
            reason: reason.into(),
        })
    }

    /// Plain failure from a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::Failed(anyhow::anyhow!("{}", message))
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }
}

/// A hook failure caught at the pipeline boundary.
#[derive(Debug, thiserror::Error)]
#[error("{stage} hook of page '{page_id}' failed: {error}")]
pub struct HookFailure {
    pub page_id: String,
    pub stage: HookStage,
    #[source]
    pub error: HookError,
}

/// No page matches a URL. An expected outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no page matches '{url}'")]
pub struct RouteNotFound {
    pub url: String,
}

/// Errors surfaced by the responder and the prerender enumerator.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Hook(#[from] HookFailure),

    /// Two enumerations claim the same static URL.
    #[error("URL '{url}' is enumerated by both '{first}' and '{second}'")]
    DuplicateUrl {
        url: String,
        first: String,
        second: String,
    },

    /// The response was already partially written; it cannot be recovered.
    #[error("response for '{url}' failed after headers were sent: {source}")]
    PostResponse {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("prerendering '{url}' failed: {reason}")]
    Prerender { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_display() {
        assert_eq!(
            HookError::redirect("/login").to_string(),
            "aborted with temporary redirect to /login"
        );
        assert_eq!(
            HookError::status(404, "Unknown movie").to_string(),
            "aborted with status 404: Unknown movie"
        );
        assert!(HookError::permanent_redirect("/x").is_abort());
        assert!(!HookError::msg("boom").is_abort());
    }

    #[test]
    fn test_hook_failure_display() {
        let failure = HookFailure {
            page_id: "movie".into(),
            stage: HookStage::Data,
            error: HookError::msg("upstream 503"),
        };
        assert_eq!(
            failure.to_string(),
            "data hook of page 'movie' failed: upstream 503"
        );
    }

    #[test]
    fn test_render_error_from_failure() {
        let err: RenderError = HookFailure {
            page_id: "index".into(),
            stage: HookStage::Prerender,
            error: HookError::Panicked("oops".into()),
        }
        .into();
        assert!(matches!(err, RenderError::Hook(_)));
        assert!(err.to_string().contains("prerender hook"));
    }
}
