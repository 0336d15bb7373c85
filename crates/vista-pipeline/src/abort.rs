//! Responses for aborted runs.

use vista_core::{AbortSignal, HttpResponse};

/// Build the response an abort signal stands for.
pub fn abort_response(signal: &AbortSignal) -> HttpResponse {
    match signal {
        AbortSignal::Redirect { url, permanent } => HttpResponse::redirect(url.clone(), *permanent),
        AbortSignal::Status {
            status_code,
            reason,
        } => HttpResponse::text(*status_code, reason.clone()),
    }
}
