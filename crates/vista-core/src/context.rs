//! Page context: the per-run data bag shared by every hook.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diagnostics::USER_AGENT_DEPRECATION;
use crate::lifecycle::TimingContext;
use crate::response::HttpResponse;

/// Unique identifier of one pipeline run, used for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracted route parameters (e.g., `movieId` from `/star-wars/:movieId`).
pub type RouteParams = HashMap<String, String>;

/// Read-only view of the request headers.
///
/// Names are stored lowercase. Cloning is cheap: every clone shares the
/// same underlying map.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    inner: Arc<HashMap<String, String>>,
}

impl RequestHeaders {
    /// Build from `(name, value)` pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        Self {
            inner: Arc::new(map),
        }
    }

    /// Get a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Iterate over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Initial values a run starts from.
#[derive(Debug, Clone, Default)]
pub struct PageContextInit {
    /// The URL as received, including query string.
    pub url_original: String,
    /// Request headers.
    pub headers: RequestHeaders,
}

impl PageContextInit {
    /// Create an init value for a URL with no headers.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url_original: url.into(),
            headers: RequestHeaders::default(),
        }
    }

    /// Attach request headers.
    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }
}

/// Partial page context, as returned by data hooks and attached to
/// prerender entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContextPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_props: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Arbitrary user keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_page_props(mut self, props: Value) -> Self {
        self.page_props = Some(props);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether `data` is pre-supplied.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Mutable record owned by exactly one pipeline run.
#[derive(Debug)]
pub struct PageContext {
    /// Correlation ID for this run.
    pub request_id: RequestId,
    /// URL as received.
    pub url_original: String,
    /// Path component of `url_original`.
    pub url_pathname: String,
    /// Parameters extracted by the route resolver.
    pub route_params: RouteParams,
    /// ID of the matched page, once resolved.
    pub page_id: Option<String>,
    /// Data populated by data hooks.
    pub data: Option<Value>,
    /// Props handed to the view renderer.
    pub page_props: Option<Value>,
    /// Document title.
    pub title: Option<String>,
    /// Response produced by the pipeline. `None` means defer to the host.
    pub http_response: Option<HttpResponse>,
    /// Set when the run computes a static output rather than a live request.
    pub is_prerendering: bool,
    /// Arbitrary user keys.
    pub extra: Map<String, Value>,
    /// Stage timings.
    pub timing: TimingContext,
    headers: RequestHeaders,
    user_agent: OnceCell<Option<String>>,
}

impl PageContext {
    /// Create a fresh context from init values.
    pub fn new(init: PageContextInit) -> Self {
        let url_pathname = pathname_of(&init.url_original).to_string();
        Self {
            request_id: RequestId::generate(),
            url_original: init.url_original,
            url_pathname,
            route_params: RouteParams::new(),
            page_id: None,
            data: None,
            page_props: None,
            title: None,
            http_response: None,
            is_prerendering: false,
            extra: Map::new(),
            timing: TimingContext::new(),
            headers: init.headers,
            user_agent: OnceCell::new(),
        }
    }

    /// Request headers (read-only).
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// Get a route parameter by name.
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params.get(name).map(|s| s.as_str())
    }

    /// The `user-agent` request header.
    ///
    /// Deprecated: read `headers().get("user-agent")` instead. The first
    /// access in the process logs a deprecation warning.
    #[deprecated(note = "use `headers().get(\"user-agent\")` instead")]
    pub fn user_agent(&self) -> Option<&str> {
        USER_AGENT_DEPRECATION.fire();
        self.user_agent
            .get_or_init(|| self.headers.get("user-agent").map(str::to_string))
            .as_deref()
    }

    /// Merge a partial context into this one.
    ///
    /// Last write wins per key. `data`, `pageProps` and `extra` entries are
    /// merged shallowly when both sides are JSON objects. Absent fields in
    /// the patch never clear existing ones.
    pub fn merge(&mut self, patch: PageContextPatch) {
        if let Some(data) = patch.data {
            merge_value(&mut self.data, data);
        }
        if let Some(props) = patch.page_props {
            merge_value(&mut self.page_props, props);
        }
        if let Some(title) = patch.title {
            self.title = Some(title);
        }
        for (key, value) in patch.extra {
            let mut slot = self.extra.remove(&key);
            merge_value(&mut slot, value);
            if let Some(merged) = slot {
                self.extra.insert(key, merged);
            }
        }
    }

    /// Serialize only the whitelisted keys.
    ///
    /// Built-in keys use their camelCase names (`urlOriginal`, `urlPathname`,
    /// `routeParams`, `pageId`, `data`, `pageProps`, `title`,
    /// `isPrerendering`); any other key is looked up in `extra`. Unset keys
    /// are omitted.
    pub fn project<I, S>(&self, keys: I) -> Map<String, Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Map::new();
        for key in keys {
            let key = key.as_ref();
            let value = match key {
                "urlOriginal" => Some(Value::String(self.url_original.clone())),
                "urlPathname" => Some(Value::String(self.url_pathname.clone())),
                "routeParams" => Some(Value::Object(
                    self.route_params
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                )),
                "pageId" => self.page_id.clone().map(Value::String),
                "data" => self.data.clone(),
                "pageProps" => self.page_props.clone(),
                "title" => self.title.clone().map(Value::String),
                "isPrerendering" => Some(Value::Bool(self.is_prerendering)),
                other => self.extra.get(other).cloned(),
            };
            if let Some(value) = value {
                out.insert(key.to_string(), value);
            }
        }
        out
    }
}

fn merge_value(slot: &mut Option<Value>, incoming: Value) {
    match incoming {
        Value::Object(new) => match slot {
            Some(Value::Object(existing)) => existing.extend(new),
            _ => *slot = Some(Value::Object(new)),
        },
        other => *slot = Some(other),
    }
}

/// Path component of a URL: query string and fragment removed.
pub fn pathname_of(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
