//! Prerender output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One prerendered URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerenderedPage {
    pub url: String,
    pub page_id: String,
    /// `None` when the page produced no response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Page context projected to the configured keys.
    pub page_context: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// All prerendered pages, ordered by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerenderManifest {
    pub generated_at: DateTime<Utc>,
    pub pages: BTreeMap<String, PrerenderedPage>,
}

impl PrerenderManifest {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            pages: BTreeMap::new(),
        }
    }

    /// Add a page, returning the one it replaced.
    pub fn insert(&mut self, page: PrerenderedPage) -> Option<PrerenderedPage> {
        self.pages.insert(page.url.clone(), page)
    }

    pub fn get(&self, url: &str) -> Option<&PrerenderedPage> {
        self.pages.get(url)
    }

    /// URLs in order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for PrerenderManifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page(url: &str) -> PrerenderedPage {
        let mut ctx = Map::new();
        ctx.insert("title".into(), json!("A New Hope"));
        PrerenderedPage {
            url: url.into(),
            page_id: "movie".into(),
            status_code: Some(200),
            page_context: ctx,
            html: None,
        }
    }

    #[test]
    fn test_urls_are_ordered() {
        let mut manifest = PrerenderManifest::new();
        manifest.insert(page("/star-wars/2"));
        manifest.insert(page("/star-wars"));
        manifest.insert(page("/star-wars/1"));

        let urls: Vec<&str> = manifest.urls().collect();
        assert_eq!(urls, vec!["/star-wars", "/star-wars/1", "/star-wars/2"]);
        assert!(manifest.insert(page("/star-wars")).is_some());
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_serialized_shape() {
        let mut manifest = PrerenderManifest::new();
        manifest.insert(page("/star-wars/1"));

        let value: Value = serde_json::from_str(&manifest.to_json_pretty().unwrap()).unwrap();
        let entry = &value["pages"]["/star-wars/1"];
        assert_eq!(entry["pageId"], "movie");
        assert_eq!(entry["statusCode"], 200);
        assert_eq!(entry["pageContext"]["title"], "A New Hope");
        assert!(entry.get("html").is_none());
        assert!(value["generatedAt"].is_string());
    }
}
