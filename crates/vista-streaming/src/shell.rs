//! HTML document shell.

use serde_json::{Map, Value};

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Head content for the shell.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    pub title: Option<String>,
    pub meta: Vec<(String, String)>,
    pub stylesheets: Vec<String>,
}

impl HeadContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    pub fn with_stylesheet(mut self, href: &str) -> Self {
        self.stylesheets.push(href.to_string());
        self
    }

    /// Render head content to HTML. All values are escaped.
    pub fn render(&self) -> String {
        let mut html = String::from("<meta charset=\"utf-8\">\n");

        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        }
        for (name, content) in &self.meta {
            html.push_str(&format!(
                "<meta name=\"{}\" content=\"{}\">\n",
                escape_html(name),
                escape_html(content)
            ));
        }
        for href in &self.stylesheets {
            html.push_str(&format!(
                "<link rel=\"stylesheet\" href=\"{}\">\n",
                escape_html(href)
            ));
        }
        html
    }
}

/// A full HTML document wrapping a page body.
///
/// When a serialized page context is attached it is embedded as a JSON
/// script tag so the client can pick up where the server left off.
#[derive(Debug, Clone)]
pub struct Shell {
    pub head: HeadContent,
    page_context: Option<Map<String, Value>>,
}

impl Shell {
    pub fn new(head: HeadContent) -> Self {
        Self {
            head,
            page_context: None,
        }
    }

    /// Embed a projected page context.
    pub fn with_page_context(mut self, projected: Map<String, Value>) -> Self {
        self.page_context = Some(projected);
        self
    }

    /// Everything before the page body.
    pub fn render_opening(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str(&self.head.render());
        html.push_str("</head>\n<body>\n<div id=\"page-view\">");
        html
    }

    /// Everything after the page body.
    pub fn render_closing(&self) -> String {
        let mut html = String::from("</div>\n");
        if let Some(ctx) = &self.page_context {
            // `</` would end the script element early.
            let json = Value::Object(ctx.clone()).to_string().replace("</", "<\\/");
            html.push_str(&format!(
                "<script id=\"vista_pageContext\" type=\"application/json\">{}</script>\n",
                json
            ));
        }
        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render a complete document around `body`.
    pub fn render(&self, body: &str) -> String {
        format!("{}{}{}", self.render_opening(), body, self.render_closing())
    }
}
