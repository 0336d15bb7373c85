//! Terminal rendering for command results.
//!
//! Human output goes to stdout with color; JSON mode prints only the
//! machine-readable document and keeps diagnostics on stderr.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, msg: &str) {
        if !self.json {
            println!("{} {}", style("✓").green(), msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        if !self.json {
            eprintln!("{} {}", style("!").yellow().bold(), msg);
        }
    }

    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            eprintln!("{} {}", style("✗").red(), style(msg).red());
        }
    }

    /// Verbose mode only.
    pub fn debug(&self, msg: &str) {
        if self.verbose && !self.json {
            eprintln!("  {}", style(msg).dim());
        }
    }

    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// `200 /star-wars` with the code colored by class.
    pub fn status_line(&self, status_code: u16, url: &str) {
        if self.json {
            return;
        }
        let code = match status_code {
            200..=299 => style(status_code).green(),
            300..=399 => style(status_code).cyan(),
            400..=499 => style(status_code).yellow(),
            _ => style(status_code).red(),
        };
        println!("{} {}", code.bold(), style(url).bold());
    }

    pub fn header_field(&self, name: &str, value: &str) {
        if !self.json {
            println!("{}: {}", style(name).dim(), value);
        }
    }

    pub fn heading(&self, msg: &str) {
        if !self.json {
            println!("\n{}", style(msg).bold().underlined());
        }
    }

    /// Left-aligned columns; the last column is not padded.
    pub fn columns(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let line: Vec<String> = cols
            .iter()
            .zip(widths)
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", line.join("  ").trim_end());
    }

    /// Response body, printed as-is.
    pub fn body(&self, text: &str) {
        if !self.json {
            println!("\n{}", text);
        }
    }

    /// Hidden in JSON mode so stdout stays a single document.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({elapsed})") {
            pb.set_style(spinner);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

/// `1.5 KB`-style size for byte counts.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= KB * KB {
        format!("{:.1} MB", bytes_f / (KB * KB))
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}
