//! Access log line rendering
//!
//! `combined` and `common` follow the usual web server layouts, `json` emits
//! one object per line. Any other format string is treated as a pattern of
//! `$variable` placeholders.

use chrono::Local;
use std::net::SocketAddr;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry for one served request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address, `-` when unknown
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string, no leading `?`
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Validator sent back, if any
    pub etag: Option<String>,
    /// Handling time, microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Entry stamped with the current local time
    pub fn new(remote_addr: Option<SocketAddr>, method: String, path: String) -> Self {
        Self {
            remote_addr: remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            etag: None,
            request_time_us: 0,
        }
    }

    /// Render the entry in the named format or custom pattern
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// Apache/Nginx Combined Log Format
    /// CLF followed by `"$http_referer" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "etag": self.etag,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr`, `$time_local`, `$time_iso8601`
    /// - `$request` (full request line), `$request_method`, `$request_uri`
    /// - `$status`, `$body_bytes_sent`, `$etag`
    /// - `$http_referer`, `$http_user_agent`
    /// - `$request_time` (seconds, 3 decimal places)
    ///
    /// A variable name is the longest run of alphanumerics and `_` after `$`.
    /// Unknown names are copied through. The pattern is scanned once, so
    /// client-supplied values are never expanded themselves.
    fn format_custom(&self, pattern: &str) -> String {
        let mut line = String::with_capacity(pattern.len() * 2);
        let mut rest = pattern;

        while let Some(pos) = rest.find('$') {
            line.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..name_len];
            match self.variable(name) {
                Some(value) => line.push_str(&value),
                None => {
                    line.push('$');
                    line.push_str(name);
                }
            }
            rest = &after[name_len..];
        }

        line.push_str(rest);
        line
    }

    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format(CLF_TIME).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let seconds = self.request_time_us as f64 / 1_000_000.0;
                format!("{seconds:.3}")
            }
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "request" => self.request_line(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "etag" => self.etag.clone().unwrap_or_else(|| "-".to_string()),
            "http_referer" => self.referer.clone().unwrap_or_else(|| "-".to_string()),
            "http_user_agent" => self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            _ => return None,
        };
        Some(value)
    }
}
