//! Parsed email records — the input handed to the graph builder.
//!
//! Records arrive from an external collaborator (provider API client,
//! MBOX parser, JSON dump). Every field except `message_id` degrades
//! gracefully when absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single parsed email, as supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailRecord {
    /// Provider message id. A record without one is skipped.
    pub message_id: String,

    /// Provider conversation/thread id. Absent ⇒ no thread node.
    pub thread_id: String,

    /// Header `Date:` value (RFC 2822 or ISO-8601).
    pub date: String,

    /// Provider delivery timestamp (epoch milliseconds or ISO-8601).
    /// Preferred over `date` for thread recency.
    pub internal_date: String,

    /// Generic fallback timestamp field.
    pub timestamp: String,

    /// Raw `From:` header value.
    pub from: String,

    /// Comma-joined `To:` recipients.
    pub to: String,

    /// Comma-joined `Cc:` recipients.
    pub cc: String,

    /// Comma-joined `Bcc:` recipients.
    pub bcc: String,

    /// Decoded subject line.
    pub subject: String,

    /// Plain-text body. `content` is accepted as an alias.
    #[serde(alias = "content")]
    pub body: String,

    /// Short preview text supplied by the provider.
    pub snippet: String,

    /// Provider labels (e.g. Gmail labels).
    pub labels: Vec<String>,

    /// Provider categories.
    pub categories: Vec<String>,

    /// Externally assigned topics (from upstream classification).
    pub topics: Vec<String>,

    /// Attachment metadata.
    pub attachments: Vec<AttachmentMeta>,

    /// Provider importance flag.
    pub is_important: bool,

    /// Provider unread flag.
    pub is_unread: bool,

    /// Provider archived flag.
    pub is_archived: bool,
}

/// Metadata about an email attachment. Content itself never enters the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentMeta {
    /// Attachment filename (may be empty).
    pub filename: String,
    /// MIME content type (e.g. `"application/pdf"`).
    pub mime_type: String,
}

impl AttachmentMeta {
    /// Lowercased filename extension, used by the attachment-type filter.
    /// Falls back to the MIME subtype when the filename has no extension.
    pub fn file_type(&self) -> String {
        if let Some((_, ext)) = self.filename.rsplit_once('.') {
            if !ext.is_empty() {
                return ext.to_lowercase();
            }
        }
        match self.mime_type.split_once('/') {
            Some((_, subtype)) if !subtype.is_empty() => subtype.to_lowercase(),
            _ => String::new(),
        }
    }
}

impl EmailRecord {
    /// Best-effort canonical date for the message node.
    ///
    /// Tries the header date first, then the delivery timestamp, then the
    /// generic timestamp field; returns an empty string when nothing
    /// parses (never an error — callers treat empty as "no date").
    pub fn canonical_date(&self) -> String {
        for raw in [&self.date, &self.internal_date, &self.timestamp] {
            if let Some(dt) = parse_datetime(raw) {
                return canonical(dt);
            }
        }
        String::new()
    }

    /// Best-effort date for thread recency tracking.
    ///
    /// Priority differs from [`canonical_date`](Self::canonical_date):
    /// delivery timestamp first, then header date, then the generic field.
    pub fn thread_date(&self) -> String {
        for raw in [&self.internal_date, &self.date, &self.timestamp] {
            if let Some(dt) = parse_datetime(raw) {
                return canonical(dt);
            }
        }
        String::new()
    }
}

/// Format as `YYYY-MM-DDTHH:MM:SS` (UTC): lexicographic order equals
/// chronological order, which the thread manager and indexes rely on.
fn canonical(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse a raw date string in any of the shapes providers emit.
///
/// Accepts RFC 3339, RFC 2822, bare `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS`, bare dates, and epoch milliseconds/seconds.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }

    // Epoch milliseconds (13 digits) or seconds (10 digits)
    if raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<i64>() {
            let ts = if raw.len() >= 13 { n / 1000 } else { n };
            return DateTime::from_timestamp(ts, 0);
        }
    }

    None
}
