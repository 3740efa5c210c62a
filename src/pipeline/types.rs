//! Shared types for the preprocessing pipeline.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::classifier::Category;
use crate::error::ChannelError;
use crate::labeler::LabeledToken;

// ── Message record ──────────────────────────────────────────────────

/// One scraped message row.
///
/// Field names match the CSV header written by the scraper so rows round-trip
/// through `store::messages` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "Channel Title")]
    pub channel_title: String,
    #[serde(rename = "Channel Username")]
    pub channel_username: String,
    #[serde(rename = "ID")]
    pub id: i64,
    /// Message body; missing for media-only posts.
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "Date", with = "flexible_date", default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "Media Path")]
    pub media_path: Option<String>,
}

impl MessageRecord {
    /// Minimal record for a message body (tests, CLI input).
    pub fn from_text(id: i64, message: impl Into<String>) -> Self {
        Self {
            channel_title: String::new(),
            channel_username: String::new(),
            id,
            message: Some(message.into()),
            date: None,
            media_path: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Accepts RFC 3339 as well as `2024-06-01 10:00:00+00:00` and naive
/// `2024-06-01 10:00:00` (read as UTC). Writes RFC 3339.
mod flexible_date {
    use super::*;

    const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
    const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
            return Some(d.with_timezone(&Utc));
        }
        if let Ok(d) = DateTime::parse_from_str(raw, OFFSET_FORMAT) {
            return Some(d.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

// ── Derived outputs ─────────────────────────────────────────────────

/// A record with its labeled tokens and category.
#[derive(Debug, Clone)]
pub struct ProcessedRecord {
    pub record: MessageRecord,
    pub labeled: Vec<LabeledToken>,
    pub category: Category,
}

// ── Message source trait ────────────────────────────────────────────

/// Trait for message sources — pure I/O, no labeling logic.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Source name (e.g. "telegram").
    fn name(&self) -> &str;

    /// Fetch up to `limit` messages from one channel, oldest first.
    async fn fetch(&self, channel: &str, limit: usize) -> Result<Vec<MessageRecord>, ChannelError>;
}
