//! Telegram message source — drains channel posts from the Bot API.
//!
//! The bot must be a member (or admin) of every scraped channel. Posts are
//! read with `getUpdates` (`allowed_updates = ["channel_post"]`), paginating
//! by update offset. The update queue is shared by every channel the bot sees,
//! so posts are buffered per channel for the lifetime of the scraper: reading
//! one channel never discards another channel's posts. After each fetch the
//! queue is confirmed only up to the earliest post not yet handed out.
//! Photos are downloaded with `getFile` into the media directory as
//! `<channel>_<message id>.jpg`.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::ScraperConfig;
use crate::error::ChannelError;
use crate::pipeline::types::{MessageRecord, MessageSource};

/// Public Bot API host.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Updates requested per `getUpdates` call (Bot API maximum).
const UPDATES_PAGE_SIZE: u32 = 100;

/// Give up on a method after this many consecutive rate-limit responses.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Fallback wait when Telegram rate limits without `retry_after`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// A channel post extracted from an update.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPost {
    pub update_id: i64,
    pub message_id: i64,
    /// Channel username without the `@`.
    pub chat_username: String,
    pub chat_title: String,
    pub text: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Largest available photo size.
    pub photo_file_id: Option<String>,
}

/// Posts read from the update queue but not yet returned.
#[derive(Debug, Default)]
struct UpdateBuffer {
    /// Offset sent with the last `getUpdates`; Telegram has dropped every
    /// update below it.
    confirmed: i64,
    /// One past the highest update id read.
    read: i64,
    /// Unreturned posts per channel key, in update order. Only channels with
    /// an entry are buffered.
    pending: HashMap<String, VecDeque<ChannelPost>>,
}

impl UpdateBuffer {
    fn watch(&mut self, channel: &str) {
        self.pending.entry(channel_key(channel)).or_default();
    }

    fn pending_len(&self, key: &str) -> usize {
        self.pending.get(key).map_or(0, VecDeque::len)
    }

    fn store(&mut self, posts: Vec<ChannelPost>) {
        for post in posts {
            if let Some(queue) = self.pending.get_mut(&post.chat_username.to_lowercase()) {
                queue.push_back(post);
            }
        }
    }

    fn take(&mut self, key: &str, limit: usize) -> Vec<ChannelPost> {
        let Some(queue) = self.pending.get_mut(key) else {
            return Vec::new();
        };
        let n = limit.min(queue.len());
        queue.drain(..n).collect()
    }

    /// Highest offset that confirms no buffered post: the earliest pending
    /// update, or everything read when nothing is pending.
    fn safe_offset(&self) -> i64 {
        self.pending
            .values()
            .filter_map(VecDeque::front)
            .map(|post| post.update_id)
            .min()
            .map_or(self.read, |earliest| earliest.min(self.read))
    }
}

/// Telegram scraper over the Bot API.
pub struct TelegramScraper {
    bot_token: SecretString,
    media_dir: PathBuf,
    api_base: String,
    client: reqwest::Client,
    buffer: Mutex<UpdateBuffer>,
}

impl TelegramScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ChannelError::RequestFailed {
                method: "client".into(),
                reason: e.to_string(),
            })?;
        let mut buffer = UpdateBuffer::default();
        for channel in &config.channels {
            buffer.watch(channel);
        }
        Ok(Self {
            bot_token: config.bot_token.clone(),
            media_dir: config.media_dir.clone(),
            api_base: TELEGRAM_API_BASE.to_string(),
            client,
            buffer: Mutex::new(buffer),
        })
    }

    /// Point at a self-hosted Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{file_path}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Call a Bot API method, retrying on rate limits.
    async fn call(&self, method: &str, body: &Value) -> Result<Value, ChannelError> {
        let mut attempts = 0;
        loop {
            match self.call_once(method, body).await {
                Err(ChannelError::RateLimited { retry_after, .. })
                    if attempts < MAX_RATE_LIMIT_RETRIES =>
                {
                    attempts += 1;
                    let wait = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                    tracing::warn!(method, attempts, ?wait, "Telegram rate limited, backing off");
                    tokio::time::sleep(wait).await;
                }
                other => return other,
            }
        }
    }

    async fn call_once(&self, method: &str, body: &Value) -> Result<Value, ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::RequestFailed {
                method: method.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let data: Value = resp.json().await.map_err(|e| ChannelError::RequestFailed {
            method: method.into(),
            reason: format!("{status}: {e}"),
        })?;

        parse_api_response(method, status.as_u16(), data)
    }

    /// Title of a channel via `getChat`.
    pub async fn channel_title(&self, channel: &str) -> Result<String, ChannelError> {
        let chat = self
            .call("getChat", &serde_json::json!({ "chat_id": channel }))
            .await?;
        Ok(chat
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(channel)
            .to_string())
    }

    /// Download a photo to `<media_dir>/<channel>_<message_id>.jpg`.
    async fn download_photo(
        &self,
        channel: &str,
        message_id: i64,
        file_id: &str,
    ) -> Result<PathBuf, ChannelError> {
        let file = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let file_path = file
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| ChannelError::DownloadFailed {
                file_id: file_id.into(),
                reason: "getFile returned no file_path".into(),
            })?;

        let resp = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ChannelError::DownloadFailed {
                file_id: file_id.into(),
                reason: e.to_string(),
            })?;
        let bytes = resp.bytes().await.map_err(|e| ChannelError::DownloadFailed {
            file_id: file_id.into(),
            reason: e.to_string(),
        })?;

        let target = media_path(&self.media_dir, channel, message_id);
        tokio::fs::create_dir_all(&self.media_dir).await?;
        tokio::fs::write(&target, &bytes).await?;
        tracing::debug!(path = %target.display(), size = bytes.len(), "Photo downloaded");
        Ok(target)
    }
}

#[async_trait]
impl MessageSource for TelegramScraper {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn fetch(&self, channel: &str, limit: usize) -> Result<Vec<MessageRecord>, ChannelError> {
        let title = self.channel_title(channel).await?;
        tracing::info!(channel, title = %title, limit, "Scraping Telegram channel");

        let posts = self.collect_posts(channel, limit).await?;

        let mut records = Vec::with_capacity(posts.len());
        for post in posts {
            let media_path = match post.photo_file_id.as_deref() {
                Some(file_id) => match self.download_photo(channel, post.message_id, file_id).await {
                    Ok(path) => Some(path.display().to_string()),
                    Err(e) => {
                        tracing::warn!(
                            channel,
                            message_id = post.message_id,
                            error = %e,
                            "Photo download failed"
                        );
                        None
                    }
                },
                None => None,
            };

            records.push(MessageRecord {
                channel_title: if post.chat_title.is_empty() {
                    title.clone()
                } else {
                    post.chat_title
                },
                channel_username: channel.to_string(),
                id: post.message_id,
                message: post.text,
                date: post.date,
                media_path,
            });
        }

        tracing::info!(channel, count = records.len(), "Scraped Telegram channel");
        Ok(records)
    }
}

impl TelegramScraper {
    /// Read the update queue until `channel` has `limit` buffered posts or
    /// the queue is drained, then hand out up to `limit` of them.
    async fn collect_posts(
        &self,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ChannelPost>, ChannelError> {
        let key = channel_key(channel);
        let mut buffer = self.buffer.lock().await;
        buffer.watch(channel);

        while buffer.pending_len(&key) < limit {
            let body = serde_json::json!({
                "offset": buffer.read,
                "limit": UPDATES_PAGE_SIZE,
                "timeout": 0,
                "allowed_updates": ["channel_post"]
            });
            let result = self.call("getUpdates", &body).await?;
            buffer.confirmed = buffer.read;

            let updates = result.as_array().map(Vec::as_slice).unwrap_or_default();
            if updates.is_empty() {
                break;
            }

            let (posts, next_offset) = parse_updates(updates);
            match next_offset {
                Some(next) if next > buffer.read => buffer.read = next,
                // no progress; stop rather than re-read the same page
                _ => break,
            }
            buffer.store(posts);
        }

        let posts = buffer.take(&key, limit);
        self.acknowledge(&mut buffer).await?;
        Ok(posts)
    }

    /// Confirm every update before the earliest post still buffered.
    async fn acknowledge(&self, buffer: &mut UpdateBuffer) -> Result<(), ChannelError> {
        let offset = buffer.safe_offset();
        if offset <= buffer.confirmed {
            return Ok(());
        }
        let body = serde_json::json!({
            "offset": offset,
            "limit": 1,
            "timeout": 0,
            "allowed_updates": ["channel_post"]
        });
        self.call("getUpdates", &body).await?;
        buffer.confirmed = offset;
        tracing::debug!(offset, "Confirmed Telegram updates");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Unwrap a Bot API envelope (`{"ok": .., "result": ..}`) into its result.
fn parse_api_response(method: &str, status: u16, data: Value) -> Result<Value, ChannelError> {
    if data.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(data.get("result").cloned().unwrap_or(Value::Null));
    }

    let description = data
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("no description")
        .to_string();
    let code = data
        .get("error_code")
        .and_then(Value::as_u64)
        .unwrap_or(u64::from(status));

    match code {
        401 | 403 => Err(ChannelError::AuthFailed {
            name: "telegram".into(),
            reason: description,
        }),
        429 => Err(ChannelError::RateLimited {
            method: method.into(),
            retry_after: data
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(Value::as_u64)
                .map(Duration::from_secs),
        }),
        _ => Err(ChannelError::Api {
            method: method.into(),
            description,
        }),
    }
}

/// Extract channel posts from a page of updates.
///
/// Returns the posts in update order and the offset that acknowledges the
/// whole page (last `update_id + 1`).
pub fn parse_updates(updates: &[Value]) -> (Vec<ChannelPost>, Option<i64>) {
    let mut next_offset = None;
    let mut posts = Vec::new();

    for update in updates {
        let Some(update_id) = update.get("update_id").and_then(Value::as_i64) else {
            continue;
        };
        next_offset = Some(update_id + 1);

        let Some(post) = update.get("channel_post") else {
            continue;
        };
        let chat = post.get("chat");
        let Some(username) = chat
            .and_then(|c| c.get("username"))
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
        else {
            continue;
        };
        let Some(message_id) = post.get("message_id").and_then(Value::as_i64) else {
            continue;
        };

        let text = post
            .get("text")
            .or_else(|| post.get("caption"))
            .and_then(Value::as_str)
            .map(String::from);

        let date = post
            .get("date")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        posts.push(ChannelPost {
            update_id,
            message_id,
            chat_username: username.to_string(),
            chat_title: chat
                .and_then(|c| c.get("title"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            text,
            date,
            photo_file_id: largest_photo(post),
        });
    }

    (posts, next_offset)
}

/// Buffer key for a channel: username without `@`, lower-cased.
fn channel_key(channel: &str) -> String {
    channel.trim_start_matches('@').to_lowercase()
}

/// File id of the largest photo size in a message, if it has a photo.
fn largest_photo(post: &Value) -> Option<String> {
    post.get("photo")
        .and_then(Value::as_array)?
        .iter()
        .max_by_key(|size| {
            size.get("file_size")
                .and_then(Value::as_u64)
                .or_else(|| {
                    let w = size.get("width").and_then(Value::as_u64)?;
                    let h = size.get("height").and_then(Value::as_u64)?;
                    Some(w * h)
                })
                .unwrap_or(0)
        })
        .and_then(|size| size.get("file_id"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Where a channel photo is stored.
pub fn media_path(media_dir: &Path, channel: &str, message_id: i64) -> PathBuf {
    media_dir.join(format!("{channel}_{message_id}.jpg"))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scraper() -> TelegramScraper {
        let config = ScraperConfig::new(
            SecretString::from("123:ABC".to_string()),
            vec!["@sinayelj".into()],
            "telegram_data.csv",
            "photos",
        )
        .unwrap();
        TelegramScraper::new(&config).unwrap()
    }

    fn post_update(update_id: i64, username: &str, message_id: i64, text: Option<&str>) -> Value {
        let mut post = json!({
            "message_id": message_id,
            "date": 1717236000,
            "chat": { "id": -100123, "type": "channel", "title": "Sina Kids", "username": username }
        });
        if let Some(t) = text {
            post["text"] = json!(t);
        }
        json!({ "update_id": update_id, "channel_post": post })
    }

    #[test]
    fn telegram_source_name() {
        assert_eq!(scraper().name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        assert_eq!(
            scraper().api_url("getUpdates"),
            "https://api.telegram.org/bot123:ABC/getUpdates"
        );
    }

    #[test]
    fn telegram_file_url_with_custom_base() {
        let s = scraper().with_api_base("http://localhost:8081/");
        assert_eq!(
            s.file_url("photos/file_1.jpg"),
            "http://localhost:8081/file/bot123:ABC/photos/file_1.jpg"
        );
    }

    #[test]
    fn parses_posts_from_every_channel() {
        let updates = vec![
            post_update(10, "sinayelj", 101, Some("ዋጋ 500 ብር")),
            post_update(11, "otherchannel", 7, Some("other")),
            post_update(12, "SinaYelj", 102, None),
            json!({ "update_id": 13, "message": { "text": "direct message" } }),
        ];

        let (posts, next) = parse_updates(&updates);
        assert_eq!(next, Some(14));
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].message_id, 101);
        assert_eq!(posts[0].chat_username, "sinayelj");
        assert_eq!(posts[0].text.as_deref(), Some("ዋጋ 500 ብር"));
        assert_eq!(posts[0].chat_title, "Sina Kids");
        assert_eq!(
            posts[0].date,
            DateTime::from_timestamp(1717236000, 0)
        );
        assert_eq!(posts[1].chat_username, "otherchannel");
        assert_eq!(posts[2].update_id, 12);
        assert_eq!(posts[2].text, None);
    }

    #[test]
    fn buffer_keeps_posts_per_watched_channel() {
        let mut buffer = UpdateBuffer::default();
        buffer.watch("@sinayelj");
        let (posts, next) = parse_updates(&[
            post_update(10, "sinayelj", 101, Some("a")),
            post_update(11, "otherchannel", 7, Some("ignored")),
            post_update(12, "SinaYelj", 102, Some("b")),
        ]);
        buffer.read = next.unwrap();
        buffer.store(posts);

        assert_eq!(buffer.pending_len("sinayelj"), 2);
        assert_eq!(buffer.pending_len("otherchannel"), 0);
        // the earliest unreturned post blocks confirmation
        assert_eq!(buffer.safe_offset(), 10);

        let taken = buffer.take("sinayelj", 1);
        assert_eq!(taken[0].message_id, 101);
        assert_eq!(buffer.safe_offset(), 12);

        buffer.take("sinayelj", 5);
        assert_eq!(buffer.safe_offset(), 13);
    }

    #[test]
    fn caption_is_used_for_photo_posts() {
        let updates = vec![json!({
            "update_id": 1,
            "channel_post": {
                "message_id": 5,
                "chat": { "username": "sinayelj", "title": "Sina" },
                "caption": "toy 300 ብር",
                "photo": [
                    { "file_id": "small", "file_size": 1000, "width": 90, "height": 90 },
                    { "file_id": "large", "file_size": 90000, "width": 1280, "height": 1280 },
                    { "file_id": "medium", "file_size": 20000, "width": 320, "height": 320 }
                ]
            }
        })];

        let (posts, _) = parse_updates(&updates);
        assert_eq!(posts[0].text.as_deref(), Some("toy 300 ብር"));
        assert_eq!(posts[0].photo_file_id.as_deref(), Some("large"));
    }

    #[test]
    fn photo_size_falls_back_to_dimensions() {
        let post = json!({
            "photo": [
                { "file_id": "a", "width": 100, "height": 100 },
                { "file_id": "b", "width": 800, "height": 600 }
            ]
        });
        assert_eq!(largest_photo(&post).as_deref(), Some("b"));
        assert_eq!(largest_photo(&json!({ "text": "no photo" })), None);
    }

    #[test]
    fn empty_page_has_no_offset() {
        let (posts, next) = parse_updates(&[]);
        assert!(posts.is_empty());
        assert_eq!(next, None);
    }

    #[test]
    fn api_envelope_ok() {
        let result = parse_api_response("getChat", 200, json!({ "ok": true, "result": { "title": "T" } }));
        assert_eq!(result.unwrap()["title"], "T");
    }

    #[test]
    fn api_envelope_errors() {
        let auth = parse_api_response(
            "getChat",
            401,
            json!({ "ok": false, "error_code": 401, "description": "Unauthorized" }),
        );
        assert!(matches!(auth, Err(ChannelError::AuthFailed { .. })));

        let limited = parse_api_response(
            "getUpdates",
            429,
            json!({ "ok": false, "error_code": 429, "description": "Too Many Requests", "parameters": { "retry_after": 3 } }),
        );
        match limited {
            Err(ChannelError::RateLimited { retry_after, .. }) => {
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }

        let api = parse_api_response(
            "getChat",
            400,
            json!({ "ok": false, "error_code": 400, "description": "Bad Request: chat not found" }),
        );
        match api {
            Err(ChannelError::Api { description, .. }) => {
                assert!(description.contains("chat not found"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn media_file_name() {
        assert_eq!(
            media_path(Path::new("photos"), "@sinayelj", 42),
            Path::new("photos/@sinayelj_42.jpg")
        );
    }
}
