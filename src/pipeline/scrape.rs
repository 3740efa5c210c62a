//! Channel acquisition: fetch every configured channel into one CSV.

use tracing::{error, info};

use crate::config::ScraperConfig;
use crate::error::PipelineError;
use crate::pipeline::types::{MessageRecord, MessageSource};
use crate::store;

/// Fetch every channel in `config` and write all rows to `config.output_csv`.
///
/// A channel that fails is logged and skipped; the remaining channels are
/// still scraped. Returns the number of rows written.
pub async fn scrape_all(
    source: &dyn MessageSource,
    config: &ScraperConfig,
) -> Result<usize, PipelineError> {
    let mut records: Vec<MessageRecord> = Vec::new();
    let mut failed = 0;

    for channel in &config.channels {
        match source.fetch(channel, config.message_limit).await {
            Ok(rows) => {
                info!(source = source.name(), channel, rows = rows.len(), "Channel scraped");
                records.extend(rows);
            }
            Err(e) => {
                failed += 1;
                error!(source = source.name(), channel, error = %e, "Failed to scrape channel");
            }
        }
    }

    store::write_records(&config.output_csv, &records)?;
    info!(
        path = %config.output_csv.display(),
        rows = records.len(),
        channels = config.channels.len(),
        failed,
        "Scrape complete"
    );
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use secrecy::SecretString;

    use crate::error::ChannelError;

    /// Yields `limit` messages per channel, failing on `@broken`.
    struct StubSource;

    #[async_trait]
    impl MessageSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(
            &self,
            channel: &str,
            limit: usize,
        ) -> Result<Vec<MessageRecord>, ChannelError> {
            if channel == "@broken" {
                return Err(ChannelError::Api {
                    method: "getChat".into(),
                    description: "Bad Request: chat not found".into(),
                });
            }
            Ok((0..limit as i64)
                .map(|id| {
                    let mut record = MessageRecord::from_text(id, format!("post {id}"));
                    record.channel_username = channel.to_string();
                    record.channel_title = "Stub".into();
                    record
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn failed_channel_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("telegram_data.csv");
        let config = ScraperConfig::new(
            SecretString::from("123:abc".to_string()),
            vec!["@one".into(), "@broken".into(), "@two".into()],
            &output,
            dir.path().join("photos"),
        )
        .unwrap()
        .with_message_limit(3)
        .unwrap();

        let written = scrape_all(&StubSource, &config).await.unwrap();
        assert_eq!(written, 6);

        let rows = store::read_records(&output).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].channel_username, "@one");
        assert_eq!(rows[5].channel_username, "@two");
        assert_eq!(rows[5].text(), Some("post 2"));
    }
}
