//! Configuration types.
//!
//! Every collaborator takes an explicit config struct that is validated when
//! it is built. Environment variables are only read by the `from_env`
//! constructors, which the binary calls after loading `.env`.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Default upper bound on messages fetched per channel.
pub const DEFAULT_MESSAGE_LIMIT: usize = 10_000;

/// Default HTTP request timeout for Bot API calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default pretrained token-classification model for the NER oracle.
pub const DEFAULT_NER_MODEL: &str = "masakhane/afroxlmr-large-ner-masakhaner-1.0_2.0";

/// Default inference endpoint; the model id is appended.
pub const DEFAULT_NER_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// Message acquisition configuration.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Telegram bot token.
    pub bot_token: SecretString,
    /// Channel usernames, each starting with `@`.
    pub channels: Vec<String>,
    /// CSV file the scraped rows are written to.
    pub output_csv: PathBuf,
    /// Directory downloaded photos are written to.
    pub media_dir: PathBuf,
    /// Maximum messages kept per channel.
    pub message_limit: usize,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ScraperConfig {
    /// Build and validate a config with default limits.
    pub fn new(
        bot_token: SecretString,
        channels: Vec<String>,
        output_csv: impl Into<PathBuf>,
        media_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            bot_token,
            channels,
            output_csv: output_csv.into(),
            media_dir: media_dir.into(),
            message_limit: DEFAULT_MESSAGE_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read from the environment:
    /// `TG_BOT_TOKEN`, `TG_CHANNELS` (comma-separated), `SCRAPER_OUTPUT_CSV`,
    /// `SCRAPER_MEDIA_DIR`, `SCRAPER_MESSAGE_LIMIT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TG_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TG_BOT_TOKEN".into()))?;

        let channels: Vec<String> = std::env::var("TG_CHANNELS")
            .map_err(|_| ConfigError::MissingEnvVar("TG_CHANNELS".into()))?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let output_csv =
            std::env::var("SCRAPER_OUTPUT_CSV").unwrap_or_else(|_| "telegram_data.csv".to_string());
        let media_dir = std::env::var("SCRAPER_MEDIA_DIR").unwrap_or_else(|_| "photos".to_string());

        let mut config = Self {
            bot_token: SecretString::from(bot_token),
            channels,
            output_csv: output_csv.into(),
            media_dir: media_dir.into(),
            message_limit: DEFAULT_MESSAGE_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        if let Ok(limit) = std::env::var("SCRAPER_MESSAGE_LIMIT") {
            config.message_limit = limit.parse().map_err(|e| ConfigError::InvalidValue {
                key: "SCRAPER_MESSAGE_LIMIT".into(),
                message: format!("{e}"),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_message_limit(mut self, limit: usize) -> Result<Self, ConfigError> {
        self.message_limit = limit;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "bot_token".into(),
                hint: "Set TG_BOT_TOKEN to the token issued by @BotFather.".into(),
            });
        }
        if self.channels.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "channels".into(),
                hint: "Set TG_CHANNELS, e.g. TG_CHANNELS=@sinayelj".into(),
            });
        }
        if let Some(bad) = self
            .channels
            .iter()
            .find(|c| !c.starts_with('@') || c.len() < 2)
        {
            return Err(ConfigError::InvalidValue {
                key: "channels".into(),
                message: format!("channel {bad:?} must be an @username"),
            });
        }
        if self.message_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "message_limit".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.output_csv.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "output_csv".into(),
                hint: "Provide a CSV path for scraped rows.".into(),
            });
        }
        Ok(())
    }
}

/// Batch preprocessing configuration.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Scraped message CSV.
    pub input_csv: PathBuf,
    /// Directory the derived files are written to.
    pub output_dir: PathBuf,
    /// Blocking workers used to label messages.
    pub parallelism: usize,
    /// Strip emojis before labeling and classification.
    pub strip_emojis: bool,
}

impl PreprocessConfig {
    pub fn new(
        input_csv: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            input_csv: input_csv.into(),
            output_dir: output_dir.into(),
            parallelism: default_parallelism(),
            strip_emojis: true,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Result<Self, ConfigError> {
        self.parallelism = parallelism;
        self.validate()?;
        Ok(self)
    }

    pub fn with_strip_emojis(mut self, strip: bool) -> Self {
        self.strip_emojis = strip;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_csv.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "input_csv".into(),
                hint: "Provide the scraped message CSV.".into(),
            });
        }
        if self.parallelism == 0 {
            return Err(ConfigError::InvalidValue {
                key: "parallelism".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Messages after dropping missing rows and stripping emojis.
    pub fn clean_csv(&self) -> PathBuf {
        self.output_dir.join("clean_data.csv")
    }

    /// Labeled token corpus.
    pub fn corpus_path(&self) -> PathBuf {
        self.output_dir.join("labeled_telegram_data.txt")
    }

    /// Every row with its category.
    pub fn classified_csv(&self) -> PathBuf {
        self.output_dir.join("labeled_data.csv")
    }

    /// Rows no category matched.
    pub fn uncategorized_csv(&self) -> PathBuf {
        self.output_dir.join("uncategorized_data.csv")
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// NER oracle configuration.
#[derive(Debug, Clone)]
pub struct NerConfig {
    pub api_token: SecretString,
    pub model: String,
    pub endpoint: String,
    /// Messages per inference request.
    pub batch_size: usize,
}

impl NerConfig {
    pub fn new(api_token: SecretString) -> Self {
        Self {
            api_token,
            model: DEFAULT_NER_MODEL.to_string(),
            endpoint: DEFAULT_NER_ENDPOINT.to_string(),
            batch_size: 16,
        }
    }

    /// Read `HF_API_TOKEN`, `NER_MODEL` and `NER_ENDPOINT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("HF_API_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("HF_API_TOKEN".into()))?;
        let mut config = Self::new(SecretString::from(token));
        if let Ok(model) = std::env::var("NER_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = std::env::var("NER_ENDPOINT") {
            config.endpoint = endpoint;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "model".into(),
                message: "model id is empty".into(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch_size".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Full inference URL for the configured model.
    pub fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn token(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn scraper_config_accepts_valid_input() {
        let config = ScraperConfig::new(
            token("123:abc"),
            vec!["@sinayelj".into()],
            "telegram_data.csv",
            "photos",
        )
        .unwrap();
        assert_eq!(config.message_limit, DEFAULT_MESSAGE_LIMIT);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn scraper_config_rejects_missing_token() {
        let err = ScraperConfig::new(token("  "), vec!["@a".into()], "out.csv", "photos")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "bot_token"));
    }

    #[test]
    fn scraper_config_rejects_bad_channels() {
        assert!(ScraperConfig::new(token("t"), vec![], "out.csv", "photos").is_err());
        let err = ScraperConfig::new(token("t"), vec!["sinayelj".into()], "out.csv", "photos")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(ScraperConfig::new(token("t"), vec!["@".into()], "out.csv", "photos").is_err());
    }

    #[test]
    fn scraper_config_rejects_zero_limit() {
        let config =
            ScraperConfig::new(token("t"), vec!["@a".into()], "out.csv", "photos").unwrap();
        assert!(config.with_message_limit(0).is_err());
    }

    #[test]
    fn preprocess_paths() {
        let config = PreprocessConfig::new("telegram_data.csv", "data").unwrap();
        assert_eq!(config.clean_csv(), Path::new("data/clean_data.csv"));
        assert_eq!(config.corpus_path(), Path::new("data/labeled_telegram_data.txt"));
        assert_eq!(config.classified_csv(), Path::new("data/labeled_data.csv"));
        assert_eq!(config.uncategorized_csv(), Path::new("data/uncategorized_data.csv"));
        assert!(config.parallelism >= 1);
        assert!(config.strip_emojis);
    }

    #[test]
    fn preprocess_rejects_zero_parallelism() {
        let config = PreprocessConfig::new("in.csv", "out").unwrap();
        assert!(config.with_parallelism(0).is_err());
    }

    #[test]
    fn ner_model_url() {
        let mut config = NerConfig::new(token("hf_x"));
        assert_eq!(
            config.model_url(),
            "https://api-inference.huggingface.co/models/masakhane/afroxlmr-large-ner-masakhaner-1.0_2.0"
        );
        config.endpoint = "http://localhost:8080/".into();
        config.model = "m".into();
        assert_eq!(config.model_url(), "http://localhost:8080/m");
    }
}
