//! Hugging Face inference adapter for the NER oracle.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::NerConfig;
use crate::error::NerError;
use crate::ner::{EntitySpan, NerOracle};

/// Retries while the hosted model is cold-starting.
const MAX_LOADING_RETRIES: u32 = 3;

/// Wait used when the loading response carries no estimate.
const DEFAULT_LOADING_WAIT: Duration = Duration::from_secs(10);

/// Token-classification model served by the Hugging Face inference API.
///
/// The HTTP client is created on first use, so constructing the adapter is
/// free and never touches the network.
pub struct HuggingFaceNer {
    config: NerConfig,
    client: OnceCell<reqwest::Client>,
}

impl HuggingFaceNer {
    pub fn new(config: NerConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&reqwest::Client, NerError> {
        self.client
            .get_or_try_init(|| async {
                tracing::info!(model = %self.config.model, "Initializing NER oracle client");
                reqwest::Client::builder()
                    .timeout(Duration::from_secs(120))
                    .build()
                    .map_err(|e| NerError::RequestFailed {
                        model: self.config.model.clone(),
                        reason: e.to_string(),
                    })
            })
            .await
    }

    async fn request(&self, messages: &[String]) -> Result<Value, NerError> {
        let client = self.client().await?;
        let body = serde_json::json!({
            "inputs": messages,
            "parameters": { "aggregation_strategy": "simple" }
        });

        let resp = client
            .post(self.config.model_url())
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| NerError::RequestFailed {
                model: self.config.model.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let data: Value = resp.json().await.map_err(|e| NerError::InvalidResponse {
            model: self.config.model.clone(),
            reason: format!("{status}: {e}"),
        })?;

        if let Some(error) = data.get("error").and_then(Value::as_str) {
            if status.as_u16() == 503 || error.contains("loading") {
                return Err(NerError::ModelLoading {
                    model: self.config.model.clone(),
                    estimated_time: data
                        .get("estimated_time")
                        .and_then(Value::as_f64)
                        .map(Duration::from_secs_f64),
                });
            }
            return Err(NerError::RequestFailed {
                model: self.config.model.clone(),
                reason: format!("{status}: {error}"),
            });
        }

        Ok(data)
    }
}

#[async_trait]
impl NerOracle for HuggingFaceNer {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn predict(&self, messages: &[String]) -> Result<Vec<Vec<EntitySpan>>, NerError> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempts = 0;
        let data = loop {
            match self.request(messages).await {
                Err(NerError::ModelLoading { estimated_time, .. })
                    if attempts < MAX_LOADING_RETRIES =>
                {
                    attempts += 1;
                    let wait = estimated_time.unwrap_or(DEFAULT_LOADING_WAIT);
                    tracing::warn!(
                        model = %self.config.model,
                        attempts,
                        ?wait,
                        "NER model loading, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                other => break other?,
            }
        };

        parse_predictions(&self.config.model, messages.len(), data)
    }
}

/// Normalize an inference response into one span list per input.
///
/// Batched requests return a list of lists. A single input may come back as a
/// flat list of spans. Spans use `entity_group` when aggregated, or `entity`
/// (with its `B-`/`I-` prefix stripped) when not.
fn parse_predictions(
    model: &str,
    expected: usize,
    data: Value,
) -> Result<Vec<Vec<EntitySpan>>, NerError> {
    let invalid = |reason: String| NerError::InvalidResponse {
        model: model.to_string(),
        reason,
    };

    let Value::Array(items) = data else {
        return Err(invalid("response is not a list".into()));
    };

    let per_message: Vec<Value> = if items.iter().all(Value::is_array) {
        items
    } else if expected == 1 {
        vec![Value::Array(items)]
    } else {
        return Err(invalid("expected one prediction list per input".into()));
    };

    if per_message.len() != expected {
        return Err(invalid(format!(
            "expected {expected} prediction lists, got {}",
            per_message.len()
        )));
    }

    per_message
        .into_iter()
        .map(|list| {
            list.as_array()
                .map(|spans| spans.iter().filter_map(parse_span).collect())
                .ok_or_else(|| invalid("prediction is not a list".into()))
        })
        .collect()
}

fn parse_span(value: &Value) -> Option<EntitySpan> {
    let group = value
        .get("entity_group")
        .or_else(|| value.get("entity"))
        .and_then(Value::as_str)?;
    let group = group
        .strip_prefix("B-")
        .or_else(|| group.strip_prefix("I-"))
        .unwrap_or(group);

    Some(EntitySpan {
        entity_group: group.to_string(),
        word: value.get("word").and_then(Value::as_str)?.to_string(),
        score: value.get("score").and_then(Value::as_f64).unwrap_or(0.0) as f32,
        start: value
            .get("start")
            .and_then(Value::as_u64)
            .map(|v| v as usize),
        end: value.get("end").and_then(Value::as_u64).map(|v| v as usize),
    })
}
