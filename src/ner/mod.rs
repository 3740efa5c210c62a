//! Pretrained NER oracle.
//!
//! An optional, independent annotator: predictions are reported alongside the
//! rule-based labels and never merged into them. Nothing in the labeler or
//! classifier depends on this module.

pub mod huggingface;

pub use huggingface::HuggingFaceNer;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::NerError;
use crate::pipeline::types::MessageRecord;

/// One predicted entity span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Entity type (e.g. `LOC`, `PER`, `ORG`, `DATE`).
    pub entity_group: String,
    pub word: String,
    pub score: f32,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

/// Token-classification model treated as a black box.
#[async_trait]
pub trait NerOracle: Send + Sync {
    /// Model identifier, for reporting.
    fn model_name(&self) -> &str;

    /// Predict entity spans for each message, in input order.
    async fn predict(&self, messages: &[String]) -> Result<Vec<Vec<EntitySpan>>, NerError>;
}

/// Predictions for one message.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePrediction {
    pub id: i64,
    pub spans: Vec<EntitySpan>,
}

/// Summary of an oracle run.
#[derive(Debug, Clone, Serialize)]
pub struct NerReport {
    pub model: String,
    pub messages: usize,
    pub entities: usize,
    /// Entity group → span count.
    pub by_group: BTreeMap<String, usize>,
    pub predictions: Vec<MessagePrediction>,
}

/// Run the oracle over every record with a message, `batch_size` at a time.
pub async fn annotate(
    oracle: &dyn NerOracle,
    records: &[MessageRecord],
    batch_size: usize,
) -> Result<NerReport, NerError> {
    let with_text: Vec<(i64, String)> = records
        .iter()
        .filter_map(|r| r.message.clone().map(|m| (r.id, m)))
        .collect();

    let mut predictions = Vec::with_capacity(with_text.len());
    for batch in with_text.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
        let spans = oracle.predict(&texts).await?;
        if spans.len() != batch.len() {
            return Err(NerError::InvalidResponse {
                model: oracle.model_name().to_string(),
                reason: format!("expected {} predictions, got {}", batch.len(), spans.len()),
            });
        }
        predictions.extend(
            batch
                .iter()
                .zip(spans)
                .map(|((id, _), spans)| MessagePrediction { id: *id, spans }),
        );
    }

    let mut by_group: BTreeMap<String, usize> = BTreeMap::new();
    for span in predictions.iter().flat_map(|p| &p.spans) {
        *by_group.entry(span.entity_group.clone()).or_default() += 1;
    }
    let entities = by_group.values().sum();

    info!(
        model = oracle.model_name(),
        messages = predictions.len(),
        entities,
        "NER oracle run complete"
    );

    Ok(NerReport {
        model: oracle.model_name().to_string(),
        messages: predictions.len(),
        entities,
        by_group,
        predictions,
    })
}
