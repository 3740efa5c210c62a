//! Batch preprocessor: cleans, labels and classifies scraped messages.
//!
//! Flow:
//! 1. Drop rows with a missing message
//! 2. Strip emojis (optional) → `clean_data.csv`
//! 3. Label every message on blocking workers → labeled corpus
//! 4. Classify every message → `labeled_data.csv`, `uncategorized_data.csv`

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tracing::{debug, info};

use crate::classifier::{
    Category, CategoryClassifier, CategoryCount, ClassificationReport, Taxonomy,
};
use crate::config::PreprocessConfig;
use crate::error::PipelineError;
use crate::labeler::{EntityLabeler, LabeledToken};
use crate::pipeline::types::{MessageRecord, ProcessedRecord};
use crate::store;
use crate::text::remove_emojis;

/// Outcome of one preprocessing run.
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessSummary {
    /// Rows read from the input CSV.
    pub input_rows: usize,
    /// Rows dropped for a missing message.
    pub dropped: usize,
    /// Rows labeled and classified.
    pub processed: usize,
    /// Category counts, most frequent first.
    pub counts: Vec<CategoryCount>,
    pub uncategorized: usize,
}

/// Wires the labeler and classifier over a batch of records.
///
/// Both collaborators are immutable, so they are shared with workers
/// behind `Arc` without locking.
pub struct Preprocessor {
    labeler: Arc<EntityLabeler>,
    classifier: Arc<CategoryClassifier>,
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Default taxonomy, with its kids keywords as the product lexicon.
    pub fn new(config: PreprocessConfig) -> Self {
        let taxonomy = Taxonomy::default_taxonomy();
        let labeler = EntityLabeler::with_products(taxonomy.product_keywords());
        Self::with_parts(labeler, CategoryClassifier::new(taxonomy), config)
    }

    pub fn with_parts(
        labeler: EntityLabeler,
        classifier: CategoryClassifier,
        config: PreprocessConfig,
    ) -> Self {
        Self {
            labeler: Arc::new(labeler),
            classifier: Arc::new(classifier),
            config,
        }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Read the input CSV, process it and write every derived file.
    pub async fn run(&self) -> Result<PreprocessSummary, PipelineError> {
        info!(input = %self.config.input_csv.display(), "Starting preprocessing");

        let records = store::read_records(&self.config.input_csv)?;
        let input_rows = records.len();
        let records = store::drop_missing(records);
        let dropped = input_rows - records.len();

        let records = self.clean(records);
        store::write_records(&self.config.clean_csv(), &records)?;

        let processed = self.process(records).await?;

        store::write_corpus(
            &self.config.corpus_path(),
            processed.iter().map(|p| p.labeled.as_slice()),
        )?;
        store::write_classified(
            &self.config.classified_csv(),
            processed.iter().map(|p| (&p.record, p.category)),
        )?;

        let report = ClassificationReport::build(
            self.classifier.taxonomy(),
            processed.iter().map(|p| (&p.record, p.category)),
        );
        store::write_classified(
            &self.config.uncategorized_csv(),
            report
                .uncategorized()
                .iter()
                .map(|record| (*record, Category::Uncategorized)),
        )?;

        for count in report.counts() {
            info!(category = %count.category, count = count.count, "Category count");
        }
        info!(
            processed = report.total(),
            uncategorized = report.uncategorized().len(),
            output_dir = %self.config.output_dir.display(),
            "Preprocessing complete"
        );

        Ok(PreprocessSummary {
            input_rows,
            dropped,
            processed: report.total(),
            counts: report.counts().to_vec(),
            uncategorized: report.uncategorized().len(),
        })
    }

    /// Label and classify records in memory, preserving input order.
    pub async fn process(
        &self,
        records: Vec<MessageRecord>,
    ) -> Result<Vec<ProcessedRecord>, PipelineError> {
        let labeled = self.label_all(&records).await?;
        let categories = self.classify_all(&records);

        Ok(records
            .into_iter()
            .zip(labeled)
            .zip(categories)
            .map(|((record, labeled), category)| ProcessedRecord {
                record,
                labeled,
                category,
            })
            .collect())
    }

    /// Strip emojis from every message when configured to.
    pub fn clean(&self, records: Vec<MessageRecord>) -> Vec<MessageRecord> {
        if !self.config.strip_emojis {
            return records;
        }
        records
            .into_iter()
            .map(|mut record| {
                record.message = record.message.map(|m| remove_emojis(&m).into_owned());
                record
            })
            .collect()
    }

    /// Label every record on up to `parallelism` blocking workers.
    ///
    /// Records are split into contiguous chunks and results are reassembled
    /// in chunk order, so output order matches input order.
    pub async fn label_all(
        &self,
        records: &[MessageRecord],
    ) -> Result<Vec<Vec<LabeledToken>>, PipelineError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.config.parallelism.max(1);
        let chunk_size = records.len().div_ceil(workers);
        debug!(records = records.len(), workers, chunk_size, "Labeling records");

        let chunks: Vec<Vec<Option<String>>> = records
            .chunks(chunk_size)
            .map(|chunk| chunk.iter().map(|r| r.message.clone()).collect())
            .collect();

        let labeled: Vec<Vec<Vec<LabeledToken>>> = stream::iter(chunks)
            .map(|chunk| {
                let labeler = Arc::clone(&self.labeler);
                async move {
                    let labeled = tokio::task::spawn_blocking(move || {
                        chunk
                            .iter()
                            .map(|message| labeler.label_record(message.as_deref()))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .await
                    .map_err(|e| PipelineError::Join(e.to_string()))??;
                    Ok::<_, PipelineError>(labeled)
                }
            })
            .buffered(workers)
            .try_collect()
            .await?;

        Ok(labeled.into_iter().flatten().collect())
    }

    /// Category for every record, in input order.
    pub fn classify_all(&self, records: &[MessageRecord]) -> Vec<Category> {
        records
            .iter()
            .map(|record| self.classifier.classify(record.text()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeler::Tag;

    fn preprocessor(parallelism: usize, strip_emojis: bool) -> Preprocessor {
        let config = PreprocessConfig::new("in.csv", "out")
            .unwrap()
            .with_parallelism(parallelism)
            .unwrap()
            .with_strip_emojis(strip_emojis);
        Preprocessor::new(config)
    }

    #[tokio::test]
    async fn label_all_preserves_order() {
        let records: Vec<MessageRecord> = (0..25)
            .map(|i| MessageRecord::from_text(i, format!("{} ገርጂ", i * 100)))
            .collect();

        let labeled = preprocessor(4, true).label_all(&records).await.unwrap();
        assert_eq!(labeled.len(), records.len());
        for (i, tokens) in labeled.iter().enumerate() {
            assert_eq!(tokens[0].token, (i * 100).to_string());
            assert_eq!(tokens[0].tag, Tag::InsidePrice);
            assert_eq!(tokens[1].tag, Tag::InsideLocation);
        }
    }

    #[tokio::test]
    async fn label_all_rejects_missing_message() {
        let mut missing = MessageRecord::from_text(1, "");
        missing.message = None;
        let err = preprocessor(2, true)
            .label_all(&[MessageRecord::from_text(0, "doll"), missing])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Label(_)));
    }

    #[tokio::test]
    async fn process_labels_and_classifies() {
        let records = vec![
            MessageRecord::from_text(1, "ዋጋ 500 ብር ነው"),
            MessageRecord::from_text(2, "Cheap toys for Kids"),
            MessageRecord::from_text(3, "hello there"),
        ];
        let processed = preprocessor(2, true).process(records).await.unwrap();

        let categories: Vec<Category> = processed.iter().map(|p| p.category).collect();
        assert_eq!(
            categories,
            vec![Category::Price, Category::Kids, Category::Uncategorized]
        );
        assert_eq!(processed[0].labeled[2].tag, Tag::InsidePrice);
        assert_eq!(processed[2].labeled.len(), 2);
    }

    #[test]
    fn clean_strips_emojis_when_enabled() {
        let records = vec![MessageRecord::from_text(1, "doll 😀 ገርጂ")];
        let cleaned = preprocessor(1, true).clean(records.clone());
        assert_eq!(cleaned[0].text(), Some("doll  ገርጂ"));

        let kept = preprocessor(1, false).clean(records);
        assert_eq!(kept[0].text(), Some("doll 😀 ገርጂ"));
    }

    #[tokio::test]
    async fn empty_batch() {
        let p = preprocessor(3, true);
        assert!(p.label_all(&[]).await.unwrap().is_empty());
        assert!(p.process(Vec::new()).await.unwrap().is_empty());
    }
}
