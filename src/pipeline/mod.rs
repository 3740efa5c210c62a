//! Batch pipeline.
//!
//! Scraped rows flow through:
//! 1. `MessageSource::fetch()` — channel-specific I/O (`scrape`)
//! 2. `Preprocessor::clean()` — missing rows dropped, emojis stripped
//! 3. `EntityLabeler::label()` — rule-based NER tags, on blocking workers
//! 4. `CategoryClassifier::classify()` — keyword category and report

pub mod processor;
pub mod scrape;
pub mod types;

pub use processor::{PreprocessSummary, Preprocessor};
pub use scrape::scrape_all;
pub use types::{MessageRecord, MessageSource, ProcessedRecord};
