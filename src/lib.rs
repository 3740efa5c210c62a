//! Ethio NER Prep — rule-based NER labeling and keyword classification for
//! Amharic Telegram e-commerce messages.

pub mod channels;
pub mod classifier;
pub mod config;
pub mod error;
pub mod labeler;
pub mod ner;
pub mod pipeline;
pub mod store;
pub mod text;
