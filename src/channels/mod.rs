//! Message sources.

pub mod telegram;

pub use telegram::TelegramScraper;
