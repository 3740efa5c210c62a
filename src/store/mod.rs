//! Persistence layer — CSV message tables, labeled corpus files and JSON
//! reports.

pub mod corpus;
pub mod messages;
pub mod report;

pub use corpus::write_corpus;
pub use messages::{
    CLASSIFIED_HEADER, MESSAGE_HEADER, drop_missing, read_records, read_records_from,
    write_classified, write_records, write_records_to,
};
pub use report::write_json;
