//! End-to-end preprocessing over a scraped CSV.
//!
//! Writes a small message table to a temp directory, runs the preprocessor
//! and checks every derived file.

use std::path::Path;

use ethio_ner_prep::classifier::Category;
use ethio_ner_prep::config::PreprocessConfig;
use ethio_ner_prep::pipeline::Preprocessor;
use ethio_ner_prep::store;

const SCRAPED: &str = "\
Channel Title,Channel Username,ID,Message,Date,Media Path
Sina,@sinayelj,1,ዋጋ 500 ብር 😀,2024-06-01 10:00:00+00:00,photos/@sinayelj_1.jpg
Sina,@sinayelj,2,,2024-06-01 10:05:00+00:00,photos/@sinayelj_2.jpg
Sina,@sinayelj,3,Cheap toys for Kids,2024-06-01 10:10:00+00:00,
Sina,@sinayelj,4,ገርጂ አካባቢ እንገኛለን,2024-06-01 10:15:00+00:00,
Sina,@sinayelj,5,hello @sinayelj,2024-06-01 10:20:00+00:00,
";

fn categories(path: &Path) -> Vec<(String, String)> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|row| {
            let row = row.unwrap();
            (row[2].to_string(), row[6].to_string())
        })
        .collect()
}

#[tokio::test]
async fn preprocess_writes_every_derived_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("telegram_data.csv");
    std::fs::write(&input, SCRAPED).unwrap();

    let config = PreprocessConfig::new(&input, dir.path().join("out"))
        .unwrap()
        .with_parallelism(2)
        .unwrap();
    let preprocessor = Preprocessor::new(config.clone());
    let summary = preprocessor.run().await.unwrap();

    assert_eq!(summary.input_rows, 5);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.uncategorized, 1);
    assert_eq!(
        summary.counts.iter().map(|c| c.category).collect::<Vec<_>>(),
        vec![
            Category::Price,
            Category::Location,
            Category::Kids,
            Category::Uncategorized
        ]
    );

    // Missing row dropped, emojis stripped, everything else untouched.
    let clean = store::read_records(&config.clean_csv()).unwrap();
    assert_eq!(
        clean.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 3, 4, 5]
    );
    assert!(!clean[0].text().unwrap().contains('😀'));
    assert_eq!(clean[0].media_path.as_deref(), Some("photos/@sinayelj_1.jpg"));
    assert!(clean[0].date.is_some());

    let corpus = std::fs::read_to_string(config.corpus_path()).unwrap();
    assert!(corpus.starts_with("ዋጋ O\n500 I-PRICE\nብር I-PRICE\n\n"));
    assert!(corpus.contains("ገርጂ I-LOC\nአካባቢ O\nእንገኛለን O\n\n"));
    assert!(corpus.ends_with("hello O\n\n"));
    assert!(!corpus.contains("@sinayelj"));

    assert_eq!(
        categories(&config.classified_csv()),
        vec![
            ("1".to_string(), "price".to_string()),
            ("3".to_string(), "kids".to_string()),
            ("4".to_string(), "location".to_string()),
            ("5".to_string(), "uncategorized".to_string()),
        ]
    );
    assert_eq!(
        categories(&config.uncategorized_csv()),
        vec![("5".to_string(), "uncategorized".to_string())]
    );
}

#[tokio::test]
async fn preprocess_rejects_table_without_message_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.csv");
    std::fs::write(&input, "ID,Text\n1,hello\n").unwrap();

    let config = PreprocessConfig::new(&input, dir.path()).unwrap();
    let err = Preprocessor::new(config).run().await.unwrap_err();
    assert!(err.to_string().contains("Missing column"));
}
