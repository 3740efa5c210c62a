use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use ethio_ner_prep::channels::TelegramScraper;
use ethio_ner_prep::classifier::{CategoryClassifier, Taxonomy};
use ethio_ner_prep::config::{NerConfig, PreprocessConfig, ScraperConfig};
use ethio_ner_prep::labeler::{EntityLabeler, format_block};
use ethio_ner_prep::ner::{self, HuggingFaceNer};
use ethio_ner_prep::pipeline::{Preprocessor, scrape_all};
use ethio_ner_prep::store;

#[derive(Parser)]
#[command(name = "ner-prep")]
#[command(about = "Amharic Telegram e-commerce NER data preparation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the configured Telegram channels into a CSV
    Scrape {
        /// Maximum messages per channel (overrides SCRAPER_MESSAGE_LIMIT)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Clean, label and classify a scraped CSV
    Preprocess {
        /// Scraped message CSV
        #[arg(short, long)]
        input: PathBuf,
        /// Directory for the derived files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Labeling workers (default: available cores)
        #[arg(short, long)]
        parallelism: Option<usize>,
        /// Keep emojis in messages
        #[arg(long)]
        keep_emojis: bool,
    },

    /// Label one message and print its corpus block
    Label {
        text: String,
    },

    /// Print the category of one message
    Classify {
        text: String,
    },

    /// Run the pretrained NER model over a CSV and write a JSON report
    Ner {
        /// Message CSV
        #[arg(short, long)]
        input: PathBuf,
        /// Report path
        #[arg(short, long, default_value = "ner_report.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scrape { limit } => {
            let mut config = ScraperConfig::from_env()?;
            if let Some(limit) = limit {
                config = config.with_message_limit(limit)?;
            }
            let scraper = TelegramScraper::new(&config)?;
            let rows = scrape_all(&scraper, &config).await?;
            eprintln!("Scraped {rows} messages into {}", config.output_csv.display());
        }

        Command::Preprocess {
            input,
            output_dir,
            parallelism,
            keep_emojis,
        } => {
            let mut config =
                PreprocessConfig::new(input, output_dir)?.with_strip_emojis(!keep_emojis);
            if let Some(parallelism) = parallelism {
                config = config.with_parallelism(parallelism)?;
            }
            let summary = Preprocessor::new(config).run().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Label { text } => {
            let labeler =
                EntityLabeler::with_products(Taxonomy::default_taxonomy().product_keywords());
            println!("{}", format_block(&labeler.label(&text)));
        }

        Command::Classify { text } => {
            println!("{}", CategoryClassifier::default().classify_text(&text));
        }

        Command::Ner { input, output } => {
            let config = NerConfig::from_env()?;
            let records = store::drop_missing(store::read_records(&input)?);
            let batch_size = config.batch_size;
            let oracle = HuggingFaceNer::new(config);

            let report = ner::annotate(&oracle, &records, batch_size).await?;
            store::write_json(&output, &report)
                .with_context(|| format!("writing {}", output.display()))?;
            eprintln!(
                "{} entities in {} messages written to {}",
                report.entities,
                report.messages,
                output.display()
            );
        }
    }

    Ok(())
}
