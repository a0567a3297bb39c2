use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use review_scheduler::config::Config;
use review_scheduler::export::json::{export_json_to_path, import_json};
use review_scheduler::{ReviewStateStore, Reviewer, SqliteReviewStore, logging};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "review-scheduler")]
#[command(about = "SM-2 review scheduling for learner flashcards")]
struct Cli {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database, overrides the config file
    #[arg(long, env = "REVIEW_SCHEDULER_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a rating (again, hard, good, easy) for a card
    Review {
        learner: String,
        card: String,
        rating: String,
        /// Review time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Print the stored state of a card
    Show { learner: String, card: String },
    /// Print what every rating would schedule, without saving
    Preview {
        learner: String,
        card: String,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List a learner's cards that are due
    Due {
        learner: String,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Remove a card's review history
    Forget { learner: String, card: String },
    /// Write stored states to a JSON file
    Export {
        path: PathBuf,
        /// Only export this learner's cards
        #[arg(long)]
        learner: Option<String>,
    },
    /// Load states from a JSON file, overwriting existing pairs
    Import { path: PathBuf },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    logging::init(&config.log_filter);

    let store = SqliteReviewStore::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open review database {}",
            config.database_path.display()
        )
    })?;
    let reviewer = Reviewer::new(store);
    let now = Utc::now();

    match cli.command {
        Command::Review {
            learner,
            card,
            rating,
            at,
        } => {
            let state = reviewer.review(&learner, &card, &rating, at.unwrap_or(now))?;
            print_json(&state)
        }
        Command::Show { learner, card } => match reviewer.state(&learner, &card)? {
            Some(state) => print_json(&state),
            None => anyhow::bail!("No review state for {learner}/{card}"),
        },
        Command::Preview { learner, card, at } => {
            let options: Vec<_> = reviewer
                .preview(&learner, &card, at.unwrap_or(now))?
                .into_iter()
                .map(|(quality, state)| serde_json::json!({ "quality": quality, "state": state }))
                .collect();
            print_json(&options)
        }
        Command::Due { learner, at } => print_json(&reviewer.due(&learner, at.unwrap_or(now))?),
        Command::Forget { learner, card } => {
            if !reviewer.forget(&learner, &card)? {
                warn!(learner = %learner, card = %card, "nothing to forget");
            }
            Ok(())
        }
        Command::Export { path, learner } => {
            let mut records = reviewer.store().all()?;
            if let Some(learner) = learner {
                records.retain(|record| record.learner_id == learner);
            }
            export_json_to_path(&records, &path)?;
            Ok(())
        }
        Command::Import { path } => {
            let records = import_json(&path)?;
            for record in &records {
                for anomaly in record.state.anomalies() {
                    warn!(pair = %record.key(), %anomaly, "repairing imported review state");
                }
                reviewer
                    .store()
                    .put(&record.key(), &record.state.repaired())?;
            }
            info!(count = records.len(), "import finished");
            Ok(())
        }
    }
}
