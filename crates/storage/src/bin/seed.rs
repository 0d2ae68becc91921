use std::fmt;

use chrono::Utc;
use storage::sqlite::SqliteMasteryStore;
use tutor_core::model::{LearnerId, Mastery, TopicId};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    learner: String,
    topic: String,
    mastery: f64,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMastery { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMastery { raw } => {
                write!(f, "invalid --mastery value (expected 0.0..=1.0): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p storage --bin seed -- [--db <sqlite_url>] [--learner <id>] [--topic <id>] [--mastery <0..1>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dev.sqlite3");
    eprintln!("  --learner learner-1");
    eprintln!("  --topic topic-1");
    eprintln!("  --mastery 0.0");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TUTOR_DB_URL")
            .ok()
            .unwrap_or_else(|| "sqlite://dev.sqlite3".into());
        let mut learner = "learner-1".to_string();
        let mut topic = "topic-1".to_string();
        let mut mastery = 0.0_f64;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = require_value(args, "--db")?,
                "--learner" => learner = require_value(args, "--learner")?,
                "--topic" => topic = require_value(args, "--topic")?,
                "--mastery" => {
                    let raw = require_value(args, "--mastery")?;
                    mastery = raw
                        .parse::<f64>()
                        .ok()
                        .filter(|v| (0.0..=1.0).contains(v))
                        .ok_or(ArgsError::InvalidMastery { raw })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            learner,
            topic,
            mastery,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let learner = LearnerId::new(args.learner)?;
    let topic = TopicId::new(args.topic)?;

    let store = SqliteMasteryStore::open(&args.db_url).await?;
    store
        .upsert_mastery(&learner, &topic, Mastery::clamped(args.mastery), Utc::now())
        .await?;

    println!(
        "seeded mastery {:.2} for learner={learner} topic={topic} ({})",
        args.mastery, args.db_url
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
