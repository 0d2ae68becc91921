use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use services::{
    Advance, Clock, CompletionSink, RemoteAssessmentConfig, RemoteAssessmentService, SessionError,
    SessionRunner,
};
use storage::repository::MasteryStore;
use storage::sqlite::SqliteMasteryStore;
use tutor_core::model::Mastery;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    MissingApiUrl,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingApiUrl => {
                write!(f, "no assessment endpoint configured (--api or TUTOR_API_URL)")
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

struct Args {
    db_url: String,
    api_url: Option<String>,
    learner: String,
    topic_id: String,
    topic_title: String,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--db <sqlite_url>] [--api <url>] [--learner <id>] [--topic <id>] [--title <text>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dev.sqlite3");
    eprintln!("  --learner learner-1");
    eprintln!("  --topic topic-1");
    eprintln!("  --title <topic id>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TUTOR_DB_URL, TUTOR_API_URL, TUTOR_API_KEY, TUTOR_API_TIMEOUT_SECS,");
    eprintln!("  TUTOR_LEARNER_ID, TUTOR_TOPIC_ID, TUTOR_TOPIC_TITLE");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let mut db_url = env("TUTOR_DB_URL").unwrap_or_else(|| "sqlite://dev.sqlite3".into());
        let mut api_url = env("TUTOR_API_URL");
        let mut learner = env("TUTOR_LEARNER_ID").unwrap_or_else(|| "learner-1".into());
        let mut topic_id = env("TUTOR_TOPIC_ID").unwrap_or_else(|| "topic-1".into());
        let mut topic_title = env("TUTOR_TOPIC_TITLE");

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--api" => api_url = Some(require_value(args, "--api")?),
                "--learner" => learner = require_value(args, "--learner")?,
                "--topic" => topic_id = require_value(args, "--topic")?,
                "--title" => topic_title = Some(require_value(args, "--title")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let topic_title = topic_title.unwrap_or_else(|| topic_id.clone());
        Ok(Self {
            db_url: normalize_sqlite_url(db_url),
            api_url,
            learner,
            topic_id,
            topic_title,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Prints the final mastery when the session completes.
struct ConsoleSink;

#[async_trait]
impl CompletionSink for ConsoleSink {
    async fn on_complete(&self, final_mastery: Mastery) {
        println!();
        println!("Session complete. Final mastery: {final_mastery}");
    }
}

fn show_round(session: &services::AssessmentSession) {
    let progress = session.progress();
    if let Some(level) = session.level() {
        println!();
        println!(
            "Round {} of {} (difficulty: {level})",
            progress.answered + 1,
            progress.limit
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let store = SqliteMasteryStore::open(&args.db_url).await?;

    let remote_config = match args.api_url.as_deref() {
        Some(raw) => RemoteAssessmentConfig::new(raw.trim().parse()?),
        None => RemoteAssessmentConfig::from_env().ok_or(ArgsError::MissingApiUrl)?,
    };
    let remote = Arc::new(RemoteAssessmentService::new(remote_config)?);

    let store: Arc<dyn MasteryStore> = Arc::new(store);
    let runner = SessionRunner::new(
        Clock::default_clock(),
        store,
        remote.clone(),
        remote,
        Arc::new(ConsoleSink),
    );

    println!("Topic: {}", args.topic_title);
    let mut session = runner
        .start_session(&args.learner, &args.topic_id, &args.topic_title)
        .await?;

    loop {
        let Some(question) = session.current_question() else {
            break;
        };
        show_round(&session);

        let options: Vec<String> = question.options().to_vec();
        let choice = inquire::Select::new(question.prompt(), options).prompt()?;

        match runner.submit_answer(&mut session, &choice).await {
            Ok(outcome) => {
                println!("Score: {}", outcome.evaluation.score());
                println!("{}", outcome.evaluation.feedback());
                if let Some(correction) = outcome.evaluation.correction() {
                    println!("Correction: {correction}");
                }
            }
            Err(err @ SessionError::Evaluator(_)) => {
                // Same question stays on display; answering again retries.
                eprintln!("evaluation failed: {err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        }

        loop {
            match runner.advance(&mut session).await {
                Ok(Advance::NextQuestion) => break,
                Ok(Advance::Completed(summary)) => {
                    println!(
                        "Answered {} questions on \"{}\".",
                        summary.rounds_answered(),
                        summary.topic_title()
                    );
                    return Ok(());
                }
                Ok(Advance::Unchanged) => break,
                Err(err @ SessionError::Provider(_)) => {
                    eprintln!("could not fetch the next question: {err}");
                    let retry = inquire::Confirm::new("Retry?")
                        .with_default(true)
                        .prompt()?;
                    if !retry {
                        return Err(err.into());
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
