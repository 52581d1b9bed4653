use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{AttemptId, QuestionBank, QuizSettings, DEFAULT_TIME_LIMIT_SECS};
use services::{AttemptHistoryService, Clock, QuizRunner, QuizSessionService};
use storage::repository::Storage;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTimeLimit { raw: String },
    InvalidDbUrl { raw: String },
    InvalidAttemptId { raw: String },
    MissingAttemptId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTimeLimit { raw } => {
                write!(f, "invalid --time-limit value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAttemptId { raw } => write!(f, "invalid attempt id: {raw}"),
            ArgsError::MissingAttemptId => write!(f, "show requires an attempt id"),
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
    eprintln!("  quiz [run]     [--db <sqlite_url>] [--bank <file.toml>] [--time-limit <secs>]");
    eprintln!("  quiz history   [--db <sqlite_url>] [--json]");
    eprintln!("  quiz show <id> [--db <sqlite_url>] [--bank <file.toml>] [--json]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --bank built-in ten-question quiz");
    eprintln!("  --time-limit {DEFAULT_TIME_LIMIT_SECS}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK, QUIZ_TIME_LIMIT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    History,
    Show,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "history" => Some(Self::History),
            "show" => Some(Self::Show),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    bank: Option<PathBuf>,
    time_limit: u32,
    json: bool,
    attempt_id: Option<AttemptId>,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut bank = std::env::var("QUIZ_BANK")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let mut time_limit = match std::env::var("QUIZ_TIME_LIMIT") {
            Ok(value) => parse_time_limit(value)?,
            Err(_) => DEFAULT_TIME_LIMIT_SECS,
        };
        let mut json = false;
        let mut attempt_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bank" => bank = Some(PathBuf::from(require_value(args, "--bank")?)),
                "--time-limit" => {
                    time_limit = parse_time_limit(require_value(args, "--time-limit")?)?;
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if cmd == Command::Show && !arg.starts_with("--") && attempt_id.is_none() => {
                    let parsed = arg
                        .parse::<AttemptId>()
                        .map_err(|_| ArgsError::InvalidAttemptId { raw: arg.clone() })?;
                    attempt_id = Some(parsed);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            bank,
            time_limit,
            json,
            attempt_id,
        })
    }
}

fn parse_time_limit(raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ArgsError::InvalidTimeLimit { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
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

fn init_tracing() {
    // stderr keeps log lines out of the quiz prompt on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_question_bank(path: Option<&PathBuf>) -> Result<QuestionBank, services::BankLoadError> {
    match path {
        Some(path) => services::load_bank(path),
        None => services::builtin_bank(),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(cmd, &mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup; the services only see the repository trait.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let bank = Arc::new(load_question_bank(parsed.bank.as_ref())?);

    match cmd {
        Command::Run => {
            let settings = QuizSettings::new(parsed.time_limit)?;
            let service = QuizSessionService::new(
                Clock::system(),
                Arc::clone(&bank),
                settings,
                Arc::clone(&storage.attempts),
            );

            let (tx, rx) = mpsc::channel(16);
            let reader = terminal::spawn_stdin_reader(tx);
            let service = QuizRunner::new(service)
                .run(rx, terminal::render_event)
                .await?;
            reader.abort();

            if !service.is_complete() {
                println!("quiz abandoned, nothing saved");
            }
            Ok(())
        }
        Command::History => {
            let history = AttemptHistoryService::new(Arc::clone(&storage.attempts), bank);
            let items = history.list_attempts().await?;
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                println!("{}", terminal::history_table(&items));
            }
            Ok(())
        }
        Command::Show => {
            let id = parsed.attempt_id.ok_or(ArgsError::MissingAttemptId)?;
            let history = AttemptHistoryService::new(Arc::clone(&storage.attempts), bank);
            let review = history.review(id).await?;
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&review)?);
            } else {
                println!("{}", terminal::review_table(&review));
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_for(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(cmd, &mut args.iter().map(|s| (*s).to_owned()))
    }

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        parse_for(Command::Show, args)
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("quiz.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&["--db", "sqlite::memory:", "--time-limit", "45", "--json"]).unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.time_limit, 45);
        assert!(args.json);
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            parse(&["--time-limit", "soon"]),
            Err(ArgsError::InvalidTimeLimit { .. })
        ));
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            parse(&["not-a-uuid"]),
            Err(ArgsError::InvalidAttemptId { .. })
        ));
        assert!(matches!(
            parse(&["--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn attempt_id_is_only_taken_by_show() {
        let id = AttemptId::generate().to_string();

        let args = parse_for(Command::Show, &[id.as_str(), "--json"]).unwrap();
        assert_eq!(args.attempt_id.map(|a| a.to_string()), Some(id.clone()));

        for cmd in [Command::Run, Command::History] {
            assert!(matches!(
                parse_for(cmd, &[id.as_str()]),
                Err(ArgsError::UnknownArg(arg)) if arg == id
            ));
        }
    }
}
