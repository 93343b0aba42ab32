use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use quest_core::model::{LessonId, ModuleId};
use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod play;
mod report;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn parse_module(raw: String) -> Result<ModuleId, ArgsError> {
    ModuleId::new(raw.clone()).map_err(|_| ArgsError::InvalidId {
        flag: "--module",
        raw,
    })
}

fn parse_lesson(raw: String) -> Result<LessonId, ArgsError> {
    LessonId::new(raw.clone()).map_err(|_| ArgsError::InvalidId {
        flag: "--lesson",
        raw,
    })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  finquest [modules]                             [--db <sqlite_url>] [--content <path>]");
    eprintln!("  finquest progress [--module <id>]              [--db <sqlite_url>] [--content <path>]");
    eprintln!("  finquest play --module <id> --lesson <id>      [--db <sqlite_url>] [--content <path>]");
    eprintln!("  finquest reset                                 [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:finquest.sqlite3");
    eprintln!("  --content <built-in catalog>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FINQUEST_DB_URL, FINQUEST_CONTENT, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Modules,
    Progress { module: Option<ModuleId> },
    Play { module: ModuleId, lesson: LessonId },
    Reset,
}

#[derive(Debug)]
struct Args {
    db_url: String,
    content: Option<PathBuf>,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("FINQUEST_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("finquest.sqlite3".into()), normalize_sqlite_url);
        let mut content = std::env::var("FINQUEST_CONTENT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let mut args = argv.into_iter().peekable();
        let subcommand = match args.peek().map(String::as_str) {
            Some("modules" | "progress" | "play" | "reset") => args.next(),
            _ => None,
        };

        let mut module = None;
        let mut lesson = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content" => {
                    content = Some(PathBuf::from(require_value(&mut args, "--content")?));
                }
                "--module" => module = Some(parse_module(require_value(&mut args, "--module")?)?),
                "--lesson" => lesson = Some(parse_lesson(require_value(&mut args, "--lesson")?)?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match subcommand.as_deref() {
            None | Some("modules") => Command::Modules,
            Some("progress") => Command::Progress { module },
            Some("reset") => Command::Reset,
            Some(_) => Command::Play {
                module: module.ok_or(ArgsError::MissingFlag { flag: "--module" })?,
                lesson: lesson.ok_or(ArgsError::MissingFlag { flag: "--lesson" })?,
            },
        };

        Ok(Self {
            db_url,
            content,
            command,
        })
    }
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

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(argv).inspect_err(|e| {
        eprintln!("{e}");
        print_usage();
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let app = AppServices::new_sqlite(&args.db_url, Clock::system(), args.content.as_deref()).await?;
    info!(db = %args.db_url, command = ?args.command, "finquest ready");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.command {
        Command::Modules => report::print_modules(&app, &mut out).await?,
        Command::Progress { module: Some(module) } => {
            report::print_module_overview(&app, &module, &mut out).await?;
        }
        Command::Progress { module: None } => report::print_progress(&app, &mut out).await?,
        Command::Play { module, lesson } => {
            let mut player = app.open_lesson(module, lesson);
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let route = play::run_lesson(&mut player, &mut input, &mut out).await?;
            report::print_route(&app, &route, &mut out).await?;
        }
        Command::Reset => {
            app.progress().reset().await;
            writeln!(out, "Progress cleared.")?;
        }
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn no_subcommand_lists_modules() {
        let args = Args::parse(argv(&["--db", "sqlite::memory:"])).unwrap();
        assert_eq!(args.command, Command::Modules);
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn play_requires_module_and_lesson() {
        let err = Args::parse(argv(&["play", "--module", "scam-awareness"])).unwrap_err();
        assert!(matches!(err, ArgsError::MissingFlag { flag: "--lesson" }));

        let args = Args::parse(argv(&[
            "play",
            "--module",
            "scam-awareness",
            "--lesson",
            "1",
            "--content",
            "catalog.json",
        ]))
        .unwrap();
        assert_eq!(
            args.command,
            Command::Play {
                module: ModuleId::new("scam-awareness").unwrap(),
                lesson: LessonId::new("1").unwrap(),
            }
        );
        assert_eq!(args.content, Some(PathBuf::from("catalog.json")));
    }

    #[test]
    fn blank_ids_and_unknown_flags_are_rejected() {
        assert!(matches!(
            Args::parse(argv(&["progress", "--module", " "])).unwrap_err(),
            ArgsError::InvalidId { flag: "--module", .. }
        ));
        assert!(matches!(
            Args::parse(argv(&["--verbose"])).unwrap_err(),
            ArgsError::UnknownArg(_)
        ));
        assert!(matches!(
            Args::parse(argv(&["--db"])).unwrap_err(),
            ArgsError::MissingValue { flag: "--db" }
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/progress.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/progress.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/x.db".into()),
            "sqlite:///tmp/x.db"
        );
    }

    #[test]
    fn memory_database_needs_no_file() {
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
        assert!(prepare_sqlite_file("postgres://nope").is_err());
    }
}
