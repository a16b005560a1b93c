use std::fmt;

use chrono::{DateTime, Duration, Utc};
use radio_core::model::{Callsign, GameHistoryRecord, SUGGESTED_CALLSIGNS};
use storage::Storage;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    users: Vec<String>,
    passes: u32,
    fails: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCount { flag: &'static str, raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCount { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

fn parse_count(flag: &'static str, value: String) -> Result<u32, ArgsError> {
    value
        .parse::<u32>()
        .map_err(|_| ArgsError::InvalidCount { flag, raw: value })
}

fn split_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("RADIO_DB_URL")
            .unwrap_or_else(|_| "sqlite://radio.sqlite3".into());
        let mut users = std::env::var("RADIO_SEED_USERS")
            .map(|raw| split_users(&raw))
            .unwrap_or_else(|_| vec!["Aino".into(), "Eero".into()]);
        let mut passes = std::env::var("RADIO_SEED_PASSES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(1);
        let mut fails = std::env::var("RADIO_SEED_FAILS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(1);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--users" => {
                    let value = require_value(&mut args, "--users")?;
                    users = split_users(&value);
                }
                "--passes" => {
                    passes = parse_count("--passes", require_value(&mut args, "--passes")?)?;
                }
                "--fails" => {
                    fails = parse_count("--fails", require_value(&mut args, "--fails")?)?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
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
            users,
            passes,
            fails,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://radio.sqlite3)");
    eprintln!("  --users <a,b,...>         Trainees to register (default: Aino,Eero)");
    eprintln!("  --passes <n>              Passed sessions per trainee (default: 1)");
    eprintln!("  --fails <n>               Failed sessions per trainee (default: 1)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  RADIO_DB_URL, RADIO_SEED_USERS, RADIO_SEED_PASSES, RADIO_SEED_FAILS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    // First read writes the bundled bank.
    let bank = storage.content.get_question_bank().await?;
    let total = u32::try_from(bank.len().min(5)).unwrap_or(5).max(1);

    for (i, user) in args.users.iter().enumerate() {
        storage.users.add_user(user).await?;
        let callsign = Callsign::new(SUGGESTED_CALLSIGNS[i % SUGGESTED_CALLSIGNS.len()])?;

        let sessions = (0..args.fails)
            .map(|_| total.saturating_sub(3))
            .chain((0..args.passes).map(|_| total));
        for (n, score) in sessions.enumerate() {
            let offset = i64::try_from(n).unwrap_or(0);
            let completed_at = now - Duration::days(7) + Duration::hours(offset);
            let record = GameHistoryRecord::completed(user, &callsign, score, total, completed_at)?;
            storage.history.append_game_result(&record).await?;
        }
        tracing::info!(user = %user, passes = args.passes, fails = args.fails, "seeded trainee");
    }

    println!(
        "Seeded {} trainees with {} passed and {} failed sessions each into {}",
        args.users.len(),
        args.passes,
        args.fails,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
