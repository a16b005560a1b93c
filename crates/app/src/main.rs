use std::fmt;
use std::path::PathBuf;

use chrono::Duration;
use radio_core::model::{Callsign, CallsignError, RankId};
use radio_core::ptt::DEFAULT_HOLD_MS;
use services::{AdminGate, AppServices, Clock, RankSelection, SessionPhase};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod train;

use train::{Outcome, Terminal};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidHoldMs { raw: String },
    MissingUser,
    MissingImportFile,
    NotAdmin,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidHoldMs { raw } => write!(f, "invalid --hold-ms value: {raw}"),
            ArgsError::MissingUser => write!(f, "--user (or RADIO_USER) is required"),
            ArgsError::MissingImportFile => write!(f, "import requires a file path"),
            ArgsError::NotAdmin => write!(f, "admin commands require --user <admin passphrase>"),
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

fn parse_hold_ms(raw: String) -> Result<i64, ArgsError> {
    match raw.trim().parse::<i64>() {
        Ok(ms) if ms >= 0 => Ok(ms),
        _ => Err(ArgsError::InvalidHoldMs { raw }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Train,
    Progress,
    Users,
    Stats,
    Export,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "train" => Some(Self::Train),
            "progress" => Some(Self::Progress),
            "users" => Some(Self::Users),
            "stats" => Some(Self::Stats),
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user: Option<String>,
    callsign: Option<String>,
    review: Option<RankId>,
    hold_ms: i64,
    out: Option<PathBuf>,
    file: Option<PathBuf>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("RADIO_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://radio.sqlite3".into(), normalize_sqlite_url);
        let mut user = std::env::var("RADIO_USER").ok();
        let mut callsign = std::env::var("RADIO_CALLSIGN").ok();
        let mut hold_ms = match std::env::var("RADIO_HOLD_MS") {
            Ok(raw) => parse_hold_ms(raw)?,
            Err(_) => DEFAULT_HOLD_MS,
        };
        let mut review = None;
        let mut out = None;
        let mut file = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user = Some(require_value(args, "--user")?),
                "--callsign" => callsign = Some(require_value(args, "--callsign")?),
                "--review" => review = Some(RankId::new(require_value(args, "--review")?)),
                "--hold-ms" => hold_ms = parse_hold_ms(require_value(args, "--hold-ms")?)?,
                "--out" => out = Some(PathBuf::from(require_value(args, "--out")?)),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if !arg.starts_with("--") && file.is_none() => file = Some(PathBuf::from(arg)),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user: user.filter(|u| !u.trim().is_empty()),
            callsign,
            review,
            hold_ms,
            out,
            file,
        })
    }

    fn user(&self) -> Result<&str, ArgsError> {
        self.user.as_deref().ok_or(ArgsError::MissingUser)
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  radio train    --user <name> [--callsign <sign>] [--review <rank>] [--hold-ms <ms>]");
    eprintln!("  radio progress --user <name>");
    eprintln!("  radio users");
    eprintln!("  radio stats    --user <admin passphrase>");
    eprintln!("  radio export   --user <admin passphrase> [--out <file>]");
    eprintln!("  radio import   --user <admin passphrase> <file>");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>   (default: sqlite://radio.sqlite3)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RADIO_DB_URL, RADIO_USER, RADIO_CALLSIGN, RADIO_HOLD_MS, RADIO_ADMIN_PASSPHRASE");
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

/// Create the directory holding a file database; sqlx creates the file.
fn ensure_db_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

    if let Some(parent) = std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// The chosen callsign, or the first suggestion when none was given.
fn resolve_callsign(raw: Option<&str>) -> Result<Callsign, CallsignError> {
    match raw {
        Some(raw) => Callsign::new(raw),
        None => Callsign::suggestions()
            .into_iter()
            .next()
            .ok_or(CallsignError::Empty),
    }
}

fn require_admin(app: &AppServices, args: &Args) -> Result<(), ArgsError> {
    if app.gate().is_admin(args.user()?) {
        Ok(())
    } else {
        Err(ArgsError::NotAdmin)
    }
}

async fn train(app: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let user = args.user()?;
    if app.gate().is_admin(user) {
        return stats(app).await;
    }
    if args.callsign.is_none() {
        let names: Vec<String> = Callsign::suggestions().iter().map(ToString::to_string).collect();
        println!("No --callsign given. Suggestions: {}", names.join(", "));
    }
    let callsign = resolve_callsign(args.callsign.as_deref())?;
    let selection = args
        .review
        .clone()
        .map_or(RankSelection::Progression, RankSelection::Review);

    app.users().register(user).await?;
    let training = app.training();
    let mut session = training.start_session(user, callsign, selection).await?;
    println!(
        "Rank {} ({}), callsign {}.",
        session.rank().title,
        session.rank().id,
        session.callsign()
    );

    if session.phase() == SessionPhase::Manual {
        match storage::defaults::radio_facts() {
            Ok(facts) => {
                if let Some(fact) = train::pick_fact(&facts, &mut rand::rng()) {
                    println!("Did you know? {fact}");
                }
            }
            Err(err) => tracing::warn!(error = %err, "radio facts unavailable"),
        }
    }

    let mut terminal = Terminal::new();
    let hold = Duration::milliseconds(args.hold_ms);
    match train::drive(&mut session, &mut terminal, training.clock(), hold).await? {
        Outcome::Completed(result) => {
            let record = training.record_result(user, &mut session).await?;
            let verdict = if record.passed { "PASSED" } else { "FAILED" };
            println!();
            println!(
                "Exam {verdict}: {}/{} ({}%).",
                result.score,
                result.total,
                result.percent()
            );
            progress(app, user).await?;
        }
        Outcome::Exited => println!("Session abandoned; nothing recorded."),
    }
    Ok(())
}

async fn progress(app: &AppServices, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let progress = app.training().progress_for(user).await?;
    println!(
        "{user}: {} ({}), {} passed exams.",
        progress.current_rank.title,
        progress.current_rank_id(),
        progress.passed_count
    );
    match (&progress.next_rank, progress.remaining_to_next()) {
        (Some(next), Some(remaining)) => println!(
            "Next rank {} in {remaining} more passed exams ({:.0}% there).",
            next.title, progress.progress_percent
        ),
        _ => println!("Highest rank reached."),
    }
    Ok(())
}

async fn users(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    for name in app.users().visible_users().await? {
        let avatar = app.users().avatar(&name).await?;
        println!("{name}\t{avatar}");
    }
    Ok(())
}

async fn stats(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    println!("USER\tGAMES\tPASSED\tAVG\tLAST PLAYED\tCALLSIGN");
    for row in app.admin().user_stats().await? {
        let last = row
            .last_played
            .map_or_else(|| "NEVER".to_owned(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{}\t{}\t{}\t{:.1}\t{last}\t{}",
            row.name,
            row.total_games,
            row.passed_games,
            row.avg_score,
            row.favorite_callsign.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    ensure_db_dir(&args.db_url)?;
    let app = AppServices::new_sqlite(&args.db_url, Clock::system(), AdminGate::from_env()).await?;

    match cmd {
        Command::Train => train(&app, &args).await,
        Command::Progress => progress(&app, args.user()?).await,
        Command::Users => users(&app).await,
        Command::Stats => {
            require_admin(&app, &args)?;
            stats(&app).await
        }
        Command::Export => {
            require_admin(&app, &args)?;
            let json = app.admin().export_json().await?;
            match &args.out {
                Some(path) => {
                    tokio::fs::write(path, json).await?;
                    println!("Backup written to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Import => {
            require_admin(&app, &args)?;
            let path = args.file.as_ref().ok_or(ArgsError::MissingImportFile)?;
            let raw = tokio::fs::read_to_string(path).await?;
            let summary = app.admin().import_json(&raw).await?;
            println!("Backup restored: {summary:?}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
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
