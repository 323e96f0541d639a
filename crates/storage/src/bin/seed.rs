use std::fmt;

use progression_core::catalog::{SEEDED_TRACKS, default_lessons};
use progression_core::model::Track;
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    tracks: Vec<Track>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTrack { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTrack { raw } => write!(f, "invalid --track value: {raw}"),
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

fn parse_track(raw: &str) -> Result<Track, ArgsError> {
    Track::new(raw).map_err(|_| ArgsError::InvalidTrack {
        raw: raw.to_string(),
    })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LEARN_DB_URL").unwrap_or_else(|_| "sqlite://dev.sqlite3?mode=rwc".into());
        let mut tracks = match std::env::var("LEARN_TRACKS") {
            Ok(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(parse_track)
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => Vec::new(),
        };
        let mut explicit_tracks = Vec::new();

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
                "--track" => {
                    let value = require_value(&mut args, "--track")?;
                    explicit_tracks.push(parse_track(&value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if !explicit_tracks.is_empty() {
            tracks = explicit_tracks;
        }
        if tracks.is_empty() {
            tracks = SEEDED_TRACKS
                .iter()
                .map(|t| parse_track(t))
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(Self { db_url, tracks })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://dev.sqlite3?mode=rwc)");
    eprintln!("  --track <name>            Track to seed, repeatable (default: all built-in tracks)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LEARN_DB_URL, LEARN_TRACKS (comma separated), RUST_LOG");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    for track in &args.tracks {
        let drafts = default_lessons(track)?;
        if drafts.is_empty() {
            tracing::warn!(track = %track, "no built-in lessons for track, skipping");
            continue;
        }
        let outcome = storage.lessons.seed_lessons(track, &drafts).await?;
        println!(
            "{}: {} lessons ({} inserted)",
            track.display_name(),
            outcome.lessons.len(),
            outcome.inserted
        );
    }

    println!("Seeded {} tracks into {}", args.tracks.len(), args.db_url);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
