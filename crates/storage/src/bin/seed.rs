use std::fmt;
use std::path::PathBuf;

use sie_core::fallback;
use sie_core::guided::GuidedState;
use sie_core::model::{Curriculum, Profile, UserId};
use storage::StorageError;
use storage::repository::{CatalogWriter, LearningProgressRepository, ProfileRepository};
use storage::sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    content: Option<PathBuf>,
    user: Option<UserId>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUser { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("SIE_DB_URL").unwrap_or_else(|_| "sqlite:sie.sqlite3?mode=rwc".into());
        let mut content = std::env::var("SIE_CONTENT_PATH").ok().map(PathBuf::from);
        let mut user = None;

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
                "--content" => {
                    content = Some(PathBuf::from(require_value(&mut args, "--content")?));
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidUser { raw: value });
                    }
                    user = Some(UserId::new(value.trim()));
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
            content,
            user,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --features seed --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: sqlite:sie.sqlite3?mode=rwc)");
    eprintln!("  --content <path>      JSON curriculum file (default: built-in curriculum)");
    eprintln!("  --user <id>           Also create a default profile and position for this user");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  SIE_DB_URL, SIE_CONTENT_PATH");
}

fn load_curriculum(path: Option<&PathBuf>) -> Result<Curriculum, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        tracing::info!("no content file given, seeding built-in curriculum");
        return Ok(fallback::curriculum());
    };
    let raw = std::fs::read_to_string(path)?;
    let curriculum: Curriculum = serde_json::from_str(&raw)?;
    Ok(curriculum)
}

async fn ensure_user(repo: &SqliteRepository, user: &UserId) -> Result<(), StorageError> {
    match repo.create_profile(&Profile::new_default(user.clone())).await {
        Ok(()) => tracing::info!(user_id = %user, "created profile"),
        Err(StorageError::Conflict) => tracing::info!(user_id = %user, "profile already exists"),
        Err(e) => return Err(e),
    }
    match repo.get_position(user).await {
        Ok(_) => Ok(()),
        Err(StorageError::NotFound) => repo.save_position(user, &GuidedState::initial()).await,
        Err(e) => Err(e),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;

    let curriculum = load_curriculum(args.content.as_ref())?;
    repo.import_curriculum(&curriculum).await?;
    tracing::info!(
        chapters = curriculum.chapters.len(),
        topics = curriculum.topics.len(),
        concepts = curriculum.concepts.len(),
        flashcards = curriculum.flashcards.len(),
        questions = curriculum.questions.len(),
        db = %args.db_url,
        "seeded curriculum"
    );

    if let Some(user) = &args.user {
        ensure_user(&repo, user).await?;
    }

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
        tracing::error!(error = %err, "seeding failed");
        std::process::exit(2);
    }
}
