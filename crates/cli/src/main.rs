use clap::{Parser, Subcommand};
use export_core::config::{query_timeout_from_env_value, questionnaires_from_env_value};
use export_core::source::open_source;
use export_core::{
    ExportConfig, ExportService, QuestionnaireId, QuestionnaireSpec, SqliteInterviewSource,
    DEFAULT_DATABASE_URL, DEFAULT_EXPORT_DATA_DIR,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "qexport")]
#[command(about = "Questionnaire CSV export CLI")]
struct Cli {
    /// SQLite database URL (overrides EXPORT_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// JSON interview fixture used instead of the database (overrides EXPORT_FIXTURE_FILE)
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export all configured questionnaires as a ZIP archive
    Archive {
        /// Directory the archive is written into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Export a single questionnaire table
    Table {
        /// Questionnaire identifier, e.g. TSQM2
        identifier: QuestionnaireId,
        /// Output path without the .csv extension
        #[arg(long)]
        out: PathBuf,
    },
    /// Create the interview tables in the database
    InitDb,
    /// List configured questionnaires and their question-column counts
    Questionnaires,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("EXPORT_DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
    let fixture = cli
        .fixture
        .or_else(|| std::env::var("EXPORT_FIXTURE_FILE").ok().map(PathBuf::from));

    let export_root = PathBuf::from(
        std::env::var("EXPORT_DATA_DIR").unwrap_or_else(|_| DEFAULT_EXPORT_DATA_DIR.into()),
    );
    let questionnaires = questionnaires_from_env_value(std::env::var("EXPORT_QUESTIONNAIRES").ok())?;
    let query_timeout =
        query_timeout_from_env_value(std::env::var("EXPORT_QUERY_TIMEOUT_SECS").ok())?;
    let cfg = Arc::new(ExportConfig::new(export_root, questionnaires, query_timeout)?);

    match cli.command {
        Some(Commands::Archive { out }) => {
            let source = open_source(&database_url, fixture.as_deref()).await?;
            let service = ExportService::new(cfg, source);
            match service.export_archive().await {
                Ok(archive) => {
                    let path = out.join(&archive.file_name);
                    tokio::fs::write(&path, &archive.bytes).await?;
                    println!("Wrote archive: {}", path.display());
                }
                Err(e) => eprintln!("Error exporting archive: {}", e),
            }
        }
        Some(Commands::Table { identifier, out }) => {
            let count = cfg.question_count_for(identifier.as_str());
            let spec = QuestionnaireSpec::new(identifier, count)?;
            let id = &spec.id;
            let source = open_source(&database_url, fixture.as_deref()).await?;
            let service = ExportService::new(cfg, source);
            match service.write_table(&spec, &out).await {
                Ok(path) => println!("Wrote {} table: {}", id, path.display()),
                Err(e) => eprintln!("Error exporting {}: {}", id, e),
            }
        }
        Some(Commands::InitDb) => {
            let source = SqliteInterviewSource::connect_or_create(&database_url).await?;
            match source.init_schema().await {
                Ok(()) => println!("Initialised interview schema in {}", database_url),
                Err(e) => eprintln!("Error initialising schema: {}", e),
            }
        }
        Some(Commands::Questionnaires) => {
            for q in cfg.questionnaires() {
                println!("{}: {} question columns", q.id, q.question_count);
            }
        }
        None => {
            println!("Use 'qexport --help' for commands");
        }
    }

    Ok(())
}
