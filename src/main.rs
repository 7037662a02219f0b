use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use export_core::config::{query_timeout_from_env_value, questionnaires_from_env_value};
use export_core::source::open_source;
use export_core::{ExportConfig, ExportService, DEFAULT_DATABASE_URL, DEFAULT_EXPORT_DATA_DIR};

/// Main entry point for the questionnaire export service
///
/// Resolves configuration once, connects the interview data source and serves the REST API.
///
/// # Environment Variables
/// - `EXPORT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `EXPORT_DATA_DIR`: Root directory for export working files (default: "export_data")
/// - `EXPORT_DATABASE_URL`: SQLite database URL (default: "sqlite://export.db")
/// - `EXPORT_FIXTURE_FILE`: JSON interview fixture used instead of the database
/// - `EXPORT_QUESTIONNAIRES`: Ordered `<id>:<question count>` list (default: "TSQM2:11,DASS21:21,HIT6:6")
/// - `EXPORT_QUERY_TIMEOUT_SECS`: Interview query timeout in seconds (default: none)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, data source connection or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("questionnaire_export_run=info".parse()?)
                .add_directive("export_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("EXPORT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let export_root = PathBuf::from(
        std::env::var("EXPORT_DATA_DIR").unwrap_or_else(|_| DEFAULT_EXPORT_DATA_DIR.into()),
    );
    let questionnaires = questionnaires_from_env_value(std::env::var("EXPORT_QUESTIONNAIRES").ok())?;
    let query_timeout =
        query_timeout_from_env_value(std::env::var("EXPORT_QUERY_TIMEOUT_SECS").ok())?;
    let cfg = Arc::new(ExportConfig::new(export_root, questionnaires, query_timeout)?);

    let database_url =
        std::env::var("EXPORT_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
    let fixture = std::env::var("EXPORT_FIXTURE_FILE").ok().map(PathBuf::from);
    let source = open_source(&database_url, fixture.as_deref()).await?;

    let state = AppState {
        export_service: ExportService::new(cfg.clone(), source),
    };

    tracing::info!(
        "++ Exporting {} questionnaires into {}",
        cfg.questionnaires().len(),
        cfg.export_root().display()
    );
    tracing::info!("++ Starting questionnaire export REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}
