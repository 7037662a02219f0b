//! # API REST
//!
//! REST API for the questionnaire export.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (response headers, status mapping, CORS)
//!
//! The export itself lives in `export-core`; handlers only translate its results to HTTP.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use export_core::ExportService;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

const OCTET_STREAM: &str = "application/octet-stream";

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    pub export_service: ExportService,
}

/// Health check response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(paths(health, export_csv), components(schemas(HealthRes)))]
pub struct ApiDoc;

/// Build the REST router with all routes, Swagger UI and CORS applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/csv", get(export_csv))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the export service.
/// This endpoint is used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Questionnaire export API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/csv",
    responses(
        (status = 200, description = "ZIP archive with one CSV table per questionnaire", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 500, description = "Internal server error")
    )
)]
/// Export all questionnaire tables as one ZIP archive
///
/// Writes one semicolon-delimited, UTF-16LE encoded table per configured questionnaire and
/// returns them bundled under `Files/` in a ZIP named `Zip_<yyyy-MMM-dd-HHmmss>.zip`.
/// No authentication is required.
///
/// # Errors
/// Returns `500 Internal Server Error` if:
/// - the interview query fails or times out,
/// - an answer is missing its `v1` field,
/// - a table cannot be written or read back, or the archive cannot be built.
#[axum::debug_handler]
async fn export_csv(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, &'static str)> {
    match state.export_service.export_archive().await {
        Ok(archive) => Ok((
            [
                (header::CONTENT_TYPE, OCTET_STREAM.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", archive.file_name),
                ),
            ],
            archive.bytes,
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Export archive error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use export_core::config::default_questionnaires;
    use export_core::model::{
        Answer, Institute, Interview, Patient, Question, QuestionnaireDefinition,
        QuestionnaireInstance,
    };
    use export_core::{ExportConfig, MemoryInterviewSource};
    use std::collections::BTreeMap;
    use std::io::{Cursor, Read};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use zip::ZipArchive;

    fn instance(id: &str, answers: Vec<Option<&str>>) -> QuestionnaireInstance {
        QuestionnaireInstance {
            definition: QuestionnaireDefinition {
                identifier: id.into(),
            },
            is_completed: true,
            answers: answers
                .into_iter()
                .enumerate()
                .map(|(i, v)| Answer {
                    question: Question { order: i as i32 + 1 },
                    value: v.map(|v| serde_json::json!({ "v1": v })),
                })
                .collect(),
        }
    }

    fn interviews() -> Vec<Interview> {
        let patient = Patient {
            identifier: "P-1".into(),
            institute: Institute {
                identifier: "INST".into(),
            },
        };
        vec![
            Interview {
                identifier: "V-1".into(),
                is_completed: true,
                completion_date: NaiveDate::from_ymd_opt(2024, 2, 1)
                    .and_then(|d| d.and_hms_opt(13, 30, 0)),
                patient: patient.clone(),
                questionnaires: vec![
                    instance("TSQM2", vec![Some("1"); 11]),
                    instance("HIT6", vec![Some("2"), None, Some("4"), Some("4"), Some("1"), Some("3")]),
                ],
            },
            Interview {
                identifier: "V-2".into(),
                is_completed: true,
                completion_date: NaiveDate::from_ymd_opt(2024, 2, 9)
                    .and_then(|d| d.and_hms_opt(9, 0, 0)),
                patient,
                questionnaires: vec![instance("DASS21", vec![Some("0"); 21])],
            },
        ]
    }

    fn app(root: &Path, interviews: Vec<Interview>) -> Router {
        let cfg = ExportConfig::new(root.to_path_buf(), default_questionnaires(), None).unwrap();
        let export_service = ExportService::new(
            Arc::new(cfg),
            Arc::new(MemoryInterviewSource::new(interviews)),
        );
        router(AppState { export_service })
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn csv_entries(bytes: Vec<u8>) -> BTreeMap<String, Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            if file.is_dir() {
                continue;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            entries.insert(file.name().to_owned(), contents);
        }
        entries
    }

    #[tokio::test]
    async fn test_health() {
        let temp = TempDir::new().unwrap();
        let response = get(app(temp.path(), vec![]), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let health: HealthRes = serde_json::from_slice(&body).unwrap();
        assert!(health.ok);
    }

    #[tokio::test]
    async fn test_export_endpoint_returns_archive() {
        let temp = TempDir::new().unwrap();
        let response = get(app(temp.path(), interviews()), "/api/csv").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_owned();
        assert!(disposition.starts_with("attachment; filename=\"Zip_"));
        assert!(disposition.ends_with(".zip\""));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let entries = csv_entries(body.to_vec());

        let names: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["Files/DASS21.csv", "Files/HIT6.csv", "Files/TSQM2.csv"]
        );
        for contents in entries.values() {
            assert!(!contents.is_empty());
            assert!(contents.ends_with(&[0x0A, 0x00]));
        }

        let hit6: Vec<u16> = entries["Files/HIT6.csv"]
            .chunks_exact(2)
            .map(|p| u16::from_le_bytes([p[0], p[1]]))
            .collect();
        assert_eq!(
            String::from_utf16(&hit6).unwrap(),
            "PatientId;Institute;VisitId;CompleteDate;Question1;Question2;Question3;Question4;Question5;Question6\n\
             P-1;INST;V-1;01.02.2024 01:30;2;9999;4;4;1;3\n"
        );
    }

    #[tokio::test]
    async fn test_export_endpoint_is_idempotent() {
        let temp = TempDir::new().unwrap();

        let first = get(app(temp.path(), interviews()), "/api/csv").await;
        let first = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        let second = get(app(temp.path(), interviews()), "/api/csv").await;
        let second = to_bytes(second.into_body(), usize::MAX).await.unwrap();

        assert_eq!(csv_entries(first.to_vec()), csv_entries(second.to_vec()));
    }

    #[tokio::test]
    async fn test_export_failure_is_server_error() {
        let temp = TempDir::new().unwrap();
        let mut broken = interviews();
        broken[0].questionnaires[0].answers[0].value = Some(serde_json::json!("no object"));

        let response = get(app(temp.path(), broken), "/api/csv").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
