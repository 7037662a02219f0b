//! Interview data sources.
//!
//! The export pipeline only needs one read capability: every completed interview, ordered by
//! completion date, with its nested patient, institute, questionnaire, answer and question
//! data loaded. [`InterviewSource`] is that seam; implementations are
//! [`SqliteInterviewSource`] for a relational store and [`MemoryInterviewSource`] for fixtures.

mod memory;
mod sqlite;

pub use memory::MemoryInterviewSource;
pub use sqlite::SqliteInterviewSource;

#[cfg(test)]
pub(crate) use sqlite::tests::seeded_source;

use crate::model::Interview;
use crate::ExportResult;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

#[async_trait]
pub trait InterviewSource: Send + Sync {
    /// All interviews whose completion flag is set, ordered ascending by completion date.
    ///
    /// Interviews without a completion date sort first. Ties keep insertion order.
    async fn completed_interviews(&self) -> ExportResult<Vec<Interview>>;
}

/// Open the configured data source.
///
/// A fixture file takes precedence over the database URL, which keeps demos and offline
/// exports independent of a running database.
///
/// # Errors
/// Returns an error if the fixture cannot be loaded or the database cannot be reached.
pub async fn open_source(
    database_url: &str,
    fixture: Option<&Path>,
) -> ExportResult<Arc<dyn InterviewSource>> {
    if let Some(path) = fixture {
        tracing::info!("-- Using interview fixture {}", path.display());
        let source = MemoryInterviewSource::from_json_file(path).await?;
        return Ok(Arc::new(source));
    }

    tracing::info!("-- Connecting to interview database {}", database_url);
    let source = SqliteInterviewSource::connect(database_url).await?;
    Ok(Arc::new(source))
}
