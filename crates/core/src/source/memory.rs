use super::InterviewSource;
use crate::model::Interview;
use crate::{ExportError, ExportResult};
use async_trait::async_trait;
use std::path::Path;

/// Interview source backed by records held in memory.
///
/// Applies the same completion filter and ordering as a database query would, so the rest of
/// the pipeline cannot tell the two apart.
#[derive(Debug, Clone, Default)]
pub struct MemoryInterviewSource {
    interviews: Vec<Interview>,
}

impl MemoryInterviewSource {
    pub fn new(interviews: Vec<Interview>) -> Self {
        Self { interviews }
    }

    /// Load interviews from a JSON file containing an array of interview records.
    ///
    /// # Errors
    /// Returns `ExportError::FixtureRead` if the file cannot be read, or
    /// `ExportError::FixtureParse` if it is not a valid interview array.
    pub async fn from_json_file(path: &Path) -> ExportResult<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(ExportError::FixtureRead)?;
        let interviews: Vec<Interview> =
            serde_json::from_str(&contents).map_err(ExportError::FixtureParse)?;
        Ok(Self::new(interviews))
    }
}

#[async_trait]
impl InterviewSource for MemoryInterviewSource {
    async fn completed_interviews(&self) -> ExportResult<Vec<Interview>> {
        let mut completed: Vec<Interview> = self
            .interviews
            .iter()
            .filter(|i| i.is_completed)
            .cloned()
            .collect();
        // Stable: equal dates keep insertion order. `None` sorts before any date.
        completed.sort_by_key(|i| i.completion_date);
        Ok(completed)
    }
}
