//! Table writer.
//!
//! Produces one delimited text file per questionnaire identifier:
//!
//! ```text
//! PatientId;Institute;VisitId;CompleteDate;Question1;...;Question<K>\n
//! <patient>;<institute>;<visit>;<dd.MM.yyyy hh:mm>;<answer 1>;...;<answer n>\n
//! ```
//!
//! The file is encoded as UTF-16 little endian without a byte-order mark, which is what the
//! downstream consumers of these exports read.

use crate::config::QuestionnaireSpec;
use crate::constants::{
    COMPLETION_DATE_FORMAT, FIELD_DELIMITER, FIXED_COLUMNS, LINE_TERMINATOR,
    QUESTION_COLUMN_PREFIX, TABLE_FILE_EXTENSION,
};
use crate::projector::{project_row, ExportRow};
use crate::source::InterviewSource;
use crate::{ExportError, ExportResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Header line for a table with `question_count` synthetic question columns.
pub fn render_header(question_count: usize) -> String {
    let questions = (1..=question_count).map(|n| format!("{QUESTION_COLUMN_PREFIX}{n}"));
    let columns: Vec<String> = FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(questions)
        .collect();

    let mut line = columns.join(&FIELD_DELIMITER.to_string());
    line.push(LINE_TERMINATOR);
    line
}

/// Serialize one row. The completion date is empty when the interview has none.
///
/// Fields are written unquoted; [`project_row`] rejects values containing `;` or line breaks.
pub fn render_row(row: &ExportRow) -> String {
    let completion_date = row
        .completion_date
        .map(|d| d.format(COMPLETION_DATE_FORMAT).to_string())
        .unwrap_or_default();

    let fields: Vec<String> = [
        row.patient_id.clone(),
        row.institute.clone(),
        row.visit_id.clone(),
        completion_date,
    ]
    .into_iter()
    .chain(row.answers.iter().map(ToString::to_string))
    .collect();

    let mut line = fields.join(&FIELD_DELIMITER.to_string());
    line.push(LINE_TERMINATOR);
    line
}

/// Full table text: header followed by every row.
pub fn render_table(question_count: usize, rows: &[ExportRow]) -> String {
    let mut text = render_header(question_count);
    for row in rows {
        text.push_str(&render_row(row));
    }
    text
}

/// Encode `text` as UTF-16 little endian, two bytes per code unit, no byte-order mark.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// `<base>.csv`, appended rather than substituted so identifiers are never truncated.
pub fn table_path(base: &Path) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".");
    path.push(TABLE_FILE_EXTENSION);
    PathBuf::from(path)
}

/// Query, project and write the table for `spec` to `<base>.csv`.
///
/// The file is created, or truncated if it already exists. The write completes before this
/// returns, so callers can read the file back immediately.
///
/// # Returns
/// The path of the written file.
///
/// # Errors
/// Returns an `ExportError` if:
/// - the data source query fails or exceeds `query_timeout`,
/// - an answer fails projection,
/// - the file cannot be written.
pub async fn write_table(
    source: &dyn InterviewSource,
    spec: &QuestionnaireSpec,
    base: &Path,
    query_timeout: Option<Duration>,
) -> ExportResult<PathBuf> {
    let interviews = match query_timeout {
        Some(limit) => tokio::time::timeout(limit, source.completed_interviews())
            .await
            .map_err(|_| ExportError::QueryTimeout(limit))??,
        None => source.completed_interviews().await?,
    };

    let mut rows = Vec::new();
    for interview in &interviews {
        if let Some(row) = project_row(interview, spec.id.as_str())? {
            if row.answers.len() != spec.question_count {
                tracing::warn!(
                    "visit {} has {} answers for {} but the header has {} question columns",
                    row.visit_id,
                    row.answers.len(),
                    spec.id,
                    spec.question_count
                );
            }
            rows.push(row);
        }
    }

    let text = render_table(spec.question_count, &rows);
    let path = table_path(base);

    tokio::fs::write(&path, encode_utf16le(&text))
        .await
        .map_err(ExportError::FileWrite)?;

    tracing::info!("wrote {} rows for {} to {}", rows.len(), spec.id, path.display());

    Ok(path)
}
