use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid questionnaire identifier: {0}")]
    InvalidQuestionnaireId(#[from] export_types::IdError),

    #[error("failed to query interviews: {0}")]
    Query(#[from] sqlx::Error),
    #[error("interview query did not complete within {0:?}")]
    QueryTimeout(Duration),

    #[error("failed to create export directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write export file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read export file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("answer to question {question_order} in visit {visit_id} has a value without a \"v1\" field")]
    MissingAnswerField { visit_id: String, question_order: i32 },
    #[error("answer to question {question_order} in visit {visit_id} has an unreadable value: {source}")]
    InvalidAnswerValue {
        visit_id: String,
        question_order: i32,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} in visit {visit_id} contains a field delimiter or line break")]
    UnsafeFieldValue { visit_id: String, field: String },

    #[error("failed to read fixture file: {0}")]
    FixtureRead(std::io::Error),
    #[error("failed to parse fixture file: {0}")]
    FixtureParse(serde_json::Error),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;
