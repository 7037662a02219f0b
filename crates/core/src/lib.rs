//! # Export Core
//!
//! Core logic for exporting questionnaire responses as delimited text tables bundled into a
//! single ZIP archive.
//!
//! The pipeline runs strictly top-down for every export:
//! - [`service::ExportService`] packages one table per configured questionnaire,
//! - [`table`] queries completed interviews and writes each table file,
//! - [`projector`] flattens one interview into one row.
//!
//! Interview data comes through the [`source::InterviewSource`] seam.
//!
//! **No API concerns**: HTTP routing and serving belong in `api-rest`.

pub mod archive;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod projector;
pub mod service;
pub mod source;
pub mod table;

pub use archive::ExportArchive;
pub use config::{ExportConfig, QuestionnaireSpec};
pub use constants::{DEFAULT_DATABASE_URL, DEFAULT_EXPORT_DATA_DIR};
pub use error::{ExportError, ExportResult};
pub use export_types::QuestionnaireId;
pub use service::ExportService;
pub use source::{InterviewSource, MemoryInterviewSource, SqliteInterviewSource};
