//! Constants used throughout the export core crate.
//!
//! Output-format constants live here so the CSV layout and archive naming stay byte-compatible
//! with existing downstream consumers.

/// Field delimiter for exported tables.
pub const FIELD_DELIMITER: char = ';';

/// Line terminator for exported tables (no carriage return).
pub const LINE_TERMINATOR: char = '\n';

/// Value written in place of an answer that has no recorded value.
pub const MISSING_ANSWER_SENTINEL: &str = "9999";

/// Nested key in an answer value that holds the actual response.
pub const ANSWER_VALUE_FIELD: &str = "v1";

/// Static leading columns of every exported table, in output order.
pub const FIXED_COLUMNS: [&str; 4] = ["PatientId", "Institute", "VisitId", "CompleteDate"];

/// Prefix of the synthetic per-question header columns (`Question1`, `Question2`, ...).
pub const QUESTION_COLUMN_PREFIX: &str = "Question";

/// Question-column count used for identifiers missing from the configured table.
pub const DEFAULT_QUESTION_COLUMNS: usize = 6;

/// Questionnaires exported when no explicit list is configured, in export order.
pub const DEFAULT_QUESTIONNAIRES: [(&str, usize); 3] = [("TSQM2", 11), ("DASS21", 21), ("HIT6", 6)];

/// Completion timestamp format. `%I` is the 12-hour clock and no AM/PM marker is written.
pub const COMPLETION_DATE_FORMAT: &str = "%d.%m.%Y %I:%M";

/// Extension of exported table files.
pub const TABLE_FILE_EXTENSION: &str = "csv";

/// Folder inside the archive that holds the exported tables.
pub const ARCHIVE_FOLDER_NAME: &str = "Files";

/// chrono format for the downloadable archive name, e.g. `Zip_2024-Mar-05-142233.zip`.
pub const ARCHIVE_NAME_FORMAT: &str = "Zip_%Y-%b-%d-%H%M%S.zip";

/// Default directory under which per-export working directories are created.
pub const DEFAULT_EXPORT_DATA_DIR: &str = "export_data";

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://export.db";
