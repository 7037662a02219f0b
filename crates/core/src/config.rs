//! Export runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the export service.
//! Binaries read environment variables and hand the raw values to the parsing helpers in
//! this module; the core never reads the environment during request handling.

use crate::constants::{DEFAULT_QUESTIONNAIRES, DEFAULT_QUESTION_COLUMNS};
use crate::{ExportError, ExportResult};
use export_types::QuestionnaireId;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One exported questionnaire: its identifier and the number of `Question<N>` header columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionnaireSpec {
    pub id: QuestionnaireId,
    pub question_count: usize,
}

impl QuestionnaireSpec {
    pub fn new(id: QuestionnaireId, question_count: usize) -> ExportResult<Self> {
        if question_count == 0 {
            return Err(ExportError::InvalidInput(format!(
                "questionnaire {id} must have at least one question column"
            )));
        }
        Ok(Self { id, question_count })
    }
}

/// Export configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ExportConfig {
    export_root: PathBuf,
    questionnaires: Vec<QuestionnaireSpec>,
    query_timeout: Option<Duration>,
}

impl ExportConfig {
    /// Create a new `ExportConfig`.
    ///
    /// The questionnaire list is kept in the given order, which is also the order tables are
    /// written and archived in.
    ///
    /// # Errors
    /// Returns `ExportError::InvalidInput` if:
    /// - the questionnaire list is empty,
    /// - an identifier appears more than once.
    pub fn new(
        export_root: PathBuf,
        questionnaires: Vec<QuestionnaireSpec>,
        query_timeout: Option<Duration>,
    ) -> ExportResult<Self> {
        if questionnaires.is_empty() {
            return Err(ExportError::InvalidInput(
                "at least one questionnaire must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for q in &questionnaires {
            if !seen.insert(q.id.as_str()) {
                return Err(ExportError::InvalidInput(format!(
                    "questionnaire {} is configured more than once",
                    q.id
                )));
            }
        }

        Ok(Self {
            export_root,
            questionnaires,
            query_timeout,
        })
    }

    pub fn export_root(&self) -> &Path {
        &self.export_root
    }

    pub fn questionnaires(&self) -> &[QuestionnaireSpec] {
        &self.questionnaires
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    /// Header question-column count for `id`, falling back to [`DEFAULT_QUESTION_COLUMNS`]
    /// for identifiers that are not configured.
    pub fn question_count_for(&self, id: &str) -> usize {
        self.questionnaires
            .iter()
            .find(|q| q.id.as_str() == id)
            .map(|q| q.question_count)
            .unwrap_or(DEFAULT_QUESTION_COLUMNS)
    }
}

/// The built-in questionnaire table: TSQM2 (11), DASS21 (21), HIT6 (6).
pub fn default_questionnaires() -> Vec<QuestionnaireSpec> {
    DEFAULT_QUESTIONNAIRES
        .iter()
        .filter_map(|(id, count)| {
            QuestionnaireId::new(id).ok().map(|id| QuestionnaireSpec {
                id,
                question_count: *count,
            })
        })
        .collect()
}

/// Parse a questionnaire list of the form `TSQM2:11,DASS21:21,HIT6:6`.
///
/// If `value` is `None` or empty/whitespace, returns [`default_questionnaires`].
///
/// # Errors
/// Returns an error if an entry is not `<identifier>:<count>`, the identifier is invalid, or
/// the count is not a positive integer.
pub fn questionnaires_from_env_value(value: Option<String>) -> ExportResult<Vec<QuestionnaireSpec>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(default_questionnaires());
    };

    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, count) = entry.split_once(':').ok_or_else(|| {
                ExportError::InvalidInput(format!(
                    "questionnaire entry {entry:?} must be <identifier>:<question count>"
                ))
            })?;
            let count = count.trim().parse::<usize>().map_err(|e| {
                ExportError::InvalidInput(format!(
                    "questionnaire entry {entry:?} has an invalid question count: {e}"
                ))
            })?;
            QuestionnaireSpec::new(QuestionnaireId::new(id)?, count)
        })
        .collect()
}

/// Parse the query timeout in whole seconds. `None`, empty, or `0` disables the timeout.
pub fn query_timeout_from_env_value(value: Option<String>) -> ExportResult<Option<Duration>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(None);
    };

    let secs = value.parse::<u64>().map_err(|e| {
        ExportError::InvalidInput(format!("invalid query timeout {value:?}: {e}"))
    })?;

    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, count: usize) -> QuestionnaireSpec {
        QuestionnaireSpec::new(QuestionnaireId::new(id).unwrap(), count).unwrap()
    }

    #[test]
    fn test_default_questionnaires_order_and_counts() {
        let qs = default_questionnaires();
        let pairs: Vec<(&str, usize)> = qs
            .iter()
            .map(|q| (q.id.as_str(), q.question_count))
            .collect();
        assert_eq!(pairs, vec![("TSQM2", 11), ("DASS21", 21), ("HIT6", 6)]);
    }

    #[test]
    fn test_parse_questionnaires_unset_uses_defaults() {
        assert_eq!(
            questionnaires_from_env_value(None).unwrap(),
            default_questionnaires()
        );
        assert_eq!(
            questionnaires_from_env_value(Some("  ".into())).unwrap(),
            default_questionnaires()
        );
    }

    #[test]
    fn test_parse_questionnaires_custom_list() {
        let qs = questionnaires_from_env_value(Some("PHQ9:9, HIT6:6,".into())).unwrap();
        assert_eq!(qs, vec![spec("PHQ9", 9), spec("HIT6", 6)]);
    }

    #[test]
    fn test_parse_questionnaires_rejects_malformed_entries() {
        assert!(questionnaires_from_env_value(Some("TSQM2".into())).is_err());
        assert!(questionnaires_from_env_value(Some("TSQM2:eleven".into())).is_err());
        assert!(questionnaires_from_env_value(Some("TSQM2:0".into())).is_err());
        assert!(questionnaires_from_env_value(Some("../x:3".into())).is_err());
    }

    #[test]
    fn test_config_rejects_empty_and_duplicates() {
        let root = PathBuf::from("export_data");
        assert!(ExportConfig::new(root.clone(), vec![], None).is_err());
        assert!(ExportConfig::new(root, vec![spec("HIT6", 6), spec("HIT6", 6)], None).is_err());
    }

    #[test]
    fn test_question_count_lookup_falls_back_to_default() {
        let cfg = ExportConfig::new(PathBuf::from("x"), default_questionnaires(), None).unwrap();
        assert_eq!(cfg.question_count_for("TSQM2"), 11);
        assert_eq!(cfg.question_count_for("DASS21"), 21);
        assert_eq!(cfg.question_count_for("HIT6"), 6);
        assert_eq!(cfg.question_count_for("UNKNOWN"), DEFAULT_QUESTION_COLUMNS);
    }

    #[test]
    fn test_query_timeout_parsing() {
        assert_eq!(query_timeout_from_env_value(None).unwrap(), None);
        assert_eq!(query_timeout_from_env_value(Some("0".into())).unwrap(), None);
        assert_eq!(
            query_timeout_from_env_value(Some("30".into())).unwrap(),
            Some(Duration::from_secs(30))
        );
        assert!(query_timeout_from_env_value(Some("soon".into())).is_err());
    }
}
