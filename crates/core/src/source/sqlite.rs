use super::InterviewSource;
use crate::model::{
    Answer, Institute, Interview, Patient, Question, QuestionnaireDefinition,
    QuestionnaireInstance,
};
use crate::{ExportError, ExportResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Bundled schema for the interview tables.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

const COMPLETED_INTERVIEWS_SQL: &str = "
    SELECT i.id, i.identifier, i.completion_date,
           p.identifier AS patient_identifier,
           ins.identifier AS institute_identifier
    FROM interviews i
    JOIN patients p ON p.id = i.patient_id
    JOIN institutes ins ON ins.id = p.institute_id
    WHERE i.is_completed = 1
    ORDER BY datetime(i.completion_date) ASC, i.id ASC";

const QUESTIONNAIRES_SQL: &str = "
    SELECT q.id, q.interview_id, q.is_completed,
           d.identifier AS definition_identifier
    FROM questionnaires q
    JOIN questionnaire_definitions d ON d.id = q.definition_id
    JOIN interviews i ON i.id = q.interview_id
    WHERE i.is_completed = 1
    ORDER BY q.id ASC";

const ANSWERS_SQL: &str = "
    SELECT a.questionnaire_id, qu.display_order, a.value,
           i.identifier AS visit_id
    FROM answers a
    JOIN questions qu ON qu.id = a.question_id
    JOIN questionnaires q ON q.id = a.questionnaire_id
    JOIN interviews i ON i.id = q.interview_id
    WHERE i.is_completed = 1
    ORDER BY a.id ASC";

#[derive(sqlx::FromRow)]
struct InterviewRow {
    id: i64,
    identifier: String,
    completion_date: Option<NaiveDateTime>,
    patient_identifier: String,
    institute_identifier: String,
}

#[derive(sqlx::FromRow)]
struct QuestionnaireRow {
    id: i64,
    interview_id: i64,
    is_completed: bool,
    definition_identifier: String,
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    questionnaire_id: i64,
    display_order: i32,
    value: Option<String>,
    visit_id: String,
}

/// Interview source reading from a SQLite database through a `sqlx` pool.
#[derive(Debug, Clone)]
pub struct SqliteInterviewSource {
    pool: SqlitePool,
}

impl SqliteInterviewSource {
    /// Connect to an existing database.
    pub async fn connect(database_url: &str) -> ExportResult<Self> {
        Self::open(database_url, false).await
    }

    /// Connect to a database, creating the file if it does not exist.
    pub async fn connect_or_create(database_url: &str) -> ExportResult<Self> {
        Self::open(database_url, true).await
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn open(database_url: &str, create_if_missing: bool) -> ExportResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Apply the bundled schema. Safe to run against an already initialised database.
    pub async fn init_schema(&self) -> ExportResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl InterviewSource for SqliteInterviewSource {
    async fn completed_interviews(&self) -> ExportResult<Vec<Interview>> {
        // One read transaction so the three queries see the same snapshot.
        let mut tx = self.pool.begin().await?;

        let interview_rows: Vec<InterviewRow> = sqlx::query_as(COMPLETED_INTERVIEWS_SQL)
            .fetch_all(&mut *tx)
            .await?;
        let questionnaire_rows: Vec<QuestionnaireRow> = sqlx::query_as(QUESTIONNAIRES_SQL)
            .fetch_all(&mut *tx)
            .await?;
        let answer_rows: Vec<AnswerRow> = sqlx::query_as(ANSWERS_SQL)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut answers_by_questionnaire: HashMap<i64, Vec<Answer>> = HashMap::new();
        for row in answer_rows {
            let value = row
                .value
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()
                .map_err(|source| ExportError::InvalidAnswerValue {
                    visit_id: row.visit_id.clone(),
                    question_order: row.display_order,
                    source,
                })?;

            answers_by_questionnaire
                .entry(row.questionnaire_id)
                .or_default()
                .push(Answer {
                    question: Question {
                        order: row.display_order,
                    },
                    value,
                });
        }

        let mut questionnaires_by_interview: HashMap<i64, Vec<QuestionnaireInstance>> =
            HashMap::new();
        for row in questionnaire_rows {
            questionnaires_by_interview
                .entry(row.interview_id)
                .or_default()
                .push(QuestionnaireInstance {
                    definition: QuestionnaireDefinition {
                        identifier: row.definition_identifier,
                    },
                    is_completed: row.is_completed,
                    answers: answers_by_questionnaire.remove(&row.id).unwrap_or_default(),
                });
        }

        let mut interviews = interview_rows
            .into_iter()
            .map(|row| Interview {
                identifier: row.identifier,
                is_completed: true,
                completion_date: row.completion_date,
                patient: Patient {
                    identifier: row.patient_identifier,
                    institute: Institute {
                        identifier: row.institute_identifier,
                    },
                },
                questionnaires: questionnaires_by_interview
                    .remove(&row.id)
                    .unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        // `completion_date` is TEXT and may mix formats; order by the parsed value.
        interviews.sort_by_key(|i| i.completion_date);

        tracing::debug!("loaded {} completed interviews", interviews.len());

        Ok(interviews)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two institutes, three completed interviews (one undated) and one draft interview.
    pub(crate) const SEED_SQL: &str = r#"
        INSERT INTO institutes (id, identifier) VALUES (1, 'INST-A'), (2, 'INST-B');
        INSERT INTO patients (id, identifier, institute_id) VALUES (1, 'P-1', 1), (2, 'P-2', 2);
        INSERT INTO questionnaire_definitions (id, identifier) VALUES (1, 'HIT6'), (2, 'DASS21');
        INSERT INTO questions (id, definition_id, display_order) VALUES
            (1, 1, 1), (2, 1, 2), (3, 1, 3), (4, 2, 1);
        INSERT INTO interviews (id, identifier, is_completed, completion_date, patient_id) VALUES
            (1, 'V-LATE', 1, '2024-05-02 15:30:00', 1),
            (2, 'V-DRAFT', 0, NULL, 1),
            (3, 'V-EARLY', 1, '2024-01-10 08:00:00', 2),
            (4, 'V-UNDATED', 1, NULL, 2);
        INSERT INTO questionnaires (id, interview_id, definition_id, is_completed) VALUES
            (1, 1, 1, 1),
            (2, 2, 1, 1),
            (3, 3, 1, 1),
            (4, 3, 2, 0);
        INSERT INTO answers (id, questionnaire_id, question_id, value) VALUES
            (1, 1, 3, '{"v1": "3"}'),
            (2, 1, 1, '{"v1": [1]}'),
            (3, 1, 2, NULL),
            (4, 2, 1, '{"v1": "9"}'),
            (5, 3, 1, '{"v1": 4}'),
            (6, 4, 4, '{"v1": "0"}');
    "#;

    pub(crate) async fn seeded_source() -> SqliteInterviewSource {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let source = SqliteInterviewSource::from_pool(pool);
        source.init_schema().await.unwrap();
        sqlx::raw_sql(SEED_SQL).execute(&source.pool).await.unwrap();
        source
    }

    #[tokio::test]
    async fn test_completed_interviews_ordered_with_nested_data() {
        let source = seeded_source().await;
        let interviews = source.completed_interviews().await.unwrap();

        let ids: Vec<&str> = interviews.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, vec!["V-UNDATED", "V-EARLY", "V-LATE"]);

        let late = &interviews[2];
        assert_eq!(late.patient.identifier, "P-1");
        assert_eq!(late.patient.institute.identifier, "INST-A");
        assert_eq!(
            late.completion_date,
            NaiveDateTime::parse_from_str("2024-05-02 15:30:00", "%Y-%m-%d %H:%M:%S").ok()
        );
        assert_eq!(late.questionnaires.len(), 1);
        let orders: Vec<i32> = late.questionnaires[0]
            .answers
            .iter()
            .map(|a| a.question.order)
            .collect();
        assert_eq!(orders, vec![3, 1, 2]);
        assert!(late.questionnaires[0].answers[2].value.is_none());

        let early = &interviews[1];
        assert_eq!(early.questionnaires.len(), 2);
        assert!(!early.questionnaires[1].is_completed);

        assert!(interviews[0].questionnaires.is_empty());
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let source = seeded_source().await;
        source.init_schema().await.unwrap();
        assert_eq!(source.completed_interviews().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_answer_json_is_reported() {
        let source = seeded_source().await;
        sqlx::raw_sql("UPDATE answers SET value = '{broken' WHERE id = 5")
            .execute(&source.pool)
            .await
            .unwrap();

        let err = source.completed_interviews().await.unwrap_err();
        assert!(matches!(
            err,
            ExportError::InvalidAnswerValue { ref visit_id, question_order: 1, .. } if visit_id == "V-EARLY"
        ));
    }

    #[tokio::test]
    async fn test_mixed_timestamp_formats_are_ordered_by_time() {
        let source = seeded_source().await;
        sqlx::raw_sql(
            "UPDATE interviews SET completion_date = '2024-01-10T09:00:00' WHERE id = 3;
             UPDATE interviews SET completion_date = '2024-01-10 10:00:00' WHERE id = 1;",
        )
        .execute(&source.pool)
        .await
        .unwrap();

        let interviews = source.completed_interviews().await.unwrap();
        let ids: Vec<&str> = interviews.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, vec!["V-UNDATED", "V-EARLY", "V-LATE"]);

        let dates: Vec<_> = interviews.iter().map(|i| i.completion_date).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }
}
