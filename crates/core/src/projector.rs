//! Row projection.
//!
//! Flattens one [`Interview`] into an [`ExportRow`] for a single questionnaire identifier.
//! Answer payloads are rendered to their final cell text here, so malformed answers are
//! reported as data-integrity errors before any table text is produced.

use crate::constants::{
    ANSWER_VALUE_FIELD, FIELD_DELIMITER, LINE_TERMINATOR, MISSING_ANSWER_SENTINEL,
};
use crate::model::{Answer, Interview};
use crate::{ExportError, ExportResult};
use chrono::NaiveDateTime;
use serde_json::Value;
use std::fmt;

/// A single answer cell of an exported row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerCell {
    /// Rendered response text.
    Value(String),
    /// No value was recorded; written as [`MISSING_ANSWER_SENTINEL`].
    Missing,
}

impl fmt::Display for AnswerCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerCell::Value(text) => f.write_str(text),
            AnswerCell::Missing => f.write_str(MISSING_ANSWER_SENTINEL),
        }
    }
}

/// One interview's answers to one questionnaire type, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub patient_id: String,
    pub institute: String,
    pub visit_id: String,
    pub completion_date: Option<NaiveDateTime>,
    /// Answer cells in ascending question order.
    pub answers: Vec<AnswerCell>,
}

/// Project `interview` into an export row for `questionnaire_id`.
///
/// Only questionnaire instances whose definition matches `questionnaire_id` and which are
/// completed contribute answers. Returns `Ok(None)` when no such instance exists.
///
/// # Errors
/// Returns an `ExportError` if:
/// - an answer carries a value that is not an object with a `"v1"` field,
/// - an identifier or rendered answer contains a field delimiter or line break.
pub fn project_row(interview: &Interview, questionnaire_id: &str) -> ExportResult<Option<ExportRow>> {
    let mut matching = interview
        .questionnaires
        .iter()
        .filter(|q| q.is_completed && q.definition.identifier == questionnaire_id)
        .peekable();

    if matching.peek().is_none() {
        return Ok(None);
    }

    let mut answers: Vec<&Answer> = matching.flat_map(|q| q.answers.iter()).collect();
    answers.sort_by_key(|a| a.question.order);

    let visit_id = &interview.identifier;
    check_field(visit_id, "patient id", &interview.patient.identifier)?;
    check_field(visit_id, "institute", &interview.patient.institute.identifier)?;
    check_field(visit_id, "visit id", visit_id)?;

    let answers = answers
        .into_iter()
        .map(|answer| render_answer(visit_id, answer))
        .collect::<ExportResult<Vec<_>>>()?;

    Ok(Some(ExportRow {
        patient_id: interview.patient.identifier.clone(),
        institute: interview.patient.institute.identifier.clone(),
        visit_id: interview.identifier.clone(),
        completion_date: interview.completion_date,
        answers,
    }))
}

fn render_answer(visit_id: &str, answer: &Answer) -> ExportResult<AnswerCell> {
    let Some(value) = &answer.value else {
        return Ok(AnswerCell::Missing);
    };

    let v1 = value
        .get(ANSWER_VALUE_FIELD)
        .ok_or_else(|| ExportError::MissingAnswerField {
            visit_id: visit_id.to_owned(),
            question_order: answer.question.order,
        })?;

    let text = match v1 {
        Value::Null => return Ok(AnswerCell::Missing),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let text = trim_answer_text(&text);
    check_field(
        visit_id,
        &format!("answer to question {}", answer.question.order),
        text,
    )?;
    Ok(AnswerCell::Value(text.to_owned()))
}

/// Reject text that would shift columns or split the row once written.
fn check_field(visit_id: &str, field: &str, text: &str) -> ExportResult<()> {
    if text.contains([FIELD_DELIMITER, LINE_TERMINATOR, '\r']) {
        return Err(ExportError::UnsafeFieldValue {
            visit_id: visit_id.to_owned(),
            field: field.to_owned(),
        });
    }
    Ok(())
}

/// Strip list brackets and surrounding whitespace, so `[2]` and ` 2 ` both render as `2`.
fn trim_answer_text(text: &str) -> &str {
    text.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
}
