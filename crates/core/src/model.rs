//! Read-only interview records as loaded from an [`InterviewSource`](crate::source::InterviewSource).
//!
//! These mirror the nested relational data the export needs: interview → patient → institute,
//! and interview → questionnaire instances → answers → questions. Records are plain data with
//! serde support so they can also be loaded from JSON fixtures.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institute {
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub identifier: String,
    pub institute: Institute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireDefinition {
    pub identifier: String,
}

/// Question metadata needed for export; `order` is the declared display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub order: i32,
}

/// A recorded answer.
///
/// `value` is the structured answer payload. When present it is expected to be an object whose
/// `"v1"` field holds the response, e.g. `{"v1": "3"}` or `{"v1": [2]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: Question,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireInstance {
    pub definition: QuestionnaireDefinition,
    pub is_completed: bool,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// One clinical data-collection session. `identifier` is the visit id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub identifier: String,
    pub is_completed: bool,
    #[serde(default)]
    pub completion_date: Option<NaiveDateTime>,
    pub patient: Patient,
    #[serde(default)]
    pub questionnaires: Vec<QuestionnaireInstance>,
}
