//! Shared validated types for the questionnaire export workspace.

use std::str::FromStr;

/// Maximum length of a questionnaire identifier.
pub const MAX_QUESTIONNAIRE_ID_LEN: usize = 64;

/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty or contained only whitespace
    #[error("questionnaire identifier cannot be empty")]
    Empty,

    /// The input exceeded [`MAX_QUESTIONNAIRE_ID_LEN`]
    #[error("questionnaire identifier exceeds {MAX_QUESTIONNAIRE_ID_LEN} characters")]
    TooLong,

    /// The input contained a character outside `[A-Za-z0-9_-]`
    #[error("questionnaire identifier contains invalid character {0:?} (only alphanumeric, '-', '_' allowed)")]
    InvalidCharacter(char),
}

/// Identifier of a questionnaire definition, for example `TSQM2` or `DASS21`.
///
/// The identifier names the exported table file (`<id>.csv`) and its archive entry, so it is
/// restricted to a conservative ASCII set that cannot escape a directory or collide with an
/// extension. Input is trimmed of surrounding whitespace during construction. Comparison is
/// exact and case-sensitive, matching how definitions are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionnaireId(String);

impl QuestionnaireId {
    /// Creates a new `QuestionnaireId` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if the trimmed input is empty, too long, or contains characters
    /// other than ASCII alphanumerics, `-` and `_`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.len() > MAX_QUESTIONNAIRE_ID_LEN {
            return Err(IdError::TooLong);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(IdError::InvalidCharacter(bad));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuestionnaireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QuestionnaireId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for QuestionnaireId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for QuestionnaireId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for QuestionnaireId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        QuestionnaireId::new(&s).map_err(serde::de::Error::custom)
    }
}
