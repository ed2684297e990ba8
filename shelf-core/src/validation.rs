//! Review submission validation.
//!
//! [`ReviewInput`] is the raw, untrusted shape a boundary layer hands in.
//! [`ReviewInput::validate`] checks every field and reports all failures at
//! once, producing a [`NewReview`] only when the whole submission is valid.

use serde::{Deserialize, Serialize};

use crate::entities::{NewReview, Rating, MIN_REVIEW_TEXT_CHARS};
use crate::{Constraint, FieldViolation, ValidationError};

/// Raw review submission.
///
/// `rating` stays an untyped JSON value so that non-integer input can be
/// reported as a field violation instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(alias = "review", default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rating: Option<serde_json::Value>,
}

impl ReviewInput {
    pub fn new(text: impl Into<String>, rating: i64) -> Self {
        Self {
            text: Some(text.into()),
            rating: Some(serde_json::Value::from(rating)),
        }
    }

    /// Validate all fields.
    ///
    /// # Errors
    /// Returns `ValidationError::Rejected` listing every failing field, text first.
    pub fn validate(&self) -> Result<NewReview, ValidationError> {
        let mut violations = Vec::new();

        let text = match self.text.as_deref().map(str::trim) {
            None | Some("") => {
                violations.push(FieldViolation::new("text", Constraint::Required));
                None
            }
            Some(t) if t.chars().count() < MIN_REVIEW_TEXT_CHARS => {
                violations.push(FieldViolation::new(
                    "text",
                    Constraint::MinLength {
                        min: MIN_REVIEW_TEXT_CHARS,
                    },
                ));
                None
            }
            Some(t) => Some(t.to_string()),
        };

        let rating = match parse_integer(self.rating.as_ref()) {
            Err(constraint) => {
                violations.push(FieldViolation::new("rating", constraint));
                None
            }
            Ok(value) => match Rating::new(value) {
                Ok(rating) => Some(rating),
                Err(_) => {
                    violations.push(FieldViolation::new("rating", Rating::range()));
                    None
                }
            },
        };

        match (text, rating) {
            (Some(text), Some(rating)) if violations.is_empty() => Ok(NewReview { text, rating }),
            _ => Err(ValidationError::Rejected { violations }),
        }
    }
}

/// Accept JSON integers and integer strings (form posts send strings).
fn parse_integer(value: Option<&serde_json::Value>) -> Result<i64, Constraint> {
    match value {
        None | Some(serde_json::Value::Null) => Err(Constraint::Required),
        Some(serde_json::Value::Number(n)) => n.as_i64().ok_or(Constraint::Integer),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Err(Constraint::Required),
        Some(serde_json::Value::String(s)) => s.trim().parse().map_err(|_| Constraint::Integer),
        Some(_) => Err(Constraint::Integer),
    }
}
