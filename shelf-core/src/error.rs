//! Error types for Shelf operations

use crate::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// The rule a field failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Constraint {
    Required,
    MinLength { min: usize },
    Integer,
    Range { min: i64, max: i64 },
    Timestamp,
    Invalid { reason: String },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Required => write!(f, "is required"),
            Constraint::MinLength { min } => write!(f, "must be at least {} characters", min),
            Constraint::Integer => write!(f, "must be an integer"),
            Constraint::Range { min, max } => write!(f, "must be between {} and {}", min, max),
            Constraint::Timestamp => write!(f, "must be an RFC 3339 timestamp"),
            Constraint::Invalid { reason } => write!(f, "is invalid: {}", reason),
        }
    }
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    #[serde(flatten)]
    pub constraint: Constraint,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.constraint)
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Malformed timestamp for {field}: '{value}'")]
    MalformedTimestamp { field: String, value: String },

    #[error("Rejected: {}", join_violations(.violations))]
    Rejected { violations: Vec<FieldViolation> },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Names of the offending fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationError::InvalidValue { field, .. }
            | ValidationError::MalformedTimestamp { field, .. } => vec![field.as_str()],
            ValidationError::Rejected { violations } => {
                violations.iter().map(|v| v.field.as_str()).collect()
            }
        }
    }

    /// Per-field breakdown, suitable for a structured error body.
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self {
            ValidationError::InvalidValue { field, reason } => vec![FieldViolation::new(
                field.clone(),
                Constraint::Invalid {
                    reason: reason.clone(),
                },
            )],
            ValidationError::MalformedTimestamp { field, .. } => {
                vec![FieldViolation::new(field.clone(), Constraint::Timestamp)]
            }
            ValidationError::Rejected { violations } => violations.clone(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache serialization failed for {key}: {reason}")]
    Serialization { key: String, reason: String },
}

/// Coarse classification of a [`ShelfError`], used by boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RateLimitExceeded,
    NotFound,
    Storage,
    Cache,
    Config,
}

/// Master error type for all Shelf errors.
#[derive(Debug, Clone, Error)]
pub enum ShelfError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Rate limit '{policy}' exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        policy: String,
        retry_after_secs: u64,
    },
}

impl ShelfError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity_type: EntityType, id: Uuid) -> Self {
        ShelfError::Storage(StorageError::NotFound { entity_type, id })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShelfError::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            ShelfError::Storage(_) => ErrorKind::Storage,
            ShelfError::Validation(_) => ErrorKind::Validation,
            ShelfError::Config(_) => ErrorKind::Config,
            ShelfError::Cache(_) => ErrorKind::Cache,
            ShelfError::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
        }
    }

    /// Offending fields for validation failures; empty for every other kind.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ShelfError::Validation(v) => v.fields(),
            _ => Vec::new(),
        }
    }
}

/// Result type alias for Shelf operations.
pub type ShelfResult<T> = Result<T, ShelfError>;

// =============================================================================
// TESTS
// =============================================================================
