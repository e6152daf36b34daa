//! Classification of persistence-engine failures.
//!
//! A failed statement is reduced to an [`EngineFailure`] carrying the
//! Postgres SQLSTATE code and the server's detail line, then run through
//! [`classify`], a fixed ordered chain:
//!
//! 1. malformed scalars and unknown columns become `InvalidQuery`; values
//!    pushed out of their column's range become `InvalidInput`
//! 2. details naming a row absent from a parent table become `NotFound`
//! 3. foreign-key and uniqueness violations become `Conflict`
//!
//! Anything else is left unclassified and surfaces as `Unhandled`.

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::types::{ApiError, INVALID_DATA_INPUT};

pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
pub const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
pub const UNDEFINED_COLUMN: &str = "42703";
pub const NOT_NULL_VIOLATION: &str = "23502";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const UNIQUE_VIOLATION: &str = "23505";
pub const CHECK_VIOLATION: &str = "23514";

const MISSING_PARENT_DETAIL: &str = "is not present in table";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub code: Option<&'static str>,
    pub message: String,
    pub detail: Option<String>,
}

impl EngineFailure {
    pub fn new(code: Option<&'static str>, message: &str, detail: Option<&str>) -> Self {
        EngineFailure {
            code,
            message: message.to_owned(),
            detail: detail.map(str::to_owned),
        }
    }

    pub fn from_database_error(
        kind: &DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
    ) -> Self {
        let message = info.message();
        let code = match kind {
            DatabaseErrorKind::UniqueViolation => Some(UNIQUE_VIOLATION),
            DatabaseErrorKind::ForeignKeyViolation => Some(FOREIGN_KEY_VIOLATION),
            DatabaseErrorKind::NotNullViolation => Some(NOT_NULL_VIOLATION),
            DatabaseErrorKind::CheckViolation => Some(CHECK_VIOLATION),
            _ => code_from_message(message),
        };
        EngineFailure::new(code, message, info.details())
    }

    fn detail_contains(&self, needle: &str) -> bool {
        self.detail
            .as_ref()
            .map(|detail| detail.contains(needle))
            .unwrap_or(false)
    }
}

// Diesel only surfaces SQLSTATE for the constraint classes; the remaining
// codes we care about are recognised by the server's primary message.
fn code_from_message(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if lower.starts_with("invalid input syntax") {
        Some(INVALID_TEXT_REPRESENTATION)
    } else if lower.starts_with("column") && lower.ends_with("does not exist") {
        Some(UNDEFINED_COLUMN)
    } else if lower.ends_with("out of range") {
        Some(NUMERIC_VALUE_OUT_OF_RANGE)
    } else {
        None
    }
}

fn malformed_scalar(failure: &EngineFailure) -> Option<ApiError> {
    match failure.code {
        Some(INVALID_TEXT_REPRESENTATION) => {
            Some(ApiError::InvalidQuery("invalid input syntax for integer"))
        }
        Some(UNDEFINED_COLUMN) => Some(ApiError::InvalidQuery(
            "column does not exist in the table",
        )),
        Some(NUMERIC_VALUE_OUT_OF_RANGE) => Some(ApiError::InvalidInput(INVALID_DATA_INPUT)),
        _ => None,
    }
}

fn missing_referenced_row(failure: &EngineFailure) -> Option<ApiError> {
    if failure.detail_contains(MISSING_PARENT_DETAIL) {
        Some(ApiError::NotFound(Some("referenced entry not found")))
    } else {
        None
    }
}

fn constraint_violation(failure: &EngineFailure) -> Option<ApiError> {
    match failure.code {
        Some(FOREIGN_KEY_VIOLATION) => Some(ApiError::Conflict("does not exist")),
        Some(UNIQUE_VIOLATION) => Some(ApiError::Conflict("new entry already exists")),
        _ => None,
    }
}

/// Runs the classifier chain; the first match wins.
pub fn classify(failure: &EngineFailure) -> Option<ApiError> {
    malformed_scalar(failure)
        .or_else(|| missing_referenced_row(failure))
        .or_else(|| constraint_violation(failure))
}

/// Maps any Diesel error onto the API taxonomy.
pub fn translate(error: DieselError) -> ApiError {
    match error {
        DieselError::NotFound => ApiError::NotFound(Some("entry not found")),
        DieselError::DatabaseError(kind, info) => {
            let failure = EngineFailure::from_database_error(&kind, info.as_ref());
            match classify(&failure) {
                Some(classified) => {
                    debug!(code = ?failure.code, message = %failure.message, ?classified, "engine failure classified");
                    classified
                }
                None => {
                    warn!(
                        code = ?failure.code,
                        message = %failure.message,
                        detail = ?failure.detail,
                        "unclassified engine failure"
                    );
                    ApiError::Unhandled(failure.message)
                }
            }
        }
        other => ApiError::Unhandled(other.to_string()),
    }
}
