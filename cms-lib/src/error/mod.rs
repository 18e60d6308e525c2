//! Error types

mod api;
mod config;
mod field;
mod graphql;
mod validation;

pub use api::*;
pub use config::*;
pub use field::*;
pub use graphql::*;
pub use validation::*;

/// Top-level error for client, backend and table operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The data API rejected or failed a request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A table or client was configured incorrectly.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A typed record accessor failed.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// One or more fields failed validation.
    #[error("Validation failed: {}", join_validation(.0))]
    Validation(Vec<FieldValidationError>),

    /// A record could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The operation is not valid in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Creates a validation error from a single field failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldValidationError::new(field, message)])
    }

    /// Returns the field validation failures, if this is a validation error.
    pub fn validation_errors(&self) -> &[FieldValidationError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join_validation(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
