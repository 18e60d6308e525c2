//! GraphQL error detail

use serde::Deserialize;

/// One entry of a GraphQL response's `errors` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlErrorDetail {
    /// Human-readable error message.
    pub message: String,
    /// Backend error classification (e.g. "Unauthorized", "DynamoDB:ConditionalCheckFailedException").
    #[serde(default)]
    pub error_type: Option<String>,
    /// Response path the error applies to.
    #[serde(default)]
    pub path: Option<Vec<serde_json::Value>>,
}

impl GraphQlErrorDetail {
    /// Creates a new error detail with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            path: None,
        }
    }

    /// Sets the error type.
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Returns `true` if the backend classified this as an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.error_type.as_deref(), Some("Unauthorized"))
    }
}

impl std::fmt::Display for GraphQlErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_type {
            Some(kind) => write!(f, "[{}] {}", kind, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
