//! Table and client configuration errors

/// Errors raised while constructing a table, client or entity binding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Two fields in one table share a key.
    #[error("Duplicate field key '{0}'")]
    DuplicateField(String),

    /// A search key does not name one of the table's fields.
    #[error("Search field '{0}' is not a table field")]
    UnknownSearchField(String),

    /// An enum field was declared without options.
    #[error("Enum field '{0}' has no options")]
    MissingOptions(String),

    /// The table and its data source are bound to different entities.
    #[error("Table is configured for {table} but the data source serves {served}")]
    EntityMismatch {
        table: &'static str,
        served: &'static str,
    },

    /// The entity name is not part of the registry.
    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    /// The backend outputs file is missing a required section.
    #[error("Outputs file has no data section")]
    MissingDataSection,

    /// The data section has no API key, e.g. when the API only accepts
    /// user-pool tokens.
    #[error("Outputs file has no data API key (default authorization: {authorization})")]
    MissingApiKey { authorization: String },
}
