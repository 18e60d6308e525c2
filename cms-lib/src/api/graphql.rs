//! GraphQL documents and response envelope
//!
//! The managed data API generates one query and three mutations per model.
//! Documents select `id`, every schema attribute and both timestamps.

use serde::Deserialize;
use serde::Serialize;

use crate::error::GraphQlErrorDetail;
use crate::model::EntityKind;
use crate::model::Record;

/// A GraphQL request body.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    /// The document text.
    pub query: String,
    /// Variables referenced by the document.
    pub variables: serde_json::Value,
}

impl GraphQlRequest {
    /// Creates a request.
    pub fn new(query: impl Into<String>, variables: serde_json::Value) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

/// The `{ data, errors? }` envelope every response uses.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    /// Result data, keyed by root field.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Errors raised while resolving the document.
    #[serde(default)]
    pub errors: Vec<GraphQlErrorDetail>,
}

/// One page of a list query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Records on this page. Unreadable items come back as null.
    #[serde(default)]
    pub items: Vec<Option<Record>>,
    /// Cursor for the next page, absent on the last one.
    #[serde(default)]
    pub next_token: Option<String>,
}

fn selection_set(entity: EntityKind) -> String {
    entity.selection().join(" ")
}

/// Document listing one page of `entity`.
pub fn list_document(entity: EntityKind) -> String {
    format!(
        "query {op}($limit: Int, $nextToken: String) {{ {field}(limit: $limit, nextToken: $nextToken) {{ items {{ {sel} }} nextToken }} }}",
        op = capitalize(&entity.list_field()),
        field = entity.list_field(),
        sel = selection_set(entity),
    )
}

/// Document creating one `entity` record from `$input`.
pub fn create_document(entity: EntityKind) -> String {
    mutation_document(entity.create_field(), "Create", entity, &selection_set(entity))
}

/// Document updating one `entity` record from `$input`.
pub fn update_document(entity: EntityKind) -> String {
    mutation_document(entity.update_field(), "Update", entity, &selection_set(entity))
}

/// Document deleting one `entity` record by `$input.id`.
pub fn delete_document(entity: EntityKind) -> String {
    mutation_document(entity.delete_field(), "Delete", entity, "id")
}

fn mutation_document(field: String, verb: &str, entity: EntityKind, selection: &str) -> String {
    format!(
        "mutation {op}($input: {verb}{model}Input!) {{ {field}(input: $input) {{ {selection} }} }}",
        op = capitalize(&field),
        verb = verb,
        model = entity.model_name(),
        field = field,
        selection = selection,
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
