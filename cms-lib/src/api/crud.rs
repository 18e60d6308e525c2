//! Create, Read, Update, Delete operations
//!
//! [`ModelApi`] is the per-model contract a record table is bound to. The
//! GraphQL [`ModelClient`](super::ModelClient) and the in-process
//! [`MemoryBackend`](super::MemoryBackend) both implement it.
//!
//! # Example
//!
//! ```ignore
//! use cms_lib::api::ModelApi;
//! use cms_lib::model::Record;
//!
//! let tags = client.model(EntityKind::Tag);
//! let created = tags.create(Record::new().set("name", "Rock")).await?;
//! let all = tags.list().await?;
//! ```

use async_trait::async_trait;

use crate::error::Error;
use crate::error::FieldValidationError;
use crate::model::EntityKind;
use crate::model::ID_FIELD;
use crate::model::Record;

/// List/create/update/delete for one entity.
#[async_trait]
pub trait ModelApi: Send + Sync {
    /// The entity this handle serves.
    fn entity(&self) -> EntityKind;

    /// Returns every record, in the order the backend returns them.
    async fn list(&self) -> Result<Vec<Record>, Error>;

    /// Creates a record from the given fields.
    ///
    /// Returns the created record when the backend echoes it back.
    async fn create(&self, fields: Record) -> Result<Option<Record>, Error>;

    /// Updates the record named by the `id` field of `record` with its
    /// remaining fields.
    async fn update(&self, record: Record) -> Result<Option<Record>, Error>;

    /// Deletes the record with the given id.
    async fn delete(&self, id: &str) -> Result<(), Error>;
}

/// Returns the id of an update payload, or a validation error naming `id`.
pub(crate) fn require_id(record: &Record) -> Result<String, Error> {
    match record.id() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(Error::validation(ID_FIELD, "update requires an id")),
    }
}

/// Conforms every record to the entity schema, collecting all failures.
///
/// Field names in the failures are prefixed with the record id so the caller
/// can tell which row was malformed.
pub(crate) fn conform_all(entity: EntityKind, records: Vec<Record>) -> Result<Vec<Record>, Error> {
    let mut typed = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for record in records {
        let id = record.id().unwrap_or("?").to_string();
        match entity.conform(record) {
            Ok(record) => typed.push(record),
            Err(failures) => errors.extend(failures.into_iter().map(|f| {
                FieldValidationError::new(format!("{}[{}].{}", entity, id, f.field), f.message)
            })),
        }
    }

    if errors.is_empty() {
        Ok(typed)
    } else {
        Err(Error::Validation(errors))
    }
}

/// Conforms listed records without failing the load.
///
/// A malformed row is kept with its bad fields cleared so it can still be
/// opened, fixed or deleted. Rows without a usable id are dropped.
pub(crate) fn conform_listed(entity: EntityKind, records: Vec<Record>) -> Vec<Record> {
    let mut typed = Vec::with_capacity(records.len());

    for record in records {
        let id = record.id().unwrap_or("?").to_string();
        let (record, failures) = entity.conform_partial(record);

        for failure in &failures {
            log::warn!("{}[{}].{}: {}", entity, id, failure.field, failure.message);
        }

        if record.id().is_some_and(|id| !id.is_empty()) {
            typed.push(record);
        } else {
            log::warn!("Skipping {} record without an id", entity);
        }
    }

    typed
}
