//! In-process backend
//!
//! Serves the same per-model contract as the GraphQL client from memory.
//! Records keep insertion order, ids are random UUIDs and timestamps come
//! from the system clock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::crud::ModelApi;
use super::crud::require_id;
use crate::error::Error;
use crate::error::FieldValidationError;
use crate::model::CREATED_AT_FIELD;
use crate::model::EntityKind;
use crate::model::ID_FIELD;
use crate::model::Record;
use crate::model::UPDATED_AT_FIELD;

/// An in-memory data store for every registered entity.
///
/// Cheap to clone; clones share the same records.
///
/// # Example
///
/// ```
/// use cms_lib::api::MemoryBackend;
/// use cms_lib::model::EntityKind;
///
/// let backend = MemoryBackend::new();
/// let tags = backend.model(EntityKind::Tag);
/// assert_eq!(backend.len(EntityKind::Tag), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<DashMap<EntityKind, Vec<Record>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle bound to one entity.
    pub fn model(&self, entity: EntityKind) -> MemoryModel {
        MemoryModel {
            backend: self.clone(),
            entity,
        }
    }

    /// Returns the number of stored records for `entity`.
    pub fn len(&self, entity: EntityKind) -> usize {
        self.store.get(&entity).map(|r| r.len()).unwrap_or(0)
    }

    /// Returns `true` if no records are stored for `entity`.
    pub fn is_empty(&self, entity: EntityKind) -> bool {
        self.len(entity) == 0
    }

    /// Returns a snapshot of the stored records for `entity`.
    pub fn records(&self, entity: EntityKind) -> Vec<Record> {
        self.store.get(&entity).map(|r| r.clone()).unwrap_or_default()
    }
}

/// CRUD handle for one entity of a [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct MemoryModel {
    backend: MemoryBackend,
    entity: EntityKind,
}

impl MemoryModel {
    fn not_found(&self, id: &str) -> Error {
        Error::NotFound {
            entity: self.entity.model_name().to_string(),
            id: id.to_string(),
        }
    }

    /// Types the incoming fields and checks schema-required attributes.
    fn validate(&self, fields: Record, check_required: bool) -> Result<Record, Error> {
        let typed = self.entity.conform(fields).map_err(Error::Validation)?;

        if check_required {
            let missing: Vec<FieldValidationError> = self
                .entity
                .attributes()
                .iter()
                .filter(|a| a.required && typed.value(a.name).is_empty())
                .map(|a| FieldValidationError::new(a.name, "is required"))
                .collect();
            if !missing.is_empty() {
                return Err(Error::Validation(missing));
            }
        }

        Ok(typed)
    }
}

#[async_trait]
impl ModelApi for MemoryModel {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    async fn list(&self) -> Result<Vec<Record>, Error> {
        Ok(self.backend.records(self.entity))
    }

    async fn create(&self, fields: Record) -> Result<Option<Record>, Error> {
        let mut record = self.validate(fields.without_system_fields(), true)?;
        let now = Utc::now();
        record.insert(ID_FIELD, uuid::Uuid::new_v4().to_string());
        record.insert(CREATED_AT_FIELD, now);
        record.insert(UPDATED_AT_FIELD, now);

        self.backend
            .store
            .entry(self.entity)
            .or_default()
            .push(record.clone());

        log::debug!("Created {} {}", self.entity, record.id().unwrap_or_default());
        Ok(Some(record))
    }

    async fn update(&self, record: Record) -> Result<Option<Record>, Error> {
        let id = require_id(&record)?;
        let changes = self.validate(record.without_system_fields(), false)?;

        let mut records = self.backend.store.entry(self.entity).or_default();
        let existing = records
            .iter_mut()
            .find(|r| r.id() == Some(id.as_str()))
            .ok_or_else(|| self.not_found(&id))?;

        existing.merge(&changes);
        existing.insert(UPDATED_AT_FIELD, Utc::now());

        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let mut records = self.backend.store.entry(self.entity).or_default();
        let index = records
            .iter()
            .position(|r| r.id() == Some(id))
            .ok_or_else(|| self.not_found(id))?;
        records.remove(index);
        Ok(())
    }
}
