//! Dynamic model record

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;

use super::Value;
use crate::error::FieldError;

/// Key of the platform-assigned identifier.
pub const ID_FIELD: &str = "id";
/// Key of the creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Key of the last-update timestamp.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Keys the platform owns. They are never sent back on create.
pub const SYSTEM_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// Returns `true` if `key` is one of the timestamp fields.
pub fn is_timestamp_field(key: &str) -> bool {
    key == CREATED_AT_FIELD || key == UPDATED_AT_FIELD
}

/// One persisted instance of a model.
///
/// Records hold field values as a `HashMap<String, Value>`, including the
/// platform-owned `id`, `createdAt` and `updatedAt` keys. Typed getter methods
/// provide safe access with proper error handling.
///
/// # Example
///
/// ```
/// use cms_lib::model::Record;
///
/// let record = Record::new()
///     .set("name", "Rock")
///     .set("slug", "rock");
///
/// assert_eq!(record.get_string("name").unwrap(), Some("Rock"));
/// assert_eq!(record.id(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub(crate) fields: HashMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new record with the given ID.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new().set(ID_FIELD, id.into())
    }

    // =========================================================================
    // System fields
    // =========================================================================

    /// Returns the record ID, if set.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Returns the creation timestamp, if present and parsed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.fields.get(CREATED_AT_FIELD).and_then(Value::as_datetime)
    }

    /// Returns the last-update timestamp, if present and parsed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.fields.get(UPDATED_AT_FIELD).and_then(Value::as_datetime)
    }

    /// Removes `id`, `createdAt` and `updatedAt`.
    pub fn strip_system_fields(&mut self) {
        for key in SYSTEM_FIELDS {
            self.fields.remove(key);
        }
    }

    /// Returns a copy without `id`, `createdAt` and `updatedAt`.
    pub fn without_system_fields(&self) -> Self {
        let mut copy = self.clone();
        copy.strip_system_fields();
        copy
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the field value, treating absent fields as null.
    pub fn value(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Null)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Returns the number of fields, system fields included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Copies every field of `other` over this record.
    pub fn merge(&mut self, other: &Record) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is Value::Null.
    // =========================================================================

    /// Gets a string field value.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(field, "string", other.type_name())),
        }
    }

    /// Gets a boolean field value.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", other.type_name())),
        }
    }

    /// Gets an integer field value.
    pub fn get_int(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(FieldError::type_mismatch(field, "int", other.type_name())),
        }
    }

    /// Gets a float field value.
    pub fn get_float(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Float(n)) => Ok(Some(*n)),
            Some(Value::Int(n)) => Ok(Some(*n as f64)), // Allow widening
            Some(other) => Err(FieldError::type_mismatch(field, "float", other.type_name())),
        }
    }

    /// Gets a datetime field value.
    pub fn get_datetime(&self, field: &str) -> Result<Option<DateTime<Utc>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::DateTime(dt)) => Ok(Some(*dt)),
            Some(other) => Err(FieldError::type_mismatch(field, "datetime", other.type_name())),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
