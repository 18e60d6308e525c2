//! Table configuration

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::model::EntityKind;
use crate::model::EnumOption;
use crate::model::FieldKind;
use crate::model::FieldSpec;
use crate::model::ID_FIELD;
use crate::model::is_timestamp_field;

/// Everything a [`GenericRecordTable`](super::GenericRecordTable) needs to
/// know about the entity it shows.
///
/// Built per page through [`TableConfig::builder`]; construction checks the
/// field list against the entity schema.
///
/// # Example
///
/// ```
/// use cms_lib::model::{EntityKind, FieldSpec};
/// use cms_lib::table::TableConfig;
///
/// let config = TableConfig::builder(EntityKind::Tag, "Tags")
///     .field(FieldSpec::text("name", "Name").required())
///     .field(FieldSpec::text("slug", "Slug").required())
///     .search(["name", "slug"])
///     .build()
///     .unwrap();
///
/// assert_eq!(config.model_name(), "Tag");
/// assert_eq!(config.record_label(), "Tag");
/// ```
#[derive(Debug, Clone)]
pub struct TableConfig {
    entity: EntityKind,
    title: String,
    fields: Vec<FieldSpec>,
    search_fields: Vec<String>,
}

impl TableConfig {
    /// Starts a configuration for `entity` with a page title.
    pub fn builder(entity: EntityKind, title: impl Into<String>) -> TableConfigBuilder {
        TableConfigBuilder {
            entity,
            title: title.into(),
            fields: Vec::new(),
            search_fields: Vec::new(),
        }
    }

    /// The bound entity.
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// The bound model's name.
    pub fn model_name(&self) -> &'static str {
        self.entity.model_name()
    }

    /// Page title, e.g. "Categories".
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Singular form of the title used in form headings, e.g. "Category".
    pub fn record_label(&self) -> String {
        let title = self.title.as_str();
        if let Some(stem) = title.strip_suffix("ies") {
            format!("{}y", stem)
        } else if let Some(stem) = title.strip_suffix('s') {
            stem.to_string()
        } else {
            title.to_string()
        }
    }

    /// Columns in display order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a column by key.
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Keys matched by the search box.
    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    /// Fields shown in the edit form.
    ///
    /// Timestamps are never editable; `id` is listed only when editing an
    /// existing record.
    pub fn form_fields(&self, editing: bool) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(move |f| !is_timestamp_field(&f.key) && (editing || f.key != ID_FIELD))
    }
}

/// Builder for [`TableConfig`].
pub struct TableConfigBuilder {
    entity: EntityKind,
    title: String,
    fields: Vec<FieldSpec>,
    search_fields: Vec<String>,
}

impl TableConfigBuilder {
    /// Appends a column.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the searchable keys.
    pub fn search<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and builds the configuration.
    ///
    /// Fields the entity does not have are dropped with a warning, and so are
    /// search keys naming them. Enum fields without options take the schema's
    /// members.
    pub fn build(self) -> Result<TableConfig, ConfigError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for mut field in self.fields {
            if !seen.insert(field.key.clone()) {
                return Err(ConfigError::DuplicateField(field.key));
            }

            if !self.entity.has_field(&field.key) {
                log::warn!(
                    "Ignoring field '{}': {} has no such attribute",
                    field.key,
                    self.entity
                );
                continue;
            }

            if field.kind == FieldKind::Enum && field.options.is_empty() {
                let members = self
                    .entity
                    .attribute(&field.key)
                    .map(|a| a.values)
                    .unwrap_or_default();
                if members.is_empty() {
                    return Err(ConfigError::MissingOptions(field.key));
                }
                field.options = members.iter().map(|m| EnumOption::from(*m)).collect();
            }

            fields.push(field);
        }

        let mut search_fields = Vec::with_capacity(self.search_fields.len());
        for key in self.search_fields {
            if fields.iter().any(|f| f.key == key) {
                search_fields.push(key);
            } else if seen.contains(&key) {
                log::warn!("Ignoring search key '{}': field was dropped", key);
            } else {
                return Err(ConfigError::UnknownSearchField(key));
            }
        }

        Ok(TableConfig {
            entity: self.entity,
            title: self.title,
            fields,
            search_fields,
        })
    }
}
