//! Entity registry
//!
//! The closed set of models the data API exposes, with the attribute schema
//! each one carries. Records coming from the API are conformed to this schema
//! before anything else sees them.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;

use super::CREATED_AT_FIELD;
use super::FieldKind;
use super::ID_FIELD;
use super::Record;
use super::UPDATED_AT_FIELD;
use super::Value;
use crate::error::ConfigError;
use crate::error::FieldValidationError;

/// One attribute of an entity's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as the API spells it.
    pub name: &'static str,
    /// Value kind.
    pub kind: FieldKind,
    /// Whether the schema marks the attribute required.
    pub required: bool,
    /// Allowed members for enum attributes.
    pub values: &'static [&'static str],
}

impl Attribute {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            values: &[],
        }
    }

    const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    const fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    const fn enumeration(name: &'static str, values: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Enum,
            required: false,
            values,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

const USER_ROLES: &[&str] = &["USER", "ADMIN", "SUPER_ADMIN"];
const POST_STATUSES: &[&str] = &["DRAFT", "PUBLISHED", "ARCHIVED"];
const SETTING_TYPES: &[&str] = &["STRING", "NUMBER", "BOOLEAN", "JSON"];

const USER: &[Attribute] = &[
    Attribute::text("email").required(),
    Attribute::text("firstName"),
    Attribute::text("lastName"),
    Attribute::enumeration("role", USER_ROLES),
    Attribute::boolean("isActive"),
    Attribute::datetime("lastLoginAt"),
];

const POST: &[Attribute] = &[
    Attribute::text("title").required(),
    Attribute::text("content"),
    Attribute::text("excerpt"),
    Attribute::enumeration("status", POST_STATUSES),
    Attribute::datetime("publishedAt"),
    Attribute::text("authorId"),
];

const CATEGORY: &[Attribute] = &[
    Attribute::text("name").required(),
    Attribute::text("slug").required(),
    Attribute::text("description"),
    Attribute::text("parentId"),
    Attribute::boolean("isActive"),
];

const TAG: &[Attribute] = &[
    Attribute::text("name").required(),
    Attribute::text("slug").required(),
    Attribute::text("color"),
];

const POST_TAG: &[Attribute] = &[
    Attribute::text("postId").required(),
    Attribute::text("tagId").required(),
];

const POST_CATEGORY: &[Attribute] = &[
    Attribute::text("postId").required(),
    Attribute::text("categoryId").required(),
];

const SETTING: &[Attribute] = &[
    Attribute::text("key").required(),
    Attribute::text("value"),
    Attribute::enumeration("type", SETTING_TYPES),
    Attribute::text("description"),
    Attribute::boolean("isPublic"),
];

const TODO: &[Attribute] = &[Attribute::text("content"), Attribute::boolean("isDone")];

/// A model exposed by the data API.
///
/// # Example
///
/// ```
/// use cms_lib::model::EntityKind;
///
/// let kind: EntityKind = "post-categories".parse().unwrap();
/// assert_eq!(kind, EntityKind::PostCategory);
/// assert_eq!(kind.list_field(), "listPostCategories");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Post,
    Category,
    Tag,
    PostTag,
    PostCategory,
    Setting,
    Todo,
}

impl EntityKind {
    /// Every registered entity, in admin navigation order.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::Post,
        EntityKind::Category,
        EntityKind::Tag,
        EntityKind::PostTag,
        EntityKind::PostCategory,
        EntityKind::Setting,
        EntityKind::Todo,
    ];

    /// Model name as declared in the backend schema.
    pub fn model_name(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Post => "Post",
            EntityKind::Category => "Category",
            EntityKind::Tag => "Tag",
            EntityKind::PostTag => "PostTag",
            EntityKind::PostCategory => "PostCategory",
            EntityKind::Setting => "Setting",
            EntityKind::Todo => "Todo",
        }
    }

    /// Plural form used by the generated list query.
    pub fn plural_name(&self) -> &'static str {
        match self {
            EntityKind::User => "Users",
            EntityKind::Post => "Posts",
            EntityKind::Category => "Categories",
            EntityKind::Tag => "Tags",
            EntityKind::PostTag => "PostTags",
            EntityKind::PostCategory => "PostCategories",
            EntityKind::Setting => "Settings",
            EntityKind::Todo => "Todos",
        }
    }

    /// Schema attributes, excluding `id` and the timestamps.
    pub fn attributes(&self) -> &'static [Attribute] {
        match self {
            EntityKind::User => USER,
            EntityKind::Post => POST,
            EntityKind::Category => CATEGORY,
            EntityKind::Tag => TAG,
            EntityKind::PostTag => POST_TAG,
            EntityKind::PostCategory => POST_CATEGORY,
            EntityKind::Setting => SETTING,
            EntityKind::Todo => TODO,
        }
    }

    /// Looks up a schema attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&'static Attribute> {
        self.attributes().iter().find(|a| a.name == name)
    }

    /// Returns `true` if `key` names an attribute or a system field.
    pub fn has_field(&self, key: &str) -> bool {
        key == ID_FIELD
            || key == CREATED_AT_FIELD
            || key == UPDATED_AT_FIELD
            || self.attribute(key).is_some()
    }

    /// Name of the list query field, e.g. `listTags`.
    pub fn list_field(&self) -> String {
        format!("list{}", self.plural_name())
    }

    /// Name of the create mutation field, e.g. `createTag`.
    pub fn create_field(&self) -> String {
        format!("create{}", self.model_name())
    }

    /// Name of the update mutation field, e.g. `updateTag`.
    pub fn update_field(&self) -> String {
        format!("update{}", self.model_name())
    }

    /// Name of the delete mutation field, e.g. `deleteTag`.
    pub fn delete_field(&self) -> String {
        format!("delete{}", self.model_name())
    }

    /// Field names selected on every read: `id`, attributes, timestamps.
    pub fn selection(&self) -> Vec<&'static str> {
        let mut fields = vec![ID_FIELD];
        fields.extend(self.attributes().iter().map(|a| a.name));
        fields.push(CREATED_AT_FIELD);
        fields.push(UPDATED_AT_FIELD);
        fields
    }

    /// Types a raw record against this entity's schema.
    ///
    /// Timestamps are parsed from ISO-8601 strings, scalars are checked against
    /// the attribute kind and enum members against the allowed set. Keys the
    /// schema does not know are kept untouched.
    pub fn conform(&self, record: Record) -> Result<Record, Vec<FieldValidationError>> {
        let (typed, errors) = self.conform_partial(record);
        if errors.is_empty() {
            Ok(typed)
        } else {
            Err(errors)
        }
    }

    /// Like [`conform`](Self::conform), but always returns the record. Fields
    /// that fail to conform are set to null and reported alongside.
    pub fn conform_partial(&self, record: Record) -> (Record, Vec<FieldValidationError>) {
        let mut errors = Vec::new();
        let mut typed = Record::new();

        for (key, value) in record.fields {
            let kind = match key.as_str() {
                ID_FIELD => None,
                CREATED_AT_FIELD | UPDATED_AT_FIELD => Some(FieldKind::DateTime),
                other => self.attribute(other).map(|a| a.kind),
            };

            let result = match (key.as_str(), kind) {
                (ID_FIELD, _) => {
                    if value.as_str().is_some_and(|s| !s.is_empty()) {
                        Ok(value)
                    } else {
                        Err(format!("expected non-empty string id, got {}", value.type_name()))
                    }
                }
                (_, Some(kind)) => coerce(self.attribute(&key), kind, value),
                (_, None) => Ok(value),
            };

            match result {
                Ok(value) => {
                    typed.insert(key, value);
                }
                Err(message) => {
                    errors.push(FieldValidationError::new(key.clone(), message));
                    typed.insert(key, Value::Null);
                }
            }
        }

        (typed, errors)
    }
}

/// Coerces one value to a field kind. Null is accepted for every kind.
pub(crate) fn coerce(
    attribute: Option<&Attribute>,
    kind: FieldKind,
    value: Value,
) -> Result<Value, String> {
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldKind::Text, Value::String(s)) => Ok(Value::String(s)),
        (FieldKind::Number, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (FieldKind::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
        (FieldKind::DateTime, Value::DateTime(dt)) => Ok(Value::DateTime(dt)),
        (FieldKind::DateTime, Value::String(s)) => parse_datetime(&s)
            .map(Value::DateTime)
            .ok_or_else(|| format!("invalid datetime '{}'", s)),
        (FieldKind::Enum, Value::String(s)) => match attribute {
            Some(a) if !a.values.is_empty() && !a.values.contains(&s.as_str()) => {
                Err(format!("'{}' is not one of {}", s, a.values.join(", ")))
            }
            _ => Ok(Value::String(s)),
        },
        (kind, other) => Err(format!("expected {}, got {}", kind, other.type_name())),
    }
}

/// Parses an ISO-8601 timestamp with offset into UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

impl FromStr for EntityKind {
    type Err = ConfigError;

    /// Accepts model names, plurals and route slugs (`Tag`, `tags`, `post-tags`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        EntityKind::ALL
            .into_iter()
            .find(|kind| {
                kind.model_name().to_ascii_lowercase() == normalized
                    || kind.plural_name().to_ascii_lowercase() == normalized
            })
            .ok_or_else(|| ConfigError::UnknownEntity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_names_and_slugs() {
        assert_eq!("Tag".parse::<EntityKind>().unwrap(), EntityKind::Tag);
        assert_eq!("users".parse::<EntityKind>().unwrap(), EntityKind::User);
        assert_eq!("post-tags".parse::<EntityKind>().unwrap(), EntityKind::PostTag);
        assert_eq!("categories".parse::<EntityKind>().unwrap(), EntityKind::Category);
        assert!(matches!(
            "widgets".parse::<EntityKind>(),
            Err(ConfigError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(EntityKind::Category.list_field(), "listCategories");
        assert_eq!(EntityKind::Tag.create_field(), "createTag");
        assert_eq!(EntityKind::PostCategory.update_field(), "updatePostCategory");
        assert_eq!(EntityKind::Todo.delete_field(), "deleteTodo");
    }

    #[test]
    fn test_selection_brackets_attributes() {
        let selection = EntityKind::Tag.selection();
        assert_eq!(
            selection,
            vec!["id", "name", "slug", "color", "createdAt", "updatedAt"]
        );
    }

    #[test]
    fn test_conform_parses_timestamps() {
        let raw = Record::with_id("p1")
            .set("title", "Hello")
            .set("publishedAt", "2024-03-05T14:30:00.000Z")
            .set("createdAt", "2024-03-01T08:00:00Z")
            .set("owner", "someone");

        let typed = EntityKind::Post.conform(raw).unwrap();

        assert_eq!(
            typed.get_datetime("publishedAt").unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap())
        );
        assert!(typed.created_at().is_some());
        assert_eq!(typed.get_string("owner").unwrap(), Some("someone"));
    }

    #[test]
    fn test_conform_rejects_bad_values() {
        let raw = Record::with_id("u1")
            .set("email", "a@b.c")
            .set("role", "ROOT")
            .set("isActive", "yes");

        let errors = EntityKind::User.conform(raw).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(errors.len(), 2);
        assert!(fields.contains(&"role"));
        assert!(fields.contains(&"isActive"));
    }

    #[test]
    fn test_conform_partial_nulls_bad_fields() {
        let raw = Record::with_id("u1").set("email", "a@b.c").set("role", "ROOT");

        let (typed, errors) = EntityKind::User.conform_partial(raw);

        assert_eq!(errors.len(), 1);
        assert_eq!(typed.id(), Some("u1"));
        assert_eq!(typed.get_string("email").unwrap(), Some("a@b.c"));
        assert!(typed.get("role").is_some_and(|v| v.is_null()));
    }

    #[test]
    fn test_conform_rejects_empty_id() {
        let errors = EntityKind::Tag.conform(Record::with_id("")).unwrap_err();
        assert_eq!(errors[0].field, "id");
    }
}
