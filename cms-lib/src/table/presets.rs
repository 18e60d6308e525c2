//! Built-in table configurations for each registered entity

use super::TableConfig;
use crate::error::ConfigError;
use crate::model::EntityKind;
use crate::model::FieldSpec;
use crate::model::Value;

/// Shown for empty values.
pub const PLACEHOLDER: &str = "-";

fn flag(value: &Value, on: &str, off: &str) -> String {
    match value {
        Value::Bool(true) => on.to_string(),
        _ => off.to_string(),
    }
}

/// First 100 characters of long text followed by an ellipsis.
fn excerpt(value: &Value) -> String {
    match value.as_str() {
        Some(s) if !s.is_empty() => {
            let head: String = s.chars().take(100).collect();
            format!("{}...", head)
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Status pill: the enum member in brackets.
fn badge(value: &Value) -> String {
    match value.as_str() {
        Some(s) if !s.is_empty() => format!("[{}]", s),
        _ => PLACEHOLDER.to_string(),
    }
}

fn id() -> FieldSpec {
    FieldSpec::text("id", "ID")
}

fn created() -> FieldSpec {
    FieldSpec::datetime("createdAt", "Created")
}

fn updated() -> FieldSpec {
    FieldSpec::datetime("updatedAt", "Updated")
}

impl TableConfig {
    /// The configuration the admin page for `entity` uses.
    pub fn for_entity(entity: EntityKind) -> Result<TableConfig, ConfigError> {
        let builder = match entity {
            EntityKind::User => TableConfig::builder(entity, "Users")
                .field(id())
                .field(FieldSpec::text("email", "Email").required())
                .field(FieldSpec::text("firstName", "First Name"))
                .field(FieldSpec::text("lastName", "Last Name"))
                .field(FieldSpec::enumeration("role", "Role", ["USER", "ADMIN", "SUPER_ADMIN"]))
                .field(
                    FieldSpec::boolean("isActive", "Active")
                        .render(|v, _| flag(v, "✅ Active", "❌ Inactive")),
                )
                .field(FieldSpec::datetime("lastLoginAt", "Last Login"))
                .field(created())
                .search(["email", "firstName", "lastName"]),

            EntityKind::Post => TableConfig::builder(entity, "Posts")
                .field(id())
                .field(FieldSpec::text("title", "Title").required())
                .field(FieldSpec::text("content", "Content").render(|v, _| excerpt(v)))
                .field(
                    FieldSpec::enumeration("status", "Status", ["DRAFT", "PUBLISHED", "ARCHIVED"])
                        .render(|v, _| badge(v)),
                )
                .field(FieldSpec::datetime("publishedAt", "Published"))
                .field(created())
                .search(["title", "content"]),

            EntityKind::Category => TableConfig::builder(entity, "Categories")
                .field(id())
                .field(FieldSpec::text("name", "Name").required())
                .field(FieldSpec::text("slug", "Slug").required())
                .field(FieldSpec::text("description", "Description"))
                .field(FieldSpec::boolean("isActive", "Active"))
                .field(created())
                .search(["name", "slug", "description"]),

            EntityKind::Tag => TableConfig::builder(entity, "Tags")
                .field(id())
                .field(FieldSpec::text("name", "Name").required())
                .field(FieldSpec::text("slug", "Slug").required())
                .field(FieldSpec::text("color", "Color").render(|v, _| match v.as_str() {
                    Some(c) if !c.is_empty() => format!("● {}", c),
                    _ => PLACEHOLDER.to_string(),
                }))
                .field(created())
                .search(["name", "slug"]),

            EntityKind::PostTag => TableConfig::builder(entity, "Post Tags")
                .field(id())
                .field(FieldSpec::text("postId", "Post ID").required())
                .field(FieldSpec::text("tagId", "Tag ID").required())
                .field(created())
                .field(updated())
                .search(["postId", "tagId"]),

            EntityKind::PostCategory => TableConfig::builder(entity, "Post Categories")
                .field(id())
                .field(FieldSpec::text("postId", "Post ID").required())
                .field(FieldSpec::text("categoryId", "Category ID").required())
                .field(created())
                .field(updated())
                .search(["postId", "categoryId"]),

            EntityKind::Setting => TableConfig::builder(entity, "Settings")
                .field(id())
                .field(FieldSpec::text("key", "Key").required())
                .field(FieldSpec::text("value", "Value"))
                .field(FieldSpec::enumeration("type", "Type", ["STRING", "NUMBER", "BOOLEAN", "JSON"]))
                .field(FieldSpec::text("description", "Description"))
                .field(
                    FieldSpec::boolean("isPublic", "Public")
                        .render(|v, _| flag(v, "🌐 Public", "🔒 Private")),
                )
                .field(created())
                .search(["key", "description"]),

            EntityKind::Todo => TableConfig::builder(entity, "Todos")
                .field(id())
                .field(FieldSpec::text("content", "Content").required())
                .field(
                    FieldSpec::boolean("isDone", "Completed")
                        .render(|v, _| flag(v, "✅ Done", "⏳ Pending")),
                )
                .field(created())
                .field(updated())
                .search(["content"]),
        };

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    #[test]
    fn test_every_entity_has_a_preset() {
        for entity in EntityKind::ALL {
            let config = TableConfig::for_entity(entity).unwrap();
            assert_eq!(config.entity(), entity);
            assert!(!config.search_fields().is_empty());
            assert_eq!(config.fields()[0].key, "id");
        }
    }

    #[test]
    fn test_user_active_render() {
        let config = TableConfig::for_entity(EntityKind::User).unwrap();
        let field = config.field("isActive").unwrap();
        let render = field.render.as_ref().unwrap();
        let record = Record::new();

        assert_eq!(render(&Value::Bool(true), &record), "✅ Active");
        assert_eq!(render(&Value::Bool(false), &record), "❌ Inactive");
        assert_eq!(render(&Value::Null, &record), "❌ Inactive");
    }

    #[test]
    fn test_post_status_badge() {
        let config = TableConfig::for_entity(EntityKind::Post).unwrap();
        let render = config.field("status").unwrap().render.as_ref().unwrap();
        let record = Record::new();

        assert_eq!(render(&Value::from("PUBLISHED"), &record), "[PUBLISHED]");
        assert_eq!(render(&Value::Null, &record), PLACEHOLDER);
    }

    #[test]
    fn test_post_content_excerpt() {
        let long = "x".repeat(150);
        assert_eq!(excerpt(&Value::from(long.as_str())), format!("{}...", "x".repeat(100)));
        assert_eq!(excerpt(&Value::Null), PLACEHOLDER);
    }
}
