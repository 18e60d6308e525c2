//! Field descriptions for table columns and form inputs

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::Record;
use super::Value;

/// The kind of value a field holds, which drives display and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Integer or floating point number.
    Number,
    /// True/false flag.
    Boolean,
    /// Timestamp.
    DateTime,
    /// One of a fixed set of values.
    Enum,
}

impl FieldKind {
    /// Returns the lowercase name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "datetime",
            FieldKind::Enum => "enum",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(FieldKind::Text),
            "number" => Ok(FieldKind::Number),
            "boolean" | "bool" => Ok(FieldKind::Boolean),
            "datetime" => Ok(FieldKind::DateTime),
            "enum" | "select" => Ok(FieldKind::Enum),
            other => Err(format!("unknown field kind '{}'", other)),
        }
    }
}

/// One selectable member of an enum field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumOption {
    /// Value stored in the record.
    pub value: String,
    /// Text shown in the select control.
    pub label: String,
}

impl EnumOption {
    /// Creates an option with a distinct label.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<&str> for EnumOption {
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

/// Caller-supplied display formatter. Receives the field value and its record.
pub type RenderFn = Arc<dyn Fn(&Value, &Record) -> String + Send + Sync>;

/// Configuration describing how one record attribute is displayed and edited.
///
/// # Example
///
/// ```
/// use cms_lib::model::{FieldKind, FieldSpec};
///
/// let status = FieldSpec::enumeration("status", "Status", ["DRAFT", "PUBLISHED"]);
/// let name = FieldSpec::text("name", "Name").required();
///
/// assert_eq!(status.kind, FieldKind::Enum);
/// assert!(name.required);
/// ```
#[derive(Clone)]
pub struct FieldSpec {
    /// Record attribute this field reads and writes.
    pub key: String,
    /// Column header and form label.
    pub label: String,
    /// Kind of value held.
    pub kind: FieldKind,
    /// Whether the form requires a value before submit.
    pub required: bool,
    /// Ordered options for enum fields.
    pub options: Vec<EnumOption>,
    /// Display override. Always wins over the kind's default rendering.
    pub render: Option<RenderFn>,
}

impl FieldSpec {
    /// Creates a field of the given kind.
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            options: Vec::new(),
            render: None,
        }
    }

    /// Creates a text field.
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    /// Creates a number field.
    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    /// Creates a boolean field.
    pub fn boolean(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Boolean)
    }

    /// Creates a datetime field.
    pub fn datetime(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::DateTime)
    }

    /// Creates an enum field whose labels equal its values.
    pub fn enumeration<I, O>(key: impl Into<String>, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<EnumOption>,
    {
        let mut field = Self::new(key, label, FieldKind::Enum);
        field.options = options.into_iter().map(Into::into).collect();
        field
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Replaces the enum options.
    pub fn options(mut self, options: Vec<EnumOption>) -> Self {
        self.options = options;
        self
    }

    /// Sets a display override.
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value, &Record) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Returns the option with the given stored value.
    pub fn option(&self, value: &str) -> Option<&EnumOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("options", &self.options)
            .field("render", &self.render.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accepts_legacy_names() {
        assert_eq!("string".parse::<FieldKind>().unwrap(), FieldKind::Text);
        assert_eq!("select".parse::<FieldKind>().unwrap(), FieldKind::Enum);
        assert!("blob".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_render_override_is_called_with_record() {
        let field = FieldSpec::text("color", "Color")
            .render(|value, record| format!("{} on {}", value.to_search_string(), record.id().unwrap_or("?")));
        let record = Record::with_id("t1").set("color", "#FF6B6B");
        let render = field.render.as_ref().unwrap();

        assert_eq!(render(record.value("color"), &record), "#FF6B6B on t1");
    }
}
