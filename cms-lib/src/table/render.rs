//! Cell and form-control rendering

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Local;
use chrono::Offset;
use chrono::Utc;

use super::draft::format_datetime_input;
use super::presets::PLACEHOLDER;
use crate::model::EnumOption;
use crate::model::FieldKind;
use crate::model::FieldSpec;
use crate::model::ID_FIELD;
use crate::model::Record;
use crate::model::Value;

/// Date format used for datetime cells.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Turns field values into display text.
///
/// Dates are shown in a fixed offset, the local one unless configured.
#[derive(Debug, Clone)]
pub struct FieldRenderer {
    offset: FixedOffset,
    date_format: String,
}

impl Default for FieldRenderer {
    fn default() -> Self {
        Self {
            offset: Local::now().offset().fix(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl FieldRenderer {
    /// Renders dates in the given offset with the default format.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Renders dates in UTC.
    pub fn utc() -> Self {
        Self::with_offset(Utc.fix())
    }

    /// Overrides the `strftime` format for datetime cells.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Display text for one cell.
    ///
    /// A caller-supplied `render` always wins. Otherwise booleans become a
    /// yes/no mark, datetimes a date, and everything else its raw text or
    /// [`PLACEHOLDER`] when empty.
    pub fn render_field(&self, field: &FieldSpec, value: &Value, record: &Record) -> String {
        if let Some(render) = &field.render {
            return render(value, record);
        }

        match (field.kind, value) {
            (FieldKind::Boolean, v) => {
                if v.as_bool() == Some(true) {
                    "✅".to_string()
                } else {
                    "❌".to_string()
                }
            }
            (FieldKind::DateTime, v) => self
                .as_timestamp(v)
                .map(|dt| self.format_date(&dt))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            (_, v) if v.is_empty() => PLACEHOLDER.to_string(),
            (_, v) => v.to_search_string(),
        }
    }

    /// Formats a timestamp as a date in the configured offset.
    pub fn format_date(&self, dt: &DateTime<Utc>) -> String {
        dt.with_timezone(&self.offset)
            .format(&self.date_format)
            .to_string()
    }

    fn as_timestamp(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::DateTime(dt) => Some(*dt),
            Value::String(s) => crate::model::parse_datetime(s),
            _ => None,
        }
    }

    /// Describes the form control for one field.
    ///
    /// `id` is read-only while editing.
    pub fn render_input(&self, field: &FieldSpec, value: &Value, editing: bool) -> InputControl {
        let widget = match field.kind {
            FieldKind::Boolean => InputWidget::Checkbox {
                checked: value.as_bool().unwrap_or(false),
            },
            FieldKind::Enum => {
                let mut options = Vec::with_capacity(field.options.len() + 1);
                options.push(EnumOption::new("", "Select..."));
                options.extend(field.options.iter().cloned());
                InputWidget::Select {
                    options,
                    selected: value.as_str().unwrap_or_default().to_string(),
                }
            }
            FieldKind::Number => InputWidget::Number {
                value: if value.is_empty() {
                    String::new()
                } else {
                    value.to_search_string()
                },
            },
            FieldKind::DateTime => InputWidget::DateTimeLocal {
                value: self
                    .as_timestamp(value)
                    .map(|dt| format_datetime_input(&dt))
                    .unwrap_or_default(),
            },
            FieldKind::Text => InputWidget::Text {
                value: value.to_search_string(),
            },
        };

        InputControl {
            key: field.key.clone(),
            label: field.label.clone(),
            required: field.required,
            read_only: editing && field.key == ID_FIELD,
            widget,
        }
    }
}

/// One control in the create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct InputControl {
    pub key: String,
    pub label: String,
    pub required: bool,
    pub read_only: bool,
    pub widget: InputWidget,
}

impl InputControl {
    /// Label with a `*` marker for required fields.
    pub fn display_label(&self) -> String {
        if self.required {
            format!("{} *", self.label)
        } else {
            self.label.clone()
        }
    }

    /// Current value as the text a user would see in the control.
    pub fn display_value(&self) -> String {
        match &self.widget {
            InputWidget::Checkbox { checked } => if *checked { "[x]" } else { "[ ]" }.to_string(),
            InputWidget::Select { options, selected } => options
                .iter()
                .find(|o| &o.value == selected)
                .map(|o| o.label.clone())
                .unwrap_or_else(|| selected.clone()),
            InputWidget::Number { value }
            | InputWidget::DateTimeLocal { value }
            | InputWidget::Text { value } => value.clone(),
        }
    }
}

/// Kind of form control and its current state.
#[derive(Debug, Clone, PartialEq)]
pub enum InputWidget {
    Checkbox { checked: bool },
    /// The first option is always the blank "Select..." entry.
    Select { options: Vec<EnumOption>, selected: String },
    Number { value: String },
    /// `YYYY-MM-DDTHH:MM` in UTC.
    DateTimeLocal { value: String },
    Text { value: String },
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_default_cells() {
        let r = FieldRenderer::utc();
        let record = Record::new();

        assert_eq!(r.render_field(&FieldSpec::boolean("b", "B"), &Value::Bool(true), &record), "✅");
        assert_eq!(r.render_field(&FieldSpec::boolean("b", "B"), &Value::Null, &record), "❌");
        assert_eq!(r.render_field(&FieldSpec::text("t", "T"), &Value::Null, &record), "-");
        assert_eq!(r.render_field(&FieldSpec::text("t", "T"), &Value::from(""), &record), "-");
        assert_eq!(r.render_field(&FieldSpec::number("n", "N"), &Value::Int(7), &record), "7");

        let status = FieldSpec::enumeration("status", "Status", ["DRAFT"]);
        assert_eq!(r.render_field(&status, &Value::from("DRAFT"), &record), "DRAFT");
        assert_eq!(r.render_field(&status, &Value::Null, &record), "-");
    }

    #[test]
    fn test_datetime_cells() {
        let at = FieldSpec::datetime("createdAt", "Created");
        let dt = Utc.with_ymd_and_hms(2024, 1, 31, 23, 30, 0).unwrap();
        let record = Record::new();

        assert_eq!(FieldRenderer::utc().render_field(&at, &Value::DateTime(dt), &record), "2024-01-31");

        let east = FieldRenderer::with_offset(FixedOffset::east_opt(3600).unwrap());
        assert_eq!(east.render_field(&at, &Value::DateTime(dt), &record), "2024-02-01");
        assert_eq!(east.render_field(&at, &Value::Null, &record), "-");
    }

    #[test]
    fn test_render_override_wins() {
        let color = FieldSpec::text("color", "Color").render(|v, _| format!("● {}", v.to_search_string()));
        let out = FieldRenderer::utc().render_field(&color, &Value::from("#FF6B6B"), &Record::new());
        assert_eq!(out, "● #FF6B6B");
    }

    #[test]
    fn test_input_widgets() {
        let r = FieldRenderer::utc();

        let select = r.render_input(
            &FieldSpec::enumeration("role", "Role", ["USER", "ADMIN"]),
            &Value::Null,
            false,
        );
        match select.widget {
            InputWidget::Select { options, selected } => {
                assert_eq!(options[0], EnumOption::new("", "Select..."));
                assert_eq!(options.len(), 3);
                assert_eq!(selected, "");
            }
            other => panic!("unexpected widget {:?}", other),
        }

        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 59).unwrap();
        let local = r.render_input(&FieldSpec::datetime("at", "At"), &Value::DateTime(dt), false);
        assert_eq!(local.widget, InputWidget::DateTimeLocal { value: "2024-03-05T14:30".into() });

        let id = FieldSpec::text("id", "ID");
        assert!(r.render_input(&id, &Value::from("abc123"), true).read_only);
        assert!(!r.render_input(&id, &Value::Null, false).read_only);
    }

    #[test]
    fn test_required_label() {
        let control = FieldRenderer::utc().render_input(&FieldSpec::text("name", "Name").required(), &Value::Null, false);
        assert_eq!(control.display_label(), "Name *");
    }
}
