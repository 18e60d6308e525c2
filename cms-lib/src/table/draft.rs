//! In-progress form state

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::Utc;

use super::TableConfig;
use crate::error::Error;
use crate::error::FieldValidationError;
use crate::model::FieldKind;
use crate::model::FieldSpec;
use crate::model::Record;
use crate::model::Value;
use crate::model::parse_datetime;

/// Format of a `datetime-local` input value.
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// The not-yet-submitted fields of a create or edit form.
///
/// Raw text typed into a control goes through [`Draft::set_input`], which
/// parses it according to the field kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    record: Record,
}

impl Draft {
    /// An empty draft, as used when creating.
    pub fn new() -> Self {
        Self::default()
    }

    /// A draft seeded from an existing record, minus its system fields.
    pub fn from_record(record: &Record) -> Self {
        Self {
            record: record.without_system_fields(),
        }
    }

    /// The draft's current fields.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Current value of a field, null when unset.
    pub fn value(&self, key: &str) -> &Value {
        self.record.value(key)
    }

    /// Stores an already typed value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.record.insert(key, value);
    }

    /// Parses raw control text for `field` and stores the result.
    ///
    /// Empty text clears the field, except for booleans where it means
    /// unchecked.
    pub fn set_input(&mut self, field: &FieldSpec, raw: &str) -> Result<(), Error> {
        let value = parse_input(field, raw)?;
        self.record.insert(field.key.clone(), value);
        Ok(())
    }

    /// Required form fields that hold no value.
    pub fn missing_required(&self, config: &TableConfig, editing: bool) -> Vec<FieldValidationError> {
        config
            .form_fields(editing)
            .filter(|f| f.required && f.key != crate::model::ID_FIELD)
            .filter(|f| self.record.value(&f.key).is_empty())
            .map(|f| FieldValidationError::new(f.key.clone(), format!("{} is required", f.label)))
            .collect()
    }

    /// Consumes the draft, returning its fields.
    pub fn into_record(self) -> Record {
        self.record
    }
}

/// Parses the text of one form control into a typed value.
pub fn parse_input(field: &FieldSpec, raw: &str) -> Result<Value, Error> {
    let text = raw.trim();

    match field.kind {
        FieldKind::Boolean => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| Error::validation(&field.key, format!("'{}' is not a yes/no value", raw))),
        _ if text.is_empty() => Ok(Value::Null),
        FieldKind::Text => Ok(Value::String(raw.to_string())),
        FieldKind::Number => {
            if let Ok(n) = text.parse::<i64>() {
                Ok(Value::Int(n))
            } else {
                text.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Value::Float)
                    .ok_or_else(|| Error::validation(&field.key, format!("'{}' is not a number", text)))
            }
        }
        FieldKind::DateTime => parse_datetime_input(text)
            .map(Value::DateTime)
            .ok_or_else(|| Error::validation(&field.key, format!("'{}' is not a date and time", text))),
        FieldKind::Enum => match field.option(text) {
            Some(option) => Ok(Value::String(option.value.clone())),
            None => {
                let allowed: Vec<&str> = field.options.iter().map(|o| o.value.as_str()).collect();
                Err(Error::validation(
                    &field.key,
                    format!("'{}' is not one of {}", text, allowed.join(", ")),
                ))
            }
        },
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" | "checked" => Some(true),
        "false" | "no" | "n" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Accepts `YYYY-MM-DDTHH:MM` (read as UTC), the same with seconds, or a
/// full ISO-8601 timestamp.
pub fn parse_datetime_input(text: &str) -> Option<DateTime<Utc>> {
    if let Some(dt) = parse_datetime(text) {
        return Some(dt);
    }
    [DATETIME_LOCAL_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp for a `datetime-local` control.
pub fn format_datetime_input(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_LOCAL_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::EntityKind;

    #[test]
    fn test_parse_by_kind() {
        let number = FieldSpec::number("n", "N");
        assert_eq!(parse_input(&number, "42").unwrap(), Value::Int(42));
        assert_eq!(parse_input(&number, "1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse_input(&number, "").unwrap(), Value::Null);
        assert!(parse_input(&number, "abc").is_err());

        let flag = FieldSpec::boolean("b", "B");
        assert_eq!(parse_input(&flag, "yes").unwrap(), Value::Bool(true));
        assert_eq!(parse_input(&flag, "").unwrap(), Value::Bool(false));
        assert!(parse_input(&flag, "maybe").is_err());

        let text = FieldSpec::text("t", "T");
        assert_eq!(parse_input(&text, "").unwrap(), Value::Null);
        assert_eq!(parse_input(&text, "#FF6B6B").unwrap(), Value::from("#FF6B6B"));
    }

    #[test]
    fn test_enum_membership() {
        let role = FieldSpec::enumeration("role", "Role", ["USER", "ADMIN"]);
        assert_eq!(parse_input(&role, "ADMIN").unwrap(), Value::from("ADMIN"));

        let err = parse_input(&role, "ROOT").unwrap_err();
        assert_eq!(err.validation_errors()[0].field, "role");
    }

    #[test]
    fn test_datetime_local_is_utc() {
        let at = FieldSpec::datetime("publishedAt", "Published");
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();

        assert_eq!(parse_input(&at, "2024-03-05T14:30").unwrap(), Value::DateTime(expected));
        assert_eq!(
            parse_input(&at, "2024-03-05T16:30:00+02:00").unwrap(),
            Value::DateTime(expected)
        );
        assert_eq!(format_datetime_input(&expected), "2024-03-05T14:30");
    }

    #[test]
    fn test_from_record_drops_system_fields() {
        let record = Record::with_id("abc123")
            .set("name", "Rock")
            .set("createdAt", "2024-01-01T00:00:00.000Z");
        let draft = Draft::from_record(&record);
        assert_eq!(draft.record(), &Record::new().set("name", "Rock"));
    }

    #[test]
    fn test_missing_required() {
        let config = TableConfig::for_entity(EntityKind::Tag).unwrap();
        let mut draft = Draft::new();
        draft.set("name", "Rock");
        draft.set("slug", "");

        let missing = draft.missing_required(&config, false);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field, "slug");
    }
}
