//! Serialization for Record in the data API's JSON shape.
//!
//! ## Write Format
//!
//! Every field serializes under its own key. Timestamps are written in the
//! API's millisecond ISO-8601 form; null values are kept so an update can
//! clear an attribute.
//!
//! ## Read Format
//!
//! Any JSON object deserializes into a record without schema knowledge:
//! scalars map onto the matching [`Value`] variant and nested values fall back
//! to [`Value::Json`]. Typing against an entity schema happens afterwards, see
//! [`EntityKind::conform`](super::EntityKind::conform).

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;

use super::Record;
use super::Value;

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map representing a model record")
    }

    fn visit_map<M>(self, mut map: M) -> Result<Record, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut fields = HashMap::new();

        while let Some(key) = map.next_key::<String>()? {
            let value: serde_json::Value = map.next_value()?;
            // Client-side type tags are not record data
            if key == "__typename" {
                continue;
            }
            fields.insert(key, Value::from_json(value));
        }

        Ok(Record { fields })
    }
}
