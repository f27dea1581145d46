use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document held by the remote store.
///
/// `data` is the document body as a JSON object; `id` is assigned by the
/// store and is not part of the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Extract a string value from `data` using a JSON pointer (e.g., "/role").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.data.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract an integer value from `data` using a JSON pointer.
    pub fn get_i64(&self, pointer: &str) -> Option<i64> {
        self.data.pointer(pointer).and_then(|v| v.as_i64())
    }

    /// Whether the top-level `field` equals `value`.
    #[must_use]
    pub fn field_equals(&self, field: &str, value: &Value) -> bool {
        self.data.get(field) == Some(value)
    }

    /// Decodes the body into `T`, exposing the document id as an `id` field
    /// unless the body already carries one.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.entry("id")
                .or_insert_with(|| Value::String(self.id.clone()));
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Encodes `value` as a document body. A top-level `id` is removed since
    /// the store owns document ids.
    pub fn encode<T: Serialize>(value: &T) -> Result<Value> {
        let mut data = serde_json::to_value(value)?;
        if let Value::Object(map) = &mut data {
            map.remove("id");
        }
        Ok(data)
    }
}
