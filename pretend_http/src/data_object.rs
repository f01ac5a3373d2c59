use std::ops::Index;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::errors::Result;

static NULL: Value = Value::Null;

/// Top-level keys of a JSON object response
///
/// Only the outer object is mapped; nested objects and arrays stay as
/// [`serde_json::Value`]. Responses that are not JSON objects fail to decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataObject {
    fields: Map<String, Value>,
}

impl DataObject {
    /// Decode a response body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }

    /// Convert into a typed response for callers that know the schema
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

impl From<Map<String, Value>> for DataObject {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Absent keys index to `Value::Null`, like `serde_json::Value` does
impl Index<&str> for DataObject {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a DataObject {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
