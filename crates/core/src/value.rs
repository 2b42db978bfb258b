//! Node payload values.
//!
//! Payloads are decoded from JSON into a closed set of shapes. Objects and
//! nulls are rejected at decode time; nothing else can appear at runtime.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A scalar or an ordered sequence of values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
}

/// Why a JSON value could not be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeError {
    Null,
    Object,
    Number,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::Null => write!(f, "null is not a payload value"),
            ShapeError::Object => write!(f, "objects are not payload values"),
            ShapeError::Number => write!(f, "number is not representable"),
        }
    }
}

impl Value {
    /// Decodes a JSON value, recursing into arrays.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ShapeError> {
        match value {
            serde_json::Value::Bool(flag) => Ok(Value::Bool(*flag)),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Ok(Value::Int(int))
                } else if let Some(float) = number.as_f64() {
                    Ok(Value::Float(float))
                } else {
                    Err(ShapeError::Number)
                }
            }
            serde_json::Value::String(text) => Ok(Value::String(text.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            serde_json::Value::Null => Err(ShapeError::Null),
            serde_json::Value::Object(_) => Err(ShapeError::Object),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(flag) => serde_json::Value::Bool(*flag),
            Value::Int(int) => serde_json::Value::from(*int),
            Value::Float(float) => serde_json::Number::from_f64(*float)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(text) => serde_json::Value::String(text.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Numeric view; ints widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(int) => Some(*int as f64),
            Value::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Int(int) => write!(f, "{int}"),
            Value::Float(float) => write!(f, "{float}"),
            Value::String(text) => write!(f, "{text:?}"),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Key/value data attached to a node by the document's `Data` array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a JSON object, reporting the first key whose value has an unsupported shape.
    pub fn from_json_object(
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, (String, ShapeError)> {
        let mut entries = BTreeMap::new();
        for (key, value) in object {
            let decoded = Value::from_json(value).map_err(|err| (key.clone(), err))?;
            entries.insert(key.clone(), decoded);
        }
        Ok(Self(entries))
    }

    pub fn to_json_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn f32(&self, key: &str) -> Option<f32> {
        self.f64(key).map(|value| value as f32)
    }

    pub fn sequence(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_sequence)
    }

    /// Number of entries in a sequence-valued key, zero when absent.
    pub fn sequence_len(&self, key: &str) -> usize {
        self.sequence(key).map_or(0, <[Value]>::len)
    }

    /// String items of a sequence-valued key; `None` if any item is not a string.
    pub fn strings(&self, key: &str) -> Option<Vec<String>> {
        self.sequence(key)?
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Payload {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_and_nested_arrays_decode() {
        let decoded = Value::from_json(&json!([1, 2.5, "a", true, [false]])).unwrap();
        assert_eq!(
            decoded,
            Value::Sequence(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::String("a".to_string()),
                Value::Bool(true),
                Value::Sequence(vec![Value::Bool(false)]),
            ])
        );
    }

    #[test]
    fn objects_and_nulls_are_rejected() {
        assert_eq!(Value::from_json(&json!({"a": 1})), Err(ShapeError::Object));
        assert_eq!(Value::from_json(&json!(null)), Err(ShapeError::Null));
        assert_eq!(Value::from_json(&json!([1, null])), Err(ShapeError::Null));
    }

    #[test]
    fn payload_reports_offending_key() {
        let object = json!({"text": "hi", "extra": {"nested": true}});
        let err = Payload::from_json_object(object.as_object().unwrap()).unwrap_err();
        assert_eq!(err, ("extra".to_string(), ShapeError::Object));
    }

    #[test]
    fn payload_accessors() {
        let object = json!({"choices": ["a", "b"], "duration": 2, "mixed": ["a", 1]});
        let payload = Payload::from_json_object(object.as_object().unwrap()).unwrap();
        assert_eq!(payload.strings("choices"), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(payload.f32("duration"), Some(2.0));
        assert_eq!(payload.strings("mixed"), None);
        assert_eq!(payload.sequence_len("missing"), 0);
        assert_eq!(payload.to_json_object(), object.as_object().unwrap().clone());
    }
}
