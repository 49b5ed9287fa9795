use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};

use crate::db::error::{DbError, Result};

/// Backend-neutral value categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Numeric,
    Decimal,
    List,
    Struct,
}

/// A typed payload for inserts, updates and condition operands.
///
/// Each driver converts it explicitly into its native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Numeric(i64),
    Decimal(f64),
    Bool(bool),
    List(Vec<Value>),
    /// Ordered field/value pairs, i.e. a document or row.
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(DataType::String),
            Value::Numeric(_) | Value::Bool(_) => Some(DataType::Numeric),
            Value::Decimal(_) => Some(DataType::Decimal),
            Value::List(_) => Some(DataType::List),
            Value::Struct(_) => Some(DataType::Struct),
        }
    }

    /// Builds a struct from `(name, value)` pairs, keeping their order.
    pub fn structure<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Converts any serializable type, typically a record struct, into a `Value`.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Value::from)
            .map_err(|e| DbError::translation(format!("value is not serializable: {e}")))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Numeric(n) => JsonValue::Number((*n).into()),
            Value::Decimal(d) => Number::from_f64(*d).map_or(JsonValue::Null, JsonValue::Number),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Struct(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Numeric(i),
                None => Value::Decimal(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Struct(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Numeric(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Numeric(n.into())
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
