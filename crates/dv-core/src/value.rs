//! Tagged cell values and flat records

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Token used wherever a missing value has to be shown as text
pub const NULL_TOKEN: &str = "null";

static NULL: Value = Value::Null;

/// A single cell of the dataset.
///
/// Ingestion maps every source scalar onto one of these three variants so the
/// rest of the pipeline never has to guess at runtime types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// `Null`, or text with no characters
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::Number(_) => false,
        }
    }

    /// Numeric reading of the value, if it has a finite one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Textual identity of the value; `Null` becomes [`NULL_TOKEN`]
    pub fn stringify(&self) -> String {
        match self {
            Value::Null => NULL_TOKEN.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            // Nested structures are flattened to their compact JSON text
            other => Value::Text(other.to_string()),
        }
    }
}

/// Integral numbers print without a fractional part (`10`, not `10.0`)
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One row of the dataset: column name to value, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value under `column`; absent columns read as `Null`
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Column names in source order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Build a [`Record`] from `column => value` pairs
#[macro_export]
macro_rules! record {
    ($($column:expr => $value:expr),* $(,)?) => {{
        let mut record = $crate::value::Record::new();
        $( record.insert($column, $value); )*
        record
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_numbers() {
        assert_eq!(Value::Number(10.0).stringify(), "10");
        assert_eq!(Value::Number(2.5).stringify(), "2.5");
        assert_eq!(Value::Number(-0.0).stringify(), "0");
        assert_eq!(Value::Null.stringify(), NULL_TOKEN);
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Value::from(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Value::from("1e3").as_number(), Some(1000.0));
        assert_eq!(Value::from("abc").as_number(), None);
        assert_eq!(Value::from("inf").as_number(), None);
        assert_eq!(Value::from("").as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from(serde_json::json!(true)), Value::from("true"));
        assert_eq!(Value::from(serde_json::json!(3)), Value::Number(3.0));
        assert_eq!(Value::from(serde_json::json!([1, 2])), Value::from("[1,2]"));
    }

    #[test]
    fn test_missing_column_reads_null() {
        let rec = record! { "a" => 1.0 };
        assert_eq!(rec.get("b"), &Value::Null);
        assert!(rec.get("b").is_missing());
        assert_eq!(rec.columns().collect::<Vec<_>>(), vec!["a"]);
    }
}
