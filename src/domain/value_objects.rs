use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of one report section (one dataset pair).
///
/// Also namespaces bookmark names, so two sections can anchor the same text
/// without clashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionId(pub String);

impl SectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Anchor name produced by [`crate::domain::bookmark::bookmark_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookmarkName(pub String);

impl BookmarkName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `#name`, for use in an `href`.
    pub fn fragment(&self) -> String {
        format!("#{}", self.0)
    }
}

impl std::fmt::Display for BookmarkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Canonical, order-preserving encoding of a key tuple (or key prefix).
///
/// Encoded as a JSON array so `("a|b", "c")` and `("a", "b|c")` never collide
/// and type differences (`1` vs `"1"`) are preserved. Integral floats are
/// written as integers, so `1.0` and `1` name the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(String);

impl RowKey {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        RowKey(Value::Array(values.into_iter().map(canonical).collect()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonical(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}
