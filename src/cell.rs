use serde::{Deserialize, Serialize};
use std::fmt;

/// A single loosely-typed cell of a transaction table.
///
/// Cells carry no schema: any column may hold any variant, and edits are
/// never checked against the type the column had when it was loaded.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Infer a value from a delimited-text field.
    ///
    /// # Examples
    /// ```
    /// use review_sheet::cell::CellValue;
    ///
    /// assert_eq!(CellValue::parse_text(""), CellValue::Empty);
    /// assert_eq!(CellValue::parse_text("True"), CellValue::Bool(true));
    /// assert_eq!(CellValue::parse_text("42"), CellValue::Int(42));
    /// assert_eq!(CellValue::parse_text("4.5"), CellValue::Float(4.5));
    /// assert_eq!(CellValue::parse_text("ACME Ltd"), CellValue::Text("ACME Ltd".to_string()));
    /// ```
    pub fn parse_text(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Empty;
        }
        if field.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if field.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        if let Ok(i) = field.parse::<i64>() {
            return CellValue::Int(i);
        }
        // "inf" and "nan" stay text; only spelled-out numbers become floats
        if field.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = field.parse::<f64>() {
                return CellValue::Float(f);
            }
        }
        CellValue::Text(field.to_string())
    }

    /// Whether the value compares equal to `True` in a flag column.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Int(i) => *i == 1,
            CellValue::Float(f) => *f == 1.0,
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or_default(),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(true) => write!(f, "True"),
            CellValue::Bool(false) => write!(f, "False"),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) if !x.is_finite() => {
                if x.is_nan() { Ok(()) } else { write!(f, "{}", x) }
            }
            // Keep the decimal point so the value reads back as a float
            CellValue::Float(x) if x.fract() == 0.0 => write!(f, "{:.1}", x),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}
