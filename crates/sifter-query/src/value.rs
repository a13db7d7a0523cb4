//! Runtime value types for predicates and result columns.
//!
//! The [`Value`] enum is the owned scalar that flows through the query
//! builder: comparison operands, `IN` lists, stored record cells, and plucked
//! results. Comparisons follow SQL habits: `NULL` compares as unknown, and a
//! numeric string compares numerically against a number.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// Owned scalar value used by predicates and records.
///
/// # Example
///
/// ```
/// use sifter_query::{Value, Number};
///
/// let position = Value::from(14);
/// assert_eq!(position.as_number(), Some(Number::I64(14)));
/// assert!(position.compare(&Value::from("14")).is_some_and(|o| o.is_eq()));
/// assert!(Value::Null.compare(&Value::Null).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL `NULL`, also used for absent columns.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
}

impl Value {
    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if this is a `String` value.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` if this is a `Number` value.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` if this is a `Bool` value.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text form used by pattern matching. `Null` has none.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "1" } else { "0" })),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::String(s) => Some(Cow::Borrowed(s)),
        }
    }

    /// Compares two values the way a SQL engine would.
    ///
    /// Returns `None` when either side is `Null` or the types cannot be
    /// compared. Strings holding a number compare numerically against numbers;
    /// booleans compare against numbers as `0`/`1`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Number(a), Value::Number(b)) => a.compare(*b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(s), Value::Number(n)) => Number::parse(s)?.compare(*n),
            (Value::Number(n), Value::String(s)) => n.compare(Number::parse(s)?),
            (Value::Bool(b), Value::Number(n)) => Number::from(*b).compare(*n),
            (Value::Number(n), Value::Bool(b)) => n.compare(Number::from(*b)),
            _ => None,
        }
    }

    /// Returns `true` when [`compare`](Self::compare) reports equality.
    pub fn loose_eq(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Total order for grouping and sorting keys: `Null < Bool < Number < String`.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(*b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::I64(n)) => serializer.serialize_i64(*n),
            Value::Number(Number::U64(n)) => serializer.serialize_u64(*n),
            Value::Number(Number::F64(n)) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision.
/// Equality and ordering work across variants, so `I64(2) == U64(2)`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            (Number::I64(a), Number::U64(b)) => Some(compare_signed(a, b)),
            (Number::U64(a), Number::I64(b)) => Some(compare_signed(b, a).reverse()),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Like [`compare`](Self::compare), with NaN ordered last.
    pub fn total_cmp(self, other: Number) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.to_f64().total_cmp(&other.to_f64()))
    }

    /// Parses a trimmed numeric string, preferring integers.
    pub fn parse(text: &str) -> Option<Number> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Some(Number::I64(n));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Some(Number::U64(n));
        }
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Number::F64)
    }
}

fn compare_signed(signed: i64, unsigned: u64) -> Ordering {
    if signed < 0 {
        Ordering::Less
    } else {
        (signed as u64).cmp(&unsigned)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.compare(*other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

impl From<bool> for Number {
    fn from(b: bool) -> Self {
        Number::U64(u64::from(b))
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }

            impl From<$source> for Value {
                fn from(n: $source) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
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

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Lists and objects become their JSON text; they have no scalar form.
impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Number(Number::U64(u))
                } else {
                    n.as_f64().map_or(Value::Null, |f| Value::Number(Number::F64(f)))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_number_equality() {
        assert_eq!(Number::I64(2), Number::U64(2));
        assert_eq!(Number::F64(2.0), Number::I64(2));
        assert_ne!(Number::I64(-1), Number::U64(u64::MAX));
        assert_eq!(Value::from(2), Value::Number(Number::U64(2)));
    }

    #[test]
    fn signed_unsigned_ordering() {
        assert_eq!(
            Number::I64(-5).compare(Number::U64(3)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::U64(u64::MAX).compare(Number::I64(i64::MAX)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn null_is_unknown() {
        assert_eq!(Value::Null.compare(&Value::from(1)), None);
        assert_eq!(Value::from("a").compare(&Value::Null), None);
        assert!(!Value::Null.loose_eq(&Value::Null));
    }

    #[test]
    fn numeric_strings_compare_numerically() {
        assert!(Value::from("14").loose_eq(&Value::from(14)));
        assert_eq!(
            Value::from(9).compare(&Value::from("10")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from("abc").compare(&Value::from(1)), None);
    }

    #[test]
    fn bool_against_number() {
        assert!(Value::from(true).loose_eq(&Value::from(1)));
        assert!(Value::from(0).loose_eq(&Value::from(false)));
    }

    #[test]
    fn total_order_ranks_types() {
        let mut values = vec![
            Value::from("b"),
            Value::from(3),
            Value::Null,
            Value::from(true),
            Value::from(1),
        ];
        values.sort_by(Value::total_cmp);
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::from(true),
                Value::from(1),
                Value::from(3),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn from_json() {
        assert_eq!(Value::from(serde_json::json!(null)), Value::Null);
        assert_eq!(Value::from(serde_json::json!(7)), Value::from(7));
        assert_eq!(Value::from(serde_json::json!(1.5)), Value::from(1.5));
        assert_eq!(Value::from(serde_json::json!("x")), Value::from("x"));
        assert_eq!(Value::from(serde_json::json!([1])), Value::from("[1]"));
    }

    #[test]
    fn text_forms() {
        assert_eq!(Value::from(12).to_text().as_deref(), Some("12"));
        assert_eq!(Value::from(true).to_text().as_deref(), Some("1"));
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(Number::parse(" 42 "), Some(Number::I64(42)));
        assert_eq!(Number::parse("1.25"), Some(Number::F64(1.25)));
        assert_eq!(Number::parse("inf"), None);
        assert_eq!(Number::parse("x"), None);
    }
}
