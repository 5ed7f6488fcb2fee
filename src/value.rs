//! `Value` is an owned, closed description of JSON-like data. It is
//! what callers hand to the mutation facade and what they get back
//! from read-only snapshots of a document.

use Error;
use indexmap::IndexMap;
use json;
use serde_json::{self, Value as SJValue};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// Members in insertion order.
    Object(Vec<(String, Value)>),
    Array(Vec<Value>),
}

/// Conversion into a `Value`. Fails with `UnsupportedValue` when the
/// input has no document representation.
pub trait IntoValue {
    fn into_value(self) -> Result<Value, Error>;
}

/// A user-defined type that can be stored as a document object.
///
/// ```rust
/// use tandem::{Record, Value};
///
/// struct Todo { title: String, done: bool, cached_html: String }
///
/// impl Record for Todo {
///     fn fields(&self) -> Vec<(&'static str, Value)> {
///         vec![
///             ("title", Value::from(self.title.as_str())),
///             ("done", Value::from(self.done)),
///             ("cached_html", Value::from(self.cached_html.as_str())),
///         ]
///     }
///
///     fn excluded_fields(&self) -> &'static [&'static str] {
///         &["cached_html"]
///     }
/// }
/// ```
pub trait Record {
    /// The fields of the record in a fixed order. That order becomes
    /// the insertion order of the object's keys.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// Fields that are never stored.
    fn excluded_fields(&self) -> &'static [&'static str] {
        &[]
    }
}

impl Value {
    /// Parses a JSON string into a value, keeping the order of object
    /// members. Integers that fit in 32 bits become `Int32`, other
    /// integers `Int64`, and every other number `Double`.
    pub fn from_json_str(json: &str) -> Result<Value, Error> {
        let value: SJValue = serde_json::from_str(json)?;
        value.into_value()
    }

    /// Builds an object value from a record, skipping its excluded fields.
    pub fn from_record<R: Record + ?Sized>(record: &R) -> Value {
        let excluded = record.excluded_fields();
        Value::Object(record.fields().into_iter()
            .filter(|&(name, _)| !excluded.contains(&name))
            .map(|(name, value)| (name.to_owned(), value))
            .collect())
    }

    pub fn type_name(&self) -> &'static str {
        match *self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int32(_) => "integer",
            Value::Int64(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "date",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Value::Null
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int32(i) => Some(i),
            _ => None,
        }
    }

    /// Returns either integer variant widened to 64 bits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int32(i) => Some(i as i64),
            Value::Int64(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match *self {
            Value::Bytes(ref b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<i64> {
        match *self {
            Value::Timestamp(ms) => Some(ms),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match *self {
            Value::Object(ref members) => Some(members),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match *self {
            Value::Array(ref items) => Some(items),
            _ => None,
        }
    }

    /// Looks up an object member by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.iter().find(|&&(ref k, _)| k == key).map(|&(_, ref v)| v)
    }

    /// Looks up an array item by index.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }

    /// Compares two values the way array searches do: integers compare
    /// across widths, objects ignore member order.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (&Value::Object(ref a), &Value::Object(ref b)) =>
                a.len() == b.len() && a.iter().all(|&(ref k, ref v)| {
                    b.iter().any(|&(ref k2, ref v2)| k == k2 && v.same_as(v2))
                }),
            (&Value::Array(ref a), &Value::Array(ref b)) =>
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_as(y)),
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(x), Some(y)) => x == y,
                _ => self == other,
            },
        }
    }

    /// Fails with `UnsupportedValue` if any double in the value is
    /// not finite.
    pub fn validate(&self) -> Result<(), Error> {
        match *self {
            Value::Double(d) if !d.is_finite() => Err(Error::UnsupportedValue),
            Value::Object(ref members) => members.iter().map(|&(_, ref v)| v.validate()).collect(),
            Value::Array(ref items) => items.iter().map(|v| v.validate()).collect(),
            _ => Ok(()),
        }
    }

    /// Serializes the value with object keys in insertion order.
    pub fn to_json(&self) -> String {
        json::to_json(self)
    }

    /// Serializes the value with object keys sorted lexicographically.
    pub fn to_sorted_json(&self) -> String {
        json::to_sorted_json(self)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value { Value::String(s.to_owned()) }
}

impl From<String> for Value {
    fn from(s: String) -> Value { Value::String(s) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value { Value::Bool(b) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value { Value::Int32(i) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value { Value::Int64(i) }
}

impl From<f64> for Value {
    fn from(d: f64) -> Value { Value::Double(d) }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value { Value::Array(items) }
}

impl IntoValue for Value {
    fn into_value(self) -> Result<Value, Error> {
        self.validate()?;
        Ok(self)
    }
}

impl<'a> IntoValue for &'a Value {
    fn into_value(self) -> Result<Value, Error> {
        self.clone().into_value()
    }
}

impl IntoValue for () {
    fn into_value(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Result<Value, Error> {
        Ok(Value::Bool(self))
    }
}

macro_rules! into_int32 {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Result<Value, Error> {
                Ok(Value::Int32(self as i32))
            }
        }
    )*}
}

macro_rules! into_int64 {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Result<Value, Error> {
                Ok(Value::Int64(self as i64))
            }
        }
    )*}
}

macro_rules! into_checked_int64 {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Result<Value, Error> {
                use std::convert::TryFrom;
                Ok(Value::Int64(i64::try_from(self)?))
            }
        }
    )*}
}

into_int32!(i8, i16, i32, u8, u16);
into_int64!(i64, u32);
into_checked_int64!(u64, usize, isize, i128, u128);

impl IntoValue for f64 {
    fn into_value(self) -> Result<Value, Error> {
        match self.is_finite() {
            true => Ok(Value::Double(self)),
            false => Err(Error::UnsupportedValue),
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Result<Value, Error> {
        (self as f64).into_value()
    }
}

impl IntoValue for String {
    fn into_value(self) -> Result<Value, Error> {
        Ok(Value::String(self))
    }
}

impl<'a> IntoValue for &'a str {
    fn into_value(self) -> Result<Value, Error> {
        Ok(Value::String(self.to_owned()))
    }
}

impl<'a> IntoValue for &'a String {
    fn into_value(self) -> Result<Value, Error> {
        Ok(Value::String(self.clone()))
    }
}

impl IntoValue for SystemTime {
    fn into_value(self) -> Result<Value, Error> {
        use std::convert::TryFrom;
        let millis = match self.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis())?,
            Err(before) => -i64::try_from(before.duration().as_millis())?,
        };
        Ok(Value::Timestamp(millis))
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Result<Value, Error> {
        match self {
            Some(value) => value.into_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Result<Value, Error> {
        let items = self.into_iter().map(|v| v.into_value()).collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(items))
    }
}

impl<K: Into<String> + Ord, T: IntoValue> IntoValue for BTreeMap<K, T> {
    fn into_value(self) -> Result<Value, Error> {
        let mut members = Vec::with_capacity(self.len());
        for (key, value) in self {
            members.push((key.into(), value.into_value()?));
        }
        Ok(Value::Object(members))
    }
}

impl<K: Into<String> + Hash + Eq, T: IntoValue> IntoValue for IndexMap<K, T> {
    fn into_value(self) -> Result<Value, Error> {
        let mut members = Vec::with_capacity(self.len());
        for (key, value) in self {
            members.push((key.into(), value.into_value()?));
        }
        Ok(Value::Object(members))
    }
}

/// Hash maps have no stable order, so their keys are sorted.
impl<K: Into<String> + Hash + Eq, T: IntoValue> IntoValue for HashMap<K, T> {
    fn into_value(self) -> Result<Value, Error> {
        let mut members = Vec::with_capacity(self.len());
        for (key, value) in self {
            members.push((key.into(), value.into_value()?));
        }
        members.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Value::Object(members))
    }
}

impl IntoValue for SJValue {
    fn into_value(self) -> Result<Value, Error> {
        match self {
            SJValue::Null => Ok(Value::Null),
            SJValue::Bool(b) => Ok(Value::Bool(b)),
            SJValue::Number(number) => {
                if let Some(i) = number.as_i64() {
                    Ok(match i >= i32::min_value() as i64 && i <= i32::max_value() as i64 {
                        true => Value::Int32(i as i32),
                        false => Value::Int64(i),
                    })
                } else if number.is_u64() {
                    Err(Error::UnsupportedValue)
                } else {
                    number.as_f64().ok_or(Error::UnsupportedValue)?.into_value()
                }
            }
            SJValue::String(s) => Ok(Value::String(s)),
            SJValue::Array(items) => items.into_value(),
            SJValue::Object(map) => {
                let mut members = Vec::with_capacity(map.len());
                for (key, value) in map {
                    members.push((key, value.into_value()?));
                }
                Ok(Value::Object(members))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Todo {
        title: String,
        done: bool,
        draft: String,
    }

    impl Record for Todo {
        fn fields(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("title", Value::from(self.title.as_str())),
                ("done", Value::from(self.done)),
                ("draft", Value::from(self.draft.as_str())),
            ]
        }

        fn excluded_fields(&self) -> &'static [&'static str] {
            &["draft"]
        }
    }

    #[test]
    fn test_from_json_str() {
        let value = Value::from_json_str(r#"{"b":1,"a":[true,null,2.5,"x"],"c":5000000000}"#).unwrap();
        assert_eq!(value, Value::Object(vec![
            ("b".to_owned(), Value::Int32(1)),
            ("a".to_owned(), Value::Array(vec![Value::Bool(true), Value::Null, Value::Double(2.5), Value::from("x")])),
            ("c".to_owned(), Value::Int64(5000000000)),
        ]));
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert_eq!(Value::from_json_str(r#"{"a":"#), Err(Error::InvalidJson));
        assert_eq!(Value::from_json_str("18446744073709551615"), Err(Error::UnsupportedValue));
    }

    #[test]
    fn test_unsupported_values() {
        assert_eq!(::std::f64::NAN.into_value(), Err(Error::UnsupportedValue));
        assert_eq!(vec![1.0, ::std::f64::INFINITY].into_value(), Err(Error::UnsupportedValue));
        assert_eq!(u64::max_value().into_value(), Err(Error::UnsupportedValue));
        assert_eq!(Value::Array(vec![Value::Double(::std::f64::NAN)]).into_value(), Err(Error::UnsupportedValue));
    }

    #[test]
    fn test_native_conversions() {
        assert_eq!(7u8.into_value(), Ok(Value::Int32(7)));
        assert_eq!(7u32.into_value(), Ok(Value::Int64(7)));
        assert_eq!(None::<bool>.into_value(), Ok(Value::Null));
        assert_eq!(UNIX_EPOCH.into_value(), Ok(Value::Timestamp(0)));

        let mut map = HashMap::new();
        map.insert("z", 1);
        map.insert("a", 2);
        assert_eq!(map.into_value(), Ok(Value::Object(vec![
            ("a".to_owned(), Value::Int32(2)),
            ("z".to_owned(), Value::Int32(1)),
        ])));
    }

    #[test]
    fn test_from_record_skips_excluded_fields() {
        let todo = Todo{title: "milk".to_owned(), done: false, draft: "m".to_owned()};
        let value = Value::from_record(&todo);
        assert_eq!(value.get("title"), Some(&Value::from("milk")));
        assert_eq!(value.get("done"), Some(&Value::Bool(false)));
        assert_eq!(value.get("draft"), None);
    }

    #[test]
    fn test_same_as() {
        assert!(Value::Int32(3).same_as(&Value::Int64(3)));
        assert!(!Value::Int32(3).same_as(&Value::Double(3.0)));
        let a = Value::from_json_str(r#"{"x":1,"y":[1,2]}"#).unwrap();
        let b = Value::from_json_str(r#"{"y":[1,2],"x":1}"#).unwrap();
        assert!(a.same_as(&b));
        assert!(a != b);
    }
}
