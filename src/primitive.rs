//! Leaf values of a document.

use value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    Date(i64),
}

impl Primitive {
    pub fn type_name(&self) -> &'static str {
        match *self {
            Primitive::Null => "null",
            Primitive::Boolean(_) => "boolean",
            Primitive::Integer(_) => "integer",
            Primitive::Long(_) => "long",
            Primitive::Double(_) => "double",
            Primitive::String(_) => "string",
            Primitive::Bytes(_) => "bytes",
            Primitive::Date(_) => "date",
        }
    }

    pub fn to_value(&self) -> Value {
        match *self {
            Primitive::Null => Value::Null,
            Primitive::Boolean(b) => Value::Bool(b),
            Primitive::Integer(i) => Value::Int32(i),
            Primitive::Long(i) => Value::Int64(i),
            Primitive::Double(d) => Value::Double(d),
            Primitive::String(ref s) => Value::String(s.clone()),
            Primitive::Bytes(ref b) => Value::Bytes(b.clone()),
            Primitive::Date(ms) => Value::Timestamp(ms),
        }
    }
}
