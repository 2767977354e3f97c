//! Values produced by parsing and consumed by emitting.

use std::rc::Rc;

use crate::codecs::lazy::LazyEntry;
use crate::errors::Error;

/// A parsed value.
///
/// One variant per codec domain. `Int` is wide enough to hold
/// any 64-bit signed or unsigned integer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Bytes(Vec<u8>),
    Str(String),
    List(Vec<Value>),
    Record(Record),
    Enum(EnumValue),
    Lazy(Rc<LazyEntry>),
}

impl Value {
    /// Name of the value's shape, for mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Enum(_) => "enum",
            Value::Lazy(_) => "lazy",
        }
    }

    fn mismatch(&self, wanted: &'static str) -> Error {
        Error::TypeMismatch {
            wanted,
            got: self.kind(),
        }
    }

    /// The integer payload. Enum values yield their raw integer.
    pub fn as_int(&self) -> Result<i128, Error> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Enum(e) => Ok(e.raw),
            _ => Err(self.mismatch("int")),
        }
    }

    pub fn as_u64(&self) -> Result<u64, Error> {
        let n = self.as_int()?;
        u64::try_from(n).map_err(|_| Error::OutOfRange { value: n, bits: 64 })
    }

    pub fn as_bool(&self) -> Result<bool, Error> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.mismatch("bool")),
        }
    }

    pub fn as_float(&self) -> Result<f64, Error> {
        match self {
            Value::Float(x) => Ok(*x),
            _ => Err(self.mismatch("float")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], Error> {
        match self {
            Value::Bytes(b) => Ok(b),
            _ => Err(self.mismatch("bytes")),
        }
    }

    pub fn as_str(&self) -> Result<&str, Error> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(self.mismatch("str")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], Error> {
        match self {
            Value::List(items) => Ok(items),
            _ => Err(self.mismatch("list")),
        }
    }

    pub fn as_record(&self) -> Result<&Record, Error> {
        match self {
            Value::Record(rec) => Ok(rec),
            _ => Err(self.mismatch("record")),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// An enum member as a value: the enum's type name paired with
/// the underlying integer.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub type_name: &'static str,
    pub raw: i128,
}

impl EnumValue {
    /// Wraps an enum member. The `num_enum::IntoPrimitive` derive
    /// provides the `Primitive: From<E>` conversion.
    pub fn of<E>(member: E) -> Self
    where
        E: num_enum::TryFromPrimitive + 'static,
        E::Primitive: From<E> + Into<i128>,
    {
        Self {
            type_name: std::any::type_name::<E>(),
            raw: E::Primitive::from(member).into(),
        }
    }
}

/// Value object for a structured record: the record type's name
/// plus one slot per declared field, in declaration order.
///
/// Equality is structural over the type name and all fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Fresh record with every field set to `Null`.
    pub fn new(type_name: &str, field_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            type_name: type_name.to_owned(),
            fields: field_names
                .into_iter()
                .map(|name| (name, Value::Null))
                .collect(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Sets a field, appending it if the name was not declared.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_owned(), value)),
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
