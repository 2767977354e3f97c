//! Composable codecs for binary layouts, built for
//! reverse-engineered and legacy formats: offset tables, tagged
//! unions, terminated and length-prefixed strings, padding,
//! alignment, and nested sized regions.
//!
//! One description drives all three directions: `parse` bytes
//! into a structured [`Value`], `emit` a value back to bytes,
//! and `sizeof` the encoded form without touching a stream.
//!
//! ```rs
//! use std::rc::Rc;
//!
//! use bistruct::{parse, emit, Array, Endian, Int, Value};
//!
//! fn main() -> Result<(), bistruct::Error> {
//!     let numbers = Rc::new(Array::new(Int::unsigned(16, Endian::Little)).count(3));
//!
//!     let value = parse(&numbers, [1, 0, 2, 0, 3, 0])?;
//!     assert_eq!(value, Value::List(vec![
//!         Value::Int(1), Value::Int(2), Value::Int(3),
//!     ]));
//!
//!     let bytes = emit(&numbers, &value)?;
//!     assert_eq!(bytes, vec![1, 0, 2, 0, 3, 0]);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod codecs;
pub mod context;
pub mod errors;
pub mod stream;
pub mod value;

pub mod tests;

pub use codec::{emit, emit_with, parse, parse_with, sizeof, sizeof_with, Codec, IntoCodec};
pub use codecs::{
    AlignTo,
    AlignedTo,
    Array,
    AtOffset,
    Data,
    Elem,
    Encoding,
    Enum,
    Fixed,
    Float,
    Generic,
    Implied,
    Int,
    Lazy,
    LazyEntry,
    Nothing,
    Pad,
    Processed,
    RecordBuilder,
    RecordType,
    Ref,
    RefMode,
    Str,
    StrKind,
    Switch,
    Whence,
    WithSize,
};
pub use context::{format_path, Context, Seg};
pub use errors::Error;
pub use stream::{Bounded, Stream};
pub use value::{EnumValue, Record, Value};

// Byte-order type threaded through the integer and float codecs.
pub use binrw::Endian;
