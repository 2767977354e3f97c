//! The codec catalog: primitives, modifiers, and compounds.

pub mod compound;
pub mod enums;
pub mod lazy;
pub mod modifier;
pub mod primitive;
pub mod record;
pub mod text;

pub use compound::{Array, Elem, Switch};
pub use enums::Enum;
pub use lazy::{Lazy, LazyEntry};
pub use modifier::{AlignTo, AlignedTo, AtOffset, Processed, Ref, RefMode, Whence, WithSize};
pub use primitive::{Data, Fixed, Float, Implied, Int, Nothing, Pad};
pub use record::{Generic, RecordBuilder, RecordType};
pub use text::{Encoding, Str, StrKind};

/// Repeats `pattern` to exactly `len` bytes, truncating the last
/// repetition. An empty pattern yields zero fill.
pub(crate) fn repeat_fill(pattern: &[u8], len: usize) -> Vec<u8> {
    if pattern.is_empty() {
        return vec![0_u8; len];
    }
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        out.extend_from_slice(pattern);
    }
    out.truncate(len);
    out
}
