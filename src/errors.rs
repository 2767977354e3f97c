//! Various parse/emit errors.

use std::fmt;

use crate::context::{format_path, Seg};

/// Read/write/layout errors raised by codecs.
///
/// Codecs raise the plain variant describing what went wrong;
/// the innermost enclosing path frame wraps it once into
/// [`Error::Traced`], which carries a copy of the structural
/// path at failure time. Outer frames and the drivers pass an
/// already traced error through unchanged.
#[derive(Debug)]
pub enum Error {
    /// Converted `binrw::Error`.
    BinRwError(binrw::Error),
    /// Converted `Utf8Error`.
    Utf8Error(std::string::FromUtf8Error),
    /// IO error.
    IOError(std::io::Error),
    /// Read returned fewer bytes than requested.
    ShortRead { wanted: u64, got: u64 },
    /// `Fixed` pattern did not match the bytes on the stream.
    FixedMismatch { wanted: Vec<u8>, got: Vec<u8> },
    /// Write would cross the limit of a bounded region.
    PastLimit { excess: u64 },
    /// Seek target falls before the start of a bounded region.
    SeekBeforeStart { pos: i128, start: u64 },
    /// Array emit with more elements than its byte budget holds.
    OversizedArray { max: u64 },
    /// Exact-length string longer than its declared length.
    LengthOverrun { wanted: u64, got: u64 },
    /// Switch dispatched with no selector set and no fallback.
    SelectorUnset,
    /// Switch selector matches no option and there is no fallback.
    BadSelector(String),
    /// Value outside the domain of a mapped codec.
    Unmapped(String),
    /// Integer with no corresponding enum member.
    NoSuchMember { name: &'static str, raw: i128 },
    /// Parse or emit through a generic slot with an empty stack.
    UnresolvedGeneric,
    /// Size required but not computable (lazy parse, reference
    /// region allocation).
    UnknownSize,
    /// Reference emitted in pinned mode without an offset.
    UnpinnedRef,
    /// Integer/float width the primitive codecs do not cover.
    UnsupportedWidth(u32),
    /// Value of the wrong shape handed to a codec.
    TypeMismatch { wanted: &'static str, got: &'static str },
    /// Integer does not fit the declared width/signedness.
    OutOfRange { value: i128, bits: u32 },
    /// Offset that cannot be turned into a seek target.
    BadOffset(i128),
    /// Character outside the target encoding.
    EncodeChar(char),
    /// Array element index with no per-index codec.
    NoElementCodec(usize),
    /// More generic bindings than declared slots.
    TooManyBindings { slots: usize, bindings: usize },
    /// Inner error decorated with the structural path at the
    /// point of failure.
    Traced { path: Vec<Seg>, source: Box<Error> },
}

impl Error {
    /// Wraps an error with the path at failure time. Already
    /// traced errors are returned unchanged.
    pub fn trace(path: Vec<Seg>, source: Error) -> Self {
        match source {
            Error::Traced { .. } => source,
            _ => Error::Traced { path, source: Box::new(source) },
        }
    }

    pub fn is_traced(&self) -> bool {
        matches!(self, Error::Traced { .. })
    }

    /// The path copied at failure time, if this error was traced.
    pub fn path(&self) -> Option<&[Seg]> {
        match self {
            Error::Traced { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Short name for the error kind, used in traced messages.
    fn kind(&self) -> &'static str {
        match self {
            Error::BinRwError(_) => "BinRw",
            Error::Utf8Error(_) => "Utf8",
            Error::IOError(_) => "IO",
            Error::ShortRead { .. } => "ShortRead",
            Error::FixedMismatch { .. } => "FixedMismatch",
            Error::PastLimit { .. } => "PastLimit",
            Error::SeekBeforeStart { .. } => "SeekBeforeStart",
            Error::OversizedArray { .. } => "OversizedArray",
            Error::LengthOverrun { .. } => "LengthOverrun",
            Error::SelectorUnset => "SelectorUnset",
            Error::BadSelector(_) => "BadSelector",
            Error::Unmapped(_) => "Unmapped",
            Error::NoSuchMember { .. } => "NoSuchMember",
            Error::UnresolvedGeneric => "UnresolvedGeneric",
            Error::UnknownSize => "UnknownSize",
            Error::UnpinnedRef => "UnpinnedRef",
            Error::UnsupportedWidth(_) => "UnsupportedWidth",
            Error::TypeMismatch { .. } => "TypeMismatch",
            Error::OutOfRange { .. } => "OutOfRange",
            Error::BadOffset(_) => "BadOffset",
            Error::EncodeChar(_) => "EncodeChar",
            Error::NoElementCodec(_) => "NoElementCodec",
            Error::TooManyBindings { .. } => "TooManyBindings",
            Error::Traced { .. } => "Traced",
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BinRwError(err) => write!(f, "{err}"),
            Error::Utf8Error(err) => write!(f, "{err}"),
            Error::IOError(err) => write!(f, "IO error: {err}"),
            Error::ShortRead { wanted, got } => write!(f, "Read {got} bytes, expected {wanted} bytes."),
            Error::FixedMismatch { wanted, got } => write!(
                f, "Fixed mismatch. Expected {}, got {}", hex_bytes(wanted), hex_bytes(got)
            ),
            Error::PastLimit { excess } => write!(f, "Write crosses region limit by {excess} bytes."),
            Error::SeekBeforeStart { pos, start } => write!(f, "Seek to {pos} before region start {start}."),
            Error::OversizedArray { max } => write!(f, "Oversized array, maximum size {max} bytes."),
            Error::LengthOverrun { wanted, got } => write!(f, "Exact length is {wanted} units, value needs {got}."),
            Error::SelectorUnset => write!(f, "Selector not set."),
            Error::BadSelector(sel) => write!(f, "No option for selector {sel}."),
            Error::Unmapped(value) => write!(f, "No mapping for value {value}."),
            Error::NoSuchMember { name, raw } => write!(f, "No member of {name} with value {raw}."),
            Error::UnresolvedGeneric => write!(f, "Unresolved generic."),
            Error::UnknownSize => write!(f, "Size not known."),
            Error::UnpinnedRef => write!(f, "Reference offset not set."),
            Error::UnsupportedWidth(bits) => write!(f, "Unsupported width of {bits} bits."),
            Error::TypeMismatch { wanted, got } => write!(f, "Expected {wanted} value, got {got}."),
            Error::OutOfRange { value, bits } => write!(f, "Value {value} does not fit in {bits} bits."),
            Error::BadOffset(offset) => write!(f, "Offset {offset} is not a valid seek target."),
            Error::EncodeChar(c) => write!(f, "Character {c:?} outside target encoding."),
            Error::NoElementCodec(i) => write!(f, "No element codec for index {i}."),
            Error::TooManyBindings { slots, bindings } => write!(
                f, "Record declares {slots} generic slots, got {bindings} bindings."
            ),
            Error::Traced { path, source } => match path.is_empty() {
                true => write!(f, "{}: {}", source.kind(), source),
                false => write!(f, "[{}] {}: {}", format_path(path), source.kind(), source),
            },
        }
    }
}

/// `[01 02 ff]` style byte formatting for mismatch messages.
fn hex_bytes(bytes: &[u8]) -> String {
    let body = bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{body}]")
}

/// Converts std::io::Error to Error.
///
/// Crate errors smuggled through a `std::io` interface (the
/// bounded view's `Write` impl has to speak `io::Error`) are
/// unwrapped back to their original variant.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(err) => Error::IOError(err),
        }
    }
}

/// Converts Error to std::io::Error.
impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

/// Converts binrw::Error to Error.
impl From<binrw::Error> for Error {
    fn from(err: binrw::Error) -> Error {
        Error::BinRwError(err)
    }
}

/// Converts std::string::FromUtf8Error to Error.
impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Error {
        Error::Utf8Error(err)
    }
}
