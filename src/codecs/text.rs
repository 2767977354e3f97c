//! String codec: raw, C-terminated, and length-prefixed strings.

use std::rc::Rc;

use binrw::Endian;

use crate::codec::{Codec, IntoCodec};
use crate::codecs::primitive::Int;
use crate::codecs::repeat_fill;
use crate::context::Context;
use crate::errors::Error;
use crate::stream::Stream;
use crate::value::Value;

/// How the string's extent is determined on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrKind {
    /// A run of units, ended by the declared length or EOF.
    Raw,
    /// Terminator-ended. The terminator is consumed but not part
    /// of the value.
    C,
    /// Unit count prefixed in a separate length codec.
    Pascal,
}

/// Byte-to-text mapping.
///
/// Latin-1 decodes each byte as the char with the same code
/// point, the usual fallback for legacy formats whose name
/// fields are not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

/// A string on the stream.
///
/// `length` is counted in units of `unit` bytes, not in bytes.
/// With `exact`, parse and emit both consume/produce exactly
/// `length * unit` bytes, padding with the terminator fill, and
/// an oversized value is an error.
#[derive(Debug, Clone)]
pub struct Str {
    kind: StrKind,
    length: Option<u64>,
    unit: usize,
    terminator: Option<Vec<u8>>,
    exact: bool,
    encoding: Encoding,
    length_codec: Rc<dyn Codec>,
}

impl Str {
    /// Terminator-ended string of single-byte units.
    pub fn c() -> Self {
        Self::of_kind(StrKind::C)
    }

    /// Exactly `length` units of payload.
    pub fn raw(length: u64) -> Self {
        Self::of_kind(StrKind::Raw).length(length)
    }

    /// Count-prefixed string; the count codec defaults to a
    /// single unsigned byte.
    pub fn pascal() -> Self {
        Self::of_kind(StrKind::Pascal)
    }

    fn of_kind(kind: StrKind) -> Self {
        Self {
            kind,
            length: None,
            unit: 1,
            terminator: None,
            exact: false,
            encoding: Encoding::Utf8,
            length_codec: Rc::new(Int::unsigned(8, Endian::Little)),
        }
    }

    /// Ceiling (and with `exact`, floor) for the unit count.
    pub fn length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    /// Unit width in bytes, e.g. 2 for UTF-16-ish layouts.
    pub fn unit(mut self, unit: usize) -> Self {
        self.unit = unit.max(1);
        self
    }

    pub fn terminator(mut self, terminator: impl Into<Vec<u8>>) -> Self {
        self.terminator = Some(terminator.into());
        self
    }

    /// Fix the encoded width at `length * unit` bytes.
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn length_codec(mut self, codec: impl IntoCodec) -> Self {
        self.length_codec = codec.into_codec();
        self
    }

    fn term(&self) -> Vec<u8> {
        match &self.terminator {
            Some(t) => t.clone(),
            None => vec![0; self.unit],
        }
    }

    fn decode(&self, raw: Vec<u8>) -> Result<String, Error> {
        match self.encoding {
            Encoding::Utf8 => Ok(String::from_utf8(raw)?),
            Encoding::Latin1 => Ok(raw.iter().map(|b| *b as char).collect()),
        }
    }

    fn encode(&self, s: &str) -> Result<Vec<u8>, Error> {
        match self.encoding {
            Encoding::Utf8 => Ok(s.as_bytes().to_vec()),
            Encoding::Latin1 => {
                let mut out = Vec::with_capacity(s.len());
                for c in s.chars() {
                    if (c as u32) > 0xff {
                        return Err(Error::EncodeChar(c));
                    }
                    out.push(c as u8);
                }
                Ok(out)
            }
        }
    }
}

impl Codec for Str {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let term = self.term();

        let (raw, units_read) = match self.kind {
            StrKind::Pascal => {
                let mut count = self.length_codec.parse(io, ctx)?.as_u64()?;
                if let Some(length) = self.length {
                    count = count.min(length);
                }
                let raw = io.read_at_most(count as usize * self.unit)?;
                (raw, count)
            }
            StrKind::Raw | StrKind::C => {
                let mut raw = Vec::new();
                let mut units = 0_u64;
                loop {
                    if let Some(length) = self.length {
                        if units >= length {
                            break;
                        }
                    }
                    let c = io.read_at_most(self.unit)?;
                    units += 1;
                    if c.is_empty() || (self.kind == StrKind::C && c == term) {
                        break;
                    }
                    raw.extend_from_slice(&c);
                }
                (raw, units)
            }
        };

        if self.exact {
            if let Some(length) = self.length {
                if units_read > length {
                    return Err(Error::LengthOverrun {
                        wanted: length,
                        got: units_read,
                    });
                }
                let left = length - units_read;
                if left > 0 {
                    io.read_at_most(left as usize * self.unit)?;
                }
            }
        }

        Ok(Value::Str(self.decode(raw)?))
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        let raw = self.encode(value.as_str()?)?;
        let term = self.term();

        let units_written: u64 = match self.kind {
            StrKind::Pascal => {
                let count = (raw.len() / self.unit) as u64;
                self.length_codec
                    .emit(&Value::Int(count as i128), io, ctx)?;
                io.write_all(&raw)?;
                count
            }
            StrKind::C => {
                io.write_all(&raw)?;
                io.write_all(&term)?;
                ((raw.len() + term.len()) / self.unit) as u64
            }
            StrKind::Raw => {
                io.write_all(&raw)?;
                (raw.len() / self.unit) as u64
            }
        };

        if self.exact {
            if let Some(length) = self.length {
                if units_written > length {
                    return Err(Error::LengthOverrun {
                        wanted: length,
                        got: units_written,
                    });
                }
                let left = length - units_written;
                if left > 0 {
                    io.write_all(&repeat_fill(&term, left as usize * self.unit))?;
                }
            }
        }

        Ok(())
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        let mut size = match (self.exact, self.length) {
            (true, Some(length)) => length * self.unit as u64,
            _ => match value {
                Some(value) => {
                    let mut n = self.encode(value.as_str()?)?.len() as u64;
                    if self.kind == StrKind::C {
                        n += self.term().len() as u64;
                    }
                    n
                }
                None => return Ok(None),
            },
        };

        if self.kind == StrKind::Pascal {
            match self.length_codec.sizeof(None, ctx)? {
                Some(prefix) => size += prefix,
                None => return Ok(None),
            }
        }

        Ok(Some(size))
    }
}
