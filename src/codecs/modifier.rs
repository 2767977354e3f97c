//! Positional and transforming wrappers: offsets, references,
//! size bounds, alignment, and bijective value maps.

use std::cell::Cell;
use std::fmt;
use std::io::SeekFrom;
use std::rc::Rc;

use crate::codec::{Codec, IntoCodec};
use crate::codecs::repeat_fill;
use crate::context::Context;
use crate::errors::Error;
use crate::stream::{with_seek, Bounded, Stream};
use crate::value::Value;

/// Runs the inner codec at a fixed position, then restores the
/// cursor.
///
/// Contributes 0 to the surrounding linear layout: the wrapper
/// is a side channel into a region the outer layout accounts for
/// by other means.
#[derive(Debug)]
pub struct AtOffset {
    inner: Rc<dyn Codec>,
    at: SeekFrom,
}

impl AtOffset {
    pub fn new(inner: impl IntoCodec, at: SeekFrom) -> Self {
        Self {
            inner: inner.into_codec(),
            at,
        }
    }
}

impl Codec for AtOffset {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        with_seek(io, self.at, |io| self.inner.parse(io, ctx))
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        with_seek(io, self.at, |io| self.inner.emit(value, io, ctx))
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(Some(0))
    }
}

/// Base a runtime offset is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl Whence {
    fn target(self, offset: i128) -> Result<SeekFrom, Error> {
        let bad = |_| Error::BadOffset(offset);
        Ok(match self {
            Whence::Start => SeekFrom::Start(u64::try_from(offset).map_err(bad)?),
            Whence::Current => SeekFrom::Current(i64::try_from(offset).map_err(bad)?),
            Whence::End => SeekFrom::End(i64::try_from(offset).map_err(bad)?),
        })
    }
}

/// Who decides where a referenced body lives on emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefMode {
    /// Reserve space in the context's back-reference region,
    /// which starts where the root layout ends.
    Allocate,
    /// The offset was supplied up front via [`Ref::set_offset`],
    /// typically from a hook; the enclosing layout owns the body
    /// region.
    Pinned,
}

/// An offset field followed through to the value it points at.
///
/// Parse reads the offset with `offset_codec`, detours to that
/// position for the body, and leaves the cursor after the offset
/// field. The reported size is the body's size; the offset field
/// is accounted by the enclosing layout, matching
/// [`AtOffset`]'s zero.
#[derive(Debug)]
pub struct Ref {
    value: Rc<dyn Codec>,
    offset_codec: Rc<dyn Codec>,
    whence: Whence,
    mode: RefMode,
    pinned: Cell<Option<u64>>,
}

impl Ref {
    pub fn new(value: impl IntoCodec, offset_codec: impl IntoCodec) -> Self {
        Self {
            value: value.into_codec(),
            offset_codec: offset_codec.into_codec(),
            whence: Whence::Start,
            mode: RefMode::Allocate,
            pinned: Cell::new(None),
        }
    }

    pub fn whence(mut self, whence: Whence) -> Self {
        self.whence = whence;
        self
    }

    pub fn mode(mut self, mode: RefMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pins the emit target for `RefMode::Pinned`.
    pub fn set_offset(&self, offset: u64) {
        self.pinned.set(Some(offset));
    }
}

impl Codec for Ref {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let offset = self.offset_codec.parse(io, ctx)?.as_int()?;
        with_seek(io, self.whence.target(offset)?, |io| {
            self.value.parse(io, ctx)
        })
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        let offset = match self.mode {
            RefMode::Allocate => {
                let size = self
                    .value
                    .sizeof(Some(value), ctx)?
                    .ok_or(Error::UnknownSize)?;
                ctx.add_ref(size)?
            }
            RefMode::Pinned => self.pinned.get().ok_or(Error::UnpinnedRef)?,
        };
        self.offset_codec
            .emit(&Value::Int(offset as i128), io, ctx)?;
        with_seek(io, self.whence.target(offset as i128)?, |io| {
            self.value.emit(value, io, ctx)
        })
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        self.value.sizeof(value, ctx)
    }
}

/// Runs the inner codec inside a bounded view of `limit` bytes.
///
/// With `exact`, the cursor always lands at `start + limit`
/// afterwards, whether or not the inner codec consumed the whole
/// window.
#[derive(Debug)]
pub struct WithSize {
    inner: Rc<dyn Codec>,
    limit: u64,
    exact: bool,
}

impl WithSize {
    pub fn new(inner: impl IntoCodec, limit: u64) -> Self {
        Self {
            inner: inner.into_codec(),
            limit,
            exact: false,
        }
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }
}

impl Codec for WithSize {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let start = io.tell()?;
        let value = {
            let mut capped = Bounded::new(&mut *io, self.limit)?;
            self.inner.parse(&mut capped, ctx)?
        };
        if self.exact {
            io.seek(SeekFrom::Start(start + self.limit))?;
        }
        Ok(value)
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        let start = io.tell()?;
        {
            let mut capped = Bounded::new(&mut *io, self.limit)?;
            self.inner.emit(value, &mut capped, ctx)?;
        }
        if self.exact {
            io.seek(SeekFrom::Start(start + self.limit))?;
        }
        Ok(())
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        if self.exact {
            return Ok(Some(self.limit));
        }
        Ok(Some(match self.inner.sizeof(value, ctx)? {
            Some(size) => size.min(self.limit),
            None => self.limit,
        }))
    }
}

/// Post-alignment: the inner codec, then skip/fill up to the
/// next multiple of `alignment`.
#[derive(Debug)]
pub struct AlignTo {
    inner: Rc<dyn Codec>,
    alignment: u64,
    fill: Vec<u8>,
}

impl AlignTo {
    pub fn new(inner: impl IntoCodec, alignment: u64) -> Self {
        Self {
            inner: inner.into_codec(),
            alignment,
            fill: vec![0],
        }
    }

    pub fn fill(mut self, fill: impl Into<Vec<u8>>) -> Self {
        self.fill = fill.into();
        self
    }
}

impl Codec for AlignTo {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let value = self.inner.parse(io, ctx)?;
        let adjustment = io.tell()? % self.alignment;
        if adjustment != 0 {
            io.seek(SeekFrom::Current((self.alignment - adjustment) as i64))?;
        }
        Ok(value)
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        self.inner.emit(value, io, ctx)?;
        let adjustment = io.tell()? % self.alignment;
        if adjustment != 0 {
            let fill = repeat_fill(&self.fill, (self.alignment - adjustment) as usize);
            io.write_all(&fill)?;
        }
        Ok(())
    }

    /// Unknown: the pad width depends on where the codec runs.
    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(None)
    }
}

/// Pre-alignment: skip/fill up to the next multiple of
/// `alignment`, then the inner codec.
#[derive(Debug)]
pub struct AlignedTo {
    inner: Rc<dyn Codec>,
    alignment: u64,
    fill: Vec<u8>,
}

impl AlignedTo {
    pub fn new(inner: impl IntoCodec, alignment: u64) -> Self {
        Self {
            inner: inner.into_codec(),
            alignment,
            fill: vec![0],
        }
    }

    pub fn fill(mut self, fill: impl Into<Vec<u8>>) -> Self {
        self.fill = fill.into();
        self
    }
}

impl Codec for AlignedTo {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let adjustment = io.tell()? % self.alignment;
        if adjustment != 0 {
            io.seek(SeekFrom::Current((self.alignment - adjustment) as i64))?;
        }
        self.inner.parse(io, ctx)
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        let adjustment = io.tell()? % self.alignment;
        if adjustment != 0 {
            let fill = repeat_fill(&self.fill, (self.alignment - adjustment) as usize);
            io.write_all(&fill)?;
        }
        self.inner.emit(value, io, ctx)
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(None)
    }
}

type MapFn = Rc<dyn Fn(&Value) -> Result<Value, Error>>;

/// Bijective transform over an inner codec.
///
/// `decode` maps the wire value to the surface value, `encode`
/// the reverse; round-tripping relies on the two being mutual
/// inverses.
pub struct Processed {
    inner: Rc<dyn Codec>,
    decode: MapFn,
    encode: MapFn,
}

impl Processed {
    pub fn new<D, E>(inner: impl IntoCodec, decode: D, encode: E) -> Self
    where
        D: Fn(&Value) -> Result<Value, Error> + 'static,
        E: Fn(&Value) -> Result<Value, Error> + 'static,
    {
        Self {
            inner: inner.into_codec(),
            decode: Rc::new(decode),
            encode: Rc::new(encode),
        }
    }

    /// Finite bijection given as `(wire, surface)` pairs, with an
    /// optional default for unknown values in either direction.
    pub fn mapped(
        inner: impl IntoCodec,
        pairs: Vec<(Value, Value)>,
        default: Option<Value>,
    ) -> Self {
        let forward = pairs.clone();
        let forward_default = default.clone();
        let backward = pairs;
        let backward_default = default;
        Self::new(
            inner,
            move |v| {
                forward
                    .iter()
                    .find(|(wire, _)| wire == v)
                    .map(|(_, surface)| surface.clone())
                    .or_else(|| forward_default.clone())
                    .ok_or_else(|| Error::Unmapped(format!("{v:?}")))
            },
            move |v| {
                backward
                    .iter()
                    .find(|(_, surface)| surface == v)
                    .map(|(wire, _)| wire.clone())
                    .or_else(|| backward_default.clone())
                    .ok_or_else(|| Error::Unmapped(format!("{v:?}")))
            },
        )
    }

    /// Boolean over an integer codec, `1` true and `0` false.
    pub fn boolean(inner: impl IntoCodec) -> Self {
        Self::mapped(
            inner,
            vec![
                (Value::Int(1), Value::Bool(true)),
                (Value::Int(0), Value::Bool(false)),
            ],
            None,
        )
    }
}

impl fmt::Debug for Processed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processed").field("inner", &self.inner).finish()
    }
}

impl Codec for Processed {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let value = self.inner.parse(io, ctx)?;
        (self.decode)(&value)
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        let encoded = (self.encode)(value)?;
        self.inner.emit(&encoded, io, ctx)
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        let encoded = match value {
            Some(v) => Some((self.encode)(v)?),
            None => None,
        };
        self.inner.sizeof(encoded.as_ref(), ctx)
    }
}
