//! The codec contract and the top-level drivers.

use std::fmt;
use std::io::Cursor;
use std::rc::Rc;

use crate::codecs::compound::Array;
use crate::codecs::record::Generic;
use crate::context::Context;
use crate::errors::Error;
use crate::stream::Stream;
use crate::value::Value;

/// A binary layout that can be read, written, and sized.
///
/// Codecs hold configuration, not per-stream state, so one codec
/// value describes every occurrence of its layout. The contract
/// for linear codecs: after `parse` or `emit` the cursor sits at
/// `start + sizeof`; positional modifiers are exempt and say so.
/// `sizeof` never touches the stream; `Ok(None)` means the size
/// is unknown for the given value.
pub trait Codec: fmt::Debug {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error>;

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error>;

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error>;

    /// Identity hook for generic slots, used when one slot is
    /// resolved with another.
    fn as_generic(&self) -> Option<&Generic> {
        None
    }
}

/// Anything that resolves to a codec: a codec value, a shared
/// codec handle, or a list of codecs (a positional tuple).
pub trait IntoCodec {
    fn into_codec(self) -> Rc<dyn Codec>;
}

impl IntoCodec for Rc<dyn Codec> {
    fn into_codec(self) -> Rc<dyn Codec> {
        self
    }
}

impl IntoCodec for &Rc<dyn Codec> {
    fn into_codec(self) -> Rc<dyn Codec> {
        Rc::clone(self)
    }
}

impl<C: Codec + 'static> IntoCodec for C {
    fn into_codec(self) -> Rc<dyn Codec> {
        Rc::new(self)
    }
}

impl<C: Codec + 'static> IntoCodec for Rc<C> {
    fn into_codec(self) -> Rc<dyn Codec> {
        self
    }
}

impl<C: Codec + 'static> IntoCodec for &Rc<C> {
    fn into_codec(self) -> Rc<dyn Codec> {
        Rc::clone(self) as Rc<dyn Codec>
    }
}

/// A list coerces to a positional tuple codec.
impl IntoCodec for Vec<Rc<dyn Codec>> {
    fn into_codec(self) -> Rc<dyn Codec> {
        Rc::new(Array::tuple(self))
    }
}

/// Parses `bytes` according to `spec`.
pub fn parse(spec: impl IntoCodec, bytes: impl AsRef<[u8]>) -> Result<Value, Error> {
    let codec = spec.into_codec();
    let mut io = Cursor::new(bytes.as_ref().to_vec());
    let mut ctx = Context::new(Rc::clone(&codec));
    parse_with(&codec, &mut io, &mut ctx)
}

/// Parses from an existing stream with an existing context.
/// Errors escaping a context whose path was empty on entry are
/// decorated with the structural path exactly once.
pub fn parse_with(
    spec: impl IntoCodec,
    io: &mut dyn Stream,
    ctx: &mut Context,
) -> Result<Value, Error> {
    let codec = spec.into_codec();
    let at_root = ctx.path().is_empty();
    match codec.parse(io, ctx) {
        Err(err) if at_root => Err(Error::trace(ctx.path().to_vec(), err)),
        other => other,
    }
}

/// Emits `value` according to `spec` and returns the written
/// bytes.
pub fn emit(spec: impl IntoCodec, value: &Value) -> Result<Vec<u8>, Error> {
    let codec = spec.into_codec();
    let mut io = Cursor::new(Vec::new());
    let mut ctx = Context::with_value(Rc::clone(&codec), value.clone());
    emit_with(&codec, value, &mut io, &mut ctx)?;
    Ok(io.into_inner())
}

/// Emits into an existing stream with an existing context.
pub fn emit_with(
    spec: impl IntoCodec,
    value: &Value,
    io: &mut dyn Stream,
    ctx: &mut Context,
) -> Result<(), Error> {
    let codec = spec.into_codec();
    let at_root = ctx.path().is_empty();
    match codec.emit(value, io, ctx) {
        Err(err) if at_root => Err(Error::trace(ctx.path().to_vec(), err)),
        other => other,
    }
}

/// Computes the encoded size of `value` under `spec`; `Ok(None)`
/// when the size depends on data the spec alone cannot provide.
pub fn sizeof(spec: impl IntoCodec, value: Option<&Value>) -> Result<Option<u64>, Error> {
    let codec = spec.into_codec();
    sizeof_fresh(&codec, value)
}

/// Sizes with an existing context.
pub fn sizeof_with(
    spec: impl IntoCodec,
    value: Option<&Value>,
    ctx: &mut Context,
) -> Result<Option<u64>, Error> {
    let codec = spec.into_codec();
    let at_root = ctx.path().is_empty();
    match codec.sizeof(value, ctx) {
        Err(err) if at_root => Err(Error::trace(ctx.path().to_vec(), err)),
        other => other,
    }
}

/// Sizes under a context of its own, without touching the
/// caller's path or scratch state.
pub(crate) fn sizeof_fresh(
    codec: &Rc<dyn Codec>,
    value: Option<&Value>,
) -> Result<Option<u64>, Error> {
    let mut ctx = match value {
        Some(v) => Context::with_value(Rc::clone(codec), v.clone()),
        None => Context::new(Rc::clone(codec)),
    };
    sizeof_with(codec, value, &mut ctx)
}
