//! Enumerations layered over an integer codec.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use num_enum::TryFromPrimitive;

use crate::codec::{Codec, IntoCodec};
use crate::context::Context;
use crate::errors::Error;
use crate::stream::Stream;
use crate::value::{EnumValue, Value};

/// An enum over the wire as its discriminant.
///
/// `E` is any `#[derive(TryFromPrimitive)]` enum; the inner codec
/// decides width and byte order. Exhaustive by default: a
/// discriminant with no member fails the parse. The tolerant
/// variant passes unknown discriminants through as plain
/// integers, for formats where vendors keep inventing tags.
pub struct Enum<E> {
    inner: Rc<dyn Codec>,
    exhaustive: bool,
    marker: PhantomData<E>,
}

impl<E> Enum<E> {
    pub fn new(inner: impl IntoCodec) -> Self {
        Self {
            inner: inner.into_codec(),
            exhaustive: true,
            marker: PhantomData,
        }
    }

    pub fn tolerant(inner: impl IntoCodec) -> Self {
        Self {
            inner: inner.into_codec(),
            exhaustive: false,
            marker: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Enum<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enum")
            .field("of", &std::any::type_name::<E>())
            .field("inner", &self.inner)
            .field("exhaustive", &self.exhaustive)
            .finish()
    }
}

impl<E> Codec for Enum<E>
where
    E: TryFromPrimitive + 'static,
    E::Primitive: TryFrom<i128> + Into<i128>,
{
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let raw = self.inner.parse(io, ctx)?.as_int()?;
        let member = E::Primitive::try_from(raw)
            .ok()
            .and_then(|p| E::try_from_primitive(p).ok());
        match (member, self.exhaustive) {
            (Some(_), _) => Ok(Value::Enum(EnumValue {
                type_name: std::any::type_name::<E>(),
                raw,
            })),
            (None, false) => Ok(Value::Int(raw)),
            (None, true) => Err(Error::NoSuchMember {
                name: std::any::type_name::<E>(),
                raw,
            }),
        }
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        self.inner.emit(&Value::Int(value.as_int()?), io, ctx)
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        let underlying = match value {
            Some(v) => Some(Value::Int(v.as_int()?)),
            None => None,
        };
        self.inner.sizeof(underlying.as_ref(), ctx)
    }
}
