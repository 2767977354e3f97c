//! Deferred parsing of regions whose size is known up front.

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use crate::codec::{Codec, IntoCodec};
use crate::context::Context;
use crate::errors::Error;
use crate::stream::Stream;
use crate::value::Value;

/// Defers the inner parse, advancing the cursor as if it ran.
///
/// The region's size must be knowable at parse time, either
/// declared here or reported by the inner codec without a value.
#[derive(Debug)]
pub struct Lazy {
    inner: Rc<dyn Codec>,
    size: Option<u64>,
}

impl Lazy {
    pub fn new(inner: impl IntoCodec) -> Self {
        Self {
            inner: inner.into_codec(),
            size: None,
        }
    }

    /// Declares the region size instead of asking the inner
    /// codec for it.
    pub fn sized(inner: impl IntoCodec, size: u64) -> Self {
        Self {
            inner: inner.into_codec(),
            size: Some(size),
        }
    }

    fn region_size(&self, ctx: &mut Context) -> Result<u64, Error> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        self.inner.sizeof(None, ctx)?.ok_or(Error::UnknownSize)
    }
}

impl Codec for Lazy {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let size = self.region_size(ctx)?;
        let pos = io.tell()?;
        // Snapshotting the region doubles as advancing the
        // cursor past it.
        let bytes = io.read_strict(size as usize)?;
        Ok(Value::Lazy(Rc::new(LazyEntry {
            codec: Rc::clone(&self.inner),
            pos,
            bytes,
            parsed: RefCell::new(None),
        })))
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        let materialized = match value {
            Value::Lazy(entry) => entry.force()?,
            other => other.clone(),
        };
        self.inner.emit(&materialized, io, ctx)
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        if let Some(size) = self.size {
            return Ok(Some(size));
        }
        match value {
            Some(Value::Lazy(entry)) => {
                let forced = entry.force()?;
                self.inner.sizeof(Some(&forced), ctx)
            }
            other => self.inner.sizeof(other, ctx),
        }
    }
}

/// A deferred parse: the codec, the bytes it will run on, and
/// the cache filled in by the first [`LazyEntry::force`].
#[derive(Debug)]
pub struct LazyEntry {
    codec: Rc<dyn Codec>,
    /// Absolute position the region was snapshotted from.
    pos: u64,
    bytes: Vec<u8>,
    parsed: RefCell<Option<Value>>,
}

impl LazyEntry {
    /// Parses on first call, afterwards returns the cache.
    pub fn force(&self) -> Result<Value, Error> {
        if let Some(value) = &*self.parsed.borrow() {
            return Ok(value.clone());
        }
        let mut io = Cursor::new(self.bytes.clone());
        let mut ctx = Context::new(Rc::clone(&self.codec));
        let value = crate::codec::parse_with(&self.codec, &mut io, &mut ctx)?;
        *self.parsed.borrow_mut() = Some(value.clone());
        Ok(value)
    }

    /// Where the deferred region started in the original stream.
    pub fn position(&self) -> u64 {
        self.pos
    }
}

/// Two entries are equal once both are forced to equal values;
/// an unforced entry only equals itself.
impl PartialEq for LazyEntry {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (&*self.parsed.borrow(), &*other.parsed.borrow()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
