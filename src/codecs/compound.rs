//! Compound codecs: arrays and tagged switches.

use std::cell::RefCell;
use std::io::SeekFrom;
use std::rc::Rc;

use crate::codec::{Codec, IntoCodec};
use crate::context::{Context, Seg};
use crate::errors::Error;
use crate::stream::Stream;
use crate::value::Value;

/// Element spec for an array: one codec for every index, or one
/// codec per index (a positional tuple).
#[derive(Debug, Clone)]
pub enum Elem {
    Uniform(Rc<dyn Codec>),
    PerIndex(Vec<Rc<dyn Codec>>),
}

/// A run of elements.
///
/// Termination, in any combination: a fixed `count`, a byte
/// budget, a sentinel element (parsed but not kept), or end of
/// stream. An element parse that fails exactly at EOF ends the
/// run cleanly; any other failure propagates with the peeked
/// byte put back.
#[derive(Debug, Clone)]
pub struct Array {
    elem: Elem,
    count: Option<u64>,
    byte_size: Option<u64>,
    sentinel: Option<Value>,
}

impl Array {
    pub fn new(elem: impl IntoCodec) -> Self {
        Self {
            elem: Elem::Uniform(elem.into_codec()),
            count: None,
            byte_size: None,
            sentinel: None,
        }
    }

    /// Positional tuple: one codec per element, count fixed.
    pub fn tuple(codecs: Vec<Rc<dyn Codec>>) -> Self {
        Self {
            count: Some(codecs.len() as u64),
            elem: Elem::PerIndex(codecs),
            byte_size: None,
            sentinel: None,
        }
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn byte_size(mut self, byte_size: u64) -> Self {
        self.byte_size = Some(byte_size);
        self
    }

    pub fn sentinel(mut self, sentinel: Value) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    fn elem_at(&self, i: usize) -> Result<Rc<dyn Codec>, Error> {
        match &self.elem {
            Elem::Uniform(codec) => Ok(Rc::clone(codec)),
            Elem::PerIndex(codecs) => codecs
                .get(i)
                .map(Rc::clone)
                .ok_or(Error::NoElementCodec(i)),
        }
    }
}

impl Codec for Array {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let mut items = Vec::new();
        let start = io.tell()?;
        let mut i = 0_usize;

        loop {
            if let Some(count) = self.count {
                if i as u64 >= count {
                    break;
                }
            }
            if let Some(byte_size) = self.byte_size {
                if io.tell()? - start >= byte_size {
                    break;
                }
            }

            let codec = self.elem_at(i)?;
            let elem = match ctx.scoped(Seg::Index(i), |ctx| codec.parse(io, ctx)) {
                Ok(elem) => elem,
                Err(err) => {
                    // EOF at an element boundary ends the run;
                    // anything else propagates untouched.
                    let mut probe = [0_u8; 1];
                    let peeked = io.read(&mut probe)?;
                    if peeked == 0 {
                        break;
                    }
                    io.seek(SeekFrom::Current(-1))?;
                    return Err(err);
                }
            };

            if let Some(sentinel) = &self.sentinel {
                if &elem == sentinel {
                    break;
                }
            }

            items.push(elem);
            i += 1;
        }

        Ok(Value::List(items))
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        let mut items = value.as_list()?.to_vec();
        if let Some(sentinel) = &self.sentinel {
            items.push(sentinel.clone());
        }

        let start = io.tell()?;
        for (i, elem) in items.iter().enumerate() {
            if let Some(byte_size) = self.byte_size {
                if io.tell()? - start >= byte_size {
                    return Err(Error::OversizedArray { max: byte_size });
                }
            }
            let codec = self.elem_at(i)?;
            ctx.scoped(Seg::Index(i), |ctx| codec.emit(elem, io, ctx))?;
        }
        Ok(())
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        if let Some(byte_size) = self.byte_size {
            return Ok(Some(byte_size));
        }
        let Some(count) = self.count else {
            return Ok(None);
        };

        let items = match value {
            Some(v) => Some(v.as_list()?),
            None => None,
        };

        let mut total = 0_u64;
        for i in 0..count as usize {
            let codec = self.elem_at(i)?;
            let item = items.and_then(|l| l.get(i));
            match codec.sizeof(item, ctx)? {
                Some(size) => total += size,
                None => return Ok(None),
            }
        }

        if let Some(sentinel) = &self.sentinel {
            let codec = self.elem_at(count as usize)?;
            match codec.sizeof(Some(sentinel), ctx)? {
                Some(size) => total += size,
                None => return Ok(None),
            }
        }

        Ok(Some(total))
    }
}

/// Dispatch on a runtime selector, usually set by the hook of an
/// earlier record field.
///
/// Options are matched in insertion order; a missing or unknown
/// selector falls back to the fallback codec when one is set and
/// is an error otherwise.
#[derive(Debug, Default)]
pub struct Switch {
    options: Vec<(Value, Rc<dyn Codec>)>,
    selector: RefCell<Option<Value>>,
    fallback: Option<Rc<dyn Codec>>,
}

impl Switch {
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            selector: RefCell::new(None),
            fallback: None,
        }
    }

    pub fn option(mut self, selector: Value, codec: impl IntoCodec) -> Self {
        self.options.push((selector, codec.into_codec()));
        self
    }

    pub fn fallback(mut self, codec: impl IntoCodec) -> Self {
        self.fallback = Some(codec.into_codec());
        self
    }

    /// Initial selector, for switches not driven by a hook.
    pub fn preset(self, selector: Value) -> Self {
        self.set_selector(selector);
        self
    }

    pub fn set_selector(&self, selector: Value) {
        *self.selector.borrow_mut() = Some(selector);
    }

    fn current(&self) -> Result<Rc<dyn Codec>, Error> {
        let selector = self.selector.borrow();
        match &*selector {
            Some(sel) => match self.options.iter().find(|(key, _)| key == sel) {
                Some((_, codec)) => Ok(Rc::clone(codec)),
                None => match &self.fallback {
                    Some(fallback) => Ok(Rc::clone(fallback)),
                    None => Err(Error::BadSelector(format!("{sel:?}"))),
                },
            },
            None => match &self.fallback {
                Some(fallback) => Ok(Rc::clone(fallback)),
                None => Err(Error::SelectorUnset),
            },
        }
    }
}

impl Codec for Switch {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        self.current()?.parse(io, ctx)
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        self.current()?.emit(value, io, ctx)
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        self.current()?.sizeof(value, ctx)
    }
}
