//! Structured records: ordered fields, unions, generics, hooks.
//!
//! Records are declared through [`RecordType::build`]:
//!
//! ```ignore
//! let body = Rc::new(Switch::new()
//!     .option(Value::Int(1), Int::unsigned(16, Endian::Little))
//!     .option(Value::Int(2), Int::unsigned(32, Endian::Little)));
//! let packet = RecordType::build("Packet")
//!     .field("tag", Int::unsigned(8, Endian::Little))
//!     .hook({
//!         let body = Rc::clone(&body);
//!         move |rec, _ctx| {
//!             if let Some(tag) = rec.get("tag") {
//!                 body.set_selector(tag.clone());
//!             }
//!             Ok(())
//!         }
//!     })
//!     .field("body", &body)
//!     .finish();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::io::SeekFrom;
use std::rc::Rc;

use crate::codec::{Codec, IntoCodec};
use crate::context::{Context, Seg};
use crate::errors::Error;
use crate::stream::Stream;
use crate::value::{Record, Value};

/// A type hole shared by identity across a record's fields.
///
/// Binding happens at record entry: the owning record pushes the
/// bound codec onto the slot's stack, every field holding a clone
/// of the same `Rc<Generic>` sees it, and the record pops on
/// exit. The stack nests correctly when a generic record
/// contains itself with different bindings.
#[derive(Debug, Default)]
pub struct Generic {
    stack: RefCell<Vec<Rc<dyn Codec>>>,
}

impl Generic {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            stack: RefCell::new(Vec::new()),
        })
    }

    /// Pushes a binding. Binding one slot with another resolves
    /// through to the other slot's current codec.
    pub fn resolve(&self, codec: Rc<dyn Codec>) {
        let flattened = match codec.as_generic().and_then(Generic::top) {
            Some(current) => current,
            None => codec,
        };
        self.stack.borrow_mut().push(flattened);
    }

    /// Drops the most recent binding.
    pub fn pop(&self) {
        self.stack.borrow_mut().pop();
    }

    /// Current binding depth; zero outside any owning record.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    fn top(&self) -> Option<Rc<dyn Codec>> {
        self.stack.borrow().last().map(Rc::clone)
    }
}

impl Codec for Generic {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        match self.top() {
            Some(codec) => codec.parse(io, ctx),
            None => Err(Error::UnresolvedGeneric),
        }
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        match self.top() {
            Some(codec) => codec.emit(value, io, ctx),
            None => Err(Error::UnresolvedGeneric),
        }
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        match self.top() {
            Some(codec) => codec.sizeof(value, ctx),
            None => Ok(None),
        }
    }

    fn as_generic(&self) -> Option<&Generic> {
        Some(self)
    }
}

/// Post-field callback: runs after the field value is stored,
/// with the record built so far. May reconfigure later codecs
/// (switch selectors, reference offsets) or stash state in
/// `ctx.user`; it must not touch fields already processed.
pub type Hook = Rc<dyn Fn(&Record, &mut Context) -> Result<(), Error>>;

/// One declared field. A field without a codec is a declared
/// slot that never reaches the stream.
#[derive(Clone)]
pub struct Field {
    name: String,
    codec: Option<Rc<dyn Codec>>,
    hook: Option<Hook>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("codec", &self.codec)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// A structured record codec: ordered fields over one base
/// offset (union) or laid out sequentially, with optional
/// generic slots and post-field hooks.
///
/// Field lists are shared between a record type and its
/// [instantiations](RecordType::instantiate), so generic slots
/// stay identity-shared.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Rc<Vec<Field>>,
    generics: Vec<Rc<Generic>>,
    bound: Vec<Rc<dyn Codec>>,
    union: bool,
    partial: bool,
}

impl RecordType {
    pub fn build(name: &str) -> RecordBuilder {
        RecordBuilder {
            name: name.to_owned(),
            fields: Vec::new(),
            generics: Vec::new(),
            bound: Vec::new(),
            union: false,
            partial: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_union(&self) -> bool {
        self.union
    }

    /// Binds generic slots, producing a new record type with the
    /// same fields and an extended binding list.
    pub fn instantiate(
        &self,
        bindings: impl IntoIterator<Item = Rc<dyn Codec>>,
    ) -> Result<Rc<RecordType>, Error> {
        let mut bound = self.bound.clone();
        bound.extend(bindings);
        if bound.len() > self.generics.len() {
            return Err(Error::TooManyBindings {
                slots: self.generics.len(),
                bindings: bound.len(),
            });
        }
        Ok(Rc::new(RecordType {
            name: self.name.clone(),
            fields: Rc::clone(&self.fields),
            generics: self.generics.clone(),
            bound,
            union: self.union,
            partial: self.partial,
        }))
    }

    fn resolve_generics(&self) {
        for (slot, binding) in self.generics.iter().zip(&self.bound) {
            slot.resolve(Rc::clone(binding));
        }
    }

    fn pop_generics(&self) {
        let resolved = self.generics.len().min(self.bound.len());
        for slot in self.generics.iter().take(resolved) {
            slot.pop();
        }
    }

    fn fresh_value(&self) -> Record {
        Record::new(&self.name, self.fields.iter().map(|f| f.name.clone()))
    }

    fn parse_fields(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        let pos = io.tell()?;
        let mut n = 0_u64;
        let mut rec = self.fresh_value();

        for field in self.fields.iter() {
            let Some(codec) = &field.codec else { continue };
            if self.union {
                io.seek(SeekFrom::Start(pos))?;
            }

            let parsed = ctx.scoped(Seg::Name(field.name.clone()), |ctx| codec.parse(io, ctx));
            let value = match parsed {
                Ok(value) => value,
                Err(err) => {
                    let mut probe = [0_u8; 1];
                    let peeked = io.read(&mut probe)?;
                    if peeked > 0 {
                        io.seek(SeekFrom::Current(-1))?;
                    }
                    // EOF mid-record is an early stop for partial
                    // records, fatal for everything else.
                    if self.partial && peeked == 0 {
                        break;
                    }
                    return Err(err);
                }
            };

            let nbytes = io.tell()? - pos;
            n = match self.union {
                true => n.max(nbytes),
                false => nbytes,
            };

            rec.set(&field.name, value);
            if let Some(hook) = &field.hook {
                hook(&rec, ctx)?;
            }
        }

        io.seek(SeekFrom::Start(pos + n))?;
        Ok(Value::Record(rec))
    }

    fn emit_fields(
        &self,
        value: &Value,
        io: &mut dyn Stream,
        ctx: &mut Context,
    ) -> Result<(), Error> {
        let rec = value.as_record()?;
        let pos = io.tell()?;
        let mut n = 0_u64;

        for field in self.fields.iter() {
            let Some(codec) = &field.codec else { continue };
            if self.union {
                io.seek(SeekFrom::Start(pos))?;
            }

            let field_value = rec.get(&field.name).cloned().unwrap_or(Value::Null);
            ctx.scoped(Seg::Name(field.name.clone()), |ctx| {
                codec.emit(&field_value, io, ctx)
            })?;

            let nbytes = io.tell()? - pos;
            n = match self.union {
                true => n.max(nbytes),
                false => nbytes,
            };

            if let Some(hook) = &field.hook {
                hook(rec, ctx)?;
            }
        }

        io.seek(SeekFrom::Start(pos + n))?;
        Ok(())
    }

    fn sizeof_fields(
        &self,
        value: Option<&Value>,
        ctx: &mut Context,
    ) -> Result<Option<u64>, Error> {
        let rec = match value {
            Some(v) => Some(v.as_record()?),
            None => None,
        };

        let mut n = 0_u64;
        for field in self.fields.iter() {
            let Some(codec) = &field.codec else { continue };
            let field_value = rec.and_then(|r| r.get(&field.name));
            let nbytes = ctx.scoped(Seg::Name(field.name.clone()), |ctx| {
                codec.sizeof(field_value, ctx)
            })?;
            match nbytes {
                Some(nbytes) => {
                    n = match self.union {
                        true => n.max(nbytes),
                        false => n + nbytes,
                    }
                }
                None => return Ok(None),
            }
        }
        Ok(Some(n))
    }
}

impl Codec for RecordType {
    fn parse(&self, io: &mut dyn Stream, ctx: &mut Context) -> Result<Value, Error> {
        self.resolve_generics();
        let result = self.parse_fields(io, ctx);
        self.pop_generics();
        result
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, ctx: &mut Context) -> Result<(), Error> {
        self.resolve_generics();
        let result = self.emit_fields(value, io, ctx);
        self.pop_generics();
        result
    }

    fn sizeof(&self, value: Option<&Value>, ctx: &mut Context) -> Result<Option<u64>, Error> {
        self.resolve_generics();
        let result = self.sizeof_fields(value, ctx);
        self.pop_generics();
        result
    }
}

/// Builder for [`RecordType`]. Fields inherit from bases in
/// declaration order, bases first.
pub struct RecordBuilder {
    name: String,
    fields: Vec<Field>,
    generics: Vec<Rc<Generic>>,
    bound: Vec<Rc<dyn Codec>>,
    union: bool,
    partial: bool,
}

impl RecordBuilder {
    /// Inherits fields, generic slots, and bindings from a base
    /// record. A union base makes this record a union.
    pub fn base(mut self, parent: &RecordType) -> Self {
        self.fields.extend(parent.fields.iter().cloned());
        self.generics.extend(parent.generics.iter().map(Rc::clone));
        self.bound.extend(parent.bound.iter().map(Rc::clone));
        if parent.union {
            self.union = true;
        }
        self
    }

    /// Declares a generic slot. The same `Rc<Generic>` handle is
    /// what fields capture to refer to the slot.
    pub fn generic(mut self, slot: &Rc<Generic>) -> Self {
        self.generics.push(Rc::clone(slot));
        self
    }

    pub fn field(mut self, name: &str, codec: impl IntoCodec) -> Self {
        self.fields.push(Field {
            name: name.to_owned(),
            codec: Some(codec.into_codec()),
            hook: None,
        });
        self
    }

    /// Declares a field that never reaches the stream.
    pub fn skip(mut self, name: &str) -> Self {
        self.fields.push(Field {
            name: name.to_owned(),
            codec: None,
            hook: None,
        });
        self
    }

    /// Attaches a hook to the most recently declared field.
    pub fn hook(
        mut self,
        hook: impl Fn(&Record, &mut Context) -> Result<(), Error> + 'static,
    ) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.hook = Some(Rc::new(hook));
        }
        self
    }

    /// All fields share the record's base offset; the record's
    /// extent is the largest field's.
    pub fn union(mut self) -> Self {
        self.union = true;
        self
    }

    /// EOF during a field parse ends the record after the fields
    /// completed so far instead of failing.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn finish(self) -> Rc<RecordType> {
        Rc::new(RecordType {
            name: self.name,
            fields: Rc::new(self.fields),
            generics: self.generics,
            bound: self.bound,
            union: self.union,
            partial: self.partial,
        })
    }
}
