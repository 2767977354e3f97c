//! Primitive codecs: nothing/implied, fixed patterns, padding,
//! raw bytes, integers, and floats.

use std::io::SeekFrom;

use binrw::{BinReaderExt, BinWriterExt, Endian};

use crate::codec::Codec;
use crate::codecs::repeat_fill;
use crate::context::Context;
use crate::errors::Error;
use crate::stream::Stream;
use crate::value::Value;

/// Consumes and produces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nothing;

impl Codec for Nothing {
    fn parse(&self, _io: &mut dyn Stream, _ctx: &mut Context) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn emit(&self, _value: &Value, _io: &mut dyn Stream, _ctx: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(Some(0))
    }
}

/// Produces a constant without consuming bytes. Useful for
/// fields dropped from newer revisions of a layout.
#[derive(Debug, Clone)]
pub struct Implied {
    value: Value,
}

impl Implied {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Codec for Implied {
    fn parse(&self, _io: &mut dyn Stream, _ctx: &mut Context) -> Result<Value, Error> {
        Ok(self.value.clone())
    }

    fn emit(&self, _value: &Value, _io: &mut dyn Stream, _ctx: &mut Context) -> Result<(), Error> {
        Ok(())
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(Some(0))
    }
}

/// A fixed byte pattern, e.g. magic numbers and signatures.
#[derive(Debug, Clone)]
pub struct Fixed {
    pattern: Vec<u8>,
}

impl Fixed {
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Codec for Fixed {
    fn parse(&self, io: &mut dyn Stream, _ctx: &mut Context) -> Result<Value, Error> {
        let data = io.read_at_most(self.pattern.len())?;
        if data != self.pattern {
            return Err(Error::FixedMismatch {
                wanted: self.pattern.clone(),
                got: data,
            });
        }
        Ok(Value::Bytes(data))
    }

    fn emit(&self, _value: &Value, io: &mut dyn Stream, _ctx: &mut Context) -> Result<(), Error> {
        io.write_all(&self.pattern)?;
        Ok(())
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(Some(self.pattern.len() as u64))
    }
}

/// `size` bytes nobody cares about. Parse skips them; emit
/// writes the fill pattern repeated/truncated to `size`.
#[derive(Debug, Clone)]
pub struct Pad {
    size: u64,
    fill: Vec<u8>,
}

impl Pad {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            fill: vec![0],
        }
    }

    pub fn fill(mut self, fill: impl Into<Vec<u8>>) -> Self {
        self.fill = fill.into();
        self
    }
}

impl Codec for Pad {
    fn parse(&self, io: &mut dyn Stream, _ctx: &mut Context) -> Result<Value, Error> {
        io.seek(SeekFrom::Current(self.size as i64))?;
        Ok(Value::Null)
    }

    fn emit(&self, _value: &Value, io: &mut dyn Stream, _ctx: &mut Context) -> Result<(), Error> {
        io.write_all(&repeat_fill(&self.fill, self.size as usize))?;
        Ok(())
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(Some(self.size))
    }
}

/// Raw bytes: a fixed count, or everything to the end of the
/// stream when no size is given.
#[derive(Debug, Clone, Default)]
pub struct Data {
    size: Option<u64>,
}

impl Data {
    /// Reads/writes to end of stream.
    pub fn to_end() -> Self {
        Self { size: None }
    }

    pub fn sized(size: u64) -> Self {
        Self { size: Some(size) }
    }
}

impl Codec for Data {
    fn parse(&self, io: &mut dyn Stream, _ctx: &mut Context) -> Result<Value, Error> {
        let data = match self.size {
            Some(size) => io.read_strict(size as usize)?,
            None => {
                let mut buf = Vec::new();
                io.read_to_end(&mut buf)?;
                buf
            }
        };
        Ok(Value::Bytes(data))
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, _ctx: &mut Context) -> Result<(), Error> {
        io.write_all(value.as_bytes()?)?;
        Ok(())
    }

    fn sizeof(&self, value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        if let Some(value) = value {
            return Ok(Some(value.as_bytes()?.len() as u64));
        }
        Ok(self.size)
    }
}

/// Fixed-width integer, 8/16/32/64 bits, either byte order,
/// signed or unsigned.
#[derive(Debug, Clone, Copy)]
pub struct Int {
    bits: u32,
    signed: bool,
    endian: Endian,
}

impl Int {
    /// Signed integer of `bits` width.
    pub fn new(bits: u32, endian: Endian) -> Self {
        Self {
            bits,
            signed: true,
            endian,
        }
    }

    /// Unsigned integer of `bits` width.
    pub fn unsigned(bits: u32, endian: Endian) -> Self {
        Self {
            bits,
            signed: false,
            endian,
        }
    }
}

impl Codec for Int {
    fn parse(&self, io: &mut dyn Stream, _ctx: &mut Context) -> Result<Value, Error> {
        let mut io = io;
        let endian = self.endian;
        let value: i128 = match (self.bits, self.signed) {
            (8, false) => io.read_type::<u8>(endian)?.into(),
            (16, false) => io.read_type::<u16>(endian)?.into(),
            (32, false) => io.read_type::<u32>(endian)?.into(),
            (64, false) => io.read_type::<u64>(endian)?.into(),
            (8, true) => io.read_type::<i8>(endian)?.into(),
            (16, true) => io.read_type::<i16>(endian)?.into(),
            (32, true) => io.read_type::<i32>(endian)?.into(),
            (64, true) => io.read_type::<i64>(endian)?.into(),
            _ => return Err(Error::UnsupportedWidth(self.bits)),
        };
        Ok(Value::Int(value))
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, _ctx: &mut Context) -> Result<(), Error> {
        let mut io = io;
        let n = value.as_int()?;
        let endian = self.endian;
        let out_of_range = |_| Error::OutOfRange {
            value: n,
            bits: self.bits,
        };
        match (self.bits, self.signed) {
            (8, false) => io.write_type(&u8::try_from(n).map_err(out_of_range)?, endian)?,
            (16, false) => io.write_type(&u16::try_from(n).map_err(out_of_range)?, endian)?,
            (32, false) => io.write_type(&u32::try_from(n).map_err(out_of_range)?, endian)?,
            (64, false) => io.write_type(&u64::try_from(n).map_err(out_of_range)?, endian)?,
            (8, true) => io.write_type(&i8::try_from(n).map_err(out_of_range)?, endian)?,
            (16, true) => io.write_type(&i16::try_from(n).map_err(out_of_range)?, endian)?,
            (32, true) => io.write_type(&i32::try_from(n).map_err(out_of_range)?, endian)?,
            (64, true) => io.write_type(&i64::try_from(n).map_err(out_of_range)?, endian)?,
            _ => return Err(Error::UnsupportedWidth(self.bits)),
        }
        Ok(())
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(Some(u64::from(self.bits / 8)))
    }
}

/// IEEE-754 float, 32 or 64 bits, either byte order.
#[derive(Debug, Clone, Copy)]
pub struct Float {
    bits: u32,
    endian: Endian,
}

impl Float {
    pub fn new(bits: u32, endian: Endian) -> Self {
        Self { bits, endian }
    }
}

impl Codec for Float {
    fn parse(&self, io: &mut dyn Stream, _ctx: &mut Context) -> Result<Value, Error> {
        let mut io = io;
        let value = match self.bits {
            32 => f64::from(io.read_type::<f32>(self.endian)?),
            64 => io.read_type::<f64>(self.endian)?,
            _ => return Err(Error::UnsupportedWidth(self.bits)),
        };
        Ok(Value::Float(value))
    }

    fn emit(&self, value: &Value, io: &mut dyn Stream, _ctx: &mut Context) -> Result<(), Error> {
        let mut io = io;
        let x = value.as_float()?;
        match self.bits {
            32 => io.write_type(&(x as f32), self.endian)?,
            64 => io.write_type(&x, self.endian)?,
            _ => return Err(Error::UnsupportedWidth(self.bits)),
        }
        Ok(())
    }

    fn sizeof(&self, _value: Option<&Value>, _ctx: &mut Context) -> Result<Option<u64>, Error> {
        Ok(Some(u64::from(self.bits / 8)))
    }
}
