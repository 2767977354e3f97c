//! Seekable byte streams and the bounded view over them.
//!
//! Everything a codec reads from or writes to is a [`Stream`]:
//! any `Read + Write + Seek` type qualifies, so `Cursor<Vec<u8>>`
//! is the canonical in-memory stream and `File` works unchanged.
//! [`Bounded`] clamps reads and writes to a window of its parent
//! stream, for atoms/chunks/regions whose size is known up front.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::errors::Error;

/// A seekable byte stream.
///
/// Blanket-implemented for every `Read + Write + Seek` type.
/// All positions are absolute unless a wrapper says otherwise.
pub trait Stream: Read + Write + Seek {
    /// Returns the current position.
    fn tell(&mut self) -> Result<u64, Error> {
        Ok(self.stream_position()?)
    }

    /// Reads up to `n` bytes; fewer only at end of stream.
    fn read_at_most(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0_u8; n];
        let mut filled = 0;
        while filled < n {
            let read = self.read(&mut buf[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// Reads exactly `n` bytes or fails with a short-read error.
    fn read_strict(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        let buf = self.read_at_most(n)?;
        if buf.len() != n {
            return Err(Error::ShortRead {
                wanted: n as u64,
                got: buf.len() as u64,
            });
        }
        Ok(buf)
    }
}

impl<T: Read + Write + Seek> Stream for T {}

/// Runs `body` with the cursor moved to `to`, restoring the
/// original position afterwards on every exit path.
pub(crate) fn with_seek<R>(
    io: &mut dyn Stream,
    to: SeekFrom,
    body: impl FnOnce(&mut dyn Stream) -> Result<R, Error>,
) -> Result<R, Error> {
    let saved = io.tell()?;
    io.seek(to)?;
    let out = body(io);
    let restored = io.seek(SeekFrom::Start(saved));
    match (out, restored) {
        (Ok(value), Ok(_)) => Ok(value),
        (Err(err), _) => Err(err),
        (_, Err(err)) => Err(err.into()),
    }
}

/// View over a window of a parent stream, with read/write
/// boundaries relative to the position it was constructed at.
///
/// The view does not own the parent cursor. It repositions the
/// parent before every operation, so interleaved access through
/// the view stays coherent even if something else moved the
/// parent in between. `tell()` reports absolute parent
/// coordinates (`start + cursor`).
pub struct Bounded<'a> {
    parent: &'a mut dyn Stream,
    /// Absolute parent position of the window start.
    start: u64,
    /// Window width in bytes.
    limit: u64,
    /// Cursor relative to `start`.
    pos: u64,
}

impl<'a> std::fmt::Debug for Bounded<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bounded")
            .field("start", &self.start)
            .field("limit", &self.limit)
            .field("pos", &self.pos)
            .finish()
    }
}

impl<'a> Bounded<'a> {
    /// Opens a `limit`-byte window starting at the parent's
    /// current position.
    pub fn new(parent: &'a mut dyn Stream, limit: u64) -> Result<Self, Error> {
        let start = parent.tell()?;
        Ok(Self {
            parent,
            start,
            limit,
            pos: 0,
        })
    }

    /// Remaining bytes until the window limit.
    pub fn remaining(&self) -> u64 {
        self.limit - self.pos.min(self.limit)
    }

    fn sync_parent(&mut self) -> std::io::Result<()> {
        self.parent.seek(SeekFrom::Start(self.start + self.pos))?;
        Ok(())
    }
}

impl Read for Bounded<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.sync_parent()?;
        let cap = (self.remaining() as usize).min(buf.len());
        if cap == 0 {
            return Ok(0);
        }
        let read = self.parent.read(&mut buf[..cap])?;
        self.pos += read as u64;
        Ok(read)
    }
}

impl Write for Bounded<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.sync_parent()?;
        let remaining = self.remaining();
        if buf.len() as u64 > remaining {
            return Err(Error::PastLimit {
                excess: buf.len() as u64 - remaining,
            }
            .into());
        }
        self.parent.write_all(buf)?;
        self.pos += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.parent.flush()
    }
}

impl Seek for Bounded<'_> {
    /// `Start` targets are absolute parent coordinates; `End` is
    /// relative to the window limit. Seeking before the window
    /// start is an error, seeking past the limit is allowed (a
    /// later write will fail instead).
    fn seek(&mut self, target: SeekFrom) -> std::io::Result<u64> {
        let pos: i128 = match target {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(n) => (self.start + self.pos) as i128 + n as i128,
            SeekFrom::End(n) => (self.start + self.limit) as i128 + n as i128,
        };
        if pos < self.start as i128 {
            return Err(Error::SeekBeforeStart {
                pos,
                start: self.start,
            }
            .into());
        }
        self.pos = pos as u64 - self.start;
        self.sync_parent()?;
        Ok(self.start + self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn bounded_read_caps_at_limit() {
        let mut io = Cursor::new(vec![1, 2, 3, 4, 5, 6]);
        io.seek(SeekFrom::Start(1)).unwrap();
        let mut view = Bounded::new(&mut io, 3).unwrap();
        let bytes = view.read_at_most(10).unwrap();
        assert_eq!(bytes, vec![2, 3, 4]);
        assert_eq!(view.tell().unwrap(), 4);
    }

    #[test]
    fn bounded_tell_is_absolute() {
        let mut io = Cursor::new(vec![0; 8]);
        io.seek(SeekFrom::Start(2)).unwrap();
        let mut view = Bounded::new(&mut io, 4).unwrap();
        view.read_strict(1).unwrap();
        assert_eq!(view.tell().unwrap(), 3);
        view.seek(SeekFrom::End(-1)).unwrap();
        assert_eq!(view.tell().unwrap(), 5);
    }

    #[test]
    fn bounded_write_past_limit_fails() {
        let mut io = Cursor::new(vec![0; 8]);
        let mut view = Bounded::new(&mut io, 2).unwrap();
        let err = view.write_all(&[1, 2, 3]).unwrap_err();
        assert!(matches!(Error::from(err), Error::PastLimit { excess: 1 }));
    }

    #[test]
    fn bounded_seek_before_start_fails() {
        let mut io = Cursor::new(vec![0; 8]);
        io.seek(SeekFrom::Start(4)).unwrap();
        let mut view = Bounded::new(&mut io, 2).unwrap();
        assert!(view.seek(SeekFrom::Start(1)).is_err());
    }

    #[test]
    fn with_seek_restores_on_failure() {
        let mut io = Cursor::new(vec![0; 8]);
        io.seek(SeekFrom::Start(5)).unwrap();
        let result: Result<(), Error> = with_seek(&mut io, SeekFrom::Start(0), |_| {
            Err(Error::UnknownSize)
        });
        assert!(result.is_err());
        assert_eq!(io.tell().unwrap(), 5);
    }
}
