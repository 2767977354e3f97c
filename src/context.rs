//! Per-operation state threaded through every codec.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::codec::Codec;
use crate::errors::Error;
use crate::value::Value;

/// One frame of the structural path: a field name or an array
/// index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seg {
    Name(String),
    Index(usize),
}

/// Formats a path as `a.b[2].c`: names joined with dots, indices
/// in brackets with no separator of their own.
pub fn format_path(path: &[Seg]) -> String {
    let mut out = String::new();
    for seg in path {
        match seg {
            Seg::Name(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Seg::Index(i) => {
                let _ = write!(out, "[{i}]");
            }
        }
    }
    out
}

/// State for one parse/emit/sizeof operation.
///
/// Carries the root codec (for back-reference sizing), the root
/// value during emit, the structural path, a user scratch bag
/// shared by all codecs in the operation, and the lazily created
/// back-reference region used by offset-allocating codecs.
pub struct Context {
    /// The outermost codec of the operation.
    pub root: Rc<dyn Codec>,
    /// The root value during emit; `None` for parse and for
    /// sizeof without a value.
    pub value: Option<Value>,
    /// Open scratch namespace for codec-specific state.
    pub user: HashMap<String, Value>,
    path: Vec<Seg>,
    region: Option<RefRegion>,
}

/// Running end of the back-reference region. Offsets are
/// allocated from the end of the root layout outward.
#[derive(Debug, Clone, Copy)]
struct RefRegion {
    size: u64,
}

impl Context {
    pub fn new(root: Rc<dyn Codec>) -> Self {
        Self {
            root,
            value: None,
            user: HashMap::new(),
            path: Vec::new(),
            region: None,
        }
    }

    pub fn with_value(root: Rc<dyn Codec>, value: Value) -> Self {
        let mut ctx = Self::new(root);
        ctx.value = Some(value);
        ctx
    }

    /// Runs `body` with `seg` pushed on the path.
    ///
    /// The frame is popped on every exit path. An error coming
    /// out of `body` that has not been traced yet is decorated
    /// here, while the full path is still on the stack.
    pub fn scoped<R>(
        &mut self,
        seg: Seg,
        body: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.path.push(seg);
        let out = match body(self) {
            Ok(value) => Ok(value),
            Err(err) => Err(Error::trace(self.path.clone(), err)),
        };
        self.path.pop();
        out
    }

    /// Reserves `size` bytes in the back-reference region and
    /// returns the offset of the reservation.
    ///
    /// The region starts where the root layout ends, so it is
    /// seeded with `sizeof(root)` on first use; that size must be
    /// computable.
    pub fn add_ref(&mut self, size: u64) -> Result<u64, Error> {
        if self.region.is_none() {
            let root = Rc::clone(&self.root);
            let seed = crate::codec::sizeof_fresh(&root, self.value.as_ref())?
                .ok_or(Error::UnknownSize)?;
            self.region = Some(RefRegion { size: seed });
        }
        match self.region.as_mut() {
            Some(region) => {
                let offset = region.size;
                region.size += size;
                Ok(offset)
            }
            None => Err(Error::UnknownSize),
        }
    }

    /// Current structural path.
    pub fn path(&self) -> &[Seg] {
        &self.path
    }

    pub fn format_path(&self) -> String {
        format_path(&self.path)
    }
}
