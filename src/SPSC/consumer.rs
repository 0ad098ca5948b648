// src/SPSC/consumer.rs

use std::sync::Arc;

use crate::SPSC::Ring::RingStore;
use crate::SPSC::Structs::{FieldLoc, Schema};
use crate::SPSC::Walker::ReadWalker;

/// The reading half of a pipe.
///
/// Fragments are prepared with [`Consumer::try_read_fragment`] (or the
/// message/fragment steps it dispatches to); once prepared, the typed
/// accessors below read fields of that fragment, or of any enclosing fragment
/// still on the active stack, by [`FieldLoc`].
///
/// Fields of an enclosing fragment stay readable only until the next release
/// hands their space back to the producer.
pub struct Consumer {
    pub(crate) ring: Arc<RingStore>,
    pub(crate) schema: Arc<Schema>,
    pub(crate) walker: ReadWalker,
}

impl Consumer {
    pub(crate) fn new(ring: Arc<RingStore>, schema: Arc<Schema>, batch_release: i32) -> Self {
        let walker = ReadWalker::new(schema.max_fragment_depth(), batch_release);
        Self {
            ring,
            schema,
            walker,
        }
    }

    #[inline]
    fn position(&self, loc: FieldLoc) -> u64 {
        self.walker.active_fragment[loc.depth] + loc.offset as u64
    }

    pub fn read_int(&self, loc: FieldLoc) -> i32 {
        self.ring.word(self.position(loc))
    }

    /// Longs are stored high word first.
    pub fn read_long(&self, loc: FieldLoc) -> i64 {
        let pos = self.position(loc);
        let high = self.ring.word(pos) as i64;
        let low = self.ring.word(pos + 1) as u32 as i64;
        (high << 32) | low
    }

    /// Returns `(exponent, mantissa)`.
    pub fn read_decimal(&self, loc: FieldLoc) -> (i32, i64) {
        let pos = self.position(loc);
        let exponent = self.ring.word(pos);
        let high = self.ring.word(pos + 1) as i64;
        let low = self.ring.word(pos + 2) as u32 as i64;
        (exponent, (high << 32) | low)
    }

    pub fn read_sequence_length(&self, loc: FieldLoc) -> i32 {
        self.ring.word(self.position(loc))
    }

    /// Length of a byte or text field.
    pub fn read_bytes_len(&self, loc: FieldLoc) -> usize {
        self.ring.word(self.position(loc) + 1).max(0) as usize
    }

    /// Copy a byte or text field into `dst`, returning the number of bytes copied.
    /// Copies at most `dst.len()` bytes.
    pub fn read_bytes(&self, loc: FieldLoc, dst: &mut [u8]) -> usize {
        let pos = self.position(loc);
        let relative = self.ring.word(pos).max(0) as u64;
        let len = (self.ring.word(pos + 1).max(0) as usize).min(dst.len());
        self.ring
            .get_bytes(self.walker.bytes_read_base + relative, &mut dst[..len]);
        len
    }

    /// Replace the contents of `dst` with a byte field, reusing its allocation.
    pub fn read_bytes_into(&self, loc: FieldLoc, dst: &mut Vec<u8>) {
        dst.clear();
        dst.resize(self.read_bytes_len(loc), 0);
        let copied = self.read_bytes(loc, dst);
        dst.truncate(copied);
    }

    /// Replace the contents of `dst` with a text field. Invalid UTF-8 is replaced lossily.
    pub fn read_text(&self, loc: FieldLoc, dst: &mut String) {
        let mut buf = std::mem::take(dst).into_bytes();
        self.read_bytes_into(loc, &mut buf);
        *dst = match String::from_utf8(buf) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
    }
}
