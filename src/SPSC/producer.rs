// src/SPSC/producer.rs

use std::sync::Arc;

use crate::Core::error::{PipeError, Result};
use crate::SPSC::Ring::RingStore;
use crate::SPSC::Structs::{FieldLoc, Schema};
use crate::SPSC::Walker::WriteWalker;

/// The writing half of a pipe.
///
/// A fragment is opened with [`Producer::try_write_fragment`], filled through
/// the typed writers below, and becomes visible to the consumer on
/// [`Producer::publish`]. Several fragments may be written before one publish.
pub struct Producer {
    pub(crate) ring: Arc<RingStore>,
    pub(crate) schema: Arc<Schema>,
    pub(crate) walker: WriteWalker,
}

impl Producer {
    pub(crate) fn new(ring: Arc<RingStore>, schema: Arc<Schema>) -> Self {
        let walker = WriteWalker::new(schema.max_fragment_depth());
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

    pub fn write_int(&mut self, loc: FieldLoc, value: i32) {
        self.ring.set_word(self.position(loc), value);
    }

    /// Stored high word first.
    pub fn write_long(&mut self, loc: FieldLoc, value: i64) {
        let pos = self.position(loc);
        self.ring.set_word(pos, (value >> 32) as i32);
        self.ring.set_word(pos + 1, value as i32);
    }

    pub fn write_decimal(&mut self, loc: FieldLoc, exponent: i32, mantissa: i64) {
        let pos = self.position(loc);
        self.ring.set_word(pos, exponent);
        self.ring.set_word(pos + 1, (mantissa >> 32) as i32);
        self.ring.set_word(pos + 2, mantissa as i32);
    }

    pub fn write_sequence_length(&mut self, loc: FieldLoc, length: i32) {
        self.ring.set_word(self.position(loc), length);
    }

    /// Append `src` to the byte channel and record its span in the field.
    ///
    /// Fails with `Overrun` when the byte channel has no room; reserve the
    /// bytes up front with [`Producer::try_write_fragment_with_bytes`] to get
    /// a recoverable `false` instead.
    ///
    /// The span is stored as two `i32` words, so a message whose bytes run
    /// past `i32::MAX` from its start is also refused with `Overrun`.
    pub fn write_bytes(&mut self, loc: FieldLoc, src: &[u8]) -> Result<()> {
        let len = src.len() as u64;
        if !self.has_room_for(0, len) {
            return Err(PipeError::Overrun {
                channel: "byte",
                requested: self.walker.bytes_working_head + len,
                limit: self.walker.bytes_tail_cache + self.ring.byte_capacity() as u64,
            });
        }
        let relative = self.walker.bytes_working_head - self.walker.bytes_write_base;
        if relative + len > i32::MAX as u64 {
            return Err(PipeError::Overrun {
                channel: "byte",
                requested: relative + len,
                limit: i32::MAX as u64,
            });
        }
        let pos = self.position(loc);
        let w = &mut self.walker;
        self.ring.put_bytes(w.bytes_working_head, src);
        w.bytes_working_head += len;
        self.ring.set_word(pos, relative as i32);
        self.ring.set_word(pos + 1, len as i32);
        Ok(())
    }

    pub fn write_text(&mut self, loc: FieldLoc, text: &str) -> Result<()> {
        self.write_bytes(loc, text.as_bytes())
    }
}
