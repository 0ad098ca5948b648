// Write side of the fragment walker.

use super::Walker::{OpenFragment, WriteWalker};
use crate::Core::error::{PipeError, Result};
use crate::SPSC::producer::Producer;

impl Producer {
    /// True when `words` structured words and `bytes` bytes fit behind the consumer's tail.
    ///
    /// The cached tails are refreshed at most once, and only when they are
    /// not enough on their own.
    pub fn has_room_for(&mut self, words: u64, bytes: u64) -> bool {
        let capacity = self.ring.capacity() as u64;
        let byte_capacity = self.ring.byte_capacity() as u64;
        let w = &mut self.walker;
        let fits = |w: &WriteWalker| {
            w.working_head + words <= w.tail_cache + capacity
                && w.bytes_working_head + bytes <= w.bytes_tail_cache + byte_capacity
        };
        if fits(&*w) {
            return true;
        }
        w.tail_cache = self.ring.tail();
        w.bytes_tail_cache = self.ring.bytes_tail();
        fits(&*w)
    }

    /// Open the fragment that starts at script position `cursor`.
    ///
    /// Returns `Ok(false)` without touching anything when the ring is full.
    pub fn try_write_fragment(&mut self, cursor: i32) -> Result<bool> {
        self.try_write_fragment_with_bytes(cursor, 0)
    }

    /// Like [`Producer::try_write_fragment`], also reserving `bytes` in the byte channel.
    pub fn try_write_fragment_with_bytes(&mut self, cursor: i32, bytes: usize) -> Result<bool> {
        if !self.schema.is_fragment_start(cursor) {
            return Err(PipeError::NotFragmentStart { cursor });
        }
        let size = self.schema.frag_data_size(cursor as usize) as u64;
        if !self.has_room_for(size, bytes as u64) {
            return Ok(false);
        }
        self.prepare_write_fragment(cursor);
        Ok(true)
    }

    /// Record where the fragment starts and move the working head past it.
    /// A message start also resets the byte base and stamps the template id.
    fn prepare_write_fragment(&mut self, cursor: i32) {
        self.close_fragment();

        let size = self.schema.frag_data_size(cursor as usize) as u64;
        let start = self.walker.working_head;
        if self.schema.is_message_start(cursor) {
            self.mark_bytes_write_base();
            self.walker.active_fragment[0] = start;
            self.ring
                .set_word(start + self.schema.template_offset() as u64, cursor);
            self.walker.messages_written += 1;
        } else {
            let depth = self.schema.frag_depth(cursor as usize).max(0) as usize;
            self.walker.active_fragment[depth] = start;
        }

        let w = &mut self.walker;
        w.open = Some(OpenFragment {
            trailer_pos: start + size - 1,
            bytes_start: w.bytes_working_head,
        });
        w.working_head = start + size;
        w.fragments_written += 1;
    }

    /// Write the open fragment's byte count into its trailer.
    fn close_fragment(&mut self) {
        if let Some(open) = self.walker.open.take() {
            let written = self.walker.bytes_working_head - open.bytes_start;
            self.ring.set_word(open.trailer_pos, written as i32);
        }
    }

    /// Make every fragment written so far visible to the consumer.
    pub fn publish(&mut self) {
        self.close_fragment();
        self.ring
            .publish_head(self.walker.working_head, self.walker.bytes_working_head);
    }

    /// Write and publish an end-of-stream marker. Returns `false` when the ring is full.
    pub fn publish_eof(&mut self) -> bool {
        self.close_fragment();
        let size = self.schema.eof_size() as u64;
        if !self.has_room_for(size, 0) {
            return false;
        }
        self.mark_bytes_write_base();
        let start = self.walker.working_head;
        self.ring
            .set_word(start + self.schema.template_offset() as u64, -1);
        self.ring.set_word(start + size - 1, 0);
        self.walker.working_head = start + size;
        self.publish();
        tracing::debug!(position = start, "end of stream marker published");
        true
    }

    /// Snapshot the byte working head as the base for relative spans.
    pub fn mark_bytes_write_base(&mut self) {
        self.walker.bytes_write_base = self.walker.bytes_working_head;
    }

    /// Store a word `offset` words past the working head without framing it.
    ///
    /// Check [`Producer::has_room_for`] first, then claim the words with
    /// [`Producer::advance_working_head`].
    pub fn write_raw(&mut self, offset: u64, value: i32) {
        self.ring.set_word(self.walker.working_head + offset, value);
    }

    /// Move the working head forward over raw words written without the walker.
    ///
    /// The working head may not run more than one capacity ahead of the released tail.
    pub fn advance_working_head(&mut self, words: u64) -> Result<()> {
        if !self.has_room_for(words, 0) {
            return Err(PipeError::Overrun {
                channel: "structured",
                requested: self.walker.working_head + words,
                limit: self.walker.tail_cache + self.ring.capacity() as u64,
            });
        }
        self.close_fragment();
        self.walker.working_head += words;
        Ok(())
    }
}
