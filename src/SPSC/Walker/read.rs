// Read side of the fragment walker.
//
// A fragment is prepared in two phases. Everything that can fail (data not
// yet published, corrupt trailer, bad id, negative sequence length) is
// checked first; only then is walker state committed. A call that returns
// `Ok(false)` or `Err` leaves the consumer exactly as it was.

use super::validate::{self, TemplateId};
use super::Walker::ReadWalker;
use crate::Core::error::{PipeError, Result};
use crate::SPSC::consumer::Consumer;
use crate::SPSC::Structs::{Schema, Token};

impl Consumer {
    /// True once everything below `target` has been published.
    ///
    /// Served from the cached head when possible; the shared head is loaded
    /// only when the cache falls short.
    #[inline]
    pub fn has_content(&mut self, target: u64) -> bool {
        if target <= self.walker.head_cache {
            return true;
        }
        self.walker.head_cache = self.ring.head();
        target <= self.walker.head_cache
    }

    /// True when the next read must start a new message.
    pub fn is_message_complete(&self) -> bool {
        let next = self.walker.next_cursor;
        next < 0 || next as usize >= self.schema.len() || self.schema.is_message_start(next)
    }

    /// Prepare whatever comes next: a new message or the next fragment of the current one.
    ///
    /// Returns `Ok(false)` when the data has not been published yet.
    pub fn try_read_fragment(&mut self) -> Result<bool> {
        if self.is_message_complete() {
            self.prepare_read_message()
        } else {
            self.prepare_read_fragment()
        }
    }

    /// Prepare the first fragment of a message, or an end-of-stream marker.
    pub fn prepare_read_message(&mut self) -> Result<bool> {
        let start = self.walker.next_working_tail;
        let id_pos = start + self.schema.template_offset() as u64;
        if !self.has_content(id_pos + 1) {
            return self.not_available(start, id_pos + 1 - start);
        }

        let id = self.ring.word(id_pos);
        match validate::check_template_id(&self.ring, &self.schema, id, id_pos)? {
            TemplateId::EndOfStream => {
                let size = self.schema.eof_size() as u64;
                let target = start + size;
                if !self.has_content(target) {
                    return Err(validate::partial_fragment(start, size, self.walker.head_cache));
                }
                let bytes = validate::check_trailer(&self.ring, target - 1)? as u64;

                self.begin_fragment(start, target, 0, true, bytes);
                let w = &mut self.walker;
                w.msg_idx_prev = w.msg_idx;
                w.msg_idx = -1;
                w.cursor = -1;
                w.next_cursor = -1;
                w.is_new_message = true;
                w.end_of_stream = true;
                tracing::debug!(position = start, "end of stream marker read");
                Ok(true)
            }
            TemplateId::Message(id) => {
                let size = self.schema.frag_data_size(id as usize) as u64;
                let target = start + size;
                if !self.has_content(target) {
                    return Err(validate::partial_fragment(start, size, self.walker.head_cache));
                }
                let bytes = self.check_fragment(id, start, target)?;

                self.begin_fragment(start, target, 0, true, bytes);
                let w = &mut self.walker;
                w.msg_idx_prev = w.msg_idx;
                w.msg_idx = id;
                w.is_new_message = true;
                w.end_of_stream = false;
                w.messages_read += 1;
                self.enter_fragment(id);
                Ok(true)
            }
        }
    }

    /// Prepare the next fragment of the current message.
    pub fn prepare_read_fragment(&mut self) -> Result<bool> {
        let cursor = self.walker.next_cursor;
        if self.is_message_complete() || !self.schema.is_fragment_start(cursor) {
            return Err(PipeError::NotFragmentStart { cursor });
        }

        let start = self.walker.next_working_tail;
        let size = self.schema.frag_data_size(cursor as usize) as u64;
        let target = start + size;
        if !self.has_content(target) {
            return self.not_available(start, size);
        }
        let bytes = self.check_fragment(cursor, start, target)?;

        let depth = self.schema.frag_depth(cursor as usize).max(0) as usize;
        self.begin_fragment(start, target, depth, false, bytes);
        self.walker.is_new_message = false;
        self.enter_fragment(cursor);
        Ok(true)
    }

    /// Nothing to read yet, unless the head stops inside the fragment.
    fn not_available(&self, start: u64, size: u64) -> Result<bool> {
        if self.walker.head_cache > start {
            return Err(validate::partial_fragment(start, size, self.walker.head_cache));
        }
        Ok(false)
    }

    /// Trailer and sequence length checks for a fully published fragment.
    ///
    /// Returns the fragment's byte count from its trailer.
    fn check_fragment(&self, cursor: i32, start: u64, target: u64) -> Result<u64> {
        let bytes = validate::check_trailer(&self.ring, target - 1)?;
        let last = last_token(&self.schema, cursor);
        if Token::is_group_length(self.schema.token(last)) {
            validate::check_sequence_length(&self.ring, start + self.schema.token_offset(last) as u64)?;
        }
        Ok(bytes as u64)
    }

    /// Commit to the fragment at `[start, target)` whose trailer holds `bytes`.
    fn begin_fragment(&mut self, start: u64, target: u64, depth: usize, message: bool, bytes: u64) {
        let w = &mut self.walker;
        // bytes of the fragment just finished, zero after a raw skip
        w.bytes_working_tail += w.fragment_bytes;
        w.fragment_bytes = bytes;
        if message {
            w.bytes_read_base = w.bytes_working_tail;
            w.sequences.clear();
        }
        w.working_tail = start;
        w.active_fragment[depth] = start;
        w.next_working_tail = target;
        w.has_fragment = true;
        w.fragments_read += 1;
        self.dec_batch_release();
    }

    /// Set the cursors from the fragment's last token, opening or closing sequences.
    fn enter_fragment(&mut self, cursor: i32) {
        let schema = &*self.schema;
        let w = &mut self.walker;
        let last = last_token(schema, cursor);
        let token = schema.token(last);
        w.cursor = cursor;
        w.next_cursor = last as i32 + 1;

        if Token::is_group_length(token) {
            let count = self.ring.word(w.working_tail + schema.token_offset(last) as u64);
            if count > 0 {
                w.sequences.push(count, w.next_cursor);
            } else {
                w.next_cursor = schema.sequence_end[last];
                skip_closes(schema, w);
            }
        } else if Token::is_sequence_close(token) {
            match w.sequences.close_iteration() {
                Some(body) => w.next_cursor = body,
                None => skip_closes(schema, w),
            }
        }
    }

    fn dec_batch_release(&mut self) {
        self.walker.batch_countdown -= 1;
        if self.walker.batch_countdown <= 0 {
            self.release_read_lock();
        }
    }

    /// Publish the working tails so the producer can reuse the space.
    fn release_read_lock(&mut self) {
        let w = &mut self.walker;
        self.ring.release_tail(w.working_tail, w.bytes_working_tail);
        w.batch_countdown = w.batch_release;
        w.release_count += 1;
        tracing::trace!(
            tail = w.working_tail,
            bytes_tail = w.bytes_working_tail,
            releases = w.release_count,
            "released consumed ring space"
        );
    }

    /// Release now instead of waiting for the batch to fill.
    pub fn flush_release(&mut self) {
        let w = &self.walker;
        if w.batch_countdown != w.batch_release || self.ring.tail() != w.working_tail {
            self.release_read_lock();
        }
    }

    /// Snapshot the byte working tail as the base relative spans resolve against.
    pub fn mark_bytes_read_base(&mut self) {
        self.walker.bytes_read_base = self.walker.bytes_working_tail;
    }

    /// Move over raw words that were not framed by the walker.
    ///
    /// The skip starts where the next fragment would, after the one currently
    /// prepared, and may not pass the published head. The prepared fragment's
    /// bytes are consumed with it, so the next read resolves its spans from
    /// the right byte position and its trailer bookkeeping starts fresh.
    pub fn advance_working_tail(&mut self, words: u64) -> Result<()> {
        let requested = self.walker.next_working_tail + words;
        if !self.has_content(requested) {
            return Err(PipeError::Overrun {
                channel: "structured",
                requested,
                limit: self.walker.head_cache,
            });
        }
        let w = &mut self.walker;
        w.bytes_working_tail += w.fragment_bytes;
        w.fragment_bytes = 0;
        w.working_tail = requested;
        w.next_working_tail = requested;
        w.has_fragment = false;
        Ok(())
    }
}

#[inline]
fn last_token(schema: &Schema, cursor: i32) -> usize {
    (cursor + schema.frag_script_size(cursor as usize) - 1) as usize
}

/// Walk over closing tokens that sit between fragments.
///
/// A sequence close with iterations left sends the cursor back to the body;
/// one without pops its frame and the walk goes on, so any number of nested
/// sequences can end at the same point.
fn skip_closes(schema: &Schema, w: &mut ReadWalker) {
    while w.next_cursor >= 0 && (w.next_cursor as usize) < schema.len() {
        let token = schema.token(w.next_cursor as usize);
        if Token::is_sequence_close(token) {
            if let Some(body) = w.sequences.close_iteration() {
                w.next_cursor = body;
                return;
            }
            w.next_cursor += 1;
        } else if Token::is_group_close(token) {
            w.next_cursor += 1;
        } else {
            return;
        }
    }
}
