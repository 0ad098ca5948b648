use std::sync::Arc;

use super::{Consumer, Producer};
use crate::SPSC::Ring::RingStore;
use crate::SPSC::Structs::Schema;

/// Read-side state for codecs and monitoring.
impl Consumer {
    /// Script position of the prepared fragment, -1 at end of stream or before the first read.
    pub fn cursor(&self) -> i32 {
        self.walker.cursor
    }

    /// Script position the next fragment will start at, -1 when a message comes next.
    pub fn next_cursor(&self) -> i32 {
        self.walker.next_cursor
    }

    /// Template id of the current message, -1 when none.
    pub fn message_id(&self) -> i32 {
        self.walker.msg_idx
    }

    pub fn previous_message_id(&self) -> i32 {
        self.walker.msg_idx_prev
    }

    /// True when the prepared fragment is the first of its message.
    pub fn is_new_message(&self) -> bool {
        self.walker.is_new_message
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.walker.end_of_stream
    }

    /// Open sequences around the prepared fragment.
    pub fn sequence_depth(&self) -> usize {
        self.walker.sequences.depth()
    }

    /// Iterations left in the innermost open sequence, counting the current one.
    pub fn sequence_remaining(&self) -> Option<i32> {
        self.walker.sequences.remaining()
    }

    pub fn working_tail(&self) -> u64 {
        self.walker.working_tail
    }

    pub fn next_working_tail(&self) -> u64 {
        self.walker.next_working_tail
    }

    pub fn bytes_working_tail(&self) -> u64 {
        self.walker.bytes_working_tail
    }

    pub fn bytes_read_base(&self) -> u64 {
        self.walker.bytes_read_base
    }

    /// Number of times the tail was actually released to the producer.
    pub fn release_count(&self) -> u64 {
        self.walker.release_count
    }

    pub fn fragments_read(&self) -> u64 {
        self.walker.fragments_read
    }

    pub fn messages_read(&self) -> u64 {
        self.walker.messages_read
    }

    pub fn batch_release(&self) -> i32 {
        self.walker.batch_release
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn ring(&self) -> &RingStore {
        &self.ring
    }
}

/// Write-side state for codecs and monitoring.
impl Producer {
    pub fn working_head(&self) -> u64 {
        self.walker.working_head
    }

    pub fn bytes_working_head(&self) -> u64 {
        self.walker.bytes_working_head
    }

    pub fn bytes_write_base(&self) -> u64 {
        self.walker.bytes_write_base
    }

    /// Start of the most recent fragment opened at `depth`.
    pub fn fragment_start(&self, depth: usize) -> Option<u64> {
        self.walker.active_fragment.get(depth).copied()
    }

    pub fn fragments_written(&self) -> u64 {
        self.walker.fragments_written
    }

    pub fn messages_written(&self) -> u64 {
        self.walker.messages_written
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn ring(&self) -> &RingStore {
        &self.ring
    }
}

impl RingStore {
    /// Published words not yet released.
    pub fn used_words(&self) -> u64 {
        self.head().saturating_sub(self.tail())
    }

    pub fn free_words(&self) -> u64 {
        (self.capacity() as u64).saturating_sub(self.used_words())
    }

    pub fn used_bytes(&self) -> u64 {
        self.bytes_head().saturating_sub(self.bytes_tail())
    }

    pub fn free_bytes(&self) -> u64 {
        (self.byte_capacity() as u64).saturating_sub(self.used_bytes())
    }
}
