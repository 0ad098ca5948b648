// Per-side cursor state. Each struct is owned by exactly one half of a pipe,
// so nothing here is shared or atomic.

/// Fixed-capacity stack of open sequences.
///
/// Each frame holds the iterations still to be read and the script position
/// of the sequence body to return to.
pub struct SequenceStack {
    counts: Box<[i32]>,
    cursors: Box<[i32]>,
    top: usize,
}

impl SequenceStack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts: vec![0; capacity].into_boxed_slice(),
            cursors: vec![0; capacity].into_boxed_slice(),
            top: 0,
        }
    }

    /// Number of open frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.top
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn capacity(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn push(&mut self, count: i32, cursor: i32) {
        debug_assert!(self.top < self.counts.len(), "sequence stack overflow");
        self.counts[self.top] = count;
        self.cursors[self.top] = cursor;
        self.top += 1;
    }

    /// Consume one iteration of the innermost sequence.
    ///
    /// Returns the body cursor while iterations remain, or `None` after the
    /// last one, in which case the frame has been popped.
    #[inline]
    pub fn close_iteration(&mut self) -> Option<i32> {
        if self.top == 0 {
            return None;
        }
        let i = self.top - 1;
        self.counts[i] -= 1;
        if self.counts[i] > 0 {
            Some(self.cursors[i])
        } else {
            self.top = i;
            None
        }
    }

    /// Remaining count of the innermost frame.
    pub fn remaining(&self) -> Option<i32> {
        self.top.checked_sub(1).map(|i| self.counts[i])
    }

    pub fn clear(&mut self) {
        self.top = 0;
    }
}

/// Read-side walker state, owned by the consumer.
pub struct ReadWalker {
    /// Script position of the fragment most recently prepared, -1 when none or end of stream.
    pub(crate) cursor: i32,
    /// Script position of the next fragment, -1 when the next read starts a message.
    pub(crate) next_cursor: i32,
    pub(crate) msg_idx: i32,
    pub(crate) msg_idx_prev: i32,
    pub(crate) is_new_message: bool,
    pub(crate) end_of_stream: bool,
    pub(crate) has_fragment: bool,

    /// Last observed producer head.
    pub(crate) head_cache: u64,
    /// Start of the fragment being read; everything before it may be released.
    pub(crate) working_tail: u64,
    /// Start of the next fragment.
    pub(crate) next_working_tail: u64,
    /// Start of the current fragment's bytes.
    pub(crate) bytes_working_tail: u64,
    /// Byte position that relative spans of the current message resolve against.
    pub(crate) bytes_read_base: u64,
    /// Validated trailer of the current fragment, folded into the byte tail when it is left.
    pub(crate) fragment_bytes: u64,

    /// Fragment start per nesting depth.
    pub(crate) active_fragment: Box<[u64]>,
    pub(crate) sequences: SequenceStack,

    pub(crate) batch_release: i32,
    pub(crate) batch_countdown: i32,

    pub(crate) release_count: u64,
    pub(crate) fragments_read: u64,
    pub(crate) messages_read: u64,
}

impl ReadWalker {
    pub fn new(max_depth: usize, batch_release: i32) -> Self {
        Self {
            cursor: -1,
            next_cursor: -1,
            msg_idx: -1,
            msg_idx_prev: -1,
            is_new_message: false,
            end_of_stream: false,
            has_fragment: false,
            head_cache: 0,
            working_tail: 0,
            next_working_tail: 0,
            bytes_working_tail: 0,
            bytes_read_base: 0,
            fragment_bytes: 0,
            active_fragment: vec![0; max_depth].into_boxed_slice(),
            sequences: SequenceStack::with_capacity(max_depth),
            batch_release,
            batch_countdown: batch_release,
            release_count: 0,
            fragments_read: 0,
            messages_read: 0,
        }
    }

    /// Back to the freshly constructed state, keeping the allocations.
    pub fn reset(&mut self) {
        self.cursor = -1;
        self.next_cursor = -1;
        self.msg_idx = -1;
        self.msg_idx_prev = -1;
        self.is_new_message = false;
        self.end_of_stream = false;
        self.has_fragment = false;
        self.head_cache = 0;
        self.working_tail = 0;
        self.next_working_tail = 0;
        self.bytes_working_tail = 0;
        self.bytes_read_base = 0;
        self.fragment_bytes = 0;
        self.active_fragment.iter_mut().for_each(|p| *p = 0);
        self.sequences.clear();
        self.batch_countdown = self.batch_release;
        self.release_count = 0;
        self.fragments_read = 0;
        self.messages_read = 0;
    }
}

/// The fragment the producer is currently filling.
#[derive(Copy, Clone, Debug)]
pub(crate) struct OpenFragment {
    pub(crate) trailer_pos: u64,
    pub(crate) bytes_start: u64,
}

/// Write-side walker state, owned by the producer.
pub struct WriteWalker {
    /// Last observed consumer tails.
    pub(crate) tail_cache: u64,
    pub(crate) bytes_tail_cache: u64,
    /// End of everything written, published or not.
    pub(crate) working_head: u64,
    pub(crate) bytes_working_head: u64,
    /// Byte position relative spans of the current message are measured from.
    pub(crate) bytes_write_base: u64,

    pub(crate) active_fragment: Box<[u64]>,
    pub(crate) open: Option<OpenFragment>,

    pub(crate) fragments_written: u64,
    pub(crate) messages_written: u64,
}

impl WriteWalker {
    pub fn new(max_depth: usize) -> Self {
        Self {
            tail_cache: 0,
            bytes_tail_cache: 0,
            working_head: 0,
            bytes_working_head: 0,
            bytes_write_base: 0,
            active_fragment: vec![0; max_depth].into_boxed_slice(),
            open: None,
            fragments_written: 0,
            messages_written: 0,
        }
    }

    pub fn reset(&mut self) {
        self.tail_cache = 0;
        self.bytes_tail_cache = 0;
        self.working_head = 0;
        self.bytes_working_head = 0;
        self.bytes_write_base = 0;
        self.active_fragment.iter_mut().for_each(|p| *p = 0);
        self.open = None;
        self.fragments_written = 0;
        self.messages_written = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_frames_close_inner_first() {
        let mut stack = SequenceStack::with_capacity(3);
        stack.push(2, 10);
        stack.push(1, 20);
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.close_iteration(), None);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.close_iteration(), Some(10));
        assert_eq!(stack.remaining(), Some(1));
        assert_eq!(stack.close_iteration(), None);
        assert!(stack.is_empty());
        assert_eq!(stack.close_iteration(), None);
    }
}
