// Pass-through of prepared fragments from one pipe into another.

use crate::Core::error::{PipeError, Result};
use crate::SPSC::consumer::Consumer;
use crate::SPSC::producer::Producer;

/// Copy the fragment `source` has prepared into `dest` and publish it.
///
/// The structured words, including the template id and the byte-count
/// trailer, are copied verbatim, followed by the fragment's byte span.
/// Relative byte positions stay valid because the byte stream is copied in
/// order and a message start resets the destination's byte base.
///
/// Returns `Ok(false)` and writes nothing when `dest` lacks room in either
/// channel.
pub fn copy_fragment(source: &Consumer, dest: &mut Producer) -> Result<bool> {
    let read = &source.walker;
    if !read.has_fragment {
        return Err(PipeError::NoActiveFragment);
    }

    let start = read.working_tail;
    let end = read.next_working_tail;
    let words = end - start;
    let bytes = read.fragment_bytes;

    if !dest.has_room_for(words, bytes) {
        tracing::trace!(
            words,
            bytes,
            dest_head = dest.walker.working_head,
            dest_tail = dest.walker.tail_cache,
            "copy refused, destination full"
        );
        return Ok(false);
    }

    dest.publish();
    if read.is_new_message {
        dest.mark_bytes_write_base();
    }

    let w = &mut dest.walker;
    dest.ring
        .copy_words_from(&source.ring, start, w.working_head, words);
    dest.ring
        .copy_bytes_from(&source.ring, read.bytes_working_tail, w.bytes_working_head, bytes);
    w.working_head += words;
    w.bytes_working_head += bytes;
    w.fragments_written += 1;
    if read.is_new_message && !read.end_of_stream {
        w.messages_written += 1;
    }

    dest.publish();
    Ok(true)
}
