// Stream consistency checks run by the read side before it commits to a fragment.
//
// Each check logs the offending ring window at error level and returns the
// matching corruption error; none of them mutate walker state.

use crate::Core::error::{PipeError, Result};
use crate::SPSC::Ring::RingStore;
use crate::SPSC::Structs::Schema;

/// Words shown on either side of a bad position.
pub const DIAGNOSTIC_RADIUS: u64 = 16;

/// What an id word found at a message start means.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TemplateId {
    Message(i32),
    EndOfStream,
}

/// Classify the id word of a message.
///
/// Negative ids and the script length mark end of stream. Anything else must
/// be a recorded message start.
pub fn check_template_id(ring: &RingStore, schema: &Schema, id: i32, position: u64) -> Result<TemplateId> {
    let len = schema.len() as i32;
    if id < 0 || id == len {
        return Ok(TemplateId::EndOfStream);
    }
    if schema.is_message_start(id) {
        return Ok(TemplateId::Message(id));
    }
    let (window_start, window) = ring.window(position, DIAGNOSTIC_RADIUS);
    tracing::error!(
        id,
        position,
        valid = ?schema.message_starts(),
        window_start,
        window = ?window,
        "malformed template id"
    );
    Err(PipeError::MalformedTemplateId {
        id,
        position,
        valid: schema.message_starts().to_vec(),
        window_start,
        window,
    })
}

/// A fragment's trailer must hold a byte count the byte channel could have produced.
pub fn check_trailer(ring: &RingStore, position: u64) -> Result<i32> {
    let byte_count = ring.word(position);
    if byte_count >= 0 && byte_count as usize <= ring.byte_capacity() {
        return Ok(byte_count);
    }
    let (window_start, window) = ring.window(position, DIAGNOSTIC_RADIUS);
    tracing::error!(
        position,
        byte_count,
        byte_capacity = ring.byte_capacity(),
        window_start,
        window = ?window,
        "bad fragment start"
    );
    Err(PipeError::CorruptFragmentStart {
        position,
        byte_count,
        byte_capacity: ring.byte_capacity(),
        window_start,
        window,
    })
}

pub fn check_sequence_length(ring: &RingStore, position: u64) -> Result<i32> {
    let length = ring.word(position);
    if length >= 0 {
        return Ok(length);
    }
    tracing::error!(position, length, "negative sequence length");
    Err(PipeError::BadSequenceLength { position, length })
}

/// The published head stops inside the fragment at `start`.
pub fn partial_fragment(start: u64, size: u64, head: u64) -> PipeError {
    tracing::error!(start, size, head, "published head splits a fragment");
    PipeError::PartialFragment {
        position: start,
        expected: size,
        available: head.saturating_sub(start),
    }
}
