// Backing storage shared by the two halves of a pipe.

use super::layout::RingControl;

use std::sync::atomic::{AtomicI32, AtomicU8};

/// Smallest allowed channel size, as a power of two.
pub const MIN_BITS: u8 = 1;
/// Largest allowed channel size, as a power of two.
pub const MAX_BITS: u8 = 30;

/// A dual-channel ring: structured words and raw bytes.
///
/// Both channels are power-of-two sized, so an absolute position maps to a
/// slot with a single mask. Array slots are atomics accessed with `Relaxed`
/// ordering; the only synchronizing operations are the release stores and
/// acquire loads of the counters in [`RingControl`].
///
/// ### Concurrency Design:
/// - **Producer**: writes slots in `[head, tail + capacity)` then publishes a new `head`.
/// - **Consumer**: reads slots in `[tail, head)` then releases a new `tail`.
///
/// No slot is ever written by both sides, and no slot is written while the
/// other side may legally read it.
pub struct RingStore {
    /// Cross-thread head and tail counters.
    pub(crate) control: RingControl,

    /// Structured channel: fields, lengths, template ids, byte-count trailers.
    pub(crate) words: Box<[AtomicI32]>,

    /// Byte channel: text and opaque payload.
    pub(crate) bytes: Box<[AtomicU8]>,

    /// `words.len() - 1`
    pub(crate) mask: usize,

    /// `bytes.len() - 1`
    pub(crate) byte_mask: usize,
}
