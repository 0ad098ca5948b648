use crossbeam_utils::CachePadded;
use std::sync::atomic::AtomicU64;

/// The cross-thread position counters of one pipe.
///
/// Positions are absolute and only ever grow; wrapping into the backing
/// arrays is done with the channel masks at access time. Each counter has a
/// single writer:
/// - the producer stores `head` and `bytes_head` when it publishes,
/// - the consumer stores `tail` and `bytes_tail` when it releases.
///
/// The counters are padded so the producer's stores never invalidate the
/// cache line the consumer is polling, and the other way round.
#[repr(C, align(128))]
pub struct RingControl {
    /// Published end of the structured channel.
    pub head: CachePadded<AtomicU64>,

    /// Published end of the byte channel.
    pub bytes_head: CachePadded<AtomicU64>,

    /// Released start of the structured channel.
    pub tail: CachePadded<AtomicU64>,

    /// Released start of the byte channel.
    pub bytes_tail: CachePadded<AtomicU64>,
}

impl RingControl {
    pub fn new() -> Self {
        Self {
            head: CachePadded::new(AtomicU64::new(0)),
            bytes_head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            bytes_tail: CachePadded::new(AtomicU64::new(0)),
        }
    }
}

impl Default for RingControl {
    fn default() -> Self {
        Self::new()
    }
}
