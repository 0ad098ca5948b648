use crate::Core::error::{PipeError, Result};
use crate::SPSC::Ring::{RingStore, MAX_BITS, MIN_BITS};
use std::sync::atomic::{AtomicI32, AtomicU8};

/// Sizes of the two channels of one ring, as powers of two.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelSizes {
    pub word_bits: u8,
    pub byte_bits: u8,
}

impl ChannelSizes {
    pub fn new(word_bits: u8, byte_bits: u8) -> Self {
        Self {
            word_bits,
            byte_bits,
        }
    }

    /// Reject sizes outside the supported range.
    pub fn validate(&self) -> Result<()> {
        for (channel, bits) in [("structured", self.word_bits), ("byte", self.byte_bits)] {
            if !(MIN_BITS..=MAX_BITS).contains(&bits) {
                return Err(PipeError::InvalidConfig(format!(
                    "{channel} channel bits must be in {MIN_BITS}..={MAX_BITS}, got {bits}"
                )));
            }
        }
        Ok(())
    }

    pub fn word_capacity(&self) -> usize {
        1usize << self.word_bits
    }

    pub fn byte_capacity(&self) -> usize {
        1usize << self.byte_bits
    }

    /// Total backing memory in bytes, not counting the control block.
    pub fn footprint(&self) -> usize {
        self.word_capacity() * std::mem::size_of::<AtomicI32>() + self.byte_capacity()
    }
}

/// Allocate and zero the backing arrays of a ring.
///
/// This is the only allocation a pipe makes; everything after it runs on
/// the preallocated channels.
pub fn allocate_ring(sizes: ChannelSizes) -> Result<RingStore> {
    sizes.validate()?;

    let words: Box<[AtomicI32]> = (0..sizes.word_capacity()).map(|_| AtomicI32::new(0)).collect();
    let bytes: Box<[AtomicU8]> = (0..sizes.byte_capacity()).map(|_| AtomicU8::new(0)).collect();

    tracing::debug!(
        words = words.len(),
        bytes = bytes.len(),
        footprint = sizes.footprint(),
        "allocated ring channels"
    );
    Ok(RingStore::from_parts(words, bytes))
}
