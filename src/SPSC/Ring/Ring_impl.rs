use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicI32, AtomicU8};

use super::layout::RingControl;
use super::Ring::RingStore;

impl RingStore {
    /// Wrap pre-allocated channel arrays. Both lengths must be powers of two.
    pub(crate) fn from_parts(words: Box<[AtomicI32]>, bytes: Box<[AtomicU8]>) -> Self {
        debug_assert!(words.len().is_power_of_two());
        debug_assert!(bytes.len().is_power_of_two());
        let mask = words.len() - 1;
        let byte_mask = bytes.len() - 1;
        Self {
            control: RingControl::new(),
            words,
            bytes,
            mask,
            byte_mask,
        }
    }

    /// Structured channel capacity in words.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Byte channel capacity.
    #[inline]
    pub fn byte_capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn word(&self, position: u64) -> i32 {
        self.words[(position as usize) & self.mask].load(Relaxed)
    }

    #[inline]
    pub(crate) fn set_word(&self, position: u64, value: i32) {
        self.words[(position as usize) & self.mask].store(value, Relaxed);
    }

    #[inline]
    pub fn byte(&self, position: u64) -> u8 {
        self.bytes[(position as usize) & self.byte_mask].load(Relaxed)
    }

    /// Copy `src` into the byte channel starting at `position`, wrapping as needed.
    pub(crate) fn put_bytes(&self, position: u64, src: &[u8]) {
        for (i, &b) in src.iter().enumerate() {
            self.bytes[(position as usize).wrapping_add(i) & self.byte_mask].store(b, Relaxed);
        }
    }

    /// Fill `dst` from the byte channel starting at `position`, wrapping as needed.
    pub fn get_bytes(&self, position: u64, dst: &mut [u8]) {
        for (i, slot) in dst.iter_mut().enumerate() {
            *slot = self.bytes[(position as usize).wrapping_add(i) & self.byte_mask].load(Relaxed);
        }
    }

    /// Masked circular copy of `count` words from another ring.
    pub(crate) fn copy_words_from(&self, src: &RingStore, src_pos: u64, dst_pos: u64, count: u64) {
        for i in 0..count {
            self.set_word(dst_pos + i, src.word(src_pos + i));
        }
    }

    /// Masked circular copy of `count` bytes from another ring.
    pub(crate) fn copy_bytes_from(&self, src: &RingStore, src_pos: u64, dst_pos: u64, count: u64) {
        for i in 0..count {
            let b = src.byte(src_pos + i);
            self.bytes[((dst_pos + i) as usize) & self.byte_mask].store(b, Relaxed);
        }
    }

    /// Published end of the structured channel.
    #[inline]
    pub fn head(&self) -> u64 {
        self.control.head.load(Acquire)
    }

    #[inline]
    pub fn bytes_head(&self) -> u64 {
        self.control.bytes_head.load(Acquire)
    }

    /// Released start of the structured channel.
    #[inline]
    pub fn tail(&self) -> u64 {
        self.control.tail.load(Acquire)
    }

    #[inline]
    pub fn bytes_tail(&self) -> u64 {
        self.control.bytes_tail.load(Acquire)
    }

    /// Make everything written below `head` / `bytes_head` visible to the consumer.
    /// The byte counter goes first so a reader that sees the new `head` also sees it.
    #[inline]
    pub(crate) fn publish_head(&self, head: u64, bytes_head: u64) {
        self.control.bytes_head.store(bytes_head, Release);
        self.control.head.store(head, Release);
    }

    /// Hand space below `tail` / `bytes_tail` back to the producer.
    #[inline]
    pub(crate) fn release_tail(&self, tail: u64, bytes_tail: u64) {
        self.control.bytes_tail.store(bytes_tail, Release);
        self.control.tail.store(tail, Release);
    }

    /// Raw structured words around `center`, for corruption diagnostics.
    /// Returns the absolute position of the first word and the words themselves.
    pub fn window(&self, center: u64, radius: u64) -> (u64, Vec<i32>) {
        let start = center.saturating_sub(radius);
        let end = center.saturating_add(radius).min(start + self.capacity() as u64);
        (start, (start..end).map(|p| self.word(p)).collect())
    }

    /// Zero both channels and all counters. Only sound while neither half is active.
    pub(crate) fn clear(&self) {
        for w in self.words.iter() {
            w.store(0, Relaxed);
        }
        for b in self.bytes.iter() {
            b.store(0, Relaxed);
        }
        self.control.bytes_head.store(0, Release);
        self.control.head.store(0, Release);
        self.control.bytes_tail.store(0, Release);
        self.control.tail.store(0, Release);
    }
}
